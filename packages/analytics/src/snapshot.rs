//! Immutable analysis snapshot and its atomic publication.
//!
//! A [`Snapshot`] holds every derived structure for one data load. It is
//! built in full or not at all. [`SnapshotStore`] hands out `Arc`s to the
//! current snapshot; a reload builds a fresh one off to the side and swaps
//! the pointer, so readers still holding the previous snapshot keep a
//! consistent view.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use chrono::{DateTime, Utc};
use crime_corr_analytics_models::{
    AssociationResult, CityCentroid, ContingencyTable, CorrelationMatrix, DatasetInfo, Diagnostic,
    FingerprintMatrix,
};
use crime_corr_crime_models::{DateRange, Event, EventFilter};
use crime_corr_source::EventSource;

use crate::AnalyticsError;

/// Every derived structure for one data load.
#[derive(Debug, Clone)]
pub struct Snapshot {
    info: DatasetInfo,
    contingency: ContingencyTable,
    association: AssociationResult,
    fingerprints: FingerprintMatrix,
    correlation: CorrelationMatrix,
    centroids: Vec<CityCentroid>,
    diagnostics: Vec<Diagnostic>,
    built_at: DateTime<Utc>,
}

impl Snapshot {
    /// Builds a snapshot from an event source.
    ///
    /// The contingency table comes from the source's grouped counts, so an
    /// empty source is rejected before any event rows are read.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::EmptyDataset`] if the source has no
    /// events, or [`AnalyticsError::Source`] if reading fails.
    pub fn load(source: &dyn EventSource) -> Result<Self, AnalyticsError> {
        let start = Instant::now();
        log::info!("Building snapshot from {}...", source.describe());

        let counts = source.offense_counts()?;
        let contingency = crate::contingency::from_counts(&counts)?;
        let events = source.events(&EventFilter::default())?;

        let snapshot = Self::assemble(contingency, &events)?;
        log::info!(
            "Snapshot built from {} events ({} cities, {} offense types) in {:.2?}",
            snapshot.info.total_events,
            snapshot.info.cities.len(),
            snapshot.info.offense_types.len(),
            start.elapsed()
        );
        Ok(snapshot)
    }

    /// Builds a snapshot from an in-memory event collection.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::EmptyDataset`] if `events` is empty.
    pub fn from_events(events: &[Event]) -> Result<Self, AnalyticsError> {
        let contingency = crate::contingency::from_events(events)?;
        Self::assemble(contingency, events)
    }

    /// Runs the three independent branches on scoped threads and joins
    /// them before anything is returned.
    fn assemble(contingency: ContingencyTable, events: &[Event]) -> Result<Self, AnalyticsError> {
        let (association_branch, correlation_branch, centroid_branch) = std::thread::scope(|scope| {
            let association = scope.spawn(|| crate::association::chi_square_test(&contingency));
            let correlation = scope.spawn(|| {
                let fingerprints = crate::fingerprint::build(&contingency)?;
                let (matrix, diagnostics) = crate::correlation::pearson_matrix(&fingerprints)?;
                Ok::<_, AnalyticsError>((fingerprints, matrix, diagnostics))
            });
            let centroids = scope.spawn(|| crate::centroid::compute(events));

            (association.join(), correlation.join(), centroids.join())
        });

        let (association, zero_cells) = association_branch
            .map_err(|_| AnalyticsError::StagePanicked { stage: "association" })?;
        let (fingerprints, correlation, degenerate) = correlation_branch
            .map_err(|_| AnalyticsError::StagePanicked { stage: "correlation" })??;
        let centroids =
            centroid_branch.map_err(|_| AnalyticsError::StagePanicked { stage: "centroids" })?;

        let mut diagnostics = zero_cells;
        diagnostics.extend(degenerate);

        let info = DatasetInfo {
            cities: contingency.cities().to_vec(),
            offense_types: contingency.offense_types().to_vec(),
            total_events: contingency.total(),
            date_range: date_range(events),
            years: events
                .iter()
                .map(Event::year)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
        };

        Ok(Self {
            info,
            contingency,
            association,
            fingerprints,
            correlation,
            centroids,
            diagnostics,
            built_at: Utc::now(),
        })
    }

    /// Dataset overview.
    #[must_use]
    pub const fn info(&self) -> &DatasetInfo {
        &self.info
    }

    /// City × Offense count table.
    #[must_use]
    pub const fn contingency(&self) -> &ContingencyTable {
        &self.contingency
    }

    /// Chi-square test result.
    #[must_use]
    pub const fn association(&self) -> &AssociationResult {
        &self.association
    }

    /// Per-city fingerprints.
    #[must_use]
    pub const fn fingerprints(&self) -> &FingerprintMatrix {
        &self.fingerprints
    }

    /// City × City correlation matrix.
    #[must_use]
    pub const fn correlation(&self) -> &CorrelationMatrix {
        &self.correlation
    }

    /// Centroids in City Set order.
    #[must_use]
    pub fn centroids(&self) -> &[CityCentroid] {
        &self.centroids
    }

    /// Centroid of one city.
    #[must_use]
    pub fn centroid(&self, city: &str) -> Option<&CityCentroid> {
        crate::centroid::lookup(&self.centroids, city)
    }

    /// Non-fatal conditions recorded during the build.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// When the snapshot was built.
    #[must_use]
    pub const fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }
}

fn date_range(events: &[Event]) -> Option<DateRange> {
    let min = events.iter().map(|e| e.occurred_at).min()?;
    let max = events.iter().map(|e| e.occurred_at).max()?;
    Some(DateRange { min, max })
}

/// A snapshot together with the generation it was published as.
#[derive(Debug, Clone)]
pub struct Published {
    /// Generation number, starting at 1.
    pub generation: u64,
    /// The snapshot that was swapped in.
    pub snapshot: Arc<Snapshot>,
}

/// Holds the currently published snapshot.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    current: RwLock<Option<Arc<Snapshot>>>,
    generation: AtomicU64,
}

impl SnapshotStore {
    /// Creates an empty store ("no data" until the first publish).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current snapshot, if one has been published.
    #[must_use]
    pub fn current(&self) -> Option<Arc<Snapshot>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of snapshots published so far.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Replaces the current snapshot.
    ///
    /// The generation is bumped under the same write lock as the swap, so
    /// the returned generation always names the returned snapshot.
    pub fn publish(&self, snapshot: Snapshot) -> Published {
        let snapshot = Arc::new(snapshot);
        let generation = {
            let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
            *current = Some(Arc::clone(&snapshot));
            self.generation.fetch_add(1, Ordering::AcqRel) + 1
        };
        log::info!("Published snapshot generation {generation}");
        Published {
            generation,
            snapshot,
        }
    }

    /// Builds a new snapshot from `source` and publishes it.
    ///
    /// On failure the previously published snapshot stays in effect.
    ///
    /// # Errors
    ///
    /// Returns the [`AnalyticsError`] from [`Snapshot::load`].
    pub fn reload(&self, source: &dyn EventSource) -> Result<Published, AnalyticsError> {
        match Snapshot::load(source) {
            Ok(snapshot) => Ok(self.publish(snapshot)),
            Err(e) => {
                if self.current().is_some() {
                    log::error!("Reload failed, keeping previous snapshot: {e}");
                } else {
                    log::error!("Reload failed, no snapshot available: {e}");
                }
                Err(e)
            }
        }
    }
}

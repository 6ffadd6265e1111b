#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Result types produced by the correlation engine.
//!
//! Every matrix here is indexed by the same sorted City Set so that
//! presentation code can line up the contingency table, the correlation
//! matrix, and the centroids without re-sorting. Values are immutable once
//! built; the engine replaces them wholesale on reload.

use crime_corr_crime_models::DateRange;
use serde::{Deserialize, Serialize};

/// Dense City × Offense count table.
///
/// Every city has a count for every offense type; pairs with no observed
/// events hold an explicit 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContingencyTable {
    cities: Vec<String>,
    offense_types: Vec<String>,
    rows: Vec<Vec<u64>>,
}

impl ContingencyTable {
    /// Assembles a table from sorted labels and row-major counts.
    ///
    /// Returns `None` if `rows` does not have one row per city and one
    /// column per offense type.
    #[must_use]
    pub fn new(cities: Vec<String>, offense_types: Vec<String>, rows: Vec<Vec<u64>>) -> Option<Self> {
        if rows.len() != cities.len() || rows.iter().any(|r| r.len() != offense_types.len()) {
            return None;
        }
        Some(Self {
            cities,
            offense_types,
            rows,
        })
    }

    /// Row labels (sorted City Set).
    #[must_use]
    pub fn cities(&self) -> &[String] {
        &self.cities
    }

    /// Column labels (sorted Offense Set).
    #[must_use]
    pub fn offense_types(&self) -> &[String] {
        &self.offense_types
    }

    /// Row-major counts.
    #[must_use]
    pub fn rows(&self) -> &[Vec<u64>] {
        &self.rows
    }

    /// Index of `city` in the City Set.
    #[must_use]
    pub fn city_index(&self, city: &str) -> Option<usize> {
        self.cities.binary_search_by(|c| c.as_str().cmp(city)).ok()
    }

    /// Index of `offense_type` in the Offense Set.
    #[must_use]
    pub fn offense_index(&self, offense_type: &str) -> Option<usize> {
        self.offense_types
            .binary_search_by(|o| o.as_str().cmp(offense_type))
            .ok()
    }

    /// The count for one (city, offense type) pair.
    #[must_use]
    pub fn count(&self, city: &str, offense_type: &str) -> Option<u64> {
        let i = self.city_index(city)?;
        let j = self.offense_index(offense_type)?;
        Some(self.rows[i][j])
    }

    /// Per-city totals.
    #[must_use]
    pub fn row_totals(&self) -> Vec<u64> {
        self.rows.iter().map(|r| r.iter().sum()).collect()
    }

    /// Per-offense totals.
    #[must_use]
    pub fn column_totals(&self) -> Vec<u64> {
        let mut totals = vec![0u64; self.offense_types.len()];
        for row in &self.rows {
            for (total, count) in totals.iter_mut().zip(row) {
                *total += count;
            }
        }
        totals
    }

    /// Sum of every cell.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.rows.iter().flatten().sum()
    }
}

/// Outcome of the chi-square test of independence between city and
/// offense type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociationResult {
    /// Pearson chi-square statistic.
    pub chi2: f64,
    /// Right-tail probability of `chi2` under independence.
    pub p_value: f64,
    /// `(cities - 1) * (offense types - 1)`.
    pub degrees_of_freedom: u64,
    /// Expected counts under independence, same shape as the table.
    pub expected: Vec<Vec<f64>>,
}

impl AssociationResult {
    /// Whether independence is rejected at significance level `alpha`.
    #[must_use]
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

/// Per-city offense-count vectors aligned to the Offense Set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FingerprintMatrix {
    cities: Vec<String>,
    offense_types: Vec<String>,
    vectors: Vec<Vec<u64>>,
}

impl FingerprintMatrix {
    /// Assembles a fingerprint matrix.
    ///
    /// Returns `None` unless every vector has one entry per offense type
    /// and there is one vector per city.
    #[must_use]
    pub fn new(cities: Vec<String>, offense_types: Vec<String>, vectors: Vec<Vec<u64>>) -> Option<Self> {
        if vectors.len() != cities.len() || vectors.iter().any(|v| v.len() != offense_types.len()) {
            return None;
        }
        Some(Self {
            cities,
            offense_types,
            vectors,
        })
    }

    /// Row labels.
    #[must_use]
    pub fn cities(&self) -> &[String] {
        &self.cities
    }

    /// Vector dimension labels.
    #[must_use]
    pub fn offense_types(&self) -> &[String] {
        &self.offense_types
    }

    /// All vectors in City Set order.
    #[must_use]
    pub fn vectors(&self) -> &[Vec<u64>] {
        &self.vectors
    }

    /// The fingerprint of one city.
    #[must_use]
    pub fn vector(&self, city: &str) -> Option<&[u64]> {
        self.cities
            .binary_search_by(|c| c.as_str().cmp(city))
            .ok()
            .map(|i| self.vectors[i].as_slice())
    }
}

/// Symmetric City × City Pearson correlation matrix.
///
/// Undefined correlations (a zero-variance fingerprint on either side) are
/// stored as NaN and serialized as `null`. The diagonal is always 1.0.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationMatrix {
    cities: Vec<String>,
    #[serde(with = "nan_as_null")]
    values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    /// Assembles a correlation matrix.
    ///
    /// Returns `None` if `values` is not square with one row per city.
    #[must_use]
    pub fn new(cities: Vec<String>, values: Vec<Vec<f64>>) -> Option<Self> {
        if values.len() != cities.len() || values.iter().any(|r| r.len() != cities.len()) {
            return None;
        }
        Some(Self { cities, values })
    }

    /// Row and column labels.
    #[must_use]
    pub fn cities(&self) -> &[String] {
        &self.cities
    }

    /// Raw values; NaN marks an undefined correlation.
    #[must_use]
    pub fn values(&self) -> &[Vec<f64>] {
        &self.values
    }

    /// Raw value at `(i, j)`; NaN marks an undefined correlation.
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.values.get(i).and_then(|row| row.get(j)).copied()
    }

    /// Correlation between two named cities.
    ///
    /// The outer `Option` is `None` for an unknown city; the inner one is
    /// `None` when the correlation is undefined.
    #[must_use]
    pub fn between(&self, a: &str, b: &str) -> Option<Option<f64>> {
        let i = self.index(a)?;
        let j = self.index(b)?;
        let value = self.values[i][j];
        Some((!value.is_nan()).then_some(value))
    }

    /// Index of `city` in the City Set.
    #[must_use]
    pub fn index(&self, city: &str) -> Option<usize> {
        self.cities.binary_search_by(|c| c.as_str().cmp(city)).ok()
    }

    /// Checks `corr[a][b] == corr[b][a]` bit-for-bit (NaN matches NaN).
    #[must_use]
    pub fn is_symmetric(&self) -> bool {
        let n = self.cities.len();
        (0..n).all(|i| (0..n).all(|j| self.values[i][j].to_bits() == self.values[j][i].to_bits()))
    }
}

impl PartialEq for CorrelationMatrix {
    /// Bitwise comparison so two matrices with NaN in the same cells are
    /// equal.
    fn eq(&self, other: &Self) -> bool {
        self.cities == other.cities
            && self.values.len() == other.values.len()
            && self
                .values
                .iter()
                .zip(&other.values)
                .all(|(a, b)| a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits()))
    }
}

/// Serializes NaN cells as `null` and reads `null` back as NaN.
mod nan_as_null {
    use serde::{Deserialize as _, Deserializer, Serializer};

    #[allow(clippy::ptr_arg)]
    pub fn serialize<S: Serializer>(values: &Vec<Vec<f64>>, serializer: S) -> Result<S::Ok, S::Error> {
        let cells: Vec<Vec<Option<f64>>> = values
            .iter()
            .map(|row| row.iter().map(|v| (!v.is_nan()).then_some(*v)).collect())
            .collect();
        serde::Serialize::serialize(&cells, serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Vec<f64>>, D::Error> {
        let cells = Vec::<Vec<Option<f64>>>::deserialize(deserializer)?;
        Ok(cells
            .into_iter()
            .map(|row| row.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
            .collect())
    }
}

/// A WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint {
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
}

/// Mean location of a city's events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityCentroid {
    /// City name.
    pub city: String,
    /// Mean latitude.
    pub latitude: f64,
    /// Mean longitude.
    pub longitude: f64,
    /// Number of events averaged.
    pub event_count: u64,
}

impl CityCentroid {
    /// The centroid as a bare coordinate.
    #[must_use]
    pub const fn point(&self) -> GeoPoint {
        GeoPoint {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// A non-fatal condition recorded while building a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Diagnostic {
    /// The city's fingerprint has zero variance; its correlations are
    /// undefined.
    #[serde(rename_all = "camelCase")]
    DegenerateVector {
        /// Affected city.
        city: String,
    },
    /// The cell's expected frequency is zero; it was left out of the
    /// chi-square sum.
    #[serde(rename_all = "camelCase")]
    ZeroExpectedCell {
        /// Row of the cell.
        city: String,
        /// Column of the cell.
        offense_type: String,
    },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DegenerateVector { city } => {
                write!(f, "fingerprint of {city} has zero variance; correlations undefined")
            }
            Self::ZeroExpectedCell { city, offense_type } => {
                write!(f, "expected count for {city}/{offense_type} is zero; cell skipped")
            }
        }
    }
}

/// Overview of the loaded dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetInfo {
    /// Sorted City Set.
    pub cities: Vec<String>,
    /// Sorted Offense Set.
    pub offense_types: Vec<String>,
    /// Number of events the snapshot was built from.
    pub total_events: u64,
    /// Earliest and latest event.
    pub date_range: Option<DateRange>,
    /// Sorted distinct years with at least one event.
    pub years: Vec<i32>,
}

/// Count for a labeled bucket (an offense type or a city).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabeledCount {
    /// Bucket label.
    pub label: String,
    /// Number of events.
    pub count: u64,
}

/// Events per calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearCount {
    /// Calendar year.
    pub year: i32,
    /// Number of events.
    pub count: u64,
}

/// Events per calendar month of a given year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthCount {
    /// Calendar year.
    pub year: i32,
    /// Month (1-12).
    pub month: u32,
    /// Number of events.
    pub count: u64,
}

/// Breakdown of a single city's events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CitySummary {
    /// City name.
    pub city: String,
    /// Total events.
    pub total: u64,
    /// Counts per offense type, most frequent first.
    pub by_offense: Vec<LabeledCount>,
    /// Counts per year, ascending.
    pub by_year: Vec<YearCount>,
    /// Counts per (year, month), ascending.
    pub by_month: Vec<MonthCount>,
}

/// Breakdown of a single offense type's events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OffenseSummary {
    /// Offense type.
    pub offense_type: String,
    /// Total events.
    pub total: u64,
    /// Counts per city, most frequent first.
    pub by_city: Vec<LabeledCount>,
    /// Counts per year, ascending.
    pub by_year: Vec<YearCount>,
    /// Counts per (year, month), ascending.
    pub by_month: Vec<MonthCount>,
}

/// Result of a filtered query that may legitimately match nothing.
///
/// `Empty` is a user-visible "no offenses recorded" condition, not an
/// error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome<T> {
    /// No rows matched the filter.
    Empty,
    /// At least one row matched.
    Rows(T),
}

impl<T> QueryOutcome<T> {
    /// Returns `true` for [`QueryOutcome::Empty`].
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Converts into an `Option`, discarding the empty marker.
    #[must_use]
    pub fn rows(self) -> Option<T> {
        match self {
            Self::Empty => None,
            Self::Rows(rows) => Some(rows),
        }
    }
}

/// A city pair drawn as a line between their centroids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationLink {
    /// First city (lexicographically smaller).
    pub city_a: String,
    /// Second city.
    pub city_b: String,
    /// Centroid of `city_a`.
    pub from: GeoPoint,
    /// Centroid of `city_b`.
    pub to: GeoPoint,
    /// Pearson correlation, `None` when undefined.
    pub correlation: Option<f64>,
}

/// Correlation links plus the point the map should be centered on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkMap {
    /// Links to draw.
    pub links: Vec<CorrelationLink>,
    /// Mean of all city centroids.
    pub center: GeoPoint,
}

//! In-memory event source.
//!
//! Holds a fixed event collection and answers the same queries as the
//! `DuckDB` source. Used for embedding the engine in-process and in tests.

use std::collections::{BTreeMap, BTreeSet};

use crime_corr_crime_models::{DateRange, Event, EventFilter, OffenseCount};

use crate::{EventSource, SourceError};

/// Event source backed by a `Vec<Event>`.
#[derive(Debug, Clone, Default)]
pub struct MemoryEventSource {
    events: Vec<Event>,
}

impl MemoryEventSource {
    /// Creates a source over `events`.
    #[must_use]
    pub const fn new(events: Vec<Event>) -> Self {
        Self { events }
    }
}

impl EventSource for MemoryEventSource {
    fn describe(&self) -> String {
        format!("in-memory ({} events)", self.events.len())
    }

    fn events(&self, filter: &EventFilter) -> Result<Vec<Event>, SourceError> {
        let limit = filter
            .limit
            .map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));

        let mut matched: Vec<&Event> = self.events.iter().filter(|e| filter.matches(e)).collect();
        matched.sort_by(|a, b| {
            a.city
                .cmp(&b.city)
                .then_with(|| a.offense_type.cmp(&b.offense_type))
                .then_with(|| a.occurred_at.cmp(&b.occurred_at))
                .then_with(|| a.latitude.total_cmp(&b.latitude))
                .then_with(|| a.longitude.total_cmp(&b.longitude))
        });

        Ok(matched.into_iter().take(limit).cloned().collect())
    }

    fn cities(&self) -> Result<Vec<String>, SourceError> {
        let set: BTreeSet<&str> = self.events.iter().map(|e| e.city.as_str()).collect();
        Ok(set.into_iter().map(str::to_owned).collect())
    }

    fn offense_types(&self) -> Result<Vec<String>, SourceError> {
        let set: BTreeSet<&str> = self
            .events
            .iter()
            .map(|e| e.offense_type.as_str())
            .collect();
        Ok(set.into_iter().map(str::to_owned).collect())
    }

    fn offense_counts(&self) -> Result<Vec<OffenseCount>, SourceError> {
        let mut grouped: BTreeMap<(&str, &str), u64> = BTreeMap::new();
        for event in &self.events {
            *grouped
                .entry((event.city.as_str(), event.offense_type.as_str()))
                .or_insert(0) += 1;
        }

        Ok(grouped
            .into_iter()
            .map(|((city, offense_type), count)| OffenseCount {
                city: city.to_owned(),
                offense_type: offense_type.to_owned(),
                count,
            })
            .collect())
    }

    fn date_range(&self) -> Result<Option<DateRange>, SourceError> {
        let min = self.events.iter().map(|e| e.occurred_at).min();
        let max = self.events.iter().map(|e| e.occurred_at).max();
        Ok(min.zip(max).map(|(min, max)| DateRange { min, max }))
    }
}

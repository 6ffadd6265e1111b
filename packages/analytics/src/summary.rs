//! Per-city and per-offense breakdowns of filtered events.
//!
//! These operate on events already narrowed by an [`EventFilter`] query, so
//! an empty slice means the filter matched nothing and is reported as
//! [`QueryOutcome::Empty`] rather than an error.
//!
//! [`EventFilter`]: crime_corr_crime_models::EventFilter

use std::collections::BTreeMap;

use crime_corr_analytics_models::{
    CitySummary, LabeledCount, MonthCount, OffenseSummary, QueryOutcome, YearCount,
};
use crime_corr_crime_models::Event;

/// Summarizes one city's events.
#[must_use]
pub fn city_summary(events: &[Event], city: &str) -> QueryOutcome<CitySummary> {
    let matching: Vec<&Event> = events.iter().filter(|e| e.city == city).collect();
    if matching.is_empty() {
        log::debug!("No offenses recorded for city {city}");
        return QueryOutcome::Empty;
    }

    QueryOutcome::Rows(CitySummary {
        city: city.to_owned(),
        total: matching.len() as u64,
        by_offense: ranked(matching.iter().map(|e| e.offense_type.as_str())),
        by_year: per_year(&matching),
        by_month: per_month(&matching),
    })
}

/// Summarizes one offense type's events.
#[must_use]
pub fn offense_summary(events: &[Event], offense_type: &str) -> QueryOutcome<OffenseSummary> {
    let matching: Vec<&Event> = events
        .iter()
        .filter(|e| e.offense_type == offense_type)
        .collect();
    if matching.is_empty() {
        log::debug!("No offenses recorded for type {offense_type}");
        return QueryOutcome::Empty;
    }

    QueryOutcome::Rows(OffenseSummary {
        offense_type: offense_type.to_owned(),
        total: matching.len() as u64,
        by_city: ranked(matching.iter().map(|e| e.city.as_str())),
        by_year: per_year(&matching),
        by_month: per_month(&matching),
    })
}

/// Wraps a filtered event listing.
#[must_use]
pub fn listing(events: Vec<Event>) -> QueryOutcome<Vec<Event>> {
    if events.is_empty() {
        QueryOutcome::Empty
    } else {
        QueryOutcome::Rows(events)
    }
}

/// Counts per label, most frequent first, ties broken by label.
fn ranked<'a>(labels: impl Iterator<Item = &'a str>) -> Vec<LabeledCount> {
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for label in labels {
        *counts.entry(label).or_default() += 1;
    }

    let mut ranked: Vec<LabeledCount> = counts
        .into_iter()
        .map(|(label, count)| LabeledCount {
            label: label.to_owned(),
            count,
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    ranked
}

fn per_year(events: &[&Event]) -> Vec<YearCount> {
    let mut counts: BTreeMap<i32, u64> = BTreeMap::new();
    for event in events {
        *counts.entry(event.year()).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(year, count)| YearCount { year, count })
        .collect()
}

fn per_month(events: &[&Event]) -> Vec<MonthCount> {
    let mut counts: BTreeMap<(i32, u32), u64> = BTreeMap::new();
    for event in events {
        *counts.entry((event.year(), event.month())).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|((year, month), count)| MonthCount { year, month, count })
        .collect()
}

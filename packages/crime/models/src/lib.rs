#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Crime event record types shared across the correlation engine.
//!
//! An [`Event`] is a single reported offense: the city that reported it,
//! the offense type, when it happened, and where. Every derived structure
//! (contingency table, fingerprints, correlation matrix, centroids) is
//! built from a collection of these records and never mutates them.

use chrono::{Datelike as _, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A single reported offense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Reporting city.
    pub city: String,
    /// Offense type (e.g. "theft from motor vehicle").
    pub offense_type: String,
    /// When the offense occurred.
    pub occurred_at: NaiveDateTime,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
}

impl Event {
    /// Creates a new event.
    #[must_use]
    pub fn new(
        city: impl Into<String>,
        offense_type: impl Into<String>,
        occurred_at: NaiveDateTime,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            city: city.into(),
            offense_type: offense_type.into(),
            occurred_at,
            latitude,
            longitude,
        }
    }

    /// Calendar year the offense occurred in.
    #[must_use]
    pub fn year(&self) -> i32 {
        self.occurred_at.year()
    }

    /// Calendar month (1-12) the offense occurred in.
    #[must_use]
    pub fn month(&self) -> u32 {
        self.occurred_at.month()
    }
}

/// Number of events recorded for one (city, offense type) pair.
///
/// This is the grouped-count projection an event store returns for
/// `GROUP BY city, offense_type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OffenseCount {
    /// Reporting city.
    pub city: String,
    /// Offense type.
    pub offense_type: String,
    /// Number of events.
    pub count: u64,
}

/// Earliest and latest event timestamps in a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    /// Earliest `occurred_at`.
    pub min: NaiveDateTime,
    /// Latest `occurred_at`.
    pub max: NaiveDateTime,
}

/// Filters applied when querying events.
///
/// Empty `cities` / `offense_types` mean "all". Date bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFilter {
    /// Only include these cities.
    pub cities: Vec<String>,
    /// Only include these offense types.
    pub offense_types: Vec<String>,
    /// Minimum occurrence timestamp (inclusive).
    pub from: Option<NaiveDateTime>,
    /// Maximum occurrence timestamp (inclusive).
    pub to: Option<NaiveDateTime>,
    /// Maximum number of events to return.
    pub limit: Option<u32>,
}

impl EventFilter {
    /// A filter matching every event of one city.
    #[must_use]
    pub fn for_city(city: impl Into<String>) -> Self {
        Self {
            cities: vec![city.into()],
            ..Self::default()
        }
    }

    /// A filter matching every event of one offense type.
    #[must_use]
    pub fn for_offense_type(offense_type: impl Into<String>) -> Self {
        Self {
            offense_types: vec![offense_type.into()],
            ..Self::default()
        }
    }

    /// Restricts the filter to an inclusive date range.
    #[must_use]
    pub fn between(mut self, from: Option<NaiveDateTime>, to: Option<NaiveDateTime>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    /// Returns `true` if `event` satisfies every condition except `limit`.
    #[must_use]
    pub fn matches(&self, event: &Event) -> bool {
        if !self.cities.is_empty() && !self.cities.iter().any(|c| *c == event.city) {
            return false;
        }
        if !self.offense_types.is_empty()
            && !self.offense_types.iter().any(|o| *o == event.offense_type)
        {
            return false;
        }
        if self.from.is_some_and(|from| event.occurred_at < from) {
            return false;
        }
        if self.to.is_some_and(|to| event.occurred_at > to) {
            return false;
        }
        true
    }
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Read-only crime event sources.
//!
//! The correlation engine never talks to storage directly. It reads events
//! through the [`EventSource`] trait, which is implemented by
//! [`duckdb_source::DuckDbEventSource`] for the imported Crime Open Database file
//! and by [`memory::MemoryEventSource`] for in-process collections.

pub mod duckdb_source;
pub mod memory;
pub mod paths;

use crime_corr_crime_models::{DateRange, Event, EventFilter, OffenseCount};

/// Errors that can occur while reading from an event source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// `DuckDB` query or connection failure.
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    /// I/O error (missing database file, unreadable directory).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored timestamp could not be parsed.
    #[error("Invalid timestamp: {value:?}")]
    Timestamp {
        /// The raw text that failed to parse.
        value: String,
    },

    /// A connection mutex was poisoned by a panicking reader.
    #[error("Event source connection lock poisoned")]
    Poisoned,
}

/// Read-only tabular access to crime events.
///
/// Implementations must return cities and offense types as distinct,
/// lexicographically sorted lists so every consumer indexes matrices the
/// same way.
pub trait EventSource: Send + Sync {
    /// Human-readable description used in log output.
    fn describe(&self) -> String;

    /// Returns the events matching `filter`, ordered by city, offense
    /// type, timestamp, latitude, then longitude. `limit` applies after
    /// ordering, so every source returns the same subset.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the underlying store cannot be read.
    fn events(&self, filter: &EventFilter) -> Result<Vec<Event>, SourceError>;

    /// Returns the distinct, sorted set of cities.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the underlying store cannot be read.
    fn cities(&self) -> Result<Vec<String>, SourceError>;

    /// Returns the distinct, sorted set of offense types.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the underlying store cannot be read.
    fn offense_types(&self) -> Result<Vec<String>, SourceError>;

    /// Returns event counts grouped by (city, offense type), sorted by
    /// city then offense type.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the underlying store cannot be read.
    fn offense_counts(&self) -> Result<Vec<OffenseCount>, SourceError>;

    /// Returns the earliest and latest event timestamps, or `None` when the
    /// source holds no events.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the underlying store cannot be read.
    fn date_range(&self) -> Result<Option<DateRange>, SourceError>;
}

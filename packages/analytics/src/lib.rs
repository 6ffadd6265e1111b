#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! City/offense association and correlation engine.
//!
//! Builds a dense city × offense contingency table from crime events, runs
//! a chi-square test of independence over it, derives one offense-count
//! fingerprint per city, and correlates those fingerprints pairwise. City
//! centroids are computed alongside so presentation code can draw the
//! correlations as links on a map.
//!
//! Everything is computed once per data load into an immutable
//! [`snapshot::Snapshot`]; [`snapshot::SnapshotStore`] publishes it and
//! swaps it atomically on reload.

pub mod association;
pub mod centroid;
pub mod contingency;
pub mod correlation;
pub mod fingerprint;
pub mod links;
pub mod snapshot;
pub mod summary;

use thiserror::Error;

/// Errors that can occur while building or querying a snapshot.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Reading from the event source failed.
    #[error("Event source error: {0}")]
    Source(#[from] crime_corr_source::SourceError),

    /// No events, cities, or offense types to build from.
    #[error("Dataset is empty: {message}")]
    EmptyDataset {
        /// What was found to be empty.
        message: String,
    },

    /// A city name that is not part of the City Set.
    #[error("Unknown city: {city}")]
    UnknownCity {
        /// The requested city.
        city: String,
    },

    /// A build stage panicked on its worker thread.
    #[error("Snapshot build stage '{stage}' panicked")]
    StagePanicked {
        /// Name of the stage.
        stage: &'static str,
    },

    /// Derived matrices disagreed on shape.
    #[error("Conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

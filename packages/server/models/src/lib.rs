#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the correlation server.
//!
//! These types are serialized to JSON for the REST API. Matrices and
//! summaries from the engine are returned as-is; the types here cover the
//! envelopes and query parameters that only exist at the HTTP boundary.

use chrono::{DateTime, NaiveDateTime, Utc};
use crime_corr_analytics_models::{AssociationResult, ContingencyTable};
use crime_corr_crime_models::EventFilter;
use serde::{Deserialize, Serialize};

/// Significance level used for the association interpretation.
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Default number of events returned by the events endpoint.
pub const DEFAULT_EVENT_LIMIT: u32 = 1000;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
    /// Whether a snapshot has been published.
    pub snapshot_loaded: bool,
    /// Number of snapshots published since startup.
    pub generation: u64,
}

/// Body returned when a query legitimately matches nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEmpty {
    /// Always `true`.
    pub empty: bool,
    /// Human-readable explanation.
    pub message: String,
}

impl ApiEmpty {
    /// Creates an empty-result body.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            empty: true,
            message: message.into(),
        }
    }
}

/// Error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Error description.
    pub error: String,
}

impl ApiError {
    /// Creates an error body.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Contingency table with its margins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiContingency {
    /// Row labels.
    pub cities: Vec<String>,
    /// Column labels.
    pub offense_types: Vec<String>,
    /// Row-major counts.
    pub counts: Vec<Vec<u64>>,
    /// Per-city totals.
    pub row_totals: Vec<u64>,
    /// Per-offense totals.
    pub column_totals: Vec<u64>,
    /// Grand total.
    pub total: u64,
}

impl From<&ContingencyTable> for ApiContingency {
    fn from(table: &ContingencyTable) -> Self {
        Self {
            cities: table.cities().to_vec(),
            offense_types: table.offense_types().to_vec(),
            counts: table.rows().to_vec(),
            row_totals: table.row_totals(),
            column_totals: table.column_totals(),
            total: table.total(),
        }
    }
}

/// Chi-square result plus a readable verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiAssociation {
    /// Test result.
    #[serde(flatten)]
    pub result: AssociationResult,
    /// Significance level the verdict was made at.
    pub alpha: f64,
    /// Whether `p_value < alpha`.
    pub significant: bool,
    /// One-line interpretation.
    pub interpretation: String,
}

/// Response to a successful reload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiReload {
    /// Generation of the newly published snapshot.
    pub generation: u64,
    /// When it was built.
    pub built_at: DateTime<Utc>,
    /// Number of events it was built from.
    pub total_events: u64,
    /// Number of diagnostics recorded.
    pub diagnostics: usize,
}

/// Query parameters for the events endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventQueryParams {
    /// Comma-separated list of cities to include.
    pub cities: Option<String>,
    /// Comma-separated list of offense types to include.
    pub offenses: Option<String>,
    /// Start of the time range (inclusive, ISO 8601 without offset).
    pub from: Option<NaiveDateTime>,
    /// End of the time range (inclusive).
    pub to: Option<NaiveDateTime>,
    /// Maximum number of results.
    pub limit: Option<u32>,
}

impl EventQueryParams {
    /// Converts the query string into an [`EventFilter`].
    #[must_use]
    pub fn to_filter(&self) -> EventFilter {
        EventFilter {
            cities: split_list(self.cities.as_deref()),
            offense_types: split_list(self.offenses.as_deref()),
            from: self.from,
            to: self.to,
            limit: Some(self.limit.unwrap_or(DEFAULT_EVENT_LIMIT)),
        }
    }
}

/// Query parameters for the links endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinksQuery {
    /// Only return links touching this city.
    pub city: Option<String>,
}

/// Query parameters for the summary endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryQuery {
    /// Start of the time range (inclusive).
    pub from: Option<NaiveDateTime>,
    /// End of the time range (inclusive).
    pub to: Option<NaiveDateTime>,
}

fn split_list(s: Option<&str>) -> Vec<String> {
    s.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_owned)
            .collect()
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_params_split_comma_lists() {
        let params = EventQueryParams {
            cities: Some("Austin, Boston,,".to_string()),
            offenses: None,
            from: None,
            to: None,
            limit: None,
        };
        let filter = params.to_filter();
        assert_eq!(filter.cities, vec!["Austin", "Boston"]);
        assert!(filter.offense_types.is_empty());
        assert_eq!(filter.limit, Some(DEFAULT_EVENT_LIMIT));
    }

    #[test]
    fn association_is_flattened() {
        let body = ApiAssociation {
            result: AssociationResult {
                chi2: 1.5,
                p_value: 0.2,
                degrees_of_freedom: 1,
                expected: vec![vec![1.0]],
            },
            alpha: DEFAULT_ALPHA,
            significant: false,
            interpretation: "no".to_string(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["pValue"], 0.2);
        assert_eq!(json["degreesOfFreedom"], 1);
        assert_eq!(json["significant"], false);
    }

    #[test]
    fn empty_body_shape() {
        let json = serde_json::to_value(ApiEmpty::new("No offenses recorded")).unwrap();
        assert_eq!(json["empty"], true);
        assert_eq!(json["message"], "No offenses recorded");
    }
}

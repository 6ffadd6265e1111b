//! Plain-text and JSON rendering of a snapshot.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use crime_corr_analytics::association;
use crime_corr_analytics::snapshot::Snapshot;
use crime_corr_analytics_models::{
    AssociationResult, CityCentroid, ContingencyTable, CorrelationMatrix, DatasetInfo, Diagnostic,
    FingerprintMatrix,
};
use serde::Serialize;
use strum_macros::{Display, EnumIter, EnumString};

/// Significance level the report's verdict is made at.
const ALPHA: f64 = 0.05;

/// How `report` prints its output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum OutputFormat {
    /// Aligned tables for a terminal.
    #[default]
    Text,
    /// The full snapshot as pretty-printed JSON.
    Json,
}

/// Everything in a snapshot, in serializable form.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotExport<'a> {
    built_at: DateTime<Utc>,
    dataset: &'a DatasetInfo,
    contingency: &'a ContingencyTable,
    association: &'a AssociationResult,
    fingerprints: &'a FingerprintMatrix,
    correlation: &'a CorrelationMatrix,
    centroids: &'a [CityCentroid],
    diagnostics: &'a [Diagnostic],
}

impl<'a> From<&'a Snapshot> for SnapshotExport<'a> {
    fn from(snapshot: &'a Snapshot) -> Self {
        Self {
            built_at: snapshot.built_at(),
            dataset: snapshot.info(),
            contingency: snapshot.contingency(),
            association: snapshot.association(),
            fingerprints: snapshot.fingerprints(),
            correlation: snapshot.correlation(),
            centroids: snapshot.centroids(),
            diagnostics: snapshot.diagnostics(),
        }
    }
}

/// Renders `snapshot` in the requested format.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render(snapshot: &Snapshot, format: OutputFormat) -> Result<String, Box<dyn std::error::Error>> {
    Ok(match format {
        OutputFormat::Text => render_text(snapshot)?,
        OutputFormat::Json => serde_json::to_string_pretty(&SnapshotExport::from(snapshot))?,
    })
}

/// Renders the dataset overview, contingency table, chi-square result,
/// correlation matrix, centroids, and diagnostics as aligned text.
///
/// # Errors
///
/// Returns [`std::fmt::Error`] if writing to the buffer fails.
pub fn render_text(snapshot: &Snapshot) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    let info = snapshot.info();

    write!(
        out,
        "Dataset: {} cities, {} offense types, {} events",
        info.cities.len(),
        info.offense_types.len(),
        info.total_events
    )?;
    if let Some(range) = info.date_range {
        write!(out, " ({} .. {})", range.min.date(), range.max.date())?;
    }
    writeln!(out)?;
    writeln!(out)?;

    write_contingency(&mut out, snapshot.contingency())?;
    writeln!(out)?;

    let result = snapshot.association();
    writeln!(out, "Chi-square test of independence")?;
    writeln!(
        out,
        "  chi2 = {:.4}  dof = {}  p = {:.6}",
        result.chi2, result.degrees_of_freedom, result.p_value
    )?;
    writeln!(out, "  {}", association::interpret(result, ALPHA))?;
    writeln!(out)?;

    write_correlation(&mut out, snapshot.correlation())?;
    writeln!(out)?;

    writeln!(out, "Centroids")?;
    let width = label_width(snapshot.centroids().iter().map(|c| c.city.as_str()));
    for c in snapshot.centroids() {
        writeln!(
            out,
            "  {:<width$}  {:>10.5} {:>11.5}  ({} events)",
            c.city, c.latitude, c.longitude, c.event_count
        )?;
    }

    if !snapshot.diagnostics().is_empty() {
        writeln!(out)?;
        writeln!(out, "Diagnostics")?;
        for d in snapshot.diagnostics() {
            writeln!(out, "  - {d}")?;
        }
    }

    Ok(out)
}

fn write_contingency(out: &mut String, table: &ContingencyTable) -> std::fmt::Result {
    writeln!(out, "Contingency table")?;
    let width = label_width(table.cities().iter().map(String::as_str));

    write!(out, "  {:<width$}", "")?;
    for offense in table.offense_types() {
        write!(out, "  {offense:>w$}", w = offense.len().max(6))?;
    }
    writeln!(out, "  {:>8}", "Total")?;

    for ((city, row), total) in table.cities().iter().zip(table.rows()).zip(table.row_totals()) {
        write!(out, "  {city:<width$}")?;
        for (count, offense) in row.iter().zip(table.offense_types()) {
            write!(out, "  {count:>w$}", w = offense.len().max(6))?;
        }
        writeln!(out, "  {total:>8}")?;
    }
    Ok(())
}

fn write_correlation(out: &mut String, matrix: &CorrelationMatrix) -> std::fmt::Result {
    writeln!(out, "Correlation matrix (Pearson)")?;
    let width = label_width(matrix.cities().iter().map(String::as_str));

    write!(out, "  {:<width$}", "")?;
    for city in matrix.cities() {
        write!(out, "  {city:>w$}", w = city.len().max(7))?;
    }
    writeln!(out)?;

    for (city, row) in matrix.cities().iter().zip(matrix.values()) {
        write!(out, "  {city:<width$}")?;
        for (value, column) in row.iter().zip(matrix.cities()) {
            let w = column.len().max(7);
            if value.is_nan() {
                write!(out, "  {:>w$}", "n/a")?;
            } else {
                write!(out, "  {value:>w$.3}")?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

fn label_width<'a>(labels: impl Iterator<Item = &'a str>) -> usize {
    labels.map(str::len).max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use crime_corr_crime_models::Event;

    use super::*;

    fn snapshot() -> Snapshot {
        let at = |m| {
            NaiveDate::from_ymd_opt(2020, m, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        };
        Snapshot::from_events(&[
            Event::new("CityA", "Theft", at(1), 10.0, 20.0),
            Event::new("CityA", "Assault", at(2), 10.0, 20.0),
            Event::new("CityB", "Theft", at(3), 30.0, 40.0),
        ])
        .unwrap()
    }

    #[test]
    fn text_report_has_every_section() {
        let text = render_text(&snapshot()).unwrap();
        assert!(text.starts_with("Dataset: 2 cities, 2 offense types, 3 events (2020-01-01 .. 2020-03-01)"));
        assert!(text.contains("Contingency table"));
        assert!(text.contains("Chi-square test of independence"));
        assert!(text.contains("Correlation matrix"));
        assert!(text.contains("n/a"));
        assert!(text.contains("Centroids"));
        assert!(text.contains("Diagnostics"));
    }

    #[test]
    fn json_report_serializes_nulls() {
        let json = render(&snapshot(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["dataset"]["totalEvents"], 3);
        assert!(value["correlation"]["values"][0][1].is_null());
        assert_eq!(value["centroids"][1]["city"], "CityB");
    }

    #[test]
    fn output_format_parses_lowercase() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::Text.to_string(), "text");
        assert!("xml".parse::<OutputFormat>().is_err());
    }
}

//! `DuckDB`-backed event source.
//!
//! Reads the `code_data` table produced by the Crime Open Database import:
//! one row per offense with `city_name`, `offense_type`, `date_single`,
//! `latitude` and `longitude` columns. The file is opened read-only; this
//! crate never writes to it.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use crime_corr_crime_models::{DateRange, Event, EventFilter, OffenseCount};
use duckdb::types::Value;
use duckdb::{AccessMode, Config, Connection, params_from_iter};

use crate::{EventSource, SourceError};

/// Name of the imported incidents table.
pub const EVENTS_TABLE: &str = "code_data";

/// Rows missing any of the fields an [`Event`] requires are rejected
/// upstream; this predicate keeps every query consistent with that.
const VALID_ROWS: &str = "city_name IS NOT NULL
    AND offense_type IS NOT NULL
    AND date_single IS NOT NULL
    AND latitude IS NOT NULL
    AND longitude IS NOT NULL";

/// Timestamp format used when binding date filters.
const BIND_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Event source reading from a `DuckDB` file.
///
/// `duckdb::Connection` is `Send` but not `Sync`, so the connection is
/// wrapped in a `Mutex`.
pub struct DuckDbEventSource {
    conn: Mutex<Connection>,
    label: String,
}

impl DuckDbEventSource {
    /// Opens the `DuckDB` file at `path` in read-only mode.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the file does not exist or cannot be
    /// opened.
    pub fn open_read_only(path: &Path) -> Result<Self, SourceError> {
        if !path.exists() {
            return Err(SourceError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("DuckDB file not found: {}", path.display()),
            )));
        }

        let config = Config::default().access_mode(AccessMode::ReadOnly)?;
        let conn = Connection::open_with_flags(path, config)?;

        log::info!("Opened event database {} (read-only)", path.display());

        Ok(Self::from_connection(conn, path.display().to_string()))
    }

    /// Wraps an already-open connection.
    #[must_use]
    pub fn from_connection(conn: Connection, label: impl Into<String>) -> Self {
        Self {
            conn: Mutex::new(conn),
            label: label.into(),
        }
    }

    fn acquire(&self) -> Result<MutexGuard<'_, Connection>, SourceError> {
        self.conn.lock().map_err(|_| SourceError::Poisoned)
    }

    fn distinct_column(&self, column: &str) -> Result<Vec<String>, SourceError> {
        let conn = self.acquire()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT DISTINCT {column} FROM {EVENTS_TABLE} WHERE {VALID_ROWS} ORDER BY {column}"
        ))?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut values = Vec::new();
        for value in rows {
            values.push(value?);
        }
        Ok(values)
    }
}

impl EventSource for DuckDbEventSource {
    fn describe(&self) -> String {
        format!("DuckDB {}", self.label)
    }

    fn events(&self, filter: &EventFilter) -> Result<Vec<Event>, SourceError> {
        let (sql, params) = build_events_query(filter);
        let conn = self.acquire()?;
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(params))?;

        let mut events = Vec::new();
        while let Some(row) = rows.next()? {
            let city: String = row.get(0)?;
            let offense_type: String = row.get(1)?;
            let occurred_at_text: String = row.get(2)?;
            let latitude: f64 = row.get(3)?;
            let longitude: f64 = row.get(4)?;

            let occurred_at =
                parse_timestamp(&occurred_at_text).ok_or_else(|| SourceError::Timestamp {
                    value: occurred_at_text.clone(),
                })?;

            events.push(Event {
                city,
                offense_type,
                occurred_at,
                latitude,
                longitude,
            });
        }

        log::debug!("Read {} events from {}", events.len(), self.label);

        Ok(events)
    }

    fn cities(&self) -> Result<Vec<String>, SourceError> {
        self.distinct_column("city_name")
    }

    fn offense_types(&self) -> Result<Vec<String>, SourceError> {
        self.distinct_column("offense_type")
    }

    fn offense_counts(&self) -> Result<Vec<OffenseCount>, SourceError> {
        let conn = self.acquire()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT city_name, offense_type, COUNT(*) AS n
             FROM {EVENTS_TABLE}
             WHERE {VALID_ROWS}
             GROUP BY city_name, offense_type
             ORDER BY city_name, offense_type"
        ))?;
        let rows = stmt.query_map([], |row| {
            let city: String = row.get(0)?;
            let offense_type: String = row.get(1)?;
            let n: i64 = row.get(2)?;
            Ok((city, offense_type, n))
        })?;

        let mut counts = Vec::new();
        for row in rows {
            let (city, offense_type, n) = row?;
            counts.push(OffenseCount {
                city,
                offense_type,
                count: u64::try_from(n).unwrap_or(0),
            });
        }
        Ok(counts)
    }

    fn date_range(&self) -> Result<Option<DateRange>, SourceError> {
        let conn = self.acquire()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT CAST(MIN(CAST(date_single AS TIMESTAMP)) AS VARCHAR),
                    CAST(MAX(CAST(date_single AS TIMESTAMP)) AS VARCHAR)
             FROM {EVENTS_TABLE}
             WHERE {VALID_ROWS}"
        ))?;
        let (min, max): (Option<String>, Option<String>) =
            stmt.query_row([], |row| Ok((row.get(0)?, row.get(1)?)))?;

        let (Some(min), Some(max)) = (min, max) else {
            return Ok(None);
        };

        let parse = |text: String| {
            parse_timestamp(&text).ok_or(SourceError::Timestamp { value: text })
        };

        Ok(Some(DateRange {
            min: parse(min)?,
            max: parse(max)?,
        }))
    }
}

/// Builds the filtered events query and its bound parameters.
fn build_events_query(filter: &EventFilter) -> (String, Vec<Value>) {
    let mut frags = vec![VALID_ROWS.to_string()];
    let mut params = Vec::new();

    if !filter.cities.is_empty() {
        frags.push(format!("city_name IN ({})", placeholders(filter.cities.len())));
        params.extend(filter.cities.iter().cloned().map(Value::Text));
    }

    if !filter.offense_types.is_empty() {
        frags.push(format!(
            "offense_type IN ({})",
            placeholders(filter.offense_types.len())
        ));
        params.extend(filter.offense_types.iter().cloned().map(Value::Text));
    }

    if let Some(from) = filter.from {
        frags.push("CAST(date_single AS TIMESTAMP) >= CAST(? AS TIMESTAMP)".to_string());
        params.push(Value::Text(from.format(BIND_FORMAT).to_string()));
    }

    if let Some(to) = filter.to {
        frags.push("CAST(date_single AS TIMESTAMP) <= CAST(? AS TIMESTAMP)".to_string());
        params.push(Value::Text(to.format(BIND_FORMAT).to_string()));
    }

    let mut sql = format!(
        "SELECT city_name, offense_type, CAST(date_single AS VARCHAR), latitude, longitude
         FROM {EVENTS_TABLE}
         WHERE {}
         ORDER BY city_name, offense_type, date_single, latitude, longitude",
        frags.join(" AND ")
    );

    if let Some(limit) = filter.limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }

    (sql, params)
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Parses a `DuckDB` timestamp text representation.
///
/// `DuckDB`'s `VARCHAR` cast can produce several formats depending on the
/// column type and stored precision:
/// - `2024-01-15 10:30:00`
/// - `2024-01-15 10:30:00.123`
/// - `2024-01-15 10:30:00+00` (timestamptz)
/// - `2024-01-15` (date column)
///
/// Timezone-aware values are normalized to UTC.
fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    for fmt in ["%Y-%m-%d %H:%M:%S%#z", "%Y-%m-%d %H:%M:%S%.f%#z"] {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc).naive_utc());
        }
    }

    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }

    log::warn!("Failed to parse timestamp: {s:?}");
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed(conn: &Connection) {
        conn.execute_batch(
            "CREATE TABLE code_data (
                city_name TEXT,
                offense_type TEXT,
                date_single TIMESTAMP,
                latitude DOUBLE,
                longitude DOUBLE
            );
            INSERT INTO code_data VALUES
                ('Chicago', 'theft', '2018-03-01 10:00:00', 41.8, -87.6),
                ('Chicago', 'assault', '2018-07-15 22:30:00', 41.9, -87.7),
                ('Chicago', 'theft', '2019-01-02 08:00:00', 41.7, -87.5),
                ('Austin', 'theft', '2017-05-05 12:00:00', 30.2, -97.7),
                ('Austin', NULL, '2017-05-06 12:00:00', 30.2, -97.7),
                ('Austin', 'burglary', '2017-05-07 12:00:00', NULL, -97.7);",
        )
        .unwrap();
    }

    fn in_memory() -> DuckDbEventSource {
        let conn = Connection::open_in_memory().unwrap();
        seed(&conn);
        DuckDbEventSource::from_connection(conn, "memory")
    }

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn distinct_sets_are_sorted_and_skip_invalid_rows() {
        let source = in_memory();
        assert_eq!(source.cities().unwrap(), vec!["Austin", "Chicago"]);
        assert_eq!(source.offense_types().unwrap(), vec!["assault", "theft"]);
    }

    #[test]
    fn grouped_counts_match_rows() {
        let source = in_memory();
        let counts = source.offense_counts().unwrap();
        let flat: Vec<(&str, &str, u64)> = counts
            .iter()
            .map(|c| (c.city.as_str(), c.offense_type.as_str(), c.count))
            .collect();
        assert_eq!(
            flat,
            vec![
                ("Austin", "theft", 1),
                ("Chicago", "assault", 1),
                ("Chicago", "theft", 2),
            ]
        );
    }

    #[test]
    fn events_apply_filters() {
        let source = in_memory();
        assert_eq!(source.events(&EventFilter::default()).unwrap().len(), 4);

        let chicago = source.events(&EventFilter::for_city("Chicago")).unwrap();
        assert_eq!(chicago.len(), 3);
        assert!(chicago.iter().all(|e| e.city == "Chicago"));

        let ranged = source
            .events(&EventFilter::for_city("Chicago").between(
                Some(at("2018-01-01 00:00:00")),
                Some(at("2018-12-31 23:59:59")),
            ))
            .unwrap();
        assert_eq!(ranged.len(), 2);
        assert_eq!(ranged[0].occurred_at, at("2018-07-15 22:30:00"));

        let limited = source
            .events(&EventFilter {
                limit: Some(1),
                ..EventFilter::default()
            })
            .unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn date_range_spans_valid_rows() {
        let source = in_memory();
        let range = source.date_range().unwrap().unwrap();
        assert_eq!(range.min, at("2017-05-05 12:00:00"));
        assert_eq!(range.max, at("2019-01-02 08:00:00"));
    }

    #[test]
    fn empty_table_has_no_date_range() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE code_data (city_name TEXT, offense_type TEXT,
             date_single TIMESTAMP, latitude DOUBLE, longitude DOUBLE)",
        )
        .unwrap();
        let source = DuckDbEventSource::from_connection(conn, "empty");
        assert!(source.date_range().unwrap().is_none());
        assert!(source.events(&EventFilter::default()).unwrap().is_empty());
    }

    #[test]
    fn opens_file_read_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("code_data.duckdb");
        {
            let conn = Connection::open(&path).unwrap();
            seed(&conn);
        }

        let source = DuckDbEventSource::open_read_only(&path).unwrap();
        assert_eq!(source.cities().unwrap().len(), 2);
        assert!(source.describe().contains("code_data.duckdb"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = DuckDbEventSource::open_read_only(&dir.path().join("nope.duckdb"));
        assert!(matches!(result, Err(SourceError::Io(_))));
    }

    #[test]
    fn parses_duckdb_timestamp_variants() {
        assert_eq!(
            parse_timestamp("2024-01-15 10:30:00"),
            Some(at("2024-01-15 10:30:00"))
        );
        assert!(parse_timestamp("2024-01-15 10:30:00.123").is_some());
        assert_eq!(
            parse_timestamp("2024-01-15 10:30:00+00"),
            Some(at("2024-01-15 10:30:00"))
        );
        assert_eq!(
            parse_timestamp("2024-01-15"),
            Some(at("2024-01-15 00:00:00"))
        );
        assert!(parse_timestamp("not a date").is_none());
    }
}

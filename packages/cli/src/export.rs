//! Writes a snapshot to disk as JSON.

use std::path::Path;

use crime_corr_analytics::snapshot::Snapshot;

use crate::report::SnapshotExport;

/// Serializes `snapshot` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be written.
pub fn write_export(snapshot: &Snapshot, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(&SnapshotExport::from(snapshot))?;
    std::fs::write(path, json)?;

    log::info!("Exported snapshot to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use crime_corr_crime_models::Event;

    use super::*;

    #[test]
    fn writes_json_into_nested_directory() {
        let at = NaiveDate::from_ymd_opt(2021, 7, 4)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let snapshot = Snapshot::from_events(&[
            Event::new("Austin", "theft", at, 30.0, -97.0),
            Event::new("Boston", "assault", at, 42.0, -71.0),
        ])
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("snapshot.json");
        write_export(&snapshot, &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["dataset"]["cities"], serde_json::json!(["Austin", "Boston"]));
        assert_eq!(value["contingency"]["rows"], serde_json::json!([[0, 1], [1, 0]]));
        assert!(value["builtAt"].is_string());
    }
}

#![allow(clippy::module_name_repetitions)]
//! Canonical file paths for the event database.
//!
//! All paths are relative to the project root's `data/` directory.

use std::path::{Path, PathBuf};

/// File name of the imported Crime Open Database.
pub const DEFAULT_DB_FILE: &str = "code_data.duckdb";

/// Returns the workspace root directory.
///
/// Resolved at compile time from `CARGO_MANIFEST_DIR`; falls back to the
/// current directory when the manifest has been moved.
#[must_use]
pub fn project_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// Returns the `data/` directory path.
#[must_use]
pub fn data_dir() -> PathBuf {
    project_root().join("data")
}

/// Returns the default path of the event `DuckDB` file.
#[must_use]
pub fn default_db_path() -> PathBuf {
    data_dir().join(DEFAULT_DB_FILE)
}

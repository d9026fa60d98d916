//! Session file naming and persistence.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};
use legged_errors::TelemetryError;

use crate::table::write_csv;
use crate::store::TelemetryStore;

/// File name prefix for session logs.
pub const SESSION_FILE_PREFIX: &str = "robot_control";

/// `robot_control_%Y%m%d_%H%M%S.csv` for the given local time.
pub fn session_file_name<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{SESSION_FILE_PREFIX}_{}.csv", at.format("%Y%m%d_%H%M%S"))
}

/// First free path for a session started at `at` inside `dir`.
///
/// Two sessions closed within the same second get `_1`, `_2`, … suffixes
/// instead of overwriting each other.
pub fn unique_session_path<Tz: TimeZone>(dir: &Path, at: &DateTime<Tz>) -> PathBuf
where
    Tz::Offset: std::fmt::Display,
{
    let base = dir.join(session_file_name(at));
    if !base.exists() {
        return base;
    }
    let stem = format!("{SESSION_FILE_PREFIX}_{}", at.format("%Y%m%d_%H%M%S"));
    (1u32..)
        .map(|n| dir.join(format!("{stem}_{n}.csv")))
        .find(|candidate| !candidate.exists())
        .unwrap_or(base)
}

/// Write `store` to a new timestamped CSV file under `dir`, creating the
/// directory if needed. Returns the path written.
///
/// # Errors
///
/// [`TelemetryError::Empty`] when the store has no rows (nothing is
/// written), [`TelemetryError::Io`] on filesystem failure.
pub fn save_session<Tz: TimeZone>(
    store: &TelemetryStore,
    dir: &Path,
    at: &DateTime<Tz>,
) -> Result<PathBuf, TelemetryError>
where
    Tz::Offset: std::fmt::Display,
{
    if store.is_empty() {
        return Err(TelemetryError::Empty);
    }

    fs::create_dir_all(dir)?;
    let path = unique_session_path(dir, at);
    let mut writer = BufWriter::new(File::create(&path)?);
    write_csv(store, &mut writer)?;
    writer.flush()?;

    tracing::debug!(
        path = %path.display(),
        rows = store.row_count(),
        columns = store.column_count(),
        "telemetry session written"
    );
    Ok(path)
}

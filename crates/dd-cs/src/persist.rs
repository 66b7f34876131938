use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use dd_core::DdError;
use tracing::info;

use crate::result::FitResult;

/// Timestamp layout used in archive file names.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// Archive path `<dir>/<model>_<label>_<timestamp>.json`.
pub fn archive_path(dir: &Path, model: &str, label: &str, timestamp: &DateTime<Local>) -> PathBuf {
    dir.join(format!(
        "{model}_{label}_{}.json",
        timestamp.format(TIMESTAMP_FORMAT)
    ))
}

/// Saves `result` into `dir` under a name stamped with the current time.
pub fn save_archive(result: &FitResult, dir: &Path) -> Result<PathBuf, DdError> {
    save_archive_at(result, dir, &Local::now())
}

/// Saves `result` into `dir` under a name stamped with `timestamp`.
pub fn save_archive_at(
    result: &FitResult,
    dir: &Path,
    timestamp: &DateTime<Local>,
) -> Result<PathBuf, DdError> {
    let path = archive_path(dir, &result.model, &result.raw_data.label, timestamp);
    result.write(&path)?;
    info!(path = %path.display(), "fit archive written");
    Ok(path)
}

//! Source: reads one sync log from disk and hands it to the engine.
//!
//! This is the only place the monitor touches the log file. Bytes are decoded
//! as UTF-8 with invalid sequences replaced, so a stray byte never prevents a
//! snapshot from being produced.

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::error::{MonitorError, MonitorResult};

const UTF8_BOM: char = '\u{feff}';

#[derive(Debug, Clone)]
pub struct LogSource {
    pub path: PathBuf,
    pub lines: Vec<String>,
    /// File modification time, reported as the snapshot's `last_run`
    pub modified: DateTime<Utc>,
}

pub fn read_log(path: &Path) -> MonitorResult<LogSource> {
    let metadata = fs::metadata(path).map_err(|e| MonitorError::read(path, e))?;
    if !metadata.is_file() {
        return Err(MonitorError::NotAFile(path.to_path_buf()));
    }

    let modified = metadata
        .modified()
        .map(DateTime::<Utc>::from)
        .map_err(|e| MonitorError::read(path, e))?;

    let bytes = fs::read(path).map_err(|e| MonitorError::read(path, e))?;
    let text = String::from_utf8_lossy(&bytes);
    if let Cow::Owned(_) = text {
        warn!(path = %path.display(), "Log contains invalid UTF-8; affected bytes were replaced");
    }

    let lines: Vec<String> = text
        .trim_start_matches(UTF8_BOM)
        .lines()
        .map(str::to_string)
        .collect();

    info!(
        path = %path.display(),
        lines = lines.len(),
        modified = %modified.format("%Y-%m-%d %H:%M:%S"),
        "Loaded log file"
    );

    Ok(LogSource {
        path: path.to_path_buf(),
        lines,
        modified,
    })
}

//! Output: JSON document for the dashboard renderer.

use std::fs;
use std::io::Write;
use std::path::Path;

use engine::MetricsSnapshot;
use tracing::info;

use crate::error::{MonitorError, MonitorResult};

pub fn render_json(snapshot: &MetricsSnapshot, pretty: bool) -> MonitorResult<String> {
    let json = if pretty {
        serde_json::to_string_pretty(snapshot)?
    } else {
        serde_json::to_string(snapshot)?
    };
    Ok(json)
}

/// Write the snapshot to `target`, or to stdout when no target is given.
pub fn write_snapshot(snapshot: &MetricsSnapshot, target: Option<&Path>, pretty: bool) -> MonitorResult<()> {
    let json = render_json(snapshot, pretty)?;

    match target {
        Some(path) => {
            let io_err = |source| MonitorError::OutputWrite {
                path: path.to_path_buf(),
                source,
            };
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
            fs::write(path, json.as_bytes()).map_err(io_err)?;
            info!(path = %path.display(), bytes = json.len(), "Snapshot written");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", json).map_err(MonitorError::Stdout)?;
            stdout.flush().map_err(MonitorError::Stdout)?;
        }
    }

    Ok(())
}

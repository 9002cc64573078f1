use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Log file not found: {0}")]
    SourceNotFound(PathBuf),

    #[error("Log path is not a regular file: {0}")]
    NotAFile(PathBuf),

    #[error("Failed to read log file {path}: {source}")]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write snapshot to {path}: {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write snapshot to stdout: {0}")]
    Stdout(#[source] std::io::Error),

    #[error("Failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
}

// Convenience type alias
pub type MonitorResult<T> = Result<T, MonitorError>;

impl MonitorError {
    pub(crate) fn read(path: &std::path::Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            MonitorError::SourceNotFound(path.to_path_buf())
        } else {
            MonitorError::SourceUnreadable {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

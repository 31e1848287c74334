use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReporterError {
    #[error("I/O error reading '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("No coverage report found at '{}'", .0.display())]
    ReportNotFound(PathBuf),

    #[error("Coverage report at '{}' is empty", .0.display())]
    EmptyReport(PathBuf),

    #[error("{0} environment variable is required")]
    MissingEnv(&'static str),

    #[error("Invalid event payload: {0}")]
    Event(#[from] serde_json::Error),

    #[error("Unsupported event '{0}': expected pull_request or push")]
    UnsupportedEvent(String),

    #[error("GitHub API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Request failed: {0}")]
    Transport(String),
}

pub type Result<T> = std::result::Result<T, ReporterError>;

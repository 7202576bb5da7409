use thiserror::Error;

use crate::models::ReportKind;

/// Failure that aborts a whole report request. Everything after the fetch
/// stage degrades in place instead of surfacing here.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to fetch {kind} rows")]
    Fetch {
        kind: ReportKind,
        #[source]
        source: anyhow::Error,
    },
}

/// Outcome of a download request for a generated artifact. An outer HTTP
/// layer maps `InvalidFilename` to 400 and `NotFound` to 404.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("invalid artifact filename")]
    InvalidFilename,

    #[error("artifact not found")]
    NotFound,

    #[error("failed to open artifact")]
    Io(#[from] std::io::Error),
}

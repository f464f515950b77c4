use std::path::PathBuf;
use thiserror::Error;

/// Central error type for every utility in the crate.
/// Every module returns `Result<T, UtilError>`.
#[derive(Debug, Error)]
pub enum UtilError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Archive ─────────────────────────────────────────
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Returned 404: {0}")]
    NotFound(String),

    #[error("Too many redirects: {url} -- redirections: [{}]", .redirections.join(", "))]
    TooManyRedirects {
        url: String,
        redirections: Vec<String>,
    },

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Hashing ─────────────────────────────────────────
    #[error("Unsupported hash algorithm: {0}")]
    UnsupportedAlgorithm(String),

    // ── Preconditions ───────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Illegal state: {0}")]
    IllegalState(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),
}

/// Convenience alias used throughout the crate.
pub type UtilResult<T> = Result<T, UtilError>;

impl From<std::io::Error> for UtilError {
    fn from(source: std::io::Error) -> Self {
        UtilError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

impl UtilError {
    /// Wrap an IO error with the path it happened at.
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        UtilError::Io {
            path: path.into(),
            source,
        }
    }
}

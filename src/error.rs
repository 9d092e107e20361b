// Error type shared by every module of the library. The binary wraps it in
// `anyhow` for context, the library itself always returns `CliError`.

use std::path::PathBuf;
use thiserror::Error;

/// Substring the files API puts in its message when a name is already taken
/// within a dataset. The API has no structured code for this case.
const ALREADY_EXISTS_MARKER: &str = "already exists";

#[derive(Error, Debug)]
pub enum CliError {
    #[error("No such file or directory: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Not a regular file or directory: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("Request failed ({status}): {message}")]
    RemoteApi { status: u16, message: String },

    #[error("{0}")]
    AlreadyExists(String),

    #[error(
        "Detected file size mismatch for {}: uploaded {expected} bytes, remote reports {}",
        .path.display(),
        .actual.map_or_else(|| "no size".to_string(), |size| format!("{size} bytes"))
    )]
    SizeMismatch {
        path: PathBuf,
        expected: u64,
        actual: Option<u64>,
    },

    #[error("Could not verify uploaded file: {}", .0.display())]
    VerificationTimeout(PathBuf),

    #[error("Refusing to write remote file name outside the destination: {0}")]
    InvalidName(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Walk(#[from] walkdir::Error),

    #[error(transparent)]
    Query(#[from] serde_urlencoded::ser::Error),
}

impl CliError {
    /// Classify a non-2xx response. Messages naming an existing file become
    /// `AlreadyExists`, everything else is a plain `RemoteApi` error.
    pub fn remote(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if message.contains(ALREADY_EXISTS_MARKER) {
            CliError::AlreadyExists(message)
        } else {
            CliError::RemoteApi { status, message }
        }
    }
}

pub type Result<T> = std::result::Result<T, CliError>;

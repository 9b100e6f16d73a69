use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Application-wide error type for the retro CLI.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to launch editor: {0}")]
    Editor(String),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Failed to write configuration: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Failed to read JSON data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid exclude pattern: {0}")]
    Glob(#[from] globset::Error),

    #[error("Invalid ranking pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    #[error("'{0}' was not found in PATH")]
    MissingTool(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

impl AppError {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        AppError::Config(msg.into())
    }
}

/// Transport failure while talking to a listing server.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("transfer interrupted: {0}")]
    Stream(#[source] io::Error),
}

/// Failure of a single package inside an install batch.
///
/// These never abort the batch; the scheduler records them next to the
/// entry they belong to.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("network error: {0}")]
    Network(#[from] RemoteError),

    #[error("incomplete download: got {actual} of {expected} bytes")]
    IncompleteDownload { expected: u64, actual: u64 },

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("extraction failed: {0}")]
    Extraction(String),

    #[error("{}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid package name '{0}'")]
    InvalidName(String),

    #[error("system '{0}' is not configured")]
    UnknownSystem(String),
}

/// Failure of one disc-image conversion.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("could not run {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited with {status}")]
    Status { program: String, status: std::process::ExitStatus },

    #[error("no output written to {}", .0.display())]
    MissingOutput(PathBuf),

    #[error("{}: {source}", path.display())]
    Cleanup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl InstallError {
    pub fn fs(path: impl Into<PathBuf>, source: io::Error) -> Self {
        InstallError::Filesystem { path: path.into(), source }
    }
}

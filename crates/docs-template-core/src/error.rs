use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    Success = 0,
    NotFound = 1,
    Io = 2,
    Fetch = 3,
    Generation = 4,
    Diff = 5,
    InvalidArguments = 6,
    Config = 7,
}

impl ExitCode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Success),
            1 => Some(Self::NotFound),
            2 => Some(Self::Io),
            3 => Some(Self::Fetch),
            4 => Some(Self::Generation),
            5 => Some(Self::Diff),
            6 => Some(Self::InvalidArguments),
            7 => Some(Self::Config),
            _ => None,
        }
    }
}

/// Underlying transport failure, kept as the error source.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure retrieving the canonical template.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("template request failed: {0}")]
    Transport(#[source] BoxError),

    #[error("template request returned status {status}")]
    Status { status: u16 },
}

/// Failure of the generative rewrite collaborator.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("rewrite request failed: {0}")]
    Transport(#[source] BoxError),

    #[error("rewrite request rejected: {0}")]
    Request(String),

    #[error("rewrite service returned no candidate output")]
    Empty,

    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),

    #[error("rewrite did not finish within {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Error)]
pub enum MigrateError {
    #[error("source document not found at {path}")]
    NotFound { path: PathBuf },

    #[error("i/o error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to fetch template: {0}")]
    Fetch(#[from] FetchError),

    #[error("failed to generate updated document: {0}")]
    Generation(#[from] GenerationError),

    #[error("failed to generate patch: {0}")]
    Diff(String),
}

impl MigrateError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::NotFound { .. } => ExitCode::NotFound,
            Self::Io { .. } => ExitCode::Io,
            Self::Fetch(_) => ExitCode::Fetch,
            Self::Generation(_) => ExitCode::Generation,
            Self::Diff(_) => ExitCode::Diff,
        }
    }
}

pub type MigrateResult<T> = Result<T, MigrateError>;

use std::path::PathBuf;

use thiserror::Error;

/// Library error type for wallpaper engine operations.
///
/// Every variant is recoverable: the engine logs it and falls back to the
/// placeholder frame instead of propagating it to the host.
#[derive(Debug, Error)]
pub enum Error {
    /// The configured path or its parent directory is missing or unlistable.
    #[error("image source unavailable: {}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Multi-image mode found no matching files next to the configured path.
    #[error("no .jpg/.jpeg images found in {}", .0.display())]
    EmptyCandidateSet(PathBuf),

    /// The file exists but could not be probed or decoded as an image.
    #[error("failed to decode {}: {reason}", path.display())]
    Decode { path: PathBuf, reason: String },

    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML/serde configuration error.
    #[error(transparent)]
    Config(#[from] serde_yaml::Error),
}

impl Error {
    pub(crate) fn decode(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Decode {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

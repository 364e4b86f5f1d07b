//! Error types for the rendering engine.

use std::io;
use thiserror::Error;

/// Result type alias for rendering operations.
pub type Result<T> = std::result::Result<T, RenderError>;

/// Failures a render can produce.
///
/// Sanitization and theme resolution are total functions and have no variant
/// here. `AssetLoad` is the only recoverable kind: the orchestrator logs it
/// and carries on without the photo.
#[derive(Error, Debug)]
pub enum RenderError {
    /// The photo could not be read or decoded.
    #[error("asset load failed: {0}")]
    AssetLoad(String),

    /// Drawing or PDF encoding failed.
    #[error("rendering failed: {0}")]
    Render(String),

    /// The record identity cannot be used as an artifact key.
    #[error("invalid record identity: {0:?}")]
    InvalidIdentity(String),

    /// Writing or reading a persisted artifact failed.
    #[error("output I/O failed: {0}")]
    OutputIo(#[from] io::Error),
}

/// Coarse classification of a [`RenderError`], for callers that map errors
/// to their own reporting format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    AssetLoad,
    Render,
    InvalidIdentity,
    OutputIo,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::AssetLoad => "asset_load",
            ErrorKind::Render => "render",
            ErrorKind::InvalidIdentity => "invalid_identity",
            ErrorKind::OutputIo => "output_io",
        }
    }
}

impl RenderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RenderError::AssetLoad(_) => ErrorKind::AssetLoad,
            RenderError::Render(_) => ErrorKind::Render,
            RenderError::InvalidIdentity(_) => ErrorKind::InvalidIdentity,
            RenderError::OutputIo(_) => ErrorKind::OutputIo,
        }
    }

    /// Only photo failures may be swallowed.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, RenderError::AssetLoad(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        let err = RenderError::AssetLoad("missing.png".into());
        assert_eq!(err.kind(), ErrorKind::AssetLoad);
        assert!(err.is_recoverable());

        let err = RenderError::from(io::Error::new(io::ErrorKind::PermissionDenied, "ro"));
        assert_eq!(err.kind().as_str(), "output_io");
        assert!(!err.is_recoverable());
    }
}

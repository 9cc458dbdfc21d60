//! Error types for the symbols bridge
//!
//! This module provides a unified error handling strategy using `thiserror`
//! for defining error types and `anyhow` for error propagation with context.

use std::path::PathBuf;
use thiserror::Error;

/// The primary error type for session-core operations
#[derive(Error, Debug)]
pub enum Error {
    // ===== Validation errors (C8) =====
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid path: {path} - {reason}")]
    InvalidPath { path: PathBuf, reason: String },

    #[error("Position out of bounds: line {line}, character {character}")]
    PositionOutOfBounds { line: usize, character: usize },

    // ===== Workspace readiness (C4) =====
    #[error("Workspace is still loading, try again shortly")]
    WorkspaceLoadInProgress,

    // ===== Server lifecycle (C3) =====
    #[error("Language server is unavailable: {reason}")]
    ServerUnavailable { reason: String },

    // ===== Transport (C1) =====
    #[error("LSP error {code}: {message}")]
    LspError { code: i64, message: String },

    #[error("Request cancelled")]
    Cancelled,

    #[error("Transport closed")]
    TransportClosed,

    // ===== Generic =====
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Error kind for categorizing errors, surfaced to callers as a stable `code`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    FileNotFound,
    InvalidPath,
    PositionOutOfBounds,
    WorkspaceLoadInProgress,
    ServerUnavailable,
    LspError,
    Cancelled,
    Internal,
}

impl Error {
    /// Get the kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::FileNotFound { .. } | Error::Io(_) => ErrorKind::FileNotFound,
            Error::InvalidPath { .. } => ErrorKind::InvalidPath,
            Error::PositionOutOfBounds { .. } => ErrorKind::PositionOutOfBounds,
            Error::WorkspaceLoadInProgress => ErrorKind::WorkspaceLoadInProgress,
            Error::ServerUnavailable { .. } | Error::TransportClosed => {
                ErrorKind::ServerUnavailable
            }
            Error::LspError { .. } => ErrorKind::LspError,
            Error::Cancelled => ErrorKind::Cancelled,
            Error::Json(_) | Error::Internal(_) | Error::Other(_) => ErrorKind::Internal,
        }
    }

    /// Transient errors a caller may retry without changing their request
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::WorkspaceLoadInProgress | Error::Cancelled
        )
    }

    /// Errors that should end the session rather than just the call
    pub fn is_terminal(&self) -> bool {
        matches!(self, Error::ServerUnavailable { .. } | Error::TransportClosed)
    }
}

/// Extension trait for adding context to foreign errors
pub trait ErrorContext<T> {
    /// Add context to an error
    fn context<C>(self, context: C) -> crate::Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static;

    /// Add context lazily
    fn with_context<C, F>(self, f: F) -> crate::Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context<C>(self, context: C) -> crate::Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|e| Error::Other(anyhow::Error::from(e).context(context)))
    }

    fn with_context<C, F>(self, f: F) -> crate::Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| Error::Other(anyhow::Error::from(e).context(f())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind() {
        let err = Error::FileNotFound {
            path: PathBuf::from("/test"),
        };
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
    }

    #[test]
    fn test_recoverable_vs_terminal() {
        assert!(Error::WorkspaceLoadInProgress.is_recoverable());
        assert!(!Error::WorkspaceLoadInProgress.is_terminal());

        let unavailable = Error::ServerUnavailable {
            reason: "child exited".into(),
        };
        assert!(unavailable.is_terminal());
        assert!(!unavailable.is_recoverable());
    }
}

//! Result type alias shared across the session core

use crate::error::Error;

/// A specialized Result type for session-core operations
pub type Result<T, E = Error> = std::result::Result<T, E>;

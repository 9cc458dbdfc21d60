//! Symbols core
//!
//! Shared error, identifier, and telemetry types for the symbols bridge
//! workspace. Every other crate in this workspace depends on this one.

pub mod error;
pub mod id;
pub mod result;
pub mod telemetry;

pub use error::{Error, ErrorContext, ErrorKind};
pub use id::SessionId;
pub use result::Result;

/// Prelude for common imports across the workspace
pub mod prelude {
    pub use crate::error::{Error, ErrorContext, ErrorKind};
    pub use crate::id::SessionId;
    pub use crate::result::Result;
    pub use anyhow::Context as AnyhowContext;
    pub use tracing::{debug, error, info, instrument, trace, warn};
}

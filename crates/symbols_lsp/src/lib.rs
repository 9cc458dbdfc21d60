//! The LSP session core: spawns and drives a language-server subprocess on
//! behalf of an agent-protocol tool surface, and implements the eight tool
//! operations (inspect, references, completion, search, outline,
//! diagnostics, rename, logs) on top of it.
//!
//! [`session::Session`] is the entry point: [`session::Session::start`]
//! spawns the subprocess and runs the initialization sequence; the
//! `tools::*` functions are then called against the running session.

pub mod cancel;
pub mod config;
pub mod context;
pub mod document;
pub mod loader;
pub mod position;
pub mod session;
pub mod stores;
pub mod tools;
pub mod transport;
pub mod validation;

pub use cancel::CancelToken;
pub use config::ServerDescriptor;
pub use loader::LoaderRegistry;
pub use session::Session;

/// Common imports for a crate consumer driving a session end to end.
pub mod prelude {
    pub use crate::cancel::CancelToken;
    pub use crate::config::ServerDescriptor;
    pub use crate::document::Strategy;
    pub use crate::loader::LoaderRegistry;
    pub use crate::position::{OneBasedPosition, OneBasedRange};
    pub use crate::session::Session;
    pub use crate::tools;
    pub use symbols_core::{Error, ErrorContext, ErrorKind, Result};
}

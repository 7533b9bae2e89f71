//! confstack: Compose layered configuration documents
//!
//! Loads a base configuration document, applies a list of named override
//! documents in order, applies local key overwrites and runtime overrides,
//! resolves `${dotted.path}` interpolations, and produces one fully-resolved
//! configuration object for an external consumer.

pub mod cli;
pub mod compose;
pub mod config;
pub mod document;
pub mod error;
pub mod interp;
pub mod overrides;
pub mod registry;
pub mod render;
pub mod resolved;
pub mod utils;

pub use compose::Composer;
pub use error::{ComposeError, ComposeResult};
pub use resolved::ResolvedConfig;

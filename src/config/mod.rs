//! Tool settings
//!
//! The CLI's own settings, distinct from the documents it composes. Loaded
//! with precedence CLI > Env > File > Defaults.

pub mod loader;

pub use loader::{load_settings, Settings};

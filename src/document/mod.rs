//! Configuration document model
//!
//! Value trees, key paths, and YAML document parsing. `???` scalars surface as
//! an explicit `Deferred` variant rather than a magic string.

pub mod parse;
pub mod path;
pub mod value;

pub use parse::{load_document, parse_document, ConfigDocument};
pub use path::KeyPath;
pub use value::{Mapping, Value, DEFERRED_MARKER};

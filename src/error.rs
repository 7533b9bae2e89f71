//! Error types for configuration composition.
//!
//! Every error is fatal to the run and carries the offending path or location;
//! composition either fully succeeds or aborts before the consumer starts.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while composing or consuming a configuration.
#[derive(Error, Debug)]
pub enum ComposeError {
    /// Failed to read a document from disk.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed YAML.
    #[error("malformed document {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Structurally invalid document (non-string keys, non-mapping root).
    #[error("invalid document {path}: {reason}")]
    InvalidDocument { path: PathBuf, reason: String },

    /// A `defaults` entry that does not fit any recognized directive form.
    #[error("invalid defaults entry in {path}: {reason}")]
    InvalidDirective { path: PathBuf, reason: String },

    /// A directive named a document that does not exist in its group.
    #[error("no document named '{name}' in group '{group}' (searched {})", .searched.display())]
    MissingOverrideTarget {
        group: String,
        name: String,
        searched: PathBuf,
    },

    /// Two sibling directives target the same path with incompatible strategies.
    #[error("conflicting merge strategies for '{target}' within one defaults list")]
    MergeConflict { target: String },

    /// A document's defaults list pulled in a document already being composed.
    #[error("defaults cycle: {}", .chain.join(" -> "))]
    DefaultsCycle { chain: Vec<String> },

    /// Interpolation references looped back on themselves.
    #[error("interpolation cycle at '{path}': {}", .chain.join(" -> "))]
    CyclicInterpolation { path: String, chain: Vec<String> },

    /// An interpolation reference points nowhere in the composed tree.
    #[error("interpolation '${{{reference}}}' at '{at}' points nowhere in the composed configuration")]
    UnknownInterpolationPath { at: String, reference: String },

    /// A mapping or sequence was referenced from inside a larger string.
    #[error("cannot splice {kind} value '${{{reference}}}' into the string at '{at}'")]
    NonScalarInterpolation {
        at: String,
        reference: String,
        kind: &'static str,
    },

    /// A `???` value was read without ever being supplied.
    #[error("required value '{path}' was never supplied")]
    UnresolvedRequiredValue { path: String },

    /// A consumer read a path that does not exist.
    #[error("no value at '{path}'")]
    KeyNotFound { path: String },

    /// A consumer read a path holding a value of the wrong type.
    #[error("expected {expected} at '{path}', found {found}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A runtime `key=value` override that could not be parsed.
    #[error("invalid override '{spec}': {reason}")]
    InvalidOverride { spec: String, reason: String },
}

/// Type alias for Result with ComposeError.
pub type ComposeResult<T> = Result<T, ComposeError>;

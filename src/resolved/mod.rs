//! Consumer surface over a composed configuration.
//!
//! `ResolvedConfig` is immutable. Reads are where `???` finally bites: a
//! deferred value is not an error while it sits in the tree, only when a
//! consumer asks for it.

use crate::document::{KeyPath, Mapping, Value};
use crate::error::{ComposeError, ComposeResult};
use crate::utils::fingerprint;

/// Key naming the object an external consumer should instantiate, with its
/// sibling keys as constructor arguments.
pub const TARGET_KEY: &str = "_target_";

/// A fully composed, immutable configuration tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    root: Value,
}

impl ResolvedConfig {
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Raw node lookup. Deferred nodes are returned as-is.
    pub fn get(&self, path: &str) -> ComposeResult<&Value> {
        self.root
            .get(&KeyPath::parse(path))
            .ok_or_else(|| ComposeError::KeyNotFound { path: path.to_string() })
    }

    fn get_concrete(&self, path: &str) -> ComposeResult<&Value> {
        let value = self.get(path)?;
        if value.is_deferred() {
            return Err(ComposeError::UnresolvedRequiredValue { path: path.to_string() });
        }
        Ok(value)
    }

    pub fn get_str(&self, path: &str) -> ComposeResult<&str> {
        match self.get_concrete(path)? {
            Value::Str(s) => Ok(s),
            other => Err(mismatch(path, "string", other)),
        }
    }

    pub fn get_i64(&self, path: &str) -> ComposeResult<i64> {
        match self.get_concrete(path)? {
            Value::Int(i) => Ok(*i),
            other => Err(mismatch(path, "integer", other)),
        }
    }

    /// Numeric read; integer values widen to f64.
    pub fn get_f64(&self, path: &str) -> ComposeResult<f64> {
        match self.get_concrete(path)? {
            Value::Float(f) => Ok(*f),
            Value::Int(i) => Ok(*i as f64),
            other => Err(mismatch(path, "float", other)),
        }
    }

    pub fn get_bool(&self, path: &str) -> ComposeResult<bool> {
        match self.get_concrete(path)? {
            Value::Bool(b) => Ok(*b),
            other => Err(mismatch(path, "boolean", other)),
        }
    }

    pub fn get_seq(&self, path: &str) -> ComposeResult<&[Value]> {
        match self.get_concrete(path)? {
            Value::Seq(items) => Ok(items),
            other => Err(mismatch(path, "sequence", other)),
        }
    }

    pub fn get_map(&self, path: &str) -> ComposeResult<&Mapping> {
        match self.get_concrete(path)? {
            Value::Map(map) => Ok(map),
            other => Err(mismatch(path, "mapping", other)),
        }
    }

    /// Dotted paths of every value still deferred.
    pub fn deferred_paths(&self) -> Vec<String> {
        self.root.deferred_paths()
    }

    /// Fail on the first value still deferred anywhere in the tree.
    pub fn require_concrete(&self) -> ComposeResult<()> {
        match self.deferred_paths().into_iter().next() {
            Some(path) => Err(ComposeError::UnresolvedRequiredValue { path }),
            None => Ok(()),
        }
    }

    /// Extract the instantiation contract at `path`: the `_target_` name and
    /// its sibling keys as constructor arguments. Every argument must be
    /// concrete, since the consumer reads all of them at construction time.
    pub fn target_spec(&self, path: &str) -> ComposeResult<TargetSpec> {
        let map = self.get_map(path)?;
        let target_path = KeyPath::parse(path).child(TARGET_KEY).to_string();
        let target = match map.get(TARGET_KEY) {
            None => return Err(ComposeError::KeyNotFound { path: target_path }),
            Some(Value::Deferred) => {
                return Err(ComposeError::UnresolvedRequiredValue { path: target_path })
            }
            Some(Value::Str(s)) => s.clone(),
            Some(other) => return Err(mismatch(&target_path, "string", other)),
        };

        let mut args = map.clone();
        args.remove(TARGET_KEY);
        let holder = Value::Map(args.clone());
        if let Some(deferred) = holder.deferred_paths().into_iter().next() {
            return Err(ComposeError::UnresolvedRequiredValue {
                path: format!("{path}.{deferred}"),
            });
        }
        Ok(TargetSpec { target, args })
    }

    /// Stable 16-hex digest of the canonical rendering. Identical inputs
    /// always compose to identical fingerprints.
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.root.to_json().to_string())
    }
}

/// The instantiation contract handed to an external consumer.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetSpec {
    pub target: String,
    pub args: Mapping,
}

fn mismatch(path: &str, expected: &'static str, found: &Value) -> ComposeError {
    ComposeError::TypeMismatch { path: path.to_string(), expected, found: found.kind() }
}

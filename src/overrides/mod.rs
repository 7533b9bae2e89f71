//! Runtime override channel
//!
//! `dotted.path=value` strings from the invocation, merged after file-based
//! composition so `???` values can be supplied without editing documents.
//! Values parse as YAML, so `trainer.max_epochs=50` sets an integer and
//! `debug=true` a boolean. A `+` suffix on the path appends to a sequence.

use crate::document::{KeyPath, Value, DEFERRED_MARKER};
use crate::error::{ComposeError, ComposeResult};

#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeOverride {
    pub path: KeyPath,
    pub value: Value,
    pub append: bool,
}

impl RuntimeOverride {
    /// Parse one `dotted.path=value` spec.
    pub fn parse(spec: &str) -> ComposeResult<Self> {
        let Some((raw_path, raw_value)) = spec.split_once('=') else {
            return Err(invalid(spec, "expected 'dotted.path=value'"));
        };
        let raw_path = raw_path.trim();
        let (raw_path, append) = match raw_path.strip_suffix('+') {
            Some(stripped) => (stripped, true),
            None => (raw_path, false),
        };
        let path = KeyPath::parse(raw_path);
        if path.is_root() {
            return Err(invalid(spec, "override path is empty"));
        }
        let value = parse_value(spec, raw_value.trim())?;
        Ok(Self { path, value, append })
    }

    /// Write this override into a composed tree.
    pub fn apply(&self, root: &mut Value) {
        if self.append {
            if let Some(Value::Seq(existing)) = lookup_mut(root, &self.path) {
                match self.value.clone() {
                    Value::Seq(mut items) => existing.append(&mut items),
                    single => existing.push(single),
                }
                return;
            }
        }
        root.set(&self.path, self.value.clone());
    }
}

/// Parse every spec in order, keeping the order of application.
pub fn parse_overrides(specs: &[String]) -> ComposeResult<Vec<RuntimeOverride>> {
    specs.iter().map(|spec| RuntimeOverride::parse(spec)).collect()
}

fn parse_value(spec: &str, text: &str) -> ComposeResult<Value> {
    if text.is_empty() {
        return Ok(Value::Str(String::new()));
    }
    if text == DEFERRED_MARKER {
        return Ok(Value::Deferred);
    }
    match serde_yaml::from_str::<serde_yaml::Value>(text) {
        Ok(yaml) => Value::from_yaml(yaml).map_err(|reason| invalid(spec, &reason)),
        // Not parseable as YAML: take the text verbatim.
        Err(_) => Ok(Value::Str(text.to_string())),
    }
}

fn lookup_mut<'a>(root: &'a mut Value, path: &KeyPath) -> Option<&'a mut Value> {
    let mut node = root;
    for segment in path.segments() {
        match node {
            Value::Map(map) => node = map.get_mut(segment)?,
            _ => return None,
        }
    }
    Some(node)
}

fn invalid(spec: &str, reason: &str) -> ComposeError {
    ComposeError::InvalidOverride { spec: spec.to_string(), reason: reason.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Mapping;

    fn parse_tree(yaml: &str) -> Value {
        Value::from_yaml(serde_yaml::from_str(yaml).expect("yaml")).expect("value")
    }

    #[test]
    fn values_parse_as_yaml_scalars() {
        let o = RuntimeOverride::parse("trainer.max_epochs=50").expect("parse");
        assert_eq!(o.value, Value::Int(50));
        let o = RuntimeOverride::parse("trainer.accelerator=gpu").expect("parse");
        assert_eq!(o.value, Value::Str("gpu".to_string()));
        let o = RuntimeOverride::parse("debug=true").expect("parse");
        assert_eq!(o.value, Value::Bool(true));
        let o = RuntimeOverride::parse("logger=null").expect("parse");
        assert_eq!(o.value, Value::Null);
    }

    #[test]
    fn deferred_marker_re_defers() {
        let o = RuntimeOverride::parse("optimizer.lr=???").expect("parse");
        assert_eq!(o.value, Value::Deferred);
    }

    #[test]
    fn missing_equals_is_invalid() {
        assert!(matches!(
            RuntimeOverride::parse("trainer.max_epochs").unwrap_err(),
            ComposeError::InvalidOverride { .. }
        ));
    }

    #[test]
    fn empty_path_is_invalid() {
        assert!(RuntimeOverride::parse("=5").is_err());
    }

    #[test]
    fn apply_sets_nested_paths() {
        let mut root = Value::Map(Mapping::new());
        RuntimeOverride::parse("env.generator_params.num_jobs=20")
            .expect("parse")
            .apply(&mut root);
        assert_eq!(
            root.get(&KeyPath::parse("env.generator_params.num_jobs")),
            Some(&Value::Int(20))
        );
    }

    #[test]
    fn append_suffix_extends_sequences() {
        let mut root = parse_tree("tags: [a]\n");
        RuntimeOverride::parse("tags+=b").expect("parse").apply(&mut root);
        RuntimeOverride::parse("tags+=[c, d]").expect("parse").apply(&mut root);
        assert_eq!(root.get(&KeyPath::parse("tags")), Some(&parse_tree("[a, b, c, d]\n")));
    }

    #[test]
    fn append_without_sequence_just_sets() {
        let mut root = Value::Map(Mapping::new());
        RuntimeOverride::parse("tags+=b").expect("parse").apply(&mut root);
        assert_eq!(root.get(&KeyPath::parse("tags")), Some(&Value::Str("b".to_string())));
    }

    #[test]
    fn specs_parse_in_order() {
        let overrides = parse_overrides(&["a=1".to_string(), "b=2".to_string()]).expect("parse");
        assert_eq!(overrides.len(), 2);
        assert_eq!(overrides[0].path, KeyPath::parse("a"));
    }
}

//! Configuration tree values.

use std::collections::BTreeMap;

use super::path::KeyPath;

/// The `???` scalar that marks a value as required-but-deferred.
pub const DEFERRED_MARKER: &str = "???";

/// An ordered mapping of string keys to values.
///
/// Keys canonicalize to sorted order, so identical inputs always render to
/// byte-identical output.
pub type Mapping = BTreeMap<String, Value>;

/// A node in a configuration tree.
///
/// `Deferred` is the explicit variant behind the `???` marker. Consumers must
/// pattern-match it; it never masquerades as a real string.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Seq(Vec<Value>),
    Map(Mapping),
    Deferred,
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Seq(_) => "sequence",
            Value::Map(_) => "mapping",
            Value::Deferred => "deferred",
        }
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Value::Deferred)
    }

    /// Convert a parsed YAML value into a tree node.
    ///
    /// `???` scalars become [`Value::Deferred`]. Returns a reason string on
    /// structures the tree model rejects (non-string keys, YAML tags).
    pub fn from_yaml(yaml: serde_yaml::Value) -> Result<Self, String> {
        match yaml {
            serde_yaml::Value::Null => Ok(Value::Null),
            serde_yaml::Value::Bool(b) => Ok(Value::Bool(b)),
            serde_yaml::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::Int(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(Value::Float(f))
                } else {
                    Err(format!("unrepresentable number: {n}"))
                }
            }
            serde_yaml::Value::String(s) => {
                if s == DEFERRED_MARKER {
                    Ok(Value::Deferred)
                } else {
                    Ok(Value::Str(s))
                }
            }
            serde_yaml::Value::Sequence(seq) => {
                let items = seq.into_iter().map(Value::from_yaml).collect::<Result<Vec<_>, _>>()?;
                Ok(Value::Seq(items))
            }
            serde_yaml::Value::Mapping(mapping) => {
                let mut map = Mapping::new();
                for (key, value) in mapping {
                    let serde_yaml::Value::String(key) = key else {
                        return Err(format!("mapping key is not a string: {key:?}"));
                    };
                    map.insert(key, Value::from_yaml(value)?);
                }
                Ok(Value::Map(map))
            }
            serde_yaml::Value::Tagged(tagged) => {
                Err(format!("unsupported YAML tag: {}", tagged.tag))
            }
        }
    }

    /// Convert back to a YAML value. `Deferred` renders as the `???` marker.
    pub fn to_yaml(&self) -> serde_yaml::Value {
        match self {
            Value::Null => serde_yaml::Value::Null,
            Value::Bool(b) => serde_yaml::Value::Bool(*b),
            Value::Int(i) => serde_yaml::Value::Number((*i).into()),
            Value::Float(f) => serde_yaml::Value::Number(serde_yaml::Number::from(*f)),
            Value::Str(s) => serde_yaml::Value::String(s.clone()),
            Value::Seq(items) => {
                serde_yaml::Value::Sequence(items.iter().map(Value::to_yaml).collect())
            }
            Value::Map(map) => {
                let mut out = serde_yaml::Mapping::new();
                for (key, value) in map {
                    out.insert(serde_yaml::Value::String(key.clone()), value.to_yaml());
                }
                serde_yaml::Value::Mapping(out)
            }
            Value::Deferred => serde_yaml::Value::String(DEFERRED_MARKER.to_string()),
        }
    }

    /// Convert to a JSON value. `Deferred` renders as the `???` marker.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::Number((*i).into()),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::Seq(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(map) => {
                let mut out = serde_json::Map::new();
                for (key, value) in map {
                    out.insert(key.clone(), value.to_json());
                }
                serde_json::Value::Object(out)
            }
            Value::Deferred => serde_json::Value::String(DEFERRED_MARKER.to_string()),
        }
    }

    /// Look up a descendant node.
    pub fn get(&self, path: &KeyPath) -> Option<&Value> {
        let mut node = self;
        for segment in path.segments() {
            match node {
                Value::Map(map) => node = map.get(segment)?,
                _ => return None,
            }
        }
        Some(node)
    }

    /// Set the node at `path`, creating intermediate mappings as needed.
    /// Non-mapping intermediates are replaced by mappings.
    pub fn set(&mut self, path: &KeyPath, value: Value) {
        if path.is_root() {
            *self = value;
            return;
        }
        let mut node = self;
        let segments = path.segments();
        for segment in &segments[..segments.len() - 1] {
            if !matches!(node, Value::Map(_)) {
                *node = Value::Map(Mapping::new());
            }
            let Value::Map(map) = node else { unreachable!() };
            node = map.entry(segment.clone()).or_insert_with(|| Value::Map(Mapping::new()));
        }
        if !matches!(node, Value::Map(_)) {
            *node = Value::Map(Mapping::new());
        }
        let Value::Map(map) = node else { unreachable!() };
        map.insert(segments[segments.len() - 1].clone(), value);
    }

    /// Render a scalar for embedding inside a larger interpolated string.
    /// Returns `None` for sequences, mappings, and deferred values.
    pub fn scalar_to_string(&self) -> Option<String> {
        match self {
            Value::Null => Some("null".to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Str(s) => Some(s.clone()),
            Value::Seq(_) | Value::Map(_) | Value::Deferred => None,
        }
    }

    /// Dotted paths of every deferred node reachable from this one.
    pub fn deferred_paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        collect_deferred(self, &KeyPath::root(), &mut out);
        out
    }
}

fn collect_deferred(node: &Value, at: &KeyPath, out: &mut Vec<String>) {
    match node {
        Value::Deferred => out.push(at.to_string()),
        Value::Map(map) => {
            for (key, value) in map {
                collect_deferred(value, &at.child(key), out);
            }
        }
        Value::Seq(items) => {
            for (idx, item) in items.iter().enumerate() {
                collect_deferred(item, &at.child(&idx.to_string()), out);
            }
        }
        _ => {}
    }
}

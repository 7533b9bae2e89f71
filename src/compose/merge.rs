//! Deep-merge engine.
//!
//! Mapping nodes union recursively; scalar and sequence nodes are replaced
//! wholesale, never concatenated. The one exception is the explicit append
//! marker: an incoming key spelled `key+` concatenates onto an existing
//! sequence at `key`.

use crate::document::{KeyPath, Mapping, Value};

/// Merge `incoming` into `dest`. Incoming values win at colliding leaves.
pub fn merge_value(dest: &mut Value, incoming: Value) {
    match (&mut *dest, incoming) {
        (Value::Map(dest_map), Value::Map(incoming_map)) => {
            for (key, value) in incoming_map {
                merge_key(dest_map, key, value);
            }
        }
        (slot, incoming) => *slot = normalize(incoming),
    }
}

fn merge_key(dest_map: &mut Mapping, key: String, incoming: Value) {
    if let Some(base) = key.strip_suffix('+') {
        let incoming = normalize(incoming);
        match (dest_map.get_mut(base), incoming) {
            (Some(Value::Seq(existing)), Value::Seq(mut items)) => existing.append(&mut items),
            (_, incoming) => {
                dest_map.insert(base.to_string(), incoming);
            }
        }
    } else if let Some(existing) = dest_map.get_mut(&key) {
        merge_value(existing, incoming);
    } else {
        dest_map.insert(key, normalize(incoming));
    }
}

/// Deep-merge `incoming` at `path`, creating intermediate mappings as needed.
pub fn merge_at(root: &mut Value, path: &KeyPath, incoming: Value) {
    merge_value(node_at_mut(root, path), incoming);
}

/// Replace the node at `path` wholesale.
pub fn replace_at(root: &mut Value, path: &KeyPath, incoming: Value) {
    root.set(path, normalize(incoming));
}

fn node_at_mut<'a>(root: &'a mut Value, path: &KeyPath) -> &'a mut Value {
    let mut node = root;
    for segment in path.segments() {
        if !matches!(node, Value::Map(_)) {
            *node = Value::Map(Mapping::new());
        }
        let Value::Map(map) = node else { unreachable!() };
        node = map.entry(segment.clone()).or_insert_with(|| Value::Map(Mapping::new()));
    }
    node
}

/// Strip append markers from keys that land somewhere with nothing to append
/// to, so the final tree never carries a `key+` spelling.
fn normalize(value: Value) -> Value {
    match value {
        Value::Map(map) => {
            let mut out = Mapping::new();
            for (key, value) in map {
                let key = key.strip_suffix('+').unwrap_or(&key).to_string();
                out.insert(key, normalize(value));
            }
            Value::Map(out)
        }
        Value::Seq(items) => Value::Seq(items.into_iter().map(normalize).collect()),
        other => other,
    }
}

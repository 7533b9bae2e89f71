//! Interpolation resolution
//!
//! Resolves `${dotted.path}` references against the fully merged tree, to a
//! fixed point: a referenced value may itself contain further references.
//! Cycles are detected with an explicit in-progress chain per resolution, so a
//! loop fails deterministically instead of recursing forever.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::document::{KeyPath, Mapping, Value};
use crate::error::{ComposeError, ComposeResult};

static REF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").expect("valid interpolation pattern"));

/// A fully resolved tree plus the number of references resolved along the way.
#[derive(Debug)]
pub struct Resolution {
    pub value: Value,
    pub references_resolved: usize,
}

/// Resolve every interpolation reference in `root`.
pub fn resolve(root: &Value) -> ComposeResult<Resolution> {
    let mut resolver = Resolver { root, in_progress: Vec::new(), resolved: 0 };
    let value = resolver.resolve_node(root, &KeyPath::root())?;
    Ok(Resolution { value, references_resolved: resolver.resolved })
}

struct Resolver<'a> {
    root: &'a Value,
    in_progress: Vec<String>,
    resolved: usize,
}

impl Resolver<'_> {
    fn resolve_node(&mut self, node: &Value, at: &KeyPath) -> ComposeResult<Value> {
        match node {
            Value::Str(s) => self.resolve_string(s, at),
            Value::Seq(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (idx, item) in items.iter().enumerate() {
                    out.push(self.resolve_node(item, &at.child(&idx.to_string()))?);
                }
                Ok(Value::Seq(out))
            }
            Value::Map(map) => {
                let mut out = Mapping::new();
                for (key, value) in map {
                    out.insert(key.clone(), self.resolve_node(value, &at.child(key))?);
                }
                Ok(Value::Map(out))
            }
            other => Ok(other.clone()),
        }
    }

    fn resolve_string(&mut self, s: &str, at: &KeyPath) -> ComposeResult<Value> {
        let Some(first) = REF_RE.find(s) else {
            return Ok(Value::Str(s.to_string()));
        };

        // A whole-scalar reference splices the referenced node of any type.
        if first.start() == 0 && first.end() == s.len() {
            let reference = &s[2..s.len() - 1];
            return self.resolve_reference(reference, at);
        }

        // Embedded references stringify scalars into the surrounding text.
        let mut out = String::new();
        let mut last = 0;
        for caps in REF_RE.captures_iter(s) {
            let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let reference = inner.as_str();
            let target = self.resolve_reference(reference, at)?;
            if target.is_deferred() {
                // A string containing a deferred part is itself deferred.
                return Ok(Value::Deferred);
            }
            let Some(text) = target.scalar_to_string() else {
                return Err(ComposeError::NonScalarInterpolation {
                    at: at.to_string(),
                    reference: reference.to_string(),
                    kind: target.kind(),
                });
            };
            out.push_str(&s[last..whole.start()]);
            out.push_str(&text);
            last = whole.end();
        }
        out.push_str(&s[last..]);
        Ok(Value::Str(out))
    }

    fn resolve_reference(&mut self, reference: &str, at: &KeyPath) -> ComposeResult<Value> {
        if self.in_progress.iter().any(|r| r == reference) {
            let mut chain = self.in_progress.clone();
            chain.push(reference.to_string());
            return Err(ComposeError::CyclicInterpolation {
                path: reference.to_string(),
                chain,
            });
        }

        let root = self.root;
        let path = KeyPath::parse(reference);
        let Some(target) = root.get(&path) else {
            return Err(ComposeError::UnknownInterpolationPath {
                at: at.to_string(),
                reference: reference.to_string(),
            });
        };

        self.in_progress.push(reference.to_string());
        let resolved = self.resolve_node(target, &path)?;
        self.in_progress.pop();
        self.resolved += 1;
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Value {
        Value::from_yaml(serde_yaml::from_str(yaml).expect("yaml")).expect("value")
    }

    fn lookup<'a>(value: &'a Value, path: &str) -> &'a Value {
        value.get(&KeyPath::parse(path)).expect("path")
    }

    #[test]
    fn whole_scalar_reference_keeps_the_target_type() {
        let tree = parse(
            "env:\n  generator_params:\n    max_processing_time: 99\nscaling_factor: ${env.generator_params.max_processing_time}\n",
        );
        let resolved = resolve(&tree).expect("resolve").value;
        assert_eq!(lookup(&resolved, "scaling_factor"), &Value::Int(99));
    }

    #[test]
    fn whole_scalar_reference_splices_subtrees() {
        let tree = parse("model:\n  embed_dim: 128\nshadow: ${model}\n");
        let resolved = resolve(&tree).expect("resolve").value;
        assert_eq!(lookup(&resolved, "shadow.embed_dim"), &Value::Int(128));
    }

    #[test]
    fn embedded_references_stringify() {
        let tree = parse("run: ffsp\nseed: 7\nrun_name: ${run}-seed${seed}\n");
        let resolved = resolve(&tree).expect("resolve").value;
        assert_eq!(lookup(&resolved, "run_name"), &Value::Str("ffsp-seed7".to_string()));
    }

    #[test]
    fn references_chain_to_a_fixed_point() {
        let tree = parse("a: ${b}\nb: ${c}\nc: 42\n");
        let resolved = resolve(&tree).expect("resolve").value;
        assert_eq!(lookup(&resolved, "a"), &Value::Int(42));
    }

    #[test]
    fn cycles_error_instead_of_looping() {
        let tree = parse("x: ${y}\ny: ${x}\n");
        let err = resolve(&tree).unwrap_err();
        match err {
            ComposeError::CyclicInterpolation { path, chain } => {
                assert!(path == "x" || path == "y");
                assert!(chain.len() >= 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let tree = parse("x: ${x}\n");
        assert!(matches!(resolve(&tree).unwrap_err(), ComposeError::CyclicInterpolation { .. }));
    }

    #[test]
    fn unknown_reference_reports_both_locations() {
        let tree = parse("a:\n  b: ${nowhere.at.all}\n");
        let err = resolve(&tree).unwrap_err();
        match err {
            ComposeError::UnknownInterpolationPath { at, reference } => {
                assert_eq!(at, "a.b");
                assert_eq!(reference, "nowhere.at.all");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn deferred_targets_propagate() {
        let tree = parse("lr: '???'\nschedule: ${lr}\nlabel: lr=${lr}\n");
        let resolved = resolve(&tree).expect("resolve").value;
        assert_eq!(lookup(&resolved, "schedule"), &Value::Deferred);
        assert_eq!(lookup(&resolved, "label"), &Value::Deferred);
    }

    #[test]
    fn embedding_a_mapping_errors() {
        let tree = parse("model:\n  embed_dim: 128\nlabel: model=${model}\n");
        assert!(matches!(
            resolve(&tree).unwrap_err(),
            ComposeError::NonScalarInterpolation { .. }
        ));
    }

    #[test]
    fn resolved_count_is_tracked() {
        let tree = parse("a: ${b}\nb: ${c}\nc: 1\n");
        let resolution = resolve(&tree).expect("resolve");
        assert!(resolution.references_resolved >= 2);
    }
}

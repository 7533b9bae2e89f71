//! `defaults` list interpretation.
//!
//! A document's `defaults` is an ordered sequence of directives naming which
//! group documents to pull into the composition:
//!
//! ```yaml
//! defaults:
//!   - base                       # root-group document, merged at the root
//!   - model: attention           # group document, merged at its group path
//!   - logger: null               # disabled, nothing is loaded
//!   - override env/generator: large   # full replacement at the group path
//! ```

use std::collections::BTreeMap;

use crate::document::{ConfigDocument, KeyPath, Value};
use crate::error::{ComposeError, ComposeResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Deep-merge the document into the accumulating tree.
    Merge,
    /// Replace the node at the target path wholesale.
    Replace,
}

/// One entry of a `defaults` list.
#[derive(Debug, Clone, PartialEq)]
pub struct OverrideDirective {
    /// Slash-separated group path; empty for the root group.
    pub group: String,
    /// Document name within the group; `None` when the entry is disabled.
    pub name: Option<String>,
    pub strategy: MergeStrategy,
}

impl OverrideDirective {
    /// The tree path this directive writes to.
    pub fn target(&self) -> KeyPath {
        KeyPath::from_group_path(&self.group)
    }

    /// Human-readable rendering for traces and reports.
    pub fn display(&self) -> String {
        let name = self.name.as_deref().unwrap_or("null");
        let prefix = match self.strategy {
            MergeStrategy::Merge => "",
            MergeStrategy::Replace => "override ",
        };
        if self.group.is_empty() {
            format!("{prefix}{name}")
        } else {
            format!("{}{}: {}", prefix, self.group, name)
        }
    }
}

/// Interpret a document's raw `defaults` node.
///
/// Sibling directives targeting the same path with different strategies are a
/// conflict; with the same strategy, the later one simply wins at merge time.
pub fn parse_defaults(doc: &ConfigDocument) -> ComposeResult<Vec<OverrideDirective>> {
    let Some(raw) = &doc.defaults else {
        return Ok(Vec::new());
    };
    let Value::Seq(items) = raw else {
        return Err(invalid(doc, format!("defaults must be a sequence, found {}", raw.kind())));
    };

    let mut directives = Vec::with_capacity(items.len());
    for item in items {
        directives.push(parse_directive(doc, item)?);
    }

    check_strategy_conflicts(&directives)?;
    Ok(directives)
}

fn parse_directive(doc: &ConfigDocument, item: &Value) -> ComposeResult<OverrideDirective> {
    match item {
        Value::Str(name) => Ok(OverrideDirective {
            group: String::new(),
            name: Some(name.clone()),
            strategy: MergeStrategy::Merge,
        }),
        Value::Map(map) => {
            if map.len() != 1 {
                return Err(invalid(
                    doc,
                    format!("a directive must hold exactly one 'group: name' pair, found {} keys", map.len()),
                ));
            }
            let (key, value) =
                map.iter().next().ok_or_else(|| invalid(doc, "empty directive".to_string()))?;

            let (strategy, group) = match key.strip_prefix("override ") {
                Some(rest) => (MergeStrategy::Replace, rest.trim()),
                None => (MergeStrategy::Merge, key.trim()),
            };
            let group = group.trim_start_matches('/').to_string();

            let name = match value {
                Value::Str(name) if !name.is_empty() => Some(name.clone()),
                Value::Null => None,
                other => {
                    return Err(invalid(
                        doc,
                        format!("document name for group '{group}' must be a string or null, found {}", other.kind()),
                    ))
                }
            };

            Ok(OverrideDirective { group, name, strategy })
        }
        other => Err(invalid(doc, format!("unrecognized directive of kind {}", other.kind()))),
    }
}

fn check_strategy_conflicts(directives: &[OverrideDirective]) -> ComposeResult<()> {
    let mut seen: BTreeMap<String, MergeStrategy> = BTreeMap::new();
    for directive in directives {
        let target = directive.target().to_string();
        if let Some(existing) = seen.get(&target) {
            if *existing != directive.strategy {
                return Err(ComposeError::MergeConflict { target });
            }
        }
        seen.insert(target, directive.strategy);
    }
    Ok(())
}

fn invalid(doc: &ConfigDocument, reason: String) -> ComposeError {
    ComposeError::InvalidDirective { path: doc.path.clone(), reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse_document;
    use std::path::Path;

    fn defaults_of(yaml: &str) -> ComposeResult<Vec<OverrideDirective>> {
        let doc = parse_document(yaml, Path::new("entry.yaml")).expect("parse");
        parse_defaults(&doc)
    }

    #[test]
    fn plain_group_directive() {
        let directives = defaults_of("defaults:\n  - model: attention\n").expect("defaults");
        assert_eq!(
            directives,
            vec![OverrideDirective {
                group: "model".to_string(),
                name: Some("attention".to_string()),
                strategy: MergeStrategy::Merge,
            }]
        );
    }

    #[test]
    fn bare_string_targets_root_group() {
        let directives = defaults_of("defaults:\n  - base\n").expect("defaults");
        assert_eq!(directives[0].group, "");
        assert!(directives[0].target().is_root());
    }

    #[test]
    fn override_marker_sets_replace_strategy() {
        let directives =
            defaults_of("defaults:\n  - override /env/generator: large\n").expect("defaults");
        assert_eq!(directives[0].group, "env/generator");
        assert_eq!(directives[0].strategy, MergeStrategy::Replace);
        assert_eq!(directives[0].display(), "override env/generator: large");
    }

    #[test]
    fn null_name_disables_a_directive() {
        let directives = defaults_of("defaults:\n  - logger: null\n").expect("defaults");
        assert_eq!(directives[0].name, None);
    }

    #[test]
    fn conflicting_strategies_on_one_target_error() {
        let err = defaults_of(
            "defaults:\n  - env/generator: small\n  - override env/generator: large\n",
        )
        .unwrap_err();
        match err {
            ComposeError::MergeConflict { target } => assert_eq!(target, "env.generator"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn same_strategy_twice_is_allowed() {
        let directives =
            defaults_of("defaults:\n  - trainer: default\n  - trainer: long\n").expect("defaults");
        assert_eq!(directives.len(), 2);
    }

    #[test]
    fn non_sequence_defaults_error() {
        let err = defaults_of("defaults: everything\n").unwrap_err();
        assert!(matches!(err, ComposeError::InvalidDirective { .. }));
    }

    #[test]
    fn multi_key_directive_errors() {
        let err = defaults_of("defaults:\n  - model: attention\n    env: ffsp\n").unwrap_err();
        assert!(matches!(err, ComposeError::InvalidDirective { .. }));
    }
}

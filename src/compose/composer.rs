//! Composition driver.
//!
//! Applies a document's `defaults` list in order, merges the document's own
//! body last among the file-based layers, applies runtime overrides, then
//! resolves interpolations. One-shot and deterministic: identical inputs
//! produce an identical resolved tree.

use std::path::{Path, PathBuf};

use crate::document::{load_document, ConfigDocument, KeyPath, Mapping, Value};
use crate::error::{ComposeError, ComposeResult};
use crate::interp;
use crate::overrides::RuntimeOverride;
use crate::registry::DocumentRegistry;
use crate::resolved::ResolvedConfig;

use super::defaults::{parse_defaults, MergeStrategy};
use super::merge;

/// Counters describing one composition run.
#[derive(Debug, Clone, Default)]
pub struct ComposeStats {
    pub documents_loaded: usize,
    pub directives_applied: usize,
    pub overrides_applied: usize,
    pub interpolations_resolved: usize,
    pub deferred_remaining: usize,
}

pub struct Composer {
    registry: DocumentRegistry,
    runtime_overrides: Vec<RuntimeOverride>,
    stats: ComposeStats,
    applied: Vec<String>,
}

impl Composer {
    pub fn new(config_root: impl Into<PathBuf>) -> Self {
        Self {
            registry: DocumentRegistry::new(config_root),
            runtime_overrides: Vec::new(),
            stats: ComposeStats::default(),
            applied: Vec::new(),
        }
    }

    /// Overrides applied after all file-based layers, in the given order.
    pub fn runtime_overrides(mut self, overrides: Vec<RuntimeOverride>) -> Self {
        self.runtime_overrides = overrides;
        self
    }

    /// Counters from the most recent composition.
    pub fn stats(&self) -> &ComposeStats {
        &self.stats
    }

    /// Directives applied during the most recent composition, in order.
    pub fn applied_directives(&self) -> &[String] {
        &self.applied
    }

    /// Compose the entry document at `entry` into one resolved configuration.
    pub fn compose(&mut self, entry: &Path) -> ComposeResult<ResolvedConfig> {
        let doc = load_document(entry)?;
        self.compose_document(doc)
    }

    /// Compose an already-parsed entry document.
    pub fn compose_document(&mut self, doc: ConfigDocument) -> ComposeResult<ResolvedConfig> {
        self.stats = ComposeStats::default();
        self.applied.clear();

        let mut acc = Value::Map(Mapping::new());
        let mut chain: Vec<String> = Vec::new();
        self.apply_defaults(&doc, &mut acc, &mut chain)?;

        // The entry document's own keys win over everything from defaults,
        // regardless of list order.
        merge::merge_at(&mut acc, &KeyPath::root(), Value::Map(doc.body));

        for o in &self.runtime_overrides {
            o.apply(&mut acc);
            self.stats.overrides_applied += 1;
        }

        let resolution = interp::resolve(&acc)?;
        self.stats.interpolations_resolved = resolution.references_resolved;

        let resolved = ResolvedConfig::new(resolution.value);
        self.stats.deferred_remaining = resolved.deferred_paths().len();
        Ok(resolved)
    }

    fn apply_defaults(
        &mut self,
        doc: &ConfigDocument,
        acc: &mut Value,
        chain: &mut Vec<String>,
    ) -> ComposeResult<()> {
        for directive in parse_defaults(doc)? {
            let Some(name) = directive.name.clone() else {
                tracing::debug!("skipping disabled directive in {}", doc.path.display());
                continue;
            };

            let label = if directive.group.is_empty() {
                name.clone()
            } else {
                format!("{}/{}", directive.group, name)
            };
            if chain.contains(&label) {
                let mut cycle = chain.clone();
                cycle.push(label);
                return Err(ComposeError::DefaultsCycle { chain: cycle });
            }

            let child = self.registry.load(&directive.group, &name)?.clone();
            self.stats.documents_loaded += 1;

            // A pulled document may carry its own defaults; they apply before
            // its body so the body wins within that document's layer.
            if child.defaults.is_some() {
                chain.push(label);
                self.apply_defaults(&child, acc, chain)?;
                chain.pop();
            }

            let target = directive.target();
            match directive.strategy {
                MergeStrategy::Merge => merge::merge_at(acc, &target, Value::Map(child.body)),
                MergeStrategy::Replace => merge::replace_at(acc, &target, Value::Map(child.body)),
            }
            tracing::debug!("applied directive '{}'", directive.display());
            self.stats.directives_applied += 1;
            self.applied.push(directive.display());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overrides::parse_overrides;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("mkdir");
        }
        fs::write(path, content).expect("write");
    }

    fn fixture() -> TempDir {
        let tmp = TempDir::new().expect("tmp");
        let root = tmp.path();
        write(root, "base.yaml", "trainer:\n  max_epochs: 10\n  devices: 1\nseed: 1\n");
        write(root, "model/attention.yaml", "_target_: models.AttentionModel\nembed_dim: 128\n");
        write(root, "env/ffsp.yaml", "name: ffsp\ngenerator_params:\n  num_jobs: 20\n  max_processing_time: 99\n");
        write(root, "env/generator/small.yaml", "num_jobs: 10\nnum_machines: 2\n");
        write(root, "env/generator/large.yaml", "num_jobs: 50\n");
        write(root, "trainer/default.yaml", "max_epochs: 50\naccelerator: auto\n");
        tmp
    }

    fn compose(tmp: &TempDir, entry_yaml: &str) -> ComposeResult<ResolvedConfig> {
        compose_with(tmp, entry_yaml, &[])
    }

    fn compose_with(
        tmp: &TempDir,
        entry_yaml: &str,
        overrides: &[&str],
    ) -> ComposeResult<ResolvedConfig> {
        write(tmp.path(), "entry.yaml", entry_yaml);
        let specs: Vec<String> = overrides.iter().map(|s| s.to_string()).collect();
        let mut composer =
            Composer::new(tmp.path()).runtime_overrides(parse_overrides(&specs)?);
        composer.compose(&tmp.path().join("entry.yaml"))
    }

    #[test]
    fn later_defaults_win_at_colliding_paths() {
        let tmp = fixture();
        let resolved = compose(&tmp, "defaults:\n  - base\n  - trainer: default\n").expect("compose");
        // base says 10, the later trainer/default layer says 50
        assert_eq!(resolved.get_i64("trainer.max_epochs").expect("epochs"), 50);
        // non-colliding keys from both layers survive
        assert_eq!(resolved.get_i64("trainer.devices").expect("devices"), 1);
        assert_eq!(resolved.get_str("trainer.accelerator").expect("accelerator"), "auto");
    }

    #[test]
    fn entry_body_wins_over_all_defaults() {
        let tmp = fixture();
        let resolved = compose(
            &tmp,
            "defaults:\n  - base\n  - trainer: default\ntrainer:\n  max_epochs: 7\n",
        )
        .expect("compose");
        assert_eq!(resolved.get_i64("trainer.max_epochs").expect("epochs"), 7);
    }

    #[test]
    fn reordering_non_colliding_directives_changes_nothing() {
        let tmp = fixture();
        let a = compose(&tmp, "defaults:\n  - model: attention\n  - env: ffsp\n").expect("compose");
        let b = compose(&tmp, "defaults:\n  - env: ffsp\n  - model: attention\n").expect("compose");
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn override_directive_replaces_wholesale() {
        let tmp = fixture();
        let resolved = compose(
            &tmp,
            "defaults:\n  - env/generator: small\n  - override env/generator: large\n",
        );
        // small + override large targets one path with two strategies
        assert!(matches!(resolved.unwrap_err(), ComposeError::MergeConflict { .. }));

        let resolved =
            compose(&tmp, "defaults:\n  - override env/generator: large\n").expect("compose");
        assert_eq!(resolved.get_i64("env.generator.num_jobs").expect("jobs"), 50);
        assert!(resolved.get("env.generator.num_machines").is_err());
    }

    #[test]
    fn interpolation_sees_the_fully_merged_tree() {
        let tmp = fixture();
        let resolved = compose(
            &tmp,
            "defaults:\n  - env: ffsp\nscaling_factor: ${env.generator_params.max_processing_time}\n",
        )
        .expect("compose");
        assert_eq!(resolved.get_i64("scaling_factor").expect("scaling"), 99);
    }

    #[test]
    fn runtime_overrides_apply_last_and_feed_interpolation() {
        let tmp = fixture();
        let resolved = compose_with(
            &tmp,
            "defaults:\n  - env: ffsp\nscaling_factor: ${env.generator_params.max_processing_time}\n",
            &["env.generator_params.max_processing_time=17"],
        )
        .expect("compose");
        assert_eq!(resolved.get_i64("scaling_factor").expect("scaling"), 17);
        assert_eq!(resolved.get_i64("env.generator_params.max_processing_time").expect("mpt"), 17);
    }

    #[test]
    fn runtime_override_supplies_a_deferred_value() {
        let tmp = fixture();
        write(tmp.path(), "optimizer/adam.yaml", "lr: '???'\nweight_decay: 0.0\n");

        let unsupplied =
            compose(&tmp, "defaults:\n  - optimizer: adam\n").expect("compose");
        assert!(matches!(
            unsupplied.get_f64("optimizer.lr").unwrap_err(),
            ComposeError::UnresolvedRequiredValue { .. }
        ));

        let supplied = compose_with(
            &tmp,
            "defaults:\n  - optimizer: adam\n",
            &["optimizer.lr=0.001"],
        )
        .expect("compose");
        assert_eq!(supplied.get_f64("optimizer.lr").expect("lr"), 0.001);
    }

    #[test]
    fn nested_defaults_compose_before_the_pulling_document_body() {
        let tmp = fixture();
        write(
            tmp.path(),
            "experiment/big.yaml",
            "defaults:\n  - override /env/generator: large\nnotes: big run\n",
        );
        let resolved =
            compose(&tmp, "defaults:\n  - experiment: big\n").expect("compose");
        assert_eq!(resolved.get_i64("env.generator.num_jobs").expect("jobs"), 50);
        assert_eq!(resolved.get_str("experiment.notes").expect("notes"), "big run");
    }

    #[test]
    fn defaults_cycles_are_detected() {
        let tmp = fixture();
        write(tmp.path(), "a/x.yaml", "defaults:\n  - b: y\n");
        write(tmp.path(), "b/y.yaml", "defaults:\n  - a: x\n");
        let err = compose(&tmp, "defaults:\n  - a: x\n").unwrap_err();
        match err {
            ComposeError::DefaultsCycle { chain } => assert!(chain.contains(&"a/x".to_string())),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_document_fails_composition() {
        let tmp = fixture();
        let err = compose(&tmp, "defaults:\n  - model: transformer\n").unwrap_err();
        assert!(matches!(err, ComposeError::MissingOverrideTarget { .. }));
    }

    #[test]
    fn stats_track_the_run() {
        let tmp = fixture();
        write(tmp.path(), "entry.yaml", "defaults:\n  - base\n  - model: attention\n  - logger: null\nrun_name: ${env_name}-run\nenv_name: ffsp\n");
        let mut composer = Composer::new(tmp.path());
        composer.compose(&tmp.path().join("entry.yaml")).expect("compose");
        let stats = composer.stats();
        assert_eq!(stats.documents_loaded, 2);
        assert_eq!(stats.directives_applied, 2);
        assert_eq!(stats.interpolations_resolved, 1);
        assert_eq!(stats.deferred_remaining, 0);
        assert_eq!(composer.applied_directives(), &["base".to_string(), "model: attention".to_string()]);
    }
}

//! Document registry
//!
//! Explicit lookup table mapping (group, name) to parsed documents, backed by
//! a fixed directory layout under one config root: each group is a directory,
//! each document a `.yaml`/`.yml` file inside it. Documents parse once and are
//! served from cache afterwards.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::document::{load_document, ConfigDocument};
use crate::error::{ComposeError, ComposeResult};

const DOCUMENT_EXTENSIONS: [&str; 2] = ["yaml", "yml"];

pub struct DocumentRegistry {
    root: PathBuf,
    cache: HashMap<(String, String), ConfigDocument>,
}

impl DocumentRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), cache: HashMap::new() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load the document `name` from `group`, parsing it on first use.
    ///
    /// `group` is a slash-separated path under the config root; the empty
    /// group addresses documents directly in the root directory.
    pub fn load(&mut self, group: &str, name: &str) -> ComposeResult<&ConfigDocument> {
        let key = (group.to_string(), name.to_string());
        if !self.cache.contains_key(&key) {
            let doc = self.load_uncached(group, name)?;
            self.cache.insert(key.clone(), doc);
        }
        // Entry was just inserted if absent.
        Ok(&self.cache[&key])
    }

    fn load_uncached(&self, group: &str, name: &str) -> ComposeResult<ConfigDocument> {
        let dir = group_dir(&self.root, group);
        for ext in DOCUMENT_EXTENSIONS {
            let candidate = dir.join(format!("{name}.{ext}"));
            if candidate.is_file() {
                tracing::debug!("loading document {}", candidate.display());
                return load_document(&candidate);
            }
        }
        Err(ComposeError::MissingOverrideTarget {
            group: group.to_string(),
            name: name.to_string(),
            searched: dir,
        })
    }

    /// Group paths under the root that directly contain at least one document.
    /// The empty string stands for the root directory itself.
    pub fn groups(&self) -> ComposeResult<Vec<String>> {
        let mut groups = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(0).sort_by_file_name() {
            let entry = entry.map_err(|e| walk_error(&self.root, e))?;
            if !entry.file_type().is_dir() {
                continue;
            }
            let group = relative_group(&self.root, entry.path());
            if !self.documents_in(&group)?.is_empty() {
                groups.push(group);
            }
        }
        Ok(groups)
    }

    /// Document names (file stems) directly inside `group`, sorted.
    pub fn documents_in(&self, group: &str) -> ComposeResult<Vec<String>> {
        let dir = group_dir(&self.root, group);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in WalkDir::new(&dir).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| walk_error(&dir, e))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            if !DOCUMENT_EXTENSIONS.contains(&ext) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        names.dedup();
        Ok(names)
    }
}

fn group_dir(root: &Path, group: &str) -> PathBuf {
    let mut dir = root.to_path_buf();
    for segment in group.split('/').filter(|s| !s.is_empty()) {
        dir.push(segment);
    }
    dir
}

fn relative_group(root: &Path, dir: &Path) -> String {
    let rel = dir.strip_prefix(root).unwrap_or(dir);
    rel.components()
        .filter_map(|c| c.as_os_str().to_str())
        .collect::<Vec<_>>()
        .join("/")
}

fn walk_error(dir: &Path, err: walkdir::Error) -> ComposeError {
    let io = err
        .into_io_error()
        .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "directory walk failed"));
    ComposeError::Io { path: dir.to_path_buf(), source: io }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn registry_fixture() -> (TempDir, DocumentRegistry) {
        let tmp = TempDir::new().expect("tmp");
        fs::create_dir_all(tmp.path().join("model")).expect("mkdir");
        fs::create_dir_all(tmp.path().join("env/generator")).expect("mkdir");
        fs::write(tmp.path().join("base.yaml"), "seed: 1\n").expect("write");
        fs::write(tmp.path().join("model/attention.yaml"), "embed_dim: 128\n").expect("write");
        fs::write(tmp.path().join("model/pointer.yml"), "embed_dim: 64\n").expect("write");
        fs::write(tmp.path().join("env/generator/large.yaml"), "num_jobs: 50\n").expect("write");
        let registry = DocumentRegistry::new(tmp.path());
        (tmp, registry)
    }

    #[test]
    fn load_finds_yaml_and_yml() {
        let (_tmp, mut registry) = registry_fixture();
        assert!(registry.load("model", "attention").is_ok());
        assert!(registry.load("model", "pointer").is_ok());
        assert!(registry.load("env/generator", "large").is_ok());
        assert!(registry.load("", "base").is_ok());
    }

    #[test]
    fn missing_document_reports_searched_dir() {
        let (_tmp, mut registry) = registry_fixture();
        let err = registry.load("model", "transformer").unwrap_err();
        match err {
            ComposeError::MissingOverrideTarget { group, name, searched } => {
                assert_eq!(group, "model");
                assert_eq!(name, "transformer");
                assert!(searched.ends_with("model"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn groups_enumerates_directories_with_documents() {
        let (_tmp, registry) = registry_fixture();
        let groups = registry.groups().expect("groups");
        assert_eq!(groups, vec!["", "env/generator", "model"]);
    }

    #[test]
    fn documents_in_lists_stems_sorted() {
        let (_tmp, registry) = registry_fixture();
        let docs = registry.documents_in("model").expect("docs");
        assert_eq!(docs, vec!["attention", "pointer"]);
    }

    #[test]
    fn documents_parse_once_and_cache() {
        let (tmp, mut registry) = registry_fixture();
        registry.load("model", "attention").expect("first load");
        // Removing the file does not invalidate an already-parsed document.
        fs::remove_file(tmp.path().join("model/attention.yaml")).expect("remove");
        assert!(registry.load("model", "attention").is_ok());
    }
}

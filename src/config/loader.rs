//! Settings file loading

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Toml, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "CONFSTACK_";

/// Settings for the tool itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Default config root when `--config-root` is not given.
    pub config_root: Option<PathBuf>,
    /// Default output format, `yaml` or `json`.
    pub format: Option<String>,
    /// Reject compositions that still contain `???` values.
    #[serde(default)]
    pub strict: bool,
}

pub fn load_settings(cwd: &Path, settings_path: Option<&Path>) -> Result<Settings> {
    let settings_path_provided = settings_path.is_some();

    let discovered = match settings_path {
        Some(path) => Some(path.to_path_buf()),
        None => discover_settings(cwd),
    };

    let Some(settings_file) = discovered else {
        return env_only();
    };

    let ext =
        settings_file.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
    let figment = Figment::from(Serialized::defaults(Settings::default()));
    let figment = match ext.as_str() {
        "toml" => figment.merge(Toml::file(&settings_file)),
        "yaml" | "yml" => figment.merge(Yaml::file(&settings_file)),
        other => {
            let err = anyhow::anyhow!(
                "Unsupported settings extension '.{}' for file {}",
                other,
                settings_file.display()
            );
            if settings_path_provided {
                return Err(err);
            }
            tracing::warn!("{}", err);
            return env_only();
        }
    };

    match figment.merge(Env::prefixed(ENV_PREFIX)).extract() {
        Ok(settings) => Ok(settings),
        Err(e) => {
            if settings_path_provided {
                Err(e).with_context(|| {
                    format!("Failed to load settings from {}", settings_file.display())
                })
            } else {
                // Auto-discovered: warn and fall back to env + defaults.
                tracing::warn!(
                    "Failed to parse auto-discovered settings {}: {}",
                    settings_file.display(),
                    e
                );
                env_only()
            }
        }
    }
}

fn env_only() -> Result<Settings> {
    Figment::from(Serialized::defaults(Settings::default()))
        .merge(Env::prefixed(ENV_PREFIX))
        .extract()
        .context("Failed to read settings from the environment")
}

fn discover_settings(cwd: &Path) -> Option<PathBuf> {
    let candidates =
        ["confstack.toml", ".confstack.toml", "confstack.yaml", ".confstack.yaml"];

    for candidate in candidates {
        let path = cwd.join(candidate);
        if path.exists() {
            return Some(path);
        }
    }

    None
}

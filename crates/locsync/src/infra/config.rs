//! Configuration management utilities.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs_next::config_dir;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));
static DEFAULT_WORKSPACE_CONFIG_PATH: &str = ".locsync/config.toml";

/// Layered configuration loaded from defaults, user, workspace, and env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub export: Export,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defaults {
    /// Collection that reconciliation writes into.
    #[serde(default = "Defaults::default_collection")]
    pub collection: String,
    /// Mode added when a collection is created without one.
    #[serde(default = "Defaults::default_mode")]
    pub mode: String,
    #[serde(default = "Defaults::default_export_format")]
    pub export_format: String,
    #[serde(default = "Defaults::default_notify_timeout_secs")]
    pub notify_timeout_secs: u64,
}

impl Defaults {
    fn default_collection() -> String {
        "Localized".to_owned()
    }

    fn default_mode() -> String {
        "Default".into()
    }

    fn default_export_format() -> String {
        "csv".into()
    }

    fn default_notify_timeout_secs() -> u64 {
        5
    }
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            collection: Self::default_collection(),
            mode: Self::default_mode(),
            export_format: Self::default_export_format(),
            notify_timeout_secs: Self::default_notify_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Export {
    /// Explicit template name or path; unset, the template follows the
    /// chosen format.
    #[serde(default)]
    template: Option<String>,
    #[serde(default)]
    include_bound: Option<bool>,
    #[serde(default)]
    include_hidden: Option<bool>,
}

impl Export {
    fn default_include_bound() -> bool {
        true
    }

    fn default_include_hidden() -> bool {
        false
    }

    pub fn template(&self) -> Option<&str> {
        self.template.as_deref()
    }

    pub fn include_bound(&self) -> bool {
        self.include_bound.unwrap_or_else(Self::default_include_bound)
    }

    pub fn include_hidden(&self) -> bool {
        self.include_hidden
            .unwrap_or_else(Self::default_include_hidden)
    }
}

impl Default for Export {
    fn default() -> Self {
        Self {
            template: None,
            include_bound: Some(Self::default_include_bound()),
            include_hidden: Some(Self::default_include_hidden()),
        }
    }
}

/// Environment overrides for critical settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    collection: Option<String>,
    export_format: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            collection: env::var("LOCSYNC_COLLECTION").ok(),
            export_format: env::var("LOCSYNC_EXPORT_FORMAT").ok(),
        }
    }

    #[cfg(test)]
    fn for_tests(collection: &str, export_format: &str) -> Self {
        Self {
            collection: Some(collection.to_owned()),
            export_format: Some(export_format.to_owned()),
        }
    }
}

impl Config {
    /// Load configuration from defaults, user/global config, workspace config, and env overrides.
    pub fn load() -> Result<Self> {
        let env = EnvOverrides::from_env();
        let global = global_config_path();
        let workspace = workspace_config_path()?;
        Self::load_with_layers(global, workspace, env)
    }

    fn load_with_layers(
        global: Option<PathBuf>,
        workspace: Option<PathBuf>,
        env_overrides: EnvOverrides,
    ) -> Result<Self> {
        let mut layers: Vec<Config> = Vec::new();

        layers.push(Self::from_str(&DEFAULT_CONFIG)?);

        if let Some(global_path) = global.filter(|path| path.exists()) {
            layers.push(Self::from_file(&global_path)?);
        }

        if let Some(workspace_path) = workspace.filter(|path| path.exists()) {
            layers.push(Self::from_file(&workspace_path)?);
        }

        let merged = layers.into_iter().reduce(Config::merge).unwrap_or_default();
        Ok(apply_env_overrides(merged, env_overrides))
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&data)
    }

    fn from_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(config)
    }

    fn merge(self, other: Self) -> Self {
        Self {
            defaults: merge_defaults(self.defaults, other.defaults),
            export: merge_export(self.export, other.export),
        }
    }
}

fn merge_defaults(base: Defaults, overlay: Defaults) -> Defaults {
    Defaults {
        collection: if overlay.collection != Defaults::default_collection() {
            overlay.collection
        } else {
            base.collection
        },
        mode: if overlay.mode != Defaults::default_mode() {
            overlay.mode
        } else {
            base.mode
        },
        export_format: if overlay.export_format != Defaults::default_export_format() {
            overlay.export_format
        } else {
            base.export_format
        },
        notify_timeout_secs: if overlay.notify_timeout_secs
            != Defaults::default_notify_timeout_secs()
        {
            overlay.notify_timeout_secs
        } else {
            base.notify_timeout_secs
        },
    }
}

fn merge_export(mut base: Export, overlay: Export) -> Export {
    if let Some(value) = overlay.template {
        base.template = Some(value);
    }
    if let Some(value) = overlay.include_bound {
        base.include_bound = Some(value);
    }
    if let Some(value) = overlay.include_hidden {
        base.include_hidden = Some(value);
    }
    base
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("locsync/config.toml"))
}

fn workspace_config_path() -> Result<Option<PathBuf>> {
    let cwd = env::current_dir()?;
    let root = find_workspace_root(&cwd).unwrap_or(cwd);
    Ok(Some(root.join(DEFAULT_WORKSPACE_CONFIG_PATH)))
}

fn find_workspace_root(start: &Path) -> Option<PathBuf> {
    let mut current = start;
    loop {
        if current.join(".locsync").exists() {
            return Some(current.to_path_buf());
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Config {
    if let Some(collection) = env.collection {
        config.defaults.collection = collection;
    }
    if let Some(export_format) = env.export_format {
        config.defaults.export_format = export_format;
    }
    config
}

//! Discovery configuration.
//!
//! Loaded from `--config`, else from the user config directory when present,
//! else built-in defaults. Command-line flags override file values.
use crate::catalog::Service;
use crate::gateway::SshSettings;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_SCHEMA_VERSION: u32 = 1;
pub const DEFAULT_FROM_VERSION: &str = "7.2";

const CONFIG_DIR_NAME: &str = "cluster-discovery";
const CONFIG_FILE_NAME: &str = "config.json";

fn default_from_version() -> String {
    DEFAULT_FROM_VERSION.to_string()
}

/// Per-host or topology-derived keys the provisioner regenerates itself.
const DEFAULT_SKIP_PROPERTIES: &[(&str, &[&str])] = &[
    ("kafka_broker", &["broker.id", "advertised.listeners", "zookeeper.connect"]),
    ("schema_registry", &["kafkastore.bootstrap.servers", "host.name"]),
    ("kafka_rest", &["bootstrap.servers", "host.name"]),
    ("ksql", &["bootstrap.servers"]),
    ("control_center", &["bootstrap.servers"]),
    ("kafka_connect", &["bootstrap.servers", "rest.advertised.host.name"]),
];

fn default_skip_properties() -> BTreeMap<String, Vec<String>> {
    DEFAULT_SKIP_PROPERTIES
        .iter()
        .map(|(service, keys)| {
            let keys = keys.iter().map(|key| key.to_string()).collect();
            (service.to_string(), keys)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiscoveryConfig {
    pub schema_version: u32,
    /// Platform version the cluster runs, e.g. `7.2`.
    #[serde(default = "default_from_version")]
    pub from_version: String,
    /// Services to discover by name; empty means every service.
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub ssh: SshSettings,
    /// Service name -> source keys never reported as custom properties.
    /// A file that sets this replaces the built-in lists.
    #[serde(default = "default_skip_properties")]
    pub skip_properties: BTreeMap<String, Vec<String>>,
}

impl DiscoveryConfig {
    /// Selected services in discovery order.
    pub fn selected_services(&self) -> Result<Vec<Service>> {
        if self.services.is_empty() {
            return Ok(Service::ALL.to_vec());
        }
        let mut selected = BTreeSet::new();
        for name in &self.services {
            selected.insert(Service::from_name(name)?);
        }
        Ok(selected.into_iter().collect())
    }

    pub fn skip_properties(&self, service: Service) -> BTreeSet<String> {
        self.skip_properties
            .get(service.name())
            .map(|keys| keys.iter().cloned().collect())
            .unwrap_or_default()
    }
}

pub fn default_config() -> DiscoveryConfig {
    DiscoveryConfig {
        schema_version: CONFIG_SCHEMA_VERSION,
        from_version: default_from_version(),
        services: Vec::new(),
        ssh: SshSettings::default(),
        skip_properties: default_skip_properties(),
    }
}

pub fn load_config(path: &Path) -> Result<DiscoveryConfig> {
    let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    let config: DiscoveryConfig = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse config JSON {}", path.display()))?;
    Ok(config)
}

pub fn write_config(path: &Path, config: &DiscoveryConfig) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context("create config dir")?;
    }
    let text = serde_json::to_string_pretty(config).context("serialize config")?;
    fs::write(path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn validate_config(config: &DiscoveryConfig) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported config schema_version {}",
            config.schema_version
        ));
    }
    if config.from_version.trim().is_empty() {
        return Err(anyhow!("from_version must be non-empty"));
    }
    for name in config.services.iter().chain(config.skip_properties.keys()) {
        Service::from_name(name).with_context(|| format!("config names service {name:?}"))?;
    }
    Ok(())
}

/// Default location of the user config file, whether or not it exists.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Explicit path, else the user config file when it exists.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    default_config_path().filter(|path| path.is_file())
}

/// Load and validate the effective config for one run.
pub fn effective_config(explicit: Option<&Path>) -> Result<DiscoveryConfig> {
    let Some(path) = resolve_config_path(explicit) else {
        tracing::debug!("no config file, using defaults");
        return Ok(default_config());
    };
    let config = load_config(&path)?;
    validate_config(&config).with_context(|| format!("validate {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

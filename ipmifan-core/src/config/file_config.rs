//! Top-level configuration file schema
//!
//! This configuration is read once at startup and is immutable afterwards.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

use super::hosts::HostEntry;
use crate::error::{IpmiFanError, Result};
use crate::types::HostProfile;

/// Default polling interval in seconds
pub const DEFAULT_INTERVAL_SECS: u64 = 60;

fn default_interval() -> u64 {
    DEFAULT_INTERVAL_SECS
}

/// `general` section of the configuration file
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneralConfig {
    /// Dry-run: echo IPMI commands instead of executing them
    #[serde(default)]
    pub debug: bool,
    /// Seconds between two polling cycles
    #[serde(default = "default_interval")]
    pub interval: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            debug: false,
            interval: DEFAULT_INTERVAL_SECS,
        }
    }
}

impl GeneralConfig {
    /// Check the settings the daemon will actually run with.
    ///
    /// Called once command-line overrides are merged, so a zero interval in
    /// the file is fine when `--interval` replaces it.
    pub fn validate(&self) -> Result<()> {
        if self.interval == 0 {
            return Err(IpmiFanError::Config(
                "Polling interval must be at least 1 second".to_string(),
            ));
        }
        Ok(())
    }
}

/// Serialization format of a configuration file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML, the default
    Yaml,
    /// TOML, selected by a `.toml` extension
    Toml,
}

impl ConfigFormat {
    /// Pick the format from a file extension; anything but `.toml` is YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Yaml,
        }
    }
}

/// Complete configuration file
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Global settings
    #[serde(default)]
    pub general: GeneralConfig,
    /// Managed hosts
    #[serde(default)]
    pub hosts: Vec<HostEntry>,
}

impl FileConfig {
    /// Parse FileConfig from a YAML string.
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Parse FileConfig from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Parse FileConfig in the given format.
    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self> {
        match format {
            ConfigFormat::Yaml => Self::from_yaml(content),
            ConfigFormat::Toml => Self::from_toml(content),
        }
    }

    /// Validate every host entry and return the immutable profiles, in file order.
    ///
    /// Fails on the first invalid entry, on a duplicate host name and on an
    /// empty host list. The `general` section is checked separately, see
    /// [`GeneralConfig::validate`].
    pub fn host_profiles(&self) -> Result<Vec<HostProfile>> {
        if self.hosts.is_empty() {
            return Err(IpmiFanError::Config(
                "No hosts configured".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let mut profiles = Vec::with_capacity(self.hosts.len());

        for entry in &self.hosts {
            let profile = entry.validate()?;
            if !seen.insert(profile.name.clone()) {
                return Err(IpmiFanError::DuplicateHost(profile.name));
            }
            profiles.push(profile);
        }

        Ok(profiles)
    }
}

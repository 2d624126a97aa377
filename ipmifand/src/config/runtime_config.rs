//! Runtime configuration
//!
//! Combines the configuration file with command-line overrides. Everything
//! here is immutable once the governor starts.

use ipmifan_core::{ConfigFormat, FileConfig, GeneralConfig, HostProfile, IpmiFanError, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::{debug, info};

/// Validated configuration the daemon runs with.
#[derive(Debug, Clone)]
pub(crate) struct RuntimeConfig {
    /// Where the configuration was read from
    path: PathBuf,

    /// Global settings after command-line overrides
    general: GeneralConfig,

    /// Managed hosts, in file order
    hosts: Vec<HostProfile>,
}

impl RuntimeConfig {
    /// Load and validate the configuration file.
    ///
    /// A missing file is an error: there is no sensible default host list.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use std::path::Path;
    ///
    /// let config = RuntimeConfig::load(Path::new("/etc/ipmifan/fan_control.yaml")).await?;
    /// println!("Managing {} host(s)", config.hosts().len());
    /// ```
    pub async fn load(config_path: &Path) -> Result<Self> {
        info!("Loading configuration from: {}", config_path.display());

        if !config_path.is_file() {
            return Err(IpmiFanError::Config(format!(
                "Missing or unspecified configuration file: {}",
                config_path.display()
            )));
        }

        let content = fs::read_to_string(config_path).await.map_err(|e| {
            IpmiFanError::Config(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;

        let format = ConfigFormat::from_path(config_path);
        debug!("Parsing configuration as {:?}", format);

        let file_config = FileConfig::parse(&content, format).map_err(|e| {
            IpmiFanError::Config(format!(
                "Failed to parse config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;

        Self::from_file_config(config_path, file_config)
    }

    /// Validate an already parsed configuration.
    pub fn from_file_config(path: &Path, file_config: FileConfig) -> Result<Self> {
        let hosts = file_config.host_profiles()?;

        let remote = hosts.iter().filter(|host| host.is_remote()).count();
        info!(
            "Configuration loaded: {} host(s) ({} remote), interval {}s{}",
            hosts.len(),
            remote,
            file_config.general.interval,
            if file_config.general.debug {
                ", dry-run"
            } else {
                ""
            }
        );

        Ok(Self {
            path: path.to_path_buf(),
            general: file_config.general,
            hosts,
        })
    }

    /// Apply command-line overrides, which take precedence over the file,
    /// then check the merged settings.
    ///
    /// `debug` can only switch dry-run on. A zero interval is rejected here,
    /// whether it comes from the file or the command line.
    pub fn apply_overrides(&mut self, debug: bool, interval: Option<u64>) -> Result<()> {
        if debug {
            self.general.debug = true;
        }
        if let Some(interval) = interval {
            self.general.interval = interval;
        }
        self.general.validate()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether IPMI commands are only echoed
    pub fn dry_run(&self) -> bool {
        self.general.debug
    }

    /// Pause between two polling cycles
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.general.interval)
    }

    pub fn hosts(&self) -> &[HostProfile] {
        &self.hosts
    }

    /// Consume the configuration, keeping only the host profiles.
    pub fn into_hosts(self) -> Vec<HostProfile> {
        self.hosts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const YAML: &str = r#"
general:
  interval: 30
hosts:
  - name: MyLocalHost
    temperatures: [34, 37, 55]
    speeds: [9, 10, 15]
"#;

    async fn write_config(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).await.unwrap();
        path
    }

    #[tokio::test]
    async fn test_load_yaml() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "fan_control.yaml", YAML).await;

        let config = RuntimeConfig::load(&path).await.unwrap();
        assert_eq!(config.path(), path.as_path());
        assert_eq!(config.interval(), Duration::from_secs(30));
        assert!(!config.dry_run());
        assert_eq!(config.hosts().len(), 1);
        assert_eq!(config.hosts()[0].name, "MyLocalHost");
    }

    #[tokio::test]
    async fn test_load_toml() {
        let dir = TempDir::new().unwrap();
        let content = r#"
            [general]
            debug = true

            [[hosts]]
            name = "node1"
            temperatures = [40, 50, 60]
            speeds = [10, 20, 30]
            hysteresis = 3
        "#;
        let path = write_config(&dir, "fan_control.toml", content).await;

        let config = RuntimeConfig::load(&path).await.unwrap();
        assert!(config.dry_run());
        assert_eq!(config.interval(), Duration::from_secs(60));
        assert_eq!(config.hosts()[0].hysteresis, 3.0);
    }

    #[tokio::test]
    async fn test_missing_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let result = RuntimeConfig::load(&dir.path().join("absent.yaml")).await;
        assert!(matches!(result, Err(IpmiFanError::Config(_))));
    }

    #[tokio::test]
    async fn test_invalid_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            "fan_control.yaml",
            "hosts:\n  - name: a\n    temperatures: [1, 2]\n    speeds: [5, 6, 7]\n",
        )
        .await;

        match RuntimeConfig::load(&path).await {
            Err(IpmiFanError::Config(msg)) => assert!(msg.contains("2 temperature thresholds")),
            other => panic!("Expected Config error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_zero_file_interval_replaced_by_override() {
        let dir = TempDir::new().unwrap();
        let content = YAML.replace("interval: 30", "interval: 0");
        let path = write_config(&dir, "fan_control.yaml", &content).await;

        let mut config = RuntimeConfig::load(&path).await.unwrap();
        config.apply_overrides(false, Some(5)).unwrap();
        assert_eq!(config.interval(), Duration::from_secs(5));

        let mut config = RuntimeConfig::load(&path).await.unwrap();
        assert!(matches!(
            config.apply_overrides(false, None),
            Err(IpmiFanError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_overrides_win_over_file() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "fan_control.yaml", YAML).await;
        let mut config = RuntimeConfig::load(&path).await.unwrap();

        config.apply_overrides(false, None).unwrap();
        assert!(!config.dry_run());
        assert_eq!(config.interval(), Duration::from_secs(30));

        config.apply_overrides(true, Some(5)).unwrap();
        assert!(config.dry_run());
        assert_eq!(config.interval(), Duration::from_secs(5));
        assert_eq!(config.into_hosts().len(), 1);
    }
}

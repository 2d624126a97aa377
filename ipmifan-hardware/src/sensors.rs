//! CPU temperature acquisition
//!
//! Three sources exist, picked from the host profile:
//! - a remote host runs its `remote_temperature_command`
//! - a local host with a `temperature_command` runs it locally
//! - any other local host averages every `coretemp` hwmon input
//!
//! Commands must print one reading per line; all readings are averaged.

use async_trait::async_trait;
use ipmifan_core::{HostProfile, IpmiFanError, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::{debug, trace};

use crate::process::{output_with_timeout, shell, DEFAULT_COMMAND_TIMEOUT_SECS};

/// Default sysfs hwmon location
pub const HWMON_BASE: &str = "/sys/class/hwmon";

/// hwmon chip name of Intel per-core sensors
pub const CORETEMP_CHIP: &str = "coretemp";

/// Trait for temperature acquisition
///
/// This trait enables testing of the polling loop without sensors by
/// allowing mock implementations.
#[async_trait]
pub trait TemperatureSource: Send + Sync {
    /// Average CPU temperature of `host`, in degrees Celsius
    async fn read_temperature(&self, host: &HostProfile) -> Result<f64>;
}

/// Average a list of readings, failing when there is none.
pub fn average(readings: &[f64]) -> Result<f64> {
    if readings.is_empty() {
        return Err(IpmiFanError::NoData("no temperature readings".to_string()));
    }
    Ok(readings.iter().sum::<f64>() / readings.len() as f64)
}

/// Parse newline-separated readings printed by a temperature command.
///
/// Blank lines are skipped; any other unparseable line fails the whole read.
pub fn parse_readings(output: &str) -> Result<Vec<f64>> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            line.parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .ok_or_else(|| {
                    IpmiFanError::Parse(format!("invalid temperature reading: {:?}", line))
                })
        })
        .collect()
}

/// Temperature source backed by the local system
#[derive(Debug, Clone)]
pub struct SystemSensors {
    hwmon_base: PathBuf,
    timeout_duration: Duration,
}

impl Default for SystemSensors {
    fn default() -> Self {
        Self::new(
            PathBuf::from(HWMON_BASE),
            Duration::from_secs(DEFAULT_COMMAND_TIMEOUT_SECS),
        )
    }
}

impl SystemSensors {
    /// Create a source reading hwmon from `hwmon_base`
    pub fn new(hwmon_base: PathBuf, timeout_duration: Duration) -> Self {
        Self {
            hwmon_base,
            timeout_duration,
        }
    }

    /// Run a shell command and average the readings it prints
    pub async fn read_command(&self, command: &str) -> Result<f64> {
        debug!("Running temperature command: {}", command);

        let output = output_with_timeout(shell(command), self.timeout_duration).await?;
        if !output.status.success() {
            return Err(IpmiFanError::CommandFailed(format!(
                "temperature command exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        average(&parse_readings(&stdout)?)
    }

    /// Average every `temp*_input` of every `coretemp` hwmon chip
    pub async fn read_coretemp(&self) -> Result<f64> {
        let mut readings = Vec::new();

        if !self.hwmon_base.exists() {
            return Err(IpmiFanError::NoData(format!(
                "{} does not exist",
                self.hwmon_base.display()
            )));
        }

        let mut entries = fs::read_dir(&self.hwmon_base).await?;

        while let Some(entry) = entries.next_entry().await? {
            let hwmon_dir = entry.path();

            // Get chip name
            let chip_name = match read_trimmed(&hwmon_dir.join("name")).await {
                Ok(name) => name,
                Err(_) => continue,
            };
            if chip_name != CORETEMP_CHIP {
                continue;
            }

            readings.extend(read_chip_inputs(&hwmon_dir).await?);
        }

        trace!("coretemp readings: {:?}", readings);
        average(&readings)
    }
}

#[async_trait]
impl TemperatureSource for SystemSensors {
    async fn read_temperature(&self, host: &HostProfile) -> Result<f64> {
        if let Some(remote) = &host.remote {
            return self.read_command(&remote.temperature_command).await;
        }
        if let Some(command) = &host.temperature_command {
            return self.read_command(command).await;
        }
        self.read_coretemp().await
    }
}

async fn read_trimmed(path: &Path) -> Result<String> {
    Ok(fs::read_to_string(path).await?.trim().to_string())
}

/// Read all `temp*_input` files of one hwmon chip (millidegrees to Celsius)
async fn read_chip_inputs(hwmon_dir: &Path) -> Result<Vec<f64>> {
    let mut readings = Vec::new();
    let mut entries = fs::read_dir(hwmon_dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let file_name = entry.file_name();
        let file_name = file_name.to_string_lossy();
        if !(file_name.starts_with("temp") && file_name.ends_with("_input")) {
            continue;
        }

        let raw = read_trimmed(&entry.path()).await?;
        let millidegrees: i64 = raw.parse().map_err(|_| {
            IpmiFanError::Parse(format!("invalid value {:?} in {}", raw, file_name))
        })?;
        readings.push(millidegrees as f64 / 1000.0);
    }

    Ok(readings)
}

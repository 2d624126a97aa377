//! Per-host configuration entries
//!
//! A [`HostEntry`] mirrors one item of the `hosts` list exactly as written in
//! the configuration file. [`HostEntry::validate`] turns it into a
//! [`HostProfile`] or explains what is wrong with it.

use serde::Deserialize;
use tracing::warn;

use crate::error::{IpmiFanError, Result};
use crate::types::{
    is_valid_duty_cycle, HostProfile, RemoteAccess, BAND_COUNT, MAX_DUTY_CYCLE, MIN_DUTY_CYCLE,
};

/// `remote_ipmi_credentials` block of a host entry.
///
/// Every field is optional at the schema level so that a missing one produces
/// a readable configuration error instead of a bare deserialization error.
#[derive(Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialsEntry {
    /// BMC address
    pub host: Option<String>,
    /// BMC user
    pub username: Option<String>,
    /// BMC password
    pub password: Option<String>,
}

impl std::fmt::Debug for CredentialsEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsEntry")
            .field("host", &self.host.as_ref().map(|_| "___"))
            .field("username", &self.username.as_ref().map(|_| "___"))
            .field("password", &self.password.as_ref().map(|_| "___"))
            .finish()
    }
}

/// One managed host, as written in the configuration file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HostEntry {
    /// Unique host name
    pub name: String,
    /// Temperature thresholds, exactly three expected
    pub temperatures: Vec<f64>,
    /// Fan speeds in percent, exactly three expected
    pub speeds: Vec<i64>,
    /// Step-down margin in degrees, defaults to 0
    #[serde(default)]
    pub hysteresis: Option<f64>,
    /// Local command printing newline-separated temperatures
    #[serde(default)]
    pub temperature_command: Option<String>,
    /// Remote command printing newline-separated temperatures
    #[serde(default)]
    pub remote_temperature_command: Option<String>,
    /// Remote BMC credentials
    #[serde(default)]
    pub remote_ipmi_credentials: Option<CredentialsEntry>,
}

impl HostEntry {
    /// Validate this entry and build the immutable profile.
    pub fn validate(&self) -> Result<HostProfile> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(IpmiFanError::Config("Host name cannot be empty".to_string()));
        }

        let temperatures = self.thresholds(name)?;
        let speeds = self.duty_cycles(name)?;

        let hysteresis = self.hysteresis.unwrap_or(0.0);
        if !hysteresis.is_finite() || hysteresis < 0.0 {
            return Err(IpmiFanError::Config(format!(
                "Host \"{}\" has an invalid hysteresis of {} (must be a non-negative number)",
                name, hysteresis
            )));
        }

        let remote = self.remote_access(name)?;
        if remote.is_some() && self.temperature_command.is_some() {
            return Err(IpmiFanError::Config(format!(
                "Host \"{}\" cannot combine \"temperature_command\" with remote keys.",
                name
            )));
        }

        Ok(HostProfile {
            name: name.to_string(),
            temperatures,
            speeds,
            hysteresis,
            temperature_command: self.temperature_command.clone(),
            remote,
        })
    }

    fn thresholds(&self, name: &str) -> Result<[f64; BAND_COUNT]> {
        let temperatures: [f64; BAND_COUNT] =
            self.temperatures.as_slice().try_into().map_err(|_| {
                IpmiFanError::Config(format!(
                    "Host \"{}\" has {} temperature thresholds instead of {}.",
                    name,
                    self.temperatures.len(),
                    BAND_COUNT
                ))
            })?;

        if let Some(t) = temperatures.iter().find(|t| !t.is_finite()) {
            return Err(IpmiFanError::Config(format!(
                "Host \"{}\" has a non-numeric temperature threshold: {}",
                name, t
            )));
        }

        for window in temperatures.windows(2) {
            if window[0] >= window[1] {
                return Err(IpmiFanError::Config(format!(
                    "Host \"{}\" temperature thresholds must be strictly ascending: {} >= {}",
                    name, window[0], window[1]
                )));
            }
        }

        Ok(temperatures)
    }

    fn duty_cycles(&self, name: &str) -> Result<[u8; BAND_COUNT]> {
        if self.speeds.len() != BAND_COUNT {
            return Err(IpmiFanError::Config(format!(
                "Host \"{}\" has {} fan speeds instead of {}.",
                name,
                self.speeds.len(),
                BAND_COUNT
            )));
        }

        let mut speeds = [0u8; BAND_COUNT];
        for (slot, &raw) in speeds.iter_mut().zip(&self.speeds) {
            *slot = u8::try_from(raw)
                .ok()
                .filter(|&s| is_valid_duty_cycle(s))
                .ok_or_else(|| {
                    IpmiFanError::Config(format!(
                        "Host \"{}\" has a fan speed of {}% (must be {}-{})",
                        name, raw, MIN_DUTY_CYCLE, MAX_DUTY_CYCLE
                    ))
                })?;
        }

        if speeds.windows(2).any(|w| w[0] > w[1]) {
            warn!(
                "Host \"{}\" has fan speeds that decrease as temperature rises: {:?}",
                name, speeds
            );
        }

        Ok(speeds)
    }

    fn remote_access(&self, name: &str) -> Result<Option<RemoteAccess>> {
        match (
            &self.remote_temperature_command,
            &self.remote_ipmi_credentials,
        ) {
            (None, None) => Ok(None),
            (Some(command), Some(credentials)) => {
                let CredentialsEntry {
                    host: Some(host),
                    username: Some(username),
                    password: Some(password),
                } = credentials
                else {
                    return Err(IpmiFanError::Config(format!(
                        "Host \"{}\" must specify either none or all \"host\", \"username\" and \"password\" values for the \"remote_ipmi_credentials\" key.",
                        name
                    )));
                };
                Ok(Some(RemoteAccess {
                    temperature_command: command.clone(),
                    ipmi_host: host.clone(),
                    ipmi_user: username.clone(),
                    ipmi_password: password.clone(),
                }))
            }
            _ => Err(IpmiFanError::Config(format!(
                "Host \"{}\" must specify either none or both \"remote_temperature_command\" and \"remote_ipmi_credentials\" keys.",
                name
            ))),
        }
    }
}

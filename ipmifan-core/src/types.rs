//! Core types for the IPMI fan governor

use std::fmt;

/// Number of temperature bands (and therefore thresholds and speeds) per host
pub const BAND_COUNT: usize = 3;

/// Lowest duty cycle the governor will ever command
pub const MIN_DUTY_CYCLE: u8 = 5;

/// Highest duty cycle the governor will ever command
pub const MAX_DUTY_CYCLE: u8 = 100;

/// Returns true if `percent` may be sent to the fan controller.
#[inline]
pub fn is_valid_duty_cycle(percent: u8) -> bool {
    (MIN_DUTY_CYCLE..=MAX_DUTY_CYCLE).contains(&percent)
}

/// Fan control mode of a BMC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FanMode {
    /// Board firmware decides the fan speed
    #[default]
    Automatic,
    /// Fan speed is pinned by the governor
    Manual,
}

impl fmt::Display for FanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FanMode::Automatic => write!(f, "automatic"),
            FanMode::Manual => write!(f, "manual"),
        }
    }
}

/// Mutable runtime state of one host's fans.
///
/// `speed` only carries meaning while `mode` is [`FanMode::Manual`]; it is
/// zero whenever the board is in automatic mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FanState {
    /// Current control mode
    pub mode: FanMode,
    /// Last successfully commanded duty cycle, 0 when unknown
    pub speed: u8,
}

impl FanState {
    /// Fresh state for a host the governor has not touched yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the governor currently pins the fans.
    pub fn is_manual(&self) -> bool {
        self.mode == FanMode::Manual
    }
}

impl fmt::Display for FanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode {
            FanMode::Automatic => write!(f, "automatic"),
            FanMode::Manual => write!(f, "manual@{}%", self.speed),
        }
    }
}

/// Out-of-band access to a remote BMC, plus the command used to read the
/// remote host's CPU temperature.
#[derive(Clone, PartialEq)]
pub struct RemoteAccess {
    /// Shell command printing newline-separated temperatures
    pub temperature_command: String,
    /// BMC address passed to `ipmitool -H`
    pub ipmi_host: String,
    /// BMC user passed to `ipmitool -U`
    pub ipmi_user: String,
    /// BMC password passed to `ipmitool -P`
    pub ipmi_password: String,
}

// Credentials must never end up in logs, including `{:?}` output.
impl fmt::Debug for RemoteAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteAccess")
            .field("temperature_command", &self.temperature_command)
            .field("ipmi_host", &"___")
            .field("ipmi_user", &"___")
            .field("ipmi_password", &"___")
            .finish()
    }
}

/// Validated, immutable configuration of one managed host.
#[derive(Debug, Clone, PartialEq)]
pub struct HostProfile {
    /// Unique host name, used as state key and log prefix
    pub name: String,
    /// Ascending thresholds `T0 < T1 < T2` in degrees Celsius
    pub temperatures: [f64; BAND_COUNT],
    /// Duty cycle for each band `<=T0`, `(T0,T1]`, `(T1,T2]`
    pub speeds: [u8; BAND_COUNT],
    /// Margin below a threshold required before stepping down, 0 disables
    pub hysteresis: f64,
    /// Local command used instead of hwmon sensors
    pub temperature_command: Option<String>,
    /// Remote BMC access, absent for the local host
    pub remote: Option<RemoteAccess>,
}

impl HostProfile {
    /// Create a local host profile without hysteresis.
    pub fn new(
        name: impl Into<String>,
        temperatures: [f64; BAND_COUNT],
        speeds: [u8; BAND_COUNT],
    ) -> Self {
        Self {
            name: name.into(),
            temperatures,
            speeds,
            hysteresis: 0.0,
            temperature_command: None,
            remote: None,
        }
    }

    /// Set the hysteresis margin.
    pub fn with_hysteresis(mut self, hysteresis: f64) -> Self {
        self.hysteresis = hysteresis;
        self
    }

    /// Attach remote BMC access.
    pub fn with_remote(mut self, remote: RemoteAccess) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Whether IPMI commands go over the network.
    pub fn is_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// One-line summary of thresholds and speeds, e.g.
    /// `34°C (9%), 37°C (10%) and 55°C (15%)`.
    pub fn thresholds_summary(&self) -> String {
        let [t0, t1, t2] = self.temperatures;
        let [s0, s1, s2] = self.speeds;
        format!(
            "{}°C ({}%), {}°C ({}%) and {}°C ({}%)",
            t0, s0, t1, s1, t2, s2
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote() -> RemoteAccess {
        RemoteAccess {
            temperature_command: "ssh node2 cat /tmp/temps".to_string(),
            ipmi_host: "10.0.0.2".to_string(),
            ipmi_user: "root".to_string(),
            ipmi_password: "calvin".to_string(),
        }
    }

    #[test]
    fn test_fan_state_defaults_to_automatic() {
        let state = FanState::new();
        assert_eq!(state.mode, FanMode::Automatic);
        assert_eq!(state.speed, 0);
        assert!(!state.is_manual());
    }

    #[test]
    fn test_fan_state_display() {
        assert_eq!(FanState::new().to_string(), "automatic");
        let state = FanState {
            mode: FanMode::Manual,
            speed: 15,
        };
        assert_eq!(state.to_string(), "manual@15%");
    }

    #[test]
    fn test_duty_cycle_bounds() {
        assert!(!is_valid_duty_cycle(0));
        assert!(!is_valid_duty_cycle(4));
        assert!(is_valid_duty_cycle(5));
        assert!(is_valid_duty_cycle(100));
        assert!(!is_valid_duty_cycle(101));
    }

    #[test]
    fn test_remote_access_debug_hides_credentials() {
        let printed = format!("{:?}", remote());
        assert!(printed.contains("ssh node2"));
        assert!(!printed.contains("10.0.0.2"));
        assert!(!printed.contains("root"));
        assert!(!printed.contains("calvin"));
    }

    #[test]
    fn test_host_profile_builders() {
        let host = HostProfile::new("node2", [34.0, 37.0, 55.0], [9, 10, 15])
            .with_hysteresis(2.0)
            .with_remote(remote());
        assert!(host.is_remote());
        assert_eq!(host.hysteresis, 2.0);
        assert_eq!(
            host.thresholds_summary(),
            "34°C (9%), 37°C (10%) and 55°C (15%)"
        );
    }
}

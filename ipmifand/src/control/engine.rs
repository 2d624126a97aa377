//! Decision engine: maps a temperature reading to a fan command
//!
//! The three thresholds split the temperature axis into four regions:
//!
//! ```text
//!   (-inf, T0]   -> speeds[0]
//!   (T0, T1]     -> speeds[1]
//!   (T1, T2]     -> speeds[2]
//!   (T2, +inf)   -> automatic (board thermal protection)
//! ```
//!
//! Hysteresis only delays stepping down; stepping up and the automatic escape
//! are always immediate.

use ipmifan_core::{FanMode, FanState, HostProfile, BAND_COUNT};
use ipmifan_hardware::Dispatcher;
use tracing::{debug, info};

use super::fan_control::FanControl;

/// Region a temperature reading falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Band {
    /// One of the three speed bands
    Speed(usize),
    /// Above the highest threshold
    Automatic,
}

impl Band {
    /// Locate `temperature` among the host's thresholds.
    pub fn of(host: &HostProfile, temperature: f64) -> Band {
        host.temperatures
            .iter()
            .position(|&threshold| temperature <= threshold)
            .map(Band::Speed)
            .unwrap_or(Band::Automatic)
    }
}

/// Hysteresis gate for stepping into `band`.
///
/// When the fans currently run faster than the band's speed, or the board is
/// in automatic mode, the temperature must have dropped at least `hysteresis`
/// degrees below the band's threshold.
pub(crate) fn hysteresis_allows(
    host: &HostProfile,
    state: &FanState,
    band: usize,
    temperature: f64,
) -> bool {
    if host.hysteresis == 0.0 {
        return true;
    }

    if state.speed > host.speeds[band] || state.mode == FanMode::Automatic {
        return temperature <= host.temperatures[band] - host.hysteresis;
    }

    true
}

/// Per-host fan decision engine
pub(crate) struct DecisionEngine<D: Dispatcher> {
    control: FanControl<D>,
}

impl<D: Dispatcher> DecisionEngine<D> {
    pub fn new(control: FanControl<D>) -> Self {
        Self { control }
    }

    /// Mode and speed controller used by this engine
    pub fn control(&self) -> &FanControl<D> {
        &self.control
    }

    /// Evaluate one reading for one host and drive its fan state.
    pub async fn evaluate(&self, host: &HostProfile, state: &mut FanState, temperature: f64) {
        if self.control.is_quiet() {
            info!(
                "[{}] T:{}°C M:{} S:{}%",
                host.name, temperature, state.mode, state.speed
            );
        }

        match Band::of(host, temperature) {
            Band::Automatic => {
                self.control
                    .set_mode(host, state, FanMode::Automatic)
                    .await;
            }
            Band::Speed(band) => {
                debug_assert!(band < BAND_COUNT);
                if hysteresis_allows(host, state, band, temperature) {
                    self.control
                        .set_speed(host, state, host.speeds[band])
                        .await;
                } else {
                    debug!(
                        "[{}] Holding {} at {}°C (hysteresis {}°C below {}°C)",
                        host.name, state, temperature, host.hysteresis, host.temperatures[band]
                    );
                }
            }
        }
    }
}

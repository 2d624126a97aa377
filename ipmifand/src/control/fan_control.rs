//! Fan mode and fan speed controllers
//!
//! The only code allowed to send fan commands and to mutate a [`FanState`].
//! Every transition is checked against the current state first so that the
//! same command is never sent twice in a row.

use ipmifan_core::{is_valid_duty_cycle, FanMode, FanState, HostProfile};
use ipmifan_hardware::{Dispatcher, IpmiCommand};
use std::time::Duration;
use tokio::time::sleep;
use tracing::info;

/// Pause between entering manual mode and the first speed command, giving the
/// BMC time to switch.
pub(crate) const SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Sends mode and speed commands for a host and keeps its [`FanState`] in sync.
pub(crate) struct FanControl<D: Dispatcher> {
    dispatcher: D,
    settle_delay: Duration,
    /// Dry-run: the dispatcher echoes commands, human messages are dropped
    quiet: bool,
}

impl<D: Dispatcher> FanControl<D> {
    pub fn new(dispatcher: D, quiet: bool) -> Self {
        Self {
            dispatcher,
            settle_delay: SETTLE_DELAY,
            quiet,
        }
    }

    #[cfg(test)]
    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Switch the host to `wanted` mode if it is not already there.
    ///
    /// The in-memory mode follows the command even when the dispatch fails;
    /// the dispatcher has already logged the failure.
    pub async fn set_mode(&self, host: &HostProfile, state: &mut FanState, wanted: FanMode) {
        if state.mode == wanted {
            return;
        }

        match wanted {
            FanMode::Manual => {
                if !self.quiet {
                    info!("[{}] Switching to manual mode", host.name);
                }
                self.dispatcher
                    .dispatch(host, IpmiCommand::EnableManual)
                    .await;
                state.mode = FanMode::Manual;
            }
            FanMode::Automatic => {
                if !self.quiet {
                    info!("[{}] Switching to automatic mode", host.name);
                }
                self.dispatcher
                    .dispatch(host, IpmiCommand::RestoreAutomatic)
                    .await;
                state.mode = FanMode::Automatic;
                state.speed = 0;
            }
        }
    }

    /// Pin the host's fans at `wanted` percent.
    ///
    /// Out-of-range values and the current speed are ignored. Manual mode is
    /// entered first when needed. The state only records the new speed once
    /// the BMC accepted it, so a failed command is retried on the next cycle.
    pub async fn set_speed(&self, host: &HostProfile, state: &mut FanState, wanted: u8) {
        if !is_valid_duty_cycle(wanted) || wanted == state.speed {
            return;
        }

        if !state.is_manual() {
            self.set_mode(host, state, FanMode::Manual).await;
            sleep(self.settle_delay).await;
        }

        if !self.quiet {
            info!("[{}] Setting fans speed to {}%", host.name, wanted);
        }
        if self
            .dispatcher
            .dispatch(host, IpmiCommand::SetDutyCycle(wanted))
            .await
        {
            state.speed = wanted;
        }
    }

    /// Hand fan control back to the board whatever the current state says.
    ///
    /// Used on shutdown, where a previous failed command may have left the
    /// hardware in manual mode while the state believes otherwise.
    pub async fn force_automatic(&self, host: &HostProfile, state: &mut FanState) -> bool {
        if !self.quiet {
            info!("[{}] Switching to automatic mode", host.name);
        }
        let ok = self
            .dispatcher
            .dispatch(host, IpmiCommand::RestoreAutomatic)
            .await;
        state.mode = FanMode::Automatic;
        state.speed = 0;
        ok
    }
}

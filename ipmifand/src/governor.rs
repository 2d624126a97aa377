//! Polling orchestrator
//!
//! Owns the host profiles and their fan states. Every cycle it reads each
//! host's temperature in turn, hands it to the decision engine, then sleeps
//! for the configured interval. A shutdown request is honoured between hosts
//! and interrupts the sleep immediately.

use ipmifan_core::{FanState, HostProfile};
use ipmifan_hardware::{Dispatcher, TemperatureSource};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::control::DecisionEngine;
use crate::shutdown;

pub(crate) struct Governor<D: Dispatcher, S: TemperatureSource> {
    hosts: Vec<HostProfile>,
    /// Fan state per host name, only written through the engine
    states: HashMap<String, FanState>,
    engine: DecisionEngine<D>,
    sensors: S,
    interval: Duration,
}

impl<D: Dispatcher, S: TemperatureSource> Governor<D, S> {
    /// Every host starts in automatic mode with an unknown speed.
    pub fn new(
        hosts: Vec<HostProfile>,
        engine: DecisionEngine<D>,
        sensors: S,
        interval: Duration,
    ) -> Self {
        let states = hosts
            .iter()
            .map(|host| (host.name.clone(), FanState::new()))
            .collect();

        Self {
            hosts,
            states,
            engine,
            sensors,
            interval,
        }
    }

    #[cfg(test)]
    pub fn hosts(&self) -> &[HostProfile] {
        &self.hosts
    }

    #[cfg(test)]
    pub fn state(&self, host: &str) -> Option<&FanState> {
        self.states.get(host)
    }

    /// Log the thresholds of every host.
    pub fn announce(&self) {
        for host in &self.hosts {
            info!("[{}] Thresholds of {}", host.name, host.thresholds_summary());
        }
    }

    /// Poll until `shutdown` turns true or its sender goes away.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Polling {} host(s) every {}s",
            self.hosts.len(),
            self.interval.as_secs()
        );

        loop {
            if !self.run_cycle(&shutdown).await {
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        debug!("Polling loop stopped");
    }

    /// Evaluate every host once. Returns false if shutdown was requested
    /// before all hosts were processed.
    pub async fn run_cycle(&mut self, shutdown: &watch::Receiver<bool>) -> bool {
        for host in &self.hosts {
            if *shutdown.borrow() {
                return false;
            }

            let temperature = match self.sensors.read_temperature(host).await {
                Ok(t) => t.round_ties_even(),
                Err(e) => {
                    error!("[{}] Failed to read temperature: {}", host.name, e);
                    continue;
                }
            };

            let state = self.states.entry(host.name.clone()).or_default();
            self.engine.evaluate(host, state, temperature).await;
        }

        !*shutdown.borrow()
    }

    /// Give fan control back to the board on every host.
    pub async fn shutdown(&mut self) {
        shutdown::restore_automatic(self.engine.control(), &self.hosts, &mut self.states).await;
    }
}

//! Test utilities for daemon testing
//!
//! Provides a recording dispatcher and a scripted temperature source so the
//! control loop can run without a BMC or sensors.

use async_trait::async_trait;
use ipmifan_core::{HostProfile, IpmiFanError, Result};
use ipmifan_hardware::{Dispatcher, IpmiCommand, TemperatureSource};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Dispatcher recording every command it is asked to send
#[derive(Debug, Clone, Default)]
pub struct RecordingDispatcher {
    /// Record of (host name, command) pairs, in order
    pub sent: Arc<Mutex<Vec<(String, IpmiCommand)>>>,
    /// Number of upcoming dispatches that must fail
    pub failures: Arc<Mutex<usize>>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` dispatches report failure
    pub fn fail_next(&self, count: usize) {
        *self.failures.lock().unwrap() = count;
    }

    /// Commands sent so far, without host names
    pub fn commands(&self) -> Vec<IpmiCommand> {
        self.sent.lock().unwrap().iter().map(|(_, c)| *c).collect()
    }

    /// Commands sent to one host
    pub fn commands_for(&self, host: &str) -> Vec<IpmiCommand> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(h, _)| h == host)
            .map(|(_, c)| *c)
            .collect()
    }
}

#[async_trait]
impl Dispatcher for RecordingDispatcher {
    async fn dispatch(&self, host: &HostProfile, command: IpmiCommand) -> bool {
        self.sent.lock().unwrap().push((host.name.clone(), command));

        let mut failures = self.failures.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return false;
        }
        true
    }
}

/// Temperature source replaying queued readings per host
#[derive(Debug, Clone, Default)]
pub struct ScriptedSensors {
    readings: Arc<Mutex<HashMap<String, VecDeque<Option<f64>>>>>,
}

impl ScriptedSensors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue readings for a host; `None` produces an acquisition failure
    pub fn queue(&self, host: &str, readings: impl IntoIterator<Item = Option<f64>>) {
        self.readings
            .lock()
            .unwrap()
            .entry(host.to_string())
            .or_default()
            .extend(readings);
    }
}

#[async_trait]
impl TemperatureSource for ScriptedSensors {
    async fn read_temperature(&self, host: &HostProfile) -> Result<f64> {
        self.readings
            .lock()
            .unwrap()
            .get_mut(&host.name)
            .and_then(VecDeque::pop_front)
            .flatten()
            .ok_or_else(|| IpmiFanError::NoData(format!("no scripted reading for {}", host.name)))
    }
}

/// Host from the reference scenario: thresholds 34/37/55, speeds 9/10/15
pub fn scenario_host(name: &str) -> HostProfile {
    HostProfile::new(name, [34.0, 37.0, 55.0], [9, 10, 15])
}

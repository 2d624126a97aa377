//! ipmifan-hardware
//!
//! Hardware access crate: the `ipmitool` transport, the command dispatcher
//! that wraps it with host-specific flags and credential redaction, and the
//! temperature sources. It is used by the daemon to talk to BMCs.
//
//! Public API:
//! - `dispatcher::Dispatcher`: trait the decision engine sends commands through
//! - `dispatcher::IpmiDispatcher`: dispatcher backed by an `IpmiTransport`
//! - `transport::IpmiTool`: transport spawning the `ipmitool` binary
//! - `sensors::SystemSensors`: hwmon / shell-command temperature source

pub mod dispatcher;
pub mod ipmi_command;
pub mod process;
pub mod sensors;
pub mod transport;

pub use dispatcher::{Dispatcher, IpmiDispatcher};
pub use ipmi_command::IpmiCommand;
pub use sensors::{SystemSensors, TemperatureSource};
pub use transport::{IpmiTool, IpmiTransport};

//! ipmitool transport
//!
//! Runs the `ipmitool` binary. The transport knows nothing about hosts or
//! credentials; it receives a ready-made argument list from the dispatcher.

use async_trait::async_trait;
use ipmifan_core::{IpmiFanError, Result};
use std::time::Duration;
use tokio::process::Command;
use tracing::trace;

use crate::process::{output_with_timeout, DEFAULT_COMMAND_TIMEOUT_SECS};

/// Trait for IPMI transport abstraction
///
/// This trait enables testing of the dispatcher without a BMC by allowing
/// mock implementations.
#[async_trait]
pub trait IpmiTransport: Send + Sync {
    /// Name of the program, used when echoing command lines
    fn program(&self) -> &str;

    /// Run the program with `args` and wait for it to finish
    async fn execute(&self, args: &[String]) -> Result<()>;
}

/// Transport spawning the `ipmitool` binary
#[derive(Debug, Clone)]
pub struct IpmiTool {
    program: String,
    timeout_duration: Duration,
}

impl Default for IpmiTool {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_COMMAND_TIMEOUT_SECS))
    }
}

impl IpmiTool {
    /// Create a transport running `ipmitool` from `PATH`
    pub fn new(timeout_duration: Duration) -> Self {
        Self::with_program("ipmitool", timeout_duration)
    }

    /// Create a transport running a specific binary
    pub fn with_program(program: impl Into<String>, timeout_duration: Duration) -> Self {
        Self {
            program: program.into(),
            timeout_duration,
        }
    }
}

#[async_trait]
impl IpmiTransport for IpmiTool {
    fn program(&self) -> &str {
        &self.program
    }

    async fn execute(&self, args: &[String]) -> Result<()> {
        let mut cmd = Command::new(&self.program);
        cmd.args(args);

        let output = output_with_timeout(cmd, self.timeout_duration).await?;
        trace!("{} exited with {}", self.program, output.status);

        if !output.status.success() {
            return Err(IpmiFanError::CommandFailed(format!(
                "exit status {}: {}",
                output
                    .status
                    .code()
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "signal".to_string()),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(())
    }
}

//! Command Dispatcher - sends raw IPMI commands for a host
//!
//! Picks local or LAN transport flags from the host profile, redacts BMC
//! credentials from every logged command line, and reports success as a plain
//! boolean. A failing `ipmitool` never propagates as an error: it is logged
//! and the caller decides whether to keep its state.

use async_trait::async_trait;
use ipmifan_core::{HostProfile, IpmiFanError};
use tracing::{debug, error, info};

use crate::ipmi_command::IpmiCommand;
use crate::transport::{IpmiTransport, IpmiTool};

/// Placeholder printed instead of BMC address and credentials
pub const REDACTED: &str = "___";

/// Flags whose value must never be logged
const SECRET_FLAGS: [&str; 3] = ["-H", "-U", "-P"];

/// Sends IPMI commands on behalf of the decision engine
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Send `command` to the BMC of `host`. Returns true on success.
    async fn dispatch(&self, host: &HostProfile, command: IpmiCommand) -> bool;
}

/// Build the full `ipmitool` argument list for a command.
///
/// Local hosts talk to the in-band interface; remote hosts get
/// `-I lanplus -H <host> -U <user> -P <password>` first.
pub fn command_args(host: &HostProfile, command: IpmiCommand) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(remote) = &host.remote {
        args.extend([
            "-I".to_string(),
            "lanplus".to_string(),
            "-H".to_string(),
            remote.ipmi_host.clone(),
            "-U".to_string(),
            remote.ipmi_user.clone(),
            "-P".to_string(),
            remote.ipmi_password.clone(),
        ]);
    }
    args.extend(command.args());
    args
}

/// Render a command line for logs with BMC address and credentials hidden.
pub fn redacted_command_line(program: &str, args: &[String]) -> String {
    let mut line = String::from(program);
    let mut hide_next = false;
    for arg in args {
        line.push(' ');
        if hide_next {
            line.push_str(REDACTED);
            hide_next = false;
        } else {
            line.push_str(arg);
            hide_next = SECRET_FLAGS.contains(&arg.as_str());
        }
    }
    line
}

/// Hide the BMC address and credentials of `host` anywhere in `text`.
///
/// `ipmitool` echoes some of them in its error output, e.g.
/// `Address lookup for <host> failed`.
pub fn redact_secrets(host: &HostProfile, text: &str) -> String {
    let Some(remote) = &host.remote else {
        return text.to_string();
    };

    let mut secrets = [
        remote.ipmi_host.as_str(),
        remote.ipmi_user.as_str(),
        remote.ipmi_password.as_str(),
    ];
    // Longest first so that a value containing another is hidden whole
    secrets.sort_by_key(|secret| std::cmp::Reverse(secret.len()));

    secrets
        .iter()
        .filter(|secret| !secret.is_empty())
        .fold(text.to_string(), |acc, secret| acc.replace(*secret, REDACTED))
}

/// Log line for a failed command, with secrets removed from the reason.
pub fn failure_message(host: &HostProfile, line: &str, err: &IpmiFanError) -> String {
    match err {
        IpmiFanError::Timeout(_) => format!("\"{}\" command has timed out", line),
        IpmiFanError::CommandFailed(reason) => format!(
            "\"{}\" command has returned a non-0 exit code ({})",
            line,
            redact_secrets(host, reason)
        ),
        other => format!(
            "\"{}\" command could not be run: {}",
            line,
            redact_secrets(host, &other.to_string())
        ),
    }
}

/// Dispatcher backed by an [`IpmiTransport`]
///
/// Generic over the transport type, allowing the real `ipmitool` binary or
/// mock transports for testing.
pub struct IpmiDispatcher<T: IpmiTransport + ?Sized = dyn IpmiTransport> {
    transport: Box<T>,
    dry_run: bool,
}

impl IpmiDispatcher<IpmiTool> {
    /// Create a dispatcher running `ipmitool` with the default timeout
    pub fn new(dry_run: bool) -> Self {
        Self::with_transport(Box::new(IpmiTool::default()), dry_run)
    }
}

impl<T: IpmiTransport + ?Sized> IpmiDispatcher<T> {
    /// Create a dispatcher with a boxed transport
    ///
    /// In dry-run mode the transport is never called: the redacted command
    /// line is echoed and the dispatch reported as successful.
    pub fn with_transport(transport: Box<T>, dry_run: bool) -> Self {
        Self { transport, dry_run }
    }

    /// Whether commands are only echoed
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}

#[async_trait]
impl<T: IpmiTransport + ?Sized> Dispatcher for IpmiDispatcher<T> {
    async fn dispatch(&self, host: &HostProfile, command: IpmiCommand) -> bool {
        let args = command_args(host, command);
        let line = redacted_command_line(self.transport.program(), &args);

        if self.dry_run {
            info!("{}", line);
            return true;
        }

        debug!("[{}] Executing: {}", host.name, line);

        match self.transport.execute(&args).await {
            Ok(()) => true,
            Err(e) => {
                error!("{}", failure_message(host, &line, &e));
                false
            }
        }
    }
}

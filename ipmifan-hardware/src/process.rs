//! Child process execution with a hard time limit

use ipmifan_core::{IpmiFanError, Result};
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

/// Default time limit for every external command, in seconds
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 15;

/// Run `cmd` to completion and collect its output.
///
/// The child is killed if it does not finish within `limit`. A non-zero exit
/// status is not treated as an error here; callers decide what it means.
pub async fn output_with_timeout(mut cmd: Command, limit: Duration) -> Result<Output> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = cmd.spawn()?;

    match timeout(limit, child.wait_with_output()).await {
        Ok(output) => Ok(output?),
        Err(_) => {
            debug!("Child process exceeded {:?}, killing it", limit);
            Err(IpmiFanError::Timeout(format!(
                "no result after {} seconds",
                limit.as_secs_f64()
            )))
        }
    }
}

/// Build a `sh -c <command>` invocation.
pub fn shell(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_collects_stdout() {
        let output = output_with_timeout(shell("echo 42"), Duration::from_secs(5))
            .await
            .unwrap();
        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "42");
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_not_an_error() {
        let output = output_with_timeout(shell("exit 3"), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(output.status.code(), Some(3));
    }

    #[tokio::test]
    async fn test_timeout() {
        let result = output_with_timeout(shell("sleep 5"), Duration::from_millis(100)).await;
        assert!(matches!(result, Err(IpmiFanError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_missing_binary_is_io_error() {
        let cmd = Command::new("/nonexistent/ipmifan-test-binary");
        let result = output_with_timeout(cmd, Duration::from_secs(1)).await;
        assert!(matches!(result, Err(IpmiFanError::Io(_))));
    }
}

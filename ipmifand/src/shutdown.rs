//! Shutdown handling for graceful daemon termination
//!
//! Hands fan control back to every BMC before the daemon exits, so that no
//! host is left pinned at a low manual speed without a governor watching it.

use crate::control::FanControl;
use ipmifan_core::{FanState, HostProfile};
use ipmifan_hardware::Dispatcher;
use std::collections::HashMap;
use tracing::{info, warn};

/// Restore automatic fan control on every host
///
/// The command is sent regardless of the recorded state: a failed dispatch
/// earlier may have left a board in manual mode. Failures are logged and
/// skipped so that one unreachable BMC does not prevent the others from
/// being restored.
///
/// Returns the number of hosts whose command failed.
pub(crate) async fn restore_automatic<D: Dispatcher>(
    control: &FanControl<D>,
    hosts: &[HostProfile],
    states: &mut HashMap<String, FanState>,
) -> usize {
    info!("Signal received, giving up control");

    let mut failures = 0;
    for host in hosts {
        let state = states.entry(host.name.clone()).or_default();
        if !control.force_automatic(host, state).await {
            warn!("[{}] Could not restore automatic fan control", host.name);
            failures += 1;
        }
    }

    if failures == 0 {
        info!("Automatic fan control restored on {} host(s)", hosts.len());
    } else {
        warn!(
            "Automatic fan control restored on {} of {} host(s)",
            hosts.len() - failures,
            hosts.len()
        );
    }

    failures
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{scenario_host, RecordingDispatcher};
    use ipmifan_core::FanMode;
    use ipmifan_hardware::IpmiCommand;
    use std::time::Duration;

    fn control() -> (FanControl<RecordingDispatcher>, RecordingDispatcher) {
        let dispatcher = RecordingDispatcher::new();
        let control =
            FanControl::new(dispatcher.clone(), false).with_settle_delay(Duration::ZERO);
        (control, dispatcher)
    }

    #[tokio::test]
    async fn test_manual_host_gets_single_restore() {
        let (control, dispatcher) = control();
        let hosts = vec![scenario_host("h")];
        let mut states = HashMap::from([(
            "h".to_string(),
            FanState {
                mode: FanMode::Manual,
                speed: 15,
            },
        )]);

        let failures = restore_automatic(&control, &hosts, &mut states).await;
        assert_eq!(failures, 0);
        assert_eq!(dispatcher.commands(), vec![IpmiCommand::RestoreAutomatic]);
        assert_eq!(states["h"], FanState::new());
    }

    #[tokio::test]
    async fn test_automatic_hosts_are_restored_anyway() {
        let (control, dispatcher) = control();
        let hosts = vec![scenario_host("a"), scenario_host("b")];
        let mut states = HashMap::new();

        restore_automatic(&control, &hosts, &mut states).await;
        assert_eq!(
            dispatcher.commands_for("a"),
            vec![IpmiCommand::RestoreAutomatic]
        );
        assert_eq!(
            dispatcher.commands_for("b"),
            vec![IpmiCommand::RestoreAutomatic]
        );
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_other_hosts() {
        let (control, dispatcher) = control();
        let hosts = vec![scenario_host("a"), scenario_host("b")];
        let mut states = HashMap::new();

        dispatcher.fail_next(1);
        let failures = restore_automatic(&control, &hosts, &mut states).await;
        assert_eq!(failures, 1);
        assert_eq!(dispatcher.commands().len(), 2);
        assert_eq!(states["b"], FanState::new());
    }
}

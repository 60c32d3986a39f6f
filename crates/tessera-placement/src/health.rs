//! Health checks for the native executor.
//!
//! The resource manager runs at most one health check per task and only
//! understands command checks. HTTP and TCP checks stay with the
//! orchestrator's own health monitor.

use tessera_core::{CommandInfo, HealthCheckInfo};
use tessera_state::{HealthCheck, HealthCheckProtocol};

/// Result of picking the native health check for a task.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthCheckSelection {
    pub selected: Option<HealthCheckInfo>,
    /// Command checks that qualified but did not fit.
    pub dropped: usize,
}

/// Native form of a command check; `None` for any other protocol.
pub fn to_native(check: &HealthCheck) -> Option<HealthCheckInfo> {
    if check.protocol != HealthCheckProtocol::Command {
        return None;
    }
    let command = check.command.as_ref()?;
    Some(HealthCheckInfo {
        command: CommandInfo {
            value: Some(command.value.clone()),
            ..CommandInfo::default()
        },
        delay_seconds: 0.0,
        interval_seconds: check.interval_seconds as f64,
        timeout_seconds: check.timeout_seconds as f64,
        consecutive_failures: check.max_consecutive_failures,
        grace_period_seconds: check.grace_period_seconds as f64,
    })
}

/// Keep the first command check in declaration order.
pub fn select_health_check(checks: &[HealthCheck]) -> HealthCheckSelection {
    let mut native = checks.iter().filter_map(to_native);
    let selected = native.next();
    HealthCheckSelection {
        selected,
        dropped: native.count(),
    }
}

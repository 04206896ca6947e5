//! Hook error counters.

use std::fmt;

use prometheus::{IntCounterVec, Opts, Registry, TextEncoder};
use serde::{Deserialize, Serialize};

use tushub_core::{AppError, AppResult, HookType};

/// Name of the exported counter family.
pub const HOOK_ERRORS_METRIC: &str = "tushub_hook_errors_total";

/// Label carrying the hook type.
const HOOK_TYPE_LABEL: &str = "hooktype";

/// Failed invocation counters, one series per hook type.
///
/// Every series exists from construction so all five are exported with
/// value zero before the first failure.
#[derive(Clone)]
pub struct HookMetrics {
    registry: Registry,
    errors: IntCounterVec,
}

impl HookMetrics {
    /// Create new zeroed metrics on a private registry
    pub fn new() -> Self {
        let errors = IntCounterVec::new(
            Opts::new(
                HOOK_ERRORS_METRIC,
                "Total number of execution errors per hook type.",
            ),
            &[HOOK_TYPE_LABEL],
        )
        .expect("Failed to create tushub_hook_errors_total metric");

        let registry = Registry::new();
        registry
            .register(Box::new(errors.clone()))
            .expect("Failed to register tushub_hook_errors_total metric");

        for hook in HookType::ALL {
            errors.with_label_values(&[hook.as_str()]).inc_by(0);
        }

        Self { registry, errors }
    }

    /// Count one failed invocation of `hook`.
    pub fn record_error(&self, hook: HookType) {
        self.errors.with_label_values(&[hook.as_str()]).inc();
    }

    /// Current error count for `hook`.
    pub fn errors(&self, hook: HookType) -> u64 {
        self.errors.with_label_values(&[hook.as_str()]).get()
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> HookMetricsSnapshot {
        HookMetricsSnapshot {
            pre_create: self.errors(HookType::PreCreate),
            post_create: self.errors(HookType::PostCreate),
            post_receive: self.errors(HookType::PostReceive),
            post_finish: self.errors(HookType::PostFinish),
            post_terminate: self.errors(HookType::PostTerminate),
        }
    }

    /// Render the counters in the Prometheus text exposition format.
    pub fn render_prometheus(&self) -> AppResult<String> {
        TextEncoder::new()
            .encode_to_string(&self.registry.gather())
            .map_err(|e| AppError::internal(format!("Failed to encode metrics: {e}")))
    }
}

impl Default for HookMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HookMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookMetrics")
            .field("errors", &self.snapshot())
            .finish()
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookMetricsSnapshot {
    /// Failed `pre-create` invocations
    pub pre_create: u64,
    /// Failed `post-create` invocations
    pub post_create: u64,
    /// Failed `post-receive` invocations
    pub post_receive: u64,
    /// Failed `post-finish` invocations
    pub post_finish: u64,
    /// Failed `post-terminate` invocations
    pub post_terminate: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_series_start_at_zero() {
        let metrics = HookMetrics::new();
        assert_eq!(metrics.snapshot(), HookMetricsSnapshot::default());

        let text = metrics.render_prometheus().expect("render");
        assert!(text.contains("# TYPE tushub_hook_errors_total counter"));
        for hook in HookType::ALL {
            assert!(text.contains(&format!(
                "tushub_hook_errors_total{{hooktype=\"{hook}\"}} 0"
            )));
        }
    }

    #[test]
    fn test_record_error_is_per_type() {
        let metrics = HookMetrics::new();
        metrics.record_error(HookType::PostFinish);
        metrics.record_error(HookType::PostFinish);
        metrics.record_error(HookType::PreCreate);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.post_finish, 2);
        assert_eq!(snapshot.pre_create, 1);
        assert_eq!(snapshot.post_receive, 0);
        assert!(
            metrics
                .render_prometheus()
                .expect("render")
                .contains("tushub_hook_errors_total{hooktype=\"post-finish\"} 2")
        );
    }

    #[test]
    fn test_instances_do_not_share_counters() {
        let first = HookMetrics::new();
        let second = HookMetrics::new();
        first.record_error(HookType::PostCreate);

        assert_eq!(first.errors(HookType::PostCreate), 1);
        assert_eq!(second.errors(HookType::PostCreate), 0);
    }
}

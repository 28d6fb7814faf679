//! Reconcile counters and the registry served on `/metrics`.

use prometheus::{Encoder, IntCounter, Registry, TextEncoder};

// ============================================================================
// Metric Names
// ============================================================================

pub const RECONCILE_ATTEMPTS: &str = "reconcile_attempts_total";

pub const RECONCILE_ERRORS: &str = "reconcile_errors_total";

/// Monotonic counters owned by the reconciler.
///
/// Clones share the same underlying counters.
#[derive(Debug, Clone)]
pub struct ReconcileMetrics {
    attempts: IntCounter,
    errors: IntCounter,
}

impl ReconcileMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let attempts = IntCounter::new(
            RECONCILE_ATTEMPTS,
            "Number of attempts to reconcile the ConfigMap to disk",
        )?;
        let errors = IntCounter::new(
            RECONCILE_ERRORS,
            "Number of errors that occurred while reconciling the ConfigMap to disk",
        )?;
        Ok(Self { attempts, errors })
    }

    pub fn register(&self, registry: &Registry) -> prometheus::Result<()> {
        registry.register(Box::new(self.attempts.clone()))?;
        registry.register(Box::new(self.errors.clone()))?;
        Ok(())
    }

    pub fn record_attempt(&self) {
        self.attempts.inc();
    }

    pub fn record_error(&self) {
        self.errors.inc();
    }

    pub fn attempts(&self) -> u64 {
        self.attempts.get()
    }

    pub fn errors(&self) -> u64 {
        self.errors.get()
    }
}

/// Builds the scrape registry: process metrics plus the reconcile counters.
pub fn registry(metrics: &ReconcileMetrics) -> prometheus::Result<Registry> {
    let registry = Registry::new();
    #[cfg(target_os = "linux")]
    registry.register(Box::new(
        prometheus::process_collector::ProcessCollector::for_self(),
    ))?;
    metrics.register(&registry)?;
    Ok(registry)
}

/// Renders the registry in the Prometheus text format.
pub fn export(registry: &Registry) -> prometheus::Result<String> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&registry.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let metrics = ReconcileMetrics::new().unwrap();
        assert_eq!(metrics.attempts(), 0);
        assert_eq!(metrics.errors(), 0);
    }

    #[test]
    fn test_clones_share_counters() {
        let metrics = ReconcileMetrics::new().unwrap();
        let clone = metrics.clone();

        clone.record_attempt();
        clone.record_attempt();
        clone.record_error();

        assert_eq!(metrics.attempts(), 2);
        assert_eq!(metrics.errors(), 1);
    }

    #[test]
    fn test_export_contains_counters() {
        let metrics = ReconcileMetrics::new().unwrap();
        let registry = registry(&metrics).unwrap();
        metrics.record_attempt();

        let output = export(&registry).unwrap();
        assert!(output.contains("# TYPE reconcile_attempts_total counter"));
        assert!(output.contains("reconcile_attempts_total 1"));
        assert!(output.contains("reconcile_errors_total 0"));
    }

    #[test]
    fn test_double_registration_fails() {
        let metrics = ReconcileMetrics::new().unwrap();
        let registry = Registry::new();
        metrics.register(&registry).unwrap();
        assert!(metrics.register(&registry).is_err());
    }
}

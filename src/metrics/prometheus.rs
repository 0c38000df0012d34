//! Prometheus counters for adaptive dispatch.
//!
//! Counters work standalone without a `Registry` - registration is only
//! needed for exposition (scraping). Increments are plain atomic ops, cheap
//! enough to sit on the dispatch path unconditionally.

use prometheus::{IntCounter, Opts, Registry};

/// Prometheus metrics for a Helm controller.
///
/// Cloning is cheap and clones share the underlying counters, so the
/// controller hands copies to the registry and dispatcher internals.
#[derive(Clone)]
pub struct HelmMetrics {
    /// Regions lazily created so far.
    pub regions_created: IntCounter,

    /// Adaptive dispatch episodes (CPU and device).
    pub dispatches_total: IntCounter,

    /// Episodes resolved to the default action.
    pub default_actions: IntCounter,

    /// Episodes resolved to a serial pass on the calling thread.
    pub sequential_actions: IntCounter,

    /// Episodes resolved to an explicit parallel tier.
    pub parallel_actions: IntCounter,

    /// Device launch episodes.
    pub gpu_launches: IntCounter,

    /// Out-of-range oracle responses recovered to the default action.
    pub policy_clamps: IntCounter,
}

impl Default for HelmMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl HelmMetrics {
    /// Create metrics with the default prefix "helm".
    pub fn new() -> Self {
        Self::with_prefix("helm")
    }

    /// Create metrics named `{prefix}_dispatches_total` and so on.
    ///
    /// The prefix is sanitized into a valid Prometheus metric name: any
    /// character outside `[a-zA-Z0-9_:]` (or a leading digit) becomes an
    /// underscore.
    pub fn with_prefix(prefix: &str) -> Self {
        fn sanitize(i: usize, c: char) -> char {
            let ok = match c {
                '_' | ':' => true,
                '0'..='9' => i > 0,
                c => c.is_ascii_alphabetic(),
            };
            if ok {
                c
            } else {
                '_'
            }
        }
        let prefix: String = prefix
            .chars()
            .enumerate()
            .map(|(i, c)| sanitize(i, c))
            .collect();

        let counter = |name: &str, help: &str| {
            IntCounter::with_opts(Opts::new(format!("{}_{}", prefix, name), help))
                .expect("metric creation should not fail")
        };

        Self {
            regions_created: counter("regions_created", "Regions lazily created"),
            dispatches_total: counter("dispatches_total", "Adaptive dispatch episodes"),
            default_actions: counter("default_actions", "Default-action dispatches"),
            sequential_actions: counter("sequential_actions", "Sequential-action dispatches"),
            parallel_actions: counter("parallel_actions", "Parallel-action dispatches"),
            gpu_launches: counter("gpu_launches", "Device launch episodes"),
            policy_clamps: counter(
                "policy_clamps",
                "Out-of-range policy indices recovered to default",
            ),
        }
    }

    /// Register all metrics with a Registry for exposition.
    ///
    /// # Errors
    ///
    /// Returns an error if any metric fails to register (e.g., duplicate
    /// names).
    pub fn register(&self, registry: &Registry) -> Result<(), prometheus::Error> {
        registry.register(Box::new(self.regions_created.clone()))?;
        registry.register(Box::new(self.dispatches_total.clone()))?;
        registry.register(Box::new(self.default_actions.clone()))?;
        registry.register(Box::new(self.sequential_actions.clone()))?;
        registry.register(Box::new(self.parallel_actions.clone()))?;
        registry.register(Box::new(self.gpu_launches.clone()))?;
        registry.register(Box::new(self.policy_clamps.clone()))?;
        Ok(())
    }
}

impl std::fmt::Debug for HelmMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HelmMetrics")
            .field("regions_created", &self.regions_created.get())
            .field("dispatches_total", &self.dispatches_total.get())
            .field("default_actions", &self.default_actions.get())
            .field("policy_clamps", &self.policy_clamps.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = HelmMetrics::new();
        assert_eq!(metrics.dispatches_total.get(), 0);
        assert_eq!(metrics.policy_clamps.get(), 0);
    }

    #[test]
    fn test_counter_increments_shared_across_clones() {
        let metrics = HelmMetrics::new();
        metrics.dispatches_total.inc();

        let cloned = metrics.clone();
        cloned.dispatches_total.inc();
        assert_eq!(metrics.dispatches_total.get(), 2);
    }

    #[test]
    fn test_registry_integration() {
        let metrics = HelmMetrics::new();
        let registry = Registry::new();

        metrics
            .register(&registry)
            .expect("registration should succeed");

        metrics.dispatches_total.inc();

        let families = registry.gather();
        let dispatches = families
            .iter()
            .find(|f| f.get_name() == "helm_dispatches_total");
        assert!(dispatches.is_some());
    }

    #[test]
    fn test_prefix_sanitization() {
        let metrics = HelmMetrics::with_prefix("my-app");
        let registry = Registry::new();
        metrics
            .register(&registry)
            .expect("registration should succeed");

        let families = registry.gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "my_app_dispatches_total"));
    }
}

//! Configuration types for the Helm controller.

use prometheus::Registry;
use serde::{Deserialize, Serialize};

/// Configuration for a Helm controller.
///
/// This struct can be deserialized from TOML, YAML, JSON, or environment
/// variables using figment (see [`HelmBuilder`]).
///
/// [`HelmBuilder`]: crate::builder::HelmBuilder
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HelmConfig {
    /// Metric and worker-thread name prefix (default: "helm")
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Per-process hardware thread cap used to derive CPU tier tables and
    /// size the executor pool. None probes `available_parallelism`.
    #[serde(default)]
    pub thread_cap: Option<usize>,

    /// Seed for the ambient thread count before any parallel action has
    /// run. None uses the thread cap.
    #[serde(default)]
    pub default_threads: Option<usize>,

    /// Iterations handed out per grab under dynamic scheduling (default: 1)
    #[serde(default = "default_dynamic_chunk")]
    pub dynamic_chunk: usize,

    /// Floor for the shrinking chunk under guided scheduling (default: 1)
    #[serde(default = "default_guided_min_chunk")]
    pub guided_min_chunk: usize,

    /// Whether device launches skip post-launch synchronization by default.
    #[serde(default)]
    pub gpu_async: bool,

    /// Prometheus registry for metrics exposition.
    /// Not serializable - must be set programmatically.
    #[serde(skip)]
    pub prometheus_registry: Option<Registry>,
}

fn default_prefix() -> String {
    "helm".to_string()
}

fn default_dynamic_chunk() -> usize {
    1
}

fn default_guided_min_chunk() -> usize {
    1
}

impl Default for HelmConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            thread_cap: None,
            default_threads: None,
            dynamic_chunk: default_dynamic_chunk(),
            guided_min_chunk: default_guided_min_chunk(),
            gpu_async: false,
            prometheus_registry: None,
        }
    }
}

impl HelmConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the effective hardware thread cap.
    ///
    /// Returns the configured value, or the detected parallelism. A failed
    /// probe degrades to 1; the tier calculator then clamps every tier to
    /// its minimum rather than failing.
    pub fn effective_thread_cap(&self) -> usize {
        self.thread_cap.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    /// Get the effective ambient-thread seed for a given cap.
    pub fn effective_default_threads(&self, thread_cap: usize) -> usize {
        self.default_threads.unwrap_or(thread_cap).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HelmConfig::default();
        assert_eq!(config.prefix, "helm");
        assert!(config.thread_cap.is_none());
        assert!(config.default_threads.is_none());
        assert_eq!(config.dynamic_chunk, 1);
        assert_eq!(config.guided_min_chunk, 1);
        assert!(!config.gpu_async);
    }

    #[test]
    fn test_effective_thread_cap_override() {
        let config = HelmConfig {
            thread_cap: Some(12),
            ..Default::default()
        };
        assert_eq!(config.effective_thread_cap(), 12);
    }

    #[test]
    fn test_effective_default_threads() {
        let mut config = HelmConfig::default();
        assert_eq!(config.effective_default_threads(8), 8);

        config.default_threads = Some(4);
        assert_eq!(config.effective_default_threads(8), 4);

        config.default_threads = Some(0);
        assert_eq!(config.effective_default_threads(8), 1);
    }

    #[test]
    fn test_deserialize_config() {
        let toml = r#"
            prefix = "sim"
            thread_cap = 16
            default_threads = 8
            dynamic_chunk = 32
            gpu_async = true
        "#;

        let config: HelmConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.prefix, "sim");
        assert_eq!(config.thread_cap, Some(16));
        assert_eq!(config.default_threads, Some(8));
        assert_eq!(config.dynamic_chunk, 32);
        assert_eq!(config.guided_min_chunk, 1);
        assert!(config.gpu_async);
    }

    #[test]
    fn test_config_json_round_trip() {
        let config = HelmConfig {
            thread_cap: Some(8),
            gpu_async: true,
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: HelmConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.prefix, config.prefix);
        assert_eq!(parsed.thread_cap, Some(8));
        assert!(parsed.gpu_async);
    }
}

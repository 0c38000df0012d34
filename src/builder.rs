//! Builder for constructing Helm controllers.
//!
//! Configuration flows through a figment merge pipeline: defaults, then
//! config files (TOML/YAML/JSON), then environment variables, then
//! programmatic overrides, then clap CLI arguments.
//!
//! Non-serializable collaborators (the policy oracle, the device executor,
//! a Prometheus registry) are attached programmatically.

use std::path::Path;
use std::sync::Arc;

use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use figment::Figment;
use prometheus::Registry;

use crate::config::HelmConfig;
use crate::controller::Helm;
use crate::device::DeviceExecutor;
use crate::error::Result;
use crate::oracle::PolicyOracle;

/// Builder for constructing a [`Helm`] controller.
///
/// Configuration sources are merged in the following order (later sources
/// override earlier):
/// 1. Default values
/// 2. Config files (in order added)
/// 3. Environment variables
/// 4. Programmatic overrides
/// 5. CLI arguments
///
/// # Examples
///
/// ```ignore
/// use helm_rs::HelmBuilder;
///
/// let helm = HelmBuilder::new()
///     .file("helm.toml")
///     .env_prefix("HELM")
///     .thread_cap(16)
///     .build()?;
/// ```
pub struct HelmBuilder {
    figment: Figment,
    prometheus_registry: Option<Registry>,
    oracle: Option<Arc<dyn PolicyOracle>>,
    device: Option<Arc<dyn DeviceExecutor>>,
}

impl Default for HelmBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HelmBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HelmBuilder")
            .field("figment", &self.figment)
            .field(
                "prometheus_registry",
                &self.prometheus_registry.as_ref().map(|_| "<Registry>"),
            )
            .field("oracle", &self.oracle.as_ref().map(|_| "<PolicyOracle>"))
            .field("device", &self.device.as_ref().map(|_| "<DeviceExecutor>"))
            .finish()
    }
}

impl HelmBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            figment: Figment::from(Serialized::defaults(HelmConfig::default())),
            prometheus_registry: None,
            oracle: None,
            device: None,
        }
    }

    /// Merge a configuration file, with the format chosen by extension
    /// (TOML, YAML, or JSON; anything unrecognized is read as TOML).
    ///
    /// Files merge in the order added, later files overriding earlier.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        self.figment = match extension.as_deref() {
            Some("yaml") | Some("yml") => self.figment.merge(Yaml::file(path)),
            Some("json") => self.figment.merge(Json::file(path)),
            _ => self.figment.merge(Toml::file(path)),
        };
        self
    }

    /// Merge environment variables named `{PREFIX}_{KEY}`, e.g.
    /// `HELM_THREAD_CAP` or `HELM_DEFAULT_THREADS` for the prefix `HELM`.
    pub fn env_prefix(mut self, prefix: &str) -> Self {
        self.figment = self.figment.merge(Env::prefixed(&format!("{}_", prefix)));
        self
    }

    /// Set the metric and worker-thread name prefix.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.figment = self
            .figment
            .merge(Serialized::default("prefix", prefix.into()));
        self
    }

    /// Set the per-process hardware thread cap.
    ///
    /// CPU tier tables and the executor pool size derive from this value.
    /// Default is the detected parallelism.
    pub fn thread_cap(mut self, cap: usize) -> Self {
        self.figment = self.figment.merge(Serialized::default("thread_cap", cap));
        self
    }

    /// Set the ambient thread-count seed used before any parallel action
    /// has run. Default is the thread cap.
    pub fn default_threads(mut self, threads: usize) -> Self {
        self.figment = self
            .figment
            .merge(Serialized::default("default_threads", threads));
        self
    }

    /// Set the dynamic-schedule chunk size.
    pub fn dynamic_chunk(mut self, chunk: usize) -> Self {
        self.figment = self
            .figment
            .merge(Serialized::default("dynamic_chunk", chunk));
        self
    }

    /// Set the guided-schedule minimum chunk size.
    pub fn guided_min_chunk(mut self, chunk: usize) -> Self {
        self.figment = self
            .figment
            .merge(Serialized::default("guided_min_chunk", chunk));
        self
    }

    /// Make device launches asynchronous by default (skip post-launch
    /// synchronization).
    pub fn gpu_async(mut self, enabled: bool) -> Self {
        self.figment = self
            .figment
            .merge(Serialized::default("gpu_async", enabled));
        self
    }

    /// Register the controller's metrics into an external Prometheus
    /// registry so they can be scraped.
    pub fn prometheus_registry(mut self, registry: Registry) -> Self {
        self.prometheus_registry = Some(registry);
        self
    }

    /// Attach the policy oracle.
    ///
    /// Without one, the controller uses [`NullOracle`] and every region
    /// permanently selects the default action.
    ///
    /// [`NullOracle`]: crate::oracle::NullOracle
    pub fn oracle(mut self, oracle: Arc<dyn PolicyOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Attach the device executor used for adaptive launches.
    ///
    /// Without one, the controller uses [`EmulatedDevice`].
    ///
    /// [`EmulatedDevice`]: crate::device::EmulatedDevice
    pub fn device_executor(mut self, device: Arc<dyn DeviceExecutor>) -> Self {
        self.device = Some(device);
        self
    }

    /// Apply CLI overrides: every argument the user actually passed wins
    /// over all other sources.
    pub fn with_cli_args(mut self, args: &HelmArgs) -> Self {
        if let Some(ref prefix) = args.helm_prefix {
            self.figment = self
                .figment
                .merge(Serialized::default("prefix", prefix.clone()));
        }
        if let Some(cap) = args.helm_thread_cap {
            self.figment = self.figment.merge(Serialized::default("thread_cap", cap));
        }
        if let Some(threads) = args.helm_default_threads {
            self.figment = self
                .figment
                .merge(Serialized::default("default_threads", threads));
        }
        if args.helm_gpu_async {
            self.figment = self.figment.merge(Serialized::default("gpu_async", true));
        }
        self
    }

    /// Build the controller.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration extraction fails, the executor
    /// thread pool cannot be built, or metrics registration fails.
    pub fn build(self) -> Result<Helm> {
        let mut config: HelmConfig = self.figment.extract().map_err(Box::new)?;
        config.prometheus_registry = self.prometheus_registry;
        Helm::from_parts(config, self.oracle, self.device)
    }
}

/// CLI arguments for Helm configuration.
///
/// Use with clap's `Parser` derive macro. These arguments can be applied to
/// a `HelmBuilder` using `with_cli_args`.
///
/// # Examples
///
/// ```ignore
/// use clap::Parser;
/// use helm_rs::{HelmArgs, HelmBuilder};
///
/// #[derive(Parser)]
/// struct MyArgs {
///     #[command(flatten)]
///     helm: HelmArgs,
///     // ... other args
/// }
///
/// let args = MyArgs::parse();
/// let helm = HelmBuilder::new()
///     .with_cli_args(&args.helm)
///     .build()?;
/// ```
#[derive(Debug, Default, Clone, clap::Args)]
pub struct HelmArgs {
    /// Metric and worker-thread name prefix
    #[arg(long)]
    pub helm_prefix: Option<String>,

    /// Per-process hardware thread cap
    #[arg(long)]
    pub helm_thread_cap: Option<usize>,

    /// Ambient thread-count seed
    #[arg(long)]
    pub helm_default_threads: Option<usize>,

    /// Skip post-launch device synchronization
    #[arg(long)]
    pub helm_gpu_async: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_extract() {
        let config: HelmConfig = HelmBuilder::new().figment.extract().unwrap();
        assert_eq!(config.prefix, "helm");
        assert!(config.thread_cap.is_none());
        assert!(config.default_threads.is_none());
        assert!(!config.gpu_async);
    }

    #[test]
    fn test_programmatic_overrides_extract() {
        let config: HelmConfig = HelmBuilder::new()
            .prefix("sim")
            .thread_cap(16)
            .default_threads(8)
            .dynamic_chunk(32)
            .figment
            .extract()
            .unwrap();

        assert_eq!(config.prefix, "sim");
        assert_eq!(config.thread_cap, Some(16));
        assert_eq!(config.default_threads, Some(8));
        assert_eq!(config.dynamic_chunk, 32);
    }

    #[test]
    fn test_cli_args_override_programmatic_values() {
        let args = HelmArgs {
            helm_prefix: Some("from-cli".to_string()),
            helm_thread_cap: Some(4),
            helm_default_threads: Some(2),
            helm_gpu_async: true,
        };

        let config: HelmConfig = HelmBuilder::new()
            .prefix("from-code")
            .with_cli_args(&args)
            .figment
            .extract()
            .unwrap();

        assert_eq!(config.prefix, "from-cli");
        assert_eq!(config.thread_cap, Some(4));
        assert_eq!(config.default_threads, Some(2));
        assert!(config.gpu_async);
    }

    #[test]
    fn test_absent_cli_args_leave_other_sources_alone() {
        let args = HelmArgs {
            helm_prefix: Some("from-cli".to_string()),
            helm_thread_cap: None,
            helm_default_threads: None,
            helm_gpu_async: false,
        };

        let config: HelmConfig = HelmBuilder::new()
            .prefix("from-code")
            .thread_cap(8)
            .with_cli_args(&args)
            .figment
            .extract()
            .unwrap();

        assert_eq!(config.prefix, "from-cli");
        assert_eq!(config.thread_cap, Some(8));
    }
}

//! Metrics collection for helm-rs observability.
//!
//! Prometheus-compatible counters for watching adaptive dispatch from the
//! outside. Metrics are always collected (atomic increments only) and can
//! optionally be exposed via a Prometheus registry for scraping.
//!
//! # Available metrics
//!
//! - `{prefix}_regions_created` - Regions lazily created so far
//! - `{prefix}_dispatches_total` - Adaptive dispatch episodes
//! - `{prefix}_default_actions` - Episodes resolved to the default action
//! - `{prefix}_sequential_actions` - Episodes resolved to a serial pass
//! - `{prefix}_parallel_actions` - Episodes resolved to an explicit parallel tier
//! - `{prefix}_gpu_launches` - Device launch episodes
//! - `{prefix}_policy_clamps` - Out-of-range oracle responses recovered to default
//!
//! # Example
//!
//! ```ignore
//! use prometheus::Registry;
//! use helm_rs::HelmBuilder;
//!
//! let registry = Registry::new();
//! let helm = HelmBuilder::new()
//!     .prometheus_registry(registry.clone())
//!     .build()?;
//!
//! // Later: expose via HTTP
//! let encoder = prometheus::TextEncoder::new();
//! let metric_families = registry.gather();
//! // encoder.encode(&metric_families, &mut buffer)?;
//! ```

mod prometheus;

pub use prometheus::HelmMetrics;

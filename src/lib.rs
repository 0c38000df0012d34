//! # helm-rs
//!
//! **Steering repeatedly-invoked parallel loops**
//!
//! An adaptive execution-policy controller: each lexical loop invocation
//! point (a *region*) learns, through an external policy oracle, which
//! concurrency configuration to run under - a thread-count tier with a
//! static/dynamic/guided schedule, a serial pass, a device block-size tier,
//! or the safe default that inherits whatever the last parallel action left
//! behind.
//!
//! ## Features
//!
//! - **Per-call-site regions**: lazily created, exactly once, keyed by a
//!   stable call-site identity; no per-call allocation
//! - **Bounded action space**: a fixed, positionally-indexed table of
//!   concrete configurations - the wire contract with the oracle
//! - **Guaranteed fallback**: policy index 0 is always safe; a missing,
//!   stale, or misbehaving oracle degrades to default execution, never to
//!   an error
//! - **Pluggable oracle**: a narrow report-feature/query-index interface;
//!   how the oracle learns is its own business
//! - **CPU and device dispatch**: rayon-backed thread teams with
//!   static/dynamic/guided/auto distribution, and block-size tier selection
//!   with grid sizing for kernel launches
//! - **Flexible configuration**: files (TOML/YAML/JSON), environment
//!   variables, code, or clap CLI overrides
//!
//! ## Quick Start
//!
//! ```ignore
//! use helm_rs::HelmBuilder;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let helm = HelmBuilder::new()
//!         .prefix("myapp")
//!         .thread_cap(16)
//!         .oracle(my_oracle)           // optional; defaults to NullOracle
//!         .build()?;
//!
//!     let _ctx = helm.make_current();
//!
//!     let data = vec![1.0f64; 1 << 20];
//!     helm_rs::adaptive_for_each!(0..data.len(), |i| {
//!         // invoked exactly once per index, under the configuration the
//!         // oracle picked for this call site
//!         std::hint::black_box(data[i].sqrt());
//!     });
//!
//!     Ok(())
//! }
//! ```
//!
//! ## How an episode runs
//!
//! 1. The call site's region is looked up (created lazily on first entry).
//! 2. The region opens, reporting the range length as a feature.
//! 3. The oracle returns a policy index, clamped into the action space.
//! 4. The index decodes to a tagged action; the resolved configuration
//!    (thread count, block size, or 1.0 for serial) is re-reported.
//! 5. Exactly one executor call runs the loop body.
//! 6. The region closes - on every exit path, including panics.
//!
//! ## Configuration
//!
//! Sources are merged in order (later overrides earlier): defaults, config
//! files, environment variables, programmatic overrides, CLI arguments.
//!
//! ```toml
//! prefix = "myapp"
//! thread_cap = 16
//! default_threads = 8
//! dynamic_chunk = 16
//! ```
//!
//! With `.env_prefix("HELM")`: `HELM_THREAD_CAP=16`, `HELM_PREFIX=myapp`.

pub mod action;
pub mod ambient;
pub mod builder;
pub mod config;
pub(crate) mod context;
pub mod controller;
pub mod device;
pub(crate) mod dispatch;
pub mod error;
pub mod exec;
pub mod metrics;
pub mod oracle;
pub mod region;
pub mod tiers;

pub use action::{decode_cpu, decode_gpu, CpuAction, GpuAction, Schedule, CPU_ACTION_COUNT, GPU_ACTION_COUNT};
pub use ambient::AmbientThreads;
pub use builder::{HelmArgs, HelmBuilder};
pub use config::HelmConfig;
pub use context::{current, CurrentGuard};
pub use controller::Helm;
pub use device::{DeviceExecutor, DispatchMode, EmulatedDevice, LaunchRequest, StreamId};
pub use error::{HelmError, Result};
pub use exec::{ParallelExecutor, RayonExecutor};
pub use metrics::HelmMetrics;
pub use oracle::{NullOracle, PolicyOracle, RegionId};
pub use region::{Region, RegionFlavor, RegionKey, RegionRegistry, TierTable};
pub use tiers::{cpu_thread_tiers, CPU_TIER_COUNT, GPU_BLOCK_TIERS, GPU_TIER_COUNT};

/// Adaptively execute a loop body over a range, deriving the region key
/// from the lexical expansion site.
///
/// Two forms:
///
/// - `adaptive_for_each!(helm, range, body)` dispatches on an explicit
///   controller.
/// - `adaptive_for_each!(range, body)` dispatches on the thread-local
///   current controller installed with [`Helm::make_current`], and panics
///   if none is installed.
///
/// Every expansion site gets its own region: two macro invocations on
/// different lines learn independently, while repeated executions of one
/// invocation share accumulated state.
///
/// # Example
///
/// ```ignore
/// let _ctx = helm.make_current();
/// helm_rs::adaptive_for_each!(0..n, |i| {
///     std::hint::black_box(a[i] + b[i]);
/// });
/// ```
#[macro_export]
macro_rules! adaptive_for_each {
    ($helm:expr, $range:expr, $body:expr $(,)?) => {{
        let __key = $crate::RegionKey::from_location(file!(), line!(), column!());
        $helm.adaptive_for_each(__key, $range, $body)
    }};
    ($range:expr, $body:expr $(,)?) => {{
        let __key = $crate::RegionKey::from_location(file!(), line!(), column!());
        $crate::current()
            .expect("adaptive_for_each! called outside a Helm context")
            .adaptive_for_each(__key, $range, $body)
    }};
}

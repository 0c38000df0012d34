//! The Helm controller.
//!
//! A [`Helm`] wires the pieces of adaptive dispatch together: the region
//! registry, the policy oracle, the CPU and device executors, the ambient
//! thread-count state, and metrics. It is the object applications hold and
//! the entry point `adaptive_for_each`/`adaptive_launch` run through.
//!
//! The controller itself never spawns threads and never blocks outside the
//! external executor call: every adaptive-control operation on the dispatch
//! path is a bounded-time word access or map lookup on the calling thread.

use std::ops::Range;
use std::sync::Arc;

use tracing::info;

use crate::ambient::AmbientThreads;
use crate::config::HelmConfig;
use crate::context::{self, CurrentGuard};
use crate::device::{DeviceExecutor, DispatchMode, EmulatedDevice, LaunchRequest};
use crate::dispatch::{dispatch_cpu, dispatch_gpu};
use crate::error::Result;
use crate::exec::RayonExecutor;
use crate::metrics::HelmMetrics;
use crate::oracle::{NullOracle, PolicyOracle};
use crate::region::{RegionFlavor, RegionKey, RegionRegistry};

/// Adaptive execution-policy controller.
///
/// Cheap to clone (a shared handle). Regions created through one controller
/// share its oracle, executors, ambient state, and metrics.
///
/// # Examples
///
/// ```ignore
/// use helm_rs::{HelmBuilder, RegionKey};
///
/// let helm = HelmBuilder::new().thread_cap(8).build()?;
///
/// let mut out = vec![0.0f64; 1 << 20];
/// helm.adaptive_for_each(RegionKey::from_name("scale"), 0..out.len(), |i| {
///     // each index visited exactly once, under whatever configuration
///     // the oracle selected for this call site
/// });
/// ```
#[derive(Clone)]
pub struct Helm {
    inner: Arc<HelmInner>,
}

pub(crate) struct HelmInner {
    config: HelmConfig,
    thread_cap: usize,
    registry: RegionRegistry,
    oracle: Arc<dyn PolicyOracle>,
    exec: RayonExecutor,
    device: Arc<dyn DeviceExecutor>,
    ambient: AmbientThreads,
    metrics: HelmMetrics,
}

impl Helm {
    /// Create a controller from a configuration and optional collaborators.
    ///
    /// This is typically called via [`HelmBuilder::build`].
    ///
    /// [`HelmBuilder::build`]: crate::builder::HelmBuilder::build
    pub(crate) fn from_parts(
        config: HelmConfig,
        oracle: Option<Arc<dyn PolicyOracle>>,
        device: Option<Arc<dyn DeviceExecutor>>,
    ) -> Result<Self> {
        let thread_cap = config.effective_thread_cap();
        let default_threads = config.effective_default_threads(thread_cap);

        let metrics = HelmMetrics::with_prefix(&config.prefix);
        if let Some(registry) = &config.prometheus_registry {
            metrics.register(registry)?;
        }

        let exec = RayonExecutor::new(
            &config.prefix,
            thread_cap,
            config.dynamic_chunk,
            config.guided_min_chunk,
        )?;

        let oracle = oracle.unwrap_or_else(|| Arc::new(NullOracle));
        let device = device.unwrap_or_else(|| Arc::new(EmulatedDevice));

        info!(
            prefix = %config.prefix,
            thread_cap,
            default_threads,
            gpu_async = config.gpu_async,
            "helm controller ready"
        );

        Ok(Self {
            inner: Arc::new(HelmInner {
                registry: RegionRegistry::new(thread_cap, metrics.clone()),
                thread_cap,
                oracle,
                exec,
                device,
                ambient: AmbientThreads::new(default_threads),
                metrics,
                config,
            }),
        })
    }

    pub(crate) fn from_inner(inner: Arc<HelmInner>) -> Self {
        Self { inner }
    }

    /// Adaptively execute `body` over `range` at the call site identified
    /// by `key`.
    ///
    /// The first invocation for a key creates its region (computing the
    /// tier table exactly once); every invocation then runs one episode:
    /// report the range length, query the oracle, dispatch the decoded
    /// action. With no oracle attached this is equivalent to running under
    /// the ambient configuration.
    ///
    /// The body is invoked exactly once per index. Panics from the body
    /// propagate after the region's episode is closed.
    pub fn adaptive_for_each<F>(&self, key: RegionKey, range: Range<usize>, body: F)
    where
        F: Fn(usize) + Sync,
    {
        let region = self.inner.registry.get_or_create(key, RegionFlavor::Cpu);
        dispatch_cpu(
            &region,
            self.inner.oracle.as_ref(),
            &self.inner.ambient,
            &self.inner.exec,
            &self.inner.metrics,
            range,
            &body,
        );
    }

    /// Adaptively launch `body` as a device kernel over `range`.
    ///
    /// The oracle may override the requested block size with a tier; the
    /// launch grid is sized from the resolved block size. Synchronization
    /// follows `request.mode`.
    ///
    /// # Errors
    ///
    /// Propagates device executor failures unmodified; the region's episode
    /// is closed before propagation.
    pub fn adaptive_launch<F>(
        &self,
        key: RegionKey,
        range: Range<usize>,
        request: LaunchRequest,
        body: F,
    ) -> Result<()>
    where
        F: Fn(usize) + Sync,
    {
        let region = self.inner.registry.get_or_create(key, RegionFlavor::Gpu);
        dispatch_gpu(
            &region,
            self.inner.oracle.as_ref(),
            self.inner.device.as_ref(),
            &self.inner.metrics,
            range,
            request,
            &body,
        )
    }

    /// A launch request for `block_size` honoring the configured default
    /// dispatch mode.
    pub fn launch_request(&self, block_size: usize) -> LaunchRequest {
        let mode = if self.inner.config.gpu_async {
            DispatchMode::Async
        } else {
            DispatchMode::Sync
        };
        LaunchRequest::new(block_size).with_mode(mode)
    }

    /// Install this controller as the thread-local current controller.
    ///
    /// While the returned guard lives, [`current`] (and therefore the
    /// key-less forms of the entry macro) resolve to this controller on
    /// this thread. Dropping the guard restores the previous controller.
    ///
    /// [`current`]: crate::current
    pub fn make_current(&self) -> CurrentGuard {
        context::install(Arc::downgrade(&self.inner))
    }

    /// The hardware thread cap used for tier derivation.
    pub fn thread_cap(&self) -> usize {
        self.inner.thread_cap
    }

    /// The current ambient thread count.
    pub fn ambient_threads(&self) -> usize {
        self.inner.ambient.get()
    }

    /// Number of regions created so far.
    pub fn region_count(&self) -> usize {
        self.inner.registry.len()
    }

    /// The controller's metrics.
    pub fn metrics(&self) -> &HelmMetrics {
        &self.inner.metrics
    }

    /// The controller's configuration.
    pub fn config(&self) -> &HelmConfig {
        &self.inner.config
    }
}

impl std::fmt::Debug for Helm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Helm")
            .field("thread_cap", &self.inner.thread_cap)
            .field("regions", &self.inner.registry.len())
            .field("ambient_threads", &self.inner.ambient.get())
            .finish()
    }
}

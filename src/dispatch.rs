//! Policy dispatch: from a clamped policy index to exactly one executor call.
//!
//! Each invocation is an *episode*: the region opens with the observed
//! problem size, the oracle is queried, the decoded action resolves to a
//! concrete configuration which is re-reported as a feature, exactly one
//! executor call runs, and the region closes. The close is guaranteed on
//! every exit path - normal return, body panic unwinding out of the
//! executor, or a device-launch error - by holding the episode open through
//! an RAII guard.

use std::ops::Range;

use tracing::trace;

use crate::action::{decode_cpu, decode_gpu, CpuAction, GpuAction, Schedule};
use crate::ambient::AmbientThreads;
use crate::device::{grid_size, DeviceExecutor, DispatchMode, LaunchRequest};
use crate::error::Result;
use crate::exec::{LoopBody, ParallelExecutor};
use crate::metrics::HelmMetrics;
use crate::oracle::PolicyOracle;
use crate::region::Region;

/// Holds a region's episode open; `end()` runs on drop, including unwinds.
struct RegionGuard<'a> {
    region: &'a Region,
}

impl<'a> RegionGuard<'a> {
    fn begin(region: &'a Region, feature: f64) -> Self {
        region.begin(feature);
        Self { region }
    }
}

impl Drop for RegionGuard<'_> {
    fn drop(&mut self) {
        self.region.end();
    }
}

/// Run one adaptive CPU episode over `range`.
pub(crate) fn dispatch_cpu(
    region: &Region,
    oracle: &dyn PolicyOracle,
    ambient: &AmbientThreads,
    exec: &dyn ParallelExecutor,
    metrics: &HelmMetrics,
    range: Range<usize>,
    body: LoopBody<'_>,
) {
    let num_elements = range.end.saturating_sub(range.start) as f64;
    let _guard = RegionGuard::begin(region, num_elements);

    let index = region.query_policy(oracle);
    let action = decode_cpu(index);
    trace!(key = region.id().key.0, index, ?action, num_elements, "cpu dispatch");
    metrics.dispatches_total.inc();

    match action {
        CpuAction::Default => {
            // Inherit whatever thread count the last parallel action (from
            // any region) left behind; do not overwrite it.
            let threads = ambient.get();
            region.report_feature(oracle, threads as f64);
            metrics.default_actions.inc();
            exec.run_parallel(Schedule::Auto, threads, range, body);
        }
        CpuAction::Sequential => {
            region.report_feature(oracle, 1.0);
            metrics.sequential_actions.inc();
            exec.run_sequential(range, body);
        }
        CpuAction::Parallel { schedule, tier } => {
            let threads = region.tiers().thread_tier(tier);
            ambient.set(threads);
            region.report_feature(oracle, threads as f64);
            metrics.parallel_actions.inc();
            exec.run_parallel(schedule, threads, range, body);
        }
    }
}

/// Run one adaptive device episode over `range`.
///
/// Empty ranges and zero-block requests skip the episode entirely: no
/// begin/end, no oracle traffic, no launch.
pub(crate) fn dispatch_gpu(
    region: &Region,
    oracle: &dyn PolicyOracle,
    device: &dyn DeviceExecutor,
    metrics: &HelmMetrics,
    range: Range<usize>,
    request: LaunchRequest,
    body: LoopBody<'_>,
) -> Result<()> {
    let len = range.end.saturating_sub(range.start);
    if len == 0 || request.block_size == 0 {
        return Ok(());
    }

    let _guard = RegionGuard::begin(region, len as f64);

    let index = region.query_policy(oracle);
    let block = match decode_gpu(index) {
        GpuAction::DefaultBlockSize => request.block_size,
        GpuAction::Explicit(size) => size,
    };
    region.report_feature(oracle, block as f64);

    let grid = grid_size(len, block);
    trace!(
        key = region.id().key.0,
        index,
        grid,
        block,
        requested_block = request.block_size,
        "device dispatch"
    );
    metrics.dispatches_total.inc();
    metrics.gpu_launches.inc();
    if index == 0 {
        metrics.default_actions.inc();
    }

    device.launch_kernel(
        grid,
        block,
        request.shared_mem_bytes,
        request.stream,
        range,
        body,
    )?;
    if request.mode == DispatchMode::Sync {
        device.synchronize(request.stream)?;
    }
    Ok(())
}

//! Device kernel-launch executors.
//!
//! The adaptive layer only chooses launch shapes; kernel execution belongs
//! to an external [`DeviceExecutor`]. The [`EmulatedDevice`] implementation
//! models a 1-D launch on the host (every global thread index below the
//! range length invokes the body once) so the dispatch logic - block-size
//! tier selection, grid sizing, sync/async mode - can be exercised end to
//! end without device hardware.

use std::ops::Range;

use crate::error::Result;
use crate::exec::LoopBody;

/// Whether a launch blocks until the device work completes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum DispatchMode {
    /// Synchronize the stream after the launch.
    #[default]
    Sync,
    /// Return immediately after the launch; ordering with dependent work is
    /// the caller's responsibility.
    Async,
}

/// Opaque device stream identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct StreamId(pub u64);

/// A statically-requested launch shape.
///
/// The block size here is the caller's request; the adaptive layer may
/// override it with a tier, and policy index 0 means "keep this request".
#[derive(Clone, Copy, Debug)]
pub struct LaunchRequest {
    /// Requested threads per block.
    pub block_size: usize,
    /// Dynamic shared memory per block, in bytes.
    pub shared_mem_bytes: usize,
    /// Stream to launch on.
    pub stream: StreamId,
    /// Sync or async dispatch.
    pub mode: DispatchMode,
}

impl LaunchRequest {
    /// A synchronous launch request on the default stream with no dynamic
    /// shared memory.
    pub fn new(block_size: usize) -> Self {
        Self {
            block_size,
            shared_mem_bytes: 0,
            stream: StreamId::default(),
            mode: DispatchMode::Sync,
        }
    }

    /// Builder method to set the dispatch mode.
    pub fn with_mode(mut self, mode: DispatchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Builder method to set the stream.
    pub fn with_stream(mut self, stream: StreamId) -> Self {
        self.stream = stream;
        self
    }

    /// Builder method to set dynamic shared memory.
    pub fn with_shared_mem(mut self, bytes: usize) -> Self {
        self.shared_mem_bytes = bytes;
        self
    }
}

/// Grid size (in blocks) covering `len` iterations at `block_size` threads
/// per block.
///
/// `block_size` must be nonzero; the dispatcher guarantees this by skipping
/// zero-block launches entirely.
pub fn grid_size(len: usize, block_size: usize) -> usize {
    len.div_ceil(block_size)
}

/// The device-executor interface consumed by the dispatcher.
pub trait DeviceExecutor: Send + Sync {
    /// Launch `body` as a `grid` x `block` kernel over `range`.
    ///
    /// The body must be invoked exactly once per index in the range;
    /// global thread indices at or beyond the range length do nothing.
    fn launch_kernel(
        &self,
        grid: usize,
        block: usize,
        shared_mem_bytes: usize,
        stream: StreamId,
        range: Range<usize>,
        body: LoopBody<'_>,
    ) -> Result<()>;

    /// Block until work previously launched on `stream` completes.
    fn synchronize(&self, stream: StreamId) -> Result<()>;
}

/// Host-side model of a 1-D device launch.
///
/// Walks the `grid * block` global thread indices in order and invokes the
/// body for those below the range length. Launches complete before
/// `launch_kernel` returns, so `synchronize` is a no-op.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmulatedDevice;

impl DeviceExecutor for EmulatedDevice {
    fn launch_kernel(
        &self,
        grid: usize,
        block: usize,
        _shared_mem_bytes: usize,
        _stream: StreamId,
        range: Range<usize>,
        body: LoopBody<'_>,
    ) -> Result<()> {
        let len = range.end.saturating_sub(range.start);
        for thread_idx in 0..grid * block {
            if thread_idx < len {
                body(range.start + thread_idx);
            }
        }
        Ok(())
    }

    fn synchronize(&self, _stream: StreamId) -> Result<()> {
        Ok(())
    }
}

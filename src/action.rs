//! Action spaces: the enumerated execution configurations a region selects among.
//!
//! Policy indices returned by the oracle are positional: the mapping from
//! index to action below is a wire contract, and reordering or deduplicating
//! entries would silently change the meaning of every model the oracle has
//! ever fit. Several indices resolve to the same thread count under
//! different schedule kinds; they are nevertheless distinct actions, and the
//! redundancy is preserved.
//!
//! The flat integer protocol is decoded into a tagged variant immediately at
//! the oracle boundary; everything downstream operates on the variant.

use crate::tiers::{GPU_BLOCK_TIERS, GPU_TIER_COUNT};

/// Number of entries in the CPU action space.
pub const CPU_ACTION_COUNT: usize = 20;

/// Number of entries in the device action space.
pub const GPU_ACTION_COUNT: usize = GPU_TIER_COUNT;

/// Work-distribution schedule for a parallel action.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Schedule {
    /// Equal contiguous chunks, one per worker.
    Static,
    /// Workers pull fixed-size chunks from a shared cursor.
    Dynamic,
    /// Workers pull shrinking chunks proportional to the remaining work.
    Guided,
    /// Distribution is left to the executor.
    Auto,
}

/// One entry of the CPU action space.
///
/// Index layout: 0 = `Default`, 1 = `Sequential`, 2-7 = static over tiers
/// 0-5, 8-13 = dynamic over tiers 0-5, 14-19 = guided over tiers 0-5.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum CpuAction {
    /// Run with the ambient thread count, whatever the last parallel action
    /// (from any region) left behind. The safe fallback: index 0 never
    /// selects an experimental configuration.
    Default,
    /// Run the loop body on the calling thread, bypassing the pool.
    Sequential,
    /// Run with `tiers[tier]` threads under the given schedule.
    Parallel {
        /// Work-distribution schedule.
        schedule: Schedule,
        /// Index into the region's thread-count tier table.
        tier: usize,
    },
}

/// One entry of the device action space.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum GpuAction {
    /// Launch with the block size the caller requested.
    DefaultBlockSize,
    /// Launch with an explicit block-size override.
    Explicit(usize),
}

/// Decode a policy index into a CPU action.
///
/// Total over all of `usize`: indices at or beyond [`CPU_ACTION_COUNT`]
/// decode to `Default`, so a misbehaving oracle can never select an
/// unmapped action.
pub fn decode_cpu(index: usize) -> CpuAction {
    match index {
        0 => CpuAction::Default,
        1 => CpuAction::Sequential,
        2..=7 => CpuAction::Parallel {
            schedule: Schedule::Static,
            tier: index - 2,
        },
        8..=13 => CpuAction::Parallel {
            schedule: Schedule::Dynamic,
            tier: index - 8,
        },
        14..=19 => CpuAction::Parallel {
            schedule: Schedule::Guided,
            tier: index - 14,
        },
        _ => CpuAction::Default,
    }
}

/// Decode a policy index into a device action.
///
/// Total over all of `usize`: index 0 and anything at or beyond
/// [`GPU_ACTION_COUNT`] decode to `DefaultBlockSize`.
pub fn decode_gpu(index: usize) -> GpuAction {
    match index {
        0 => GpuAction::DefaultBlockSize,
        i if i < GPU_ACTION_COUNT => GpuAction::Explicit(GPU_BLOCK_TIERS[i]),
        _ => GpuAction::DefaultBlockSize,
    }
}

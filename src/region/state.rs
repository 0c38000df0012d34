//! Per-call-site adaptive state.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use tracing::trace;

use crate::metrics::HelmMetrics;
use crate::oracle::{PolicyOracle, RegionId};
use crate::tiers::{CPU_TIER_COUNT, GPU_TIER_COUNT};

const IDLE: u8 = 0;
const ACTIVE: u8 = 1;

/// The precomputed resource tiers a region selects among.
///
/// Immutable after construction; action indices are positions into these
/// tables, so the tables must never be reordered or compacted.
#[derive(Clone, Copy, Debug)]
pub enum TierTable {
    /// Thread-count tiers derived from the hardware cap at region creation.
    Cpu([usize; CPU_TIER_COUNT]),
    /// The fixed block-size tier table shared by every device region.
    Gpu(&'static [usize; GPU_TIER_COUNT]),
}

impl TierTable {
    /// Resolve a tier index to a thread count.
    ///
    /// Total over both flavors: a device-flavored table (which has no
    /// thread tiers) resolves to the minimum admissible thread count, so a
    /// mispaired dispatch stays correct rather than failing.
    pub fn thread_tier(&self, index: usize) -> usize {
        match self {
            TierTable::Cpu(tiers) => tiers[index.min(CPU_TIER_COUNT - 1)],
            TierTable::Gpu(_) => 2,
        }
    }
}

/// Per-call-site adaptive controller state.
///
/// One `Region` is lazily created for each distinct call site and lives for
/// the remainder of the process; see [`RegionRegistry`]. It carries the
/// declared action-space size, the most recently reported feature, the
/// immutable tier table, and the Idle/Active lifecycle marker.
///
/// # Concurrency
///
/// Every operation is a non-blocking O(1) word access, so a `Region` is
/// memory-safe under any interleaving. The *protocol* is single-writer by
/// contract: one call site is reached by one thread at a time in the
/// originating control structure, and callers that violate that (concurrent
/// reentrant invocation of one region) get well-defined memory but
/// interleaved episode bookkeeping, which the oracle may observe as noise.
///
/// [`RegionRegistry`]: crate::region::RegionRegistry
#[derive(Debug)]
pub struct Region {
    id: RegionId,
    tiers: TierTable,
    /// f64 bits of the most recently reported feature.
    last_feature: AtomicU64,
    state: AtomicU8,
    metrics: HelmMetrics,
}

impl Region {
    pub(crate) fn new(id: RegionId, tiers: TierTable, metrics: HelmMetrics) -> Self {
        debug_assert!(id.action_count >= 1);
        Self {
            id,
            tiers,
            last_feature: AtomicU64::new(0f64.to_bits()),
            state: AtomicU8::new(IDLE),
            metrics,
        }
    }

    /// The oracle-facing identity (key + declared action-space size).
    pub fn id(&self) -> RegionId {
        self.id
    }

    /// Number of actions this region's dispatcher recognizes.
    pub fn action_count(&self) -> usize {
        self.id.action_count
    }

    /// The region's tier table.
    pub fn tiers(&self) -> &TierTable {
        &self.tiers
    }

    /// Most recently reported feature value.
    pub fn last_feature(&self) -> f64 {
        f64::from_bits(self.last_feature.load(Ordering::Acquire))
    }

    /// Whether an episode is currently open.
    pub fn is_active(&self) -> bool {
        self.state.load(Ordering::Acquire) == ACTIVE
    }

    /// Open an episode: record the feature and mark the region Active.
    pub fn begin(&self, feature: f64) {
        self.last_feature
            .store(feature.to_bits(), Ordering::Release);
        self.state.store(ACTIVE, Ordering::Release);
    }

    /// Forward the current feature to the oracle and return its policy
    /// index, clamped into `[0, action_count)`.
    ///
    /// An out-of-range response is a contract violation by the oracle; it
    /// is recovered here to index 0 (the default action), counted, and
    /// never surfaced to the caller.
    pub fn query_policy(&self, oracle: &dyn PolicyOracle) -> usize {
        oracle.report_feature(self.id, self.last_feature());
        let index = oracle.policy_index(self.id);
        if index >= self.id.action_count {
            trace!(
                key = self.id.key.0,
                index,
                action_count = self.id.action_count,
                "policy index out of range, falling back to default"
            );
            self.metrics.policy_clamps.inc();
            return 0;
        }
        index
    }

    /// Report a resolved-configuration feature (thread count, block size,
    /// or 1.0 for a serial pass) for the open episode.
    pub fn report_feature(&self, oracle: &dyn PolicyOracle, value: f64) {
        self.last_feature.store(value.to_bits(), Ordering::Release);
        oracle.report_feature(self.id, value);
    }

    /// Close the episode: mark the region Idle.
    pub fn end(&self) {
        self.state.store(IDLE, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::NullOracle;
    use crate::region::RegionKey;
    use crate::tiers::{cpu_thread_tiers, GPU_BLOCK_TIERS};
    use std::sync::Mutex;

    fn cpu_region(action_count: usize) -> Region {
        Region::new(
            RegionId {
                key: RegionKey::from_name("test"),
                action_count,
            },
            TierTable::Cpu(cpu_thread_tiers(8)),
            HelmMetrics::new(),
        )
    }

    /// Oracle scripted to return a fixed index.
    struct FixedOracle {
        index: usize,
        features: Mutex<Vec<f64>>,
    }

    impl FixedOracle {
        fn new(index: usize) -> Self {
            Self {
                index,
                features: Mutex::new(Vec::new()),
            }
        }
    }

    impl PolicyOracle for FixedOracle {
        fn report_feature(&self, _region: RegionId, value: f64) {
            self.features.lock().unwrap().push(value);
        }

        fn policy_index(&self, _region: RegionId) -> usize {
            self.index
        }
    }

    #[test]
    fn test_begin_end_lifecycle() {
        let region = cpu_region(20);
        assert!(!region.is_active());

        region.begin(100.0);
        assert!(region.is_active());
        assert_eq!(region.last_feature(), 100.0);

        region.end();
        assert!(!region.is_active());
    }

    #[test]
    fn test_begin_overwrites_feature() {
        let region = cpu_region(20);
        region.begin(10.0);
        region.end();
        region.begin(2000.0);
        assert_eq!(region.last_feature(), 2000.0);
    }

    #[test]
    fn test_query_policy_forwards_feature() {
        let region = cpu_region(20);
        let oracle = FixedOracle::new(5);

        region.begin(1234.0);
        let index = region.query_policy(&oracle);
        assert_eq!(index, 5);
        assert_eq!(*oracle.features.lock().unwrap(), vec![1234.0]);
    }

    #[test]
    fn test_query_policy_clamps_out_of_range_to_default() {
        let region = cpu_region(20);
        let oracle = FixedOracle::new(999);

        region.begin(10.0);
        assert_eq!(region.query_policy(&oracle), 0);
    }

    #[test]
    fn test_query_policy_null_oracle_is_default() {
        let region = cpu_region(20);
        region.begin(10.0);
        assert_eq!(region.query_policy(&NullOracle), 0);
    }

    #[test]
    fn test_clamp_increments_metric() {
        let metrics = HelmMetrics::new();
        let region = Region::new(
            RegionId {
                key: RegionKey::from_name("clamp"),
                action_count: 20,
            },
            TierTable::Cpu(cpu_thread_tiers(8)),
            metrics.clone(),
        );
        let oracle = FixedOracle::new(20);

        region.begin(1.0);
        assert_eq!(region.query_policy(&oracle), 0);
        assert_eq!(metrics.policy_clamps.get(), 1);
    }

    #[test]
    fn test_gpu_tier_table_thread_fallback() {
        let table = TierTable::Gpu(&GPU_BLOCK_TIERS);
        assert_eq!(table.thread_tier(3), 2);
    }

    #[test]
    fn test_cpu_tier_lookup() {
        let table = TierTable::Cpu(cpu_thread_tiers(8));
        assert_eq!(table.thread_tier(0), 2);
        assert_eq!(table.thread_tier(2), 4);
        assert_eq!(table.thread_tier(5), 8);
    }
}

//! Lazy, exactly-once region creation keyed by call site.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::action::{CPU_ACTION_COUNT, GPU_ACTION_COUNT};
use crate::metrics::HelmMetrics;
use crate::oracle::RegionId;
use crate::region::key::RegionKey;
use crate::region::state::{Region, TierTable};
use crate::tiers::{cpu_thread_tiers, GPU_BLOCK_TIERS};

/// Which action space a region dispatches into.
///
/// The flavor fixes the action-space size and the tier-table shape at
/// creation; a key is expected to be used with one flavor for the life of
/// the process.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum RegionFlavor {
    /// CPU thread-team dispatch (20 actions over 6 thread tiers).
    Cpu,
    /// Device kernel dispatch (20 actions over the block-size table).
    Gpu,
}

impl RegionFlavor {
    fn action_count(self) -> usize {
        match self {
            RegionFlavor::Cpu => CPU_ACTION_COUNT,
            RegionFlavor::Gpu => GPU_ACTION_COUNT,
        }
    }
}

/// Shared map from call-site key to its one `Region` instance.
///
/// The map is mutated only during lazy first creation and read-only
/// thereafter, so the fast path is a read lock. First creation for a key
/// happens exactly once even under concurrent first entry: the write-locked
/// slow path re-checks before constructing, and construction (including
/// tier-table computation) runs under the lock.
#[derive(Debug)]
pub struct RegionRegistry {
    thread_cap: usize,
    metrics: HelmMetrics,
    regions: RwLock<HashMap<RegionKey, Arc<Region>>>,
}

impl RegionRegistry {
    /// Create an empty registry.
    ///
    /// `thread_cap` is the per-process hardware thread cap used to derive
    /// CPU tier tables for regions created through this registry.
    pub fn new(thread_cap: usize, metrics: HelmMetrics) -> Self {
        Self {
            thread_cap,
            metrics,
            regions: RwLock::new(HashMap::new()),
        }
    }

    /// Get the region for `key`, creating it on first use.
    ///
    /// Idempotent: every caller for a given key receives a handle to the
    /// same instance, and tier-table computation runs exactly once per key.
    pub fn get_or_create(&self, key: RegionKey, flavor: RegionFlavor) -> Arc<Region> {
        if let Some(region) = self.regions.read().get(&key) {
            return Arc::clone(region);
        }

        let mut regions = self.regions.write();
        // Another thread may have won the race between our read and write.
        if let Some(region) = regions.get(&key) {
            return Arc::clone(region);
        }

        let tiers = match flavor {
            RegionFlavor::Cpu => TierTable::Cpu(cpu_thread_tiers(self.thread_cap)),
            RegionFlavor::Gpu => TierTable::Gpu(&GPU_BLOCK_TIERS),
        };
        let id = RegionId {
            key,
            action_count: flavor.action_count(),
        };
        debug!(key = key.0, ?flavor, ?tiers, "creating region");
        self.metrics.regions_created.inc();

        let region = Arc::new(Region::new(id, tiers, self.metrics.clone()));
        regions.insert(key, Arc::clone(&region));
        region
    }

    /// Number of regions created so far.
    pub fn len(&self) -> usize {
        self.regions.read().len()
    }

    /// Whether any region has been created yet.
    pub fn is_empty(&self) -> bool {
        self.regions.read().is_empty()
    }
}

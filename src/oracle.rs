//! The policy-oracle interface.
//!
//! The oracle is the external decision-maker that turns reported features
//! (problem sizes, resolved configurations) into policy indices. Everything
//! about how it learns is outside this crate; the controller only speaks
//! the narrow protocol below, and it must keep working when the oracle is
//! uninitialized, stale, or hostile.
//!
//! # Wire contract
//!
//! A region identifies itself to the oracle as a [`RegionId`]: its call-site
//! key plus the declared action-space size. Policy indices are positional
//! into that action space (see [`crate::action`]); an index the oracle
//! returns is meaningless without the declared size, which is why the size
//! travels with the identity.
//!
//! # Fail-safe invariant
//!
//! Policy index 0 always denotes the safe default configuration. An oracle
//! with no model yet must return 0 from [`PolicyOracle::policy_index`], and
//! must never signal an error to the caller: the adaptive layer degrades to
//! default behavior silently.

use crate::region::RegionKey;

/// Oracle-facing identity of a region: call-site key plus declared
/// action-space size.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct RegionId {
    /// The call-site key the region was registered under.
    pub key: RegionKey,
    /// Number of actions the region's dispatcher recognizes.
    pub action_count: usize,
}

/// The narrow request/response interface against the external oracle.
///
/// Both operations are invoked on the loop-dispatch path and must complete
/// in bounded time: no I/O, no synchronous training. An implementation that
/// feeds a heavier backend should treat `report_feature` as fire-and-forget
/// (enqueue and return).
pub trait PolicyOracle: Send + Sync {
    /// Report an observed feature value for a region.
    ///
    /// Called with the problem size at the start of every invocation, and
    /// again with the resolved configuration (thread count or block size,
    /// or `1.0` for a serial pass) once a policy has been applied.
    fn report_feature(&self, region: RegionId, value: f64);

    /// Return a policy index for the region's current features.
    ///
    /// Must return 0 when no model is available. Out-of-range responses are
    /// tolerated (the region clamps them to 0), but conforming
    /// implementations stay within `[0, region.action_count)`.
    fn policy_index(&self, region: RegionId) -> usize;
}

/// Oracle stand-in used when no oracle has been attached.
///
/// Discards features and always selects the default action, which makes
/// adaptive dispatch behave identically to non-adaptive execution under the
/// ambient configuration.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullOracle;

impl PolicyOracle for NullOracle {
    fn report_feature(&self, _region: RegionId, _value: f64) {}

    fn policy_index(&self, _region: RegionId) -> usize {
        0
    }
}

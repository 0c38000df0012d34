//! Per-call-site adaptive regions.
//!
//! A region binds one lexical loop invocation point to its adaptive state:
//! the declared action-space size, the most recently observed feature, the
//! precomputed resource tiers, and the Idle/Active episode lifecycle. The
//! registry creates each region lazily on first entry, exactly once, and
//! the region then persists for the life of the process.
//!
//! Lifecycle per invocation (driven by the dispatcher):
//!
//! 1. `begin(feature)` - open the episode with the observed problem size
//! 2. `query_policy(oracle)` - obtain the policy index, clamped to range
//! 3. dispatch the decoded action, re-reporting the resolved configuration
//! 4. `end()` - close the episode, on every exit path

mod key;
mod registry;
mod state;

pub use key::RegionKey;
pub use registry::{RegionFlavor, RegionRegistry};
pub use state::{Region, TierTable};

//! Resource tier derivation.
//!
//! A tier table is the bounded, ordered set of concrete resource levels a
//! region may select among: thread counts for CPU regions, block sizes for
//! device regions. CPU tiers are derived once from the hardware thread cap;
//! device tiers are a fixed table.
//!
//! Duplicate tier values are preserved, not collapsed: action indices are
//! positional, so dropping a duplicate would shift the meaning of every
//! index after it.

/// Number of thread-count tiers in a CPU tier table.
pub const CPU_TIER_COUNT: usize = 6;

/// Number of block-size tiers in the device tier table.
pub const GPU_TIER_COUNT: usize = 20;

/// Block-size tiers for device dispatch.
///
/// Index 0 means "use the block size the caller requested", not a tier
/// override; the remaining entries are explicit block sizes in ascending
/// order.
pub const GPU_BLOCK_TIERS: [usize; GPU_TIER_COUNT] = [
    0, 32, 64, 128, 192, 256, 320, 384, 448, 512, 576, 640, 704, 768, 832, 896, 960, 1024, 2048,
    4096,
];

/// Derive the thread-count tiers for a CPU region from the per-process
/// thread cap.
///
/// The table is `{2, ⌈0.25C⌉, ⌈0.50C⌉, ⌈0.75C⌉, C, C}` with each interior
/// entry clamped into `[2, {4, 8, 16, 32}]` respectively. The result is
/// non-decreasing, starts at 2, and ends at `max(2, cap)`.
///
/// A degenerate cap (`cap < 2`) clamps every tier to 2 rather than failing:
/// the table stays valid and dispatch stays correct, merely suboptimal.
pub fn cpu_thread_tiers(cap: usize) -> [usize; CPU_TIER_COUNT] {
    [
        2,
        cap.div_ceil(4).clamp(2, 4),
        cap.div_ceil(2).clamp(2, 8),
        (3 * cap).div_ceil(4).clamp(2, 16),
        cap.clamp(2, 32),
        cap.max(2),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worked_example_cap_8() {
        assert_eq!(cpu_thread_tiers(8), [2, 2, 4, 6, 8, 8]);
    }

    #[test]
    fn test_degenerate_caps_clamp_to_minimum() {
        assert_eq!(cpu_thread_tiers(0), [2; CPU_TIER_COUNT]);
        assert_eq!(cpu_thread_tiers(1), [2; CPU_TIER_COUNT]);
    }

    #[test]
    fn test_tiers_non_decreasing_with_endpoints() {
        for cap in 2..=256 {
            let tiers = cpu_thread_tiers(cap);
            assert_eq!(tiers[0], 2, "cap {}", cap);
            assert_eq!(tiers[CPU_TIER_COUNT - 1], cap, "cap {}", cap);
            for w in tiers.windows(2) {
                assert!(w[0] <= w[1], "cap {}: {:?}", cap, tiers);
            }
        }
    }

    #[test]
    fn test_large_cap_saturates_interior_bounds() {
        // Interior tiers are bounded even when the cap dwarfs them.
        assert_eq!(cpu_thread_tiers(128), [2, 4, 8, 16, 32, 128]);
    }

    #[test]
    fn test_duplicates_preserved() {
        // cap 4: 0.25 and 0.50 fractions both land on small values; the
        // resulting duplicates must stay in place.
        assert_eq!(cpu_thread_tiers(4), [2, 2, 2, 3, 4, 4]);
    }

    #[test]
    fn test_gpu_table_shape() {
        assert_eq!(GPU_BLOCK_TIERS.len(), GPU_TIER_COUNT);
        assert_eq!(GPU_BLOCK_TIERS[0], 0);
        assert_eq!(GPU_BLOCK_TIERS[17], 1024);
        assert_eq!(GPU_BLOCK_TIERS[GPU_TIER_COUNT - 1], 4096);
        // Ascending after the sentinel entry.
        for w in GPU_BLOCK_TIERS[1..].windows(2) {
            assert!(w[0] < w[1]);
        }
    }
}

//! Adaptive Loop Example
//!
//! Drives one call site through workloads of very different sizes with an
//! oracle that picks a serial pass for sparse inputs and a full-width
//! static tier for dense ones, then prints what the controller observed.
//!
//! Run: cargo run --example adaptive_loop --release

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use helm_rs::{HelmBuilder, PolicyOracle, RegionId};

/// A size-threshold oracle: tiny loops run serially, large loops run on the
/// widest static tier, and everything in between inherits the ambient
/// configuration.
///
/// A learned oracle would fit this boundary from observed timings; the
/// fixed thresholds here just make the dispatch behavior visible.
struct ThresholdOracle {
    serial_below: f64,
    parallel_above: f64,
    last_feature: AtomicU64,
}

impl ThresholdOracle {
    fn new(serial_below: f64, parallel_above: f64) -> Self {
        Self {
            serial_below,
            parallel_above,
            last_feature: AtomicU64::new(0f64.to_bits()),
        }
    }
}

impl PolicyOracle for ThresholdOracle {
    fn report_feature(&self, _region: RegionId, value: f64) {
        self.last_feature.store(value.to_bits(), Ordering::Relaxed);
    }

    fn policy_index(&self, _region: RegionId) -> usize {
        let feature = f64::from_bits(self.last_feature.load(Ordering::Relaxed));
        if feature < self.serial_below {
            1 // sequential
        } else if feature > self.parallel_above {
            7 // static schedule, widest tier
        } else {
            0 // inherit ambient
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let helm = HelmBuilder::new()
        .prefix("demo")
        .oracle(Arc::new(ThresholdOracle::new(256.0, 65_536.0)))
        .build()?;
    let _ctx = helm.make_current();

    println!("thread cap: {}", helm.thread_cap());
    println!();

    let sizes = [64usize, 1_024, 16_384, 262_144, 64, 1_048_576];
    for len in sizes {
        let data: Vec<f64> = (0..len).map(|i| i as f64).collect();
        let start = Instant::now();

        helm_rs::adaptive_for_each!(0..len, |i| {
            std::hint::black_box(data[i].sqrt().sin());
        });

        println!(
            "len {:>9}  ->  ambient now {:>2} threads   ({:>8.1?})",
            len,
            helm.ambient_threads(),
            start.elapsed()
        );
    }

    println!();
    println!("regions created: {}", helm.region_count());
    println!(
        "dispatches: {} (sequential {}, parallel {}, default {})",
        helm.metrics().dispatches_total.get(),
        helm.metrics().sequential_actions.get(),
        helm.metrics().parallel_actions.get(),
        helm.metrics().default_actions.get(),
    );

    Ok(())
}

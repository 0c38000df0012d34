//! CPU parallel-loop executors.
//!
//! The dispatcher selects *which* configuration to run; executors do the
//! running. [`ParallelExecutor`] is the seam the dispatcher invokes through,
//! and [`RayonExecutor`] is the production implementation: a named,
//! cap-sized rayon pool on which each dispatch spawns `thread_count`
//! workers and distributes the iteration range according to the schedule.
//!
//! Work-distribution contracts:
//!
//! - `Static`: equal contiguous chunks, one per worker.
//! - `Dynamic`: workers pull fixed-size chunks from a shared cursor.
//! - `Guided`: workers pull shrinking chunks proportional to remaining work.
//! - `Auto`: distribution is the executor's choice (here: dynamic pulls
//!   with a medium chunk).
//!
//! Every schedule invokes the body exactly once per index in the range.
//! Panics from the body propagate to the caller after in-flight workers
//! finish.

use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::action::Schedule;
use crate::error::Result;

/// A loop body invoked once per index.
pub type LoopBody<'a> = &'a (dyn Fn(usize) + Sync);

/// The parallel-executor interface consumed by the dispatcher.
pub trait ParallelExecutor: Send + Sync {
    /// Run `body` over `range` with `thread_count` workers under `schedule`.
    fn run_parallel(
        &self,
        schedule: Schedule,
        thread_count: usize,
        range: Range<usize>,
        body: LoopBody<'_>,
    );

    /// Run `body` over `range` on the calling thread.
    fn run_sequential(&self, range: Range<usize>, body: LoopBody<'_>);
}

/// Production executor backed by a rayon thread pool.
///
/// The pool is sized to the hardware cap once; per-dispatch thread counts
/// below the cap are realized by spawning that many workers into the pool,
/// so no pool is rebuilt when the selected tier changes.
pub struct RayonExecutor {
    pool: rayon::ThreadPool,
    dynamic_chunk: usize,
    guided_min_chunk: usize,
}

impl RayonExecutor {
    /// Build an executor with `threads` pool workers named
    /// `{prefix}-worker-{NNNN}`.
    pub fn new(
        prefix: &str,
        threads: usize,
        dynamic_chunk: usize,
        guided_min_chunk: usize,
    ) -> Result<Self> {
        let prefix = prefix.to_string();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .thread_name(move |i| format!("{}-worker-{:04}", prefix, i))
            .build()?;
        Ok(Self {
            pool,
            dynamic_chunk: dynamic_chunk.max(1),
            guided_min_chunk: guided_min_chunk.max(1),
        })
    }

    /// Number of workers in the backing pool.
    pub fn pool_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Workers pull fixed-size chunks from a shared cursor until the range
    /// is exhausted.
    fn run_chunked(&self, range: Range<usize>, workers: usize, chunk: usize, body: LoopBody<'_>) {
        let cursor = AtomicUsize::new(range.start);
        let end = range.end;
        self.pool.scope(|s| {
            for _ in 0..workers {
                let cursor = &cursor;
                s.spawn(move |_| loop {
                    let start = cursor.fetch_add(chunk, Ordering::Relaxed);
                    if start >= end {
                        break;
                    }
                    for i in start..end.min(start + chunk) {
                        body(i);
                    }
                });
            }
        });
    }

    /// Workers pull chunks sized `max(min_chunk, remaining / workers)`, so
    /// early pulls are large and the tail is balanced.
    fn run_guided(
        &self,
        range: Range<usize>,
        workers: usize,
        min_chunk: usize,
        body: LoopBody<'_>,
    ) {
        let cursor = AtomicUsize::new(range.start);
        let end = range.end;
        let take_from = move |cur: usize| {
            let remaining = end - cur;
            ((remaining / workers).max(min_chunk)).min(remaining)
        };
        self.pool.scope(|s| {
            for _ in 0..workers {
                let cursor = &cursor;
                s.spawn(move |_| loop {
                    let claimed =
                        cursor.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |cur| {
                            if cur >= end {
                                None
                            } else {
                                Some(cur + take_from(cur))
                            }
                        });
                    let Ok(start) = claimed else { break };
                    for i in start..start + take_from(start) {
                        body(i);
                    }
                });
            }
        });
    }
}

impl ParallelExecutor for RayonExecutor {
    fn run_parallel(
        &self,
        schedule: Schedule,
        thread_count: usize,
        range: Range<usize>,
        body: LoopBody<'_>,
    ) {
        let len = range.end.saturating_sub(range.start);
        if len == 0 {
            return;
        }
        // More workers than iterations would only spawn idle closures.
        let workers = thread_count.max(1).min(len);

        match schedule {
            Schedule::Static => {
                let chunk = len.div_ceil(workers);
                self.pool.scope(|s| {
                    for w in 0..workers {
                        let start = range.start + w * chunk;
                        let end = range.end.min(start + chunk);
                        if start >= end {
                            break;
                        }
                        s.spawn(move |_| {
                            for i in start..end {
                                body(i);
                            }
                        });
                    }
                });
            }
            Schedule::Dynamic => self.run_chunked(range, workers, self.dynamic_chunk, body),
            Schedule::Guided => self.run_guided(range, workers, self.guided_min_chunk, body),
            Schedule::Auto => {
                let chunk = (len / (workers * 4)).max(1);
                self.run_chunked(range, workers, chunk, body);
            }
        }
    }

    fn run_sequential(&self, range: Range<usize>, body: LoopBody<'_>) {
        for i in range {
            body(i);
        }
    }
}

impl std::fmt::Debug for RayonExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RayonExecutor")
            .field("pool_threads", &self.pool.current_num_threads())
            .field("dynamic_chunk", &self.dynamic_chunk)
            .field("guided_min_chunk", &self.guided_min_chunk)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn executor() -> RayonExecutor {
        RayonExecutor::new("exec-test", 4, 1, 1).expect("pool should build")
    }

    fn visit_counts(
        exec: &RayonExecutor,
        schedule: Schedule,
        threads: usize,
        len: usize,
    ) -> Vec<usize> {
        let counts: Vec<AtomicUsize> = (0..len).map(|_| AtomicUsize::new(0)).collect();
        exec.run_parallel(schedule, threads, 0..len, &|i| {
            counts[i].fetch_add(1, Ordering::Relaxed);
        });
        counts.into_iter().map(|c| c.into_inner()).collect()
    }

    #[test]
    fn test_each_schedule_visits_every_index_once() {
        let exec = executor();
        for schedule in [
            Schedule::Static,
            Schedule::Dynamic,
            Schedule::Guided,
            Schedule::Auto,
        ] {
            for len in [1, 7, 100, 1000] {
                let counts = visit_counts(&exec, schedule, 3, len);
                assert!(
                    counts.iter().all(|&c| c == 1),
                    "{:?} len {}: {:?}",
                    schedule,
                    len,
                    &counts[..counts.len().min(16)]
                );
            }
        }
    }

    #[test]
    fn test_more_threads_than_iterations() {
        let exec = executor();
        let counts = visit_counts(&exec, Schedule::Static, 16, 3);
        assert_eq!(counts, vec![1, 1, 1]);
    }

    #[test]
    fn test_empty_range_is_noop() {
        let exec = executor();
        let counts = visit_counts(&exec, Schedule::Dynamic, 4, 0);
        assert!(counts.is_empty());
    }

    #[test]
    fn test_nonzero_range_start() {
        let exec = executor();
        let visited = (0..20).map(|_| AtomicUsize::new(0)).collect::<Vec<_>>();
        exec.run_parallel(Schedule::Guided, 2, 5..15, &|i| {
            visited[i].fetch_add(1, Ordering::Relaxed);
        });
        for (i, v) in visited.iter().enumerate() {
            let expected = usize::from((5..15).contains(&i));
            assert_eq!(v.load(Ordering::Relaxed), expected, "index {}", i);
        }
    }

    #[test]
    fn test_sequential_runs_on_calling_thread_in_order() {
        let exec = executor();
        let caller = std::thread::current().id();
        let seen = std::sync::Mutex::new(Vec::new());
        exec.run_sequential(0..8, &|i| {
            assert_eq!(std::thread::current().id(), caller);
            seen.lock().unwrap().push(i);
        });
        assert_eq!(*seen.lock().unwrap(), (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn test_body_panic_propagates() {
        let exec = executor();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            exec.run_parallel(Schedule::Dynamic, 2, 0..100, &|i| {
                if i == 42 {
                    panic!("boom");
                }
            });
        }));
        assert!(result.is_err());
    }
}

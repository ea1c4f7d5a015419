//! Concurrent stress helpers.
//!
//! The helpers are generic over [`HmilyRepository`], so they drive the file
//! engine and the in-memory backend alike.

use crate::fixtures::{participant, transaction};
use hmily_repository::{HmilyAction, HmilyRepository, Participant};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            duration,
            ops_per_second,
        }
    }

    /// Prints a summary of the run.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Total operations: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Failed: {}", self.failed_ops);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }
}

/// Configuration for stress runs.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of concurrent threads.
    pub threads: usize,
    /// Operations performed by each thread.
    pub operations_per_thread: usize,
    /// First record id used; thread `t` owns ids
    /// `first_id + t * operations_per_thread ..`.
    pub first_id: u64,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            threads: 2,
            operations_per_thread: 100,
            first_id: 1,
        }
    }
}

impl StressConfig {
    /// Ids written by thread `thread`.
    pub fn ids_of(&self, thread: usize) -> std::ops::Range<u64> {
        let per = self.operations_per_thread as u64;
        let start = self.first_id + thread as u64 * per;
        start..start + per
    }

    /// Every id written by the run.
    pub fn all_ids(&self) -> std::ops::Range<u64> {
        self.first_id..self.first_id + (self.threads * self.operations_per_thread) as u64
    }
}

/// Creates distinct transactions from `config.threads` threads at once.
pub fn stress_concurrent_creates<H: HmilyRepository>(
    repo: &H,
    config: &StressConfig,
) -> StressTestResult {
    let successful = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);
    let start = Instant::now();

    thread::scope(|s| {
        for t in 0..config.threads {
            let (successful, failed) = (&successful, &failed);
            s.spawn(move || {
                for id in config.ids_of(t) {
                    match repo.create_hmily_transaction(&mut transaction(id)) {
                        Ok(_) => successful.fetch_add(1, Ordering::Relaxed),
                        Err(_) => failed.fetch_add(1, Ordering::Relaxed),
                    };
                }
            });
        }
    });

    StressTestResult::new(
        successful.into_inner(),
        failed.into_inner(),
        start.elapsed(),
    )
}

/// Has every thread claim the same participant `config.operations_per_thread`
/// times, as competing recovery workers would.
///
/// The participant is created first with id `config.first_id`. A claim that
/// reports zero rows counts as failed.
pub fn stress_competing_claims<H: HmilyRepository>(
    repo: &H,
    config: &StressConfig,
) -> StressTestResult {
    let mut seed = participant(config.first_id, config.first_id);
    if repo.create_hmily_participant(&mut seed).is_err() {
        return StressTestResult::new(0, config.threads * config.operations_per_thread, Duration::ZERO);
    }

    let successful = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);
    let start = Instant::now();

    thread::scope(|s| {
        for _ in 0..config.threads {
            let (successful, failed, seed) = (&successful, &failed, &seed);
            s.spawn(move || {
                for _ in 0..config.operations_per_thread {
                    let mut claim: Participant = seed.clone();
                    if repo.lock_hmily_participant(&mut claim) {
                        successful.fetch_add(1, Ordering::Relaxed);
                    } else {
                        failed.fetch_add(1, Ordering::Relaxed);
                    }
                }
            });
        }
    });

    StressTestResult::new(
        successful.into_inner(),
        failed.into_inner(),
        start.elapsed(),
    )
}

/// Mixes creates, status updates, lookups and removes on each thread's own
/// id range. Returns the number of lookups that missed a record the same
/// thread had just written.
pub fn stress_read_your_writes<H: HmilyRepository>(repo: &H, config: &StressConfig) -> usize {
    let misses = AtomicUsize::new(0);

    thread::scope(|s| {
        for t in 0..config.threads {
            let misses = &misses;
            s.spawn(move || {
                for id in config.ids_of(t) {
                    let mut tx = transaction(id);
                    if repo.create_hmily_transaction(&mut tx).is_err() {
                        misses.fetch_add(1, Ordering::Relaxed);
                        continue;
                    }
                    let _ = repo.update_hmily_transaction_status(id, HmilyAction::Confirming.code());
                    match repo.find_by_trans_id(id) {
                        Some(found) if found.status == HmilyAction::Confirming.code() => {}
                        _ => {
                            misses.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                    if id % 2 == 0 {
                        let _ = repo.remove_hmily_transaction(id);
                    }
                }
            });
        }
    });

    misses.into_inner()
}

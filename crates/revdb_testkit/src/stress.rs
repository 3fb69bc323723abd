//! Stress tests for RevDB.
//!
//! These tests verify behavior under heavy load and concurrent access,
//! including several drivers sharing one store file.

use crate::fixtures::{test_context, TestStore};
use revdb_core::{CoreError, DocStore, Document, Driver, SharedDriver};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Barrier;
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Operations rejected by optimistic locking.
    pub conflicts: usize,
    /// Operations that failed for any other reason.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, conflicts: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + conflicts + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            conflicts,
            failed_ops: failed,
            duration,
            ops_per_second,
        }
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Total operations: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Conflicts: {}", self.conflicts);
        println!("Failed: {}", self.failed_ops);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of operations per thread.
    pub operations: usize,
    /// Number of concurrent threads.
    pub threads: usize,
    /// Size of document content in bytes.
    pub content_size: usize,
    /// Number of distinct documents.
    pub document_count: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 200,
            threads: 4,
            content_size: 256,
            document_count: 16,
        }
    }
}

impl StressConfig {
    /// Creates a configuration small enough for unit tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            operations: 25,
            threads: 4,
            content_size: 64,
            document_count: 4,
        }
    }
}

#[derive(Default)]
struct Tally {
    successful: AtomicUsize,
    conflicts: AtomicUsize,
    failed: AtomicUsize,
}

impl Tally {
    fn record<T>(&self, result: Result<T, CoreError>) {
        let counter = match result {
            Ok(_) => &self.successful,
            Err(e) if e.as_optimistic_lock().is_some() => &self.conflicts,
            Err(_) => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn finish(&self, started: Instant) -> StressTestResult {
        StressTestResult::new(
            self.successful.load(Ordering::Relaxed),
            self.conflicts.load(Ordering::Relaxed),
            self.failed.load(Ordering::Relaxed),
            started.elapsed(),
        )
    }
}

/// Runs sequential saves of new documents.
pub fn stress_sequential_saves<D: Driver>(store: &DocStore<D>, config: &StressConfig) -> StressTestResult {
    let tally = Tally::default();
    let ctx = test_context();
    let content = vec![0xABu8; config.content_size];

    let start = Instant::now();
    for i in 0..config.operations {
        let doc = Document::new(format!("seq-{i}"), content.clone());
        tally.record(store.save(&ctx, "stress", doc));
    }
    tally.finish(start)
}

/// Runs read-modify-write cycles from several threads, each thread using
/// its own driver over the same file.
///
/// Every cycle loads a document and saves it back with the revision it
/// saw; cycles that lose a race count as conflicts.
pub fn stress_concurrent_updates(test_store: &TestStore, config: &StressConfig) -> StressTestResult {
    let tally = Tally::default();
    let content = vec![0xCDu8; config.content_size];

    let start = Instant::now();
    thread::scope(|s| {
        for t in 0..config.threads {
            let store = DocStore::new(test_store.second_driver());
            let tally = &tally;
            let content = &content;
            s.spawn(move || {
                let ctx = test_context();
                for i in 0..config.operations {
                    let id = format!("doc-{}", (t + i) % config.document_count);
                    let current = match store.load(&ctx, "stress", id.as_str()) {
                        Ok(current) => current,
                        Err(e) => {
                            tally.record::<()>(Err(e));
                            continue;
                        }
                    };
                    let mut doc = current.unwrap_or_else(|| Document::new(id, Vec::new()));
                    doc.content = content.clone();
                    tally.record(store.save(&ctx, "stress", doc));
                }
            });
        }
    });
    tally.finish(start)
}

/// Races `contenders` saves of the same document revision and returns how
/// many of them succeeded.
pub fn race_saves(test_store: &TestStore, contenders: usize) -> usize {
    let ctx = test_context();
    let base = test_store
        .save(&ctx, "race", Document::new("contested", b"base".to_vec()))
        .expect("Failed to save base document");

    let barrier = Barrier::new(contenders);
    let winners = AtomicUsize::new(0);
    thread::scope(|s| {
        for n in 0..contenders {
            let driver: SharedDriver = test_store.second_driver();
            let base = base.clone();
            let barrier = &barrier;
            let winners = &winners;
            s.spawn(move || {
                let store = DocStore::new(driver);
                let mut doc = base;
                doc.content = format!("writer {n}").into_bytes();
                barrier.wait();
                match store.save(&test_context(), "race", doc) {
                    Ok(_) => {
                        winners.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(e) => assert!(e.as_optimistic_lock().is_some(), "unexpected error: {e}"),
                }
            });
        }
    });
    winners.into_inner()
}

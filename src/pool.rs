//! Bounded worker pool shared by the hashing stages.
//!
//! [`WorkerPool::run`] is the feeder / workers / drain shape every hashing
//! stage uses:
//!
//! - a feeder thread pushes each job onto a bounded job queue and drops its
//!   sender when the jobs run out, which closes the queue;
//! - `workers` threads pull jobs until the queue is closed and empty, each
//!   holding its own clone of the results sender;
//! - the calling thread drains the bounded results queue until it
//!   disconnects, which happens once, when the last worker exits.
//!
//! Full queues block the producer, so memory stays bounded by the two queue
//! capacities regardless of how many jobs are submitted. All threads are
//! scoped and joined before `run` returns.
//!
//! # Example
//!
//! ```
//! use filematch::pool::WorkerPool;
//!
//! let pool = WorkerPool::new(4, 16);
//! let output = pool.run((1..=10).collect::<Vec<u64>>(), |n| Some(n * n));
//!
//! assert_eq!(output.results.iter().sum::<u64>(), 385);
//! assert!(!output.interrupted);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::bounded;

/// Results drained from one pool run.
#[derive(Debug)]
pub struct PoolOutput<R> {
    /// Results in completion order
    pub results: Vec<R>,
    /// Whether the shutdown flag cut the run short
    pub interrupted: bool,
}

/// Fixed-size pool of worker threads fed through a bounded queue.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    workers: usize,
    queue_capacity: usize,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl WorkerPool {
    /// Create a pool.
    ///
    /// # Arguments
    ///
    /// * `workers` - Number of worker threads (at least 1)
    /// * `queue_capacity` - Capacity of the job and result queues (at least 1)
    #[must_use]
    pub fn new(workers: usize, queue_capacity: usize) -> Self {
        Self {
            workers: workers.max(1),
            queue_capacity: queue_capacity.max(1),
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// Once raised, no further jobs are queued and jobs already queued are
    /// discarded without being processed.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Number of worker threads.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Capacity of the job and result queues.
    #[must_use]
    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Run `process` over every job and collect the results.
    ///
    /// `process` returns `None` for jobs that produce no result (for example
    /// a file that could not be read); those jobs are simply absent from the
    /// output. Result order is unspecified.
    pub fn run<T, R, F>(&self, jobs: Vec<T>, process: F) -> PoolOutput<R>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> Option<R> + Sync,
    {
        if jobs.is_empty() {
            return PoolOutput {
                results: Vec::new(),
                interrupted: self.is_shutdown_requested(),
            };
        }

        let (job_tx, job_rx) = bounded::<T>(self.queue_capacity);
        let (result_tx, result_rx) = bounded::<R>(self.queue_capacity);
        let process = &process;

        let results = thread::scope(|scope| {
            scope.spawn(move || {
                for job in jobs {
                    if self.is_shutdown_requested() {
                        log::debug!("Pool feeder: shutdown requested, stop queueing jobs");
                        break;
                    }
                    if job_tx.send(job).is_err() {
                        break;
                    }
                }
                // job_tx dropped here: the queue closes once drained
            });

            for _ in 0..self.workers {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move || {
                    for job in job_rx.iter() {
                        if self.is_shutdown_requested() {
                            continue;
                        }
                        if let Some(result) = process(job) {
                            if result_tx.send(result).is_err() {
                                break;
                            }
                        }
                    }
                });
            }

            // Only worker-owned senders remain, so the drain below ends
            // exactly when the last worker exits.
            drop(job_rx);
            drop(result_tx);

            result_rx.iter().collect::<Vec<R>>()
        });

        PoolOutput {
            results,
            interrupted: self.is_shutdown_requested(),
        }
    }
}

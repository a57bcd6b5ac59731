//! Periodic statistics reporting.
//!
//! [`StatsReporter`] owns a background thread that takes a snapshot of the
//! shared [`StatsAggregator`] every interval and hands it to a sink. The
//! default sink logs a one-line summary at info level. Only snapshots are
//! read, so a report never sees a half-updated set of counters.
//!
//! The thread stops when the reporter is stopped or dropped; both wait for
//! it to exit.
//!
//! # Example
//!
//! ```no_run
//! use filematch::progress::StatsReporter;
//! use filematch::stats::StatsAggregator;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let stats = Arc::new(StatsAggregator::new());
//! let reporter = StatsReporter::start(Arc::clone(&stats), Duration::from_secs(60)).unwrap();
//! // ... run the scan ...
//! reporter.stop();
//! ```

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};

use crate::output::progress_line;
use crate::stats::{Stats, StatsAggregator};

/// Background thread reporting statistics on an interval.
#[derive(Debug)]
pub struct StatsReporter {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl StatsReporter {
    /// Start logging a progress line every `interval`.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn start(stats: Arc<StatsAggregator>, interval: Duration) -> io::Result<Self> {
        Self::with_sink(stats, interval, |snapshot| {
            log::info!("{}", progress_line(snapshot));
        })
    }

    /// Start reporting every `interval` into a custom sink.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn with_sink<F>(stats: Arc<StatsAggregator>, interval: Duration, sink: F) -> io::Result<Self>
    where
        F: Fn(&Stats) + Send + 'static,
    {
        let (stop_tx, stop_rx) = bounded::<()>(1);

        let handle = thread::Builder::new()
            .name("stats-reporter".to_string())
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => sink(&stats.snapshot()),
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;

        log::debug!("Stats reporter started, interval {:?}", interval);
        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// Stop the thread and wait for it to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.try_send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("Stats reporter thread panicked");
            }
        }
    }
}

impl Drop for StatsReporter {
    fn drop(&mut self) {
        self.shutdown();
    }
}

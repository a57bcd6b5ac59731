//! Ctrl+C handling for cooperative cancellation.
//!
//! A single `AtomicBool` is shared by the walker coordinator, the listing
//! workers, the hash pool feeder and the hash workers. Raising it makes each
//! of them stop taking new work; the run then returns what it has, marked as
//! interrupted, and the process exits with code 130.
//!
//! # Usage
//!
//! ```rust,no_run
//! use filematch::duplicates::FinderConfig;
//! use filematch::signal::install_handler;
//!
//! let handler = install_handler().expect("Failed to install signal handler");
//! let config = FinderConfig::default().with_shutdown_flag(handler.flag());
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// A lowered flag not tied to any signal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the flag has been raised.
    #[must_use]
    pub fn is_raised(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Raise the flag by hand, as Ctrl+C would.
    pub fn raise(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// The flag to hand to [`crate::duplicates::FinderConfig::with_shutdown_flag`].
    #[must_use]
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Lower the flag again.
    pub fn clear(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    #[error("Could not hook Ctrl+C: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_HANDLER: Mutex<Option<ShutdownHandler>> = Mutex::new(None);

/// Install the process-wide Ctrl+C handler and return its flag.
///
/// The OS hook is registered once per process, under a lock, so every
/// caller shares the flag the hook raises. Later calls (several runs in one
/// test binary, for instance) get the same handler back with the flag
/// lowered. If some other code already owns the Ctrl+C hook, a handler that
/// can only be raised by hand is returned instead.
///
/// # Errors
///
/// Returns [`SignalError`] if the OS refuses the handler for any reason
/// other than one already being registered.
pub fn install_handler() -> Result<ShutdownHandler, SignalError> {
    let mut slot = GLOBAL_HANDLER
        .lock()
        .unwrap_or_else(PoisonError::into_inner);

    if let Some(handler) = slot.as_ref() {
        handler.clear();
        return Ok(handler.clone());
    }

    let handler = ShutdownHandler::new();
    let hooked = handler.clone();
    let installed = ctrlc::set_handler(move || {
        hooked.raise();
        let _ = writeln!(std::io::stderr(), "\nInterrupted. Finishing in-flight work...");
        log::info!("Shutdown signal received");
    });

    match installed {
        Ok(()) => {}
        Err(ctrlc::Error::MultipleHandlers) => {
            log::debug!("Ctrl+C handler already registered, using unhooked handler");
        }
        Err(e) => return Err(e.into()),
    }

    *slot = Some(handler.clone());
    Ok(handler)
}

//! Background autosave for long-running sessions.
//!
//! A single worker thread owns all saving. It wakes on a save request or when
//! the interval elapses, snapshots the shared state under the lock, releases
//! the lock and writes the snapshot, so only one save is ever in flight.
//!
//! Interval saves only run once the stored document is known to match the
//! session: it was loaded from there, or a save has gone through. Until then
//! an idle session writes nothing, and an unreadable data file stays as it is.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::db::{AppState, PersistenceGateway};
use crate::error::GoalError;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

enum Signal {
    Save,
    Shutdown,
}

pub struct Autosaver {
    tx: Sender<Signal>,
    handle: Option<JoinHandle<()>>,
    last_error: Arc<Mutex<Option<GoalError>>>,
}

impl Autosaver {
    /// Start the worker. `in_sync` says whether `state` was loaded from
    /// `gateway`; when it was not, saving waits for the first request.
    pub fn spawn(
        state: Arc<Mutex<AppState>>,
        gateway: Arc<dyn PersistenceGateway>,
        interval: Duration,
        in_sync: bool,
    ) -> Self {
        let (tx, rx) = mpsc::channel();
        let last_error = Arc::new(Mutex::new(None));
        let errors = Arc::clone(&last_error);

        let handle = thread::spawn(move || {
            let mut synced = in_sync;
            let mut pending = false;
            loop {
                let (mut shutdown, mut due) = match rx.recv_timeout(interval) {
                    Ok(Signal::Save) => (false, true),
                    Err(RecvTimeoutError::Timeout) => (false, synced),
                    Ok(Signal::Shutdown) | Err(RecvTimeoutError::Disconnected) => (true, synced),
                };
                // Coalesce a burst of requests into one save.
                while let Ok(signal) = rx.try_recv() {
                    match signal {
                        Signal::Save => due = true,
                        Signal::Shutdown => shutdown = true,
                    }
                }

                if due || pending {
                    let saved = save_snapshot(&state, gateway.as_ref(), &errors);
                    pending = !saved;
                    synced |= saved;
                }
                if shutdown {
                    debug!(unsaved = pending, "autosaver stopped");
                    break;
                }
            }
        });

        Autosaver {
            tx,
            handle: Some(handle),
            last_error,
        }
    }

    /// Ask for a save without waiting for it.
    pub fn request_save(&self) {
        if self.tx.send(Signal::Save).is_err() {
            warn!("autosaver is not running; save request dropped");
        }
    }

    /// Most recent save failure, cleared by the next successful save.
    pub fn last_error(&self) -> Option<GoalError> {
        self.last_error.lock().ok().and_then(|e| e.clone())
    }

    /// Perform a final save and stop the worker.
    pub fn shutdown(mut self) -> Option<GoalError> {
        self.stop();
        self.last_error()
    }

    fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = self.tx.send(Signal::Shutdown);
            if handle.join().is_err() {
                error!("autosave worker panicked");
            }
        }
    }
}

impl Drop for Autosaver {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Write one snapshot, recording the outcome. Returns whether it was saved.
fn save_snapshot(
    state: &Mutex<AppState>,
    gateway: &dyn PersistenceGateway,
    errors: &Mutex<Option<GoalError>>,
) -> bool {
    let snapshot = match state.lock() {
        Ok(guard) => guard.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    };
    let result = gateway.save(&snapshot);
    if let Err(e) = &result {
        error!("autosave failed: {e}");
    }
    let saved = result.is_ok();
    if let Ok(mut slot) = errors.lock() {
        *slot = result.err();
    }
    saved
}

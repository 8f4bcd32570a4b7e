use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Quiet period used for search input
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(300);

/// Settles a rapidly changing text value after a quiet period
///
/// Each call to [`DebouncedQuery::set`] cancels the pending countdown and
/// schedules a new one. When a countdown runs out the settled value becomes the
/// latest input and subscribers are woken once. Intermediate values are never
/// published.
///
/// The countdown runs as a tokio task, so `set` must be called from within a
/// runtime. Disposing (or dropping) the query aborts any pending countdown.
#[derive(Debug)]
pub struct DebouncedQuery {
    quiet_period: Duration,
    settled_tx: Arc<watch::Sender<String>>,
    pending: Mutex<Option<JoinHandle<()>>>,
    disposed: AtomicBool,
}

impl DebouncedQuery {
    pub fn new(quiet_period: Duration) -> Self {
        Self::with_initial(String::new(), quiet_period)
    }

    /// Starts with `initial` as the settled value
    pub fn with_initial(initial: impl Into<String>, quiet_period: Duration) -> Self {
        let (settled_tx, _) = watch::channel(initial.into());
        Self {
            quiet_period,
            settled_tx: Arc::new(settled_tx),
            pending: Mutex::new(None),
            disposed: AtomicBool::new(false),
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet_period
    }

    /// Records a new input value and restarts the countdown
    pub fn set(&self, value: impl Into<String>) {
        if self.disposed.load(Ordering::Acquire) {
            tracing::debug!("Ignoring input for disposed debounced query");
            return;
        }

        let value = value.into();
        let settled_tx = Arc::clone(&self.settled_tx);
        let quiet_period = self.quiet_period;

        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = pending.take() {
            previous.abort();
        }

        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet_period).await;
            // Re-settling on an unchanged value does not wake subscribers
            settled_tx.send_if_modified(|current| {
                if *current == value {
                    false
                } else {
                    *current = value;
                    true
                }
            });
        }));
    }

    /// Current settled value
    pub fn settled(&self) -> String {
        self.settled_tx.borrow().clone()
    }

    /// Receiver woken on every settled transition
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.settled_tx.subscribe()
    }

    /// True while a countdown is running
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Cancels any pending countdown; later input is ignored
    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::Release);
        if let Some(handle) = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
            tracing::debug!("Pending debounced update cancelled");
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}

impl Default for DebouncedQuery {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD)
    }
}

impl Drop for DebouncedQuery {
    fn drop(&mut self) {
        self.dispose();
    }
}

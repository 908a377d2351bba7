use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Countdown for one active attempt.
///
/// A background task wakes once per second and only ever performs additive
/// updates: it bumps the shared elapsed counter and, once the ceiling is
/// reached, sets a one-shot expiry flag. The owner reads both through
/// `elapsed_seconds`/`is_expired` and must call `stop` (which awaits the
/// task) before mutating attempt state, so a stale tick can never race a
/// transition.
pub struct QuizTimer {
    elapsed: Arc<AtomicU64>,
    expired: Arc<AtomicBool>,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl QuizTimer {
    /// Spawn the ticking task with the given ceiling in seconds.
    #[must_use]
    pub fn start(allowed_seconds: u64) -> Self {
        let elapsed = Arc::new(AtomicU64::new(0));
        let expired = Arc::new(AtomicBool::new(false));
        let (shutdown, mut rx) = oneshot::channel::<()>();

        let task_elapsed = Arc::clone(&elapsed);
        let task_expired = Arc::clone(&expired);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            // The first tick completes immediately; skip it so one tick equals
            // one elapsed second.
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = &mut rx => break,
                    _ = interval.tick() => {
                        let seconds = task_elapsed.fetch_add(1, Ordering::Relaxed) + 1;
                        if seconds >= allowed_seconds {
                            task_expired.store(true, Ordering::Relaxed);
                            break;
                        }
                    }
                }
            }
        });

        Self {
            elapsed,
            expired,
            shutdown,
            handle,
        }
    }

    /// Whole seconds elapsed since the timer started.
    #[must_use]
    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed.load(Ordering::Relaxed)
    }

    /// True once the allowed ceiling has been reached.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expired.load(Ordering::Relaxed)
    }

    /// Cancel the ticking task and wait for it to finish.
    ///
    /// After this returns no further update to the shared counters can
    /// happen.
    pub async fn stop(self) {
        // The task may already have exited on expiry; a failed send is fine.
        let _ = self.shutdown.send(());
        let _ = self.handle.await;
    }
}

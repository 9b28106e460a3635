//! One-shot delayed callback with cancel-on-rearm.
//!
//! At most one timer is live per [`FollowUpScheduler`]: arming a new one
//! always aborts the previous one first.

use std::time::Duration;
use tokio::task::JoinHandle;

/// Opaque identifier of an armed timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Debug)]
struct ArmedTimer {
    id: TimerId,
    handle: JoinHandle<()>,
}

/// Schedules a single delayed callback on the tokio runtime.
#[derive(Debug, Default)]
pub struct FollowUpScheduler {
    armed: Option<ArmedTimer>,
    next_id: u64,
}

impl FollowUpScheduler {
    /// Create a scheduler with nothing armed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel any armed timer, then run `callback` once after `delay`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn arm<F>(&mut self, delay: Duration, callback: F) -> TimerId
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();

        self.next_id += 1;
        let id = TimerId(self.next_id);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            callback();
        });
        tracing::debug!(timer = id.0, ?delay, "follow-up armed");

        self.armed = Some(ArmedTimer { id, handle });
        id
    }

    /// Cancel the armed timer. Returns whether one was still pending.
    pub fn cancel(&mut self) -> bool {
        match self.armed.take() {
            Some(timer) => {
                let pending = !timer.handle.is_finished();
                timer.handle.abort();
                if pending {
                    tracing::debug!(timer = timer.id.0, "follow-up cancelled");
                }
                pending
            }
            None => false,
        }
    }

    /// Whether a timer is armed and has not fired yet.
    pub fn is_armed(&self) -> bool {
        self.armed
            .as_ref()
            .is_some_and(|timer| !timer.handle.is_finished())
    }
}

impl Drop for FollowUpScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counter() -> (Arc<AtomicUsize>, impl Fn() -> Box<dyn FnOnce() + Send>) {
        let count = Arc::new(AtomicUsize::new(0));
        let shared = Arc::clone(&count);
        let make = move || {
            let c = Arc::clone(&shared);
            Box::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
            }) as Box<dyn FnOnce() + Send>
        };
        (count, make)
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_once_after_delay() {
        let (count, make) = counter();
        let mut scheduler = FollowUpScheduler::new();
        scheduler.arm(Duration::from_secs(180), make());
        assert!(scheduler.is_armed());

        tokio::time::sleep(Duration::from_secs(179)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!scheduler.is_armed());

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_cancels_previous() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let mut scheduler = FollowUpScheduler::new();

        let f = Arc::clone(&first);
        let first_id = scheduler.arm(Duration::from_secs(10), move || {
            f.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_secs(5)).await;

        let s = Arc::clone(&second);
        let second_id = scheduler.arm(Duration::from_secs(10), move || {
            s.fetch_add(1, Ordering::SeqCst);
        });
        assert_ne!(first_id, second_id);
        assert!(scheduler.is_armed());

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_callback() {
        let (count, make) = counter();
        let mut scheduler = FollowUpScheduler::new();
        scheduler.arm(Duration::from_secs(1), make());

        assert!(scheduler.cancel());
        assert!(!scheduler.cancel());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels() {
        let (count, make) = counter();
        {
            let mut scheduler = FollowUpScheduler::new();
            scheduler.arm(Duration::from_secs(1), make());
        }
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}

//! Reconnect scheduling with stepped linear back-off.
//!
//! The delay starts at `initial_delay_ms`, grows by `small_step_ms` while
//! below `step_threshold_ms`, then by `large_step_ms` until it reaches
//! `ceiling_ms`, after which it stays put.  A successful connect resets it.

use std::future::Future;
use std::time::Duration;

use sl_domain::config::ReconnectConfig;
use tokio::task::JoinHandle;

/// Identifies one armed timer so a late firing can be told apart from the
/// current one.
pub type TimerId = u64;

struct PendingTimer {
    id: TimerId,
    handle: JoinHandle<()>,
}

/// Owns the back-off state and at most one pending reconnect timer.
pub struct ReconnectScheduler {
    policy: ReconnectConfig,
    current_delay_ms: u64,
    pending: Option<PendingTimer>,
    next_timer_id: TimerId,
}

impl ReconnectScheduler {
    pub fn new(policy: ReconnectConfig) -> Self {
        Self {
            policy,
            current_delay_ms: 0,
            pending: None,
            next_timer_id: 0,
        }
    }

    pub fn policy(&self) -> &ReconnectConfig {
        &self.policy
    }

    /// Delay the *next* timer would use, or zero after a reset.
    pub fn current_delay(&self) -> Duration {
        Duration::from_millis(self.current_delay_ms)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Consume one back-off step: returns the delay to wait now and
    /// advances the stored delay for the following attempt.
    pub fn next_delay(&mut self) -> Duration {
        let p = &self.policy;
        let delay = if self.current_delay_ms == 0 {
            p.initial_delay_ms
        } else {
            self.current_delay_ms
        };

        self.current_delay_ms = if delay < p.step_threshold_ms {
            delay + p.small_step_ms
        } else if delay < p.ceiling_ms {
            delay + p.large_step_ms
        } else {
            delay
        };

        Duration::from_millis(delay)
    }

    /// Arm a timer after a disconnect.
    ///
    /// `fire` builds the future run when the timer elapses; it receives the
    /// timer id and must call [`take_fired`](Self::take_fired) before doing
    /// anything.  Returns `None` (and arms nothing) when a timer is already
    /// pending.  Must be called from within a Tokio runtime.
    pub fn on_disconnect<F, Fut>(&mut self, fire: F) -> Option<Duration>
    where
        F: FnOnce(TimerId) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if self.pending.is_some() {
            return None;
        }

        let delay = self.next_delay();
        self.next_timer_id += 1;
        let id = self.next_timer_id;
        let task = fire(id);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });

        self.pending = Some(PendingTimer { id, handle });
        Some(delay)
    }

    /// Mark timer `id` as fired.  Returns `false` when it was cancelled or
    /// superseded, in which case the caller must not reconnect.
    pub fn take_fired(&mut self, id: TimerId) -> bool {
        match &self.pending {
            Some(p) if p.id == id => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    pub fn on_connect_success(&mut self) {
        self.current_delay_ms = 0;
    }

    /// Cancel the pending timer, if any.
    pub fn cancel(&mut self) {
        if let Some(p) = self.pending.take() {
            p.handle.abort();
        }
    }
}

impl Drop for ReconnectScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn delays(s: &mut ReconnectScheduler, n: usize) -> Vec<u64> {
        (0..n).map(|_| s.next_delay().as_millis() as u64).collect()
    }

    #[test]
    fn default_policy_values() {
        let s = ReconnectScheduler::new(ReconnectConfig::default());
        assert_eq!(s.policy().initial_delay_ms, 5_000);
        assert_eq!(s.current_delay(), Duration::ZERO);
        assert!(!s.is_pending());
    }

    #[test]
    fn steps_small_then_large() {
        let mut s = ReconnectScheduler::new(ReconnectConfig::default());
        assert_eq!(
            delays(&mut s, 9),
            vec![5_000, 15_000, 25_000, 35_000, 45_000, 55_000, 65_000, 125_000, 185_000]
        );
    }

    #[test]
    fn delay_is_non_decreasing_and_bounded() {
        let mut s = ReconnectScheduler::new(ReconnectConfig::default());
        let seq = delays(&mut s, 40);
        assert!(seq.windows(2).all(|w| w[1] >= w[0]));
        let max = *seq.iter().max().unwrap_or(&0);
        assert!(max <= 600_000 + 60_000);
        // Once at the ceiling it stays there.
        assert_eq!(seq[38], seq[39]);
    }

    #[test]
    fn connect_success_resets() {
        let mut s = ReconnectScheduler::new(ReconnectConfig::default());
        delays(&mut s, 3);
        s.on_connect_success();
        assert_eq!(s.next_delay(), Duration::from_millis(5_000));
    }

    #[tokio::test(start_paused = true)]
    async fn only_one_timer_pending() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut s = ReconnectScheduler::new(ReconnectConfig::default());

        let f = fired.clone();
        let first = s.on_disconnect(move |_| async move {
            f.fetch_add(1, Ordering::SeqCst);
        });
        let f = fired.clone();
        let second = s.on_disconnect(move |_| async move {
            f.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(first, Some(Duration::from_millis(5_000)));
        assert_eq!(second, None);

        tokio::time::sleep(Duration::from_millis(5_001)).await;
        tokio::task::yield_now().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_firing() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut s = ReconnectScheduler::new(ReconnectConfig::default());

        let f = fired.clone();
        s.on_disconnect(move |_| async move {
            f.fetch_add(1, Ordering::SeqCst);
        });
        s.cancel();
        assert!(!s.is_pending());

        tokio::time::sleep(Duration::from_secs(60)).await;
        tokio::task::yield_now().await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_timer_id_is_rejected() {
        let mut s = ReconnectScheduler::new(ReconnectConfig::default());
        s.on_disconnect(|_| async {});
        assert!(!s.take_fired(99));
        assert!(s.is_pending());
        assert!(s.take_fired(1));
        assert!(!s.is_pending());
        assert!(!s.take_fired(1));
    }
}

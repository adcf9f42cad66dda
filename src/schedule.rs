//! Scheduled wakeups for widget ticks and delays
//!
//! Widget state is only ever touched on the UI thread. A scheduled task does
//! nothing but send a [`Wakeup`] carrying the [`Token`] of the handle that
//! created it; the app drains those and offers each token to the widgets.
//! Dropping a [`Pending`] handle aborts its task, and a wakeup that was
//! already queued is ignored because no widget owns its token any more.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::AbortHandle;
use tokio::time::{self, MissedTickBehavior};

/// Identifies one scheduled callback. Never reused within a scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token(u64);

/// Message sent to the UI thread when a scheduled callback fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wakeup {
    pub token: Token,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// Fire once per period, first fire one period from now
    Every(Duration),
    /// Fire a single time after the delay
    Once(Duration),
}

/// Owned handle to a scheduled callback. Dropping it cancels the callback.
#[derive(Debug)]
pub struct Pending {
    token: Token,
    task: Option<AbortHandle>,
}

impl Pending {
    pub fn owns(&self, token: Token) -> bool {
        self.token == token
    }
}

impl Drop for Pending {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

pub trait Scheduler {
    fn schedule(&self, cadence: Cadence) -> Pending;
}

/// Runs callbacks as tokio tasks that report back over an mpsc channel
pub struct TokioScheduler {
    runtime: Handle,
    tx: UnboundedSender<Wakeup>,
    next_token: AtomicU64,
}

impl TokioScheduler {
    pub fn new(runtime: Handle, tx: UnboundedSender<Wakeup>) -> Self {
        Self {
            runtime,
            tx,
            next_token: AtomicU64::new(1),
        }
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, cadence: Cadence) -> Pending {
        let token = Token(self.next_token.fetch_add(1, Ordering::Relaxed));
        let tx = self.tx.clone();

        let task = match cadence {
            Cadence::Every(period) => self.runtime.spawn(async move {
                let mut interval = time::interval_at(time::Instant::now() + period, period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    interval.tick().await;
                    if tx.send(Wakeup { token }).is_err() {
                        // Receiver gone, app is shutting down
                        break;
                    }
                }
            }),
            Cadence::Once(delay) => self.runtime.spawn(async move {
                time::sleep(delay).await;
                let _ = tx.send(Wakeup { token });
            }),
        };

        tracing::trace!(?token, ?cadence, "scheduled");

        Pending {
            token,
            task: Some(task.abort_handle()),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn test_every_repeats_until_dropped() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let scheduler = TokioScheduler::new(Handle::current(), tx);

        let start = time::Instant::now();
        let pending = scheduler.schedule(Cadence::Every(Duration::from_secs(1)));
        for _ in 0..3 {
            let wakeup = rx.recv().await.unwrap();
            assert!(pending.owns(wakeup.token));
        }
        assert!(start.elapsed() >= Duration::from_secs(3));

        drop(pending);
        time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_once_fires_a_single_time() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let scheduler = TokioScheduler::new(Handle::current(), tx);

        let pending = scheduler.schedule(Cadence::Once(Duration::from_secs(1)));
        assert!(pending.owns(rx.recv().await.unwrap().token));

        time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_once_never_fires() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let scheduler = TokioScheduler::new(Handle::current(), tx);

        let pending = scheduler.schedule(Cadence::Once(Duration::from_secs(1)));
        drop(pending);
        time::sleep(Duration::from_secs(3)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_tokens_are_unique() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let scheduler = TokioScheduler::new(Handle::current(), tx);

        let a = scheduler.schedule(Cadence::Once(Duration::from_secs(60)));
        let b = scheduler.schedule(Cadence::Once(Duration::from_secs(60)));
        assert_ne!(a.token, b.token);
        assert!(!a.owns(b.token));
    }
}

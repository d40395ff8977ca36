use std::time::Duration;

use tokio::sync::mpsc::WeakUnboundedSender;
use tokio::task::AbortHandle;
use tokio::time::Instant;

use crate::game_loop::LobbyCommand;

/// Identifies one scheduled timer. A phase remembers the id of the timer it
/// owns; a firing whose id no longer matches is stale and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

/// Posted back to the lobby when a timer elapses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerFired {
    pub room: String,
    pub id: TimerId,
}

/// Owned handle to a pending timer. Dropping it cancels the timer.
#[derive(Debug)]
pub struct TimerHandle {
    id: TimerId,
    task: AbortHandle,
}

impl TimerHandle {
    pub fn id(&self) -> TimerId {
        self.id
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawns sleeps that report back to the lobby command channel.
///
/// Holds a weak sender so pending timers never keep the lobby alive.
pub struct Scheduler {
    tx: WeakUnboundedSender<LobbyCommand>,
    next_id: u64,
}

impl Scheduler {
    pub fn new(tx: WeakUnboundedSender<LobbyCommand>) -> Self {
        Self { tx, next_id: 1 }
    }

    /// Schedule a timer for `room` that fires once after `after`.
    pub fn schedule(&mut self, room: &str, after: Duration) -> TimerHandle {
        let id = TimerId(self.next_id);
        self.next_id += 1;

        // Deadline is fixed now, not when the task first gets polled.
        let deadline = Instant::now() + after;
        let tx = self.tx.clone();
        let fired = TimerFired {
            room: room.to_string(),
            id,
        };
        let task = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if let Some(tx) = tx.upgrade()
                && tx.send(LobbyCommand::Timer(fired)).is_err()
            {
                tracing::debug!("Lobby gone, dropping timer");
            }
        });

        TimerHandle {
            id,
            task: task.abort_handle(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn timer_fires_after_delay() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler = Scheduler::new(tx.downgrade());
        let start = Instant::now();
        let handle = scheduler.schedule("ABCD", Duration::from_secs(5));

        match rx.recv().await {
            Some(LobbyCommand::Timer(fired)) => {
                assert_eq!(fired.room, "ABCD");
                assert_eq!(fired.id, handle.id());
            },
            _ => panic!("expected timer command"),
        }
        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_handle_cancels_timer() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler = Scheduler::new(tx.downgrade());
        let cancelled = scheduler.schedule("ABCD", Duration::from_secs(1));
        let kept = scheduler.schedule("ABCD", Duration::from_secs(2));
        assert_ne!(cancelled.id(), kept.id());
        drop(cancelled);

        match rx.recv().await {
            Some(LobbyCommand::Timer(fired)) => assert_eq!(fired.id, kept.id()),
            _ => panic!("expected timer command"),
        }
    }
}

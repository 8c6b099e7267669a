use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use ledgerflow_core::Id;
use tokio::sync::broadcast;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::warn;

use crate::event::{CloseReason, Event};

const TOPIC_CAPACITY: usize = 64;
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(30);

/// What a subscriber's `recv` call surfaces on a given wakeup. `Lagged`
/// stands in for a dropped-events marker set on the subscriber's next
/// delivery: broadcast channels detect this for us per-receiver, we just
/// surface it instead of silently continuing.
#[derive(Debug)]
pub enum Received {
    Event(Event),
    Lagged { skipped: u64 },
    KeepAlive,
}

/// A process-wide registry of topics keyed by job id. Each topic is a
/// `tokio::sync::broadcast` channel: sends never block the publisher, and a
/// slow subscriber loses its oldest unread events rather than stalling
/// everyone else — drop-oldest-on-lag.
#[derive(Default)]
pub struct ProgressBus {
    topics: Mutex<HashMap<Id, broadcast::Sender<Event>>>,
}

impl ProgressBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn sender_for(&self, job_id: Id) -> broadcast::Sender<Event> {
        let mut topics = self.topics.lock().expect("progress bus mutex poisoned");
        topics
            .entry(job_id)
            .or_insert_with(|| broadcast::channel(TOPIC_CAPACITY).0)
            .clone()
    }

    /// Non-blocking; silently drops the event if nobody is currently
    /// subscribed (there is nothing to deliver it to).
    pub fn publish(&self, job_id: Id, event: Event) {
        let sender = self.sender_for(job_id);
        if sender.send(event).is_err() {
            // No active subscribers. Not an error: a step may publish
            // progress before any client has opened the stream.
        }
    }

    /// Returns a receive-only subscription seeded with `connected` so a
    /// late subscriber is never silent, plus a teardown handle. The caller
    /// supplies the connected event because only it knows the job's
    /// current persisted state (the bus itself is state-free).
    pub fn subscribe(&self, job_id: Id, connected: Event) -> Subscription {
        let receiver = self.sender_for(job_id).subscribe();
        // `interval()` fires its first tick immediately; start the clock
        // one full period out so a fresh subscriber doesn't see a spurious
        // keep-alive before any real event has had a chance to arrive.
        let mut keep_alive = interval_at(Instant::now() + KEEP_ALIVE_INTERVAL, KEEP_ALIVE_INTERVAL);
        keep_alive.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Subscription {
            job_id,
            pending_first: Some(connected),
            receiver,
            keep_alive,
        }
    }

    /// Publishes a terminal `stream_end` and tears the topic down.
    /// Idempotent: closing an already-closed (or never-opened) topic is a
    /// no-op rather than an error.
    pub fn close(&self, job_id: Id, reason: CloseReason) {
        let sender = {
            let mut topics = self.topics.lock().expect("progress bus mutex poisoned");
            topics.remove(&job_id)
        };

        let Some(sender) = sender else { return };
        let _ = sender.send(Event::StreamEnd { reason });
        // Dropping `sender` here (it was the map's only owned clone) closes
        // the channel for every receiver once they drain what's queued.
    }

    /// Closes every currently open topic with the same reason — the
    /// graceful-shutdown path, which has no single job id to target.
    pub fn close_all(&self, reason: CloseReason) {
        let job_ids: Vec<Id> = {
            let topics = self.topics.lock().expect("progress bus mutex poisoned");
            topics.keys().copied().collect()
        };
        for job_id in job_ids {
            self.close(job_id, reason);
        }
    }
}

pub struct Subscription {
    job_id: Id,
    pending_first: Option<Event>,
    receiver: broadcast::Receiver<Event>,
    keep_alive: Interval,
}

impl Subscription {
    pub fn job_id(&self) -> Id {
        self.job_id
    }

    /// Waits for the next thing to deliver: the synthetic `connected` event
    /// (once), a real event, a lag notice, a keep-alive tick, or `None`
    /// once the topic has been closed and fully drained.
    pub async fn recv(&mut self) -> Option<Received> {
        if let Some(event) = self.pending_first.take() {
            return Some(Received::Event(event));
        }

        loop {
            tokio::select! {
                biased;
                received = self.receiver.recv() => {
                    self.keep_alive.reset();
                    return match received {
                        Ok(event) => Some(Received::Event(event)),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(job_id = %self.job_id, skipped, "progress subscriber lagged");
                            Some(Received::Lagged { skipped })
                        }
                        Err(broadcast::error::RecvError::Closed) => None,
                    };
                }
                _ = self.keep_alive.tick() => {
                    return Some(Received::KeepAlive);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(step: &str) -> Event {
        Event::Status {
            step: step.to_string(),
            step_index: 1,
            total_steps: 8,
            message: step.to_string(),
        }
    }

    #[tokio::test]
    async fn new_subscriber_sees_connected_first() {
        let bus = ProgressBus::new();
        let job_id = Id::new();
        let mut sub = bus.subscribe(
            job_id,
            Event::Connected {
                job_id: job_id.to_string(),
                already_finished: false,
                message: "subscribed".to_string(),
            },
        );

        match sub.recv().await {
            Some(Received::Event(Event::Connected { .. })) => {}
            other => panic!("expected connected event first, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn publish_before_subscribe_is_not_delivered() {
        let bus = ProgressBus::new();
        let job_id = Id::new();
        bus.publish(job_id, status("scrape_page"));

        let mut sub = bus.subscribe(
            job_id,
            Event::Connected {
                job_id: job_id.to_string(),
                already_finished: false,
                message: "subscribed".to_string(),
            },
        );

        // Only the synthetic connected event should be waiting; the publish
        // above had no subscriber yet and was dropped.
        assert!(matches!(
            sub.recv().await,
            Some(Received::Event(Event::Connected { .. }))
        ));
    }

    #[tokio::test]
    async fn close_delivers_stream_end_then_ends_the_stream() {
        let bus = ProgressBus::new();
        let job_id = Id::new();
        let mut sub = bus.subscribe(
            job_id,
            Event::Connected {
                job_id: job_id.to_string(),
                already_finished: false,
                message: "subscribed".to_string(),
            },
        );
        let _ = sub.recv().await; // drain connected

        bus.close(job_id, CloseReason::Completed);

        match sub.recv().await {
            Some(Received::Event(Event::StreamEnd { reason: CloseReason::Completed })) => {}
            other => panic!("expected stream_end, got {other:?}"),
        }
        assert!(sub.recv().await.is_none());
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let bus = ProgressBus::new();
        let job_id = Id::new();
        bus.close(job_id, CloseReason::Shutdown);
        bus.close(job_id, CloseReason::Shutdown);
    }

    #[tokio::test]
    async fn slow_subscriber_observes_lag_instead_of_blocking_publisher() {
        let bus = ProgressBus::new();
        let job_id = Id::new();
        let mut sub = bus.subscribe(
            job_id,
            Event::Connected {
                job_id: job_id.to_string(),
                already_finished: false,
                message: "subscribed".to_string(),
            },
        );
        let _ = sub.recv().await; // drain connected

        for i in 0..(TOPIC_CAPACITY + 10) {
            bus.publish(job_id, status(&format!("step-{i}")));
        }

        match sub.recv().await {
            Some(Received::Lagged { skipped }) => assert!(skipped > 0),
            other => panic!("expected a lag notice, got {other:?}"),
        }
    }
}

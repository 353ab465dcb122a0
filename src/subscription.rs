//! In-process change feed: one broadcast channel per pairing code.
//!
//! Subscriptions are scoped to a listener's active lifetime; cancellation
//! is synchronous and idempotent. Delivery order follows publish order, but
//! a slow consumer that lags simply skips ahead, it never replays.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::broadcast;

use crate::model::ChangeEvent;

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Default)]
pub struct NoteBus {
    channels: Mutex<HashMap<String, broadcast::Sender<ChangeEvent>>>,
}

impl NoteBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, code: &str) -> Subscription {
        let mut channels = self.channels.lock().expect("bus lock");
        let tx = channels
            .entry(code.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        Subscription {
            rx: Some(tx.subscribe()),
        }
    }

    /// Deliver an event to current subscribers. Nobody listening is fine.
    pub fn publish(&self, event: ChangeEvent) {
        let channels = self.channels.lock().expect("bus lock");
        if let Some(tx) = channels.get(&event.code) {
            let _ = tx.send(event);
        }
    }
}

pub struct Subscription {
    rx: Option<broadcast::Receiver<ChangeEvent>>,
}

impl Subscription {
    /// Next event, or `None` once cancelled.
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        let rx = self.rx.as_mut()?;
        loop {
            match rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    pub fn cancel(&mut self) {
        self.rx = None;
    }

    pub fn is_cancelled(&self) -> bool {
        self.rx.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SharedNote;

    fn event(code: &str) -> ChangeEvent {
        ChangeEvent {
            code: code.to_string(),
            note: SharedNote::empty(code),
        }
    }

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let bus = NoteBus::new();
        let mut sub = bus.subscribe("AAAAAA");
        bus.publish(event("AAAAAA"));
        let received = sub.next().await.unwrap();
        assert_eq!(received.code, "AAAAAA");
    }

    #[tokio::test]
    async fn events_are_scoped_to_their_code() {
        let bus = NoteBus::new();
        let mut other = bus.subscribe("BBBBBB");
        let mut mine = bus.subscribe("AAAAAA");
        bus.publish(event("AAAAAA"));
        assert_eq!(mine.next().await.unwrap().code, "AAAAAA");
        other.cancel();
        assert!(other.next().await.is_none());
    }

    #[tokio::test]
    async fn cancel_is_synchronous_and_idempotent() {
        let bus = NoteBus::new();
        let mut sub = bus.subscribe("AAAAAA");
        sub.cancel();
        sub.cancel();
        assert!(sub.is_cancelled());
        assert!(sub.next().await.is_none());
    }

    #[test]
    fn publish_without_subscribers_is_a_no_op() {
        let bus = NoteBus::new();
        bus.publish(event("CCCCCC"));
    }
}

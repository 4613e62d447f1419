//! One-shot events
//!
//! Screens emit transient events (show a message, hand credentials upward,
//! navigate) that must be delivered to exactly one observer and are not
//! retained after delivery. Unlike `watch`-based state, a delivered event is
//! gone; unlike `broadcast`, there is a single consumer.

use thiserror::Error;
use tokio::sync::mpsc;

/// State channel errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    /// The receiving side of an event channel was dropped
    #[error("Event channel closed")]
    ChannelClosed,
}

/// Result type for state operations
pub type Result<T> = std::result::Result<T, StateError>;

/// Create a one-shot event channel
pub fn event_channel<E>() -> (EventSender<E>, EventStream<E>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender { tx }, EventStream { rx })
}

/// Sending half of an event channel
#[derive(Debug)]
pub struct EventSender<E> {
    tx: mpsc::UnboundedSender<E>,
}

impl<E> EventSender<E> {
    /// Emit an event
    pub fn send(&self, event: E) -> Result<()> {
        self.tx.send(event).map_err(|_| StateError::ChannelClosed)
    }

    /// Check if the receiver has gone away
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl<E> Clone for EventSender<E> {
    fn clone(&self) -> Self {
        Self { tx: self.tx.clone() }
    }
}

/// Receiving half of an event channel
#[derive(Debug)]
pub struct EventStream<E> {
    rx: mpsc::UnboundedReceiver<E>,
}

impl<E> EventStream<E> {
    /// Wait for the next event
    ///
    /// Returns `None` once every sender is dropped and the queue is empty.
    pub async fn next(&mut self) -> Option<E> {
        self.rx.recv().await
    }

    /// Take the next event if one is queued
    pub fn try_next(&mut self) -> Option<E> {
        self.rx.try_recv().ok()
    }

    /// Take every queued event
    pub fn drain(&mut self) -> Vec<E> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum TestEvent {
        Toast(String),
        Done,
    }

    #[tokio::test]
    async fn test_events_delivered_in_order() {
        let (tx, mut rx) = event_channel();
        tx.send(TestEvent::Toast("saved".to_string())).unwrap();
        tx.send(TestEvent::Done).unwrap();

        assert_eq!(rx.next().await, Some(TestEvent::Toast("saved".to_string())));
        assert_eq!(rx.next().await, Some(TestEvent::Done));
    }

    #[test]
    fn test_events_not_retained() {
        let (tx, mut rx) = event_channel();
        tx.send(TestEvent::Done).unwrap();

        assert_eq!(rx.drain(), vec![TestEvent::Done]);
        assert_eq!(rx.try_next(), None);
    }

    #[test]
    fn test_send_after_receiver_dropped() {
        let (tx, rx) = event_channel::<TestEvent>();
        drop(rx);

        assert!(tx.is_closed());
        assert_eq!(tx.send(TestEvent::Done), Err(StateError::ChannelClosed));
    }

    #[tokio::test]
    async fn test_stream_ends_when_senders_dropped() {
        let (tx, mut rx) = event_channel::<TestEvent>();
        drop(tx);
        assert_eq!(rx.next().await, None);
    }
}

//! Live event subscriptions.
//!
//! A [`Subscription`] is the receiving end of a single inbound channel. Dropping it
//! releases the registration: the sender side observes the closed channel, and any
//! transport teardown attached with [`Subscription::on_drop`] runs.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use futures::{Stream, StreamExt};

/// Receiving end of an event channel.
pub struct Subscription<E> {
    receiver: UnboundedReceiver<E>,
    teardown: Option<Box<dyn FnOnce()>>,
}

impl<E> Subscription<E> {
    /// Create a connected sender/subscription pair.
    pub fn channel() -> (UnboundedSender<E>, Self) {
        let (tx, rx) = mpsc::unbounded();
        (tx, Self::new(rx))
    }

    pub fn new(receiver: UnboundedReceiver<E>) -> Self {
        Self {
            receiver,
            teardown: None,
        }
    }

    /// Run `f` when the subscription is dropped.
    pub fn on_drop(mut self, f: impl FnOnce() + 'static) -> Self {
        self.teardown = Some(Box::new(f));
        self
    }

    /// Wait for the next event. `None` once the sender side is gone.
    pub async fn next_event(&mut self) -> Option<E> {
        self.receiver.next().await
    }

    /// Take every event that is already queued without waiting.
    pub fn drain(&mut self) -> Vec<E> {
        let mut events = Vec::new();
        while let Ok(Some(event)) = self.receiver.try_next() {
            events.push(event);
        }
        events
    }
}

impl<E> Stream for Subscription<E> {
    type Item = E;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<E>> {
        Pin::new(&mut self.receiver).poll_next(cx)
    }
}

impl<E> Drop for Subscription<E> {
    fn drop(&mut self) {
        self.receiver.close();
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }
}

/// Fan-out list of subscribers; closed subscribers are pruned on every send.
pub struct Listeners<E> {
    senders: Vec<UnboundedSender<E>>,
}

impl<E> Default for Listeners<E> {
    fn default() -> Self {
        Self {
            senders: Vec::new(),
        }
    }
}

impl<E: Clone> Listeners<E> {
    /// Register a new subscriber.
    pub fn subscribe(&mut self) -> Subscription<E> {
        let (tx, subscription) = Subscription::channel();
        self.senders.push(tx);
        subscription
    }

    /// Deliver `event` to every live subscriber.
    pub fn emit(&mut self, event: &E) {
        self.senders
            .retain(|tx| tx.unbounded_send(event.clone()).is_ok());
    }

    /// Number of live subscribers.
    pub fn len(&mut self) -> usize {
        self.senders.retain(|tx| !tx.is_closed());
        self.senders.len()
    }

    pub fn is_empty(&mut self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[tokio::test]
    async fn test_emit_reaches_live_subscribers() {
        let mut listeners = Listeners::<u32>::default();
        let mut first = listeners.subscribe();
        let second = listeners.subscribe();
        assert_eq!(listeners.len(), 2);

        drop(second);
        listeners.emit(&5);
        assert_eq!(listeners.len(), 1);
        assert_eq!(first.next_event().await, Some(5));
    }

    #[test]
    fn test_drop_runs_teardown() {
        let released = Rc::new(Cell::new(false));
        let flag = released.clone();
        let (_tx, subscription) = Subscription::<u32>::channel();
        let subscription = subscription.on_drop(move || flag.set(true));
        assert!(!released.get());
        drop(subscription);
        assert!(released.get());
    }

    #[test]
    fn test_drain_takes_queued_events() {
        let (tx, mut subscription) = Subscription::channel();
        tx.unbounded_send(1).unwrap();
        tx.unbounded_send(2).unwrap();
        assert_eq!(subscription.drain(), vec![1, 2]);
        assert!(subscription.drain().is_empty());
    }
}

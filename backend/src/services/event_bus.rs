use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use plexguard_shared::CoreEvent;
use tokio::sync::RwLock;
use tracing::error;

use crate::error::AppError;

type Subscriber = Box<dyn Fn(&CoreEvent) -> Result<(), AppError> + Send + Sync>;

/// In-process publish/subscribe for `CoreEvent`s (spec §4.6).
///
/// Subscribers are invoked synchronously, in registration order, by the
/// publisher's own task - this is not `tokio::sync::broadcast`. A
/// subscriber that errors or panics is logged and skipped; it never stops
/// the remaining subscribers or propagates back to the publisher.
#[derive(Clone)]
pub struct EventBus {
    subscribers: Arc<RwLock<Vec<Subscriber>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { subscribers: Arc::new(RwLock::new(Vec::new())) }
    }

    pub async fn subscribe<F>(&self, handler: F)
    where
        F: Fn(&CoreEvent) -> Result<(), AppError> + Send + Sync + 'static,
    {
        self.subscribers.write().await.push(Box::new(handler));
    }

    /// Publishes a single event to every subscriber, in emission order.
    /// Ordering within a tick is preserved by calling this once per event,
    /// in the order the orchestrator produced them.
    pub async fn publish(&self, event: CoreEvent) {
        let subscribers = self.subscribers.read().await;
        for (index, subscriber) in subscribers.iter().enumerate() {
            let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| subscriber(&event)));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(error)) => error!(subscriber = index, %error, "event subscriber returned an error"),
                Err(_) => error!(subscriber = index, "event subscriber panicked"),
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sample_event() -> CoreEvent {
        CoreEvent::NewDevice { user_id: "42".into(), device_identifier: "AAA".into(), at: chrono::Utc::now() }
    }

    #[tokio::test]
    async fn delivers_to_every_subscriber_in_order() {
        let bus = EventBus::new();
        let order: Arc<std::sync::Mutex<Vec<usize>>> = Arc::new(std::sync::Mutex::new(Vec::new()));

        for id in 0..3 {
            let order = order.clone();
            bus.subscribe(move |_event| {
                order.lock().unwrap().push(id);
                Ok(())
            })
            .await;
        }

        bus.publish(sample_event()).await;
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn a_failing_subscriber_does_not_block_the_next_one() {
        let bus = EventBus::new();
        let delivered = Arc::new(AtomicUsize::new(0));

        bus.subscribe(|_event| Err(AppError::Internal("boom".into()))).await;

        let delivered_clone = delivered.clone();
        bus.subscribe(move |_event| {
            delivered_clone.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .await;

        bus.publish(sample_event()).await;
        assert_eq!(delivered.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn a_panicking_subscriber_does_not_block_the_next_one() {
        let bus = EventBus::new();
        let delivered = Arc::new(AtomicUsize::new(0));

        bus.subscribe(|_event| panic!("subscriber exploded")).await;

        let delivered_clone = delivered.clone();
        bus.subscribe(move |_event| {
            delivered_clone.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .await;

        bus.publish(sample_event()).await;
        assert_eq!(delivered.load(Ordering::SeqCst), 1);
    }
}

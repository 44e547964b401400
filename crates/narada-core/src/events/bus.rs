//! In-process fan-out of [`StatusEvent`]s.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::mpsc;

use super::{EventTopic, StatusEvent};
use crate::ports::StatusEmitter;

type Handler = Arc<dyn Fn(&StatusEvent) + Send + Sync>;

/// Token returned by `subscribe`, used to detach the handler again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscription {
    id: SubscriptionId,
    topic: Option<EventTopic>,
    handler: Handler,
}

/// Synchronous publish/subscribe hub.
///
/// `publish` calls every matching handler on the caller's thread, in
/// subscription order. Nothing is buffered: a handler attached after an event
/// was published never sees it. Consumers that need the current state query
/// it directly instead of relying on history.
#[derive(Default)]
pub struct StatusEventBus {
    subscriptions: RwLock<Vec<Subscription>>,
    next_id: AtomicU64,
}

impl StatusEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to one topic.
    pub fn subscribe<F>(&self, topic: EventTopic, handler: F) -> SubscriptionId
    where
        F: Fn(&StatusEvent) + Send + Sync + 'static,
    {
        self.insert(Some(topic), Arc::new(handler))
    }

    /// Subscribe to every event.
    pub fn subscribe_all<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&StatusEvent) + Send + Sync + 'static,
    {
        self.insert(None, Arc::new(handler))
    }

    /// Forward events into an unbounded channel for async consumers.
    ///
    /// The subscription stays registered until `unsubscribe` is called;
    /// events published after the receiver is dropped are discarded.
    pub fn subscribe_channel(
        &self,
        topic: Option<EventTopic>,
    ) -> (SubscriptionId, mpsc::UnboundedReceiver<StatusEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.insert(
            topic,
            Arc::new(move |event: &StatusEvent| {
                let _ = tx.send(event.clone());
            }),
        );
        (id, rx)
    }

    /// Detach a handler. Returns `false` if the id was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = self
            .subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = subs.len();
        subs.retain(|s| s.id != id);
        subs.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Deliver `event` to every matching subscriber.
    pub fn publish(&self, event: &StatusEvent) {
        // Snapshot so handlers may subscribe or unsubscribe re-entrantly.
        let handlers: Vec<Handler> = {
            let subs = self
                .subscriptions
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            let topic = event.topic();
            subs.iter()
                .filter(|s| s.topic.is_none_or(|t| t == topic))
                .map(|s| Arc::clone(&s.handler))
                .collect()
        };

        for handler in handlers {
            handler(event);
        }
    }

    fn insert(&self, topic: Option<EventTopic>, handler: Handler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Subscription { id, topic, handler });
        id
    }
}

impl std::fmt::Debug for StatusEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusEventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl StatusEmitter for StatusEventBus {
    fn emit(&self, event: StatusEvent) {
        self.publish(&event);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::domain::ProcessKind;
    use crate::events::Severity;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) -> Box<dyn Fn(&StatusEvent) + Send + Sync>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_for_factory = Arc::clone(&seen);
        let factory = move |label: &str| -> Box<dyn Fn(&StatusEvent) + Send + Sync> {
            let seen = Arc::clone(&seen_for_factory);
            let label = label.to_string();
            Box::new(move |event: &StatusEvent| {
                seen.lock()
                    .unwrap()
                    .push(format!("{label}:{}", event.event_name()));
            })
        };
        (seen, factory)
    }

    #[test]
    fn delivers_in_subscription_order() {
        let bus = StatusEventBus::new();
        let (seen, handler) = recorder();
        let first = handler("a");
        let second = handler("b");
        bus.subscribe_all(move |e| first(e));
        bus.subscribe_all(move |e| second(e));

        bus.publish(&StatusEvent::running(ProcessKind::Relay, 1));

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["a:service:status", "b:service:status"]
        );
    }

    #[test]
    fn topic_filter_and_unsubscribe() {
        let bus = StatusEventBus::new();
        let (seen, handler) = recorder();
        let logs = handler("logs");
        let id = bus.subscribe(EventTopic::LogLine, move |e| logs(e));

        bus.publish(&StatusEvent::running(ProcessKind::Relay, 1));
        bus.publish(&StatusEvent::log(ProcessKind::Relay, Severity::Info, "hi"));
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.publish(&StatusEvent::log(ProcessKind::Relay, Severity::Info, "again"));

        assert_eq!(*seen.lock().unwrap(), vec!["logs:log:line"]);
    }

    #[test]
    fn late_subscriber_sees_no_history() {
        let bus = StatusEventBus::new();
        bus.publish(&StatusEvent::stopped(ProcessKind::Analyzer, "Stopped"));

        let (seen, handler) = recorder();
        let late = handler("late");
        bus.subscribe_all(move |e| late(e));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn channel_subscription_receives_events() {
        let bus = StatusEventBus::new();
        let (_id, mut rx) = bus.subscribe_channel(Some(EventTopic::ServiceStatus));

        bus.emit(StatusEvent::running(ProcessKind::Relay, 7));
        let event = rx.recv().await.unwrap();
        assert_eq!(event, StatusEvent::running(ProcessKind::Relay, 7));
    }
}

//! Event Bus implementation.
//!
//! The bus is an owned value: components receive an `Arc<EventBus>` from
//! whoever constructs them, so tests can build isolated instances.

use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::events::{AppEvent, EventCategory};

/// Subscription handle for unsubscribing from events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sub({})", &self.0.to_string()[..8])
    }
}

/// Filter to receive only specific event types
#[derive(Debug, Clone, Default)]
pub enum EventFilter {
    /// Receive all events.
    #[default]
    All,
    /// Receive events matching any of these categories.
    Categories(Vec<EventCategory>),
    /// Receive only failures.
    Failures,
}

impl EventFilter {
    /// Check if an event matches this filter
    pub fn matches(&self, event: &AppEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::Categories(categories) => categories.contains(&event.category()),
            EventFilter::Failures => event.is_failure(),
        }
    }
}

type EventHandler = Box<dyn Fn(&AppEvent) + Send + Sync>;

/// Configuration for the event bus
#[derive(Debug, Clone)]
pub struct EventBusConfig {
    /// Channel capacity for broadcast.
    pub channel_capacity: usize,
    /// Number of recent events kept for late readers (0 disables).
    pub recent_capacity: usize,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
            recent_capacity: 64,
        }
    }
}

/// Event bus for feedback from the dispatcher to the front end
pub struct EventBus {
    sender: broadcast::Sender<AppEvent>,
    handlers: RwLock<HashMap<SubscriptionId, (EventFilter, EventHandler)>>,
    recent: RwLock<VecDeque<AppEvent>>,
    config: EventBusConfig,
}

impl EventBus {
    /// Create a new event bus with default configuration
    pub fn new() -> Self {
        Self::with_config(EventBusConfig::default())
    }

    /// Create a new event bus with custom configuration
    pub fn with_config(config: EventBusConfig) -> Self {
        let (sender, _) = broadcast::channel(config.channel_capacity.max(1));
        Self {
            sender,
            handlers: RwLock::new(HashMap::new()),
            recent: RwLock::new(VecDeque::with_capacity(config.recent_capacity)),
            config,
        }
    }

    /// Create a shared bus
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Publish an event
    ///
    /// Never fails: an event nobody listens to is simply dropped. Returns
    /// the number of async receivers the event was queued for.
    pub fn publish(&self, event: AppEvent) -> usize {
        tracing::trace!("Event: {}", event.description());

        if self.config.recent_capacity > 0 {
            let mut recent = self.recent.write();
            if recent.len() == self.config.recent_capacity {
                recent.pop_front();
            }
            recent.push_back(event.clone());
        }

        for (filter, handler) in self.handlers.read().values() {
            if filter.matches(&event) {
                handler(&event);
            }
        }

        self.sender.send(event).unwrap_or(0)
    }

    /// Subscribe with a synchronous handler
    ///
    /// The handler runs on the publishing task and must return quickly.
    pub fn subscribe<F>(&self, filter: EventFilter, handler: F) -> SubscriptionId
    where
        F: Fn(&AppEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId::new();
        self.handlers.write().insert(id, (filter, Box::new(handler)));
        tracing::debug!("Subscription {} added", id);
        id
    }

    /// Get a receiver for async event polling
    pub fn receiver(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
    }

    /// Unsubscribe; returns true if the subscription existed
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.handlers.write().remove(&id).is_some();
        if removed {
            tracing::debug!("Subscription {} removed", id);
        }
        removed
    }

    /// Number of synchronous subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.handlers.read().len()
    }

    /// Most recent events, oldest first
    pub fn recent(&self) -> Vec<AppEvent> {
        self.recent.read().iter().cloned().collect()
    }

    /// Most recent event matching a filter
    pub fn last_matching(&self, filter: &EventFilter) -> Option<AppEvent> {
        self.recent
            .read()
            .iter()
            .rev()
            .find(|event| filter.matches(event))
            .cloned()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CommandResult, RobotId};
    use crate::event_bus::events::{CommandEvent, ConnectionEvent, RobotEvent};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn connected() -> AppEvent {
        AppEvent::Connection(ConnectionEvent::Connected {
            host: "10.0.0.5".to_string(),
        })
    }

    #[test]
    fn test_subscribe_and_unsubscribe() {
        let bus = EventBus::new();

        let id = bus.subscribe(EventFilter::All, |_| {});
        assert_eq!(bus.subscriber_count(), 1);

        assert!(bus.unsubscribe(id));
        assert_eq!(bus.subscriber_count(), 0);
        assert!(!bus.unsubscribe(id));
    }

    #[test]
    fn test_event_filtering() {
        let bus = EventBus::new();
        let connection_count = Arc::new(AtomicUsize::new(0));
        let failure_count = Arc::new(AtomicUsize::new(0));

        let cc = connection_count.clone();
        bus.subscribe(
            EventFilter::Categories(vec![EventCategory::Connection]),
            move |_| {
                cc.fetch_add(1, Ordering::SeqCst);
            },
        );
        let fc = failure_count.clone();
        bus.subscribe(EventFilter::Failures, move |_| {
            fc.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish(connected());
        bus.publish(AppEvent::Robot(RobotEvent::Selected {
            robot_id: RobotId::new("robot1"),
        }));
        bus.publish(AppEvent::Command(CommandEvent {
            endpoint: "/ping".to_string(),
            result: CommandResult::failed("status 500"),
        }));

        assert_eq!(connection_count.load(Ordering::SeqCst), 1);
        assert_eq!(failure_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_recent_is_bounded() {
        let bus = EventBus::with_config(EventBusConfig {
            channel_capacity: 8,
            recent_capacity: 3,
        });
        for i in 0..5 {
            bus.publish(AppEvent::Robot(RobotEvent::ProgramSent { lines: i }));
        }
        let recent = bus.recent();
        assert_eq!(recent.len(), 3);
        assert_eq!(
            recent[0],
            AppEvent::Robot(RobotEvent::ProgramSent { lines: 2 })
        );
        assert_eq!(
            bus.last_matching(&EventFilter::All),
            Some(AppEvent::Robot(RobotEvent::ProgramSent { lines: 4 }))
        );
    }

    #[tokio::test]
    async fn test_async_receiver() {
        let bus = EventBus::new();
        let mut receiver = bus.receiver();

        assert_eq!(bus.publish(connected()), 1);

        match receiver.try_recv() {
            Ok(AppEvent::Connection(ConnectionEvent::Connected { host })) => {
                assert_eq!(host, "10.0.0.5")
            }
            other => panic!("Wrong event received: {:?}", other),
        }
    }
}

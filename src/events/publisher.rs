use crate::state_machine::{ResourceEvent, ResourceState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Broadcast publisher for resource state transitions
#[derive(Debug, Clone)]
pub struct TransitionPublisher {
    sender: broadcast::Sender<TransitionEvent>,
}

/// A single state change of one resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionEvent {
    pub key: String,
    pub from: ResourceState,
    pub to: ResourceState,
    pub event: ResourceEvent,
    /// Download generation the transition belongs to
    pub generation: u64,
    pub occurred_at: DateTime<Utc>,
}

impl TransitionPublisher {
    /// Create a new publisher with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish a transition. Having no receivers is not an error.
    pub fn publish(&self, event: TransitionEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TransitionEvent> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for TransitionPublisher {
    fn default() -> Self {
        Self::new(crate::constants::defaults::EVENT_CHANNEL_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(key: &str, from: ResourceState, to: ResourceState, event: ResourceEvent) -> TransitionEvent {
        TransitionEvent {
            key: key.to_string(),
            from,
            to,
            event,
            generation: 1,
            occurred_at: Utc::now(),
        }
    }

    #[test]
    fn test_publish_without_receivers() {
        let publisher = TransitionPublisher::new(4);
        assert_eq!(publisher.receiver_count(), 0);
        publisher.publish(event(
            "k",
            ResourceState::Idle,
            ResourceState::Loading,
            ResourceEvent::Start,
        ));
    }

    #[tokio::test]
    async fn test_receivers_see_events_in_order() {
        let publisher = TransitionPublisher::new(4);
        let mut rx = publisher.subscribe();

        publisher.publish(event("k", ResourceState::Idle, ResourceState::Loading, ResourceEvent::Start));
        publisher.publish(event("k", ResourceState::Loading, ResourceState::Loaded, ResourceEvent::Succeed));

        assert_eq!(rx.recv().await.unwrap().to, ResourceState::Loading);
        let second = rx.recv().await.unwrap();
        assert_eq!(second.from, ResourceState::Loading);
        assert_eq!(second.to, ResourceState::Loaded);
    }

    #[test]
    fn test_event_serializes_snake_case() {
        let json = serde_json::to_value(event(
            "img-a",
            ResourceState::Loading,
            ResourceState::Errored,
            ResourceEvent::Fail,
        ))
        .unwrap();
        assert_eq!(json["from"], "loading");
        assert_eq!(json["to"], "errored");
        assert_eq!(json["event"], "fail");
    }
}

pub mod subscriber_registry;

pub use subscriber_registry::{ResourceSubscriber, SubscriberId, SubscriberRegistry};

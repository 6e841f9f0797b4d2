pub mod publisher;

pub use publisher::{TransitionEvent, TransitionPublisher};

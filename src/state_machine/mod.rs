// Per-key resource state machine
//
// idle --start--> loading --succeed--> loaded
//                 loading --fail-----> errored --start--> loading
// loaded --refresh--> loading (TTL expiry)
// loaded|errored --invalidate--> idle

pub mod events;
pub mod states;

pub use events::ResourceEvent;
pub use states::ResourceState;

use crate::error::{ResourceError, Result};

/// Apply `event` to `from`, returning the target state.
pub fn transition(key: &str, from: ResourceState, event: ResourceEvent) -> Result<ResourceState> {
    use ResourceEvent as E;
    use ResourceState as S;

    let to = match (from, event) {
        (S::Idle | S::Errored, E::Start) => S::Loading,
        (S::Loaded, E::Refresh) => S::Loading,
        (S::Loading, E::Succeed) => S::Loaded,
        (S::Loading, E::Fail) => S::Errored,
        (S::Loaded | S::Errored, E::Invalidate) => S::Idle,
        _ => {
            return Err(ResourceError::InvalidTransition {
                key: key.to_string(),
                from,
                event,
            })
        }
    };

    Ok(to)
}

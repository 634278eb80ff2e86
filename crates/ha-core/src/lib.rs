//! Core types for the Home Assistant host
//!
//! The types every integration shares with the host: [`EntityId`],
//! [`State`], [`Event`] and [`Context`], plus the [`slugify`] helper used to
//! turn free-form identifiers into entity object ids.

mod context;
mod entity_id;
mod event;
mod normalize;
mod state;

pub use context::Context;
pub use entity_id::{EntityId, EntityIdError};
pub use event::{Event, EventData, EventOrigin, EventType};
pub use normalize::slugify;
pub use state::State;

/// State value for an entity that has not reported anything yet
pub const STATE_UNKNOWN: &str = "unknown";

/// Attribute keys shared across domains
pub mod attrs {
    /// Human readable entity name
    pub const FRIENDLY_NAME: &str = "friendly_name";

    /// Entity id carried in event payloads
    pub const ENTITY_ID: &str = "entity_id";
}

/// Event types fired by the host itself
pub mod events {
    use super::*;

    /// Fired by the state machine whenever an entity state is written
    pub const STATE_CHANGED: &str = "state_changed";

    /// Data for STATE_CHANGED events
    #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
    pub struct StateChangedData {
        pub entity_id: EntityId,
        pub old_state: Option<State>,
        pub new_state: Option<State>,
    }

    impl EventData for StateChangedData {
        fn event_type() -> &'static str {
            STATE_CHANGED
        }
    }
}

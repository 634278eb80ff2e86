//! Host handle and the entity contract platforms implement

use ha_core::{attrs, Context, EntityId, State};
use ha_event_bus::{EventBus, SharedEventBus};
use ha_state_machine::{SharedStateMachine, StateMachine};
use std::collections::HashMap;
use std::sync::Arc;

/// The host services an integration talks to
#[derive(Clone)]
pub struct Hass {
    pub bus: SharedEventBus,
    pub states: SharedStateMachine,
}

impl Hass {
    pub fn new() -> Self {
        let bus = Arc::new(EventBus::new());
        let states = Arc::new(StateMachine::new(bus.clone()));
        Self { bus, states }
    }
}

impl Default for Hass {
    fn default() -> Self {
        Self::new()
    }
}

/// What the host needs to present an entity
pub trait Entity {
    fn entity_id(&self) -> &EntityId;

    fn name(&self) -> &str;

    /// Current state value
    fn state(&self) -> String;

    /// Whether the host should periodically refresh this entity
    fn should_poll(&self) -> bool {
        true
    }

    /// Attributes beyond `friendly_name`
    fn extra_attributes(&self) -> HashMap<String, serde_json::Value> {
        HashMap::new()
    }

    /// Write the entity's current state into the host state machine
    fn update_ha_state(&self, hass: &Hass, context: Context) -> State {
        let mut attributes = self.extra_attributes();
        attributes.insert(attrs::FRIENDLY_NAME.to_string(), self.name().into());
        hass.states
            .set(self.entity_id().clone(), self.state(), attributes, context)
    }
}

//! Multistate switch platform (`switch.rfxtrx_multistate`)
//!
//! Covers RFXtrx lighting devices that emit more than on/off, such as
//! LightwaveRF mood switches. The entity state is whatever command the
//! device last sent, lowercased. Switches are configured statically:
//!
//! ```yaml
//! switch:
//!   - platform: rfxtrx_multistate
//!     devices:
//!       kitchen_switch:
//!         name: Kitchen
//!         packetid: "0b1100cd0213c7f230010f71"
//!         fire_event: true
//! ```

use crate::device::{PacketId, RfxDevice, RfxObjectResolver, RxEvent};
use crate::entity::{Entity, Hass};
use crate::error::RfxtrxResult;
use crate::hub::{RfxEntry, RfxtrxHub, SubscriberKey};
use crate::{ATTR_FIREEVENT, EVENT_BUTTON_PRESSED, VALUE_COMMAND};
use ha_core::{Context, EntityId, EventData, STATE_UNKNOWN};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

pub const PLATFORM: &str = "rfxtrx_multistate";

const SWITCH_DOMAIN: &str = "switch";

pub const SUBSCRIBER: SubscriberKey = SubscriberKey::new("switch.rfxtrx_multistate");

/// One `- platform: rfxtrx_multistate` block
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MultiStateSwitchConfig {
    /// Configured devices keyed by registry identifier, in file order
    #[serde(default)]
    pub devices: Option<IndexMap<String, DeviceConfig>>,
}

impl MultiStateSwitchConfig {
    /// Every block of this platform under the `switch` domain
    pub fn from_yaml(config: &ha_config::Value) -> RfxtrxResult<Vec<Self>> {
        Ok(ha_config::platform_configs(config, SWITCH_DOMAIN, PLATFORM)?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
    pub name: String,
    pub packetid: String,
    #[serde(default)]
    pub fire_event: bool,
}

/// Payload of the `button_pressed` event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonPressedData {
    pub entity_id: String,
    pub state: String,
}

impl EventData for ButtonPressedData {
    fn event_type() -> &'static str {
        EVENT_BUTTON_PRESSED
    }
}

/// A multistate switch entity
///
/// Clones are handles to the same entity: the copy in the hub registry and
/// the copies handed to the host all observe the same state.
#[derive(Debug, Clone)]
pub struct MultiStateSwitch(Arc<SwitchInner>);

#[derive(Debug)]
struct SwitchInner {
    entity_id: EntityId,
    name: String,
    device: RfxDevice,
    should_fire_event: bool,
    state: RwLock<String>,
}

impl MultiStateSwitch {
    /// A switch that has not heard from its device yet
    pub fn new(
        entity_id: EntityId,
        name: impl Into<String>,
        device: RfxDevice,
        should_fire_event: bool,
    ) -> Self {
        Self(Arc::new(SwitchInner {
            entity_id,
            name: name.into(),
            device,
            should_fire_event,
            state: RwLock::new(STATE_UNKNOWN.to_string()),
        }))
    }

    pub fn device(&self) -> &RfxDevice {
        &self.0.device
    }

    pub fn should_fire_event(&self) -> bool {
        self.0.should_fire_event
    }

    /// Whether both handles refer to the same entity
    pub fn same_entity(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Record a command received from the device, returning the new state
    pub fn set_state(&self, command: &str) -> String {
        let state = command.to_lowercase();
        let mut guard = match self.0.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.clone_from(&state);
        state
    }
}

impl Entity for MultiStateSwitch {
    fn entity_id(&self) -> &EntityId {
        &self.0.entity_id
    }

    fn name(&self) -> &str {
        &self.0.name
    }

    fn state(&self) -> String {
        match self.0.state.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    // State is pushed by the gateway
    fn should_poll(&self) -> bool {
        false
    }

    fn extra_attributes(&self) -> HashMap<String, serde_json::Value> {
        HashMap::from([(ATTR_FIREEVENT.to_string(), self.0.should_fire_event.into())])
    }
}

/// Create the configured switches and subscribe to gateway events
///
/// Identifiers already present in the hub registry are left alone. Every new
/// device is validated and resolved before any of them is registered, so a
/// failing device leaves the registry untouched. `add_entities` is called
/// exactly once with the switches created by this call, which may be none,
/// and receives the same entities the registry holds. The event handler is
/// subscribed at most once per hub however often setup runs.
pub fn setup_platform<R, F>(
    hass: &Hass,
    hub: &RfxtrxHub,
    config: &MultiStateSwitchConfig,
    resolver: &R,
    add_entities: F,
) -> RfxtrxResult<()>
where
    R: RfxObjectResolver + ?Sized,
    F: FnOnce(Vec<MultiStateSwitch>),
{
    let mut pending = Vec::new();

    for (id, device_config) in config.devices.iter().flatten() {
        if hub.contains(id) {
            debug!("Skipping {}, already registered", id);
            continue;
        }

        let packet_id = PacketId::parse(&device_config.packetid)?;
        let device = resolver.resolve(&packet_id)?;
        let switch = MultiStateSwitch::new(
            EntityId::from_slug(SWITCH_DOMAIN, id)?,
            device_config.name.clone(),
            device,
            device_config.fire_event,
        );
        pending.push((id.clone(), switch));
    }

    let switches = pending
        .into_iter()
        .map(|(id, switch)| {
            hub.insert(id, RfxEntry::MultiStateSwitch(switch.clone()));
            info!("Add {} rfxtrx_multistate.switch", switch.name());
            switch
        })
        .collect();

    add_entities(switches);

    let hass = hass.clone();
    hub.subscribe(SUBSCRIBER, move |hub, event| {
        handle_event(&hass, hub, event).map(|_| ())
    });

    Ok(())
}

/// Apply a received event to the matching multistate switch
///
/// Returns whether a switch was updated. Events from non-lighting devices, or
/// for identifiers that are unknown or owned by another platform, are ignored.
/// A matching event without a text `Command` value is an error and changes
/// nothing.
pub fn handle_event(hass: &Hass, hub: &RfxtrxHub, event: &RxEvent) -> RfxtrxResult<bool> {
    if !event.device.is_lighting() {
        return Ok(false);
    }

    let id = event.device.registry_key();
    let Some(switch) = hub.multistate_switch(&id) else {
        return Ok(false);
    };

    let command = event.text_value(VALUE_COMMAND)?;
    info!("EntityID: {} switch_update. Command: {}", id, command);
    let state = switch.set_state(command);

    let context = Context::new();
    switch.update_ha_state(hass, context.clone());

    if switch.should_fire_event() {
        hass.bus.fire_typed(
            ButtonPressedData {
                entity_id: id,
                state,
            },
            context,
        );
    }

    Ok(true)
}

//! RFXtrx component
//!
//! Shared state of the RFXtrx gateway integration plus the
//! `rfxtrx_multistate` switch platform, for devices such as LightwaveRF mood
//! switches that report more than on/off.
//!
//! The gateway driver decodes radio packets into [`RxEvent`]s and feeds them
//! to the [`RfxtrxHub`], which hands each one to every subscribed platform in
//! turn. Platforms keep their entities in the hub's device registry, keyed by
//! the slugified hardware id of the device.
//!
//! ```ignore
//! let hass = Hass::new();
//! let hub = Arc::new(RfxtrxHub::new());
//! for config in platform_configs::<MultiStateSwitchConfig>(&yaml, "switch", PLATFORM)? {
//!     setup_platform(&hass, &hub, &config, &resolver, |switches| { /* ... */ })?;
//! }
//! tokio::spawn(hub.clone().run(gateway_rx));
//! ```

mod device;
mod entity;
mod error;
mod hub;
pub mod switch_multistate;

pub use device::{DeviceKind, PacketId, RfxDevice, RfxObjectResolver, RxEvent};
pub use entity::{Entity, Hass};
pub use error::{RfxtrxError, RfxtrxResult};
pub use hub::{RfxEntry, RfxtrxHub, SubscriberKey};
pub use switch_multistate::{
    handle_event, setup_platform, ButtonPressedData, DeviceConfig, MultiStateSwitch,
    MultiStateSwitchConfig, PLATFORM,
};

/// Integration domain
pub const DOMAIN: &str = "rfxtrx";

/// Fired when a device configured with `fire_event` reports a command
pub const EVENT_BUTTON_PRESSED: &str = "button_pressed";

pub const ATTR_NAME: &str = "name";
pub const ATTR_PACKETID: &str = "packetid";
pub const ATTR_FIREEVENT: &str = "fire_event";
pub const ATTR_STATE: &str = "state";

/// Decoded value key carrying a lighting device's command
pub const VALUE_COMMAND: &str = "Command";

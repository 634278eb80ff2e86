//! Driver-level device descriptors and received events
//!
//! Packet decoding belongs to the gateway driver. This module only carries
//! what the driver hands over: which device spoke, what kind of device it is,
//! and the values decoded from the packet.

use crate::error::{RfxtrxError, RfxtrxResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Hex encoded RFXtrx packet, as written in configuration
///
/// Stored lowercase without the optional `0x` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PacketId(String);

impl PacketId {
    pub fn parse(raw: &str) -> RfxtrxResult<Self> {
        let invalid = |reason: &str| RfxtrxError::InvalidPacketId {
            packet_id: raw.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = raw.trim();
        let hex = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if hex.is_empty() {
            return Err(invalid("empty"));
        }
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid("not hexadecimal"));
        }
        if hex.len() % 2 != 0 {
            return Err(invalid("odd number of hex digits"));
        }

        Ok(Self(hex.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PacketId {
    type Error = RfxtrxError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<PacketId> for String {
    fn from(id: PacketId) -> String {
        id.0
    }
}

impl fmt::Display for PacketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Capability category the driver assigns to a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    /// Lighting and switch protocols (LightwaveRF, ARC, AC, ...)
    Lighting,
    Sensor,
    Status,
}

/// A device known to the gateway driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RfxDevice {
    /// Hardware id as reported by the driver
    pub id_string: String,
    pub kind: DeviceKind,
    /// Packet the device was built from, when it came from configuration
    pub packet_id: Option<PacketId>,
}

impl RfxDevice {
    pub fn new(id_string: impl Into<String>, kind: DeviceKind) -> Self {
        Self {
            id_string: id_string.into(),
            kind,
            packet_id: None,
        }
    }

    pub fn lighting(id_string: impl Into<String>) -> Self {
        Self::new(id_string, DeviceKind::Lighting)
    }

    pub fn with_packet_id(mut self, packet_id: PacketId) -> Self {
        self.packet_id = Some(packet_id);
        self
    }

    pub fn is_lighting(&self) -> bool {
        self.kind == DeviceKind::Lighting
    }

    /// Registry key for this device: the slugified, lowercased hardware id
    pub fn registry_key(&self) -> String {
        ha_core::slugify(&self.id_string.to_lowercase())
    }
}

/// An event the gateway received and decoded
#[derive(Debug, Clone, PartialEq)]
pub struct RxEvent {
    pub device: RfxDevice,
    pub values: BTreeMap<String, serde_json::Value>,
}

impl RxEvent {
    pub fn new(device: RfxDevice) -> Self {
        Self {
            device,
            values: BTreeMap::new(),
        }
    }

    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// A decoded text value; absent and non-text values are errors
    pub fn text_value(&self, key: &str) -> RfxtrxResult<&str> {
        match self.values.get(key) {
            Some(serde_json::Value::String(s)) => Ok(s.as_str()),
            Some(_) => Err(RfxtrxError::InvalidValue {
                id_string: self.device.id_string.clone(),
                key: key.to_string(),
            }),
            None => Err(RfxtrxError::MissingValue {
                id_string: self.device.id_string.clone(),
                key: key.to_string(),
            }),
        }
    }
}

/// Turns a configured packet id into a driver device
pub trait RfxObjectResolver {
    fn resolve(&self, packet_id: &PacketId) -> RfxtrxResult<RfxDevice>;
}

impl<F> RfxObjectResolver for F
where
    F: Fn(&PacketId) -> RfxtrxResult<RfxDevice>,
{
    fn resolve(&self, packet_id: &PacketId) -> RfxtrxResult<RfxDevice> {
        self(packet_id)
    }
}

//! Error types for the RFXtrx component

use thiserror::Error;

pub type RfxtrxResult<T> = Result<T, RfxtrxError>;

#[derive(Debug, Error)]
pub enum RfxtrxError {
    #[error("invalid packet id '{packet_id}': {reason}")]
    InvalidPacketId { packet_id: String, reason: String },

    /// The gateway driver could not turn a packet id into a device
    #[error("failed to resolve packet id '{packet_id}': {reason}")]
    Resolve { packet_id: String, reason: String },

    /// An event lacked a value its subscriber relies on
    #[error("event for device '{id_string}' has no '{key}' value")]
    MissingValue { id_string: String, key: String },

    #[error("event for device '{id_string}' has a non-text '{key}' value")]
    InvalidValue { id_string: String, key: String },

    #[error(transparent)]
    InvalidEntityId(#[from] ha_core::EntityIdError),

    #[error(transparent)]
    Config(#[from] ha_config::ConfigError),
}

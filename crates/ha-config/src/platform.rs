//! Per-platform configuration blocks
//!
//! Entity domains are configured as a list of platform blocks:
//!
//! ```yaml
//! switch:
//!   - platform: rfxtrx_multistate
//!     devices: {}
//! switch living_room:
//!   platform: rfxtrx_multistate
//! ```
//!
//! A domain key may carry a label after a space, and its value may be either a
//! single block or a list of blocks.

use crate::error::{ConfigError, ConfigResult};
use serde::de::DeserializeOwned;
use serde_yaml::Value;
use tracing::warn;

pub const CONF_PLATFORM: &str = "platform";

/// All blocks under `domain` whose `platform` is `platform`, in document order
pub fn platform_blocks<'a>(config: &'a Value, domain: &str, platform: &str) -> Vec<&'a Value> {
    let Some(root) = config.as_mapping() else {
        return Vec::new();
    };

    root.iter()
        .filter(|(key, _)| key.as_str().is_some_and(|k| is_domain_key(k, domain)))
        .flat_map(|(_, value)| match value {
            Value::Sequence(seq) => seq.iter().collect::<Vec<_>>(),
            Value::Null => Vec::new(),
            single => vec![single],
        })
        .filter(|block| match block.get(CONF_PLATFORM) {
            Some(Value::String(p)) => p == platform,
            _ => {
                warn!("Ignoring {} block without a platform", domain);
                false
            }
        })
        .collect()
}

/// Deserialize every matching block into the platform's config type
pub fn platform_configs<T: DeserializeOwned>(
    config: &Value,
    domain: &str,
    platform: &str,
) -> ConfigResult<Vec<T>> {
    platform_blocks(config, domain, platform)
        .into_iter()
        .map(|block| {
            serde_yaml::from_value(block.clone()).map_err(|source| ConfigError::InvalidPlatform {
                domain: domain.to_string(),
                platform: platform.to_string(),
                source,
            })
        })
        .collect()
}

fn is_domain_key(key: &str, domain: &str) -> bool {
    match key.strip_prefix(domain) {
        Some("") => true,
        Some(rest) => rest.starts_with(' '),
        None => false,
    }
}

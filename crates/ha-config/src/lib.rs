//! YAML configuration loading
//!
//! Loads `configuration.yaml` style files with the host's custom tags:
//!
//! - `!include path` - Include another YAML file
//! - `!secret key` - Substitute from secrets.yaml
//! - `!env_var VAR` - Environment variable substitution
//!
//! and pulls the `- platform: <name>` blocks of an entity domain out of the
//! loaded document, deserialized into whatever config type the platform uses.
//!
//! # Example
//!
//! ```ignore
//! use ha_config::{load_yaml, platform_configs};
//!
//! let config = load_yaml("/config", "configuration.yaml")?;
//! let blocks: Vec<MyPlatformConfig> = platform_configs(&config, "switch", "my_platform")?;
//! ```

mod error;
mod loader;
mod platform;
mod secrets;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_yaml, load_yaml_string, YamlLoader};
pub use platform::{platform_blocks, platform_configs, CONF_PLATFORM};
pub use secrets::Secrets;

pub use serde_yaml::Value;

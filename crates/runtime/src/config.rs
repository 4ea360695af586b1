//! Session configuration.
//!
//! Loaded from TOML, then optionally overridden from the environment.
use std::env;
use std::path::Path;

use capability_core::ReplicationRole;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Settings shared by every entity host of a session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Part this process plays in attachment replication.
    pub replication: ReplicationRole,

    /// Enables the developer attachment commands.
    pub dev_mode: bool,

    /// Ticks between cadence refreshes of attachment contexts.
    pub refresh_interval_ticks: u32,

    /// Number of equipment slots walked after the held object.
    pub equipment_slots: usize,

    /// Number of miscellaneous slots walked after equipment.
    pub misc_slots: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            replication: ReplicationRole::Standalone,
            dev_mode: false,
            refresh_interval_ticks: 1,
            equipment_slots: 10,
            misc_slots: 5,
        }
    }
}

impl SessionConfig {
    /// Defaults overridden by environment variables.
    ///
    /// Environment variables:
    /// - `CAPABILITY_REPLICATION` - `standalone`, `authority` or `remote`
    /// - `CAPABILITY_DEV_MODE` - `true` / `false`
    /// - `CAPABILITY_REFRESH_INTERVAL` - ticks between refreshes (min 1)
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Applies the `CAPABILITY_*` environment overrides on top of `self`.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(role) = read_env::<ReplicationRole>("CAPABILITY_REPLICATION") {
            self.replication = role;
        }
        if let Some(dev_mode) = read_env::<bool>("CAPABILITY_DEV_MODE") {
            self.dev_mode = dev_mode;
        }
        if let Some(interval) = read_env::<u32>("CAPABILITY_REFRESH_INTERVAL") {
            self.refresh_interval_ticks = interval.max(1);
        }
        self
    }

    /// Loads a TOML file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh_interval_ticks == 0 {
            return Err(ConfigError::InvalidValue {
                key: "refresh_interval_ticks",
                value: "0".into(),
            });
        }
        Ok(())
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = SessionConfig::from_toml(
            r#"
            replication = "authority"
            dev_mode = true
            "#,
        )
        .unwrap();

        assert_eq!(config.replication, ReplicationRole::Authority);
        assert!(config.dev_mode);
        assert_eq!(config.refresh_interval_ticks, 1);
        assert_eq!(config.equipment_slots, 10);
        assert_eq!(config.misc_slots, 5);
    }

    #[test]
    fn zero_refresh_interval_is_rejected() {
        let err = SessionConfig::from_toml("refresh_interval_ticks = 0").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "refresh_interval_ticks", .. }));
    }

    #[test]
    fn roles_parse_case_insensitively() {
        assert_eq!("Remote".parse::<ReplicationRole>().unwrap(), ReplicationRole::Remote);
        assert_eq!(ReplicationRole::Authority.to_string(), "authority");
    }
}

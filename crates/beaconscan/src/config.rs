//! Scanner configuration
//!
//! Defaults match a Raspberry Pi scanning from `hci0`. Any field can be
//! overridden through `BEACONSCAN_*` environment variables.

use crate::error::ConfigError;
use crate::hci::constants::LE_PUBLIC_ADDRESS;
use std::time::Duration;

pub const ENV_DEVICE: &str = "BEACONSCAN_DEVICE";
pub const ENV_RESET: &str = "BEACONSCAN_RESET";
pub const ENV_HOSTNAME: &str = "BEACONSCAN_HOSTNAME";
pub const ENV_FILTER_DUPLICATES: &str = "BEACONSCAN_FILTER_DUPLICATES";

/// LE Set Scan Parameters values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanParameters {
    /// 0 = passive, 1 = active
    pub scan_type: u8,
    /// In 0.625ms units
    pub interval: u16,
    /// In 0.625ms units
    pub window: u16,
    pub own_address_type: u8,
    pub filter_policy: u8,
}

impl Default for ScanParameters {
    fn default() -> Self {
        Self {
            scan_type: 0x00,
            interval: 0x0010,
            window: 0x0010,
            own_address_type: LE_PUBLIC_ADDRESS,
            filter_policy: 0x00,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannerConfig {
    pub device_id: u16,
    /// Power-cycle the adapter before scanning
    pub reset_adapter: bool,
    pub scan: ScanParameters,
    pub filter_duplicates: bool,
    /// How long to wait for each HCI command to complete
    pub command_timeout: Duration,
    /// Overrides the system hostname in output lines
    pub hostname: Option<String>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            device_id: 0,
            reset_adapter: true,
            scan: ScanParameters::default(),
            filter_duplicates: true,
            command_timeout: Duration::from_millis(10_000),
            hostname: None,
        }
    }
}

impl ScannerConfig {
    /// Defaults overlaid with the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with whatever `lookup` returns for each variable
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_DEVICE) {
            config.device_id = parse_device(&value).ok_or(ConfigError::InvalidValue {
                key: ENV_DEVICE,
                value,
            })?;
        }

        if let Some(value) = lookup(ENV_RESET) {
            config.reset_adapter = parse_bool(&value).ok_or(ConfigError::InvalidValue {
                key: ENV_RESET,
                value,
            })?;
        }

        if let Some(value) = lookup(ENV_FILTER_DUPLICATES) {
            config.filter_duplicates = parse_bool(&value).ok_or(ConfigError::InvalidValue {
                key: ENV_FILTER_DUPLICATES,
                value,
            })?;
        }

        if let Some(value) = lookup(ENV_HOSTNAME) {
            if value.is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: ENV_HOSTNAME,
                    value,
                });
            }
            config.hostname = Some(value);
        }

        Ok(config)
    }
}

/// Accepts `0` or `hci0`
fn parse_device(value: &str) -> Option<u16> {
    let value = value.trim();
    value.strip_prefix("hci").unwrap_or(value).parse().ok()
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

//! Device and transport configuration.
//!
//! Loaded from a YAML file:
//!
//! ```yaml
//! transport:
//!   kind: rtu
//!   port: /dev/ttyUSB0
//!   baud_rate: 9600
//! devices:
//!   - name: pump
//!     slave: 1
//!     read_function: auto
//!     divisors: { frequency: 100, current: 100, voltage: 10, temperature: 1 }
//! ```

use std::{collections::HashSet, net::SocketAddr, num::NonZeroU16, path::Path, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::codec::Address;
use crate::core::ReadFunction;
use crate::error::ConfigError;
use crate::registers::{
    DEFAULT_ADDR_BASE, DEFAULT_CURRENT_DIV, DEFAULT_FREQUENCY_DIV, DEFAULT_TEMPERATURE_DIV,
    DEFAULT_VOLTAGE_DIV,
};

const fn non_zero(value: u16) -> NonZeroU16 {
    match NonZeroU16::new(value) {
        Some(value) => value,
        None => panic!("divisor must be non-zero"),
    }
}

/// Scaling divisors, engineering value = raw / divisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Divisors {
    pub frequency: NonZeroU16,
    pub current: NonZeroU16,
    pub voltage: NonZeroU16,
    pub temperature: NonZeroU16,
}

impl Default for Divisors {
    fn default() -> Self {
        Self {
            frequency: non_zero(DEFAULT_FREQUENCY_DIV),
            current: non_zero(DEFAULT_CURRENT_DIV),
            voltage: non_zero(DEFAULT_VOLTAGE_DIV),
            temperature: non_zero(DEFAULT_TEMPERATURE_DIV),
        }
    }
}

/// One physical inverter on the bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub name: String,
    /// Modbus slave address, 1..=247.
    pub slave: u8,
    /// `40001` for 4xxxx notation, `0` when the map holds protocol addresses.
    pub addr_base: Address,
    pub divisors: Divisors,
    pub read_function: ReadFunction,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: "vfd".to_string(),
            slave: 1,
            addr_base: DEFAULT_ADDR_BASE,
            divisors: Divisors::default(),
            read_function: ReadFunction::Auto,
        }
    }
}

impl DeviceConfig {
    /// Default configuration for the inverter at `slave`.
    pub fn new(slave: u8) -> Result<Self, ConfigError> {
        let config = Self {
            slave,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=247).contains(&self.slave) {
            return Err(ConfigError::InvalidSlave {
                name: self.name.clone(),
                slave: self.slave,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    None,
    Odd,
    Even,
}

/// RS485 line settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    pub port: String,
    pub baud_rate: u32,
    /// 5 to 8.
    pub data_bits: u8,
    pub parity: Parity,
    /// 1 or 2.
    pub stop_bits: u8,
    pub timeout_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 9600,
            data_bits: 8,
            parity: Parity::None,
            stop_bits: 1,
            timeout_ms: 1000,
        }
    }
}

/// Serial-to-TCP gateway passing RTU frames through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub address: SocketAddr,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    1000
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TransportConfig {
    Rtu(SerialConfig),
    Tcp(GatewayConfig),
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig::Rtu(SerialConfig::default())
    }
}

impl TransportConfig {
    pub fn timeout(&self) -> Duration {
        match self {
            TransportConfig::Rtu(serial) => Duration::from_millis(serial.timeout_ms),
            TransportConfig::Tcp(gateway) => Duration::from_millis(gateway.timeout_ms),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub transport: TransportConfig,
    pub devices: Vec<DeviceConfig>,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        debug!(path = %path.display(), "loading config");
        let contents = std::fs::read_to_string(path)?;
        contents.parse()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.devices.is_empty() {
            return Err(ConfigError::NoDevices);
        }
        let mut names = HashSet::new();
        for device in &self.devices {
            device.validate()?;
            if !names.insert(device.name.as_str()) {
                return Err(ConfigError::DuplicateDevice(device.name.clone()));
            }
        }
        Ok(())
    }

    /// The device called `name`, or the first one when `name` is `None`.
    pub fn device(&self, name: Option<&str>) -> Result<&DeviceConfig, ConfigError> {
        match name {
            Some(name) => self
                .devices
                .iter()
                .find(|device| device.name == name)
                .ok_or_else(|| ConfigError::UnknownDevice(name.to_string())),
            None => self.devices.first().ok_or(ConfigError::NoDevices),
        }
    }
}

impl std::str::FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: Config = serde_yml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}

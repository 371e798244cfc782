//! Telemetry reads and command writes for one inverter.
//!
//! Every operation addresses `config.slave` first, so a single transport can be shared
//! between several inverters on the same bus as long as calls are made one after another.

use std::fmt;

use serde::Serialize;
use tokio_modbus::slave::Slave;
use tracing::{debug, warn};

use crate::codec::{scale, unscale, Address, Word};
use crate::config::{DeviceConfig, Divisors};
use crate::core::{read_block, read_registers, Transport};
use crate::error::TransportError;
use crate::registers::{
    to_protocol_addr, StatusBlock, CONTROL_WORD, FAULT_CLEAR, FAULT_CODE, FREQUENCY_SETPOINT,
};

/// Control word that starts the motor with the factory P103 bit layout.
pub const CONTROL_RUN: Word = 0x0001;
/// Control word that stops the motor.
pub const CONTROL_STOP: Word = 0x0000;

/// Snapshot of one telemetry read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Telemetry {
    /// `0` when the fault register could not be read.
    pub fault_code: u16,
    pub status_dir: u16,
    pub set_freq_raw: u16,
    pub running_freq_raw: u16,
    pub running_curr_raw: u16,
    pub dc_bus_volt_raw: u16,
    pub temperature_raw: u16,

    pub set_freq_hz: f32,
    pub running_freq_hz: f32,
    pub running_curr_a: f32,
    pub dc_bus_volt_v: f32,
    pub temperature_c: f32,
}

impl Telemetry {
    pub fn from_raw(block: &StatusBlock, fault_code: u16, divisors: &Divisors) -> Self {
        Self {
            fault_code,
            status_dir: block.status_dir,
            set_freq_raw: block.set_freq,
            running_freq_raw: block.running_freq,
            running_curr_raw: block.running_curr,
            dc_bus_volt_raw: block.dc_bus_volt,
            temperature_raw: block.temperature,
            set_freq_hz: scale(block.set_freq, divisors.frequency),
            running_freq_hz: scale(block.running_freq, divisors.frequency),
            running_curr_a: scale(block.running_curr, divisors.current),
            dc_bus_volt_v: scale(block.dc_bus_volt, divisors.voltage),
            temperature_c: scale(block.temperature, divisors.temperature),
        }
    }
}

impl fmt::Display for Telemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Status word:       0x{:04X}", self.status_dir)?;
        writeln!(f, "Set frequency:     {:.2} Hz", self.set_freq_hz)?;
        writeln!(f, "Running frequency: {:.2} Hz", self.running_freq_hz)?;
        writeln!(f, "Running current:   {:.2} A", self.running_curr_a)?;
        writeln!(f, "DC bus voltage:    {:.1} V", self.dc_bus_volt_v)?;
        writeln!(f, "Temperature:       {:.1} °C", self.temperature_c)?;
        write!(f, "Fault code:        {}", self.fault_code)
    }
}

/// Point the transport at `config.slave`, refusing the broadcast and reserved ids.
fn address<T: Transport + ?Sized>(
    transport: &mut T,
    config: &DeviceConfig,
) -> Result<(), TransportError> {
    if !(1..=247).contains(&config.slave) {
        return Err(TransportError::InvalidSlave(config.slave));
    }
    transport.set_slave(Slave(config.slave));
    Ok(())
}

/// Read the status block and the fault code of the inverter.
///
/// Fails only when the status block cannot be read, using the configured read function
/// (with its FC04 fallback in auto mode). A failed fault-code read is logged and reported
/// as fault code `0`.
pub async fn read_telemetry<T: Transport + ?Sized>(
    transport: &mut T,
    config: &DeviceConfig,
) -> Result<Telemetry, TransportError> {
    address(transport, config)?;

    let block: StatusBlock =
        read_block(transport, config.read_function, config.addr_base).await?;

    let fault_addr = to_protocol_addr(FAULT_CODE, config.addr_base);
    let fault_code = match read_registers(transport, config.read_function, fault_addr, 1).await {
        Ok(words) => words[0],
        Err(err) => {
            warn!(slave = config.slave, %err, "fault code read failed, assuming no fault");
            0
        }
    };

    Ok(Telemetry::from_raw(&block, fault_code, &config.divisors))
}

async fn write_register<T: Transport + ?Sized>(
    transport: &mut T,
    config: &DeviceConfig,
    logical: Address,
    word: Word,
) -> Result<(), TransportError> {
    address(transport, config)?;
    let addr = to_protocol_addr(logical, config.addr_base);
    debug!(slave = config.slave, addr, word, "writing register");
    transport.write_single_register(addr, word).await??;
    Ok(())
}

/// Write the raw operation word (P103). The bit layout is device specific and passed through.
pub async fn write_control_word<T: Transport + ?Sized>(
    transport: &mut T,
    config: &DeviceConfig,
    word: Word,
) -> Result<(), TransportError> {
    write_register(transport, config, CONTROL_WORD, word).await
}

/// Write an already scaled frequency setpoint (P102), e.g. `5000` for 50 Hz with divisor 100.
pub async fn write_frequency_setpoint<T: Transport + ?Sized>(
    transport: &mut T,
    config: &DeviceConfig,
    raw: Word,
) -> Result<(), TransportError> {
    write_register(transport, config, FREQUENCY_SETPOINT, raw).await
}

/// Write a frequency setpoint in Hz, scaled with the frequency divisor and truncated.
pub async fn write_frequency_hz<T: Transport + ?Sized>(
    transport: &mut T,
    config: &DeviceConfig,
    hz: f32,
) -> Result<(), TransportError> {
    let raw = unscale(hz, config.divisors.frequency);
    write_frequency_setpoint(transport, config, raw).await
}

pub async fn clear_fault<T: Transport + ?Sized>(
    transport: &mut T,
    config: &DeviceConfig,
) -> Result<(), TransportError> {
    write_register(transport, config, FAULT_CLEAR, 1).await
}

pub async fn start<T: Transport + ?Sized>(
    transport: &mut T,
    config: &DeviceConfig,
) -> Result<(), TransportError> {
    write_control_word(transport, config, CONTROL_RUN).await
}

pub async fn stop<T: Transport + ?Sized>(
    transport: &mut T,
    config: &DeviceConfig,
) -> Result<(), TransportError> {
    write_control_word(transport, config, CONTROL_STOP).await
}

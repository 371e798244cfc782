//! VPC-M0701S register map in 4xxxx notation.

use crate::codec::Address;
use crate::derive::{modbus_doc, RegisterBlock};

/// Base that turns 4xxxx notation into zero-based protocol addresses.
pub const DEFAULT_ADDR_BASE: Address = 40001;

// Status registers, read with FC03 or FC04
pub const RUNNING_STATUS: Address = 40180;
pub const SET_FREQUENCY: Address = 40181;
pub const RUNNING_FREQUENCY: Address = 40182;
pub const RUNNING_CURRENT: Address = 40183;
pub const DC_BUS_VOLTAGE: Address = 40184;
pub const TEMPERATURE: Address = 40185;
pub const FAULT_CODE: Address = 40189;
/// Writing a value >= 1 clears the active fault.
pub const FAULT_CLEAR: Address = 40198;

/// Parameter P00.
pub const PARAM_BASE: Address = 40000;
/// P102, RS485 frequency setpoint.
pub const FREQUENCY_SETPOINT: Address = PARAM_BASE + 102;
/// P103, RS485 operation bits.
pub const CONTROL_WORD: Address = PARAM_BASE + 103;

pub const DEFAULT_FREQUENCY_DIV: u16 = 100;
pub const DEFAULT_CURRENT_DIV: u16 = 100;
pub const DEFAULT_VOLTAGE_DIV: u16 = 10;
pub const DEFAULT_TEMPERATURE_DIV: u16 = 1;

/// Convert a logical address to a protocol address.
///
/// Addresses at or above `base` are shifted down by `base`, lower ones are taken to be
/// protocol addresses already and pass through.
pub const fn to_protocol_addr(logical: Address, base: Address) -> Address {
    if logical >= base {
        logical - base
    } else {
        logical
    }
}

/// Raw status block read in one request.
#[modbus_doc]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, RegisterBlock)]
pub struct StatusBlock {
    /// Running status and direction bits, device specific.
    #[modbus(addr = 40180)]
    pub status_dir: u16,
    #[modbus(addr = 40181, unit = "Hz")]
    pub set_freq: u16,
    #[modbus(addr = 40182, unit = "Hz")]
    pub running_freq: u16,
    #[modbus(addr = 40183, unit = "A")]
    pub running_curr: u16,
    #[modbus(addr = 40184, unit = "V")]
    pub dc_bus_volt: u16,
    #[modbus(addr = 40185, unit = "°C")]
    pub temperature: u16,
}

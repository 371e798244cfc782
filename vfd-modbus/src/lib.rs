//! Modbus RTU driver for VPC-M0701S variable-frequency drives, based on [tokio-modbus](https://github.com/slowtec/tokio-modbus).
//!
//! ## Operations
//!
//! [`drive`] reads telemetry and writes commands for one inverter described by a
//! [`config::DeviceConfig`]:
//!
//! - [`drive::read_telemetry`] reads the status block (40180..=40185) and the fault code (40189),
//! - [`drive::write_control_word`], [`drive::write_frequency_setpoint`], [`drive::write_frequency_hz`]
//!   and [`drive::clear_fault`] write single registers.
//!
//! The operations take the transport as an explicit `&mut` argument. Any [`core::Transport`]
//! works: a tokio-modbus [`tokio_modbus::client::Context`], the [`transport::Timeout`] wrapper
//! returned by [`transport::open`], or the in-memory [`simulator::SimulatedDrive`].
//!
//! ## Addresses
//!
//! The register map uses 4xxxx notation. Each device converts it with its `addr_base`:
//! addresses at or above the base are shifted down by it, lower ones are sent unchanged.
//! A base of `40001` therefore maps 40180 to protocol address 179, a base of `0` sends raw
//! addresses.
//!
//! ## Reads
//!
//! Reads use FC03, FC04, or FC03 with a single FC04 retry, depending on
//! [`core::ReadFunction`]. Firmware revisions differ in which code serves the status
//! registers; the same layout is assumed for both.
//!
//! ## Derive macro
//!
//! [`derive::RegisterBlock`] implements [`core::RegisterBlock`] for a struct whose fields carry
//! a `modbus` attribute:
//! - `addr` - logical address of the first register, `u16` integer,
//! - `unit` - optional measurement unit, used by `modbus_doc`.
//!
//! The field type (`u16`, `i16`, `u32` or `i32`) sets the number of registers.
//! The `modbus_doc` attribute is to create documentation (by adding doc attribute) from `modbus` field attributes information.

extern crate self as vfd_modbus;

/// Utilities for decoding and scaling register values
pub mod codec;
/// Holding register command image for Modbus TCP bridges
pub mod command;
pub mod config;
/// Transport trait and function code selection
pub mod core;
pub mod drive;
pub mod error;
pub mod registers;
/// In-memory inverter for tests and dry runs
pub mod simulator;
/// tokio-modbus transports
pub mod transport;

pub mod derive {
    /// Re-export.
    pub use vfd_modbus_derive::{modbus_doc, RegisterBlock};
}

pub use crate::config::{Config, DeviceConfig, Divisors};
pub use crate::core::{ReadFunction, Transport};
pub use crate::drive::Telemetry;
pub use crate::error::{ConfigError, TransportError};

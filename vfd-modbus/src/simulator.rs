use std::collections::HashMap;

use async_trait::async_trait;
use tokio_modbus::{slave::Slave, Exception, Request};
use tracing::debug;

use crate::codec::{Address, Quantity, Word};
use crate::config::DeviceConfig;
use crate::core::{ReadFunction, Transport};
use crate::registers::{
    to_protocol_addr, StatusBlock, CONTROL_WORD, FAULT_CLEAR, FAULT_CODE, FREQUENCY_SETPOINT,
    RUNNING_STATUS, SET_FREQUENCY,
};

#[derive(Debug, Clone, Default)]
/// A raw Modbus register table
pub struct Registers(HashMap<Address, Word>);

impl Registers {
    /// Insert new consecutive registers with `words` values starting at `addr` address.
    pub fn insert(&mut self, addr: Address, words: Vec<Word>) {
        for (i, value) in words.into_iter().enumerate() {
            let reg_addr = addr + i as Address;
            self.0.insert(reg_addr, value);
        }
    }

    pub fn get(&self, addr: Address) -> Option<Word> {
        self.0.get(&addr).copied()
    }

    /// Read `cnt` consecutive registers starting at `addr`.
    pub fn read(&self, addr: Address, cnt: Quantity) -> Result<Vec<Word>, Exception> {
        (0..cnt)
            .map(|i| {
                addr.checked_add(i)
                    .and_then(|reg_addr| self.get(reg_addr))
                    .ok_or(Exception::IllegalDataAddress)
            })
            .collect()
    }

    /// Write `words` into existing consecutive registers starting at `addr`.
    pub fn write(&mut self, addr: Address, words: &[Word]) -> Result<(), Exception> {
        let reg_addrs = (0..words.len())
            .map(|i| {
                Address::try_from(i)
                    .ok()
                    .and_then(|i| addr.checked_add(i))
                    .filter(|reg_addr| self.0.contains_key(reg_addr))
                    .ok_or(Exception::IllegalDataAddress)
            })
            .collect::<Result<Vec<_>, _>>()?;
        for (reg_addr, value) in reg_addrs.into_iter().zip(words) {
            self.0.insert(reg_addr, *value);
        }
        Ok(())
    }
}

/// In-memory inverter answering [`Transport`] requests.
///
/// Reads of missing registers answer `IllegalDataAddress`. Requests addressed to another
/// slave, or sent while [`SimulatedDrive::offline`] is set, get no answer and fail like a
/// timed out exchange. Every request is logged, see [`SimulatedDrive::requests`].
#[derive(Debug, Clone)]
pub struct SimulatedDrive {
    slave: u8,
    addressed: Option<Slave>,
    /// Base of the VPC-M0701S map when the drive reacts to fault clear and setpoint writes.
    behaviour: Option<Address>,
    pub holding_registers: Registers,
    pub input_registers: Registers,
    pub offline: bool,
    requests: Vec<Request<'static>>,
}

impl SimulatedDrive {
    /// Drive at `slave` with empty register tables.
    pub fn new(slave: u8) -> Self {
        Self {
            slave,
            addressed: None,
            behaviour: None,
            holding_registers: Registers::default(),
            input_registers: Registers::default(),
            offline: false,
            requests: Vec::new(),
        }
    }

    /// VPC-M0701S laid out for `config`, exposing the status block and fault code through
    /// `exposed`: holding registers, input registers, or both for `Auto`.
    ///
    /// Writing >= 1 to the fault clear register zeroes the fault code, writing the frequency
    /// setpoint updates the set frequency status register.
    pub fn vpc_m0701s(
        config: &DeviceConfig,
        block: StatusBlock,
        fault_code: Word,
        exposed: ReadFunction,
    ) -> Self {
        let base = config.addr_base;
        let status = vec![
            block.status_dir,
            block.set_freq,
            block.running_freq,
            block.running_curr,
            block.dc_bus_volt,
            block.temperature,
        ];

        let mut drive = Self::new(config.slave);
        drive.behaviour = Some(base);
        if exposed != ReadFunction::Input {
            drive
                .holding_registers
                .insert(to_protocol_addr(RUNNING_STATUS, base), status.clone());
            drive
                .holding_registers
                .insert(to_protocol_addr(FAULT_CODE, base), vec![fault_code]);
        }
        if exposed != ReadFunction::Holding {
            drive
                .input_registers
                .insert(to_protocol_addr(RUNNING_STATUS, base), status);
            drive
                .input_registers
                .insert(to_protocol_addr(FAULT_CODE, base), vec![fault_code]);
        }
        for logical in [FREQUENCY_SETPOINT, CONTROL_WORD, FAULT_CLEAR] {
            drive
                .holding_registers
                .insert(to_protocol_addr(logical, base), vec![0]);
        }
        drive
    }

    /// Requests received so far, including unanswered ones.
    pub fn requests(&self) -> &[Request<'static>] {
        &self.requests
    }

    pub fn clear_requests(&mut self) {
        self.requests.clear();
    }

    fn receive(&mut self, request: Request<'static>) -> Result<(), tokio_modbus::Error> {
        debug!(?request, "simulator request");
        self.requests.push(request);
        if self.offline || self.addressed != Some(Slave(self.slave)) {
            return Err(tokio_modbus::Error::Transport(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "no response from slave",
            )));
        }
        Ok(())
    }

    fn update_state(&mut self, addr: Address, word: Word) {
        let Some(base) = self.behaviour else {
            return;
        };
        if addr == to_protocol_addr(FAULT_CLEAR, base) && word >= 1 {
            let fault_addr = to_protocol_addr(FAULT_CODE, base);
            for registers in [&mut self.holding_registers, &mut self.input_registers] {
                let _ = registers.write(fault_addr, &[0]);
            }
        } else if addr == to_protocol_addr(FREQUENCY_SETPOINT, base) {
            let set_addr = to_protocol_addr(SET_FREQUENCY, base);
            for registers in [&mut self.holding_registers, &mut self.input_registers] {
                let _ = registers.write(set_addr, &[word]);
            }
        }
    }
}

#[async_trait]
impl Transport for SimulatedDrive {
    fn set_slave(&mut self, slave: Slave) {
        self.addressed = Some(slave);
    }

    async fn read_holding_registers(
        &mut self,
        addr: Address,
        cnt: Quantity,
    ) -> tokio_modbus::Result<Vec<Word>> {
        self.receive(Request::ReadHoldingRegisters(addr, cnt))?;
        Ok(self.holding_registers.read(addr, cnt))
    }

    async fn read_input_registers(
        &mut self,
        addr: Address,
        cnt: Quantity,
    ) -> tokio_modbus::Result<Vec<Word>> {
        self.receive(Request::ReadInputRegisters(addr, cnt))?;
        Ok(self.input_registers.read(addr, cnt))
    }

    async fn write_single_register(
        &mut self,
        addr: Address,
        word: Word,
    ) -> tokio_modbus::Result<()> {
        self.receive(Request::WriteSingleRegister(addr, word))?;
        let result = self.holding_registers.write(addr, std::slice::from_ref(&word));
        if result.is_ok() {
            self.update_state(addr, word);
        }
        Ok(result)
    }
}

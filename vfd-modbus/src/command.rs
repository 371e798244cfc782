//! Register image of one inverter for a Modbus TCP bridge.
//!
//! Each slave gets a window of 100 registers starting at `(slave - 1) * 100`. The input
//! registers of the window carry [`Telemetry::mirror_words`], the first three holding
//! registers carry commands.

use crate::codec::{Address, Word};
use crate::config::DeviceConfig;
use crate::core::Transport;
use crate::drive::{self, Telemetry};
use crate::error::TransportError;

/// Registers reserved per slave in the mirror.
pub const MIRROR_WINDOW: Address = 100;
/// Bit in the flags word requesting a fault clear.
pub const FLAG_CLEAR_FAULT: Word = 0x0002;

// Holding register offsets in the window
pub const HOLDING_CONTROL_WORD: usize = 0;
pub const HOLDING_SET_FREQUENCY: usize = 1;
pub const HOLDING_FLAGS: usize = 2;

/// First register of the window of `slave`.
pub fn mirror_base(slave: u8) -> Address {
    Address::from(slave.saturating_sub(1)) * MIRROR_WINDOW
}

impl Telemetry {
    /// Input register image: fault, status, set frequency, running frequency, current,
    /// DC bus voltage and temperature, all raw.
    pub fn mirror_words(&self) -> [Word; 7] {
        [
            self.fault_code,
            self.status_dir,
            self.set_freq_raw,
            self.running_freq_raw,
            self.running_curr_raw,
            self.dc_bus_volt_raw,
            self.temperature_raw,
        ]
    }
}

/// Command issued to the inverter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Raw P103 operation word.
    ControlWord(Word),
    /// Raw, already scaled P102 setpoint.
    SetFrequency(Word),
    ClearFault,
}

impl Command {
    /// Commands requested by the holding register image of one window.
    ///
    /// Control word and setpoint are always forwarded, the fault clear only when its flag
    /// is set. They are returned in the order they should be written.
    pub fn from_holding_words(words: &[Word; 3]) -> Vec<Command> {
        let mut commands = vec![
            Command::ControlWord(words[HOLDING_CONTROL_WORD]),
            Command::SetFrequency(words[HOLDING_SET_FREQUENCY]),
        ];
        if words[HOLDING_FLAGS] & FLAG_CLEAR_FAULT != 0 {
            commands.push(Command::ClearFault);
        }
        commands
    }

    pub async fn execute<T: Transport + ?Sized>(
        self,
        transport: &mut T,
        config: &DeviceConfig,
    ) -> Result<(), TransportError> {
        match self {
            Command::ControlWord(word) => drive::write_control_word(transport, config, word).await,
            Command::SetFrequency(raw) => {
                drive::write_frequency_setpoint(transport, config, raw).await
            }
            Command::ClearFault => drive::clear_fault(transport, config).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirror_base() {
        assert_eq!(mirror_base(1), 0);
        assert_eq!(mirror_base(2), 100);
        assert_eq!(mirror_base(4), 300);
    }

    #[test]
    fn test_mirror_words_order() {
        let telemetry = Telemetry {
            fault_code: 9,
            status_dir: 3,
            set_freq_raw: 5000,
            running_freq_raw: 4950,
            running_curr_raw: 120,
            dc_bus_volt_raw: 3600,
            temperature_raw: 45,
            ..Default::default()
        };
        assert_eq!(
            telemetry.mirror_words(),
            [9, 3, 5000, 4950, 120, 3600, 45]
        );
    }

    #[test]
    fn test_from_holding_words() {
        assert_eq!(
            Command::from_holding_words(&[1, 5000, 0]),
            vec![Command::ControlWord(1), Command::SetFrequency(5000)]
        );
        assert_eq!(
            Command::from_holding_words(&[0, 0, 0x0003]),
            vec![
                Command::ControlWord(0),
                Command::SetFrequency(0),
                Command::ClearFault
            ]
        );
        assert_eq!(Command::from_holding_words(&[0, 0, 0x0001]).len(), 2);
    }
}

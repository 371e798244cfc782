use crate::codec::WordsCountError;

/// Failure of a register exchange.
///
/// This is the only error the drive operations return. The variants keep the cause for
/// diagnostics; a device answering with an exception and a device not answering at all
/// are both just a failed exchange to the caller.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("modbus exchange failed: {0}")]
    Modbus(#[from] tokio_modbus::Error),
    #[error("device answered with exception: {0}")]
    Exception(#[from] tokio_modbus::Exception),
    #[error("unexpected response length: {0}")]
    ResponseLength(#[from] WordsCountError),
    #[error("slave address {0} outside 1..=247")]
    InvalidSlave(u8),
}

/// Invalid or unreadable configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_yml::Error),
    #[error("device `{name}`: slave address {slave} outside 1..=247")]
    InvalidSlave { name: String, slave: u8 },
    #[error("read function selector {0} is not one of 0 (auto), 3 or 4")]
    InvalidReadFunction(u8),
    #[error("read function `{0}` is not one of holding, input, auto, fc03 or fc04")]
    UnknownReadFunction(String),
    #[error("no devices configured")]
    NoDevices,
    #[error("device `{0}` configured more than once")]
    DuplicateDevice(String),
    #[error("no device named `{0}`")]
    UnknownDevice(String),
}

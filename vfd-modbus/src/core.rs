use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_modbus::slave::Slave;
use tracing::{debug, warn};

use crate::codec::{Address, Quantity, Word, WordsCountError};
use crate::error::{ConfigError, TransportError};
use crate::registers::to_protocol_addr;

#[async_trait]
/// Modbus master seen by the drive operations.
///
/// Framing, CRC and serial timing live behind this trait. Results follow
/// `tokio_modbus::Result`: the outer error is a failed exchange, the inner one an exception
/// response. Implementations do no locking, the `&mut self` receiver keeps one exchange in
/// flight per transport.
pub trait Transport: Send {
    /// Address all following requests to `slave`.
    fn set_slave(&mut self, slave: Slave);

    /// FC03
    async fn read_holding_registers(
        &mut self,
        addr: Address,
        cnt: Quantity,
    ) -> tokio_modbus::Result<Vec<Word>>;

    /// FC04
    async fn read_input_registers(
        &mut self,
        addr: Address,
        cnt: Quantity,
    ) -> tokio_modbus::Result<Vec<Word>>;

    /// FC06
    async fn write_single_register(&mut self, addr: Address, word: Word)
        -> tokio_modbus::Result<()>;
}

/// Function code used for register reads.
///
/// Deserialises from `holding`/`fc03`, `input`/`fc04`, `auto`, or the numeric selector
/// `3`, `4` and `0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "ReadFunctionRepr")]
pub enum ReadFunction {
    /// FC03, read holding registers.
    Holding,
    /// FC04, read input registers.
    Input,
    /// FC03 first, a single FC04 retry when it fails.
    #[default]
    Auto,
}

impl TryFrom<u8> for ReadFunction {
    type Error = ConfigError;

    /// Numeric selector used by older configurations: `3`, `4`, or `0` for auto.
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ReadFunction::Auto),
            3 => Ok(ReadFunction::Holding),
            4 => Ok(ReadFunction::Input),
            other => Err(ConfigError::InvalidReadFunction(other)),
        }
    }
}

impl std::str::FromStr for ReadFunction {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "holding" | "fc03" => Ok(ReadFunction::Holding),
            "input" | "fc04" => Ok(ReadFunction::Input),
            "auto" => Ok(ReadFunction::Auto),
            _ => Err(ConfigError::UnknownReadFunction(s.to_string())),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ReadFunctionRepr {
    Selector(u8),
    Name(String),
}

impl TryFrom<ReadFunctionRepr> for ReadFunction {
    type Error = ConfigError;

    fn try_from(value: ReadFunctionRepr) -> Result<Self, Self::Error> {
        match value {
            ReadFunctionRepr::Selector(selector) => selector.try_into(),
            ReadFunctionRepr::Name(name) => name.parse(),
        }
    }
}

async fn read_with<T: Transport + ?Sized>(
    transport: &mut T,
    function: ReadFunction,
    addr: Address,
    cnt: Quantity,
) -> Result<Vec<Word>, TransportError> {
    debug!(?function, addr, cnt, "reading registers");
    let words = match function {
        ReadFunction::Input => transport.read_input_registers(addr, cnt).await??,
        _ => transport.read_holding_registers(addr, cnt).await??,
    };
    if words.len() != cnt as usize {
        return Err(WordsCountError {
            expected: cnt as usize,
            actual: words.len(),
        }
        .into());
    }
    Ok(words)
}

/// Read `cnt` consecutive registers starting at protocol address `addr`.
///
/// In [`ReadFunction::Auto`] mode any FC03 failure is retried exactly once with FC04 and
/// only the FC04 outcome is returned. The words are used as-is whichever code answered.
pub async fn read_registers<T: Transport + ?Sized>(
    transport: &mut T,
    function: ReadFunction,
    addr: Address,
    cnt: Quantity,
) -> Result<Vec<Word>, TransportError> {
    match function {
        ReadFunction::Holding | ReadFunction::Input => {
            read_with(transport, function, addr, cnt).await
        }
        ReadFunction::Auto => match read_with(transport, ReadFunction::Holding, addr, cnt).await {
            Ok(words) => Ok(words),
            Err(err) => {
                warn!(addr, cnt, %err, "FC03 read failed, retrying with FC04");
                read_with(transport, ReadFunction::Input, addr, cnt).await
            }
        },
    }
}

/// Contiguous run of registers decoded in one request.
///
/// Usually implemented with `#[derive(RegisterBlock)]`, see [`crate::derive`].
pub trait RegisterBlock: Sized {
    /// Logical address of the first register.
    const START: Address;
    /// Number of registers in the block.
    const COUNT: Quantity;

    fn from_words(words: &[Word]) -> Result<Self, WordsCountError>;
}

/// Read and decode a whole [`RegisterBlock`], converting its logical start with `addr_base`.
pub async fn read_block<B: RegisterBlock, T: Transport + ?Sized>(
    transport: &mut T,
    function: ReadFunction,
    addr_base: Address,
) -> Result<B, TransportError> {
    let addr = to_protocol_addr(B::START, addr_base);
    let words = read_registers(transport, function, addr, B::COUNT).await?;
    Ok(B::from_words(&words)?)
}

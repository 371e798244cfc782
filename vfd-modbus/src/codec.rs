use std::num::NonZeroU16;

pub use tokio_modbus::{Address, Quantity};

/// 16-bit value stored in Modbus register.
pub type Word = u16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("expected {expected} words, got {actual}")]
pub struct WordsCountError {
    pub expected: usize,
    pub actual: usize,
}

/// Decode a value from Big Endian-ordered `Word`s.
pub trait Decode: Sized {
    fn from_be_words(words: &[Word]) -> Result<Self, WordsCountError>;
}

macro_rules! impl_decode {
    ($num_type:ty) => {
        impl Decode for $num_type {
            fn from_be_words(words: &[Word]) -> Result<Self, WordsCountError> {
                let expected = std::mem::size_of::<$num_type>() / 2;
                let bytes = words
                    .iter()
                    .copied()
                    .flat_map(u16::to_be_bytes)
                    .collect::<Vec<u8>>();
                let array = bytes.try_into().or(Err(WordsCountError {
                    expected,
                    actual: words.len(),
                }))?;
                Ok(<$num_type>::from_be_bytes(array))
            }
        }
    };
}

impl_decode!(i16);
impl_decode!(u16);
impl_decode!(i32);
impl_decode!(u32);

/// Convert a raw register value to engineering units: `raw / divisor`.
pub fn scale(raw: Word, divisor: NonZeroU16) -> f32 {
    raw as f32 / divisor.get() as f32
}

/// Convert an engineering value to a raw register value: `value * divisor`.
///
/// The product is truncated toward zero and saturates at the `u16` bounds, NaN maps to `0`.
/// A value that is not exactly representable in `f32` can therefore come back one step low.
pub fn unscale(value: f32, divisor: NonZeroU16) -> Word {
    (value * divisor.get() as f32) as Word
}

//! The word-sized value container
//!
//! A `Word` is 8 raw bytes with no inherent interpretation. Views exist for
//! the signed, unsigned, and floating point readings; the hex view makes the
//! byte order explicit. Words are immutable once constructed.

use crate::types::WORD_SIZE;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Byte order used when viewing a `Word` as an integer or hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

/// Fixed 8-byte value, the IR's sole scalar storage unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Word {
    bytes: [u8; WORD_SIZE],
}

impl Word {
    pub fn new(bytes: [u8; WORD_SIZE]) -> Word {
        Word { bytes }
    }

    /// Construct from a signed 64-bit value (stored little-endian).
    pub fn from_i64(value: i64) -> Word {
        Word {
            bytes: value.to_le_bytes(),
        }
    }

    /// Construct from an unsigned 64-bit value (stored little-endian).
    pub fn from_ui64(value: u64) -> Word {
        Word {
            bytes: value.to_le_bytes(),
        }
    }

    /// Construct from a 32-bit float bit pattern, placed in the low half of
    /// the word.
    pub fn from_f32(value: f32) -> Word {
        Word::from_ui64(value.to_bits() as u64)
    }

    /// Construct from a 64-bit float bit pattern.
    pub fn from_f64(value: f64) -> Word {
        Word::from_ui64(value.to_bits())
    }

    pub fn as_i64(&self) -> i64 {
        i64::from_le_bytes(self.bytes)
    }

    pub fn as_ui64(&self) -> u64 {
        u64::from_le_bytes(self.bytes)
    }

    pub fn as_f32(&self) -> f32 {
        f32::from_bits(self.as_ui64() as u32)
    }

    pub fn as_f64(&self) -> f64 {
        f64::from_bits(self.as_ui64())
    }

    /// View as a `0x`-prefixed, 16-digit lowercase hex string, reading the
    /// stored bytes with the given byte order.
    pub fn as_hex(&self, endianness: Endianness) -> String {
        let value = match endianness {
            Endianness::Little => u64::from_le_bytes(self.bytes),
            Endianness::Big => u64::from_be_bytes(self.bytes),
        };
        format!("{:#018x}", value)
    }

    pub fn bytes(&self) -> &[u8; WORD_SIZE] {
        &self.bytes
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_hex(Endianness::Little))
    }
}

// Words serialize as their little-endian hex view so debug dumps stay
// readable and byte-exact.
impl Serialize for Word {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_hex(Endianness::Little))
    }
}

struct WordVisitor;

impl Visitor<'_> for WordVisitor {
    type Value = Word;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a 0x-prefixed 16-digit hex string")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Word, E> {
        let digits = v
            .strip_prefix("0x")
            .ok_or_else(|| E::custom(format!("word '{}' is missing the 0x prefix", v)))?;

        if digits.len() != 2 * WORD_SIZE {
            return Err(E::custom(format!(
                "word '{}' must have exactly {} hex digits",
                v,
                2 * WORD_SIZE
            )));
        }

        let value = u64::from_str_radix(digits, 16)
            .map_err(|err| E::custom(format!("word '{}' is not valid hex: {}", v, err)))?;
        Ok(Word::from_ui64(value))
    }
}

impl<'de> Deserialize<'de> for Word {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Word, D::Error> {
        deserializer.deserialize_str(WordVisitor)
    }
}

//! Data types carried by SLASM instructions
//!
//! Width- and signedness-sensitive instructions (arithmetic, comparison,
//! negation, conversion) are parameterized by a `DataType` operand that
//! selects the lowering sequence in each backend.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Size of a machine word in bytes. Every operand stack slot, local,
/// parameter, and global occupies exactly one word.
pub const WORD_SIZE: usize = 8;

/// The closed set of value kinds a typed instruction can operate on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    I8,
    UI8,
    I16,
    UI16,
    I32,
    UI32,
    I64,
    UI64,
    F32,
    F64,
}

impl DataType {
    /// Get the size of this type in bytes (results are still stored
    /// word-aligned on the operand stack).
    pub fn size_in_bytes(&self) -> usize {
        match self {
            DataType::I8 | DataType::UI8 => 1,
            DataType::I16 | DataType::UI16 => 2,
            DataType::I32 | DataType::UI32 | DataType::F32 => 4,
            DataType::I64 | DataType::UI64 | DataType::F64 => 8,
        }
    }

    /// Check if this is an integer type (signed or unsigned)
    pub fn is_integer(&self) -> bool {
        !self.is_float()
    }

    /// Check if this is a signed integer type
    pub fn is_signed(&self) -> bool {
        matches!(
            self,
            DataType::I8 | DataType::I16 | DataType::I32 | DataType::I64
        )
    }

    /// Check if this is an unsigned integer type
    pub fn is_unsigned(&self) -> bool {
        matches!(
            self,
            DataType::UI8 | DataType::UI16 | DataType::UI32 | DataType::UI64
        )
    }

    /// Check if this is a floating point type
    pub fn is_float(&self) -> bool {
        matches!(self, DataType::F32 | DataType::F64)
    }

    /// The canonical opcode-operand spelling, as used by the debug
    /// serializers and emitted assembly comments.
    pub fn name(&self) -> &'static str {
        match self {
            DataType::I8 => "I8",
            DataType::UI8 => "UI8",
            DataType::I16 => "I16",
            DataType::UI16 => "UI16",
            DataType::I32 => "I32",
            DataType::UI32 => "UI32",
            DataType::I64 => "I64",
            DataType::UI64 => "UI64",
            DataType::F32 => "F32",
            DataType::F64 => "F64",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sizes() {
        assert_eq!(DataType::I8.size_in_bytes(), 1);
        assert_eq!(DataType::UI16.size_in_bytes(), 2);
        assert_eq!(DataType::I32.size_in_bytes(), 4);
        assert_eq!(DataType::F32.size_in_bytes(), 4);
        assert_eq!(DataType::UI64.size_in_bytes(), 8);
        assert_eq!(DataType::F64.size_in_bytes(), 8);
    }

    #[test]
    fn test_classification() {
        assert!(DataType::I8.is_signed());
        assert!(DataType::UI32.is_unsigned());
        assert!(DataType::F64.is_float());
        assert!(!DataType::F32.is_integer());
        assert!(DataType::UI64.is_integer());
        assert!(!DataType::UI64.is_signed());
    }

    #[test]
    fn test_display() {
        assert_eq!(DataType::UI16.to_string(), "UI16");
        assert_eq!(DataType::F64.to_string(), "F64");
    }
}

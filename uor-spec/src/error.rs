//! # Error Types for the UOR Codec

use crate::opcode::Opcode;
use thiserror::Error;

/// Failure while decoding a chunk into an instruction.
///
/// Every variant is fatal to the VM that hit it: a chunk either decodes
/// completely or not at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("checksum mismatch: stored exponent {found}, expected {expected}")]
    Checksum { expected: u32, found: u32 },

    #[error("no opcode prime present in chunk")]
    NoOpcode,

    #[error("multiple opcode primes present in chunk")]
    Ambiguous,

    #[error("foreign factor {factor} in chunk payload")]
    Foreign { factor: u128 },

    #[error("missing or malformed operand for {opcode}")]
    BadOperand { opcode: Opcode },
}

/// Failure while constructing a chunk, either through the codec's `build`
/// or through a `BUILD_CHUNK` factor frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    #[error("{opcode} expects {expected} operands, got {found}")]
    OperandCount {
        opcode: Opcode,
        expected: usize,
        found: usize,
    },

    #[error("factor frame must contain at least one pair")]
    EmptyFrame,

    #[error("factor exponent {exponent} out of range")]
    BadExponent { exponent: i128 },

    #[error("prime index {index} out of range")]
    PrimeIndexOutOfRange { index: i128 },

    #[error("encoded chunk exceeds the representable range")]
    ChunkTooLarge,
}

/// Failure while loading or validating a chunk stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgramError {
    #[error("chunk at address {address} does not decode: {source}")]
    InvalidChunk {
        address: usize,
        source: DecodeError,
    },

    #[error("chunk at address {address} exceeds the representable range")]
    ChunkTooLarge { address: usize },

    #[error("line {line} is not a chunk value")]
    Parse { line: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DecodeError::Checksum {
            expected: 7,
            found: 9,
        };
        assert_eq!(
            err.to_string(),
            "checksum mismatch: stored exponent 9, expected 7"
        );

        let err = EncodingError::OperandCount {
            opcode: Opcode::Push,
            expected: 1,
            found: 0,
        };
        assert_eq!(err.to_string(), "PUSH expects 1 operands, got 0");

        let err = ProgramError::Parse { line: 3 };
        assert_eq!(err.to_string(), "line 3 is not a chunk value");
    }
}

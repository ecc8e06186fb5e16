//! # Runtime Error Types
//!
//! Every variant is fatal: the VM halts, records the descriptor, and leaves
//! the instruction pointer at the offending instruction.

use thiserror::Error;
use uor_spec::{DecodeError, EncodingError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("stack underflow")]
    StackUnderflow,

    #[error("stack overflow (limit {limit})")]
    StackOverflow { limit: usize },

    #[error("arithmetic overflow")]
    ArithmeticOverflow,

    #[error("division by zero")]
    DivisionByZero,

    #[error("random bound must be positive, got {bound}")]
    NegativeRandomBound { bound: i128 },

    #[error("address {address} out of range for program of length {len}")]
    AddressOutOfRange { address: i128, len: usize },

    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("encoding failed: {0}")]
    Encoding(#[from] EncodingError),

    #[error("stack depth {found} at address {address}, expected {expected}")]
    FrameCheck {
        address: usize,
        expected: usize,
        found: usize,
    },

    #[error("step limit {limit} reached")]
    StepLimit { limit: u64 },
}

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            RuntimeError::AddressOutOfRange {
                address: 12,
                len: 10
            }
            .to_string(),
            "address 12 out of range for program of length 10"
        );
        assert_eq!(
            RuntimeError::Decode(DecodeError::NoOpcode).to_string(),
            "decode failed: no opcode prime present in chunk"
        );
    }
}

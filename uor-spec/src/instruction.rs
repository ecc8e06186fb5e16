//! Decoded view of a chunk: an opcode plus its operand values.

use crate::opcode::Opcode;
use serde::{Deserialize, Serialize};

/// One decoded instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instruction {
    pub opcode: Opcode,
    pub operands: Vec<u32>,
}

impl Instruction {
    pub fn new(opcode: Opcode, operands: Vec<u32>) -> Self {
        Instruction { opcode, operands }
    }

    /// An instruction with no operands.
    pub fn nullary(opcode: Opcode) -> Self {
        Instruction {
            opcode,
            operands: Vec::new(),
        }
    }

    /// An instruction with a single operand.
    pub fn unary(opcode: Opcode, value: u32) -> Self {
        Instruction {
            opcode,
            operands: vec![value],
        }
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.operands.is_empty() {
            return f.write_str(self.opcode.name());
        }
        write!(f, "{}(", self.opcode.name())?;
        for (i, v) in self.operands.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{v}")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Instruction::nullary(Opcode::Nop).to_string(), "NOP");
        assert_eq!(Instruction::unary(Opcode::Push, 7).to_string(), "PUSH(7)");
        assert_eq!(
            Instruction::nullary(Opcode::JumpIfZero).to_string(),
            "JUMP_IF_ZERO"
        );
    }
}

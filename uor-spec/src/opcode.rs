//! # Opcode Definitions
//!
//! The VM's instruction set is a fixed enumeration of 20 opcodes. Each
//! opcode is identified in a chunk's payload by a dedicated *opcode prime*
//! carried with exponent 1; operands ride on *operand primes* disjoint from
//! every opcode prime.
//!
//! ## Prime assignment
//!
//! - prime index 0 (`2`) — checksum prime
//! - prime index 1 (`3`) — operand prime (only `PUSH` carries an operand)
//! - prime index `n + 2` — opcode prime for the opcode with enumeration
//!   index `n`, so `NOP → 5`, `PUSH → 7`, `ADD → 11`, …, `HALT → 79`

use serde::{Deserialize, Serialize};

/// Instruction opcode, in the stable enumeration order of the external
/// interface. `FACTORIZE` pushes these indices onto the stack.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    /// NOP: no effect
    Nop = 0,
    /// PUSH v: push the immediate operand
    Push = 1,
    /// ADD: a, b → a + b
    Add = 2,
    /// SUB: a, b → a − b
    Sub = 3,
    /// MUL: a, b → a · b
    Mul = 4,
    /// MOD: a, b → a mod b (truncated)
    Mod = 5,
    /// DUP: a → a, a
    Dup = 6,
    /// DROP: a → —
    Drop = 7,
    /// SWAP: a, b → b, a
    Swap = 8,
    /// COMPARE_EQ: a, b → 1 if a == b else 0
    CompareEq = 9,
    /// PRINT: a → —, appending a to the output log
    Print = 10,
    /// JUMP: addr → —, sets IP
    Jump = 11,
    /// JUMP_IF_ZERO: cond, addr → —, sets IP when cond == 0
    JumpIfZero = 12,
    /// OP_RANDOM: n → r with r drawn uniformly from [0, n)
    Random = 13,
    /// OP_INPUT: suspends; the resumed value is pushed
    Input = 14,
    /// PEEK_CHUNK: addr → raw chunk at addr
    PeekChunk = 15,
    /// BUILD_CHUNK: variable factor frame → chunk
    BuildChunk = 16,
    /// POKE_CHUNK: chunk, addr → —, overwriting program memory
    PokeChunk = 17,
    /// FACTORIZE: chunk → opcode index, operands…
    Factorize = 18,
    /// HALT: stops the VM
    Halt = 19,
}

/// Number of opcodes in the enumeration.
pub const OPCODE_COUNT: usize = 20;

/// Prime index reserved for the checksum prime.
pub const CHECKSUM_PRIME_INDEX: usize = 0;

/// Prime index of the single operand prime.
pub const OPERAND_PRIME_INDEX: usize = 1;

/// Prime value of the operand prime.
pub const OPERAND_PRIME: u64 = 3;

/// Opcode primes in enumeration order: `nth_prime(index + 2)`.
const OPCODE_PRIMES: [u64; OPCODE_COUNT] = [
    5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79,
];

impl Opcode {
    /// Enumeration index, as pushed by `FACTORIZE`.
    #[inline]
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Convert from an enumeration index.
    pub fn from_index(value: u8) -> Option<Self> {
        match value {
            0 => Some(Opcode::Nop),
            1 => Some(Opcode::Push),
            2 => Some(Opcode::Add),
            3 => Some(Opcode::Sub),
            4 => Some(Opcode::Mul),
            5 => Some(Opcode::Mod),
            6 => Some(Opcode::Dup),
            7 => Some(Opcode::Drop),
            8 => Some(Opcode::Swap),
            9 => Some(Opcode::CompareEq),
            10 => Some(Opcode::Print),
            11 => Some(Opcode::Jump),
            12 => Some(Opcode::JumpIfZero),
            13 => Some(Opcode::Random),
            14 => Some(Opcode::Input),
            15 => Some(Opcode::PeekChunk),
            16 => Some(Opcode::BuildChunk),
            17 => Some(Opcode::PokeChunk),
            18 => Some(Opcode::Factorize),
            19 => Some(Opcode::Halt),
            _ => None,
        }
    }

    /// The payload prime identifying this opcode.
    #[inline]
    pub const fn prime(self) -> u64 {
        OPCODE_PRIMES[self as usize]
    }

    /// Index of the opcode prime in the shared prime sequence.
    #[inline]
    pub const fn prime_index(self) -> usize {
        self as usize + 2
    }

    /// Identify an opcode by its payload prime.
    pub fn from_prime(p: u64) -> Option<Self> {
        OPCODE_PRIMES
            .iter()
            .position(|&q| q == p)
            .and_then(|i| Self::from_index(i as u8))
    }

    /// Ordered operand primes for this opcode. Empty for all opcodes except
    /// `PUSH`, which carries its immediate on the operand prime.
    pub fn operand_primes(self) -> &'static [u64] {
        match self {
            Opcode::Push => &[OPERAND_PRIME],
            _ => &[],
        }
    }

    /// Number of encoded operands.
    #[inline]
    pub fn operand_count(self) -> usize {
        self.operand_primes().len()
    }

    /// Check if this opcode reads or rewrites program memory.
    #[inline]
    pub const fn is_reflective(self) -> bool {
        matches!(
            self,
            Opcode::PeekChunk | Opcode::BuildChunk | Opcode::PokeChunk | Opcode::Factorize
        )
    }

    /// Check if this opcode sets the instruction pointer itself.
    #[inline]
    pub const fn is_control_flow(self) -> bool {
        matches!(self, Opcode::Jump | Opcode::JumpIfZero | Opcode::Halt)
    }

    /// Stable identifier from the external interface.
    pub const fn name(self) -> &'static str {
        match self {
            Opcode::Nop => "NOP",
            Opcode::Push => "PUSH",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Mod => "MOD",
            Opcode::Dup => "DUP",
            Opcode::Drop => "DROP",
            Opcode::Swap => "SWAP",
            Opcode::CompareEq => "COMPARE_EQ",
            Opcode::Print => "PRINT",
            Opcode::Jump => "JUMP",
            Opcode::JumpIfZero => "JUMP_IF_ZERO",
            Opcode::Random => "OP_RANDOM",
            Opcode::Input => "OP_INPUT",
            Opcode::PeekChunk => "PEEK_CHUNK",
            Opcode::BuildChunk => "BUILD_CHUNK",
            Opcode::PokeChunk => "POKE_CHUNK",
            Opcode::Factorize => "FACTORIZE",
            Opcode::Halt => "HALT",
        }
    }

    /// Iterate over the whole enumeration.
    pub fn all() -> impl Iterator<Item = Opcode> {
        (0..OPCODE_COUNT as u8).filter_map(Opcode::from_index)
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

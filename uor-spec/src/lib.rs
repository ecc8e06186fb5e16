//! # UOR Encoding Specification
//!
//! Core types for the PrimeOS UOR virtual machine: the shared prime cache,
//! the opcode enumeration and its prime tables, the chunk codec, and the
//! validated program container.
//!
//! A *chunk* is an integer whose prime factorization encodes one
//! instruction together with a checksum factor. The codec is the bijection
//! between chunks and decoded instructions; see [`codec`] for the exact
//! form.

pub mod codec;
pub mod error;
pub mod instruction;
pub mod opcode;
pub mod primes;
pub mod program;

pub use codec::{
    attach_checksum, build, decode, prime_power, Chunk, CHECKSUM_MOD, CHECKSUM_PRIME, MAX_CHUNK,
};
pub use error::{DecodeError, EncodingError, ProgramError};
pub use instruction::Instruction;
pub use opcode::{Opcode, CHECKSUM_PRIME_INDEX, OPCODE_COUNT, OPERAND_PRIME, OPERAND_PRIME_INDEX};
pub use program::Program;

//! # Chunk-Stream Builder
//!
//! Emits chunks sequentially and resolves forward references after the
//! fact. Because a chunk encodes its `PUSH` immediate in an exponent, wide
//! immediates are split across several instructions; address references
//! always use the same fixed-width five-chunk form
//!
//! ```text
//! PUSH q, PUSH 40, MUL, PUSH r, ADD      (value = q · 40 + r)
//! ```
//!
//! so that patching a target never moves any other address.

use thiserror::Error;
use uor_spec::{build, Chunk, EncodingError, Opcode, Program, ProgramError};

/// Largest immediate emitted as a single `PUSH`.
pub const IMMEDIATE_LIMIT: u32 = 40;

/// Radix of the five-chunk wide form; addressable range is
/// `IMMEDIATE_LIMIT · WIDE_SPLIT + IMMEDIATE_LIMIT`.
pub const WIDE_SPLIT: u32 = 40;

/// Width in chunks of an address reference.
pub const ADDR_REF_WIDTH: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AsmError {
    #[error("encoding failed: {0}")]
    Encoding(#[from] EncodingError),

    #[error("assembled program invalid: {0}")]
    Program(#[from] ProgramError),

    #[error("unbound address reference at chunk {base}")]
    UnboundReference { base: usize },

    #[error("value {value} exceeds the assembler's immediate range")]
    ValueTooLarge { value: u64 },
}

struct Fixup {
    base: usize,
    target: Option<usize>,
}

/// Handle to a forward address reference.
#[derive(Debug, Clone, Copy)]
pub struct AddrRef(usize);

/// Sequential chunk emitter with label backpatching.
pub struct ProgramBuilder {
    chunks: Vec<Chunk>,
    fixups: Vec<Fixup>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        ProgramBuilder {
            chunks: Vec::new(),
            fixups: Vec::new(),
        }
    }

    /// Address of the next emitted chunk.
    pub fn here(&self) -> usize {
        self.chunks.len()
    }

    /// Emit a nullary instruction.
    pub fn emit(&mut self, opcode: Opcode) -> Result<(), AsmError> {
        self.chunks.push(build(opcode, &[])?);
        Ok(())
    }

    /// Emit a `PUSH` of `value`, splitting into the wide form when the
    /// immediate does not fit a single chunk.
    pub fn emit_push(&mut self, value: u32) -> Result<(), AsmError> {
        if value <= IMMEDIATE_LIMIT {
            self.chunks.push(build(Opcode::Push, &[value])?);
            return Ok(());
        }
        let q = value / WIDE_SPLIT;
        let r = value % WIDE_SPLIT;
        if q > IMMEDIATE_LIMIT {
            return Err(AsmError::ValueTooLarge {
                value: value as u64,
            });
        }
        self.chunks.push(build(Opcode::Push, &[q])?);
        self.chunks.push(build(Opcode::Push, &[WIDE_SPLIT])?);
        self.chunks.push(build(Opcode::Mul, &[])?);
        self.chunks.push(build(Opcode::Push, &[r])?);
        self.chunks.push(build(Opcode::Add, &[])?);
        Ok(())
    }

    /// Emit an unresolved address push in the five-chunk wide form and
    /// return a handle to patch later.
    pub fn forward_addr(&mut self) -> Result<AddrRef, AsmError> {
        let base = self.here();
        self.chunks.push(build(Opcode::Push, &[0])?);
        self.chunks.push(build(Opcode::Push, &[WIDE_SPLIT])?);
        self.chunks.push(build(Opcode::Mul, &[])?);
        self.chunks.push(build(Opcode::Push, &[0])?);
        self.chunks.push(build(Opcode::Add, &[])?);
        self.fixups.push(Fixup { base, target: None });
        Ok(AddrRef(self.fixups.len() - 1))
    }

    /// Bind a forward reference to the current address.
    pub fn bind(&mut self, addr_ref: AddrRef) {
        let here = self.here();
        self.fixups[addr_ref.0].target = Some(here);
    }

    /// Patch all references and validate the stream.
    pub fn finish(mut self) -> Result<Program, AsmError> {
        for fixup in &self.fixups {
            let target = fixup.target.ok_or(AsmError::UnboundReference {
                base: fixup.base,
            })?;
            let q = target / WIDE_SPLIT as usize;
            let r = target % WIDE_SPLIT as usize;
            if q > IMMEDIATE_LIMIT as usize {
                return Err(AsmError::ValueTooLarge {
                    value: target as u64,
                });
            }
            self.chunks[fixup.base] = build(Opcode::Push, &[q as u32])?;
            self.chunks[fixup.base + 3] = build(Opcode::Push, &[r as u32])?;
        }
        Ok(Program::new(self.chunks)?)
    }
}

impl Default for ProgramBuilder {
    fn default() -> Self {
        Self::new()
    }
}

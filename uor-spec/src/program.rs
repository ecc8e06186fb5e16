//! # Program Container
//!
//! A program is an ordered, fixed-length sequence of chunks addressed from
//! zero. Construction validates that every chunk decodes, so a loaded
//! program satisfies the memory invariant before the VM ever steps.
//!
//! Programs round-trip through a line-oriented text format: one decimal
//! chunk per line, with blank lines and `#` comments ignored.

use crate::codec::{self, Chunk, MAX_CHUNK};
use crate::error::ProgramError;
use crate::instruction::Instruction;

/// A validated chunk stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    chunks: Vec<Chunk>,
}

impl Program {
    /// Validate and wrap a chunk stream.
    pub fn new(chunks: Vec<Chunk>) -> Result<Self, ProgramError> {
        for (address, &chunk) in chunks.iter().enumerate() {
            if chunk > MAX_CHUNK {
                return Err(ProgramError::ChunkTooLarge { address });
            }
            codec::decode(chunk).map_err(|source| ProgramError::InvalidChunk { address, source })?;
        }
        Ok(Program { chunks })
    }

    /// Parse the text format.
    pub fn from_text(text: &str) -> Result<Self, ProgramError> {
        let mut chunks = Vec::new();
        for (i, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let chunk: Chunk = line.parse().map_err(|_| ProgramError::Parse { line: i + 1 })?;
            chunks.push(chunk);
        }
        Self::new(chunks)
    }

    /// Render the text format.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for chunk in &self.chunks {
            out.push_str(&chunk.to_string());
            out.push('\n');
        }
        out
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn get(&self, address: usize) -> Option<Chunk> {
        self.chunks.get(address).copied()
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn into_chunks(self) -> Vec<Chunk> {
        self.chunks
    }

    /// Re-decode the whole stream. Cannot fail on a validated program; used
    /// by tooling that wants the instruction view.
    pub fn instructions(&self) -> Vec<Instruction> {
        self.chunks
            .iter()
            .map(|&c| codec::decode(c).expect("validated program"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeError;
    use crate::opcode::Opcode;

    fn sample() -> Vec<Chunk> {
        vec![
            codec::build(Opcode::Push, &[7]).unwrap(),
            codec::build(Opcode::Print, &[]).unwrap(),
            codec::build(Opcode::Halt, &[]).unwrap(),
        ]
    }

    #[test]
    fn test_valid_program() {
        let program = Program::new(sample()).unwrap();
        assert_eq!(program.len(), 3);
        let decoded = program.instructions();
        assert_eq!(decoded[0], Instruction::unary(Opcode::Push, 7));
        assert_eq!(decoded[2], Instruction::nullary(Opcode::Halt));
    }

    #[test]
    fn test_invalid_chunk_reports_address() {
        let mut chunks = sample();
        chunks[1] = 12; // 2^2 · 3: no opcode prime
        let err = Program::new(chunks).unwrap_err();
        assert_eq!(
            err,
            ProgramError::InvalidChunk {
                address: 1,
                source: DecodeError::NoOpcode,
            }
        );
    }

    #[test]
    fn test_text_round_trip() {
        let program = Program::new(sample()).unwrap();
        let text = program.to_text();
        let reloaded = Program::from_text(&text).unwrap();
        assert_eq!(program, reloaded);
    }

    #[test]
    fn test_text_comments_and_blanks() {
        let program = Program::from_text("# header\n\n10\n").unwrap();
        assert_eq!(program.len(), 1);
        assert_eq!(program.get(0), Some(10));
    }

    #[test]
    fn test_text_parse_error_line() {
        let err = Program::from_text("10\nnot-a-chunk\n").unwrap_err();
        assert_eq!(err, ProgramError::Parse { line: 2 });
    }
}

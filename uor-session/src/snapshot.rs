//! VM snapshot returned by every controller operation.

use serde::Serialize;
use uor_runtime::Word;
use uor_spec::Chunk;

use crate::controller::Phase;

/// One program-memory cell with its human-readable decoding.
#[derive(Debug, Clone, Serialize)]
pub struct MemoryCell {
    pub address: usize,
    pub raw_chunk: Chunk,
    pub decoded: String,
}

/// Complete externally visible state of a session.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    /// `-1` before `init`.
    pub instruction_pointer: i64,
    /// Bottom-first.
    pub stack: Vec<Word>,
    pub output_log: Vec<Word>,
    pub halted: bool,
    pub error: Option<String>,
    pub program_memory: Vec<MemoryCell>,
    pub needs_input: bool,
    pub interaction_phase: Phase,
    pub current_target: Option<i64>,
    pub difficulty_level: String,
    pub attempts_on_target: u32,
}

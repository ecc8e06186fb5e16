//! # Virtual Machine Core
//!
//! One [`Vm::step`] call fetches the chunk under the instruction pointer,
//! decodes it through the UOR codec, dispatches, and advances. `OP_INPUT`
//! is the single suspension point: `step` parks the IP on the instruction
//! and a later [`Vm::provide_input`] pushes the supplied value and resumes.
//!
//! Any fatal condition halts the VM, records the error descriptor, and
//! leaves the IP at the offending instruction. A halted VM never steps
//! again; a fresh VM replaces it.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::SeedableRng;
use uor_spec::{codec, Chunk, Instruction, Program, MAX_CHUNK};

use crate::error::{Result, RuntimeError};
use crate::exec::{execute, Control};
use crate::stack::Stack;
use crate::Word;

/// Assert a fixed stack depth whenever the IP reaches an address.
///
/// Programs that carry state frames across loop iterations are fragile
/// against mis-balanced branches; the check turns silent frame corruption
/// into an immediate halt.
#[derive(Debug, Clone)]
pub struct FrameCheck {
    pub address: usize,
    pub depth: usize,
}

/// VM configuration.
#[derive(Debug, Clone)]
pub struct VmConfig {
    /// Hard cap on stack depth.
    pub stack_limit: usize,

    /// Step budget for [`Vm::run`]; exceeding it halts with `StepLimit`.
    pub max_steps: u64,

    /// Seed for the per-VM random source. `None` seeds from entropy.
    pub seed: Option<u64>,

    /// Optional stack-depth assertion.
    pub frame_check: Option<FrameCheck>,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            stack_limit: 1024,
            max_steps: 100_000,
            seed: None,
            frame_check: None,
        }
    }
}

/// Result of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// An instruction executed and the VM can continue.
    Executed,
    /// The VM is suspended inside `OP_INPUT` awaiting a value.
    Suspended,
    /// The VM is halted, normally or with a recorded error.
    Halted,
}

/// The UOR stack machine.
pub struct Vm {
    pub(crate) memory: Vec<Chunk>,
    pub(crate) stack: Stack,
    pub(crate) ip: usize,
    pub(crate) output: Vec<Word>,
    pub(crate) halted: bool,
    pub(crate) error: Option<RuntimeError>,
    pub(crate) pending_input: bool,
    pub(crate) rng: StdRng,
    decode_cache: HashMap<Chunk, Instruction>,
    config: VmConfig,
}

impl Vm {
    /// Create a VM over a validated program with a pre-seeded stack.
    pub fn new(program: Program, initial_stack: Vec<Word>, config: VmConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut stack = Stack::new(config.stack_limit);
        for value in initial_stack {
            stack.push(value).expect("initial stack within limit");
        }
        Vm {
            memory: program.into_chunks(),
            stack,
            ip: 0,
            output: Vec::new(),
            halted: false,
            error: None,
            pending_input: false,
            rng,
            decode_cache: HashMap::new(),
            config,
        }
    }

    pub fn ip(&self) -> usize {
        self.ip
    }

    /// Bottom-first stack view.
    pub fn stack(&self) -> &[Word] {
        self.stack.as_slice()
    }

    /// Append-only output log.
    pub fn output(&self) -> &[Word] {
        &self.output
    }

    pub fn halted(&self) -> bool {
        self.halted
    }

    pub fn error(&self) -> Option<&RuntimeError> {
        self.error.as_ref()
    }

    pub fn pending_input(&self) -> bool {
        self.pending_input
    }

    pub fn memory(&self) -> &[Chunk] {
        &self.memory
    }

    /// Execute exactly one instruction.
    ///
    /// A suspended VM stays suspended and a halted VM stays halted; both are
    /// no-ops reporting the current state.
    pub fn step(&mut self) -> StepOutcome {
        if self.halted {
            return StepOutcome::Halted;
        }
        if self.pending_input {
            return StepOutcome::Suspended;
        }

        if let Some(check) = self.config.frame_check.clone() {
            if self.ip == check.address && self.stack.len() != check.depth {
                return self.fail(RuntimeError::FrameCheck {
                    address: check.address,
                    expected: check.depth,
                    found: self.stack.len(),
                });
            }
        }

        let instruction = match self.fetch() {
            Ok(instruction) => instruction,
            Err(e) => return self.fail(e),
        };
        tracing::trace!(ip = self.ip, instruction = %instruction, "step");

        match execute(self, &instruction) {
            Ok(Control::Advance) => {
                self.ip += 1;
                StepOutcome::Executed
            }
            Ok(Control::Jump(target)) => {
                self.ip = target;
                StepOutcome::Executed
            }
            Ok(Control::Suspend) => {
                self.pending_input = true;
                StepOutcome::Suspended
            }
            Ok(Control::Halt) => {
                self.halted = true;
                StepOutcome::Halted
            }
            Err(e) => self.fail(e),
        }
    }

    /// Resume a suspended VM: push `value` and advance past the `OP_INPUT`.
    ///
    /// Exactly one value is consumed per suspension; no further instructions
    /// execute in this call. Without a pending input this is a no-op.
    pub fn provide_input(&mut self, value: Word) -> StepOutcome {
        if self.halted {
            return StepOutcome::Halted;
        }
        if !self.pending_input {
            return StepOutcome::Executed;
        }
        self.pending_input = false;
        if let Err(e) = self.stack.push(value) {
            return self.fail(e);
        }
        self.ip += 1;
        StepOutcome::Executed
    }

    /// Step until suspension or halt, bounded by the configured step limit.
    pub fn run(&mut self) -> StepOutcome {
        let mut steps: u64 = 0;
        loop {
            match self.step() {
                StepOutcome::Executed => {
                    steps += 1;
                    if steps >= self.config.max_steps {
                        return self.fail(RuntimeError::StepLimit {
                            limit: self.config.max_steps,
                        });
                    }
                }
                outcome => return outcome,
            }
        }
    }

    /// Overwrite one program-memory cell with a chunk that must decode.
    ///
    /// Also used by hosts to preconfigure a loaded program before stepping.
    pub fn poke(&mut self, address: usize, chunk: Chunk) -> Result<()> {
        if address >= self.memory.len() {
            return Err(RuntimeError::AddressOutOfRange {
                address: address as i128,
                len: self.memory.len(),
            });
        }
        if chunk > MAX_CHUNK {
            return Err(uor_spec::EncodingError::ChunkTooLarge.into());
        }
        let instruction = self.decode_chunk(chunk)?;
        tracing::debug!(address, chunk = %chunk, instruction = %instruction, "poke");
        self.memory[address] = chunk;
        Ok(())
    }

    fn fail(&mut self, error: RuntimeError) -> StepOutcome {
        tracing::debug!(ip = self.ip, %error, "vm halted");
        self.halted = true;
        self.error = Some(error);
        StepOutcome::Halted
    }

    fn fetch(&mut self) -> Result<Instruction> {
        let chunk = *self
            .memory
            .get(self.ip)
            .ok_or(RuntimeError::AddressOutOfRange {
                address: self.ip as i128,
                len: self.memory.len(),
            })?;
        self.decode_chunk(chunk)
    }

    /// Decode through the value-keyed cache. Chunk values never change
    /// meaning, so `POKE_CHUNK` needs no invalidation here.
    pub(crate) fn decode_chunk(&mut self, chunk: Chunk) -> Result<Instruction> {
        if let Some(instruction) = self.decode_cache.get(&chunk) {
            return Ok(instruction.clone());
        }
        let instruction = codec::decode(chunk)?;
        self.decode_cache.insert(chunk, instruction.clone());
        Ok(instruction)
    }

    // Stack helpers for the dispatch module.

    pub(crate) fn push(&mut self, value: Word) -> Result<()> {
        self.stack.push(value)
    }

    pub(crate) fn pop(&mut self) -> Result<Word> {
        self.stack.pop()
    }

    pub(crate) fn top(&self) -> Result<Word> {
        self.stack.top()
    }

    /// Pop a program-memory address, validating it against `[0, len)`.
    pub(crate) fn pop_address(&mut self) -> Result<usize> {
        let value = self.stack.pop()?;
        let len = self.memory.len();
        if value < 0 || value >= len as i128 {
            return Err(RuntimeError::AddressOutOfRange {
                address: value,
                len,
            });
        }
        Ok(value as usize)
    }

    /// Pop a chunk value; negative words cannot encode an instruction.
    pub(crate) fn pop_chunk(&mut self) -> Result<Chunk> {
        let value = self.stack.pop()?;
        Chunk::try_from(value).map_err(|_| uor_spec::DecodeError::NoOpcode.into())
    }
}

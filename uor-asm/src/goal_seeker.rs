//! # Canonical Goal-Seeker Program
//!
//! A self-modifying chunk stream that repeatedly prints a guess, asks its
//! host for feedback, and rewrites its own first instructions in response.
//!
//! ## Memory layout
//!
//! - address 0 — `PUSH(attempt)`, overwritten by the host at init and by
//!   the program itself on every loop iteration;
//! - address 1 — the *modification slot*, initially `NOP`, overwritten on
//!   each failure with one of `PUSH(0)`, `ADD`, `NOP`;
//! - address 2 — `PRINT`;
//! - address 3 — `OP_INPUT` awaiting feedback (1 success, 0 failure).
//!
//! ## State frame
//!
//! The stack carries a four-element frame across iterations, bottom-first:
//! `[last_pushed_addr0_value, session_failure_count, last_slot_choice,
//! last_instr_type_choice]`. The three slot instruction types have net
//! stack effects `+1`, `-1`, and `0`, so the first thing either feedback
//! branch does is re-normalize the frame: it peeks the slot, matches the
//! raw chunk against freshly built `NOP` and `ADD` chunks (encoding is
//! canonical, so equal instructions yield equal chunks), and repairs the
//! shape the executed slot left behind.
//!
//! The failure path parks the next attempt inside address 0 the moment it
//! is computed, then recovers it with `PEEK_CHUNK`/`FACTORIZE` when needed;
//! the opcode set has no three-deep stack rotation, and program memory is
//! the one place a value can be set aside without disturbing the frame.

use crate::builder::{AsmError, ProgramBuilder};
use uor_spec::{Opcode, Program, OPERAND_PRIME_INDEX};

/// Attempts are taken modulo this value.
pub const ATTEMPT_MODULUS: u32 = 10;

/// The random offset added to a failed attempt lies in `[0, this)`.
pub const RANDOM_OFFSET_SPAN: u32 = 3;

/// Consecutive failures before the stuck signal is printed.
pub const MAX_FAILURES_BEFORE_STUCK: u32 = 3;

/// Printed once when the failure count first reaches its maximum.
pub const STUCK_SIGNAL: u32 = 99;

/// Feedback codes delivered through `OP_INPUT`.
pub const FEEDBACK_SUCCESS: u32 = 1;
pub const FEEDBACK_FAILURE: u32 = 0;

/// Address of the self-modified `PUSH` and top of the main loop.
pub const LOOP_START: usize = 0;

/// Address of the modification slot.
pub const MODIFICATION_SLOT: usize = 1;

/// Decision indices for the slot instruction choice.
pub const DECISION_PUSH: u32 = 0;
pub const DECISION_ADD: u32 = 1;
pub const DECISION_NOP: u32 = 2;

/// Number of distinct slot decisions.
pub const DECISION_COUNT: u32 = 3;

/// Depth of the stack frame at the top of the main loop.
pub const STATE_FRAME_DEPTH: usize = 4;

/// The canonical program.
pub fn program() -> Program {
    build_program().expect("canonical goal-seeker program must assemble")
}

/// Emit `…exp → …chunk`: build a `PUSH` chunk whose operand exponent is
/// already on top of the stack.
fn emit_build_push(b: &mut ProgramBuilder) -> Result<(), AsmError> {
    b.emit_push(OPERAND_PRIME_INDEX as u32)?;
    b.emit(Opcode::Swap)?;
    b.emit_push(Opcode::Push.prime_index() as u32)?;
    b.emit_push(1)?;
    b.emit_push(2)?;
    b.emit(Opcode::BuildChunk)?;
    Ok(())
}

/// Emit `… → …chunk` for a nullary opcode via a one-pair factor frame.
fn emit_build_nullary(b: &mut ProgramBuilder, opcode: Opcode) -> Result<(), AsmError> {
    b.emit_push(opcode.prime_index() as u32)?;
    b.emit_push(1)?;
    b.emit_push(1)?;
    b.emit(Opcode::BuildChunk)?;
    Ok(())
}

fn build_program() -> Result<Program, AsmError> {
    let mut b = ProgramBuilder::new();

    // ---- main loop prologue ----
    // Stack at address 0: [LPV, SFC, LSC, LIC].
    b.emit_push(FEEDBACK_FAILURE)?; // addr 0, re-poked before every run
    b.emit(Opcode::Nop)?; // addr 1, the modification slot
    b.emit(Opcode::Print)?; // addr 2
    b.emit(Opcode::Input)?; // addr 3, feedback

    // ---- frame normalization ----
    // NOP slot left [LPV, SFC, LSC, LIC, fb]; PUSH(0) left an extra
    // attempt below fb; ADD consumed LIC.
    b.emit_push(MODIFICATION_SLOT as u32)?;
    b.emit(Opcode::PeekChunk)?;
    b.emit(Opcode::Dup)?;
    emit_build_nullary(&mut b, Opcode::Nop)?;
    b.emit(Opcode::CompareEq)?;
    let slot_not_nop = b.forward_addr()?;
    b.emit(Opcode::JumpIfZero)?;
    // Slot is NOP: frame already canonical.
    b.emit(Opcode::Drop)?;
    let branch_from_nop = b.forward_addr()?;
    b.emit(Opcode::Jump)?;

    b.bind(slot_not_nop);
    b.emit(Opcode::Dup)?;
    emit_build_nullary(&mut b, Opcode::Add)?;
    b.emit(Opcode::CompareEq)?;
    let slot_is_push = b.forward_addr()?;
    b.emit(Opcode::JumpIfZero)?;
    // Slot is ADD: LIC was consumed; reinstate it under fb.
    b.emit(Opcode::Drop)?;
    b.emit_push(DECISION_ADD)?;
    b.emit(Opcode::Swap)?;
    let branch_from_add = b.forward_addr()?;
    b.emit(Opcode::Jump)?;

    b.bind(slot_is_push);
    // Slot is PUSH(0): the unconsumed attempt sits under fb.
    b.emit(Opcode::Drop)?;
    b.emit(Opcode::Swap)?;
    b.emit(Opcode::Drop)?;

    b.bind(branch_from_nop);
    b.bind(branch_from_add);

    // ---- feedback branch ----
    // Stack: [LPV, SFC, LSC, LIC, fb].
    b.emit_push(FEEDBACK_SUCCESS)?;
    b.emit(Opcode::CompareEq)?;
    let failure = b.forward_addr()?;
    b.emit(Opcode::JumpIfZero)?;

    // ---- success path ----
    // Discard the frame, fetch the next target, rewrite address 0.
    b.emit(Opcode::Drop)?;
    b.emit(Opcode::Drop)?;
    b.emit(Opcode::Drop)?;
    b.emit(Opcode::Drop)?;
    b.emit(Opcode::Input)?; // next target
    b.emit(Opcode::Dup)?;
    b.emit_push(1)?;
    b.emit(Opcode::Add)?; // operand exponent = target + 1
    emit_build_push(&mut b)?;
    b.emit_push(LOOP_START as u32)?;
    b.emit(Opcode::PokeChunk)?;
    b.emit_push(0)?; // failure count resets
    b.emit_push(MODIFICATION_SLOT as u32)?; // slot choice
    b.emit_push(DECISION_NOP)?; // instr type choice
    b.emit_push(LOOP_START as u32)?;
    b.emit(Opcode::Jump)?;

    // ---- failure path ----
    // Stack on entry: [LPV, SFC, LSC, LIC].
    b.bind(failure);
    b.emit(Opcode::Drop)?;
    b.emit(Opcode::Drop)?;
    b.emit(Opcode::Swap)?; // [SFC, LPV]

    // next_attempt = (LPV + random(0, 3) + 1) mod 10, parked in addr 0.
    b.emit(Opcode::Dup)?;
    b.emit_push(RANDOM_OFFSET_SPAN)?;
    b.emit(Opcode::Random)?;
    b.emit_push(1)?;
    b.emit(Opcode::Add)?;
    b.emit(Opcode::Add)?;
    b.emit_push(ATTEMPT_MODULUS)?;
    b.emit(Opcode::Mod)?; // [SFC, LPV, NA]
    b.emit(Opcode::Dup)?;
    b.emit_push(1)?;
    b.emit(Opcode::Add)?;
    emit_build_push(&mut b)?;
    b.emit_push(LOOP_START as u32)?;
    b.emit(Opcode::PokeChunk)?; // [SFC, LPV, NA]

    // Distinctness: a retry equal to the last poked value is bumped once.
    b.emit(Opcode::CompareEq)?; // [SFC, same]
    let attempt_ok = b.forward_addr()?;
    b.emit(Opcode::JumpIfZero)?;
    b.emit_push(LOOP_START as u32)?;
    b.emit(Opcode::PeekChunk)?;
    b.emit(Opcode::Factorize)?;
    b.emit(Opcode::Swap)?;
    b.emit(Opcode::Drop)?; // [SFC, NA]
    b.emit_push(1)?;
    b.emit(Opcode::Add)?;
    b.emit_push(ATTEMPT_MODULUS)?;
    b.emit(Opcode::Mod)?; // [SFC, NA']
    b.emit(Opcode::Dup)?;
    b.emit_push(1)?;
    b.emit(Opcode::Add)?;
    emit_build_push(&mut b)?;
    b.emit_push(LOOP_START as u32)?;
    b.emit(Opcode::PokeChunk)?; // [SFC, NA']
    let have_attempt = b.forward_addr()?;
    b.emit(Opcode::Jump)?;

    b.bind(attempt_ok);
    b.emit_push(LOOP_START as u32)?;
    b.emit(Opcode::PeekChunk)?;
    b.emit(Opcode::Factorize)?;
    b.emit(Opcode::Swap)?;
    b.emit(Opcode::Drop)?; // [SFC, att]

    b.bind(have_attempt);
    b.emit(Opcode::Swap)?; // [att, SFC]
    b.emit_push(1)?;
    b.emit(Opcode::Add)?; // [att, SFC + 1]

    // Stuck signal when the count first reaches the maximum.
    b.emit(Opcode::Dup)?;
    b.emit_push(MAX_FAILURES_BEFORE_STUCK)?;
    b.emit(Opcode::CompareEq)?;
    let skip_stuck = b.forward_addr()?;
    b.emit(Opcode::JumpIfZero)?;
    b.emit_push(STUCK_SIGNAL)?;
    b.emit(Opcode::Print)?;
    b.bind(skip_stuck);

    // Choose and build the slot replacement instruction.
    b.emit_push(DECISION_COUNT)?;
    b.emit(Opcode::Random)?; // [att, SFC', d]
    b.emit(Opcode::Dup)?;
    b.emit_push(DECISION_ADD)?;
    b.emit(Opcode::CompareEq)?;
    let not_add = b.forward_addr()?;
    b.emit(Opcode::JumpIfZero)?;
    emit_build_nullary(&mut b, Opcode::Add)?;
    let poke_slot_from_add = b.forward_addr()?;
    b.emit(Opcode::Jump)?;

    b.bind(not_add);
    b.emit(Opcode::Dup)?;
    b.emit_push(DECISION_NOP)?;
    b.emit(Opcode::CompareEq)?;
    let is_push = b.forward_addr()?;
    b.emit(Opcode::JumpIfZero)?;
    emit_build_nullary(&mut b, Opcode::Nop)?;
    let poke_slot_from_nop = b.forward_addr()?;
    b.emit(Opcode::Jump)?;

    b.bind(is_push);
    // PUSH(0): operand exponent 1.
    b.emit_push(OPERAND_PRIME_INDEX as u32)?;
    b.emit_push(1)?;
    b.emit_push(Opcode::Push.prime_index() as u32)?;
    b.emit_push(1)?;
    b.emit_push(2)?;
    b.emit(Opcode::BuildChunk)?;

    b.bind(poke_slot_from_add);
    b.bind(poke_slot_from_nop);
    b.emit_push(MODIFICATION_SLOT as u32)?;
    b.emit(Opcode::PokeChunk)?; // [att, SFC', d]

    // Re-assemble the frame: [att, SFC', LSC, LIC].
    b.emit_push(MODIFICATION_SLOT as u32)?;
    b.emit(Opcode::Swap)?;
    b.emit_push(LOOP_START as u32)?;
    b.emit(Opcode::Jump)?;

    b.finish()
}

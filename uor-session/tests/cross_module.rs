//! Cross-crate behaviors: assembled chunk streams executing on the VM.

use uor_asm::goal_seeker::{self, MODIFICATION_SLOT};
use uor_asm::ProgramBuilder;
use uor_runtime::{StepOutcome, Vm, VmConfig, Word};
use uor_spec::{build, Opcode, OPERAND_PRIME_INDEX};

fn seeded_config(seed: u64) -> VmConfig {
    VmConfig {
        seed: Some(seed),
        ..VmConfig::default()
    }
}

#[test]
fn test_goal_seeker_first_iteration_standalone() {
    // Outside the controller: prime address 0, seed the frame, step to the
    // first suspension.
    let mut vm = Vm::new(
        goal_seeker::program(),
        vec![4, 0, MODIFICATION_SLOT as Word, goal_seeker::DECISION_NOP as Word],
        seeded_config(3),
    );
    vm.poke(goal_seeker::LOOP_START, build(Opcode::Push, &[4]).unwrap())
        .unwrap();

    assert_eq!(vm.run(), StepOutcome::Suspended);
    assert_eq!(vm.output(), &[4]);
    assert_eq!(vm.ip(), 3, "suspended at the feedback OP_INPUT");
}

#[test]
fn test_factorize_build_round_trip() {
    // Open question (i): FACTORIZE pushes the opcode enumeration index and
    // then the operands; a program can turn that back into the identical
    // chunk through BUILD_CHUNK.
    let chunk = build(Opcode::Push, &[5]).unwrap();

    let mut b = ProgramBuilder::new();
    // Entry stack: [chunk, chunk].
    b.emit(Opcode::Factorize).unwrap(); // [chunk, idx, 5]
    b.emit_push(1).unwrap();
    b.emit(Opcode::Add).unwrap(); // [chunk, idx, exponent]
    b.emit_push(OPERAND_PRIME_INDEX as u32).unwrap();
    b.emit(Opcode::Swap).unwrap(); // [chunk, idx, 1, exponent]
    b.emit_push(Opcode::Push.prime_index() as u32).unwrap();
    b.emit_push(1).unwrap();
    b.emit_push(2).unwrap();
    b.emit(Opcode::BuildChunk).unwrap(); // [chunk, idx, rebuilt]
    b.emit(Opcode::Swap).unwrap();
    b.emit(Opcode::Drop).unwrap(); // [chunk, rebuilt]
    b.emit(Opcode::CompareEq).unwrap();
    b.emit(Opcode::Print).unwrap();
    b.emit(Opcode::Halt).unwrap();
    let program = b.finish().unwrap();

    let mut vm = Vm::new(
        program,
        vec![chunk as Word, chunk as Word],
        seeded_config(1),
    );
    assert_eq!(vm.run(), StepOutcome::Halted);
    assert!(vm.error().is_none(), "error: {:?}", vm.error());
    assert_eq!(vm.output(), &[1], "rebuilt chunk must equal the original");
}

/// The failure path's attempt-commit fragment: park `PUSH(next)` in
/// address 0, compare against the last poked value, bump once on a
/// collision, and recover the final attempt from memory.
fn commit_fragment() -> uor_spec::Program {
    let mut b = ProgramBuilder::new();
    // Entry stack: [SFC, LPV, NA].
    b.emit(Opcode::Dup).unwrap();
    b.emit_push(1).unwrap();
    b.emit(Opcode::Add).unwrap(); // exponent = NA + 1
    b.emit_push(OPERAND_PRIME_INDEX as u32).unwrap();
    b.emit(Opcode::Swap).unwrap();
    b.emit_push(Opcode::Push.prime_index() as u32).unwrap();
    b.emit_push(1).unwrap();
    b.emit_push(2).unwrap();
    b.emit(Opcode::BuildChunk).unwrap(); // [SFC, LPV, NA, chunk]
    b.emit_push(0).unwrap();
    b.emit(Opcode::PokeChunk).unwrap(); // [SFC, LPV, NA]
    b.emit(Opcode::CompareEq).unwrap(); // [SFC, same]
    let distinct = b.forward_addr().unwrap();
    b.emit(Opcode::JumpIfZero).unwrap();
    // Collision: recover, bump, re-poke.
    b.emit_push(0).unwrap();
    b.emit(Opcode::PeekChunk).unwrap();
    b.emit(Opcode::Factorize).unwrap();
    b.emit(Opcode::Swap).unwrap();
    b.emit(Opcode::Drop).unwrap(); // [SFC, NA]
    b.emit_push(1).unwrap();
    b.emit(Opcode::Add).unwrap();
    b.emit_push(goal_seeker::ATTEMPT_MODULUS).unwrap();
    b.emit(Opcode::Mod).unwrap(); // [SFC, NA']
    b.emit(Opcode::Print).unwrap();
    b.emit(Opcode::Halt).unwrap();
    b.bind(distinct);
    b.emit_push(0).unwrap();
    b.emit(Opcode::PeekChunk).unwrap();
    b.emit(Opcode::Factorize).unwrap();
    b.emit(Opcode::Swap).unwrap();
    b.emit(Opcode::Drop).unwrap(); // [SFC, att]
    b.emit(Opcode::Print).unwrap();
    b.emit(Opcode::Halt).unwrap();
    b.finish().unwrap()
}

#[test]
fn test_attempt_commit_bumps_on_collision() {
    // Last poked value 4, candidate 4 (as a hypothetical offset 9 would
    // produce): the retry path adds one, yielding 5.
    let mut vm = Vm::new(commit_fragment(), vec![0, 4, 4], seeded_config(1));
    assert_eq!(vm.run(), StepOutcome::Halted);
    assert!(vm.error().is_none(), "error: {:?}", vm.error());
    assert_eq!(vm.output(), &[5]);
}

#[test]
fn test_attempt_commit_accepts_distinct_value() {
    // Last poked value 4, candidate 7: accepted unchanged.
    let mut vm = Vm::new(commit_fragment(), vec![0, 4, 7], seeded_config(1));
    assert_eq!(vm.run(), StepOutcome::Halted);
    assert!(vm.error().is_none(), "error: {:?}", vm.error());
    assert_eq!(vm.output(), &[7]);
}

#[test]
fn test_untouched_memory_stays_identical() {
    // A program without POKE_CHUNK leaves memory bit-identical each step.
    let mut b = ProgramBuilder::new();
    b.emit_push(6).unwrap();
    b.emit(Opcode::Dup).unwrap();
    b.emit(Opcode::Print).unwrap();
    b.emit(Opcode::Drop).unwrap();
    b.emit(Opcode::Halt).unwrap();
    let program = b.finish().unwrap();

    let mut vm = Vm::new(program, vec![], seeded_config(1));
    let before = vm.memory().to_vec();
    while vm.step() == StepOutcome::Executed {
        assert_eq!(vm.memory(), &before[..]);
    }
    assert_eq!(vm.memory(), &before[..]);
}

#[test]
fn test_goal_seeker_program_text_round_trip() {
    let program = goal_seeker::program();
    let text = program.to_text();
    let reloaded = uor_spec::Program::from_text(&text).unwrap();
    assert_eq!(program.chunks(), reloaded.chunks());
}

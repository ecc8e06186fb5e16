//! # Interaction Controller
//!
//! Owns the VM and mediates the suspend/resume handshake with the Teacher.
//! The controller never inspects opcodes; it relies on the program
//! protocol's deterministic alternation: an `OP_INPUT` reached after a
//! `PRINT` wants feedback, and an `OP_INPUT` reached after a success
//! branch wants the next target.

use serde::Serialize;
use uor_asm::goal_seeker;
use uor_runtime::{FrameCheck, Vm, VmConfig, Word};
use uor_spec::{build, decode, Opcode};

use crate::snapshot::{MemoryCell, Snapshot};
use crate::teacher::{Outcome, Teacher};

/// What kind of value the next `provide_input` delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    /// No VM yet.
    #[serde(rename = "IDLE")]
    Idle,
    /// The VM printed a guess and awaits a feedback code.
    #[serde(rename = "AWAITING_ATTEMPT_RESULT")]
    AwaitingAttemptResult,
    /// The VM consumed a success and awaits the next target.
    #[serde(rename = "SEND_TARGET")]
    SendTarget,
}

/// Session controller over one VM and one Teacher.
pub struct Controller<T: Teacher> {
    teacher: T,
    vm: Option<Vm>,
    phase: Phase,
    vm_config: VmConfig,
    session_error: Option<String>,
}

impl<T: Teacher> Controller<T> {
    pub fn new(teacher: T) -> Self {
        Self::with_config(teacher, VmConfig::default())
    }

    pub fn with_config(teacher: T, vm_config: VmConfig) -> Self {
        Controller {
            teacher,
            vm: None,
            phase: Phase::Idle,
            vm_config,
            session_error: None,
        }
    }

    /// Construct a fresh VM: load the canonical program, seed the state
    /// frame, prime address 0 with the initial attempt. Any previous VM is
    /// discarded.
    pub fn init(&mut self) -> Snapshot {
        self.session_error = None;
        let target = self.teacher.choose_initial_target();
        let attempt = self.teacher.initial_attempt();
        tracing::info!(
            initial_target = target,
            attempt,
            difficulty = self.teacher.difficulty_label(),
            "session init"
        );

        let mut config = self.vm_config.clone();
        if config.frame_check.is_none() {
            config.frame_check = Some(FrameCheck {
                address: goal_seeker::LOOP_START,
                depth: goal_seeker::STATE_FRAME_DEPTH,
            });
        }

        let frame = vec![
            attempt as Word,
            0,
            goal_seeker::MODIFICATION_SLOT as Word,
            goal_seeker::DECISION_NOP as Word,
        ];
        let mut vm = Vm::new(goal_seeker::program(), frame, config);

        match u32::try_from(attempt)
            .map_err(|_| "initial attempt out of range".to_string())
            .and_then(|a| build(Opcode::Push, &[a]).map_err(|e| e.to_string()))
        {
            Ok(chunk) => {
                if let Err(e) = vm.poke(goal_seeker::LOOP_START, chunk) {
                    self.session_error = Some(e.to_string());
                }
            }
            Err(e) => self.session_error = Some(e),
        }

        self.vm = Some(vm);
        self.phase = Phase::AwaitingAttemptResult;
        self.snapshot()
    }

    /// Execute exactly one instruction. While suspended this is a no-op
    /// that reports the current state with `needs_input` set.
    pub fn step(&mut self) -> Snapshot {
        if let Some(vm) = &mut self.vm {
            if vm.pending_input() {
                tracing::debug!("step while suspended ignored");
            } else {
                vm.step();
            }
        }
        self.snapshot()
    }

    /// Resume a suspended VM with `value`, or with a Teacher-derived value
    /// for the current phase when `value` is absent. The IP advances by
    /// one; no further instructions execute in this call.
    pub fn provide_input(&mut self, value: Option<Word>) -> Snapshot {
        let suspended = self.vm.as_ref().map(Vm::pending_input).unwrap_or(false);
        if !suspended {
            if self.vm.is_some() {
                tracing::warn!("provide_input while not suspended ignored");
            }
            return self.snapshot();
        }

        let delivered = match self.phase {
            Phase::SendTarget => {
                let v = value.unwrap_or_else(|| self.teacher.current_target() as Word);
                self.phase = Phase::AwaitingAttemptResult;
                tracing::info!(value = %v, "target delivered");
                v
            }
            Phase::AwaitingAttemptResult => match value {
                Some(v) => {
                    if v == goal_seeker::FEEDBACK_SUCCESS as Word {
                        self.phase = Phase::SendTarget;
                    }
                    tracing::info!(feedback = %v, "caller-supplied feedback delivered");
                    v
                }
                None => {
                    let guess = self
                        .vm
                        .as_ref()
                        .and_then(|vm| vm.output().last().copied());
                    self.feedback_for(guess)
                }
            },
            Phase::Idle => return self.snapshot(),
        };

        if let Some(vm) = &mut self.vm {
            vm.provide_input(delivered);
        }
        self.snapshot()
    }

    /// Evaluate the latest printed attempt and advance the Teacher.
    fn feedback_for(&mut self, guess: Option<Word>) -> Word {
        let Some(guess) = guess else {
            tracing::warn!("no printed attempt to evaluate, reporting failure");
            return goal_seeker::FEEDBACK_FAILURE as Word;
        };
        if guess == goal_seeker::STUCK_SIGNAL as Word {
            tracing::warn!("latest output is the stuck signal, reporting failure");
            return goal_seeker::FEEDBACK_FAILURE as Word;
        }

        let guess = i64::try_from(guess).unwrap_or(i64::MIN);
        let outcome = self.teacher.evaluate(guess);
        let attempts = self.teacher.attempts_on_target();
        let next = self.teacher.next_target(outcome, attempts);
        match outcome {
            Outcome::Success => {
                self.phase = Phase::SendTarget;
                tracing::info!(guess, attempts, next_target = next, "attempt succeeded");
                goal_seeker::FEEDBACK_SUCCESS as Word
            }
            Outcome::Failure => {
                tracing::debug!(
                    guess,
                    attempts,
                    current_target = self.teacher.current_target(),
                    "attempt failed"
                );
                goal_seeker::FEEDBACK_FAILURE as Word
            }
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn teacher(&self) -> &T {
        &self.teacher
    }

    /// Current externally visible state.
    pub fn snapshot(&self) -> Snapshot {
        let Some(vm) = &self.vm else {
            return Snapshot {
                instruction_pointer: -1,
                stack: Vec::new(),
                output_log: Vec::new(),
                halted: false,
                error: self.session_error.clone(),
                program_memory: Vec::new(),
                needs_input: false,
                interaction_phase: Phase::Idle,
                current_target: None,
                difficulty_level: self.teacher.difficulty_label().to_string(),
                attempts_on_target: 0,
            };
        };

        let program_memory = vm
            .memory()
            .iter()
            .enumerate()
            .map(|(address, &raw_chunk)| MemoryCell {
                address,
                raw_chunk,
                decoded: match decode(raw_chunk) {
                    Ok(instruction) => instruction.to_string(),
                    Err(e) => format!("INVALID ({e})"),
                },
            })
            .collect();

        Snapshot {
            instruction_pointer: vm.ip() as i64,
            stack: vm.stack().to_vec(),
            output_log: vm.output().to_vec(),
            halted: vm.halted(),
            error: vm
                .error()
                .map(|e| e.to_string())
                .or_else(|| self.session_error.clone()),
            program_memory,
            needs_input: vm.pending_input(),
            interaction_phase: self.phase,
            current_target: Some(self.teacher.current_target()),
            difficulty_level: self.teacher.difficulty_label().to_string(),
            attempts_on_target: self.teacher.attempts_on_target(),
        }
    }
}

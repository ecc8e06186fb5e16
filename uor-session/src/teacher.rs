//! # Teacher
//!
//! The Teacher chooses targets, judges printed attempts, and adapts the
//! difficulty of future targets. The controller only sees the trait, so
//! the heuristic stays replaceable; tests substitute scripted Teachers.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Verdict on one printed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

/// Target selection and evaluation contract.
pub trait Teacher {
    /// Pick the target for a fresh session, resetting internal state.
    fn choose_initial_target(&mut self) -> i64;

    /// The attempt primed into address 0 at init.
    fn initial_attempt(&mut self) -> i64;

    /// Judge a printed attempt against the current target.
    fn evaluate(&mut self, guess: i64) -> Outcome;

    /// Advance target/difficulty state after an evaluated attempt and
    /// return the target the next `SEND_TARGET` delivery will use.
    fn next_target(&mut self, previous_outcome: Outcome, attempts_on_current: u32) -> i64;

    fn current_target(&self) -> i64;

    fn attempts_on_target(&self) -> u32;

    /// Opaque label for display.
    fn difficulty_label(&self) -> &str;
}

/// Difficulty band for the adaptive Teacher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

struct DifficultyParams {
    range_max: i64,
    max_attempts_before_struggle: u32,
    quick_success_threshold: u32,
}

impl Difficulty {
    fn params(self) -> DifficultyParams {
        match self {
            Difficulty::Easy => DifficultyParams {
                range_max: 4,
                max_attempts_before_struggle: 5,
                quick_success_threshold: 1,
            },
            Difficulty::Medium => DifficultyParams {
                range_max: 9,
                max_attempts_before_struggle: 4,
                quick_success_threshold: 1,
            },
            Difficulty::Hard => DifficultyParams {
                range_max: 14,
                max_attempts_before_struggle: 3,
                quick_success_threshold: 2,
            },
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "EASY",
            Difficulty::Medium => "MEDIUM",
            Difficulty::Hard => "HARD",
        }
    }

    fn harder(self) -> Self {
        match self {
            Difficulty::Easy => Difficulty::Medium,
            Difficulty::Medium | Difficulty::Hard => Difficulty::Hard,
        }
    }

    fn easier(self) -> Self {
        match self {
            Difficulty::Hard => Difficulty::Medium,
            Difficulty::Medium | Difficulty::Easy => Difficulty::Easy,
        }
    }
}

/// Consecutive quick successes that raise the difficulty.
pub const QUICK_SUCCESS_STREAK_TO_ADVANCE: u32 = 3;

/// Consecutive struggles that lower the difficulty.
pub const STRUGGLE_STREAK_TO_RELAX: u32 = 2;

/// The canonical Teacher: seeded targets, three difficulty bands, streak
/// tracking in both directions. Sessions start at `MEDIUM`, so the initial
/// target stays below the attempt modulus.
pub struct AdaptiveTeacher {
    rng: StdRng,
    difficulty: Difficulty,
    target: i64,
    attempts: u32,
    quick_successes: u32,
    struggles: u32,
}

impl AdaptiveTeacher {
    pub fn new(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    fn with_rng(rng: StdRng) -> Self {
        AdaptiveTeacher {
            rng,
            difficulty: Difficulty::Medium,
            target: 0,
            attempts: 0,
            quick_successes: 0,
            struggles: 0,
        }
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    fn draw_target(&mut self) -> i64 {
        let range_max = self.difficulty.params().range_max;
        self.rng.gen_range(0..=range_max)
    }
}

impl Teacher for AdaptiveTeacher {
    fn choose_initial_target(&mut self) -> i64 {
        self.attempts = 0;
        self.quick_successes = 0;
        self.struggles = 0;
        self.target = self.draw_target();
        tracing::info!(
            chosen = self.target,
            difficulty = self.difficulty.label(),
            "initial target chosen"
        );
        self.target
    }

    fn initial_attempt(&mut self) -> i64 {
        // The first attempt is primed at the target, so a fresh session
        // opens with an immediate success.
        self.target
    }

    fn evaluate(&mut self, guess: i64) -> Outcome {
        self.attempts += 1;
        if guess == self.target {
            Outcome::Success
        } else {
            Outcome::Failure
        }
    }

    fn next_target(&mut self, previous_outcome: Outcome, attempts_on_current: u32) -> i64 {
        let params = self.difficulty.params();
        match previous_outcome {
            Outcome::Success => {
                self.struggles = 0;
                if attempts_on_current <= params.quick_success_threshold {
                    self.quick_successes += 1;
                    if self.quick_successes >= QUICK_SUCCESS_STREAK_TO_ADVANCE {
                        self.difficulty = self.difficulty.harder();
                        self.quick_successes = 0;
                        tracing::info!(
                            difficulty = self.difficulty.label(),
                            "difficulty raised"
                        );
                    }
                } else {
                    self.quick_successes = 0;
                }
                self.attempts = 0;
                self.target = self.draw_target();
                tracing::debug!(chosen = self.target, "next target drawn");
            }
            Outcome::Failure => {
                if attempts_on_current >= params.max_attempts_before_struggle {
                    self.quick_successes = 0;
                    self.struggles += 1;
                    if self.struggles >= STRUGGLE_STREAK_TO_RELAX {
                        self.difficulty = self.difficulty.easier();
                        self.struggles = 0;
                        self.attempts = 0;
                        self.target = self.draw_target();
                        tracing::info!(
                            difficulty = self.difficulty.label(),
                            chosen = self.target,
                            "difficulty relaxed, target re-drawn"
                        );
                    }
                }
            }
        }
        self.target
    }

    fn current_target(&self) -> i64 {
        self.target
    }

    fn attempts_on_target(&self) -> u32 {
        self.attempts
    }

    fn difficulty_label(&self) -> &str {
        self.difficulty.label()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_target_within_modulus() {
        for seed in 0..32 {
            let mut teacher = AdaptiveTeacher::new(seed);
            let target = teacher.choose_initial_target();
            assert!((0..=9).contains(&target));
            assert_eq!(teacher.initial_attempt(), target);
        }
    }

    #[test]
    fn test_evaluate_counts_attempts() {
        let mut teacher = AdaptiveTeacher::new(1);
        let target = teacher.choose_initial_target();
        assert_eq!(teacher.evaluate(target + 1), Outcome::Failure);
        assert_eq!(teacher.evaluate(target), Outcome::Success);
        assert_eq!(teacher.attempts_on_target(), 2);
    }

    #[test]
    fn test_quick_success_streak_raises_difficulty() {
        let mut teacher = AdaptiveTeacher::new(2);
        teacher.choose_initial_target();
        assert_eq!(teacher.difficulty(), Difficulty::Medium);
        for _ in 0..QUICK_SUCCESS_STREAK_TO_ADVANCE {
            let target = teacher.current_target();
            assert_eq!(teacher.evaluate(target), Outcome::Success);
            teacher.next_target(Outcome::Success, teacher.attempts_on_target());
        }
        assert_eq!(teacher.difficulty(), Difficulty::Hard);
    }

    #[test]
    fn test_struggle_streak_relaxes_difficulty() {
        let mut teacher = AdaptiveTeacher::new(3);
        teacher.choose_initial_target();
        // Two rounds of "enough failed attempts" on a target.
        for _ in 0..STRUGGLE_STREAK_TO_RELAX {
            for _ in 0..5 {
                teacher.evaluate(teacher.current_target() + 1);
            }
            teacher.next_target(Outcome::Failure, teacher.attempts_on_target());
        }
        assert_eq!(teacher.difficulty(), Difficulty::Easy);
        assert_eq!(teacher.attempts_on_target(), 0);
    }

    #[test]
    fn test_slow_success_resets_quick_streak() {
        let mut teacher = AdaptiveTeacher::new(4);
        teacher.choose_initial_target();
        for round in 0..6 {
            // Alternate quick and slow successes; difficulty never rises.
            let attempts = if round % 2 == 0 { 1 } else { 3 };
            for _ in 0..attempts {
                teacher.evaluate(teacher.current_target() + 1);
            }
            teacher.next_target(Outcome::Success, attempts);
            assert_eq!(teacher.difficulty(), Difficulty::Medium);
        }
    }

    #[test]
    fn test_seeded_teacher_is_reproducible() {
        let mut a = AdaptiveTeacher::new(99);
        let mut b = AdaptiveTeacher::new(99);
        assert_eq!(a.choose_initial_target(), b.choose_initial_target());
        assert_eq!(
            a.next_target(Outcome::Success, 1),
            b.next_target(Outcome::Success, 1)
        );
    }
}

//! # UOR Session
//!
//! The interaction layer around the VM: a controller exposing the
//! `init` / `step` / `provide_input` surface, the Teacher that chooses and
//! judges targets, and serializable VM snapshots.

pub mod controller;
pub mod snapshot;
pub mod teacher;

pub use controller::{Controller, Phase};
pub use snapshot::{MemoryCell, Snapshot};
pub use teacher::{AdaptiveTeacher, Difficulty, Outcome, Teacher};

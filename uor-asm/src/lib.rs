//! # UOR Assembly
//!
//! Builds chunk streams programmatically: a sequential emitter with
//! forward-reference patching, and the canonical self-modifying
//! goal-seeker program.

pub mod builder;
pub mod goal_seeker;

pub use builder::{AddrRef, AsmError, ProgramBuilder, ADDR_REF_WIDTH, IMMEDIATE_LIMIT, WIDE_SPLIT};

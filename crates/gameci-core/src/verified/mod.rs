//! Pure functions for gameci run logic.
//!
//! These functions hold the deterministic parts of a run (version parsing,
//! image naming, editor argument vectors, workspace filtering) so they can be
//! tested without a container runtime.
//!
//! # Tiger Style
//!
//! - Pure functions with no side effects
//! - Deterministic: same inputs always produce same outputs
//! - No I/O or system calls

mod command;
mod image;
mod version;
mod workspace;

pub use command::*;
pub use image::*;
pub use version::*;
pub use workspace::*;

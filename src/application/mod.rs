//! Application layer - Visit orchestration
//!
//! This layer decides which sequence a visitor sees and owns the flag
//! lifecycle of a visit. It depends on domain traits, not on concrete
//! repositories.

pub mod session;

pub use session::*;

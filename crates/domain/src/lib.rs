//! Shared types for the sllmi crates: the error taxonomy, generation and
//! provider configuration, stream aliases and structured trace events.

pub mod config;
pub mod error;
pub mod stream;
pub mod trace;

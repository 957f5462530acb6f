//! ui
//!
//! User interaction utilities.
//!
//! # Modules
//!
//! - [`prompts`] - Credential prompts
//! - [`output`] - Output formatting and display
//!
//! # Design
//!
//! All user-facing output and prompts go through this module. Diagnostics for
//! developers go through `tracing` instead.

pub mod output;
pub mod prompts;

//! core
//!
//! Settings and storage locations shared by the CLI and the auth layer.
//!
//! # Modules
//!
//! - [`config`] - Configuration schema and loading
//! - [`paths`] - Centralized path routing for scan storage

pub mod config;
pub mod paths;

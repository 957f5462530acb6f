//! hubscan - Docker Hub ScanID authentication
//!
//! Obtains, validates, and caches the signed ScanID token that authorizes
//! image scans against Docker Hub.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to auth)
//! - [`auth`] - Token cache, validator, and the [`auth::Authenticator`]
//! - [`hub`] - Docker Hub HTTP client and key-set resolution
//! - [`core`] - Settings and storage paths
//! - [`ui`] - User interaction utilities
//!
//! # Correctness Invariants
//!
//! 1. A cached token is reused only if its signature verifies against the
//!    current key set and it has not expired beyond the leeway
//! 2. The token cache is replaced atomically and never loses other users' entries
//! 3. Tokens and credentials never appear in logs or error messages

pub mod auth;
pub mod cli;
pub mod core;
pub mod hub;
pub mod ui;

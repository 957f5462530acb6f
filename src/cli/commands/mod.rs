//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Async Commands
//!
//! `token` and `status` talk to Docker Hub. They are synchronous wrappers
//! that build a tokio runtime and race the async work against Ctrl-C and,
//! on unix, SIGTERM.

mod completion;
mod logout;
mod status;
mod token;

// Re-export command functions for testing and direct invocation
pub use completion::{completion, write_completion};
pub use logout::logout;
pub use status::status;
pub use token::token;

use std::future::Future;

use anyhow::Result;

use super::args::Command;
use super::Context;
use crate::auth::AuthError;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Token {
            username,
            password_stdin,
        } => token(ctx, &username, password_stdin),
        Command::Status { username } => status(ctx, &username),
        Command::Logout { username } => logout(ctx, &username),
        Command::Completion { shell } => completion(shell),
    }
}

/// Build the runtime async command work runs on.
///
/// One runtime per command: the HTTP client built by
/// [`Authenticator::connect`](crate::auth::Authenticator::connect) is tied to it.
fn runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Runtime::new()?)
}

/// Run `fut` to completion on a fresh runtime unless interrupted.
fn run_cancellable<T, F>(fut: F) -> Result<T>
where
    F: Future<Output = Result<T, AuthError>>,
{
    Ok(runtime()?.block_on(cancellable(fut))?)
}

/// Await `fut` unless the process is asked to stop first.
///
/// Dropping the future aborts in-flight requests. The token cache is only
/// ever replaced by rename, so an interrupt never leaves it truncated.
async fn cancellable<T, F>(fut: F) -> Result<T, AuthError>
where
    F: Future<Output = Result<T, AuthError>>,
{
    tokio::select! {
        result = fut => result,
        () = shutdown_signal() => Err(AuthError::Cancelled),
    }
}

/// Resolves on Ctrl-C, or on SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(target: "hubscan.cli", error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!(target: "hubscan.cli", error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}

//! cli::commands::token
//!
//! Print a valid ScanID for a Docker Hub user.
//!
//! # Design
//!
//! - The token is the only thing written to stdout
//! - A reusable cached token is printed without asking for a password
//! - Otherwise the password is prompted without echo, or read from stdin with `--password-stdin`
//! - A token that could not be cached is still printed, with a warning

use anyhow::{Context as _, Result};

use super::{cancellable, runtime};
use crate::auth::{AuthError, Authenticator, Identity};
use crate::cli::Context;
use crate::ui::output::{self, Verbosity};
use crate::ui::prompts;

/// Run the token command.
pub fn token(ctx: &Context, username: &str, password_stdin: bool) -> Result<()> {
    if username.trim().is_empty() {
        return Err(AuthError::NotLoggedIn.into());
    }

    let settings = ctx.settings()?;
    let rt = runtime()?;
    let auth = rt
        .block_on(cancellable(Authenticator::connect(&settings)))
        .map_err(|err| with_hint(err, ctx.verbosity))?;

    if let Some(token) = rt
        .block_on(cancellable(auth.cached_token(username)))
        .map_err(|err| with_hint(err, ctx.verbosity))?
    {
        output::debug("scan token cached", ctx.verbosity);
        output::result(token);
        return Ok(());
    }

    let password = if password_stdin {
        prompts::read_secret(std::io::stdin().lock())
    } else {
        prompts::password("Docker Hub password: ", ctx.interactive)
    }
    .context("Failed to read password")?;
    let identity = Identity::new(username, password);

    let issued = rt
        .block_on(cancellable(auth.get_token(&identity)))
        .map_err(|err| with_hint(err, ctx.verbosity))?;

    output::debug(format!("scan token {}", issued.origin), ctx.verbosity);
    if let Some(err) = &issued.persist_error {
        output::warn(
            format!(
                "the scan token could not be cached and will be negotiated again next time: {}",
                err
            ),
            ctx.verbosity,
        );
    }

    output::result(&issued.token);
    Ok(())
}

/// Print what the user can do about `err`, then hand it back.
fn with_hint(err: AuthError, verbosity: Verbosity) -> AuthError {
    if let Some(hint) = hint_for(&err) {
        output::print(format!("hint: {}", hint), verbosity);
    }
    err
}

fn hint_for(err: &AuthError) -> Option<&'static str> {
    if err.needs_login() {
        Some("check the Docker Hub username and password")
    } else if err.is_transient() {
        Some("Docker Hub looks temporarily unavailable, try again shortly")
    } else {
        None
    }
}

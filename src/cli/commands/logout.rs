//! cli::commands::logout
//!
//! Remove the cached ScanID for a user. Other users' tokens are kept.

use anyhow::{Context as _, Result};

use crate::auth::TokenCache;
use crate::cli::Context;
use crate::ui::output;

/// Run the logout command.
pub fn logout(ctx: &Context, username: &str) -> Result<()> {
    let settings = ctx.settings()?;
    let cache = TokenCache::new(&settings.tokens_path);

    let removed = cache
        .remove_local_token(username)
        .context("Failed to update the token cache")?;

    if removed {
        output::print(format!("Removed cached token for {}", username), ctx.verbosity);
    } else {
        output::print(format!("No cached token for {}", username), ctx.verbosity);
    }
    Ok(())
}

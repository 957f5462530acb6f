//! cli::commands::status
//!
//! Report whether the cached ScanID for a user would be reused.
//!
//! Only the key set is fetched; Docker Hub login is never attempted.

use anyhow::Result;

use super::run_cancellable;
use crate::auth::{Authenticator, TokenCache};
use crate::cli::Context;
use crate::ui::output;

/// Run the status command.
///
/// Prints `valid`, or the reason the cached token would be replaced.
pub fn status(ctx: &Context, username: &str) -> Result<()> {
    let settings = ctx.settings()?;

    // Nothing cached: no need to fetch keys.
    if TokenCache::new(&settings.tokens_path)
        .get_local_token(username)
        .is_none()
    {
        output::result(format!("no cached token for {}", username));
        return Ok(());
    }

    let status = run_cancellable(async {
        let auth = Authenticator::connect(&settings).await?;
        auth.cached_token_status(username).await
    })?;
    output::result(status);
    Ok(())
}

//! Confirmation prompt with non-interactive fallback

use super::context::UiContext;
use crate::error::{AwsmapError, AwsmapResult};

/// Ask a yes/no question.
///
/// Auto-yes answers `true`; a non-interactive terminal answers `default`.
pub async fn confirm(ctx: &UiContext, message: &str, default: bool) -> AwsmapResult<bool> {
    if ctx.auto_yes() {
        println!("  {} (auto-approved)", message);
        return Ok(true);
    }

    if !ctx.is_interactive() {
        return Ok(default);
    }

    let message = message.to_string();
    tokio::task::spawn_blocking(move || {
        cliclack::confirm(&message)
            .initial_value(default)
            .interact()
    })
    .await
    .map_err(|e| AwsmapError::User(format!("Prompt task failed: {}", e)))?
    .map_err(|e| AwsmapError::User(format!("Prompt failed: {}", e)))
}

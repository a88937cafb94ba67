//! Confirmation prompt

use super::UiContext;
use crate::error::{ShowcaseError, ShowcaseResult};

/// Ask a yes/no question
///
/// Returns `true` under `--yes` and `default` when not interactive.
pub async fn confirm(ctx: &UiContext, message: &str, default: bool) -> ShowcaseResult<bool> {
    if ctx.auto_yes() {
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
    .map_err(|e| ShowcaseError::Internal(format!("prompt task failed: {}", e)))?
    .map_err(|e| ShowcaseError::User(format!("Prompt failed: {}", e)))
}

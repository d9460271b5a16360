//! Yes/no prompt guarding destructive commands

use super::context::UiContext;
use crate::error::{FestError, FestResult};

/// Ask before a destructive step.
///
/// `--yes` approves without asking. Without a terminal the prompt cannot be
/// shown and `default` is the answer.
pub async fn confirm(ctx: &UiContext, message: &str, default: bool) -> FestResult<bool> {
    match (ctx.auto_yes(), ctx.is_interactive()) {
        (true, _) => {
            println!("  {} (auto-approved)", message);
            Ok(true)
        }
        (false, false) => Ok(default),
        (false, true) => ask(message.to_string(), default).await,
    }
}

async fn ask(message: String, default: bool) -> FestResult<bool> {
    let prompt_failed = |e: &dyn std::fmt::Display| FestError::User(format!("Prompt failed: {}", e));

    // cliclack reads stdin synchronously
    tokio::task::spawn_blocking(move || {
        cliclack::confirm(message)
            .initial_value(default)
            .interact()
    })
    .await
    .map_err(|e| prompt_failed(&e))?
    .map_err(|e| prompt_failed(&e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn yes_flag_approves() {
        let ctx = UiContext::non_interactive().with_auto_yes(true);
        assert!(confirm(&ctx, "Remove every cache generation?", false).await.unwrap());
    }

    #[tokio::test]
    async fn without_terminal_default_wins() {
        let ctx = UiContext::non_interactive();
        assert!(confirm(&ctx, "Delete Mime 1st?", true).await.unwrap());
        assert!(!confirm(&ctx, "Delete Mime 1st?", false).await.unwrap());
    }
}

//! Interactive prompts with CI/non-interactive fallback

use super::context::UiContext;
use crate::error::{RegistryError, RegistryResult};

/// Prompt for confirmation, returns default if non-interactive or auto-yes
pub fn confirm(ctx: &UiContext, message: &str, default: bool) -> RegistryResult<bool> {
    if ctx.auto_yes() {
        println!("  {} (auto-approved)", message);
        return Ok(true);
    }

    if !ctx.is_interactive() {
        return Ok(default);
    }

    cliclack::confirm(message)
        .initial_value(default)
        .interact()
        .map_err(|e| RegistryError::User(format!("Prompt failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirm_auto_yes() {
        let ctx = UiContext::non_interactive().with_auto_yes(true);
        assert!(confirm(&ctx, "Delete?", false).unwrap());
    }

    #[test]
    fn confirm_non_interactive_default() {
        let ctx = UiContext::non_interactive();
        assert!(confirm(&ctx, "Delete?", true).unwrap());
        assert!(!confirm(&ctx, "Delete?", false).unwrap());
    }
}

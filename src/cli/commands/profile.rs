//! Profile command - base profile status and registry profiles

use super::CommandContext;
use crate::cli::args::ProfileArgs;
use crate::error::RegistryResult;
use crate::ui::{self, UiContext};

/// Execute the profile command
pub fn execute(args: ProfileArgs, ctx: &CommandContext) -> RegistryResult<()> {
    let base = ctx.resolver().base_profile();

    if args.raw {
        match base {
            Some(profile) => println!("{}", profile.source()),
            None => ui::step_warn(&UiContext::detect(), "Base profile unavailable"),
        }
        return Ok(());
    }

    let ui_ctx = UiContext::detect();
    ui::intro(&ui_ctx, "Profiles");

    ui::section(&ui_ctx, "Base profile");
    if let Some(locator) = ctx.resolver().base_profile_locator() {
        ui::key_value(&ui_ctx, "Source", locator.uri());
        ui::key_value(&ui_ctx, "Cache", &locator.cache_file().display().to_string());
    }
    match &base {
        Some(profile) => {
            ui::key_value_status(&ui_ctx, "Status", "available", true);
            ui::key_value(&ui_ctx, "Name", profile.name());
            ui::key_value(&ui_ctx, "Id", profile.id());
        }
        None => ui::key_value_status(&ui_ctx, "Status", "unavailable", false),
    }

    // Registry profiles only when a registry was selected
    if ctx.address().is_ok() {
        let registry = ctx.registry()?;
        ui::section(&ui_ctx, &format!("Profiles in {}", registry.address()));
        let profiles = registry.profiles();
        if profiles.is_empty() {
            ui::step_info(&ui_ctx, "No profiles");
        }
        for profile in profiles {
            ui::key_value(&ui_ctx, profile.name(), profile.id());
        }
    }

    Ok(())
}

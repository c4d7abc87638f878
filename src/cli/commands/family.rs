//! Family command - create or delete families

use super::CommandContext;
use crate::cli::args::{FamilyAction, FamilyArgs};
use crate::error::RegistryResult;
use crate::ui::{self, UiContext};

/// Execute the family command
pub fn execute(args: FamilyArgs, ctx: &CommandContext) -> RegistryResult<()> {
    let registry = ctx.registry()?;

    match args.action {
        FamilyAction::Create {
            name,
            profile,
            description,
        } => {
            let family = registry.create_family(&name, profile.as_deref(), &description)?;
            let ui_ctx = UiContext::detect();
            match family.profile() {
                Some(p) => ui::step_ok_detail(
                    &ui_ctx,
                    &format!("Created family {}", family.name()),
                    p.name(),
                ),
                None => ui::step_ok(&ui_ctx, &format!("Created family {}", family.name())),
            }
        }
        FamilyAction::Delete { name, yes } => {
            let ui_ctx = UiContext::detect().with_auto_yes(yes);
            let family = registry.get_family(&name)?;
            let count = family.components()?.len();

            let prompt = format!("Delete family {} and its {} component(s)?", name, count);
            if !ui::confirm(&ui_ctx, &prompt, false)? {
                ui::step_warn_hint(&ui_ctx, "Nothing deleted", "Pass --yes to skip the prompt");
                return Ok(());
            }

            registry.remove_family(&name)?;
            ui::step_ok(&ui_ctx, &format!("Deleted family {}", name));
        }
    }

    Ok(())
}

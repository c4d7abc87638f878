//! Delete command - remove a component with all its versions

use super::CommandContext;
use crate::cli::args::DeleteArgs;
use crate::error::RegistryResult;
use crate::ui::{self, UiContext};

/// Execute the delete command
pub fn execute(args: DeleteArgs, ctx: &CommandContext) -> RegistryResult<()> {
    let ui_ctx = UiContext::detect().with_auto_yes(args.yes);
    let family = ctx.registry()?.get_family(&args.family)?;

    // Surface a missing component before prompting
    let component = family.get_component(&args.component)?;
    let count = component.versions().len();

    let prompt = format!(
        "Delete {}/{} and its {} version(s)?",
        args.family, args.component, count
    );
    if !ui::confirm(&ui_ctx, &prompt, false)? {
        ui::step_warn_hint(&ui_ctx, "Nothing deleted", "Pass --yes to skip the prompt");
        return Ok(());
    }

    family.remove_component(&args.component)?;
    ui::step_ok(
        &ui_ctx,
        &format!("Deleted {}/{}", args.family, args.component),
    );
    Ok(())
}

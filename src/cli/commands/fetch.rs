//! Fetch command - write a version's artifact out

use super::CommandContext;
use crate::cli::args::FetchArgs;
use crate::error::{RegistryError, RegistryResult};
use crate::registry::VersionSelector;
use crate::ui::{self, TaskSpinner, UiContext};
use std::io::Write;

/// Execute the fetch command
pub fn execute(args: FetchArgs, ctx: &CommandContext) -> RegistryResult<()> {
    let selector: VersionSelector = args.version.parse()?;
    let version = ctx
        .registry()?
        .get_family(&args.family)?
        .get_component(&args.component)?
        .get_version(selector)?;

    let Some(path) = args.output else {
        // Raw bytes on stdout; nothing else may be printed there
        let bundle = version.artifact()?;
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(bundle.as_bytes())
            .and_then(|_| stdout.flush())
            .map_err(|e| RegistryError::io("writing artifact to stdout", e))?;
        return Ok(());
    };

    let ui_ctx = UiContext::detect();
    let mut spinner = TaskSpinner::new(&ui_ctx);
    spinner.start(&format!("Fetching {}...", version.id()));

    let bundle = match version.artifact() {
        Ok(bundle) => bundle,
        Err(e) => {
            spinner.stop_error("Fetch failed");
            return Err(e);
        }
    };
    bundle.write_to(&path)?;
    spinner.stop(&format!("Fetched v{} of {}", version.number(), args.component));

    ui::step_ok_detail(
        &ui_ctx,
        &format!("Wrote {} bytes", bundle.len()),
        &path.display().to_string(),
    );
    Ok(())
}

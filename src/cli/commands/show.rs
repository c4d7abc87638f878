//! Show command - details of one component version

use super::CommandContext;
use crate::cli::args::{OutputFormat, ShowArgs};
use crate::error::RegistryResult;
use crate::registry::VersionSelector;
use crate::ui::{self, UiContext};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct VersionDetail {
    registry: String,
    family: String,
    component: String,
    component_id: String,
    version: u32,
    description: String,
    help_url: Option<String>,
    size_bytes: Option<usize>,
    checksum: Option<String>,
    artifact_error: Option<String>,
}

/// Execute the show command
pub fn execute(args: ShowArgs, ctx: &CommandContext) -> RegistryResult<()> {
    let selector: VersionSelector = args.version.parse()?;
    let component = ctx
        .registry()?
        .get_family(&args.family)?
        .get_component(&args.component)?;
    let version = component.get_version(selector)?;

    // Metadata stays usable when the artifact cannot be fetched
    let (size_bytes, checksum, artifact_error) = match version.artifact() {
        Ok(bundle) => (Some(bundle.len()), Some(bundle.checksum()), None),
        Err(e) => (None, None, Some(e.to_string())),
    };

    let detail = VersionDetail {
        registry: ctx.address()?.to_string(),
        family: version.family_name().to_string(),
        component: version.component_name().to_string(),
        component_id: version.component_id().to_string(),
        version: version.number(),
        description: version.description().to_string(),
        help_url: version.help_url(),
        size_bytes,
        checksum,
        artifact_error,
    };

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&detail)?),
        OutputFormat::Plain => println!("{}", version.id()),
        OutputFormat::Table => print_detail(&detail),
    }

    Ok(())
}

fn print_detail(detail: &VersionDetail) {
    let ctx = UiContext::detect();
    ui::intro(
        &ctx,
        &format!("{}/{} v{}", detail.family, detail.component, detail.version),
    );

    ui::key_value(&ctx, "Registry", &detail.registry);
    ui::key_value(&ctx, "Component id", &detail.component_id);
    if !detail.description.is_empty() {
        ui::key_value(&ctx, "Description", &detail.description);
    }
    if let Some(url) = &detail.help_url {
        ui::key_value(&ctx, "Help", url);
    }

    match (&detail.size_bytes, &detail.checksum, &detail.artifact_error) {
        (Some(size), Some(checksum), _) => {
            ui::key_value_status(&ctx, "Artifact", &format!("{} bytes", size), true);
            ui::key_value(&ctx, "SHA-256", checksum);
        }
        (_, _, Some(err)) => ui::key_value_status(&ctx, "Artifact", err, false),
        _ => {}
    }
}

//! Publishing commands - create components and add versions

use super::CommandContext;
use crate::bundle::Bundle;
use crate::cli::args::{AddVersionArgs, CreateArgs};
use crate::error::{RegistryError, RegistryResult};
use crate::registry::{BackendKind, PublishOptions, SharingPolicy, Version};
use crate::ui::{self, UiContext};

/// Execute the create command
pub fn create(args: CreateArgs, ctx: &CommandContext) -> RegistryResult<()> {
    let sharing = SharingPolicy::parse(&args.sharing).ok_or_else(|| {
        RegistryError::User(format!(
            "Invalid sharing policy: {}. Use private, public or group:<id>",
            args.sharing
        ))
    })?;
    let bundle = Bundle::read_from(&args.bundle)?;

    let registry = ctx.registry()?;
    if let Some(license) = &args.license {
        if registry.kind() == BackendKind::Remote {
            // Reject before uploading the bundle
            registry.license(license)?;
        }
    }

    let options = PublishOptions {
        license: args.license,
        sharing,
    };
    let version = registry.get_family(&args.family)?.create_component_with(
        &args.name,
        &args.description,
        &bundle,
        &options,
    )?;

    report_published(&version, "Created component");
    Ok(())
}

/// Execute the add-version command
pub fn add_version(args: AddVersionArgs, ctx: &CommandContext) -> RegistryResult<()> {
    let bundle = Bundle::read_from(&args.bundle)?;
    let component = ctx
        .registry()?
        .get_family(&args.family)?
        .get_component(&args.component)?;

    let version = component.add_version(&bundle, &args.comment)?;
    report_published(&version, "Published version");
    Ok(())
}

fn report_published(version: &Version, action: &str) {
    let ctx = UiContext::detect();
    ui::step_ok_detail(
        &ctx,
        &format!(
            "{} {}/{}",
            action,
            version.family_name(),
            version.component_name()
        ),
        &format!("v{}", version.number()),
    );
    if let Some(url) = version.help_url() {
        ui::remark(&ctx, &url);
    }
}

//! Listing commands - families, components, versions and licenses

use super::CommandContext;
use crate::cli::args::{ComponentsArgs, ListArgs, OutputFormat, VersionsArgs};
use crate::error::RegistryResult;
use crate::ui::{self, UiContext};
use console::style;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct FamilyRow {
    name: String,
    id: String,
    profile: Option<String>,
    description: String,
}

#[derive(Debug, Serialize)]
struct ComponentRow {
    name: String,
    id: String,
    latest: Option<u32>,
    description: String,
}

#[derive(Debug, Serialize)]
struct VersionRow {
    number: u32,
    description: String,
    help_url: Option<String>,
}

/// Execute the families command
pub fn families(args: ListArgs, ctx: &CommandContext) -> RegistryResult<()> {
    let registry = ctx.registry()?;
    let rows: Vec<FamilyRow> = registry
        .families()?
        .iter()
        .map(|family| FamilyRow {
            name: family.name().to_string(),
            id: family.id().to_string(),
            profile: family.profile().map(|p| p.name().to_string()),
            description: family.description().to_string(),
        })
        .collect();

    if rows.is_empty() {
        return print_empty(args.format, "No families in this registry");
    }

    match args.format {
        OutputFormat::Table => {
            let ui_ctx = UiContext::detect();
            ui::intro(&ui_ctx, &format!("Families in {}", registry.address()));

            println!(
                "{:<24} {:<16} {:<40}",
                style("NAME").bold(),
                style("PROFILE").bold(),
                style("DESCRIPTION").bold()
            );
            println!("{}", "-".repeat(80));
            for row in &rows {
                let profile = match &row.profile {
                    Some(name) => style(name.clone()).green(),
                    None => style("none".to_string()).dim(),
                };
                println!("{:<24} {:<16} {:<40}", row.name, profile, row.description);
            }
            println!();
            println!("{} family(ies)", rows.len());
        }
        OutputFormat::Json => print_json(&rows)?,
        OutputFormat::Plain => rows.iter().for_each(|r| println!("{}", r.name)),
    }

    Ok(())
}

/// Execute the components command
pub fn components(args: ComponentsArgs, ctx: &CommandContext) -> RegistryResult<()> {
    let family = ctx.registry()?.get_family(&args.family)?;
    let rows: Vec<ComponentRow> = family
        .components()?
        .iter()
        .map(|component| ComponentRow {
            name: component.name().to_string(),
            id: component.id().to_string(),
            latest: component.latest_version().map(|v| v.number()),
            description: component.description().to_string(),
        })
        .collect();

    if rows.is_empty() {
        return print_empty(
            args.format,
            &format!("No components in family {}", family.name()),
        );
    }

    match args.format {
        OutputFormat::Table => {
            let ui_ctx = UiContext::detect();
            ui::intro(&ui_ctx, &format!("Components in {}", family.name()));

            println!(
                "{:<24} {:<8} {:<48}",
                style("NAME").bold(),
                style("LATEST").bold(),
                style("DESCRIPTION").bold()
            );
            println!("{}", "-".repeat(80));
            for row in &rows {
                let latest = match row.latest {
                    Some(n) => style(format!("v{}", n)).green(),
                    None => style("-".to_string()).dim(),
                };
                println!("{:<24} {:<8} {:<48}", row.name, latest, row.description);
            }
            println!();
            println!("{} component(s)", rows.len());
        }
        OutputFormat::Json => print_json(&rows)?,
        OutputFormat::Plain => rows.iter().for_each(|r| println!("{}", r.name)),
    }

    Ok(())
}

/// Execute the versions command
pub fn versions(args: VersionsArgs, ctx: &CommandContext) -> RegistryResult<()> {
    let component = ctx
        .registry()?
        .get_family(&args.family)?
        .get_component(&args.component)?;
    let rows: Vec<VersionRow> = component
        .versions()
        .iter()
        .map(|version| VersionRow {
            number: version.number(),
            description: version.description().to_string(),
            help_url: version.help_url(),
        })
        .collect();

    if rows.is_empty() {
        return print_empty(
            args.format,
            &format!("No versions listed for {}", component.name()),
        );
    }

    match args.format {
        OutputFormat::Table => {
            let ui_ctx = UiContext::detect();
            ui::intro(
                &ui_ctx,
                &format!("Versions of {}/{}", args.family, component.name()),
            );

            println!(
                "{:<8} {:<72}",
                style("VERSION").bold(),
                style("DESCRIPTION").bold()
            );
            println!("{}", "-".repeat(80));
            for row in &rows {
                println!("{:<8} {:<72}", format!("v{}", row.number), row.description);
            }
            println!();
            println!("{} version(s)", rows.len());
        }
        OutputFormat::Json => print_json(&rows)?,
        OutputFormat::Plain => rows.iter().for_each(|r| println!("{}", r.number)),
    }

    Ok(())
}

/// Execute the licenses command
pub fn licenses(args: ListArgs, ctx: &CommandContext) -> RegistryResult<()> {
    let registry = ctx.registry()?;
    let licenses = registry.licenses()?;

    if licenses.is_empty() {
        return print_empty(args.format, "This registry does not use licenses");
    }

    match args.format {
        OutputFormat::Table => {
            let ui_ctx = UiContext::detect();
            ui::intro(&ui_ctx, &format!("Licenses of {}", registry.address()));

            println!("{:<24} {:<56}", style("NAME").bold(), style("TITLE").bold());
            println!("{}", "-".repeat(80));
            for license in &licenses {
                println!("{:<24} {:<56}", license.name, license.title);
            }
        }
        OutputFormat::Json => print_json(&licenses)?,
        OutputFormat::Plain => licenses.iter().for_each(|l| println!("{}", l.name)),
    }

    Ok(())
}

fn print_empty(format: OutputFormat, message: &str) -> RegistryResult<()> {
    match format {
        OutputFormat::Json => println!("[]"),
        OutputFormat::Plain => {}
        OutputFormat::Table => ui::step_info(&UiContext::detect(), message),
    }
    Ok(())
}

fn print_json<T: Serialize>(rows: &[T]) -> RegistryResult<()> {
    let json = serde_json::to_string_pretty(rows)?;
    println!("{}", json);
    Ok(())
}

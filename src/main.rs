//! compreg - Versioned workflow component registries
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use component_registry::cli::args::ConfigAction;
use component_registry::cli::commands::{self, CommandContext};
use component_registry::cli::{Cli, Commands};
use component_registry::config::{Config, ConfigManager};
use component_registry::error::RegistryResult;
use console::style;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

fn run() -> RegistryResult<()> {
    let cli = Cli::parse();

    // Completions need neither config nor logging
    if let Commands::Completions { shell } = cli.command {
        commands::completions(shell);
        return Ok(());
    }

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = match config_manager.load() {
        Ok(config) => config,
        // `config init --force` must be able to replace a broken file
        Err(_) if is_config_init(&cli.command) => Config::default(),
        Err(e) => return Err(e),
    };

    // 0 = warn, 1 = info, 2+ = debug; RUST_LOG is not consulted
    let verbose = if config.general.verbose {
        cli.verbose.max(1)
    } else {
        cli.verbose
    };
    let filter = match verbose {
        0 => EnvFilter::new("component_registry=warn"),
        1 => EnvFilter::new("component_registry=info"),
        _ => EnvFilter::new("component_registry=debug"),
    };

    // Logs go to stderr so `fetch` can stream artifacts on stdout
    if config.general.log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .without_time()
            .with_writer(std::io::stderr)
            .init();
    }
    debug!("Loaded configuration from {}", config_manager.path().display());

    if let Commands::Config(args) = cli.command {
        return commands::config(args, &config, &config_manager);
    }

    let ctx = CommandContext::new(&config, cli.registry.as_deref());

    match cli.command {
        Commands::Completions { .. } | Commands::Config(_) => unreachable!("handled above"),
        Commands::Families(args) => commands::families(args, &ctx),
        Commands::Components(args) => commands::components(args, &ctx),
        Commands::Versions(args) => commands::versions(args, &ctx),
        Commands::Show(args) => commands::show(args, &ctx),
        Commands::Fetch(args) => commands::fetch(args, &ctx),
        Commands::Create(args) => commands::create(args, &ctx),
        Commands::AddVersion(args) => commands::add_version(args, &ctx),
        Commands::Delete(args) => commands::delete(args, &ctx),
        Commands::Family(args) => commands::family(args, &ctx),
        Commands::Licenses(args) => commands::licenses(args, &ctx),
        Commands::Profile(args) => commands::profile(args, &ctx),
    }
}

fn is_config_init(command: &Commands) -> bool {
    matches!(
        command,
        Commands::Config(args) if matches!(args.action, Some(ConfigAction::Init { .. }))
    )
}

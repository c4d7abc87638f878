//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// compreg - Versioned workflow component registries
///
/// Browse, fetch and publish components in local directory registries
/// or remote registry services.
#[derive(Parser, Debug)]
#[command(name = "compreg")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "COMPREG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Registry address: a directory, file:// URL or http(s):// URL
    #[arg(short, long, global = true, env = "COMPREG_REGISTRY")]
    pub registry: Option<String>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the families of a registry
    Families(ListArgs),

    /// List the components of a family
    Components(ComponentsArgs),

    /// List the versions of a component
    Versions(VersionsArgs),

    /// Show details of a component version
    Show(ShowArgs),

    /// Write a version's artifact to a file or stdout
    Fetch(FetchArgs),

    /// Create a component from a bundle file
    Create(CreateArgs),

    /// Publish a new version of a component
    AddVersion(AddVersionArgs),

    /// Delete a component and all its versions
    Delete(DeleteArgs),

    /// Create or delete families
    Family(FamilyArgs),

    /// List the licenses a remote registry accepts
    Licenses(ListArgs),

    /// Show the base profile and the registry's profiles
    Profile(ProfileArgs),

    /// Show or initialize configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

/// Arguments for plain listings
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the components command
#[derive(Parser, Debug)]
pub struct ComponentsArgs {
    /// Family name
    pub family: String,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the versions command
#[derive(Parser, Debug)]
pub struct VersionsArgs {
    /// Family name
    pub family: String,

    /// Component name
    pub component: String,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the show command
#[derive(Parser, Debug)]
#[command(disable_version_flag = true)]
pub struct ShowArgs {
    /// Family name
    pub family: String,

    /// Component name
    pub component: String,

    /// Version number or "latest"
    #[arg(short = 'V', long, default_value = "latest")]
    pub version: String,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the fetch command
#[derive(Parser, Debug)]
#[command(disable_version_flag = true)]
pub struct FetchArgs {
    /// Family name
    pub family: String,

    /// Component name
    pub component: String,

    /// Version number or "latest"
    #[arg(short = 'V', long, default_value = "latest")]
    pub version: String,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the create command
#[derive(Parser, Debug)]
pub struct CreateArgs {
    /// Family name
    pub family: String,

    /// Name of the new component
    pub name: String,

    /// Bundle file holding the first version
    #[arg(short, long)]
    pub bundle: PathBuf,

    /// Component description
    #[arg(short, long, default_value = "")]
    pub description: String,

    /// License name (remote registries)
    #[arg(long)]
    pub license: Option<String>,

    /// Sharing policy: private, public or group:<id> (remote registries)
    #[arg(long, default_value = "private")]
    pub sharing: String,
}

/// Arguments for the add-version command
#[derive(Parser, Debug)]
pub struct AddVersionArgs {
    /// Family name
    pub family: String,

    /// Component name
    pub component: String,

    /// Bundle file holding the new version
    #[arg(short, long)]
    pub bundle: PathBuf,

    /// Revision comment
    #[arg(short = 'm', long, default_value = "")]
    pub comment: String,
}

/// Arguments for the delete command
#[derive(Parser, Debug)]
pub struct DeleteArgs {
    /// Family name
    pub family: String,

    /// Component name
    pub component: String,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the family command
#[derive(Parser, Debug)]
pub struct FamilyArgs {
    /// Subcommand for families
    #[command(subcommand)]
    pub action: FamilyAction,
}

/// Family subcommands
#[derive(Subcommand, Debug)]
pub enum FamilyAction {
    /// Create an empty family
    Create {
        /// Family name
        name: String,

        /// Name of the profile governing the family
        #[arg(short, long)]
        profile: Option<String>,

        /// Family description
        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// Delete a family with all its components
    Delete {
        /// Family name
        name: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Arguments for the profile command
#[derive(Parser, Debug)]
pub struct ProfileArgs {
    /// Print the base profile document instead of a summary
    #[arg(long)]
    pub raw: bool,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Output format for listings
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}

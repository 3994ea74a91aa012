//! Clap derive structures for the `avx` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.
//! Only depends on clap + clap_complete so `build.rs` can include it.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// avx -- manage controller resource tags and device registrations
#[derive(Debug, Parser)]
#[command(
    name = "avx",
    version,
    about = "Manage controller resource tags and device registrations",
    long_about = "A CLI for a cloud-networking controller's REST API.\n\n\
        Tags cloud resources, registers on-premises devices, and upgrades\n\
        controller-managed (CaaG) devices through their gateway.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Controller profile to use
    #[arg(long, short = 'p', env = "AVX_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Controller URL (overrides profile)
    #[arg(long, short = 'c', env = "AVX_CONTROLLER", global = true)]
    pub controller: Option<String>,

    /// Controller login name (overrides profile)
    #[arg(long, short = 'u', env = "AVX_USERNAME", global = true)]
    pub username: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "AVX_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "AVX_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "AVX_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output Enum ──────────────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage user tags on cloud resources
    #[command(alias = "tag", alias = "t")]
    Tags(TagsArgs),

    /// Manage on-premises device registrations
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Tags ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct TagsArgs {
    #[command(subcommand)]
    pub command: TagsCommand,
}

/// Identifies the tagged resource.
#[derive(Debug, Args)]
pub struct ResourceArgs {
    /// Cloud type: a name (aws, azure, gcp, oci, ...) or numeric code
    #[arg(long)]
    pub cloud_type: String,

    /// Resource type (e.g., vpc, gw, vnet)
    #[arg(long)]
    pub resource_type: String,

    /// Resource name or ID
    #[arg(long)]
    pub resource_name: String,
}

#[derive(Debug, Subcommand)]
pub enum TagsCommand {
    /// List the user tags of a resource
    #[command(alias = "ls")]
    List(ResourceArgs),

    /// Add tags to a resource
    Add {
        #[command(flatten)]
        resource: ResourceArgs,

        /// Tag as key=value (repeatable)
        #[arg(long = "tag", short = 't', value_parser = parse_tag, required = true)]
        tags: Vec<(String, String)>,
    },

    /// Replace all user tags of a resource (no --tag removes them all)
    Update {
        #[command(flatten)]
        resource: ResourceArgs,

        /// Tag as key=value (repeatable)
        #[arg(long = "tag", short = 't', value_parser = parse_tag)]
        tags: Vec<(String, String)>,
    },

    /// Delete tags from a resource
    #[command(alias = "rm")]
    Delete {
        #[command(flatten)]
        resource: ResourceArgs,

        /// Tag key to delete (repeatable)
        #[arg(long = "key", required_unless_present = "all", conflicts_with = "all")]
        keys: Vec<String>,

        /// Delete every user tag
        #[arg(long)]
        all: bool,
    },
}

/// Parse `key=value`. The value may itself contain `=`.
pub fn parse_tag(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_owned(), value.to_owned()))
        }
        _ => Err(format!("expected key=value, got '{raw}'")),
    }
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// Show a registered device
    Get {
        /// Device name
        name: String,
    },

    /// Register a device with the controller
    Register(DeviceArgs),

    /// Update a registration (CaaG devices may also change software version)
    Update(DeviceArgs),

    /// Remove a device registration
    #[command(alias = "rm")]
    Deregister {
        /// Device name
        name: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum HostOsArg {
    Ios,
    Aviatrix,
}

#[derive(Debug, Args)]
pub struct DeviceArgs {
    /// Device name (its identifier)
    pub name: String,

    /// Public IP address
    #[arg(long)]
    pub public_ip: String,

    /// SSH username on the device
    #[arg(long = "device-username")]
    pub username: String,

    /// Private key file for SSH (instead of a password)
    #[arg(long)]
    pub key_file: Option<PathBuf>,

    /// SSH password (falls back to AVX_DEVICE_PASSWORD, then a prompt)
    #[arg(long = "device-password")]
    pub password: Option<String>,

    /// Device operating system
    #[arg(long, value_enum, default_value = "ios")]
    pub host_os: HostOsArg,

    /// SSH port
    #[arg(long, default_value = "22")]
    pub ssh_port: u16,

    #[arg(long, default_value = "")]
    pub address_1: String,

    #[arg(long, default_value = "")]
    pub address_2: String,

    #[arg(long, default_value = "")]
    pub city: String,

    #[arg(long, default_value = "")]
    pub state: String,

    #[arg(long, default_value = "")]
    pub country: String,

    #[arg(long, default_value = "")]
    pub zip_code: String,

    #[arg(long, default_value = "")]
    pub description: String,

    /// Target software version (CaaG devices only, update)
    #[arg(long)]
    pub software_version: Option<String>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Print the config file location
    Path,

    /// Store a profile's password in the system keyring
    SetPassword {
        /// Profile name (defaults to the active profile)
        #[arg(long)]
        profile: Option<String>,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_values_may_contain_equals() {
        assert_eq!(
            parse_tag("query=a=b"),
            Ok(("query".to_owned(), "a=b".to_owned()))
        );
        assert_eq!(parse_tag("empty="), Ok(("empty".to_owned(), String::new())));
        assert!(parse_tag("novalue").is_err());
        assert!(parse_tag("=v").is_err());
    }

    #[test]
    fn command_tree_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}

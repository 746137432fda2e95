//! CLI structure and command definitions
//!
//! Every mutating command submits the request, waits for the resulting
//! operation to finish, and only then prints the result. Retry and polling
//! behaviour comes from the active profile and can be overridden per call.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use computectl_core::{ApiVersionKind, ResourceKind, StatusMethod};

/// Compute infrastructure CLI with operation waiting and retries built in
#[derive(Parser, Debug)]
#[command(name = "computectl")]
#[command(version, about = "Compute infrastructure CLI that waits for operations to finish")]
#[command(long_about = "
Compute infrastructure CLI that waits for operations to finish

Mutations return only once the remote operation is DONE. Throttling and
transient server errors are retried with exponential backoff.

EXAMPLES:
    # Set up a profile
    computectl profile set dev --project my-project --zone us-central1-a

    # Create a disk from a JSON body and wait for it
    computectl create disk --file disk.json

    # Stop an instance
    computectl instance stop web-1

    # Wait for an operation started elsewhere
    computectl operation wait operation-1712 --zone us-central1-a

    # Get JSON output for scripting
    computectl get instance web-1 -o json

For more help on a specific command, run:
    computectl <command> --help
")]
pub struct Cli {
    /// Profile to use for this command
    #[arg(long, short, global = true, env = "COMPUTECTL_PROFILE")]
    pub profile: Option<String>,

    /// Path to alternate configuration file
    #[arg(long, global = true, env = "COMPUTECTL_CONFIG_FILE")]
    pub config_file: Option<String>,

    /// Output format
    #[arg(long, short = 'o', global = true, value_enum, default_value = "auto")]
    pub output: OutputFormat,

    /// Enable verbose logging
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Fail on the first error instead of retrying
    #[arg(long, global = true)]
    pub no_retry: bool,

    /// Override the maximum number of attempts per call
    #[arg(long, global = true, conflicts_with = "no_retry")]
    pub retry_attempts: Option<u32>,

    /// Give up waiting for an operation after this many seconds
    #[arg(long, global = true)]
    pub poll_timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    Auto,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Key/value table
    Table,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Profile management
    #[command(subcommand, visible_alias = "prof", visible_alias = "pr")]
    #[command(after_help = "EXAMPLES:
    # Create a profile
    computectl profile set dev --project my-project --zone us-central1-a --region us-central1

    # Use the beta surface against a local emulator
    computectl profile set emu --project test --endpoint http://localhost:8080 --api-version beta

    # List all profiles
    computectl profile list

    # Make a profile the default
    computectl profile default dev
")]
    Profile(ProfileCommands),

    /// Inspect or wait for operations
    #[command(subcommand, visible_alias = "op")]
    Operation(OperationCommands),

    /// Create a resource from a JSON or YAML body and wait for it
    #[command(after_help = "EXAMPLES:
    # Zonal disk in the profile's zone
    computectl create disk --file disk.json

    # Regional subnetwork
    computectl create subnetwork --file subnet.yaml --region europe-west1

    # Global firewall rule
    computectl create firewall --file allow-ssh.json
")]
    Create {
        /// Kind of resource
        #[arg(value_enum)]
        kind: ResourceKind,

        /// Resource body (JSON, or YAML for .yaml/.yml files); must include "name"
        #[arg(long, short)]
        file: PathBuf,

        #[command(flatten)]
        location: LocationArgs,
    },

    /// Delete a resource and wait for the deletion
    #[command(visible_alias = "rm")]
    Delete {
        /// Kind of resource
        #[arg(value_enum)]
        kind: ResourceKind,

        /// Resource name
        name: String,

        #[command(flatten)]
        location: LocationArgs,
    },

    /// Show a resource
    Get {
        /// Kind of resource
        #[arg(value_enum)]
        kind: ResourceKind,

        /// Resource name
        name: String,

        #[command(flatten)]
        location: LocationArgs,
    },

    /// Instance lifecycle and disk operations
    #[command(subcommand, visible_alias = "vm")]
    Instance(InstanceCommands),

    /// Disk operations
    #[command(subcommand)]
    Disk(DiskCommands),

    /// Image operations
    #[command(subcommand)]
    Image(ImageCommands),

    /// Version information
    #[command(visible_alias = "ver")]
    Version,

    /// Generate shell completions
    #[command(visible_alias = "comp")]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion generation
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    /// Bourne Again Shell
    Bash,
    /// Z Shell
    Zsh,
    /// Friendly Interactive Shell
    Fish,
    /// PowerShell
    #[value(name = "powershell", alias = "power-shell")]
    PowerShell,
    /// Elvish
    Elvish,
}

/// Where a resource lives; defaults come from the profile
#[derive(Args, Debug, Clone, Default)]
#[group(multiple = false)]
pub struct LocationArgs {
    /// Zone of a zonal resource
    #[arg(long)]
    pub zone: Option<String>,

    /// Region of a regional resource
    #[arg(long)]
    pub region: Option<String>,

    /// Address the global collection
    #[arg(long)]
    pub global: bool,
}

/// Operation location, one of which must be given
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct OperationLocationArgs {
    /// Zonal operation
    #[arg(long)]
    pub zone: Option<String>,

    /// Regional operation
    #[arg(long)]
    pub region: Option<String>,

    /// Global operation
    #[arg(long)]
    pub global: bool,
}

/// Profile management commands
#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// List all configured profiles
    #[command(visible_alias = "ls", visible_alias = "l")]
    List,

    /// Show the path to the configuration file
    Path,

    /// Show details of a specific profile
    #[command(visible_alias = "sh", visible_alias = "get")]
    Show {
        /// Profile name to show
        name: String,
    },

    /// Set or create a profile
    #[command(visible_alias = "add", visible_alias = "create")]
    Set {
        /// Profile name
        name: String,

        /// Project that owns the resources
        #[arg(long)]
        project: String,

        /// API root URL
        #[arg(long)]
        endpoint: Option<String>,

        /// API surface
        #[arg(long, value_enum)]
        api_version: Option<ApiVersionKind>,

        /// Default zone
        #[arg(long)]
        zone: Option<String>,

        /// Default region
        #[arg(long)]
        region: Option<String>,

        /// How operation status is fetched
        #[arg(long, value_enum)]
        status_method: Option<StatusMethod>,
    },

    /// Remove a profile
    #[command(visible_alias = "rm", visible_alias = "delete")]
    Remove {
        /// Profile name to remove
        name: String,
    },

    /// Set the default profile
    #[command(visible_alias = "def")]
    Default {
        /// Profile name to use by default
        name: String,
    },
}

/// Operation commands
#[derive(Subcommand, Debug)]
pub enum OperationCommands {
    /// Fetch an operation's current status once
    Get {
        /// Operation name
        name: String,

        #[command(flatten)]
        location: OperationLocationArgs,
    },

    /// Wait until an operation is DONE
    Wait {
        /// Operation name
        name: String,

        #[command(flatten)]
        location: OperationLocationArgs,
    },
}

/// Instance commands
#[derive(Subcommand, Debug)]
pub enum InstanceCommands {
    /// Start a stopped instance
    Start {
        /// Instance name
        name: String,
        /// Zone (defaults to the profile's)
        #[arg(long)]
        zone: Option<String>,
    },

    /// Stop a running instance
    Stop {
        /// Instance name
        name: String,
        /// Zone (defaults to the profile's)
        #[arg(long)]
        zone: Option<String>,
    },

    /// Suspend a running instance
    Suspend {
        /// Instance name
        name: String,
        /// Zone (defaults to the profile's)
        #[arg(long)]
        zone: Option<String>,
    },

    /// Resume a suspended instance
    Resume {
        /// Instance name
        name: String,
        /// Zone (defaults to the profile's)
        #[arg(long)]
        zone: Option<String>,
    },

    /// Attach an existing disk
    AttachDisk {
        /// Instance name
        name: String,
        /// Disk URL or partial path, e.g. projects/p/zones/z/disks/data-1
        #[arg(long)]
        source: String,
        /// Device name inside the guest
        #[arg(long)]
        device_name: Option<String>,
        /// Attach read-only
        #[arg(long)]
        read_only: bool,
        /// Zone (defaults to the profile's)
        #[arg(long)]
        zone: Option<String>,
    },

    /// Detach a disk by device name
    DetachDisk {
        /// Instance name
        name: String,
        /// Device name of the attached disk
        #[arg(long)]
        device_name: String,
        /// Zone (defaults to the profile's)
        #[arg(long)]
        zone: Option<String>,
    },

    /// Replace instance metadata
    #[command(after_help = "EXAMPLES:
    computectl instance set-metadata web-1 --item startup-script='echo hi' --item env=prod
")]
    SetMetadata {
        /// Instance name
        name: String,
        /// Metadata entry as key=value (repeatable)
        #[arg(long = "item", value_parser = parse_key_value, required = true)]
        items: Vec<(String, String)>,
        /// Zone (defaults to the profile's)
        #[arg(long)]
        zone: Option<String>,
    },
}

/// Disk commands
#[derive(Subcommand, Debug)]
pub enum DiskCommands {
    /// Grow a zonal or regional disk
    Resize {
        /// Disk name
        name: String,
        /// New size in GB
        #[arg(long)]
        size_gb: u64,

        #[command(flatten)]
        location: LocationArgs,
    },
}

/// Image commands
#[derive(Subcommand, Debug)]
pub enum ImageCommands {
    /// Mark an image deprecated, obsolete or deleted
    Deprecate {
        /// Image name
        name: String,
        /// New deprecation state
        #[arg(long, value_enum, default_value = "deprecated")]
        state: DeprecationState,
        /// Image URL suggested as replacement
        #[arg(long)]
        replacement: Option<String>,
    },
}

/// Image deprecation states
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DeprecationState {
    Active,
    Deprecated,
    Obsolete,
    Deleted,
}

impl DeprecationState {
    pub fn as_api_str(self) -> &'static str {
        match self {
            DeprecationState::Active => "ACTIVE",
            DeprecationState::Deprecated => "DEPRECATED",
            DeprecationState::Obsolete => "OBSOLETE",
            DeprecationState::Deleted => "DELETED",
        }
    }
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{}'", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_key_value_splits_on_first_equals() {
        assert_eq!(
            parse_key_value("startup-script=echo a=b").unwrap(),
            ("startup-script".to_string(), "echo a=b".to_string())
        );
        assert_eq!(
            parse_key_value("empty=").unwrap(),
            ("empty".to_string(), String::new())
        );
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn zone_and_region_are_exclusive() {
        let result = Cli::try_parse_from([
            "computectl", "delete", "disk", "d1", "--zone", "z", "--region", "r",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn disk_resize_accepts_a_region() {
        let cli = Cli::try_parse_from([
            "computectl",
            "disk",
            "resize",
            "shared-1",
            "--size-gb",
            "200",
            "--region",
            "us-east1",
        ])
        .unwrap();
        match cli.command {
            Commands::Disk(DiskCommands::Resize { location, .. }) => {
                assert_eq!(location.region.as_deref(), Some("us-east1"));
                assert!(location.zone.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn operation_requires_a_location() {
        let result = Cli::try_parse_from(["computectl", "operation", "wait", "op-1"]);
        assert!(result.is_err());

        let cli = Cli::try_parse_from(["computectl", "operation", "wait", "op-1", "--global"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Operation(OperationCommands::Wait { .. })
        ));
    }

    #[test]
    fn resilience_overrides_parse_globally() {
        let cli = Cli::try_parse_from([
            "computectl",
            "instance",
            "stop",
            "web-1",
            "--retry-attempts",
            "3",
            "--poll-timeout",
            "60",
        ])
        .unwrap();
        assert_eq!(cli.retry_attempts, Some(3));
        assert_eq!(cli.poll_timeout, Some(60));
        assert!(!cli.no_retry);
    }
}

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::{generate, shells};
use computectl_core::{Alpha, ApiVersion, ApiVersionKind, Beta, Config, V1};
use tracing::{debug, error, info, trace};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod connection;
mod error;
mod output;

use cli::{Cli, Commands};
use commands::wait::OperationSpinner;
use connection::{ConnectionManager, ResilienceOverrides};
use error::ComputeCtlError;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level
    init_tracing(cli.verbose);

    // Load configuration from specified path or default location
    let (config, config_path) = if let Some(config_file) = &cli.config_file {
        let path = std::path::PathBuf::from(config_file);
        debug!("Loading config from explicit path: {:?}", path);
        let config = Config::load_from_path(&path)?;
        (config, Some(path))
    } else {
        debug!("Loading config from default location");
        (Config::load()?, None)
    };
    debug!(
        "Creating ConnectionManager with config_path: {:?}",
        config_path
    );
    let conn_mgr = ConnectionManager::with_config_path(config, config_path).with_overrides(
        ResilienceOverrides {
            no_retry: cli.no_retry,
            retry_attempts: cli.retry_attempts,
            poll_timeout_secs: cli.poll_timeout,
        },
    );

    // Ctrl-C aborts retries and polling instead of killing the process mid-request
    let cancel = conn_mgr.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, cancelling");
            cancel.cancel();
        }
    });

    // Execute command
    if let Err(e) = execute_command(&cli, &conn_mgr).await {
        e.print_diagnostic();
        std::process::exit(1);
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    // Check for RUST_LOG env var first, then fall back to verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "computectl=warn,computectl_core=warn",
            1 => "computectl=info,computectl_core=info",
            2 => "computectl=debug,computectl_core=debug",
            _ => "computectl=trace,computectl_core=trace",
        };
        tracing_subscriber::EnvFilter::new(level)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .compact(),
        )
        .init();

    debug!("Tracing initialized with verbosity level: {}", verbose);
}

async fn execute_command(cli: &Cli, conn_mgr: &ConnectionManager) -> Result<(), ComputeCtlError> {
    // Log command execution with sanitized parameters
    trace!("Executing command: {:?}", cli.command);
    info!("Command: {}", format_command(&cli.command));

    let start = std::time::Instant::now();
    let result = match &cli.command {
        Commands::Version => {
            debug!("Showing version information");
            match cli.output {
                cli::OutputFormat::Auto => {
                    println!("computectl {}", env!("CARGO_PKG_VERSION"));
                }
                format => {
                    let output_data = serde_json::json!({
                        "version": env!("CARGO_PKG_VERSION"),
                        "name": env!("CARGO_PKG_NAME"),
                    });
                    output::print_output(&output_data, format)?;
                }
            }
            Ok(())
        }
        Commands::Completions { shell } => {
            debug!("Generating completions for {:?}", shell);
            generate_completions(*shell);
            Ok(())
        }

        Commands::Profile(profile_cmd) => {
            debug!("Executing profile command");
            commands::profile::handle_profile_command(profile_cmd, conn_mgr, cli.output).await
        }

        _ => {
            let (_, profile) = conn_mgr.resolve_profile(cli.profile.as_deref())?;
            debug!("Profile targets the {} API", profile.api_version);
            match profile.api_version {
                ApiVersionKind::V1 => execute_compute_command::<V1>(cli, conn_mgr).await,
                ApiVersionKind::Beta => execute_compute_command::<Beta>(cli, conn_mgr).await,
                ApiVersionKind::Alpha => execute_compute_command::<Alpha>(cli, conn_mgr).await,
            }
        }
    };

    let duration = start.elapsed();
    match &result {
        Ok(_) => info!("Command completed successfully in {:?}", duration),
        Err(e) => error!("Command failed after {:?}: {}", duration, e),
    }

    result
}

async fn execute_compute_command<V: ApiVersion>(
    cli: &Cli,
    conn_mgr: &ConnectionManager,
) -> Result<(), ComputeCtlError> {
    let spinner = OperationSpinner::for_output(cli.output);
    let session = conn_mgr.session::<V>(cli.profile.as_deref(), Some(spinner.callback()))?;

    let result = commands::handle_compute_command(&cli.command, &session, cli.output).await;
    spinner.finish();
    result
}

/// Generate shell completions
fn generate_completions(shell: cli::Shell) {
    let mut cmd = cli::Cli::command();
    let name = cmd.get_name().to_string();

    match shell {
        cli::Shell::Bash => generate(shells::Bash, &mut cmd, name, &mut std::io::stdout()),
        cli::Shell::Zsh => generate(shells::Zsh, &mut cmd, name, &mut std::io::stdout()),
        cli::Shell::Fish => generate(shells::Fish, &mut cmd, name, &mut std::io::stdout()),
        cli::Shell::PowerShell => {
            generate(shells::PowerShell, &mut cmd, name, &mut std::io::stdout())
        }
        cli::Shell::Elvish => generate(shells::Elvish, &mut cmd, name, &mut std::io::stdout()),
    }
}

/// Format command for human-readable logging
fn format_command(command: &Commands) -> String {
    match command {
        Commands::Version => "version".to_string(),
        Commands::Completions { shell } => format!("completions {:?}", shell),
        Commands::Profile(cmd) => {
            use cli::ProfileCommands::*;
            match cmd {
                List => "profile list".to_string(),
                Path => "profile path".to_string(),
                Show { name } => format!("profile show {}", name),
                Set { name, project, .. } => format!("profile set {} --project {}", name, project),
                Remove { name } => format!("profile remove {}", name),
                Default { name } => format!("profile default {}", name),
            }
        }
        Commands::Operation(cmd) => {
            use cli::OperationCommands::*;
            match cmd {
                Get { name, .. } => format!("operation get {}", name),
                Wait { name, .. } => format!("operation wait {}", name),
            }
        }
        Commands::Create { kind, file, .. } => {
            format!("create {} --file {}", kind, file.display())
        }
        Commands::Delete { kind, name, .. } => format!("delete {} {}", kind, name),
        Commands::Get { kind, name, .. } => format!("get {} {}", kind, name),
        Commands::Instance(cmd) => format!("instance {:?}", cmd),
        Commands::Disk(cmd) => format!("disk {:?}", cmd),
        Commands::Image(cmd) => format!("image {:?}", cmd),
    }
}

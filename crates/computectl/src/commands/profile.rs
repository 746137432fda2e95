//! Profile management command implementations

use colored::Colorize;
use computectl_core::config::ResilienceConfig;
use computectl_core::{Config, Profile};
use serde_json::json;
use tracing::{debug, info, trace};

use crate::cli::{OutputFormat, ProfileCommands};
use crate::connection::ConnectionManager;
use crate::error::ComputeCtlError;
use crate::output;

/// Handle profile management commands
pub async fn handle_profile_command(
    profile_cmd: &ProfileCommands,
    conn_mgr: &ConnectionManager,
    output_format: OutputFormat,
) -> Result<(), ComputeCtlError> {
    use ProfileCommands::*;

    match profile_cmd {
        List => handle_list(conn_mgr, output_format),
        Path => handle_path(conn_mgr, output_format),
        Show { name } => handle_show(conn_mgr, name, output_format),
        Set {
            name,
            project,
            endpoint,
            api_version,
            zone,
            region,
            status_method,
        } => {
            let mut profile = conn_mgr
                .config
                .profiles
                .get(name)
                .cloned()
                .unwrap_or_else(|| Profile::new(project.clone()));
            profile.project = project.clone();
            if let Some(endpoint) = endpoint {
                profile.endpoint = endpoint.clone();
            }
            if let Some(version) = api_version {
                profile.api_version = *version;
            }
            if zone.is_some() {
                profile.zone = zone.clone();
            }
            if region.is_some() {
                profile.region = region.clone();
            }
            if let Some(method) = status_method {
                let mut resilience = profile.resilience.take().unwrap_or_default();
                resilience.poll.method = *method;
                profile.resilience = Some(resilience);
            }
            handle_set(conn_mgr, name, profile)
        }
        Remove { name } => handle_remove(conn_mgr, name),
        Default { name } => handle_default(conn_mgr, name),
    }
}

fn config_path_display(conn_mgr: &ConnectionManager) -> Option<String> {
    conn_mgr
        .config_path
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .or_else(|| {
            Config::config_path()
                .ok()
                .map(|p| p.to_string_lossy().to_string())
        })
}

fn handle_list(
    conn_mgr: &ConnectionManager,
    output_format: OutputFormat,
) -> Result<(), ComputeCtlError> {
    debug!("Listing all configured profiles");
    let profiles = conn_mgr.config.list_profiles();
    trace!("Found {} profiles", profiles.len());
    let default = conn_mgr.config.default_profile.as_deref();

    match output_format {
        OutputFormat::Auto => {
            if let Some(path) = config_path_display(conn_mgr) {
                println!("Configuration file: {}", path);
                println!();
            }

            if profiles.is_empty() {
                println!("No profiles configured.");
                println!(
                    "Use 'computectl profile set <name> --project <project>' to create a profile."
                );
                return Ok(());
            }

            for (name, profile) in &profiles {
                let marker = if default == Some(name.as_str()) {
                    "*".green().bold().to_string()
                } else {
                    " ".to_string()
                };
                println!(
                    "{} {:<16} {:<24} {:<6} {}",
                    marker,
                    name,
                    profile.project,
                    profile.api_version.path(),
                    location_summary(profile)
                );
            }
        }
        _ => {
            let rows: Vec<serde_json::Value> = profiles
                .iter()
                .map(|(name, profile)| {
                    json!({
                        "name": name,
                        "project": profile.project,
                        "api_version": profile.api_version,
                        "endpoint": profile.endpoint,
                        "zone": profile.zone,
                        "region": profile.region,
                        "is_default": default == Some(name.as_str()),
                    })
                })
                .collect();

            if output_format == OutputFormat::Table {
                output::print_output(&rows, output_format)?;
            } else {
                let output_data = json!({
                    "config_path": config_path_display(conn_mgr),
                    "profiles": rows,
                    "count": profiles.len(),
                });
                output::print_output(&output_data, output_format)?;
            }
        }
    }
    Ok(())
}

fn location_summary(profile: &Profile) -> String {
    match (&profile.zone, &profile.region) {
        (Some(zone), Some(region)) => format!("{} / {}", zone, region),
        (Some(zone), None) => zone.clone(),
        (None, Some(region)) => region.clone(),
        (None, None) => "-".to_string(),
    }
}

fn handle_path(
    conn_mgr: &ConnectionManager,
    output_format: OutputFormat,
) -> Result<(), ComputeCtlError> {
    let config_path = match &conn_mgr.config_path {
        Some(path) => path.clone(),
        None => Config::config_path()?,
    };

    match output_format {
        OutputFormat::Auto => println!("{}", config_path.display()),
        _ => output::print_output(
            json!({ "config_path": config_path.to_string_lossy() }),
            output_format,
        )?,
    }
    Ok(())
}

fn handle_show(
    conn_mgr: &ConnectionManager,
    name: &str,
    output_format: OutputFormat,
) -> Result<(), ComputeCtlError> {
    debug!("Showing profile: {}", name);
    let profile = conn_mgr.config.profile(name)?;
    let is_default = conn_mgr.config.default_profile.as_deref() == Some(name);
    let resilience = profile.resilience();

    match output_format {
        OutputFormat::Auto => {
            println!("Profile: {}{}", name, if is_default { " (default)" } else { "" });
            println!("Project: {}", profile.project);
            println!("Endpoint: {}", profile.endpoint);
            println!("API version: {}", profile.api_version);
            if let Some(zone) = &profile.zone {
                println!("Zone: {}", zone);
            }
            if let Some(region) = &profile.region {
                println!("Region: {}", region);
            }
            print_resilience(&resilience);
        }
        _ => {
            let output_data = json!({
                "name": name,
                "is_default": is_default,
                "project": profile.project,
                "endpoint": profile.endpoint,
                "api_version": profile.api_version,
                "zone": profile.zone,
                "region": profile.region,
                "resilience": resilience,
            });
            output::print_output(&output_data, output_format)?;
        }
    }
    Ok(())
}

fn print_resilience(resilience: &ResilienceConfig) {
    let retry = &resilience.retry;
    if retry.enabled {
        println!(
            "Retry: up to {} attempts, {}ms doubling to {}ms{}",
            retry.max_attempts,
            retry.initial_backoff_ms,
            retry.max_backoff_ms,
            if retry.jitter { " with jitter" } else { "" }
        );
    } else {
        println!("Retry: disabled");
    }

    let poll = &resilience.poll;
    match poll.timeout_secs {
        Some(timeout) => println!(
            "Polling: every {}ms up to {}ms via {:?}, giving up after {}s",
            poll.interval_ms, poll.max_interval_ms, poll.method, timeout
        ),
        None => println!(
            "Polling: every {}ms up to {}ms via {:?}, no deadline",
            poll.interval_ms, poll.max_interval_ms, poll.method
        ),
    }
}

fn handle_set(
    conn_mgr: &ConnectionManager,
    name: &str,
    profile: Profile,
) -> Result<(), ComputeCtlError> {
    debug!("Setting profile: {}", name);
    let mut config = conn_mgr.config.clone();
    let first = config.profiles.is_empty();
    config.set_profile(name.to_string(), profile);
    if first {
        config.default_profile = Some(name.to_string());
    }
    conn_mgr.save_config(&config)?;
    info!("Profile '{}' saved", name);

    println!("Profile '{}' saved successfully.", name);
    if first {
        println!("Set as default profile.");
    }
    Ok(())
}

fn handle_remove(conn_mgr: &ConnectionManager, name: &str) -> Result<(), ComputeCtlError> {
    debug!("Removing profile: {}", name);
    let mut config = conn_mgr.config.clone();
    let was_default = config.default_profile.as_deref() == Some(name);

    if config.remove_profile(name).is_none() {
        return Err(ComputeCtlError::ProfileNotFound { name: name.into() });
    }
    conn_mgr.save_config(&config)?;

    if was_default {
        println!("Default profile cleared.");
    }
    println!("Profile '{}' removed successfully.", name);
    Ok(())
}

fn handle_default(conn_mgr: &ConnectionManager, name: &str) -> Result<(), ComputeCtlError> {
    debug!("Setting default profile: {}", name);
    conn_mgr.config.profile(name)?;

    let mut config = conn_mgr.config.clone();
    config.default_profile = Some(name.to_string());
    conn_mgr.save_config(&config)?;

    println!("Default profile set to '{}'.", name);
    Ok(())
}

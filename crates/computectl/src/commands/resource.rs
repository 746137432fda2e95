//! Resource command implementations
//!
//! Each command resolves a location from flags and profile defaults, then
//! hands off to the orchestrated `Compute` surface; submission, retry and
//! waiting all happen there.

use std::path::Path;

use computectl_core::{ApiVersion, Profile, ResourceKind, Scope, ScopeKind};
use serde_json::{Value, json};
use tracing::debug;

use super::wait::print_status;
use crate::cli::{DiskCommands, ImageCommands, InstanceCommands, LocationArgs, OutputFormat};
use crate::connection::Session;
use crate::error::{ComputeCtlError, Result as CliResult};
use crate::output::print_output;

/// Location for `kind`: explicit flag first, else the kind's primary scope
/// filled in from the profile
pub(crate) fn resolve_location(
    kind: ResourceKind,
    args: &LocationArgs,
    profile_name: &str,
    profile: &Profile,
) -> CliResult<Scope> {
    if let Some(zone) = &args.zone {
        return Ok(Scope::Zonal(zone.clone()));
    }
    if let Some(region) = &args.region {
        return Ok(Scope::Regional(region.clone()));
    }
    if args.global {
        return Ok(Scope::Global);
    }

    match kind.scopes().first() {
        Some(ScopeKind::Zonal) => Ok(Scope::Zonal(
            profile.zone_or(profile_name, None)?.to_string(),
        )),
        Some(ScopeKind::Regional) => Ok(Scope::Regional(
            profile.region_or(profile_name, None)?.to_string(),
        )),
        Some(ScopeKind::Global) | None => Ok(Scope::Global),
    }
}

/// Read a resource body; YAML for .yaml/.yml, JSON otherwise
pub(crate) fn read_body(path: &Path) -> CliResult<Value> {
    let content = std::fs::read_to_string(path).map_err(|e| ComputeCtlError::FileError {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    let body: Value = if is_yaml {
        serde_yaml::from_str(&content).map_err(|e| ComputeCtlError::InvalidInput {
            message: format!("{}: {}", path.display(), e),
        })?
    } else {
        serde_json::from_str(&content).map_err(|e| ComputeCtlError::InvalidInput {
            message: format!("{}: {}", path.display(), e),
        })?
    };

    if !body.is_object() {
        return Err(ComputeCtlError::InvalidInput {
            message: format!("{}: resource body must be an object", path.display()),
        });
    }
    Ok(body)
}

pub async fn handle_create<V: ApiVersion>(
    session: &Session<V>,
    kind: ResourceKind,
    file: &Path,
    location: &LocationArgs,
    output_format: OutputFormat,
) -> CliResult<()> {
    let scope = resolve_location(kind, location, &session.profile_name, &session.profile)?;
    let body = read_body(file)?;
    debug!("Creating {} in {}", kind, scope);

    let resource = session
        .compute
        .create(kind, &session.profile.project, &scope, &body)
        .await?;

    match output_format {
        OutputFormat::Auto => {
            let name = resource
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default();
            println!("\u{2713} Created {} '{}' in {}", kind, name, scope);
            Ok(())
        }
        _ => print_output(&resource, output_format),
    }
}

pub async fn handle_delete<V: ApiVersion>(
    session: &Session<V>,
    kind: ResourceKind,
    name: &str,
    location: &LocationArgs,
    output_format: OutputFormat,
) -> CliResult<()> {
    let scope = resolve_location(kind, location, &session.profile_name, &session.profile)?;
    let status = session
        .compute
        .delete(kind, &session.profile.project, &scope, name)
        .await?;
    print_status(
        &status,
        &format!("Deleted {} '{}' in {}", kind, name, scope),
        output_format,
    )
}

pub async fn handle_get<V: ApiVersion>(
    session: &Session<V>,
    kind: ResourceKind,
    name: &str,
    location: &LocationArgs,
    output_format: OutputFormat,
) -> CliResult<()> {
    let scope = resolve_location(kind, location, &session.profile_name, &session.profile)?;
    let resource: Value = session
        .compute
        .get(kind, &session.profile.project, &scope, name)
        .await?;
    print_output(&resource, output_format)
}

pub async fn handle_instance_command<V: ApiVersion>(
    cmd: &InstanceCommands,
    session: &Session<V>,
    output_format: OutputFormat,
) -> CliResult<()> {
    let compute = &session.compute;
    let project = session.profile.project.as_str();
    let zone_of = |explicit: &Option<String>| -> CliResult<String> {
        Ok(session
            .profile
            .zone_or(&session.profile_name, explicit.as_deref())?
            .to_string())
    };

    match cmd {
        InstanceCommands::Start { name, zone } => {
            let zone = zone_of(zone)?;
            let status = compute.start_instance(project, &zone, name).await?;
            print_status(&status, &format!("Started instance '{}'", name), output_format)
        }
        InstanceCommands::Stop { name, zone } => {
            let zone = zone_of(zone)?;
            let status = compute.stop_instance(project, &zone, name).await?;
            print_status(&status, &format!("Stopped instance '{}'", name), output_format)
        }
        InstanceCommands::Suspend { name, zone } => {
            let zone = zone_of(zone)?;
            let status = compute.suspend_instance(project, &zone, name).await?;
            print_status(&status, &format!("Suspended instance '{}'", name), output_format)
        }
        InstanceCommands::Resume { name, zone } => {
            let zone = zone_of(zone)?;
            let status = compute.resume_instance(project, &zone, name).await?;
            print_status(&status, &format!("Resumed instance '{}'", name), output_format)
        }
        InstanceCommands::AttachDisk {
            name,
            source,
            device_name,
            read_only,
            zone,
        } => {
            let zone = zone_of(zone)?;
            let attached_disk = attached_disk_body(source, device_name.as_deref(), *read_only);
            let status = compute
                .attach_disk(project, &zone, name, &attached_disk)
                .await?;
            print_status(
                &status,
                &format!("Attached {} to instance '{}'", source, name),
                output_format,
            )
        }
        InstanceCommands::DetachDisk {
            name,
            device_name,
            zone,
        } => {
            let zone = zone_of(zone)?;
            let status = compute
                .detach_disk(project, &zone, name, device_name)
                .await?;
            print_status(
                &status,
                &format!("Detached '{}' from instance '{}'", device_name, name),
                output_format,
            )
        }
        InstanceCommands::SetMetadata { name, items, zone } => {
            let zone = zone_of(zone)?;
            // setMetadata is rejected without the current fingerprint
            let instance: Value = compute
                .get(
                    ResourceKind::Instance,
                    project,
                    &Scope::Zonal(zone.clone()),
                    name,
                )
                .await?;
            let fingerprint = instance
                .pointer("/metadata/fingerprint")
                .and_then(Value::as_str);
            let metadata = metadata_body(fingerprint, items);
            let status = compute.set_metadata(project, &zone, name, &metadata).await?;
            print_status(
                &status,
                &format!("Updated metadata of instance '{}'", name),
                output_format,
            )
        }
    }
}

pub async fn handle_disk_command<V: ApiVersion>(
    cmd: &DiskCommands,
    session: &Session<V>,
    output_format: OutputFormat,
) -> CliResult<()> {
    match cmd {
        DiskCommands::Resize {
            name,
            size_gb,
            location,
        } => {
            let scope = resolve_location(
                ResourceKind::Disk,
                location,
                &session.profile_name,
                &session.profile,
            )?;
            let status = session
                .compute
                .resize_disk(&session.profile.project, &scope, name, *size_gb)
                .await?;
            print_status(
                &status,
                &format!("Resized disk '{}' in {} to {} GB", name, scope, size_gb),
                output_format,
            )
        }
    }
}

pub async fn handle_image_command<V: ApiVersion>(
    cmd: &ImageCommands,
    session: &Session<V>,
    output_format: OutputFormat,
) -> CliResult<()> {
    match cmd {
        ImageCommands::Deprecate {
            name,
            state,
            replacement,
        } => {
            let mut deprecation = json!({ "state": state.as_api_str() });
            if let Some(replacement) = replacement {
                deprecation["replacement"] = json!(replacement);
            }
            let status = session
                .compute
                .deprecate_image(&session.profile.project, name, &deprecation)
                .await?;
            print_status(
                &status,
                &format!("Image '{}' is now {}", name, state.as_api_str()),
                output_format,
            )
        }
    }
}

fn attached_disk_body(source: &str, device_name: Option<&str>, read_only: bool) -> Value {
    let mode = if read_only { "READ_ONLY" } else { "READ_WRITE" };
    let mut body = json!({ "source": source, "mode": mode });
    if let Some(device_name) = device_name {
        body["deviceName"] = json!(device_name);
    }
    body
}

fn metadata_body(fingerprint: Option<&str>, items: &[(String, String)]) -> Value {
    let items: Vec<Value> = items
        .iter()
        .map(|(key, value)| json!({ "key": key, "value": value }))
        .collect();
    let mut body = json!({ "items": items });
    if let Some(fingerprint) = fingerprint {
        body["fingerprint"] = json!(fingerprint);
    }
    body
}

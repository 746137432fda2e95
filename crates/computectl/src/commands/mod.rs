//! Command implementations

pub mod operation;
pub mod profile;
pub mod resource;
pub mod wait;

use computectl_core::ApiVersion;

use crate::cli::{Commands, OutputFormat};
use crate::connection::Session;
use crate::error::{ComputeCtlError, Result as CliResult};

/// Run a command that talks to the API through `session`
pub async fn handle_compute_command<V: ApiVersion>(
    command: &Commands,
    session: &Session<V>,
    output_format: OutputFormat,
) -> CliResult<()> {
    match command {
        Commands::Operation(cmd) => {
            operation::handle_operation_command(cmd, session, output_format).await
        }
        Commands::Create {
            kind,
            file,
            location,
        } => resource::handle_create(session, *kind, file, location, output_format).await,
        Commands::Delete {
            kind,
            name,
            location,
        } => resource::handle_delete(session, *kind, name, location, output_format).await,
        Commands::Get {
            kind,
            name,
            location,
        } => resource::handle_get(session, *kind, name, location, output_format).await,
        Commands::Instance(cmd) => {
            resource::handle_instance_command(cmd, session, output_format).await
        }
        Commands::Disk(cmd) => resource::handle_disk_command(cmd, session, output_format).await,
        Commands::Image(cmd) => resource::handle_image_command(cmd, session, output_format).await,
        Commands::Profile(_) | Commands::Version | Commands::Completions { .. } => {
            Err(ComputeCtlError::InvalidInput {
                message: "command does not call the API".to_string(),
            })
        }
    }
}

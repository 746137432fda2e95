//! Operation command implementations

use computectl_core::{ApiVersion, OperationReference, Scope};
use tracing::debug;

use super::wait::{print_snapshot, print_status};
use crate::cli::{OperationCommands, OperationLocationArgs, OutputFormat};
use crate::connection::Session;
use crate::error::Result as CliResult;

fn operation_scope(location: &OperationLocationArgs) -> Scope {
    match (&location.zone, &location.region) {
        (Some(zone), _) => Scope::Zonal(zone.clone()),
        (None, Some(region)) => Scope::Regional(region.clone()),
        (None, None) => Scope::Global,
    }
}

pub async fn handle_operation_command<V: ApiVersion>(
    cmd: &OperationCommands,
    session: &Session<V>,
    output_format: OutputFormat,
) -> CliResult<()> {
    match cmd {
        OperationCommands::Get { name, location } => {
            let operation =
                OperationReference::new(name, &session.profile.project, operation_scope(location));
            debug!("Fetching {}", operation);
            let status = session.compute.operation(&operation).await?;
            print_snapshot(&status, output_format)
        }
        OperationCommands::Wait { name, location } => {
            let operation =
                OperationReference::new(name, &session.profile.project, operation_scope(location));
            debug!("Waiting for {}", operation);
            let status = session.compute.wait_operation(operation).await?;
            let summary = match status.target_name() {
                Some(target) => format!("Operation {} is DONE ({})", name, target),
                None => format!("Operation {} is DONE", name),
            };
            print_status(&status, &summary, output_format)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_follows_the_given_flag() {
        let zonal = OperationLocationArgs {
            zone: Some("us-east1-b".to_string()),
            region: None,
            global: false,
        };
        assert_eq!(
            operation_scope(&zonal),
            Scope::Zonal("us-east1-b".to_string())
        );

        let regional = OperationLocationArgs {
            zone: None,
            region: Some("us-east1".to_string()),
            global: false,
        };
        assert_eq!(
            operation_scope(&regional),
            Scope::Regional("us-east1".to_string())
        );

        let global = OperationLocationArgs {
            zone: None,
            region: None,
            global: true,
        };
        assert_eq!(operation_scope(&global), Scope::Global);
    }
}

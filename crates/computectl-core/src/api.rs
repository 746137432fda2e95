//! Status-fetch collaborator of the poller

use async_trait::async_trait;

use crate::error::CallError;
use crate::operation::{OperationReference, OperationStatus, Scope};

/// Fetches operation status from the scope-specific endpoint
///
/// Implemented by the REST client; tests plug in scripted fakes.
#[async_trait]
pub trait OperationsApi: Send + Sync {
    async fn zone_operation(
        &self,
        project: &str,
        zone: &str,
        name: &str,
    ) -> Result<OperationStatus, CallError>;

    async fn region_operation(
        &self,
        project: &str,
        region: &str,
        name: &str,
    ) -> Result<OperationStatus, CallError>;

    async fn global_operation(&self, project: &str, name: &str)
    -> Result<OperationStatus, CallError>;

    /// Route to the endpoint matching the operation's scope
    async fn operation_status(
        &self,
        operation: &OperationReference,
    ) -> Result<OperationStatus, CallError> {
        match &operation.scope {
            Scope::Zonal(zone) => {
                self.zone_operation(&operation.project, zone, &operation.name)
                    .await
            }
            Scope::Regional(region) => {
                self.region_operation(&operation.project, region, &operation.name)
                    .await
            }
            Scope::Global => {
                self.global_operation(&operation.project, &operation.name)
                    .await
            }
        }
    }
}

//! Resource adapters
//!
//! Each method supplies a submission closure and a location; the
//! [`Orchestrator`] does all retrying and waiting. The shape mirrors a
//! create-and-wait workflow: submit, poll the operation, then read back the
//! resource.
//!
//! # Example
//!
//! ```rust,ignore
//! use computectl_core::{Compute, ComputeClient, ResourceKind, Scope};
//! use serde_json::json;
//!
//! let client = ComputeClient::builder().build()?;
//! let compute = Compute::new(client);
//!
//! let disk = compute
//!     .create(
//!         ResourceKind::Disk,
//!         "my-project",
//!         &Scope::Zonal("us-central1-a".into()),
//!         &json!({"name": "data-1", "sizeGb": "10"}),
//!     )
//!     .await?;
//! ```

use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::client::ComputeClient;
use crate::error::{CoreError, Result};
use crate::operation::{OperationReference, OperationStatus, Scope};
use crate::orchestrator::Orchestrator;
use crate::version::{ApiVersion, V1};

/// Kinds of location a resource may live in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Zonal,
    Regional,
    Global,
}

impl ScopeKind {
    fn of(scope: &Scope) -> Self {
        match scope {
            Scope::Zonal(_) => ScopeKind::Zonal,
            Scope::Regional(_) => ScopeKind::Regional,
            Scope::Global => ScopeKind::Global,
        }
    }
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeKind::Zonal => write!(f, "zonal"),
            ScopeKind::Regional => write!(f, "regional"),
            ScopeKind::Global => write!(f, "global"),
        }
    }
}

/// Resource collections this client knows how to mutate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum ResourceKind {
    Disk,
    Instance,
    TargetInstance,
    Subnetwork,
    ForwardingRule,
    TargetHttpProxy,
    UrlMap,
    BackendService,
    HealthCheck,
    NetworkEndpointGroup,
    Image,
    MachineImage,
    Network,
    Firewall,
}

impl ResourceKind {
    /// Collection segment in the REST path
    pub fn collection(self) -> &'static str {
        match self {
            ResourceKind::Disk => "disks",
            ResourceKind::Instance => "instances",
            ResourceKind::TargetInstance => "targetInstances",
            ResourceKind::Subnetwork => "subnetworks",
            ResourceKind::ForwardingRule => "forwardingRules",
            ResourceKind::TargetHttpProxy => "targetHttpProxies",
            ResourceKind::UrlMap => "urlMaps",
            ResourceKind::BackendService => "backendServices",
            ResourceKind::HealthCheck => "healthChecks",
            ResourceKind::NetworkEndpointGroup => "networkEndpointGroups",
            ResourceKind::Image => "images",
            ResourceKind::MachineImage => "machineImages",
            ResourceKind::Network => "networks",
            ResourceKind::Firewall => "firewalls",
        }
    }

    /// Locations the collection exists in
    pub fn scopes(self) -> &'static [ScopeKind] {
        use ScopeKind::*;
        match self {
            ResourceKind::Disk => &[Zonal, Regional],
            ResourceKind::Instance | ResourceKind::TargetInstance => &[Zonal],
            ResourceKind::Subnetwork => &[Regional],
            ResourceKind::ForwardingRule
            | ResourceKind::TargetHttpProxy
            | ResourceKind::UrlMap
            | ResourceKind::BackendService
            | ResourceKind::HealthCheck => &[Regional, Global],
            ResourceKind::NetworkEndpointGroup => &[Zonal, Regional, Global],
            ResourceKind::Image
            | ResourceKind::MachineImage
            | ResourceKind::Network
            | ResourceKind::Firewall => &[Global],
        }
    }

    pub fn supports(self, scope: &Scope) -> bool {
        self.scopes().contains(&ScopeKind::of(scope))
    }

    fn check(self, scope: &Scope) -> Result<()> {
        if self.supports(scope) {
            return Ok(());
        }
        let allowed = self
            .scopes()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" or ");
        Err(CoreError::InvalidRequest(format!(
            "{} cannot be {}; use a {} location",
            self.collection(),
            ScopeKind::of(scope),
            allowed
        )))
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection())
    }
}

/// Orchestrated compute operations for one API surface
#[derive(Debug, Clone)]
pub struct Compute<V: ApiVersion = V1> {
    client: Arc<ComputeClient<V>>,
    orchestrator: Orchestrator,
    cancel: CancellationToken,
}

impl<V: ApiVersion> Compute<V> {
    /// Default retry and poll policies
    pub fn new(client: ComputeClient<V>) -> Self {
        let client = Arc::new(client);
        let orchestrator = Orchestrator::new(client.clone());
        Self::from_parts(client, orchestrator)
    }

    /// Use an orchestrator configured by the caller
    ///
    /// The orchestrator should poll through the same client, e.g. one built
    /// with `Orchestrator::builder(client.clone())`.
    pub fn from_parts(client: Arc<ComputeClient<V>>, orchestrator: Orchestrator) -> Self {
        Self {
            client,
            orchestrator,
            cancel: CancellationToken::new(),
        }
    }

    /// Abort every call made through this handle when `cancel` fires
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn client(&self) -> &ComputeClient<V> {
        &self.client
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Insert a resource, wait for it, and return it as the API now sees it
    ///
    /// `body` must carry the resource `name`.
    pub async fn create(
        &self,
        kind: ResourceKind,
        project: &str,
        location: &Scope,
        body: &Value,
    ) -> Result<Value> {
        kind.check(location)?;
        let name = body
            .get("name")
            .and_then(Value::as_str)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| {
                CoreError::InvalidRequest(format!("{} body has no 'name'", kind.collection()))
            })?;

        let client = &*self.client;
        let collection = kind.collection();
        self.orchestrator
            .mutate(&self.cancel, move || {
                client.insert(project, location, collection, body)
            })
            .await?;
        info!(kind = %kind, name, "created");

        self.get(kind, project, location, name).await
    }

    /// Delete a resource and wait for the deletion to finish
    pub async fn delete(
        &self,
        kind: ResourceKind,
        project: &str,
        location: &Scope,
        name: &str,
    ) -> Result<OperationStatus> {
        kind.check(location)?;
        let client = &*self.client;
        let collection = kind.collection();
        let status = self
            .orchestrator
            .mutate(&self.cancel, move || {
                client.delete(project, location, collection, name)
            })
            .await?;
        info!(kind = %kind, name, "deleted");
        Ok(status)
    }

    /// Read a resource, retrying transient failures
    pub async fn get<T: DeserializeOwned>(
        &self,
        kind: ResourceKind,
        project: &str,
        location: &Scope,
        name: &str,
    ) -> Result<T> {
        kind.check(location)?;
        let client = &*self.client;
        let collection = kind.collection();
        self.orchestrator
            .call(&self.cancel, move || {
                client.get(project, location, collection, name)
            })
            .await
    }

    pub async fn start_instance(
        &self,
        project: &str,
        zone: &str,
        name: &str,
    ) -> Result<OperationStatus> {
        self.instance_action(project, zone, name, "start", &[], None)
            .await
    }

    pub async fn stop_instance(
        &self,
        project: &str,
        zone: &str,
        name: &str,
    ) -> Result<OperationStatus> {
        self.instance_action(project, zone, name, "stop", &[], None)
            .await
    }

    pub async fn suspend_instance(
        &self,
        project: &str,
        zone: &str,
        name: &str,
    ) -> Result<OperationStatus> {
        self.instance_action(project, zone, name, "suspend", &[], None)
            .await
    }

    pub async fn resume_instance(
        &self,
        project: &str,
        zone: &str,
        name: &str,
    ) -> Result<OperationStatus> {
        self.instance_action(project, zone, name, "resume", &[], None)
            .await
    }

    /// Attach a disk; `attached_disk` is the AttachedDisk body
    pub async fn attach_disk(
        &self,
        project: &str,
        zone: &str,
        instance: &str,
        attached_disk: &Value,
    ) -> Result<OperationStatus> {
        self.instance_action(project, zone, instance, "attachDisk", &[], Some(attached_disk))
            .await
    }

    /// Detach the disk mounted under `device_name`
    pub async fn detach_disk(
        &self,
        project: &str,
        zone: &str,
        instance: &str,
        device_name: &str,
    ) -> Result<OperationStatus> {
        self.instance_action(
            project,
            zone,
            instance,
            "detachDisk",
            &[("deviceName", device_name)],
            None,
        )
        .await
    }

    /// Replace instance metadata; `metadata` must carry the current fingerprint
    pub async fn set_metadata(
        &self,
        project: &str,
        zone: &str,
        instance: &str,
        metadata: &Value,
    ) -> Result<OperationStatus> {
        self.instance_action(project, zone, instance, "setMetadata", &[], Some(metadata))
            .await
    }

    /// Grow a zonal or regional disk to `size_gb`
    pub async fn resize_disk(
        &self,
        project: &str,
        location: &Scope,
        disk: &str,
        size_gb: u64,
    ) -> Result<OperationStatus> {
        let body = json!({ "sizeGb": size_gb.to_string() });
        self.action(
            ResourceKind::Disk,
            project,
            location,
            disk,
            "resize",
            &[],
            Some(&body),
        )
        .await
    }

    /// Set the deprecation status of an image
    pub async fn deprecate_image(
        &self,
        project: &str,
        image: &str,
        deprecation: &Value,
    ) -> Result<OperationStatus> {
        self.action(
            ResourceKind::Image,
            project,
            &Scope::Global,
            image,
            "deprecate",
            &[],
            Some(deprecation),
        )
        .await
    }

    /// Wait for an operation obtained elsewhere
    pub async fn wait_operation(&self, operation: OperationReference) -> Result<OperationStatus> {
        self.orchestrator.wait(operation, &self.cancel).await
    }

    /// Fetch an operation's current status once, retrying transient failures
    ///
    /// Always a plain GET; the server-side wait would block until DONE.
    pub async fn operation(&self, operation: &OperationReference) -> Result<OperationStatus> {
        let client = &*self.client;
        self.orchestrator
            .call(&self.cancel, move || {
                client.get_operation(&operation.project, &operation.scope, &operation.name)
            })
            .await
    }

    async fn instance_action(
        &self,
        project: &str,
        zone: &str,
        name: &str,
        verb: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<OperationStatus> {
        self.action(
            ResourceKind::Instance,
            project,
            &Scope::Zonal(zone.to_string()),
            name,
            verb,
            query,
            body,
        )
        .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn action(
        &self,
        kind: ResourceKind,
        project: &str,
        location: &Scope,
        name: &str,
        verb: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<OperationStatus> {
        kind.check(location)?;
        let client = &*self.client;
        let collection = kind.collection();
        let status = self
            .orchestrator
            .mutate(&self.cancel, move || {
                client.action(project, location, collection, name, verb, query, body)
            })
            .await?;
        info!(kind = %kind, name, verb, "action completed");
        Ok(status)
    }
}

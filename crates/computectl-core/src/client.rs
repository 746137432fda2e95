//! REST transport for the compute API
//!
//! [`ComputeClient`] issues single HTTP calls and maps their outcome onto
//! [`CallError`]. It never retries or polls; the orchestrator does that.
//!
//! Paths follow `{endpoint}/compute/{version}/projects/{project}/{scope}/{collection}`
//! where `{scope}` is `zones/{zone}`, `regions/{region}` or `global`.

use async_trait::async_trait;
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

use crate::api::OperationsApi;
use crate::error::{CallError, CoreError};
use crate::operation::{OperationReference, OperationStatus, Scope};
use crate::version::{ApiVersion, V1};

pub const DEFAULT_ENDPOINT: &str = "https://compute.googleapis.com";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// The server holds `/wait` for up to two minutes before answering with the
/// current status; the request must outlive that hold.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(150);

/// How the status of an operation is fetched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StatusMethod {
    /// `POST .../operations/{name}/wait`, the server holds the request until
    /// the operation is done or its own deadline passes
    #[default]
    Wait,
    /// `GET .../operations/{name}`, returns immediately
    Get,
}

/// Error envelope returned by the API on non-2xx responses
#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Fields of an operation resource needed to build a handle
#[derive(Deserialize)]
struct OperationHandle {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    zone: Option<String>,
    #[serde(default)]
    region: Option<String>,
}

/// HTTP client for one API surface
pub struct ComputeClient<V: ApiVersion = V1> {
    http: Client,
    endpoint: String,
    status_method: StatusMethod,
    wait_timeout: Duration,
    _version: PhantomData<V>,
}

impl<V: ApiVersion> Clone for ComputeClient<V> {
    fn clone(&self) -> Self {
        Self {
            http: self.http.clone(),
            endpoint: self.endpoint.clone(),
            status_method: self.status_method,
            wait_timeout: self.wait_timeout,
            _version: PhantomData,
        }
    }
}

impl<V: ApiVersion> std::fmt::Debug for ComputeClient<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComputeClient")
            .field("endpoint", &self.endpoint)
            .field("version", &V::PATH)
            .field("status_method", &self.status_method)
            .field("wait_timeout", &self.wait_timeout)
            .finish()
    }
}

/// Builder for [`ComputeClient`]
#[derive(Debug, Clone)]
pub struct ComputeClientBuilder {
    endpoint: String,
    timeout: Duration,
    user_agent: String,
    status_method: StatusMethod,
    wait_timeout: Duration,
}

impl Default for ComputeClientBuilder {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("computectl/{}", env!("CARGO_PKG_VERSION")),
            status_method: StatusMethod::default(),
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
        }
    }
}

impl ComputeClientBuilder {
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Per-request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn status_method(mut self, method: StatusMethod) -> Self {
        self.status_method = method;
        self
    }

    /// Timeout of `/wait` status fetches; never shorter than the per-request timeout
    pub fn wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    pub fn build<V: ApiVersion>(self) -> Result<ComputeClient<V>, CoreError> {
        Url::parse(&self.endpoint).map_err(|e| {
            CoreError::InvalidRequest(format!("invalid endpoint '{}': {}", self.endpoint, e))
        })?;

        let http = Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent)
            .build()
            .map_err(|e| CoreError::InvalidRequest(format!("failed to build HTTP client: {e}")))?;

        Ok(ComputeClient {
            http,
            endpoint: self.endpoint.trim_end_matches('/').to_string(),
            status_method: self.status_method,
            wait_timeout: self.wait_timeout.max(self.timeout),
            _version: PhantomData,
        })
    }
}

impl ComputeClient<V1> {
    pub fn builder() -> ComputeClientBuilder {
        ComputeClientBuilder::default()
    }
}

impl<V: ApiVersion> ComputeClient<V> {
    /// Client against the public endpoint with default settings
    pub fn new() -> Result<Self, CoreError> {
        ComputeClientBuilder::default().build()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn status_method(&self) -> StatusMethod {
        self.status_method
    }

    pub fn wait_timeout(&self) -> Duration {
        self.wait_timeout
    }

    /// URL of a collection, e.g. `.../projects/p/zones/z/disks`
    pub fn collection_url(
        &self,
        project: &str,
        scope: &Scope,
        collection: &str,
    ) -> Result<Url, CallError> {
        let raw = format!(
            "{}/compute/{}/projects/{}/{}/{}",
            self.endpoint,
            V::PATH,
            project,
            scope.path(),
            collection
        );
        Url::parse(&raw).map_err(|e| CallError::InvalidRequest(format!("{raw}: {e}")))
    }

    /// URL of one resource within a collection
    pub fn resource_url(
        &self,
        project: &str,
        scope: &Scope,
        collection: &str,
        name: &str,
    ) -> Result<Url, CallError> {
        let mut url = self.collection_url(project, scope, collection)?;
        push_segments(&mut url, &[name])?;
        Ok(url)
    }

    /// `POST` a new resource into a collection
    pub async fn insert<B: Serialize + ?Sized>(
        &self,
        project: &str,
        scope: &Scope,
        collection: &str,
        body: &B,
    ) -> Result<OperationReference, CallError> {
        let url = self.collection_url(project, scope, collection)?;
        let response = self.send(Method::POST, url, Some(body)).await?;
        decode_operation(response, project, scope).await
    }

    /// `DELETE` a resource
    pub async fn delete(
        &self,
        project: &str,
        scope: &Scope,
        collection: &str,
        name: &str,
    ) -> Result<OperationReference, CallError> {
        let url = self.resource_url(project, scope, collection, name)?;
        let response = self.send::<()>(Method::DELETE, url, None).await?;
        decode_operation(response, project, scope).await
    }

    /// `GET` a resource
    pub async fn get<T: DeserializeOwned>(
        &self,
        project: &str,
        scope: &Scope,
        collection: &str,
        name: &str,
    ) -> Result<T, CallError> {
        let url = self.resource_url(project, scope, collection, name)?;
        let response = self.send::<()>(Method::GET, url, None).await?;
        response.json().await.map_err(CallError::from)
    }

    /// Custom verb on a resource, e.g. `POST .../instances/vm-1/stop`
    #[allow(clippy::too_many_arguments)]
    pub async fn action<B: Serialize + ?Sized>(
        &self,
        project: &str,
        scope: &Scope,
        collection: &str,
        name: &str,
        verb: &str,
        query: &[(&str, &str)],
        body: Option<&B>,
    ) -> Result<OperationReference, CallError> {
        let mut url = self.resource_url(project, scope, collection, name)?;
        push_segments(&mut url, &[verb])?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        let response = self.send(Method::POST, url, body).await?;
        decode_operation(response, project, scope).await
    }

    fn operation_url(
        &self,
        project: &str,
        scope: &Scope,
        name: &str,
        status_method: StatusMethod,
    ) -> Result<Url, CallError> {
        let mut url = self.resource_url(project, scope, "operations", name)?;
        if status_method == StatusMethod::Wait {
            push_segments(&mut url, &["wait"])?;
        }
        Ok(url)
    }

    /// Current status of an operation, without the server-side wait
    pub async fn get_operation(
        &self,
        project: &str,
        scope: &Scope,
        name: &str,
    ) -> Result<OperationStatus, CallError> {
        self.fetch_operation(project, scope, name, StatusMethod::Get)
            .await
    }

    async fn fetch_operation(
        &self,
        project: &str,
        scope: &Scope,
        name: &str,
        status_method: StatusMethod,
    ) -> Result<OperationStatus, CallError> {
        let url = self.operation_url(project, scope, name, status_method)?;
        let response = match status_method {
            StatusMethod::Wait => {
                debug!(%url, timeout = ?self.wait_timeout, "compute operation wait");
                let request = self.http.post(url).timeout(self.wait_timeout);
                self.dispatch(request).await?
            }
            StatusMethod::Get => self.send::<()>(Method::GET, url, None).await?,
        };
        response.json().await.map_err(CallError::from)
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<Response, CallError> {
        debug!(%method, %url, "compute request");
        let mut request = self.http.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        self.dispatch(request).await
    }

    async fn dispatch(&self, request: reqwest::RequestBuilder) -> Result<Response, CallError> {
        let response = request.send().await?;
        handle_status(response).await
    }
}

#[async_trait]
impl<V: ApiVersion> OperationsApi for ComputeClient<V> {
    async fn zone_operation(
        &self,
        project: &str,
        zone: &str,
        name: &str,
    ) -> Result<OperationStatus, CallError> {
        self.fetch_operation(
            project,
            &Scope::Zonal(zone.to_string()),
            name,
            self.status_method,
        )
        .await
    }

    async fn region_operation(
        &self,
        project: &str,
        region: &str,
        name: &str,
    ) -> Result<OperationStatus, CallError> {
        self.fetch_operation(
            project,
            &Scope::Regional(region.to_string()),
            name,
            self.status_method,
        )
        .await
    }

    async fn global_operation(
        &self,
        project: &str,
        name: &str,
    ) -> Result<OperationStatus, CallError> {
        self.fetch_operation(project, &Scope::Global, name, self.status_method)
            .await
    }
}

fn push_segments(url: &mut Url, segments: &[&str]) -> Result<(), CallError> {
    url.path_segments_mut()
        .map_err(|()| CallError::InvalidRequest("endpoint cannot be a base URL".to_string()))?
        .extend(segments);
    Ok(())
}

/// Turn non-2xx responses into [`CallError::Api`]
async fn handle_status(response: Response) -> Result<Response, CallError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await?;
    trace!(status = status.as_u16(), body = %text, "compute error response");
    let message = match serde_json::from_str::<ErrorEnvelope>(&text) {
        Ok(envelope) if !envelope.error.message.is_empty() => envelope.error.message,
        _ if text.is_empty() => status.canonical_reason().unwrap_or("unknown").to_string(),
        _ => text,
    };
    Err(CallError::api(status.as_u16(), message))
}

/// Build a handle from a submission response
///
/// The operation's own `zone`/`region` links win over the scope of the
/// request; a response without a name cannot be polled.
async fn decode_operation(
    response: Response,
    project: &str,
    request_scope: &Scope,
) -> Result<OperationReference, CallError> {
    let handle: OperationHandle = response.json().await?;
    let name = handle
        .name
        .filter(|n| !n.is_empty())
        .ok_or_else(|| CallError::Decode("operation response has no name".to_string()))?;

    let scope = match Scope::from_links(handle.zone.as_deref(), handle.region.as_deref()) {
        Scope::Global => request_scope.clone(),
        scope => scope,
    };
    Ok(OperationReference::new(name, project, scope))
}

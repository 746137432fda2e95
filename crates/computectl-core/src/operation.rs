//! Operation handles and status snapshots
//!
//! A mutating call returns an [`OperationReference`]; the poller resolves it
//! into a terminal [`OperationStatus`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where an operation lives, which decides its status endpoint
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "scope", content = "location")]
pub enum Scope {
    Zonal(String),
    Regional(String),
    Global,
}

impl Scope {
    /// Parse from the `zone` / `region` fields of an operation resource
    ///
    /// Both fields hold either a bare name or a full resource URL.
    pub fn from_links(zone: Option<&str>, region: Option<&str>) -> Self {
        match (zone, region) {
            (Some(z), _) if !z.is_empty() => Scope::Zonal(last_segment(z).to_string()),
            (_, Some(r)) if !r.is_empty() => Scope::Regional(last_segment(r).to_string()),
            _ => Scope::Global,
        }
    }

    /// Path segment between the project and the collection
    pub fn path(&self) -> String {
        match self {
            Scope::Zonal(zone) => format!("zones/{zone}"),
            Scope::Regional(region) => format!("regions/{region}"),
            Scope::Global => "global".to_string(),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Zonal(zone) => write!(f, "zone {zone}"),
            Scope::Regional(region) => write!(f, "region {region}"),
            Scope::Global => write!(f, "global"),
        }
    }
}

fn last_segment(link: &str) -> &str {
    link.rsplit('/').next().unwrap_or(link)
}

/// Handle to a long-running remote operation
///
/// Not `Clone`: it is moved into the poller and resolved exactly once.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationReference {
    pub name: String,
    pub project: String,
    pub scope: Scope,
}

impl OperationReference {
    pub fn new(name: impl Into<String>, project: impl Into<String>, scope: Scope) -> Self {
        Self {
            name: name.into(),
            project: project.into(),
            scope,
        }
    }
}

impl fmt::Display for OperationReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, project {})", self.name, self.scope, self.project)
    }
}

/// Lifecycle state reported by the status endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationState {
    Pending,
    Running,
    Done,
}

impl fmt::Display for OperationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationState::Pending => write!(f, "PENDING"),
            OperationState::Running => write!(f, "RUNNING"),
            OperationState::Done => write!(f, "DONE"),
        }
    }
}

/// One per-step failure inside a finished operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationErrorDetail {
    #[serde(default)]
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub message: String,
}

impl fmt::Display for OperationErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{} at {}: {}", self.code, location, self.message),
            None => write!(f, "{}: {}", self.code, self.message),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationErrors {
    #[serde(default)]
    pub errors: Vec<OperationErrorDetail>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationWarning {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// Snapshot of an operation as returned by a status fetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationStatus {
    #[serde(default)]
    pub name: String,
    #[serde(alias = "Status")]
    pub status: OperationState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<OperationErrors>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_error_status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<OperationWarning>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl OperationStatus {
    /// Bare status with nothing but a name and state
    pub fn new(name: impl Into<String>, status: OperationState) -> Self {
        Self {
            name: name.into(),
            status,
            error: None,
            operation_type: None,
            target_link: None,
            progress: None,
            http_error_status_code: None,
            http_error_message: None,
            warnings: Vec::new(),
            zone: None,
            region: None,
        }
    }

    pub fn with_errors(mut self, errors: Vec<OperationErrorDetail>) -> Self {
        self.error = Some(OperationErrors { errors });
        self
    }

    pub fn is_done(&self) -> bool {
        self.status == OperationState::Done
    }

    /// Error details, empty when the operation reported none
    pub fn errors(&self) -> &[OperationErrorDetail] {
        self.error.as_ref().map(|e| e.errors.as_slice()).unwrap_or(&[])
    }

    /// True when DONE with an error payload
    pub fn has_failed(&self) -> bool {
        self.is_done() && self.error.is_some()
    }

    /// Scope derived from the `zone` / `region` links, if the API sent them
    pub fn scope(&self) -> Scope {
        Scope::from_links(self.zone.as_deref(), self.region.as_deref())
    }

    /// Last path segment of `targetLink`, usually the resource name
    pub fn target_name(&self) -> Option<&str> {
        self.target_link.as_deref().map(last_segment)
    }
}

//! API surface markers
//!
//! The stable, beta and alpha surfaces share every path and schema except
//! the version segment, so clients are generic over a marker type instead of
//! being written three times.

use std::fmt;

/// Stable surface (`/compute/v1/`)
#[derive(Debug, Clone, Copy, Default)]
pub struct V1;

/// Beta surface (`/compute/beta/`)
#[derive(Debug, Clone, Copy, Default)]
pub struct Beta;

/// Alpha surface (`/compute/alpha/`)
#[derive(Debug, Clone, Copy, Default)]
pub struct Alpha;

/// Sealed trait for API surfaces.
pub trait ApiVersion: private::Sealed + fmt::Debug + Clone + Copy + Send + Sync + 'static {
    /// Path segment after `/compute/`
    const PATH: &'static str;
}

impl ApiVersion for V1 {
    const PATH: &'static str = "v1";
}

impl ApiVersion for Beta {
    const PATH: &'static str = "beta";
}

impl ApiVersion for Alpha {
    const PATH: &'static str = "alpha";
}

mod private {
    pub trait Sealed {}
    impl Sealed for super::V1 {}
    impl Sealed for super::Beta {}
    impl Sealed for super::Alpha {}
}

/// Runtime selector, as stored in profiles and passed on the command line
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    serde::Serialize,
    serde::Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ApiVersionKind {
    #[default]
    V1,
    Beta,
    Alpha,
}

impl ApiVersionKind {
    pub fn path(self) -> &'static str {
        match self {
            ApiVersionKind::V1 => V1::PATH,
            ApiVersionKind::Beta => Beta::PATH,
            ApiVersionKind::Alpha => Alpha::PATH,
        }
    }
}

impl fmt::Display for ApiVersionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

//! Configuration and profile management for computectl
//!
//! # Features
//!
//! - Multiple named profiles, each bound to one project and API surface
//! - Environment variable expansion in config files
//! - Platform-specific config file locations
//! - Per-profile retry and polling settings

// Allow nested config module - this is intentional for the config subsystem
#![allow(clippy::module_inception)]

pub mod config;
pub mod error;
pub mod resilience;

// Re-export main types for convenience
pub use config::{Config, Profile};
pub use error::{ConfigError, Result};
pub use resilience::{HttpConfig, PollConfig, ResilienceConfig, RetryConfig};

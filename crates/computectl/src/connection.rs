//! Connection management: turns a profile into a ready-to-use compute handle

use std::path::PathBuf;
use std::sync::Arc;

use computectl_core::config::ResilienceConfig;
use computectl_core::{
    ApiVersion, CancellationToken, Compute, ComputeClientBuilder, Config, Orchestrator, Profile,
    ProgressCallback,
};
use tracing::{debug, info, trace};

use crate::error::{ComputeCtlError, Result as CliResult};

/// User agent string for computectl HTTP requests
const COMPUTECTL_USER_AGENT: &str = concat!("computectl/", env!("CARGO_PKG_VERSION"));

/// Environment variable overriding the profile endpoint
const ENDPOINT_ENV: &str = "COMPUTECTL_ENDPOINT";

/// Per-invocation overrides of the profile's resilience settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResilienceOverrides {
    pub no_retry: bool,
    pub retry_attempts: Option<u32>,
    pub poll_timeout_secs: Option<u64>,
}

impl ResilienceOverrides {
    /// Layer command-line flags over profile settings
    pub fn apply(&self, mut resilience: ResilienceConfig) -> ResilienceConfig {
        if self.no_retry {
            resilience.retry.enabled = false;
        }
        if let Some(attempts) = self.retry_attempts {
            resilience.retry.enabled = true;
            resilience.retry.max_attempts = attempts.max(1);
        }
        if let Some(timeout) = self.poll_timeout_secs {
            resilience.poll.timeout_secs = Some(timeout);
        }
        resilience
    }
}

/// A resolved profile together with its compute handle
pub struct Session<V: ApiVersion> {
    pub profile_name: String,
    pub profile: Profile,
    pub compute: Compute<V>,
}

/// Connection manager for creating configured compute handles
#[derive(Clone)]
pub struct ConnectionManager {
    pub config: Config,
    pub config_path: Option<PathBuf>,
    overrides: ResilienceOverrides,
    cancel: CancellationToken,
}

impl ConnectionManager {
    /// Create a new connection manager with a custom config path
    pub fn with_config_path(config: Config, config_path: Option<PathBuf>) -> Self {
        Self {
            config,
            config_path,
            overrides: ResilienceOverrides::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_overrides(mut self, overrides: ResilienceOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Token that aborts every in-flight retry and poll when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Save `config` to the file this manager was loaded from
    pub fn save_config(&self, config: &Config) -> CliResult<()> {
        if let Some(ref path) = self.config_path {
            config.save_to_path(path)?;
        } else {
            config.save()?;
        }
        Ok(())
    }

    /// Resolve the profile to use for this invocation
    pub fn resolve_profile(&self, profile_name: Option<&str>) -> CliResult<(String, Profile)> {
        let (name, profile) = self.config.active_profile(profile_name)?;
        Ok((name, profile.clone()))
    }

    /// Build a compute handle from the resolved profile
    ///
    /// When --config-file is given explicitly, `COMPUTECTL_ENDPOINT` is
    /// ignored so the file alone decides where requests go.
    pub fn session<V: ApiVersion>(
        &self,
        profile_name: Option<&str>,
        on_progress: Option<ProgressCallback>,
    ) -> CliResult<Session<V>> {
        let (name, mut profile) = self.resolve_profile(profile_name)?;
        info!("Using profile: {}", name);
        trace!("Profile: {:?}", profile);

        if profile.api_version.path() != V::PATH {
            return Err(ComputeCtlError::Configuration(format!(
                "profile '{}' targets the {} API, not {}",
                name,
                profile.api_version,
                V::PATH
            )));
        }

        if self.config_path.is_none()
            && let Ok(endpoint) = std::env::var(ENDPOINT_ENV)
        {
            debug!("Found {} environment variable", ENDPOINT_ENV);
            profile.endpoint = endpoint;
        }

        let resilience = self.overrides.apply(profile.resilience());
        debug!(
            retry_enabled = resilience.retry.enabled,
            max_attempts = resilience.retry.max_attempts,
            poll_timeout = ?resilience.poll.timeout_secs,
            method = ?resilience.poll.method,
            "Resilience settings resolved"
        );

        let client = ComputeClientBuilder::default()
            .endpoint(&profile.endpoint)
            .timeout(resilience.http.timeout())
            .wait_timeout(resilience.http.wait_timeout())
            .user_agent(COMPUTECTL_USER_AGENT)
            .status_method(resilience.poll.method)
            .build::<V>()?;
        let client = Arc::new(client);

        let mut builder = Orchestrator::builder(client.clone())
            .retry_policy(resilience.retry.policy())
            .poll_policy(resilience.poll.policy())
            .poll_deadline(resilience.poll.deadline());
        if let Some(callback) = on_progress {
            builder = builder.on_progress(callback);
        }

        let compute = Compute::from_parts(client, builder.build())
            .with_cancellation(self.cancel.clone());

        info!(
            "Connecting to {} ({} API) for project {}",
            profile.endpoint, profile.api_version, profile.project
        );
        Ok(Session {
            profile_name: name,
            profile,
            compute,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use computectl_core::{Alpha, ApiVersionKind, V1};

    fn config_with(profile: Profile) -> Config {
        let mut config = Config::default();
        config.set_profile("dev".to_string(), profile);
        config
    }

    #[test]
    fn no_retry_disables_retries() {
        let overrides = ResilienceOverrides {
            no_retry: true,
            ..Default::default()
        };
        let resilience = overrides.apply(ResilienceConfig::default());
        assert!(!resilience.retry.enabled);
        assert_eq!(resilience.retry.policy().max_attempts, Some(1));
    }

    #[test]
    fn retry_attempts_and_poll_timeout_override_profile() {
        let overrides = ResilienceOverrides {
            no_retry: false,
            retry_attempts: Some(3),
            poll_timeout_secs: Some(30),
        };
        let resilience = overrides.apply(ResilienceConfig::default());
        assert_eq!(resilience.retry.max_attempts, 3);
        assert_eq!(
            resilience.poll.deadline(),
            Some(std::time::Duration::from_secs(30))
        );
    }

    #[test]
    fn session_rejects_mismatched_surface() {
        let mut profile = Profile::new("p");
        profile.api_version = ApiVersionKind::Beta;
        let conn = ConnectionManager::with_config_path(
            config_with(profile),
            Some(PathBuf::from("/tmp/unused.toml")),
        );

        assert!(conn.session::<V1>(None, None).is_err());
        assert!(conn.session::<Alpha>(None, None).is_err());
    }

    #[test]
    fn session_uses_profile_endpoint_and_project() {
        let mut profile = Profile::new("my-project");
        profile.endpoint = "http://localhost:9999".to_string();
        let conn = ConnectionManager::with_config_path(
            config_with(profile),
            Some(PathBuf::from("/tmp/unused.toml")),
        );

        let session = conn.session::<V1>(None, None).unwrap();
        assert_eq!(session.profile_name, "dev");
        assert_eq!(session.profile.project, "my-project");
        assert_eq!(session.compute.client().endpoint(), "http://localhost:9999");
    }

    #[test]
    fn missing_profile_is_reported() {
        let conn = ConnectionManager::with_config_path(Config::default(), None);
        assert!(matches!(
            conn.resolve_profile(None),
            Err(ComputeCtlError::NoProfileConfigured)
        ));
        assert!(matches!(
            conn.resolve_profile(Some("ghost")),
            Err(ComputeCtlError::ProfileNotFound { .. })
        ));
    }
}

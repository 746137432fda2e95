//! Error types for computectl
//!
//! Defines structured error types using thiserror for better error handling and user experience.

use colored::Colorize;
use computectl_core::{ConfigError, CoreError, ErrorClass, ErrorKind, classify};
use thiserror::Error;

/// Cargo-style diagnostic formatter for CLI errors.
///
/// Produces structured output like:
/// ```text
/// error: Profile 'dev' has no default zone
///
///   tip: Pass it explicitly: --zone
///       computectl profile set dev --project my-project --zone us-central1-a
/// ```
pub struct CliDiagnostic {
    message: String,
    detail: Option<String>,
    tips: Vec<(String, Vec<String>)>,
}

impl CliDiagnostic {
    /// Start a new error diagnostic with the given message.
    pub fn error(message: &str) -> Self {
        Self {
            message: message.to_string(),
            detail: None,
            tips: Vec::new(),
        }
    }

    /// Add a detail line below the error message.
    pub fn detail(mut self, text: &str) -> Self {
        self.detail = Some(text.to_string());
        self
    }

    /// Add a tip with optional example commands.
    pub fn tip(mut self, description: &str, commands: &[&str]) -> Self {
        self.tips.push((
            description.to_string(),
            commands.iter().map(|s| s.to_string()).collect(),
        ));
        self
    }

    /// Print the diagnostic to stderr with colored formatting.
    pub fn print(&self) {
        eprint!("{}{}", "error".red().bold(), ": ".bold());
        eprintln!("{}", self.message);

        if let Some(detail) = &self.detail {
            eprintln!("  {}", detail);
        }

        for (description, commands) in &self.tips {
            eprintln!();
            eprint!("  {}{}", "tip".yellow().bold(), ": ".bold());
            eprintln!("{}", description);
            for cmd in commands {
                eprintln!("      {}", cmd);
            }
        }
    }
}

/// Main error type for the computectl application
#[derive(Error, Debug)]
pub enum ComputeCtlError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("No profile configured. Use 'computectl profile set' to configure a profile.")]
    NoProfileConfigured,

    #[error("Profile '{profile}' has no default {field}")]
    MissingLocation { profile: String, field: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("File error for '{path}': {message}")]
    FileError { path: String, message: String },

    #[error("API error: {message}")]
    ApiError { code: Option<u16>, message: String },

    #[error("Gave up after {attempts} attempts: {message}")]
    RetriesExhausted {
        attempts: u32,
        class: Option<ErrorClass>,
        message: String,
    },

    #[error("Operation {operation} failed: {message}")]
    OperationFailed { operation: String, message: String },

    #[error("Timeout: {message}")]
    Timeout { message: String },

    #[error("Interrupted")]
    Cancelled,

    #[error("Unexpected API response: {message}")]
    InvalidResponse { message: String },

    #[error("Output formatting error: {message}")]
    OutputError { message: String },
}

/// Result type for computectl operations
pub type Result<T> = std::result::Result<T, ComputeCtlError>;

impl ComputeCtlError {
    /// Get helpful suggestions for resolving this error
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            ComputeCtlError::ProfileNotFound { name } => vec![
                "List available profiles: computectl profile list".to_string(),
                format!(
                    "Create profile '{}': computectl profile set {} --project <project>",
                    name, name
                ),
                "Check profile name spelling".to_string(),
            ],
            ComputeCtlError::NoProfileConfigured => vec![
                "Create a profile: computectl profile set dev --project <project> --zone <zone>"
                    .to_string(),
                "View profile documentation: computectl profile --help".to_string(),
            ],
            ComputeCtlError::MissingLocation { profile, field } => vec![
                format!("Pass it explicitly: --{}", field),
                format!(
                    "Store a default: computectl profile set {} --project <project> --{} <{}>",
                    profile, field, field
                ),
            ],
            ComputeCtlError::ApiError {
                code: Some(404), ..
            } => vec![
                "Verify the resource name and location are correct".to_string(),
                "Check that you're using the correct profile".to_string(),
            ],
            ComputeCtlError::ApiError {
                code: Some(401 | 403),
                ..
            } => vec![
                "Check that the profile's project is correct: computectl profile show <profile>"
                    .to_string(),
                "Ensure the endpoint accepts your credentials".to_string(),
            ],
            ComputeCtlError::RetriesExhausted {
                class: Some(ErrorClass::RateLimited),
                ..
            } => vec![
                "The API kept throttling; retry later or allow more attempts with --retry-attempts"
                    .to_string(),
            ],
            ComputeCtlError::RetriesExhausted { .. } => vec![
                "Check network connectivity and the profile endpoint".to_string(),
                "Allow more attempts with --retry-attempts".to_string(),
            ],
            ComputeCtlError::Timeout { .. } => vec![
                "The operation may still finish; check it with: computectl operation get <name>"
                    .to_string(),
                "Wait longer with --poll-timeout".to_string(),
            ],
            ComputeCtlError::InvalidInput { .. } => vec![
                "Check the command syntax: computectl <command> --help".to_string(),
                "Verify input file format is correct (JSON/YAML)".to_string(),
            ],
            ComputeCtlError::FileError { path, .. } => vec![
                format!("Check that file exists: {}", path),
                "Verify file permissions are correct".to_string(),
            ],
            _ => vec![],
        }
    }

    /// Print a cargo-style diagnostic to stderr using colored formatting.
    pub fn print_diagnostic(&self) {
        let mut diag = CliDiagnostic::error(&format!("{}", self));

        if let ComputeCtlError::RetriesExhausted {
            class: Some(class), ..
        } = self
        {
            diag = diag.detail(&format!("last failure: {:?}", class));
        }

        for suggestion in self.suggestions() {
            diag = diag.tip(&suggestion, &[]);
        }

        diag.print();
    }
}

impl From<CoreError> for ComputeCtlError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err.kind() {
            ErrorKind::ClientRejected => ComputeCtlError::ApiError {
                code: err.call_error().and_then(|e| e.status_code()),
                message: err
                    .call_error()
                    .map(ToString::to_string)
                    .unwrap_or(message),
            },
            ErrorKind::RetriesExhausted => match err {
                CoreError::RetriesExhausted {
                    attempts, source, ..
                } => ComputeCtlError::RetriesExhausted {
                    attempts,
                    class: Some(classify(Some(&source))),
                    message: source.to_string(),
                },
                _ => ComputeCtlError::ApiError {
                    code: None,
                    message,
                },
            },
            ErrorKind::OperationFailed => match err {
                CoreError::OperationFailed { operation, errors } => {
                    ComputeCtlError::OperationFailed {
                        operation,
                        message: if errors.is_empty() {
                            "no error details".to_string()
                        } else {
                            errors
                                .iter()
                                .map(ToString::to_string)
                                .collect::<Vec<_>>()
                                .join("; ")
                        },
                    }
                }
                _ => ComputeCtlError::ApiError {
                    code: None,
                    message,
                },
            },
            ErrorKind::PollTimedOut => ComputeCtlError::Timeout { message },
            ErrorKind::Cancelled => ComputeCtlError::Cancelled,
            ErrorKind::InvalidRequest => ComputeCtlError::InvalidInput { message },
            ErrorKind::InvalidResponse => ComputeCtlError::InvalidResponse { message },
        }
    }
}

impl From<ConfigError> for ComputeCtlError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ProfileNotFound { name } => ComputeCtlError::ProfileNotFound { name },
            ConfigError::NoProfiles { .. } => ComputeCtlError::NoProfileConfigured,
            ConfigError::MissingField { profile, field } => {
                ComputeCtlError::MissingLocation { profile, field }
            }
            other => ComputeCtlError::Configuration(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ComputeCtlError {
    fn from(err: serde_json::Error) -> Self {
        ComputeCtlError::OutputError {
            message: format!("JSON error: {}", err),
        }
    }
}

impl From<serde_yaml::Error> for ComputeCtlError {
    fn from(err: serde_yaml::Error) -> Self {
        ComputeCtlError::OutputError {
            message: format!("YAML error: {}", err),
        }
    }
}

impl From<std::io::Error> for ComputeCtlError {
    fn from(err: std::io::Error) -> Self {
        ComputeCtlError::OutputError {
            message: format!("IO error: {}", err),
        }
    }
}

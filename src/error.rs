//! Error kinds produced while running a disruption test.

use thiserror::Error;

/// Errors that can occur during a single trigger invocation.
#[derive(Error, Debug)]
pub enum DisruptionError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Auto Scaling Group '{0}' not found")]
    NotFound(String),

    #[error("No eligible (InService and Healthy) instances found in Auto Scaling Group '{0}'")]
    NoEligibleTarget(String),

    #[error("[{operation}] {message}")]
    Service { operation: String, message: String },
}

impl DisruptionError {
    /// Wrap an AWS SDK error, keeping only the single-line message the service returned.
    pub fn service<E: std::fmt::Debug + std::fmt::Display>(operation: &str, err: E) -> Self {
        let err_debug = format!("{err:?}");
        let err_display = err.to_string();

        Self::Service {
            operation: operation.to_string(),
            message: Self::extract_error_details(&err_debug, &err_display),
        }
    }

    /// Pull the `message: Some("...")` field out of an SDK error's debug output.
    fn extract_error_details(debug_str: &str, display_str: &str) -> String {
        if let Some(pos) = debug_str.find("message: Some(\"") {
            let start = pos + "message: Some(\"".len();
            let rest = &debug_str[start..];
            if let Some(end) = rest.find('"') {
                return rest[..end].to_string();
            }
        }

        // SDK display strings are just "service error" when the body was not parsed
        if !display_str.to_lowercase().contains("service error") {
            return display_str.to_string();
        }

        "AWS API request failed".to_string()
    }

    /// Short machine-friendly label, used as a structured log field.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::NotFound(_) => "not_found",
            Self::NoEligibleTarget(_) => "no_eligible_target",
            Self::Service { .. } => "service",
        }
    }
}

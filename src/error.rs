use std::io;

use crate::slack::DeliveryFailure;

/// Custom error type for cloudbuild_notifier operations
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Malformed build event: {0}")]
    MalformedPayload(String),

    #[error("Build {build_id} has no tags to report as the deploy tag")]
    MissingDeployTag { build_id: String },

    #[error("Build {build_id} has no branch in its source or substitutions")]
    MissingBranch { build_id: String },

    #[error("Failed to send a message to Slack: {}", format_failures(.0))]
    Delivery(Vec<DeliveryFailure>),

    #[error("Failed to export Firestore: {0}")]
    Export(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl NotifyError {
    /// Errors the invocation can acknowledge without asking for redelivery,
    /// since the same event would fail the same way again.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            NotifyError::MissingDeployTag { .. } | NotifyError::MissingBranch { .. }
        )
    }
}

fn format_failures(failures: &[DeliveryFailure]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Helper type for Results that use NotifyError
pub type Result<T> = std::result::Result<T, NotifyError>;

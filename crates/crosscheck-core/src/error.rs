use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrossCheckError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    /// No usable secret was found locally. The message carries the
    /// remediation steps verbatim.
    #[error("{0}")]
    MissingCredential(String),

    #[error(
        "OAuth token at {} has expired and has no refresh_token; re-authenticate and save a new token",
        .token_path.display()
    )]
    ReauthRequired { token_path: PathBuf },

    #[error("Token refresh failed: {}", describe_failure(.status, .reason))]
    RefreshFailed { status: Option<u16>, reason: String },

    #[error("Provider request failed: {}", describe_failure(.status, .reason))]
    ProviderRequestFailed { status: Option<u16>, reason: String },

    #[error("Malformed provider response: {0}")]
    MalformedProviderResponse(String),

    #[error("Invalid input: {}", .0.join("; "))]
    InvalidInput(Vec<String>),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),
}

fn describe_failure(status: &Option<u16>, reason: &str) -> String {
    match status {
        Some(code) => format!("HTTP {code} {reason}"),
        None => reason.to_string(),
    }
}

impl CrossCheckError {
    /// Builds a `ProviderRequestFailed` from a transport-level reqwest error.
    pub fn provider_transport(err: reqwest::Error) -> Self {
        Self::ProviderRequestFailed {
            status: err.status().map(|s| s.as_u16()),
            reason: err.to_string(),
        }
    }
}

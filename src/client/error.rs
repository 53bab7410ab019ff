use crate::tvm::TvmError;

/// Errors returned by the HTTP API provider
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("API returned inconsistent response")]
    InconsistentResponse,
    #[error("API returned error: {0}")]
    Api(String),
    #[error("Get-method failed with exit code {0}")]
    ExitCode(i64),
    #[error("Unexpected stack entry: {0}")]
    UnexpectedStackEntry(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Cell error: {0}")]
    Tvm(#[from] TvmError),
}

impl ProviderError {
    /// Errors worth retrying: the request may not have reached the API
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Transport(_) => true,
            ProviderError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProviderError>;

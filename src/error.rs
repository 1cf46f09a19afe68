use reqwest::StatusCode;

/// Startup configuration failures. Any of these stops the process before it binds.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing GH_PERSONAL_ACCESS_TOKEN")]
    MissingToken,

    #[error("Invalid PORT value: {0}")]
    InvalidPort(String),

    #[error("GH_PERSONAL_ACCESS_TOKEN contains characters not allowed in an HTTP header")]
    InvalidToken,

    #[error("Invalid GITHUB_USER_AGENT value: {0:?}")]
    InvalidUserAgent(String),
}

/// Failures raised while running a tool. None of them is retried.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Invalid PR URL: {0}")]
    InvalidPrUrl(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("GitHub API error {status}: {body}")]
    Upstream { status: StatusCode, body: String },

    #[error("GitHub request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected GitHub response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ToolError {
    /// Argument errors are rejected at the protocol layer; everything else
    /// becomes error content in the tool result.
    pub fn is_invalid_params(&self) -> bool {
        matches!(self, ToolError::InvalidParams(_))
    }
}

use std::env;

use reqwest::header::HeaderValue;

use crate::error::ConfigError;

pub const DEFAULT_PORT: u16 = 3333;
pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_WEB_HOST: &str = "github.com";

/// Runtime configuration for the server and its GitHub REST client.
/// Built once at startup and handed to every request explicitly.
#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    pub api_url: String,
    pub web_host: String,
    pub api_version: String,
    pub user_agent: String,
    pub timeout_secs: Option<u64>,
    pub port: u16,
}

impl Config {
    /// Config with defaults for everything but the token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_url: DEFAULT_API_URL.to_string(),
            web_host: DEFAULT_WEB_HOST.to_string(),
            api_version: "2022-11-28".to_string(),
            user_agent: format!("github-pr-mcp/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: None,
            port: DEFAULT_PORT,
        }
    }

    /// Point the REST client at a different API base (mock servers, GHES).
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Load configuration from environment.
    ///
    /// Env vars:
    /// - GH_PERSONAL_ACCESS_TOKEN [required]
    /// - PORT (default: 3333)
    /// - GITHUB_API_URL (default: https://api.github.com)
    /// - GITHUB_WEB_HOST (default: github.com)
    /// - GITHUB_API_VERSION (default: 2022-11-28)
    /// - GITHUB_USER_AGENT (default: github-pr-mcp/<version>)
    /// - GITHUB_HTTP_TIMEOUT_SECS (default: none)
    pub fn from_env() -> Result<Self, ConfigError> {
        let token = env::var("GH_PERSONAL_ACCESS_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingToken)?;

        let mut cfg = Config::new(token);

        if let Ok(api_url) = env::var("GITHUB_API_URL") {
            cfg = cfg.with_api_url(api_url);
        }
        if let Ok(host) = env::var("GITHUB_WEB_HOST") {
            cfg.web_host = host;
        }
        if let Ok(version) = env::var("GITHUB_API_VERSION") {
            cfg.api_version = version;
        }
        if let Ok(ua) = env::var("GITHUB_USER_AGENT") {
            cfg.user_agent = ua;
        }
        cfg.timeout_secs = env::var("GITHUB_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok());

        if let Ok(raw) = env::var("PORT") {
            cfg.port = raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw.clone()))?;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values the REST client could never put on the wire.
    pub fn validate(&self) -> Result<(), ConfigError> {
        HeaderValue::from_str(&format!("Bearer {}", self.token))
            .map_err(|_| ConfigError::InvalidToken)?;
        HeaderValue::from_str(&self.user_agent)
            .map_err(|_| ConfigError::InvalidUserAgent(self.user_agent.clone()))?;
        Ok(())
    }
}

use crate::config::Config;
use crate::error::ToolError;
use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const ACCEPT_JSON: &str = "application/vnd.github+json";
pub const ACCEPT_DIFF: &str = "application/vnd.github.v3.diff";

/// Authenticated GET-only client for the GitHub REST API.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: Client,
    api_url: String,
    api_version: String,
    auth: HeaderValue,
}

impl GitHubClient {
    pub fn new(cfg: &Config) -> Result<Self, ToolError> {
        Ok(Self {
            client: build_client(cfg)?,
            api_url: cfg.api_url.trim_end_matches('/').to_string(),
            api_version: cfg.api_version.clone(),
            auth: auth_header(&cfg.token)?,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    /// GET `path` (relative to the API base) and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ToolError> {
        let res = self.send(path, ACCEPT_JSON).await?;
        let text = res.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// GET `path` with a custom media type and return the raw body.
    pub async fn get_text(&self, path: &str, accept: &str) -> Result<String, ToolError> {
        let res = self.send(path, accept).await?;
        Ok(res.text().await?)
    }

    async fn send(&self, path: &str, accept: &str) -> Result<Response, ToolError> {
        let url = self.url(path);
        debug!("REST GET {} accept={}", url, accept);
        let accept = HeaderValue::from_str(accept)
            .map_err(|_| ToolError::InvalidParams(format!("invalid Accept header: {}", accept)))?;
        let res = self
            .client
            .get(&url)
            .header(AUTHORIZATION, self.auth.clone())
            .header("X-GitHub-Api-Version", &self.api_version)
            .header(ACCEPT, accept)
            .send()
            .await?;

        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }
        let body = res.text().await.unwrap_or_default();
        warn!("REST GET {} failed with status {}", url, status);
        Err(ToolError::Upstream { status, body })
    }
}

pub fn build_client(cfg: &Config) -> Result<Client, ToolError> {
    let mut default_headers = HeaderMap::new();
    let ua = HeaderValue::from_str(&cfg.user_agent)
        .map_err(|_| ToolError::InvalidParams("invalid GITHUB_USER_AGENT".into()))?;
    default_headers.insert(USER_AGENT, ua);
    let mut builder = Client::builder()
        .default_headers(default_headers)
        .use_rustls_tls();
    // No deadline unless one is configured explicitly.
    if let Some(secs) = cfg.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    Ok(builder.build()?)
}

fn auth_header(token: &str) -> Result<HeaderValue, ToolError> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
        .map_err(|_| ToolError::InvalidParams("token contains invalid header characters".into()))?;
    value.set_sensitive(true);
    Ok(value)
}

/// Percent-encode a single URL path segment (owner, repo, ...).
pub fn encode_path_segment(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

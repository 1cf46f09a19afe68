use crate::error::ToolError;
use url::Url;

/// Owner, repository and number of a pull request, as found in its web URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRef {
    pub owner: String,
    pub repo: String,
    /// Kept as text; GitHub rejects bad numbers itself.
    pub number: String,
}

impl PullRequestRef {
    /// `/repos/{owner}/{repo}/pulls/{number}` with encoded segments.
    pub fn api_path(&self) -> String {
        format!(
            "/repos/{}/{}/pulls/{}",
            crate::http::encode_path_segment(&self.owner),
            crate::http::encode_path_segment(&self.repo),
            crate::http::encode_path_segment(&self.number),
        )
    }
}

/// Parse `https://{host}/{owner}/{repo}/pull/{number}[/...]`.
///
/// The first `pull` segment must sit at index 2 or later and be followed by a
/// non-empty segment; owner and repo are the two segments right before it.
pub fn parse_pr_url(raw: &str, expected_host: &str) -> Result<PullRequestRef, ToolError> {
    let url = Url::parse(raw.trim()).map_err(|e| ToolError::InvalidPrUrl(format!("{}: {}", raw, e)))?;
    if !url
        .host_str()
        .is_some_and(|h| h.eq_ignore_ascii_case(expected_host))
    {
        return Err(ToolError::InvalidPrUrl(format!(
            "{}: host must be {}",
            raw, expected_host
        )));
    }

    let parts: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|p| !p.is_empty()).collect())
        .unwrap_or_default();
    let idx = parts
        .iter()
        .position(|p| *p == "pull")
        .filter(|i| *i >= 2)
        .ok_or_else(|| ToolError::InvalidPrUrl(format!("{}: expected /owner/repo/pull/N", raw)))?;
    let number = parts
        .get(idx + 1)
        .ok_or_else(|| ToolError::InvalidPrUrl(format!("{}: missing pull request number", raw)))?;

    Ok(PullRequestRef {
        owner: parts[idx - 2].to_string(),
        repo: parts[idx - 1].to_string(),
        number: number.to_string(),
    })
}

use crate::error::ToolError;
use crate::http::GitHubClient;
use crate::pr_url::PullRequestRef;
use log::debug;
use serde::{Deserialize, Serialize};

/// GitHub caps `per_page` at 100.
pub const MAX_PAGE_SIZE: usize = 100;

/// One entry of `GET /repos/{owner}/{repo}/pulls/{number}/files`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileChange {
    pub filename: String,
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub patch: Option<String>,
}

/// Collect at most `max_files` changed-file records, one page at a time.
///
/// Stops on an empty page, a short page, or once the cap is reached. When the
/// PR's `changed_files` count is known it bounds the loop as well, so a total
/// that is an exact multiple of the page size needs no trailing empty page.
/// Pages are requested sequentially with a constant `per_page` so page
/// offsets stay aligned; the last page is cut down locally to the remaining
/// budget.
pub async fn collect_pr_files(
    client: &GitHubClient,
    pr: &PullRequestRef,
    max_files: usize,
    known_total: Option<usize>,
) -> Result<Vec<FileChange>, ToolError> {
    let mut files: Vec<FileChange> = Vec::new();
    let limit = known_total.map_or(max_files, |total| total.min(max_files));
    if limit == 0 {
        return Ok(files);
    }
    let per_page = max_files.min(MAX_PAGE_SIZE);
    let base = format!("{}/files", pr.api_path());
    let mut page: u32 = 1;

    while files.len() < limit {
        let path = format!("{}?per_page={}&page={}", base, per_page, page);
        let batch: Vec<FileChange> = client.get_json(&path).await?;
        let received = batch.len();
        debug!("PR files page {} returned {} entries", page, received);

        let remaining = max_files - files.len();
        files.extend(batch.into_iter().take(remaining));

        if received < per_page {
            break;
        }
        page += 1;
    }

    Ok(files)
}

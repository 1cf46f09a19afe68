use crate::config::Config;
use crate::error::ToolError;
use crate::http::{encode_path_segment, GitHubClient, ACCEPT_DIFF};
use crate::pagination::{collect_pr_files, FileChange};
use crate::pr_url::{parse_pr_url, PullRequestRef};
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const LIST_REPOS: &str = "github_list_repos";
pub const LIST_PULL_REQUESTS: &str = "github_list_pull_requests";
pub const GET_PULL_REQUEST_DIFF: &str = "github_get_pull_request_diff";
pub const SUMMARIZE_PULL_REQUEST: &str = "github_summarize_pull_request";

pub const MAX_DIFF_CHARS: u32 = 200_000;
pub const DEFAULT_DIFF_CHARS: u32 = 40_000;
pub const MAX_PATCH_CHARS: u32 = 4_000;

pub const SUMMARY_INSTRUCTION: &str = "Write a concise review summary of this pull request from the material below: what it changes and why, plus anything a reviewer should look at closely.";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

pub fn tool_descriptors() -> Vec<ToolDescriptor> {
    let list_repos = ToolDescriptor {
        name: LIST_REPOS.into(),
        description: "List repositories of the authenticated user".into(),
        input_schema: serde_json::json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "visibility": {"type": "string", "enum": ["all", "public", "private"], "default": "all"},
                "per_page": {"type": "integer", "minimum": 1, "maximum": 100, "default": 100}
            }
        }),
    };

    let list_prs = ToolDescriptor {
        name: LIST_PULL_REQUESTS.into(),
        description: "List pull requests of a repository".into(),
        input_schema: serde_json::json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "owner": {"type": "string", "minLength": 1},
                "repo": {"type": "string", "minLength": 1},
                "state": {"type": "string", "enum": ["open", "closed", "all"], "default": "open"},
                "per_page": {"type": "integer", "minimum": 1, "maximum": 100, "default": 30}
            },
            "required": ["owner", "repo"]
        }),
    };

    let get_diff = ToolDescriptor {
        name: GET_PULL_REQUEST_DIFF.into(),
        description: "Fetch the unified diff of a pull request by its URL".into(),
        input_schema: serde_json::json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "pr_url": {"type": "string", "format": "uri"},
                "max_diff_chars": {"type": "integer", "minimum": 0, "maximum": MAX_DIFF_CHARS, "default": DEFAULT_DIFF_CHARS, "description": "0 disables truncation"}
            },
            "required": ["pr_url"]
        }),
    };

    let summarize = ToolDescriptor {
        name: SUMMARIZE_PULL_REQUEST.into(),
        description: "Gather pull request metadata, changed files and optionally the diff as summary material".into(),
        input_schema: serde_json::json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "pr_url": {"type": "string", "format": "uri"},
                "include_patches": {"type": "boolean", "default": true},
                "max_files": {"type": "integer", "minimum": 1, "maximum": 300, "default": 50},
                "max_patch_chars": {"type": "integer", "minimum": 0, "maximum": MAX_PATCH_CHARS, "default": 2000},
                "include_diff": {"type": "boolean", "default": false},
                "max_diff_chars": {"type": "integer", "minimum": 0, "maximum": MAX_DIFF_CHARS, "default": DEFAULT_DIFF_CHARS}
            },
            "required": ["pr_url"]
        }),
    };

    vec![list_repos, list_prs, get_diff, summarize]
}

// Tool inputs

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    All,
    Public,
    Private,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::All => "all",
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrState {
    #[default]
    Open,
    Closed,
    All,
}

impl PrState {
    pub fn as_str(self) -> &'static str {
        match self {
            PrState::Open => "open",
            PrState::Closed => "closed",
            PrState::All => "all",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListReposInput {
    #[serde(default)]
    pub visibility: Visibility,
    pub per_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListPullRequestsInput {
    pub owner: String,
    pub repo: String,
    #[serde(default)]
    pub state: PrState,
    pub per_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetPullRequestDiffInput {
    pub pr_url: String,
    pub max_diff_chars: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SummarizePullRequestInput {
    pub pr_url: String,
    pub include_patches: Option<bool>,
    pub max_files: Option<u32>,
    pub max_patch_chars: Option<u32>,
    pub include_diff: Option<bool>,
    pub max_diff_chars: Option<u32>,
}

fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, ToolError> {
    let args = if args.is_null() {
        Value::Object(Default::default())
    } else {
        args
    };
    serde_json::from_value(args).map_err(|e| ToolError::InvalidParams(e.to_string()))
}

fn enforce_range(field: &str, value: Option<u32>, default: u32, min: u32, max: u32) -> Result<u32, ToolError> {
    let v = value.unwrap_or(default);
    if v < min || v > max {
        return Err(ToolError::InvalidParams(format!(
            "{} must be {}..={}",
            field, min, max
        )));
    }
    Ok(v)
}

fn require_non_empty(field: &str, value: &str) -> Result<(), ToolError> {
    if value.trim().is_empty() {
        return Err(ToolError::InvalidParams(format!("{} must not be empty", field)));
    }
    Ok(())
}

fn require_url(field: &str, value: &str) -> Result<(), ToolError> {
    url::Url::parse(value.trim())
        .map(|_| ())
        .map_err(|_| ToolError::InvalidParams(format!("{} must be a URL", field)))
}

// Upstream shapes (only the fields we render)

#[derive(Debug, Deserialize)]
struct RepoItem {
    full_name: String,
    #[serde(default)]
    private: bool,
}

#[derive(Debug, Deserialize)]
struct UserRef {
    login: String,
}

#[derive(Debug, Deserialize)]
struct PullItem {
    number: u64,
    title: String,
    user: Option<UserRef>,
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct BranchRef {
    #[serde(rename = "ref")]
    name: String,
}

/// Fields of `GET /repos/{owner}/{repo}/pulls/{number}` used in the summary.
#[derive(Debug, Deserialize)]
pub struct PullRequestDetail {
    title: String,
    #[serde(default)]
    body: Option<String>,
    user: Option<UserRef>,
    state: String,
    #[serde(default)]
    draft: bool,
    #[serde(default)]
    merged: bool,
    base: BranchRef,
    head: BranchRef,
    #[serde(default)]
    commits: u64,
    #[serde(default)]
    changed_files: u64,
    #[serde(default)]
    additions: u64,
    #[serde(default)]
    deletions: u64,
}

// Truncation shared by every diff/patch-returning tool.

/// Cut `text` to `max_chars` characters. `0` means no limit.
/// Returns the kept text and, when something was cut, the original length.
pub fn truncate_chars(text: &str, max_chars: usize) -> (&str, Option<usize>) {
    if max_chars == 0 {
        return (text, None);
    }
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => (&text[..idx], Some(text.chars().count())),
        None => (text, None),
    }
}

pub fn truncation_notice(kept: usize, total: usize) -> String {
    format!("(truncated to {} chars of {})", kept, total)
}

// Renderers

pub fn render_diff(pr_url: &str, diff: &str, max_diff_chars: usize) -> String {
    let (kept, total) = truncate_chars(diff, max_diff_chars);
    let mut out = format!("Diff for {}\n", pr_url.trim());
    if let Some(total) = total {
        out.push_str(&truncation_notice(max_diff_chars, total));
        out.push('\n');
    }
    out.push('\n');
    out.push_str(kept);
    out
}

#[derive(Debug, Clone, Copy)]
pub struct SummaryOptions {
    pub include_patches: bool,
    pub max_patch_chars: usize,
    pub max_diff_chars: usize,
}

/// Summary material; always starts with the `PR:` line.
pub fn render_summary_material(
    pr_url: &str,
    pr: &PullRequestDetail,
    files: &[FileChange],
    diff: Option<&str>,
    opts: SummaryOptions,
) -> String {
    let author = pr.user.as_ref().map(|u| u.login.as_str()).unwrap_or("unknown");
    let mut lines = vec![
        format!("PR: {}", pr_url.trim()),
        format!("Title: {}", pr.title),
        format!("Author: {}", author),
        format!("State: {} | Draft: {} | Merged: {}", pr.state, pr.draft, pr.merged),
        format!("Base: {} <- Head: {}", pr.base.name, pr.head.name),
        format!(
            "Commits: {} | Changed files: {} | +{}/-{}",
            pr.commits, pr.changed_files, pr.additions, pr.deletions
        ),
        String::new(),
        "Description:".to_string(),
    ];
    match pr.body.as_deref().map(str::trim) {
        Some(body) if !body.is_empty() => lines.push(body.to_string()),
        _ => lines.push("(no description)".to_string()),
    }
    lines.push(String::new());

    lines.push(format!("Files ({} shown):", files.len()));
    for f in files {
        lines.push(format!(
            "- {} (+{}/-{}) [{}]",
            f.filename, f.additions, f.deletions, f.status
        ));
        if !opts.include_patches {
            continue;
        }
        let Some(patch) = f.patch.as_deref() else {
            continue;
        };
        let (kept, total) = truncate_chars(patch, opts.max_patch_chars);
        // Split on '\n' only: '\r' and trailing blank lines are patch content.
        if !kept.is_empty() {
            lines.extend(kept.split('\n').map(|line| format!("    {}", line)));
        }
        if let Some(total) = total {
            lines.push(format!(
                "    (patch truncated to {} chars of {})",
                opts.max_patch_chars, total
            ));
        }
    }

    let mut out = lines.join("\n");
    out.push('\n');

    if let Some(diff) = diff {
        out.push_str("\nFull diff:\n");
        let (kept, total) = truncate_chars(diff, opts.max_diff_chars);
        if let Some(total) = total {
            out.push_str(&truncation_notice(opts.max_diff_chars, total));
            out.push('\n');
        }
        out.push_str(kept);
        if !kept.ends_with('\n') {
            out.push('\n');
        }
    }
    out
}

/// Fresh per-request tool registry. Holds no state beyond its client.
pub struct ToolSet {
    client: GitHubClient,
    web_host: String,
}

impl ToolSet {
    pub fn new(cfg: &Config) -> Result<Self, ToolError> {
        Ok(Self {
            client: GitHubClient::new(cfg)?,
            web_host: cfg.web_host.clone(),
        })
    }

    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        tool_descriptors()
    }

    /// Run a tool by name. `None` means no tool has that name.
    pub async fn call(&self, name: &str, args: Value) -> Option<Result<String, ToolError>> {
        debug!("tools/call name={}", name);
        let out = match name {
            LIST_REPOS => self.list_repos(args).await,
            LIST_PULL_REQUESTS => self.list_pull_requests(args).await,
            GET_PULL_REQUEST_DIFF => self.get_pull_request_diff(args).await,
            SUMMARIZE_PULL_REQUEST => self.summarize_pull_request(args).await,
            _ => return None,
        };
        Some(out)
    }

    pub async fn list_repos(&self, args: Value) -> Result<String, ToolError> {
        let input: ListReposInput = parse_args(args)?;
        let per_page = enforce_range("per_page", input.per_page, 100, 1, 100)?;
        let path = format!(
            "/user/repos?per_page={}&visibility={}",
            per_page,
            input.visibility.as_str()
        );
        let repos: Vec<RepoItem> = self.client.get_json(&path).await?;
        if repos.is_empty() {
            return Ok("(no repos)".into());
        }
        Ok(repos
            .iter()
            .map(|r| {
                let vis = if r.private { "private" } else { "public" };
                format!("{} ({})", r.full_name, vis)
            })
            .collect::<Vec<_>>()
            .join("\n"))
    }

    pub async fn list_pull_requests(&self, args: Value) -> Result<String, ToolError> {
        let input: ListPullRequestsInput = parse_args(args)?;
        require_non_empty("owner", &input.owner)?;
        require_non_empty("repo", &input.repo)?;
        let per_page = enforce_range("per_page", input.per_page, 30, 1, 100)?;
        let path = format!(
            "/repos/{}/{}/pulls?state={}&per_page={}",
            encode_path_segment(&input.owner),
            encode_path_segment(&input.repo),
            input.state.as_str(),
            per_page
        );
        let pulls: Vec<PullItem> = self.client.get_json(&path).await?;
        if pulls.is_empty() {
            return Ok("(no PRs)".into());
        }
        Ok(pulls
            .iter()
            .map(|p| {
                let author = p.user.as_ref().map(|u| u.login.as_str()).unwrap_or("unknown");
                format!("#{} {} — {} — {}", p.number, p.title, author, p.html_url)
            })
            .collect::<Vec<_>>()
            .join("\n"))
    }

    pub async fn get_pull_request_diff(&self, args: Value) -> Result<String, ToolError> {
        let input: GetPullRequestDiffInput = parse_args(args)?;
        require_url("pr_url", &input.pr_url)?;
        let max_diff_chars =
            enforce_range("max_diff_chars", input.max_diff_chars, DEFAULT_DIFF_CHARS, 0, MAX_DIFF_CHARS)?;
        let pr = self.parse_pr(&input.pr_url)?;
        let diff = self.fetch_diff(&pr).await?;
        Ok(render_diff(&input.pr_url, &diff, max_diff_chars as usize))
    }

    pub async fn summarize_pull_request(&self, args: Value) -> Result<String, ToolError> {
        let input: SummarizePullRequestInput = parse_args(args)?;
        require_url("pr_url", &input.pr_url)?;
        let max_files = enforce_range("max_files", input.max_files, 50, 1, 300)?;
        let max_patch_chars =
            enforce_range("max_patch_chars", input.max_patch_chars, 2000, 0, MAX_PATCH_CHARS)?;
        let max_diff_chars =
            enforce_range("max_diff_chars", input.max_diff_chars, DEFAULT_DIFF_CHARS, 0, MAX_DIFF_CHARS)?;
        let opts = SummaryOptions {
            include_patches: input.include_patches.unwrap_or(true),
            max_patch_chars: max_patch_chars as usize,
            max_diff_chars: max_diff_chars as usize,
        };

        let pr = self.parse_pr(&input.pr_url)?;
        let detail: PullRequestDetail = self.client.get_json(&pr.api_path()).await?;
        let files = collect_pr_files(
            &self.client,
            &pr,
            max_files as usize,
            Some(detail.changed_files as usize),
        )
        .await?;
        let diff = if input.include_diff.unwrap_or(false) {
            Some(self.fetch_diff(&pr).await?)
        } else {
            None
        };

        let material = render_summary_material(&input.pr_url, &detail, &files, diff.as_deref(), opts);
        Ok(format!("{}\n\n{}", SUMMARY_INSTRUCTION, material))
    }

    fn parse_pr(&self, pr_url: &str) -> Result<PullRequestRef, ToolError> {
        parse_pr_url(pr_url, &self.web_host)
    }

    async fn fetch_diff(&self, pr: &PullRequestRef) -> Result<String, ToolError> {
        self.client.get_text(&pr.api_path(), ACCEPT_DIFF).await
    }
}

//! GitHub API helpers for posting coverage comments on pull requests and
//! commits.

use serde::Deserialize;

use crate::error::{ReporterError, Result};
use crate::options::{Options, DEFAULT_SERVER_URL};

pub const COMMENT_MARKER: &str = "<!-- lcov-reporter -->";

const DEFAULT_API_URL: &str = "https://api.github.com";

/// Where the comment goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    PullRequest(u64),
    Commit(String),
}

/// Resolved GitHub Actions context, read once from the environment.
#[derive(Debug)]
pub struct Context {
    token: String,
    repo: String,
    api_url: String,
    pub target: Target,
    pub options: Options,
}

#[derive(Deserialize)]
struct GitRef {
    sha: String,
    #[serde(rename = "ref")]
    name: String,
}

#[derive(Deserialize)]
struct PullRequest {
    number: u64,
    head: GitRef,
    base: GitRef,
}

#[derive(Deserialize)]
struct PullRequestEvent {
    pull_request: PullRequest,
}

#[derive(Deserialize)]
struct PushEvent {
    after: String,
    #[serde(rename = "ref")]
    name: String,
}

/// Inputs for [`Context::from_parts`], as read from the environment.
pub struct Environment {
    pub token: String,
    pub repository: String,
    pub event_name: String,
    pub event_payload: String,
    pub workspace: Option<String>,
    pub server_url: Option<String>,
    pub api_url: Option<String>,
}

fn require_env(name: &'static str) -> Result<String> {
    std::env::var(name).map_err(|_| ReporterError::MissingEnv(name))
}

impl Context {
    /// Build a context from the standard GitHub Actions environment
    /// (`GITHUB_TOKEN`, `GITHUB_REPOSITORY`, `GITHUB_EVENT_NAME`,
    /// `GITHUB_EVENT_PATH`, `GITHUB_WORKSPACE`). `token` overrides
    /// `GITHUB_TOKEN` when given.
    pub fn from_env(token: Option<String>) -> Result<Self> {
        let token = match token {
            Some(t) => t,
            None => require_env("GITHUB_TOKEN")?,
        };
        let event_path = require_env("GITHUB_EVENT_PATH")?;
        let event_payload =
            std::fs::read_to_string(&event_path).map_err(|source| ReporterError::Io {
                path: event_path.into(),
                source,
            })?;

        Self::from_parts(Environment {
            token,
            repository: require_env("GITHUB_REPOSITORY")?,
            event_name: require_env("GITHUB_EVENT_NAME")?,
            event_payload,
            workspace: std::env::var("GITHUB_WORKSPACE").ok(),
            server_url: std::env::var("GITHUB_SERVER_URL").ok(),
            api_url: std::env::var("GITHUB_API_URL").ok(),
        })
    }

    /// Build a context from already-collected values.
    pub fn from_parts(env: Environment) -> Result<Self> {
        let mut options = Options {
            repository: env.repository.clone(),
            prefix: env
                .workspace
                .map(|w| format!("{}/", w.trim_end_matches('/')))
                .unwrap_or_default(),
            server_url: env
                .server_url
                .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string()),
            ..Default::default()
        };

        let target = match env.event_name.as_str() {
            "pull_request" | "pull_request_target" => {
                let event: PullRequestEvent = serde_json::from_str(&env.event_payload)?;
                let pr = event.pull_request;
                options.commit = pr.head.sha;
                options.head = Some(pr.head.name);
                options.base = Some(pr.base.name);
                Target::PullRequest(pr.number)
            }
            "push" => {
                let event: PushEvent = serde_json::from_str(&env.event_payload)?;
                options.commit = event.after.clone();
                options.head = Some(event.name);
                Target::Commit(event.after)
            }
            other => return Err(ReporterError::UnsupportedEvent(other.to_string())),
        };

        Ok(Self {
            token: env.token,
            repo: env.repository,
            api_url: env
                .api_url
                .unwrap_or_else(|| DEFAULT_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            target,
            options,
        })
    }

    fn request(&self, method: &str, url: &str) -> ureq::Request {
        ureq::request(method, url)
            .set("Authorization", &format!("Bearer {}", self.token))
            .set("Accept", "application/vnd.github+json")
            .set("User-Agent", "lcov-reporter")
            .set("X-GitHub-Api-Version", "2022-11-28")
    }

    /// Find the most recent earlier comment on a PR carrying our marker.
    pub fn find_previous_comment(&self, pr_number: u64) -> Result<Option<Comment>> {
        let mut found = None;
        let mut page = 1u32;
        loop {
            let url = format!(
                "{}/repos/{}/issues/{}/comments?per_page=100&page={}",
                self.api_url, self.repo, pr_number, page
            );
            let resp = self.request("GET", &url).call().map_err(api_error)?;
            let comments: Vec<Comment> = resp
                .into_json()
                .map_err(|e| ReporterError::Transport(e.to_string()))?;
            if comments.is_empty() {
                break;
            }
            if let Some(c) = latest_marked(&comments) {
                found = Some(c.clone());
            }
            page += 1;
        }
        Ok(found)
    }

    /// Post `body` to the target. For pull requests with
    /// `overwrite_existing`, the previous marked comment is updated instead.
    /// Returns a short description of what was done.
    pub fn post_comment(&self, body: &str, overwrite_existing: bool) -> Result<String> {
        let body = with_marker(body);

        match &self.target {
            Target::PullRequest(number) => {
                let previous = if overwrite_existing {
                    self.find_previous_comment(*number)?
                } else {
                    None
                };
                match previous {
                    Some(c) if c.body.as_deref() == Some(body.as_str()) => Ok(format!(
                        "Comment {} on {}/pull/{} is already up to date",
                        c.id, self.repo, number
                    )),
                    Some(c) => {
                        let url = format!(
                            "{}/repos/{}/issues/comments/{}",
                            self.api_url, self.repo, c.id
                        );
                        self.send("PATCH", &url, &body)?;
                        Ok(format!(
                            "Updated comment {} on {}/pull/{}",
                            c.id, self.repo, number
                        ))
                    }
                    None => {
                        let url = format!(
                            "{}/repos/{}/issues/{}/comments",
                            self.api_url, self.repo, number
                        );
                        self.send("POST", &url, &body)?;
                        Ok(format!("Comment posted to {}/pull/{}", self.repo, number))
                    }
                }
            }
            Target::Commit(sha) => {
                let url = format!(
                    "{}/repos/{}/commits/{}/comments",
                    self.api_url, self.repo, sha
                );
                self.send("POST", &url, &body)?;
                Ok(format!("Comment posted to {}@{}", self.repo, sha))
            }
        }
    }

    fn send(&self, method: &str, url: &str, body: &str) -> Result<()> {
        self.request(method, url)
            .send_json(serde_json::json!({ "body": body }))
            .map_err(api_error)?;
        Ok(())
    }
}

fn api_error(e: ureq::Error) -> ReporterError {
    match e {
        ureq::Error::Status(status, resp) => ReporterError::Api {
            status,
            body: resp.into_string().unwrap_or_default(),
        },
        other => ReporterError::Transport(other.to_string()),
    }
}

/// An issue or commit comment, as returned by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct Comment {
    pub id: u64,
    pub body: Option<String>,
}

/// The last comment in `comments` (oldest first, as the API lists them)
/// whose body carries the marker.
pub fn latest_marked(comments: &[Comment]) -> Option<&Comment> {
    comments.iter().rev().find(|c| {
        c.body
            .as_deref()
            .is_some_and(|body| body.contains(COMMENT_MARKER))
    })
}

/// Prefix the body with the hidden marker used to find it again.
#[must_use]
pub fn with_marker(body: &str) -> String {
    format!("{COMMENT_MARKER}\n{body}")
}

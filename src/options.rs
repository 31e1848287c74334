//! Invocation options, built once at the boundary (CLI flags or the CI
//! context) and passed by reference into the diff engine and renderer.

pub const DEFAULT_SERVER_URL: &str = "https://github.com";

/// Repository and ref information for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// `owner/name`.
    pub repository: String,
    /// Build-root prefix stripped from report paths.
    pub prefix: String,
    /// Commit the current report was generated for.
    pub commit: String,
    pub head: Option<String>,
    pub base: Option<String>,
    pub server_url: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            repository: String::new(),
            prefix: String::new(),
            commit: String::new(),
            head: None,
            base: None,
            server_url: DEFAULT_SERVER_URL.to_string(),
        }
    }
}

impl Options {
    /// `{server}/{repository}/blob/{commit}`, when both are known.
    #[must_use]
    pub fn source_link_base(&self) -> Option<String> {
        if self.repository.is_empty() || self.commit.is_empty() {
            return None;
        }
        Some(format!(
            "{}/{}/blob/{}",
            self.server_url.trim_end_matches('/'),
            self.repository,
            self.commit
        ))
    }
}

/// Coverage grade of a single percentage against the configured thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grade {
    Good,
    Acceptable,
    Poor,
}

/// Percentage cut-points for the status marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Below this a file is flagged as poorly covered.
    pub minimum: f64,
    /// At or above this a file is considered well covered.
    pub target: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            minimum: 50.0,
            target: 80.0,
        }
    }
}

impl Thresholds {
    #[must_use]
    pub fn grade(&self, percent: f64) -> Grade {
        if percent >= self.target {
            Grade::Good
        } else if percent >= self.minimum {
            Grade::Acceptable
        } else {
            Grade::Poor
        }
    }
}

/// Presentation options for the renderer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderOptions {
    /// Add function/branch columns and uncovered lines to the file table.
    pub show_details: bool,
    /// Base URL that file paths are appended to when linking to source.
    pub repository_link_base: Option<String>,
    pub thresholds: Thresholds,
    pub head: Option<String>,
    pub base: Option<String>,
    pub commit: Option<String>,
}

impl RenderOptions {
    pub fn from_options(options: &Options) -> Self {
        Self {
            show_details: false,
            repository_link_base: options.source_link_base(),
            thresholds: Thresholds::default(),
            head: options.head.clone(),
            base: options.base.clone(),
            commit: Some(options.commit.clone()).filter(|c| !c.is_empty()),
        }
    }
}

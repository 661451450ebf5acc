//! Source links for resolved frames.
//!
//! Paths are classified by an ordered rule table; the first matching
//! pattern wins. Unmatched paths get no link and render as plain text.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::utils::config::ISSUE_TRACKER_URL;

/// One classification rule
#[derive(Debug, Clone)]
pub struct LinkRule {
    pub name: &'static str,
    pattern: Regex,
    /// Expanded with the pattern's named captures (`${commit}`, `${path}`)
    template: String,
}

impl LinkRule {
    pub fn new(
        name: &'static str,
        pattern: &str,
        template: impl Into<String>,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            name,
            pattern: Regex::new(pattern)?,
            template: template.into(),
        })
    }

    fn apply(&self, path: &str, line: u32) -> Option<String> {
        let captures = self.pattern.captures(path)?;
        let mut url = String::new();
        captures.expand(&self.template, &mut url);
        Some(format!("{}#L{}", url, line))
    }
}

static DEFAULT_RULES: Lazy<Vec<LinkRule>> = Lazy::new(|| {
    [
        // Standard library sources embed the compiler commit
        (
            "rust-std",
            r"/rustc/(?P<commit>[0-9a-f]+)/library/(?P<path>.+)",
            "https://github.com/rust-lang/rust/blob/${commit}/library/${path}",
        ),
        (
            "deno",
            r"/gh/deno/(?P<path>.+)",
            "https://github.com/denoland/deno/blob/main/${path}",
        ),
        (
            "panic",
            r"/gh/panic/(?P<path>.+)",
            "https://github.com/denoland/panic/blob/main/${path}",
        ),
    ]
    .into_iter()
    .map(|(name, pattern, template)| {
        LinkRule::new(name, pattern, template).expect("built-in link pattern is valid")
    })
    .collect()
});

/// Derives source-browsing and issue URLs from resolved frames
#[derive(Debug, Clone)]
pub struct LinkResolver {
    rules: Vec<LinkRule>,
    pub(crate) issue_tracker: String,
}

impl Default for LinkResolver {
    fn default() -> Self {
        Self {
            rules: DEFAULT_RULES.clone(),
            issue_tracker: ISSUE_TRACKER_URL.to_string(),
        }
    }
}

impl LinkResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a custom rule table
    pub fn with_rules(rules: Vec<LinkRule>) -> Self {
        Self {
            rules,
            ..Self::default()
        }
    }

    /// Append a rule; it is tried after every existing one
    pub fn push_rule(&mut self, rule: LinkRule) {
        self.rules.push(rule);
    }

    pub fn with_issue_tracker(mut self, url: impl Into<String>) -> Self {
        self.issue_tracker = url.into();
        self
    }

    /// Link for a file path and line, if any rule matches
    ///
    /// **Public** - used by every renderer
    pub fn link_for(&self, file_path: &str, line: u32) -> Option<String> {
        let path = file_path.replace('\\', "/");
        let (rule, url) = self
            .rules
            .iter()
            .find_map(|rule| rule.apply(&path, line).map(|url| (rule, url)))?;

        debug!("{} matched link rule {}", file_path, rule.name);
        Some(url)
    }
}

//! Dev-server proxy rule
//!
//! Requests under `prefix` are forwarded to `target`, optionally with the
//! prefix stripped. The console addresses every backend call through this
//! prefix, so the same rule resolves endpoints at runtime.

use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyRule {
    pub prefix: String,
    pub target: Url,
    pub strip_prefix: bool,
}

impl ProxyRule {
    pub fn new(prefix: impl Into<String>, target: Url) -> Self {
        Self {
            prefix: prefix.into(),
            target,
            strip_prefix: true,
        }
    }

    /// Whether `path` falls under the prefix. Matching stops at segment
    /// boundaries: `/api` covers `/api/x` and `/api?q` but not `/apix`.
    pub fn matches(&self, path: &str) -> bool {
        let prefix = self.prefix.trim_end_matches('/');
        match path.strip_prefix(prefix) {
            Some(rest) => rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'),
            None => false,
        }
    }

    /// Target URL for `path`, or `None` when the rule does not apply.
    pub fn rewrite(&self, path: &str) -> Option<String> {
        if !self.matches(path) {
            return None;
        }

        let forwarded = if self.strip_prefix {
            &path[self.prefix.trim_end_matches('/').len()..]
        } else {
            path
        };

        let base = self.target.as_str().trim_end_matches('/');
        if forwarded.starts_with('/') {
            Some(format!("{base}{forwarded}"))
        } else {
            Some(format!("{base}/{forwarded}"))
        }
    }
}

impl Default for ProxyRule {
    fn default() -> Self {
        Self {
            prefix: "/api".to_string(),
            target: Url::parse("http://localhost:3120/").expect("valid default proxy target"),
            strip_prefix: true,
        }
    }
}

//! Path rules that map changed files to services.

use regex::Regex;

/// A single rule matched against repository-relative paths.
#[derive(Debug, Clone)]
pub enum PathPattern {
    /// Matches any path starting with the prefix (e.g. `main_app/`).
    Prefix(String),
    /// Matches any path the expression finds a match in.
    Regex(Regex),
}

impl PathPattern {
    pub fn prefix(prefix: impl Into<String>) -> Self {
        let prefix: String = prefix.into();
        Self::Prefix(prefix.trim_start_matches("./").to_string())
    }

    pub fn regex(expr: &str) -> Result<Self, regex::Error> {
        Regex::new(expr).map(Self::Regex)
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathPattern::Prefix(prefix) => path.starts_with(prefix.as_str()),
            PathPattern::Regex(re) => re.is_match(path),
        }
    }

    /// Source text of the rule, for logs and status output.
    pub fn as_str(&self) -> &str {
        match self {
            PathPattern::Prefix(prefix) => prefix,
            PathPattern::Regex(re) => re.as_str(),
        }
    }
}

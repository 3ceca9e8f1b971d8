//! Origin allow-listing: a small tagged variant plus free functions,
//! rather than a trait object.

use crate::error::Error;
use regex::Regex;

/// One entry of an origin allow-list: either an exact, case-sensitive string
/// match or an anchored regular expression.
#[derive(Debug, Clone)]
pub enum OriginMatcher {
    Exact(String),
    Pattern(Regex),
}

impl OriginMatcher {
    pub fn exact(origin: impl Into<String>) -> Self {
        OriginMatcher::Exact(origin.into())
    }

    /// Compiles `pattern` as an anchored regex (`^(?:pattern)$`), so a
    /// partial match against the middle of an origin never passes.
    pub fn pattern(pattern: &str) -> Result<Self, Error> {
        let anchored = format!("^(?:{})$", pattern);
        Regex::new(&anchored)
            .map(OriginMatcher::Pattern)
            .map_err(|e| Error::InvalidOriginPattern(pattern.to_string(), e))
    }

    pub fn matches(&self, origin: &str) -> bool {
        match self {
            OriginMatcher::Exact(expected) => expected == origin,
            OriginMatcher::Pattern(regex) => regex.is_match(origin),
        }
    }
}

/// Implements the "match one of" rule from §4.2: if the list is empty, or
/// the request carries no `Origin` header at all, the check is skipped
/// (allowed). Otherwise at least one matcher must match.
pub fn allowed(matchers: &[OriginMatcher], origin: Option<&str>) -> bool {
    if matchers.is_empty() {
        return true;
    }
    match origin {
        None => true,
        Some(origin) => matchers.iter().any(|m| m.matches(origin)),
    }
}

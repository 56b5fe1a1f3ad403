//! Path pattern matching.
//!
//! # Responsibilities
//! - Compile a route's regular expression once, at registration
//! - Match the decoded request path against the whole pattern
//! - Expose positional and named capture groups to handlers
//!
//! # Design Decisions
//! - Patterns are anchored at both ends: `/foo` never matches `/foobar`
//! - The query string is already stripped, so it never takes part in a match

use std::collections::HashMap;

use regex::Regex;

/// A compiled, fully anchored route pattern.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    source: String,
    regex: Regex,
}

impl RoutePattern {
    /// Compile `pattern` so that it must match an entire path.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{pattern})$"))?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// The pattern as registered, without the anchors.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Match the whole `path`, returning its capture groups.
    pub fn captures(&self, path: &str) -> Option<Captures> {
        let caps = self.regex.captures(path)?;
        let groups = caps
            .iter()
            .map(|group| group.map(|m| m.as_str().to_string()))
            .collect();
        let named = self
            .regex
            .capture_names()
            .flatten()
            .filter_map(|name| caps.name(name).map(|m| (name.to_string(), m.as_str().to_string())))
            .collect();
        Some(Captures { groups, named })
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }
}

/// Capture groups extracted from a matched path.
///
/// Group 0 is the whole path; groups that did not participate are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captures {
    groups: Vec<Option<String>>,
    named: HashMap<String, String>,
}

impl Captures {
    /// Positional group `index`, if it participated in the match.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.groups.get(index)?.as_deref()
    }

    /// Named group `name`, if it participated in the match.
    pub fn name(&self, name: &str) -> Option<&str> {
        self.named.get(name).map(String::as_str)
    }

    /// Number of groups, including group 0. Zero before a route matched.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

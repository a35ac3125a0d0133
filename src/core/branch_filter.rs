//! Branch filter rules and matching
//!
//! A branch filter is an ordered list of `+:pattern` / `-:pattern` rules. Every rule
//! whose pattern matches the ref overrides the decision of the rules before it, and a
//! ref matched by no rule is rejected.

use crate::core::error::InvalidGlobPattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a matching rule admits or rejects the ref
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterSign {
    Include,
    Exclude,
}

/// A single branch filter rule as written in configuration
///
/// The pattern may still contain `%name%` tokens; it is compiled only after
/// resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchFilterRule {
    pub sign: FilterSign,
    pub pattern: String,
}

impl BranchFilterRule {
    pub fn include(pattern: impl Into<String>) -> Self {
        Self {
            sign: FilterSign::Include,
            pattern: pattern.into(),
        }
    }

    pub fn exclude(pattern: impl Into<String>) -> Self {
        Self {
            sign: FilterSign::Exclude,
            pattern: pattern.into(),
        }
    }

    /// Parse one line of a filter block; blank lines yield `None`
    ///
    /// A line without a `+:` or `-:` prefix is an include rule.
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let rule = if let Some(pattern) = line.strip_prefix("+:") {
            Self::include(pattern.trim())
        } else if let Some(pattern) = line.strip_prefix("-:") {
            Self::exclude(pattern.trim())
        } else {
            Self::include(line)
        };

        Some(rule)
    }

    /// Compile this rule into a matchable form
    pub fn compile(&self) -> Result<CompiledRule, InvalidGlobPattern> {
        Ok(CompiledRule {
            sign: self.sign,
            pattern: GlobPattern::new(&self.pattern)?,
        })
    }
}

impl fmt::Display for BranchFilterRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sign {
            FilterSign::Include => write!(f, "+:{}", self.pattern),
            FilterSign::Exclude => write!(f, "-:{}", self.pattern),
        }
    }
}

/// Parse a multi-line filter block into rules, keeping declared order
pub fn parse_rules(text: &str) -> Vec<BranchFilterRule> {
    text.lines().filter_map(BranchFilterRule::parse_line).collect()
}

/// Glob over ref paths where `*` never crosses a `/`
#[derive(Debug, Clone)]
pub struct GlobPattern {
    source: String,
    regex: Regex,
}

impl GlobPattern {
    pub fn new(pattern: &str) -> Result<Self, InvalidGlobPattern> {
        let invalid = |reason: &str| InvalidGlobPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        if pattern.is_empty() {
            return Err(invalid("pattern is empty"));
        }
        if pattern.contains("**") {
            return Err(invalid("'**' is not supported, '*' matches within one segment"));
        }
        if pattern.chars().any(char::is_whitespace) {
            return Err(invalid("pattern contains whitespace"));
        }

        let body = pattern
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join("[^/]*");

        let regex = Regex::new(&format!("^{}$", body)).map_err(|e| invalid(&e.to_string()))?;

        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    pub fn matches(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl PartialEq for GlobPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for GlobPattern {}

/// A rule with its pattern compiled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledRule {
    pub sign: FilterSign,
    pub pattern: GlobPattern,
}

/// Evaluate `rules` in order against `ref_name`; last matching rule wins
pub fn matches(ref_name: &str, rules: &[CompiledRule]) -> bool {
    rules.iter().fold(false, |decision, rule| {
        if rule.pattern.matches(ref_name) {
            rule.sign == FilterSign::Include
        } else {
            decision
        }
    })
}

/// An ordered, compiled branch filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchFilter {
    rules: Vec<CompiledRule>,
}

impl BranchFilter {
    pub fn new(rules: Vec<CompiledRule>) -> Self {
        Self { rules }
    }

    /// Compile already-resolved rules, failing on the first malformed pattern
    pub fn compile(rules: &[BranchFilterRule]) -> Result<Self, InvalidGlobPattern> {
        let rules = rules
            .iter()
            .map(BranchFilterRule::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    pub fn matches(&self, ref_name: &str) -> bool {
        matches(ref_name, &self.rules)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }
}

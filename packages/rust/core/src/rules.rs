//! Quick rules: an ordered list of (patterns → canned answer).
//!
//! Rules are tried in list order and the first rule with any matching
//! pattern wins, so position is priority.

use std::collections::HashSet;

use regex::{Regex, RegexBuilder};

use huddle_shared::{HuddleError, Result};

/// Compile a knowledge pattern as a case-insensitive regex.
pub(crate) fn compile_pattern(kind: &str, pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| HuddleError::knowledge(format!("invalid {kind} '{pattern}': {e}")))
}

/// One curated answer and the patterns that trigger it.
#[derive(Debug, Clone)]
pub struct Rule {
    id: String,
    patterns: Vec<Regex>,
    answer: String,
}

impl Rule {
    pub fn new(id: impl Into<String>, patterns: &[String], answer: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let answer = answer.into();

        if id.trim().is_empty() {
            return Err(HuddleError::knowledge("rule id must not be empty"));
        }
        if patterns.is_empty() {
            return Err(HuddleError::knowledge(format!("rule '{id}' has no patterns")));
        }
        if answer.trim().is_empty() {
            return Err(HuddleError::knowledge(format!("rule '{id}' has an empty answer")));
        }

        let patterns = patterns
            .iter()
            .map(|p| compile_pattern("rule pattern", p))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            id,
            patterns,
            answer,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// Whether any pattern matches the lowercased message.
    pub fn matches(&self, lower: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(lower))
    }
}

/// Holds rules in priority order.
#[derive(Debug, Clone, Default)]
pub struct RuleMatcher {
    rules: Vec<Rule>,
}

impl RuleMatcher {
    /// Build a matcher, rejecting duplicate rule ids.
    pub fn new(rules: Vec<Rule>) -> Result<Self> {
        let mut seen = HashSet::new();
        for rule in &rules {
            if !seen.insert(rule.id.as_str()) {
                return Err(HuddleError::knowledge(format!(
                    "duplicate rule id '{}'",
                    rule.id
                )));
            }
        }
        Ok(Self { rules })
    }

    /// First rule matching the lowercased message, if any.
    pub fn find(&self, lower: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.matches(lower))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

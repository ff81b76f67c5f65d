//! Knowledge: vocabularies, quick rules and canned replies.
//!
//! Everything the pipeline matches against or answers with lives here, loaded
//! once at startup and shared read-only. The bundled NFL knowledge ships in
//! `knowledge/nfl.toml`; a user file with the same schema replaces it.

use std::path::Path;

use serde::{Deserialize, Serialize};

use huddle_shared::{HuddleError, Result};

use crate::rules::{Rule, RuleMatcher};
use crate::screening::{GreetingDetector, SafetyFilter};
use crate::synthesis::DEFAULT_MORE_DETAILS;
use crate::topic::TopicClassifier;

/// Bundled knowledge document.
const BUILTIN_KNOWLEDGE: &str = include_str!("../knowledge/nfl.toml");

// ---------------------------------------------------------------------------
// File schema
// ---------------------------------------------------------------------------

/// The knowledge TOML document, as written on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeFile {
    #[serde(default)]
    pub greetings: Vec<String>,
    #[serde(default)]
    pub abuse_patterns: Vec<String>,
    #[serde(default)]
    pub domain_keywords: Vec<String>,
    pub replies: Replies,
    #[serde(default)]
    pub rules: Vec<RuleEntry>,
}

/// `[[rules]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleEntry {
    pub id: String,
    pub patterns: Vec<String>,
    pub answer: String,
}

/// `[replies]` section: every canned text the responder can produce.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Replies {
    pub empty_prompt: String,
    pub safety: String,
    pub greeting: Vec<String>,
    pub domain_refusal: String,
    pub domain_fallback: Vec<String>,
    pub generic_fallback: Vec<String>,
    /// Label placed before the source link of a search answer.
    #[serde(default = "default_more_details")]
    pub more_details: String,
}

fn default_more_details() -> String {
    DEFAULT_MORE_DETAILS.into()
}

impl Replies {
    fn validate(&self) -> Result<()> {
        let singles = [
            ("empty_prompt", &self.empty_prompt),
            ("safety", &self.safety),
            ("domain_refusal", &self.domain_refusal),
        ];
        for (name, text) in singles {
            if text.trim().is_empty() {
                return Err(HuddleError::knowledge(format!("reply '{name}' is empty")));
            }
        }

        let pools = [
            ("greeting", &self.greeting),
            ("domain_fallback", &self.domain_fallback),
            ("generic_fallback", &self.generic_fallback),
        ];
        for (name, pool) in pools {
            if pool.iter().all(|r| r.trim().is_empty()) {
                return Err(HuddleError::knowledge(format!(
                    "reply pool '{name}' has no non-empty replies"
                )));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Compiled knowledge
// ---------------------------------------------------------------------------

/// Validated, compiled knowledge ready for matching.
#[derive(Debug, Clone)]
pub struct Knowledge {
    pub safety: SafetyFilter,
    pub greetings: GreetingDetector,
    pub topic: TopicClassifier,
    pub rules: RuleMatcher,
    pub replies: Replies,
}

impl Knowledge {
    /// The bundled NFL knowledge.
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_KNOWLEDGE)
    }

    /// Load a knowledge file from disk.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| HuddleError::io(path, e))?;
        Self::from_toml_str(&content).map_err(|e| match e {
            HuddleError::Knowledge { message } => {
                HuddleError::knowledge(format!("{}: {message}", path.display()))
            }
            other => other,
        })
    }

    /// Bundled knowledge, or the file at `path` when one is configured.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                tracing::info!(?path, "loading knowledge file");
                Self::load_from(path)
            }
            None => Self::builtin(),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: KnowledgeFile = toml::from_str(content)
            .map_err(|e| HuddleError::knowledge(format!("failed to parse knowledge: {e}")))?;
        Self::compile(file)
    }

    /// Validate and compile a parsed document.
    pub fn compile(file: KnowledgeFile) -> Result<Self> {
        file.replies.validate()?;

        let rules = file
            .rules
            .iter()
            .map(|r| Rule::new(&r.id, &r.patterns, &r.answer))
            .collect::<Result<Vec<_>>>()?;

        let knowledge = Self {
            safety: SafetyFilter::new(&file.abuse_patterns)?,
            greetings: GreetingDetector::new(&file.greetings),
            topic: TopicClassifier::new(&file.domain_keywords),
            rules: RuleMatcher::new(rules)?,
            replies: drop_blank_pool_entries(file.replies),
        };

        tracing::debug!(
            rules = knowledge.rules.len(),
            greetings = knowledge.greetings.len(),
            abuse_patterns = knowledge.safety.len(),
            domain_keywords = knowledge.topic.len(),
            "knowledge compiled"
        );

        Ok(knowledge)
    }
}

fn drop_blank_pool_entries(mut replies: Replies) -> Replies {
    for pool in [
        &mut replies.greeting,
        &mut replies.domain_fallback,
        &mut replies.generic_fallback,
    ] {
        pool.retain(|r| !r.trim().is_empty());
    }
    replies
}

//! Domain gating: does a message belong to the supported topic?

use huddle_shared::Classification;

use crate::screening::lowercase_keywords;

/// Classifies messages by substring membership in the domain vocabulary.
#[derive(Debug, Clone)]
pub struct TopicClassifier {
    keywords: Vec<String>,
}

impl TopicClassifier {
    pub fn new(keywords: &[String]) -> Self {
        Self {
            keywords: lowercase_keywords(keywords),
        }
    }

    pub fn classify(&self, lower: &str) -> Classification {
        if self.keywords.iter().any(|k| lower.contains(k.as_str())) {
            Classification::SupportedDomain
        } else {
            Classification::OffDomain
        }
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}

//! First-pass screening: abusive language and social greetings.
//!
//! Both checks run on the lowercased message before any topic logic.

use regex::Regex;

use huddle_shared::Result;

use crate::rules::compile_pattern;

/// Detects abusive input by regular-expression membership.
#[derive(Debug, Clone)]
pub struct SafetyFilter {
    patterns: Vec<Regex>,
}

impl SafetyFilter {
    /// Compile the abuse patterns (case-insensitive). Blank patterns are
    /// skipped; they would match every message.
    pub fn new(patterns: &[String]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .filter(|p| !p.trim().is_empty())
            .map(|p| compile_pattern("abuse pattern", p))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn is_abusive(&self, lower: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(lower))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Detects greetings by substring membership.
#[derive(Debug, Clone)]
pub struct GreetingDetector {
    keywords: Vec<String>,
}

impl GreetingDetector {
    pub fn new(keywords: &[String]) -> Self {
        Self {
            keywords: lowercase_keywords(keywords),
        }
    }

    pub fn is_greeting(&self, lower: &str) -> bool {
        self.keywords.iter().any(|k| lower.contains(k.as_str()))
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}

/// Lowercase and drop blank keywords; a blank keyword would match everything.
pub(crate) fn lowercase_keywords(keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn safety_matches_anywhere_in_text() {
        let filter = SafetyFilter::new(&strings(&["tonto", "no sirves"])).unwrap();
        assert!(filter.is_abusive("tonto"));
        assert!(filter.is_abusive("eres un tonto, explícame el touchdown"));
        assert!(filter.is_abusive("la verdad no sirves para nada"));
        assert!(!filter.is_abusive("¿qué es un touchdown?"));
    }

    #[test]
    fn safety_patterns_are_case_insensitive() {
        let filter = SafetyFilter::new(&strings(&["Imbécil"])).unwrap();
        assert!(filter.is_abusive("imbécil"));
        assert!(filter.is_abusive("IMBÉCIL"));
    }

    #[test]
    fn invalid_abuse_pattern_is_rejected() {
        let err = SafetyFilter::new(&strings(&["(unclosed"])).unwrap_err();
        assert!(err.to_string().contains("abuse pattern"));
    }

    #[test]
    fn blank_abuse_patterns_are_skipped() {
        let filter = SafetyFilter::new(&strings(&["", "   ", "tonto"])).unwrap();
        assert_eq!(filter.len(), 1);
        assert!(!filter.is_abusive("¿qué es un touchdown?"));
        assert!(filter.is_abusive("tonto"));
    }

    #[test]
    fn greeting_is_substring_membership() {
        let detector = GreetingDetector::new(&strings(&["hola", "Buenas Tardes"]));
        assert!(detector.is_greeting("hola"));
        assert!(detector.is_greeting("holaaa amigo"));
        assert!(detector.is_greeting("muy buenas tardes"));
        assert!(!detector.is_greeting("¿qué es un safety?"));
    }

    #[test]
    fn blank_keywords_are_ignored() {
        let detector = GreetingDetector::new(&strings(&["", "  ", "hey"]));
        assert_eq!(detector.len(), 1);
        assert!(!detector.is_greeting("touchdown"));
    }
}

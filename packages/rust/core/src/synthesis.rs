//! Snippet synthesis: build one bounded-length answer from search fragments.
//!
//! Lengths are measured in `char`s. The target window is
//! [`MIN_LEN`, `MAX_LEN`]; it is a soft floor when the fragments are short.

use std::sync::LazyLock;

use regex::Regex;

use huddle_shared::SearchFragment;

/// Only the top results are considered.
pub const MAX_FRAGMENTS: usize = 3;

/// Soft lower bound for the answer length.
pub const MIN_LEN: usize = 200;

/// Hard upper bound for the answer length.
pub const MAX_LEN: usize = 400;

/// The source link is only appended to answers shorter than this.
pub const LINK_ROOM: usize = 360;

/// Default label placed before the source link.
pub const DEFAULT_MORE_DETAILS: &str = "Más detalles en:";

/// Combines fragments into a single answer.
#[derive(Debug, Clone)]
pub struct Synthesizer {
    more_details: String,
}

impl Default for Synthesizer {
    fn default() -> Self {
        Self::new(DEFAULT_MORE_DETAILS)
    }
}

impl Synthesizer {
    pub fn new(more_details: impl Into<String>) -> Self {
        Self {
            more_details: more_details.into(),
        }
    }

    /// Build the answer, or `None` when the fragments carry no usable text.
    pub fn synthesize(&self, fragments: &[SearchFragment]) -> Option<String> {
        let top = &fragments[..fragments.len().min(MAX_FRAGMENTS)];

        let cleaned = clean(&combine(top)?);
        if cleaned.is_empty() {
            return None;
        }

        let mut text = fit_length(&cleaned);

        if let Some(link) = primary_link(top) {
            if char_len(&text) < LINK_ROOM {
                let with_link = format!("{text} {} {link}", self.more_details);
                if char_len(&with_link) <= MAX_LEN {
                    text = with_link;
                }
            }
        }

        Some(text)
    }
}

/// Join snippets with a space, or titles with `". "` when no fragment has a
/// snippet.
fn combine(top: &[SearchFragment]) -> Option<String> {
    let snippets = non_blank(top.iter().map(|f| f.snippet.as_deref()));
    if !snippets.is_empty() {
        return Some(snippets.join(" "));
    }

    let titles = non_blank(top.iter().map(|f| f.title.as_deref()));
    if !titles.is_empty() {
        return Some(titles.join(". "));
    }

    None
}

fn non_blank<'a>(items: impl Iterator<Item = Option<&'a str>>) -> Vec<&'a str> {
    items
        .flatten()
        .filter(|s| !s.trim().is_empty())
        .collect()
}

/// Drop ellipsis runs, collapse whitespace, trim.
fn clean(text: &str) -> String {
    static ELLIPSIS_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\.{3,}").expect("valid regex"));
    static WHITESPACE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

    let without_ellipsis = ELLIPSIS_RE.replace_all(text, "");
    WHITESPACE_RE
        .replace_all(&without_ellipsis, " ")
        .trim()
        .to_string()
}

/// Bring cleaned text into the length window.
///
/// Over-long text is cut at `MAX_LEN`, then pulled back to the last sentence
/// terminator if that still leaves at least `MIN_LEN` chars. If the result is
/// under `MIN_LEN` while the input was not, the plain `MAX_LEN` cut is used.
pub fn fit_length(cleaned: &str) -> String {
    let total = char_len(cleaned);
    let mut text = cleaned.to_string();

    if total > MAX_LEN {
        text = take_chars(cleaned, MAX_LEN);

        let last_terminator = text
            .chars()
            .enumerate()
            .filter(|(_, c)| matches!(c, '.' | '!' | '?'))
            .map(|(i, _)| i)
            .last();

        if let Some(idx) = last_terminator.filter(|&i| i >= MIN_LEN) {
            text = take_chars(&text, idx + 1);
        }
    }

    if char_len(&text) < MIN_LEN && total >= MIN_LEN {
        text = take_chars(cleaned, MAX_LEN.min(total));
    }

    text
}

/// First fragment's link, or its display source when the link is missing.
fn primary_link(top: &[SearchFragment]) -> Option<&str> {
    let first = top.first()?;
    [first.link.as_deref(), first.source.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn take_chars(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

//! Input normalization: turn whatever the caller sent into a [`Message`].

use serde_json::Value;

/// One incoming message, in the three forms the pipeline needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    raw: String,
    text: String,
    lower: String,
}

impl Message {
    /// Normalize a piece of text: trim it and derive the lowercase form.
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let text = raw.trim().to_string();
        let lower = text.to_lowercase();
        Self { raw, text, lower }
    }

    /// Normalize an arbitrary JSON value from the chat endpoint.
    ///
    /// Strings pass through, numbers and booleans become their textual form,
    /// and anything else (absent, null, arrays, objects) is empty.
    pub fn from_value(value: Option<&Value>) -> Self {
        let raw = match value {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            Some(Value::Null | Value::Array(_) | Value::Object(_)) | None => String::new(),
        };
        Self::new(raw)
    }

    /// Exactly what the caller sent.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Trimmed, original-case text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Trimmed, lowercased text; all matching runs against this.
    pub fn lower(&self) -> &str {
        &self.lower
    }

    /// No usable text after normalization.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

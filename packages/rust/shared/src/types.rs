//! Core domain and wire types for Huddle.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// SearchFragment
// ---------------------------------------------------------------------------

/// One ranked result item from the web search provider.
///
/// Field names follow the provider's `organic_results` entries so the
/// adapter can deserialize them directly; unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFragment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// Display source (e.g. site name), used when `link` is missing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl SearchFragment {
    /// Fragment with only a snippet, handy for stubs.
    pub fn snippet(text: impl Into<String>) -> Self {
        Self {
            snippet: Some(text.into()),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Classification / Outcome / Reply
// ---------------------------------------------------------------------------

/// Whether a message belongs to the supported topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    SupportedDomain,
    OffDomain,
}

/// Terminal state reached by one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    EmptyPrompt,
    SafetyReply,
    GreetingReply,
    DomainRefusal,
    RuleReply { rule_id: String },
    SearchReply,
    DomainFallback,
    GenericFallback,
}

impl Outcome {
    /// Stable name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmptyPrompt => "empty_prompt",
            Self::SafetyReply => "safety_reply",
            Self::GreetingReply => "greeting_reply",
            Self::DomainRefusal => "domain_refusal",
            Self::RuleReply { .. } => "rule_reply",
            Self::SearchReply => "search_reply",
            Self::DomainFallback => "domain_fallback",
            Self::GenericFallback => "generic_fallback",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single reply produced for a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,
    pub outcome: Outcome,
}

impl Reply {
    pub fn new(text: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            text: text.into(),
            outcome,
        }
    }
}

// ---------------------------------------------------------------------------
// Chat endpoint wire types
// ---------------------------------------------------------------------------

/// One earlier turn of the conversation, as sent by the chat widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryTurn {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: String,
}

impl HistoryTurn {
    /// Read a turn from an arbitrary JSON value. Non-objects are dropped;
    /// non-string fields become empty.
    fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let text = |key: &str| {
            object
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Some(Self {
            role: text("role"),
            content: text("content"),
        })
    }
}

/// History is never read by the responder, so any shape is accepted:
/// null or a non-array is empty, malformed turns are skipped.
fn lenient_history<'de, D>(deserializer: D) -> std::result::Result<Vec<HistoryTurn>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items.iter().filter_map(HistoryTurn::from_value).collect(),
        _ => Vec::new(),
    })
}

/// Body of `POST /api/chat`.
///
/// `message` is kept as a raw JSON value: absent, null or non-string values
/// are tolerated and coerced during normalization. `history` never fails
/// the request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "lenient_history")]
    pub history: Vec<HistoryTurn>,
}

/// Response body of `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
}

impl From<Reply> for ChatResponse {
    fn from(reply: Reply) -> Self {
        Self { reply: reply.text }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_ignores_unknown_provider_fields() {
        let json = r#"{
            "position": 1,
            "title": "Touchdown - Wikipedia",
            "link": "https://es.wikipedia.org/wiki/Touchdown",
            "snippet": "Un touchdown vale seis puntos.",
            "displayed_link": "es.wikipedia.org"
        }"#;
        let fragment: SearchFragment = serde_json::from_str(json).expect("deserialize");
        assert_eq!(fragment.title.as_deref(), Some("Touchdown - Wikipedia"));
        assert_eq!(fragment.snippet.as_deref(), Some("Un touchdown vale seis puntos."));
        assert!(fragment.source.is_none());
    }

    #[test]
    fn outcome_serializes_with_kind_tag() {
        let outcome = Outcome::RuleReply {
            rule_id: "puntos".into(),
        };
        let json = serde_json::to_value(&outcome).expect("serialize");
        assert_eq!(json["kind"], "rule_reply");
        assert_eq!(json["rule_id"], "puntos");
        assert_eq!(outcome.to_string(), "rule_reply");

        let json = serde_json::to_value(Outcome::GenericFallback).expect("serialize");
        assert_eq!(json["kind"], "generic_fallback");
    }

    #[test]
    fn chat_request_tolerates_missing_fields() {
        let req: ChatRequest = serde_json::from_str("{}").expect("deserialize");
        assert!(req.message.is_none());
        assert!(req.history.is_empty());

        let req: ChatRequest = serde_json::from_str(
            r#"{"message": "hola", "history": [{"role": "user", "content": "hola"}]}"#,
        )
        .expect("deserialize");
        assert_eq!(req.message, Some(serde_json::Value::String("hola".into())));
        assert_eq!(req.history.len(), 1);
    }

    #[test]
    fn chat_request_tolerates_odd_history() {
        let req: ChatRequest =
            serde_json::from_str(r#"{"message": "hola", "history": null}"#).expect("null history");
        assert!(req.history.is_empty());

        let req: ChatRequest =
            serde_json::from_str(r#"{"message": "hola", "history": "ayer"}"#).expect("string history");
        assert!(req.history.is_empty());

        let req: ChatRequest = serde_json::from_str(
            r#"{"message": "hola", "history": [
                {"role": "user", "content": null},
                42,
                {"role": "bot", "content": "Hola"}
            ]}"#,
        )
        .expect("mixed turns");
        assert_eq!(req.history.len(), 2);
        assert_eq!(req.history[0].role, "user");
        assert_eq!(req.history[0].content, "");
        assert_eq!(req.history[1].content, "Hola");
    }

    #[test]
    fn chat_response_from_reply() {
        let response = ChatResponse::from(Reply::new("Hola", Outcome::GreetingReply));
        let json = serde_json::to_string(&response).expect("serialize");
        assert_eq!(json, r#"{"reply":"Hola"}"#);
    }
}

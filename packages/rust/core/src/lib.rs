//! The Huddle decision chain and its building blocks.
//!
//! This crate turns one incoming message into exactly one reply:
//! - [`normalize`]: raw input → [`Message`]
//! - [`screening`]: abuse filter and greeting detector
//! - [`topic`]: domain gating
//! - [`rules`]: ordered quick rules, first match wins
//! - [`synthesis`]: bounded answer from search fragments
//! - [`knowledge`]: the injected vocabularies, rules and replies
//! - [`picker`]: selection among canned replies
//! - [`responder`]: the orchestrator tying the stages together

pub mod knowledge;
pub mod normalize;
pub mod picker;
pub mod responder;
pub mod rules;
pub mod screening;
pub mod synthesis;
pub mod topic;

pub use knowledge::{Knowledge, KnowledgeFile, Replies, RuleEntry};
pub use normalize::Message;
pub use picker::{FixedPicker, RandomPicker, ReplyPicker};
pub use responder::Responder;
pub use rules::{Rule, RuleMatcher};
pub use screening::{GreetingDetector, SafetyFilter};
pub use synthesis::{MAX_LEN, MIN_LEN, Synthesizer};
pub use topic::TopicClassifier;

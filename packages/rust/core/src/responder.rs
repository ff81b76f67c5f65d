//! The decision chain: one message in, exactly one reply out.
//!
//! Stages run strictly in order and the first one that produces a reply
//! ends the request:
//!
//! 1. Empty input → prompt for a question
//! 2. Safety filter → de-escalation reply
//! 3. Greeting detector → greeting from the pool
//! 4. Topic gate → refusal (under [`OffDomainPolicy::Refuse`])
//! 5. Quick rules → canned answer
//! 6. Web search + synthesis → synthesized answer
//! 7. Fallback, whose tone depends on the topic classification

use std::sync::Arc;

use tracing::{Instrument, debug, error, info, instrument};

use huddle_search::SearchProvider;
use huddle_shared::{
    ChatRequest, Classification, HuddleError, OffDomainPolicy, Outcome, Reply, Result,
    SearchFragment,
};

use crate::knowledge::Knowledge;
use crate::normalize::Message;
use crate::picker::{RandomPicker, ReplyPicker, choose};
use crate::synthesis::Synthesizer;

/// Runs the decision chain. Cheap to share behind an `Arc`; holds no
/// per-request state.
pub struct Responder {
    knowledge: Arc<Knowledge>,
    search: Arc<dyn SearchProvider>,
    picker: Arc<dyn ReplyPicker>,
    policy: OffDomainPolicy,
    synthesizer: Synthesizer,
}

impl Responder {
    /// Responder with random reply selection and strict domain gating.
    pub fn new(knowledge: Arc<Knowledge>, search: Arc<dyn SearchProvider>) -> Self {
        let synthesizer = Synthesizer::new(knowledge.replies.more_details.clone());
        Self {
            knowledge,
            search,
            picker: Arc::new(RandomPicker),
            policy: OffDomainPolicy::default(),
            synthesizer,
        }
    }

    pub fn with_policy(mut self, policy: OffDomainPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_picker(mut self, picker: Arc<dyn ReplyPicker>) -> Self {
        self.picker = picker;
        self
    }

    pub fn policy(&self) -> OffDomainPolicy {
        self.policy
    }

    pub fn knowledge(&self) -> &Knowledge {
        &self.knowledge
    }

    /// Answer a chat endpoint request. History is accepted but unused.
    pub async fn respond_to(&self, request: &ChatRequest) -> Reply {
        if !request.history.is_empty() {
            debug!(turns = request.history.len(), "ignoring conversation history");
        }
        let message = Message::from_value(request.message.as_ref());
        self.respond(&message).await
    }

    /// Produce the reply for one message. Never fails: any error inside the
    /// chain becomes the generic fallback.
    #[instrument(skip_all, fields(policy = %self.policy, outcome = tracing::field::Empty))]
    pub async fn respond(&self, message: &Message) -> Reply {
        let reply = match self.decide(message).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(error = %e, "decision chain failed, using generic fallback");
                self.generic_fallback()
            }
        };

        tracing::Span::current().record("outcome", reply.outcome.as_str());
        info!(
            outcome = %reply.outcome,
            chars = reply.text.chars().count(),
            "reply ready"
        );
        reply
    }

    async fn decide(&self, message: &Message) -> Result<Reply> {
        let knowledge = &self.knowledge;
        let replies = &knowledge.replies;

        if message.is_empty() {
            return Ok(Reply::new(&replies.empty_prompt, Outcome::EmptyPrompt));
        }

        debug!(text = message.text(), "message received");
        let lower = message.lower();

        if knowledge.safety.is_abusive(lower) {
            return Ok(Reply::new(&replies.safety, Outcome::SafetyReply));
        }

        if knowledge.greetings.is_greeting(lower) {
            let text = choose(self.picker.as_ref(), &replies.greeting);
            return Ok(Reply::new(text, Outcome::GreetingReply));
        }

        let classification = knowledge.topic.classify(lower);
        debug!(?classification, "topic classified");

        if classification == Classification::OffDomain && self.policy == OffDomainPolicy::Refuse {
            return Ok(Reply::new(&replies.domain_refusal, Outcome::DomainRefusal));
        }

        if let Some(rule) = knowledge.rules.find(lower) {
            debug!(rule = rule.id(), "quick rule matched");
            return Ok(Reply::new(
                rule.answer(),
                Outcome::RuleReply {
                    rule_id: rule.id().to_string(),
                },
            ));
        }

        let fragments = self.search_fragments(message.text()).await?;
        debug!(fragments = fragments.len(), "search returned");

        if let Some(answer) = self.synthesizer.synthesize(&fragments) {
            return Ok(Reply::new(answer, Outcome::SearchReply));
        }

        Ok(self.fallback(classification))
    }

    /// Run the provider on its own task so a panic inside it surfaces here
    /// as an error instead of unwinding through the caller.
    async fn search_fragments(&self, query: &str) -> Result<Vec<SearchFragment>> {
        let provider = Arc::clone(&self.search);
        let query = query.to_string();
        let name = provider.name();

        debug!(provider = name, "searching");
        tokio::spawn(async move { provider.search(&query).await }.in_current_span())
            .await
            .map_err(|e| HuddleError::unexpected("search", format!("{name} provider: {e}")))
    }

    fn fallback(&self, classification: Classification) -> Reply {
        match classification {
            Classification::SupportedDomain => Reply::new(
                choose(self.picker.as_ref(), &self.knowledge.replies.domain_fallback),
                Outcome::DomainFallback,
            ),
            Classification::OffDomain => self.generic_fallback(),
        }
    }

    fn generic_fallback(&self) -> Reply {
        Reply::new(
            choose(self.picker.as_ref(), &self.knowledge.replies.generic_fallback),
            Outcome::GenericFallback,
        )
    }
}

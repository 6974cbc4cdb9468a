//! One chat session's transcript and its single-cell intent memory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chat::intent::Intent;
use crate::chat::resolver::resolve;
use crate::chat::responder::{Responder, UnknownIntentError};

pub const WELCOME_MESSAGE: &str =
    "Hi there! I'm your placement assistant. How can I help you today?";

/// Starter prompts offered while the transcript only holds the welcome line.
pub const SUGGESTIONS: [&str; 3] = [
    "How should I prepare my resume?",
    "How to prepare for interviews?",
    "What skills should I develop?",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    /// Topic label shown under assistant replies. Absent for greetings and fallbacks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            intent: None,
            sent_at: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>, intent: Option<Intent>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            intent: intent.filter(Intent::is_tagged),
            sent_at: Utc::now(),
        }
    }
}

/// Short-term memory carried from one turn to the next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationContext {
    pub last_intent: Option<Intent>,
}

impl ConversationContext {
    /// Resolves `utterance` against this context, returning the intent and
    /// the context the next turn should see.
    pub fn resolve(self, utterance: &str) -> (Intent, ConversationContext) {
        let intent = resolve(utterance, self.last_intent);
        (
            intent,
            ConversationContext {
                last_intent: Some(intent),
            },
        )
    }
}

/// Result of one answered turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub intent: Intent,
    pub reply: ChatMessage,
}

#[derive(Debug, Clone)]
pub struct Conversation {
    context: ConversationContext,
    transcript: Vec<ChatMessage>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    /// A fresh conversation holding only the welcome line.
    pub fn new() -> Self {
        Self {
            context: ConversationContext::default(),
            transcript: vec![ChatMessage::assistant(WELCOME_MESSAGE, None)],
        }
    }

    pub fn context(&self) -> ConversationContext {
        self.context
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    /// Starter prompts, offered until the user has said anything.
    pub fn suggestions(&self) -> &'static [&'static str] {
        if self.transcript.len() == 1 {
            &SUGGESTIONS
        } else {
            &[]
        }
    }

    pub fn push_user(&mut self, utterance: &str) {
        self.transcript.push(ChatMessage::user(utterance));
    }

    /// Resolves and answers `utterance`, then advances the context.
    ///
    /// The user message must already be in the transcript. On error nothing
    /// is written and the context is left as it was.
    pub fn answer(
        &mut self,
        utterance: &str,
        responder: &Responder,
    ) -> Result<TurnOutcome, UnknownIntentError> {
        let (intent, next) = self.context.resolve(utterance);
        let text = responder.respond(intent, utterance)?;
        debug!(%intent, last_intent = ?self.context.last_intent, "turn resolved");

        self.context = next;
        let reply = ChatMessage::assistant(text, Some(intent));
        self.transcript.push(reply.clone());
        Ok(TurnOutcome { intent, reply })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::chat::intent::Company;
    use crate::chat::knowledge::KnowledgeBase;
    use crate::chat::responder::FixedPicker;

    fn responder() -> Responder {
        Responder::new(
            Arc::new(KnowledgeBase::embedded().unwrap()),
            Arc::new(FixedPicker(0)),
        )
    }

    impl Conversation {
        fn take_turn(
            &mut self,
            utterance: &str,
            responder: &Responder,
        ) -> Result<TurnOutcome, UnknownIntentError> {
            self.push_user(utterance);
            self.answer(utterance, responder)
        }
    }

    #[test]
    fn test_new_conversation_has_welcome_and_suggestions() {
        let conv = Conversation::new();
        assert_eq!(conv.transcript().len(), 1);
        assert_eq!(conv.transcript()[0].content, WELCOME_MESSAGE);
        assert_eq!(conv.transcript()[0].role, Role::Assistant);
        assert_eq!(conv.suggestions().len(), 3);
        assert_eq!(conv.context().last_intent, None);
    }

    #[test]
    fn test_turn_appends_user_then_assistant() {
        let r = responder();
        let mut conv = Conversation::new();
        let outcome = conv.take_turn("How should I prepare my resume?", &r).unwrap();

        assert_eq!(outcome.intent, Intent::Resume);
        assert_eq!(conv.transcript().len(), 3);
        assert_eq!(conv.transcript()[1].role, Role::User);
        assert_eq!(conv.transcript()[2].role, Role::Assistant);
        assert_eq!(conv.transcript()[2].intent, Some(Intent::Resume));
        assert_eq!(conv.context().last_intent, Some(Intent::Resume));
        assert!(conv.suggestions().is_empty());
    }

    #[test]
    fn test_context_flows_between_turns() {
        let r = responder();
        let mut conv = Conversation::new();
        conv.take_turn("Tell me about the Google interview", &r).unwrap();
        let outcome = conv.take_turn("what questions do they ask?", &r).unwrap();
        assert_eq!(outcome.intent, Intent::CompanyQuestions(Company::Google));

        let outcome = conv.take_turn("more", &r).unwrap();
        assert_eq!(outcome.intent, Intent::CompanyQuestions(Company::Google));
    }

    #[test]
    fn test_greetings_and_fallbacks_are_untagged() {
        let r = responder();
        let mut conv = Conversation::new();
        let hello = conv.take_turn("hello", &r).unwrap();
        assert_eq!(hello.intent, Intent::Hello);
        assert_eq!(hello.reply.intent, None);

        let fallback = conv.take_turn("ok", &r).unwrap();
        assert_eq!(fallback.intent, Intent::Default);
        assert_eq!(fallback.reply.intent, None);
        assert_eq!(conv.context().last_intent, Some(Intent::Default));
    }

    #[test]
    fn test_failed_answer_leaves_context_untouched() {
        let kb = KnowledgeBase::embedded().unwrap().without_bucket(Intent::Skills);
        let r = Responder::new(Arc::new(kb), Arc::new(FixedPicker(0)));
        let mut conv = Conversation::new();
        conv.take_turn("resume tips", &r).unwrap();

        assert!(conv.take_turn("which skills matter", &r).is_err());
        assert_eq!(conv.context().last_intent, Some(Intent::Resume));
        // user message recorded, no assistant reply
        assert_eq!(conv.transcript().last().unwrap().role, Role::User);
    }

    #[test]
    fn test_context_resolve_returns_advanced_context() {
        let ctx = ConversationContext::default();
        let (intent, next) = ctx.resolve("tips for my cv");
        assert_eq!(intent, Intent::Resume);
        assert_eq!(next.last_intent, Some(Intent::Resume));
        assert_eq!(ctx.last_intent, None);
    }

    #[test]
    fn test_message_serialization_omits_untagged_intent() {
        let msg = ChatMessage::assistant("hi", Some(Intent::Hello));
        let json = serde_json::to_value(&msg).unwrap();
        assert!(json.get("intent").is_none());
        assert_eq!(json["role"], "assistant");

        let msg = ChatMessage::assistant("tip", Some(Intent::JobSearch));
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["intent"], "jobSearch");
    }
}

//! Reply generation seam
//!
//! [`AgentService`](crate::AgentService) never talks to a model directly. It
//! asks a [`ResponseGenerator`] for replies, handoffs and quizzes, so the
//! LLM-backed and keyword implementations are interchangeable.

use async_trait::async_trait;
use kincare_types::{Memory, Priority};
use serde::{Deserialize, Serialize};

use crate::context::{ConversationContext, FamilyMember, MemorySummary};
use crate::personality::Persona;

/// A persona's answer before it is stored
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeneratedReply {
    pub message: String,
    pub emotional_state: String,
    pub suggested_actions: Vec<String>,
    pub memory_tags: Vec<String>,
    /// The generator itself thinks the counterpart should hear about this
    pub handoff_requested: bool,
}

/// What the sending persona shares with its counterpart
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandoffContext {
    pub user_name: String,
    pub user_message: String,
    pub emotional_state: String,
    pub suggested_actions: Vec<String>,
    pub family_members: Vec<FamilyMember>,
    pub recent_memories: Vec<MemorySummary>,
}

impl HandoffContext {
    /// Share `reply` to `message` along with the family picture from `context`
    pub fn from_reply(
        context: &ConversationContext,
        message: &str,
        reply: &GeneratedReply,
    ) -> Self {
        Self {
            user_name: context.user_name.clone(),
            user_message: message.to_string(),
            emotional_state: reply.emotional_state.clone(),
            suggested_actions: reply.suggested_actions.clone(),
            family_members: context.family_members.clone(),
            recent_memories: context.recent_memories.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Handoff {
    pub message: String,
    pub priority: Priority,
    pub suggested_actions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryQuiz {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    pub follow_up_questions: Vec<String>,
}

impl MemoryQuiz {
    /// Used when there is nothing to quiz on
    pub fn default_quiz() -> Self {
        Self {
            question: "What's your favorite family memory?".to_string(),
            options: DEFAULT_QUIZ_OPTIONS.iter().map(|s| s.to_string()).collect(),
            correct_answer: 0,
            follow_up_questions: vec![
                "What made that moment special?".to_string(),
                "Who else was there?".to_string(),
            ],
        }
    }
}

pub(crate) const DEFAULT_QUIZ_OPTIONS: [&str; 4] = [
    "A special celebration",
    "A family vacation",
    "A quiet moment together",
    "A funny story",
];

/// Produces persona output. Implementations never fail; they degrade to
/// canned text instead.
#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    fn name(&self) -> &'static str;

    async fn generate_response(
        &self,
        persona: &Persona,
        message: &str,
        context: &ConversationContext,
    ) -> GeneratedReply;

    async fn generate_handoff(
        &self,
        from: &Persona,
        to: &Persona,
        context: &HandoffContext,
    ) -> Handoff;

    async fn generate_memory_quiz(&self, memories: &[Memory]) -> MemoryQuiz;
}

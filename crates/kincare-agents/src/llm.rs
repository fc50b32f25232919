//! Model-backed generator
//!
//! Each call asks for JSON output and takes whatever fields come back,
//! filling the rest with fixed fallbacks. A failed request degrades to an
//! apology instead of an error.

use async_trait::async_trait;
use kincare_llm::{CompletionRequest, LlmRouter, Message};
use kincare_types::{Memory, Priority};
use serde_json::Value;
use tracing::{debug, warn};

use crate::context::ConversationContext;
use crate::generator::*;
use crate::personality::Persona;

const FALLBACK_REPLY: &str = "I'm here to help you. Could you tell me more?";
const ERROR_REPLY: &str =
    "I'm sorry, I'm having trouble processing that right now. Could you try again?";
const FALLBACK_HANDOFF: &str = "Shared user interaction context";
const ERROR_HANDOFF: &str = "Error in agent communication";

pub struct LlmGenerator {
    llm: LlmRouter,
}

impl LlmGenerator {
    pub fn new(llm: LlmRouter) -> Self {
        Self { llm }
    }

    async fn complete_json(&self, request: CompletionRequest) -> kincare_llm::Result<Value> {
        let response = self.llm.complete(request).await?;
        debug!(tokens = response.usage.total_tokens, "LLM reply");
        response.json()
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

fn string_list(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn reply_prompt(persona: &Persona, ctx: &ConversationContext) -> String {
    let recent = ctx
        .conversation_history
        .iter()
        .take(3)
        .map(|h| {
            format!(
                "User: {}, Response: {}",
                h.message,
                h.response.as_deref().unwrap_or("")
            )
        })
        .collect::<Vec<_>>()
        .join("; ");
    let family = ctx
        .family_members
        .iter()
        .map(|m| format!("{} ({})", m.name, m.relationship))
        .collect::<Vec<_>>()
        .join(", ");
    let memories = ctx
        .recent_memories
        .iter()
        .map(|m| m.title.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"{system}

Current user context:
- Name: {name}
- Role: {role}
- Recent conversations: {recent}
- Family members: {family}
- Recent memories: {memories}

Respond naturally to the user's message. Also give your assessment of the
user's emotional state, suggested actions for family connection or
wellbeing, and memory tags relevant to this conversation.

Output valid JSON only. Schema:
{{"response": "your conversational response", "emotionalState": "happy|sad|concerned|neutral|excited|lonely|...", "suggestedActions": ["..."], "memoryTags": ["..."]}}"#,
        system = persona.system_prompt,
        name = ctx.user_name,
        role = ctx.user_role.as_str(),
    )
}

fn handoff_prompt(from: &Persona, to: &Persona, ctx: &HandoffContext) -> String {
    let family = serde_json::json!({
        "familyMembers": ctx.family_members,
        "recentMemories": ctx.recent_memories,
    });
    let actions = ctx.suggested_actions.join(", ");
    format!(
        r#"You are {from} communicating with {to}.
Share what {to} needs to know from your interaction with a user.

User interaction context:
- User: {user}
- User message: {message}
- Detected emotional state: {state}
- Suggested actions: {actions}
- Family context: {family}

Include key observations, any emotional or health signals, and suggested
family connection opportunities. Pick a priority.

Output valid JSON only. Schema:
{{"message": "your message to {to}", "priority": "low|medium|high", "suggestedActions": ["..."]}}"#,
        from = from.name,
        to = to.name,
        user = ctx.user_name,
        message = ctx.user_message,
        state = ctx.emotional_state,
    )
}

fn quiz_prompt(memories: &[Memory]) -> String {
    let listed = memories
        .iter()
        .map(|m| format!("{}: {} ({})", m.title, m.description, m.category))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        r#"You are writing a gentle memory quiz for an elderly user from their family memories.
Keep it warm and conversational rather than test-like, focus on happy shared
experiences, and add follow-up questions that invite storytelling.

Family memories:
{listed}

Output valid JSON only. Schema:
{{"question": "...", "options": ["A", "B", "C", "D"], "correctAnswer": 0, "followUpQuestions": ["..."]}}"#
    )
}

#[async_trait]
impl ResponseGenerator for LlmGenerator {
    fn name(&self) -> &'static str {
        "llm"
    }

    async fn generate_response(
        &self,
        persona: &Persona,
        message: &str,
        context: &ConversationContext,
    ) -> GeneratedReply {
        let request = CompletionRequest::new(vec![Message::user(message)])
            .with_system(reply_prompt(persona, context))
            .with_json_mode()
            .with_temperature(0.7)
            .with_max_tokens(1000);

        match self.complete_json(request).await {
            Ok(json) => GeneratedReply {
                message: string_field(&json, "response")
                    .unwrap_or_else(|| FALLBACK_REPLY.to_string()),
                emotional_state: string_field(&json, "emotionalState")
                    .unwrap_or_else(|| "neutral".to_string()),
                suggested_actions: string_list(&json, "suggestedActions"),
                memory_tags: string_list(&json, "memoryTags"),
                handoff_requested: false,
            },
            Err(e) => {
                warn!(agent = %persona.id, error = %e, "Reply generation failed");
                GeneratedReply {
                    message: ERROR_REPLY.to_string(),
                    emotional_state: "neutral".to_string(),
                    ..Default::default()
                }
            }
        }
    }

    async fn generate_handoff(
        &self,
        from: &Persona,
        to: &Persona,
        context: &HandoffContext,
    ) -> Handoff {
        let request = CompletionRequest::new(vec![Message::user(
            "Generate agent-to-agent communication based on the context provided.",
        )])
        .with_system(handoff_prompt(from, to, context))
        .with_json_mode()
        .with_temperature(0.6)
        .with_max_tokens(500);

        match self.complete_json(request).await {
            Ok(json) => Handoff {
                message: string_field(&json, "message")
                    .unwrap_or_else(|| FALLBACK_HANDOFF.to_string()),
                priority: string_field(&json, "priority")
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(Priority::Medium),
                suggested_actions: string_list(&json, "suggestedActions"),
            },
            Err(e) => {
                warn!(from = %from.id, to = %to.id, error = %e, "Handoff generation failed");
                Handoff {
                    message: ERROR_HANDOFF.to_string(),
                    priority: Priority::Low,
                    suggested_actions: Vec::new(),
                }
            }
        }
    }

    async fn generate_memory_quiz(&self, memories: &[Memory]) -> MemoryQuiz {
        let request = CompletionRequest::new(vec![Message::user(
            "Create a memory quiz question based on these family memories.",
        )])
        .with_system(quiz_prompt(memories))
        .with_json_mode()
        .with_temperature(0.8)
        .with_max_tokens(400);

        match self.complete_json(request).await {
            Ok(json) => {
                let mut options = string_list(&json, "options");
                if options.is_empty() {
                    options = ["Option A", "Option B", "Option C", "Option D"]
                        .iter()
                        .map(|s| s.to_string())
                        .collect();
                }
                let correct_answer = json
                    .get("correctAnswer")
                    .and_then(Value::as_u64)
                    .map(|n| n as usize)
                    .filter(|n| *n < options.len())
                    .unwrap_or(0);
                let mut follow_up_questions = string_list(&json, "followUpQuestions");
                if follow_up_questions.is_empty() {
                    follow_up_questions.push("What made that moment special?".to_string());
                }
                MemoryQuiz {
                    question: string_field(&json, "question").unwrap_or_else(|| {
                        "Tell me about a happy memory from your family".to_string()
                    }),
                    options,
                    correct_answer,
                    follow_up_questions,
                }
            }
            Err(e) => {
                warn!(error = %e, "Quiz generation failed");
                MemoryQuiz::default_quiz()
            }
        }
    }
}

//! Agent orchestration
//!
//! [`AgentService`] turns one user message into a stored conversation and,
//! when the reply calls for it, a stored handoff to the other persona. It
//! also owns care-notification fan-out and the family insight queries.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use kincare_db::{Storage, DEFAULT_CONVERSATION_LIMIT};
use kincare_types::*;
use serde_json::json;
use tracing::{debug, info, instrument};

use crate::context::ConversationContext;
use crate::error::{AgentError, AgentResult};
use crate::generator::*;
use crate::insights::{self, ContactSuggestion, FamilyInsights};
use crate::personality::Persona;

/// Emotional states that always reach the other persona
const CONCERNING_STATES: [&str; 5] = ["sad", "lonely", "anxious", "confused", "worried"];
/// Suggested actions that always reach the other persona
const HANDOFF_ACTIONS: [&str; 5] = [
    "contact family",
    "schedule call",
    "check wellbeing",
    "medical concern",
    "emotional support",
];

/// Conversations scored for insights
const INSIGHT_WINDOW: i64 = 20;

/// Care reminder types that also book an appointment notification
const APPOINTMENT_REMINDER_TYPES: [&str; 2] = ["care_facility", "appointment"];

/// Whether a reply should be passed on to the counterpart persona
pub fn should_hand_off(reply: &GeneratedReply) -> bool {
    if reply.handoff_requested {
        return true;
    }
    let state = reply.emotional_state.to_lowercase();
    if CONCERNING_STATES.contains(&state.as_str()) {
        return true;
    }
    reply.suggested_actions.iter().any(|action| {
        let action = action.to_lowercase().replace('_', " ");
        HANDOFF_ACTIONS.iter().any(|k| action.contains(k))
    })
}

/// Fields for a new care notification
#[derive(Debug, Clone)]
pub struct CareEvent {
    pub notification_type: String,
    pub title: String,
    pub description: String,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub care_provider: Option<String>,
    pub assistance_needed: bool,
}

/// Fields for a new care reminder
#[derive(Debug, Clone)]
pub struct CareReminder {
    pub reminder_type: String,
    pub title: String,
    pub description: Option<String>,
    pub scheduled_time: DateTime<Utc>,
    pub care_coordination: Option<serde_json::Value>,
}

#[derive(Clone)]
pub struct AgentService {
    store: Arc<dyn Storage>,
    generator: Arc<dyn ResponseGenerator>,
}

impl AgentService {
    pub fn new(store: Arc<dyn Storage>, generator: Arc<dyn ResponseGenerator>) -> Self {
        Self { store, generator }
    }

    pub fn generator_name(&self) -> &'static str {
        self.generator.name()
    }

    async fn require_user(&self, user_id: i64) -> AgentResult<User> {
        self.store
            .get_user(user_id)
            .await?
            .ok_or(AgentError::UserNotFound(user_id))
    }

    /// Answer a user message as `agent_id`, storing the exchange and any handoff
    #[instrument(skip(self, message), fields(generator = self.generator.name()))]
    pub async fn process_user_message(
        &self,
        user_id: i64,
        agent_id: AgentId,
        message: &str,
    ) -> AgentResult<AgentResponse> {
        let user = self.require_user(user_id).await?;
        let context = ConversationContext::load(self.store.as_ref(), &user).await?;
        let persona = Persona::for_agent(agent_id);

        let reply = self
            .generator
            .generate_response(persona, message, &context)
            .await;

        self.store
            .create_conversation(NewConversation {
                user_id,
                agent_id,
                message: message.to_string(),
                response: Some(reply.message.clone()),
                emotional_state: Some(reply.emotional_state.clone()),
                metadata: Some(json!({
                    "suggestedActions": reply.suggested_actions,
                    "memoryTags": reply.memory_tags,
                })),
            })
            .await?;
        metrics::counter!("kincare_messages_total", "agent" => agent_id.as_str()).increment(1);

        let agent_communication = if should_hand_off(&reply) {
            Some(self.hand_off(persona, &context, message, &reply).await?)
        } else {
            None
        };

        Ok(AgentResponse {
            message: reply.message,
            emotional_state: reply.emotional_state,
            suggested_actions: reply.suggested_actions,
            memory_tags: reply.memory_tags,
            agent_communication,
        })
    }

    async fn hand_off(
        &self,
        from: &Persona,
        context: &ConversationContext,
        message: &str,
        reply: &GeneratedReply,
    ) -> AgentResult<AgentHandoff> {
        let to = from.counterpart();
        let handoff = self
            .generator
            .generate_handoff(from, to, &HandoffContext::from_reply(context, message, reply))
            .await;

        self.store
            .create_agent_communication(NewAgentCommunication {
                from_agent: from.id,
                to_agent: to.id,
                message: handoff.message.clone(),
                context: Some(json!({
                    "priority": handoff.priority,
                    "suggestedActions": handoff.suggested_actions,
                    "originalUserMessage": message,
                    "emotionalState": reply.emotional_state,
                })),
            })
            .await?;
        metrics::counter!(
            "kincare_handoffs_total",
            "from" => from.id.as_str(),
            "priority" => handoff.priority.as_str()
        )
        .increment(1);
        info!(from = %from.id, to = %to.id, priority = %handoff.priority, "Agent handoff");

        Ok(AgentHandoff {
            to_agent: to.id,
            message: handoff.message,
            priority: handoff.priority,
        })
    }

    /// Record a care event for an elderly user and tell their family
    pub async fn create_care_notification(
        &self,
        elderly_user_id: i64,
        event: CareEvent,
    ) -> AgentResult<CareNotification> {
        let urgency = if event.assistance_needed {
            UrgencyLevel::High
        } else {
            UrgencyLevel::Normal
        };
        let notification = self
            .store
            .create_care_notification(NewCareNotification {
                elderly_user_id,
                notification_type: event.notification_type,
                title: event.title,
                description: event.description,
                scheduled_time: event.scheduled_time,
                care_provider: event.care_provider,
                family_invited: Some(true),
                assistance_needed: Some(event.assistance_needed),
                urgency_level: Some(urgency),
                metadata: None,
            })
            .await?;

        self.notify_family_members(elderly_user_id, &notification)
            .await
    }

    /// One Grace-to-Alex message per connected family member, then record who was told
    pub async fn notify_family_members(
        &self,
        elderly_user_id: i64,
        notification: &CareNotification,
    ) -> AgentResult<CareNotification> {
        let connections = self.store.get_family_connections(elderly_user_id).await?;
        let mut notified = Vec::with_capacity(connections.len());

        for conn in &connections {
            let family_member_id = conn.other_member(elderly_user_id);
            self.store
                .create_agent_communication(NewAgentCommunication {
                    from_agent: AgentId::Grace,
                    to_agent: AgentId::Alex,
                    message: format!(
                        "Care notification for {}: {}",
                        notification.title, notification.description
                    ),
                    context: Some(json!({
                        "notificationId": notification.id,
                        "elderlyUserId": elderly_user_id,
                        "familyMemberId": family_member_id,
                        "urgencyLevel": notification.urgency_level,
                        "assistanceNeeded": notification.assistance_needed,
                        "scheduledTime": notification.scheduled_time,
                    })),
                })
                .await?;
            notified.push(family_member_id);
        }

        debug!(
            notification = notification.id,
            members = notified.len(),
            "Family notified"
        );
        Ok(self
            .store
            .update_care_notification_family_notified(notification.id, &notified)
            .await?)
    }

    /// High-priority reminder, plus an appointment notification for care visits
    pub async fn process_care_reminder(
        &self,
        user_id: i64,
        reminder: CareReminder,
    ) -> AgentResult<Reminder> {
        let coordination = reminder.care_coordination.clone();
        let created = self
            .store
            .create_reminder(NewReminder {
                user_id,
                title: reminder.title.clone(),
                description: reminder.description.clone(),
                reminder_type: reminder.reminder_type.clone(),
                scheduled_time: reminder.scheduled_time,
                priority: Some(Priority::High),
                care_coordination: reminder.care_coordination,
            })
            .await?;

        if APPOINTMENT_REMINDER_TYPES.contains(&reminder.reminder_type.as_str()) {
            let field = |key: &str| coordination.as_ref().and_then(|c| c.get(key).cloned());
            self.create_care_notification(
                user_id,
                CareEvent {
                    notification_type: "appointment".to_string(),
                    title: reminder.title,
                    description: reminder.description.unwrap_or_default(),
                    scheduled_time: Some(reminder.scheduled_time),
                    care_provider: field("careProvider")
                        .and_then(|v| v.as_str().map(str::to_string)),
                    assistance_needed: field("assistanceNeeded")
                        .and_then(|v| v.as_bool())
                        .unwrap_or(false),
                },
            )
            .await?;
        }

        Ok(created)
    }

    pub async fn generate_family_insights(&self, user_id: i64) -> AgentResult<FamilyInsights> {
        self.require_user(user_id).await?;
        let now = Utc::now();
        let conversations = self.store.get_conversations(user_id, INSIGHT_WINDOW).await?;
        let connections = self.store.get_family_connections(user_id).await?;
        let pending = self.store.get_pending_reminders(user_id, now).await?;
        Ok(insights::family_insights(
            &conversations,
            &connections,
            &pending,
            now,
        ))
    }

    pub async fn create_memory_quiz(&self, family_id: i64) -> AgentResult<MemoryQuiz> {
        let memories = self.store.get_memories(family_id).await?;
        if memories.is_empty() {
            return Ok(MemoryQuiz::default_quiz());
        }
        Ok(self.generator.generate_memory_quiz(&memories).await)
    }

    pub async fn agent_communications(&self, limit: i64) -> AgentResult<Vec<AgentCommunication>> {
        Ok(self.store.get_agent_communications(limit).await?)
    }

    pub async fn suggest_optimal_contact_time(
        &self,
        user_id: i64,
    ) -> AgentResult<ContactSuggestion> {
        let conversations = self
            .store
            .get_conversations(user_id, DEFAULT_CONVERSATION_LIMIT)
            .await?;
        Ok(insights::contact_suggestion(&conversations, Utc::now()))
    }
}

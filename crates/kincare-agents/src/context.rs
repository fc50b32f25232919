//! What a persona knows about the user when it answers

use chrono::{DateTime, Utc};
use kincare_db::{DbResult, Storage, DEFAULT_CONVERSATION_LIMIT};
use kincare_types::{User, UserRole};
use serde::Serialize;

/// Exchanges carried into a prompt
pub const HISTORY_WINDOW: usize = 10;
/// Memories taken from each family connection
pub const MEMORIES_PER_CONNECTION: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub message: String,
    pub response: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyMember {
    pub name: String,
    pub relationship: String,
    pub last_contact: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemorySummary {
    pub title: String,
    pub description: String,
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationContext {
    pub user_id: i64,
    pub user_name: String,
    pub user_role: UserRole,
    /// Newest first
    pub conversation_history: Vec<HistoryItem>,
    pub family_members: Vec<FamilyMember>,
    pub recent_memories: Vec<MemorySummary>,
}

impl ConversationContext {
    /// Gather history, family and memories for `user` from the store
    pub async fn load(store: &dyn Storage, user: &User) -> DbResult<Self> {
        let now = Utc::now();
        let conversations = store
            .get_conversations(user.id, DEFAULT_CONVERSATION_LIMIT)
            .await?;
        let conversation_history = conversations
            .into_iter()
            .take(HISTORY_WINDOW)
            .map(|c| HistoryItem {
                message: c.message,
                response: c.response,
                timestamp: c.timestamp,
            })
            .collect();

        let connections = store.get_family_connections(user.id).await?;
        let mut family_members = Vec::with_capacity(connections.len());
        let mut recent_memories = Vec::new();
        for conn in &connections {
            let other = store.get_user(conn.other_member(user.id)).await?;
            family_members.push(FamilyMember {
                name: other.map(|u| u.name).unwrap_or_else(|| "Unknown".to_string()),
                relationship: conn.relationship_type.clone(),
                last_contact: conn.last_contact_date.unwrap_or(now),
            });

            let memories = store.get_memories(conn.id).await?;
            recent_memories.extend(memories.into_iter().take(MEMORIES_PER_CONNECTION).map(|m| {
                MemorySummary {
                    title: m.title,
                    description: m.description,
                    date: m.date_of_memory,
                }
            }));
        }

        Ok(Self {
            user_id: user.id,
            user_name: user.name.clone(),
            user_role: user.role,
            conversation_history,
            family_members,
            recent_memories,
        })
    }

    pub fn has_family(&self) -> bool {
        !self.family_members.is_empty()
    }
}

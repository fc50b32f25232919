//! Stored records
//!
//! Every record is owned by exactly one storage row. Ids are assigned by the
//! store; timestamps are UTC.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::agent::{AgentId, Priority, UrgencyLevel, UserRole};

/// A household member, either the elderly user or a caregiver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub preferred_agent: Option<AgentId>,
    pub voice_enabled: bool,
    pub created_at: DateTime<Utc>,
}

/// One exchange between a user and a persona
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: i64,
    pub user_id: i64,
    pub agent_id: AgentId,
    pub message: String,
    pub response: Option<String>,
    pub emotional_state: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub metadata: Option<serde_json::Value>,
}

/// Link between an elderly user and one of their caregivers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyConnection {
    pub id: i64,
    pub elderly_user_id: i64,
    pub caregiver_user_id: i64,
    pub relationship_type: String,
    pub last_contact_date: Option<DateTime<Utc>>,
    pub contact_frequency: String,
    pub created_at: DateTime<Utc>,
}

impl FamilyConnection {
    /// The member on the other side of the connection from `user_id`
    pub fn other_member(&self, user_id: i64) -> i64 {
        if self.elderly_user_id == user_id {
            self.caregiver_user_id
        } else {
            self.elderly_user_id
        }
    }

    pub fn involves(&self, user_id: i64) -> bool {
        self.elderly_user_id == user_id || self.caregiver_user_id == user_id
    }
}

/// A shared family memory, used for reminiscence and quizzes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Memory {
    pub id: i64,
    pub family_id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub participants: Option<Vec<String>>,
    pub date_of_memory: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub reminder_type: String,
    pub scheduled_time: DateTime<Utc>,
    pub completed: bool,
    pub priority: Priority,
    pub care_coordination: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl Reminder {
    pub fn is_pending_at(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.scheduled_time <= now
    }
}

/// A care event (appointment, activity, therapy) the family is told about
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareNotification {
    pub id: i64,
    pub elderly_user_id: i64,
    pub notification_type: String,
    pub title: String,
    pub description: String,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub care_provider: Option<String>,
    pub family_invited: bool,
    pub assistance_needed: bool,
    pub urgency_level: UrgencyLevel,
    pub metadata: Option<serde_json::Value>,
    pub notified_family_members: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// A message passed between the two personas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCommunication {
    pub id: i64,
    pub from_agent: AgentId,
    pub to_agent: AgentId,
    pub message: String,
    pub context: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepSchedule {
    pub id: i64,
    pub user_id: i64,
    /// "HH:MM", 24-hour clock
    pub bedtime: String,
    /// Minutes of sleep music
    pub duration: i32,
    pub music_type: String,
    /// Hz
    pub binaural_frequency: i32,
    pub volume: i32,
    pub is_active: bool,
    pub music_preferences: Option<serde_json::Value>,
    pub sleep_goals: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A digital picture frame in the elderly user's home
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PictureFrame {
    pub id: i64,
    pub elderly_user_id: i64,
    pub device_id: String,
    pub device_name: String,
    pub is_active: bool,
    /// Seconds per photo
    pub display_duration: i32,
    pub brightness: i32,
    pub transition_effect: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyPhoto {
    pub id: i64,
    pub picture_frame_id: i64,
    pub sender_user_id: i64,
    pub photo_url: String,
    pub caption: Option<String>,
    pub is_approved: bool,
    pub display_order: i32,
    pub uploaded_at: DateTime<Utc>,
    pub sent_at: DateTime<Utc>,
    pub viewed_at: Option<DateTime<Utc>>,
    pub metadata: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn connection() -> FamilyConnection {
        FamilyConnection {
            id: 1,
            elderly_user_id: 1,
            caregiver_user_id: 2,
            relationship_type: "child".into(),
            last_contact_date: None,
            contact_frequency: "weekly".into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_other_member() {
        let conn = connection();
        assert_eq!(conn.other_member(1), 2);
        assert_eq!(conn.other_member(2), 1);
        assert!(conn.involves(2));
        assert!(!conn.involves(3));
    }

    #[test]
    fn test_reminder_pending() {
        let now = Utc::now();
        let mut reminder = Reminder {
            id: 1,
            user_id: 1,
            title: "Pills".into(),
            description: None,
            reminder_type: "medication".into(),
            scheduled_time: now - Duration::minutes(5),
            completed: false,
            priority: Priority::High,
            care_coordination: None,
            created_at: now,
        };
        assert!(reminder.is_pending_at(now));

        reminder.scheduled_time = now;
        assert!(reminder.is_pending_at(now));

        reminder.scheduled_time = now + Duration::hours(1);
        assert!(!reminder.is_pending_at(now));

        reminder.scheduled_time = now - Duration::hours(1);
        reminder.completed = true;
        assert!(!reminder.is_pending_at(now));
    }

    #[test]
    fn test_camel_case_serialization() {
        let json = serde_json::to_value(connection()).unwrap();
        assert_eq!(json["elderlyUserId"], 1);
        assert_eq!(json["relationshipType"], "child");
        assert_eq!(json["contactFrequency"], "weekly");
    }
}

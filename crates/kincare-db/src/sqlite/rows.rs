//! Row models - mapped from SQLite tables
//!
//! Rows hold SQLite-native values (integers, text); each converts into its
//! domain record with `TryFrom`.

use chrono::{DateTime, TimeZone, Utc};
use kincare_types::*;
use serde::de::DeserializeOwned;
use sqlx::FromRow;

use crate::{DbError, DbResult};

pub(crate) fn to_millis(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}

pub(crate) fn from_millis(ms: i64) -> DbResult<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| DbError::Serialization(format!("timestamp out of range: {}", ms)))
}

fn from_millis_opt(ms: Option<i64>) -> DbResult<Option<DateTime<Utc>>> {
    ms.map(from_millis).transpose()
}

pub(crate) fn to_json<T: serde::Serialize>(value: &Option<T>) -> DbResult<Option<String>> {
    value
        .as_ref()
        .map(|v| serde_json::to_string(v).map_err(DbError::from))
        .transpose()
}

fn from_json<T: DeserializeOwned>(text: Option<String>) -> DbResult<Option<T>> {
    text.map(|t| serde_json::from_str(&t).map_err(DbError::from))
        .transpose()
}

#[derive(Debug, Clone, FromRow)]
pub struct DbUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub name: String,
    pub role: String,
    pub preferred_agent: Option<String>,
    pub voice_enabled: bool,
    pub created_at: i64,
}

impl TryFrom<DbUser> for User {
    type Error = DbError;

    fn try_from(row: DbUser) -> DbResult<Self> {
        Ok(User {
            id: row.id,
            username: row.username,
            email: row.email,
            name: row.name,
            role: row.role.parse()?,
            preferred_agent: row.preferred_agent.map(|a| a.parse()).transpose()?,
            voice_enabled: row.voice_enabled,
            created_at: from_millis(row.created_at)?,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbConversation {
    pub id: i64,
    pub user_id: i64,
    pub agent_id: String,
    pub message: String,
    pub response: Option<String>,
    pub emotional_state: Option<String>,
    pub timestamp: i64,
    pub metadata: Option<String>,
}

impl TryFrom<DbConversation> for Conversation {
    type Error = DbError;

    fn try_from(row: DbConversation) -> DbResult<Self> {
        Ok(Conversation {
            id: row.id,
            user_id: row.user_id,
            agent_id: row.agent_id.parse()?,
            message: row.message,
            response: row.response,
            emotional_state: row.emotional_state,
            timestamp: from_millis(row.timestamp)?,
            metadata: from_json(row.metadata)?,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbFamilyConnection {
    pub id: i64,
    pub elderly_user_id: i64,
    pub caregiver_user_id: i64,
    pub relationship_type: String,
    pub last_contact_date: Option<i64>,
    pub contact_frequency: String,
    pub created_at: i64,
}

impl TryFrom<DbFamilyConnection> for FamilyConnection {
    type Error = DbError;

    fn try_from(row: DbFamilyConnection) -> DbResult<Self> {
        Ok(FamilyConnection {
            id: row.id,
            elderly_user_id: row.elderly_user_id,
            caregiver_user_id: row.caregiver_user_id,
            relationship_type: row.relationship_type,
            last_contact_date: from_millis_opt(row.last_contact_date)?,
            contact_frequency: row.contact_frequency,
            created_at: from_millis(row.created_at)?,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbMemory {
    pub id: i64,
    pub family_id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub participants: Option<String>,
    pub date_of_memory: Option<i64>,
    pub created_at: i64,
}

impl TryFrom<DbMemory> for Memory {
    type Error = DbError;

    fn try_from(row: DbMemory) -> DbResult<Self> {
        Ok(Memory {
            id: row.id,
            family_id: row.family_id,
            title: row.title,
            description: row.description,
            category: row.category,
            participants: from_json(row.participants)?,
            date_of_memory: from_millis_opt(row.date_of_memory)?,
            created_at: from_millis(row.created_at)?,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbReminder {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub reminder_type: String,
    pub scheduled_time: i64,
    pub completed: bool,
    pub priority: String,
    pub care_coordination: Option<String>,
    pub created_at: i64,
}

impl TryFrom<DbReminder> for Reminder {
    type Error = DbError;

    fn try_from(row: DbReminder) -> DbResult<Self> {
        Ok(Reminder {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            description: row.description,
            reminder_type: row.reminder_type,
            scheduled_time: from_millis(row.scheduled_time)?,
            completed: row.completed,
            priority: row.priority.parse()?,
            care_coordination: from_json(row.care_coordination)?,
            created_at: from_millis(row.created_at)?,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbCareNotification {
    pub id: i64,
    pub elderly_user_id: i64,
    pub notification_type: String,
    pub title: String,
    pub description: String,
    pub scheduled_time: Option<i64>,
    pub care_provider: Option<String>,
    pub family_invited: bool,
    pub assistance_needed: bool,
    pub urgency_level: String,
    pub metadata: Option<String>,
    pub notified_family_members: String,
    pub created_at: i64,
}

impl TryFrom<DbCareNotification> for CareNotification {
    type Error = DbError;

    fn try_from(row: DbCareNotification) -> DbResult<Self> {
        Ok(CareNotification {
            id: row.id,
            elderly_user_id: row.elderly_user_id,
            notification_type: row.notification_type,
            title: row.title,
            description: row.description,
            scheduled_time: from_millis_opt(row.scheduled_time)?,
            care_provider: row.care_provider,
            family_invited: row.family_invited,
            assistance_needed: row.assistance_needed,
            urgency_level: row.urgency_level.parse()?,
            metadata: from_json(row.metadata)?,
            notified_family_members: serde_json::from_str(&row.notified_family_members)?,
            created_at: from_millis(row.created_at)?,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbAgentCommunication {
    pub id: i64,
    pub from_agent: String,
    pub to_agent: String,
    pub message: String,
    pub context: Option<String>,
    pub timestamp: i64,
}

impl TryFrom<DbAgentCommunication> for AgentCommunication {
    type Error = DbError;

    fn try_from(row: DbAgentCommunication) -> DbResult<Self> {
        Ok(AgentCommunication {
            id: row.id,
            from_agent: row.from_agent.parse()?,
            to_agent: row.to_agent.parse()?,
            message: row.message,
            context: from_json(row.context)?,
            timestamp: from_millis(row.timestamp)?,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbSleepSchedule {
    pub id: i64,
    pub user_id: i64,
    pub bedtime: String,
    pub duration: i32,
    pub music_type: String,
    pub binaural_frequency: i32,
    pub volume: i32,
    pub is_active: bool,
    pub music_preferences: Option<String>,
    pub sleep_goals: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TryFrom<DbSleepSchedule> for SleepSchedule {
    type Error = DbError;

    fn try_from(row: DbSleepSchedule) -> DbResult<Self> {
        Ok(SleepSchedule {
            id: row.id,
            user_id: row.user_id,
            bedtime: row.bedtime,
            duration: row.duration,
            music_type: row.music_type,
            binaural_frequency: row.binaural_frequency,
            volume: row.volume,
            is_active: row.is_active,
            music_preferences: from_json(row.music_preferences)?,
            sleep_goals: from_json(row.sleep_goals)?,
            created_at: from_millis(row.created_at)?,
            updated_at: from_millis(row.updated_at)?,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbPictureFrame {
    pub id: i64,
    pub elderly_user_id: i64,
    pub device_id: String,
    pub device_name: String,
    pub is_active: bool,
    pub display_duration: i32,
    pub brightness: i32,
    pub transition_effect: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TryFrom<DbPictureFrame> for PictureFrame {
    type Error = DbError;

    fn try_from(row: DbPictureFrame) -> DbResult<Self> {
        Ok(PictureFrame {
            id: row.id,
            elderly_user_id: row.elderly_user_id,
            device_id: row.device_id,
            device_name: row.device_name,
            is_active: row.is_active,
            display_duration: row.display_duration,
            brightness: row.brightness,
            transition_effect: row.transition_effect,
            created_at: from_millis(row.created_at)?,
            updated_at: from_millis(row.updated_at)?,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbFamilyPhoto {
    pub id: i64,
    pub picture_frame_id: i64,
    pub sender_user_id: i64,
    pub photo_url: String,
    pub caption: Option<String>,
    pub is_approved: bool,
    pub display_order: i32,
    pub uploaded_at: i64,
    pub sent_at: i64,
    pub viewed_at: Option<i64>,
    pub metadata: Option<String>,
}

impl TryFrom<DbFamilyPhoto> for FamilyPhoto {
    type Error = DbError;

    fn try_from(row: DbFamilyPhoto) -> DbResult<Self> {
        Ok(FamilyPhoto {
            id: row.id,
            picture_frame_id: row.picture_frame_id,
            sender_user_id: row.sender_user_id,
            photo_url: row.photo_url,
            caption: row.caption,
            is_approved: row.is_approved,
            display_order: row.display_order,
            uploaded_at: from_millis(row.uploaded_at)?,
            sent_at: from_millis(row.sent_at)?,
            viewed_at: from_millis_opt(row.viewed_at)?,
            metadata: from_json(row.metadata)?,
        })
    }
}

/// Convert a batch of rows, failing on the first bad one
pub(crate) fn convert_all<R, T>(rows: Vec<R>) -> DbResult<Vec<T>>
where
    T: TryFrom<R, Error = DbError>,
{
    rows.into_iter().map(T::try_from).collect()
}

//! Insert payloads and partial updates
//!
//! Each `New*` payload carries the client-supplied fields of a record and
//! knows how to turn itself into the stored record once the store has picked
//! an id. Defaults for omitted fields live here so every store applies the
//! same ones.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::agent::{AgentId, Priority, UrgencyLevel, UserRole};
use crate::models::*;

pub const DEFAULT_CONTACT_FREQUENCY: &str = "weekly";
pub const DEFAULT_VOLUME: i32 = 50;
pub const DEFAULT_DISPLAY_DURATION: i32 = 30;
pub const DEFAULT_BRIGHTNESS: i32 = 80;
pub const DEFAULT_TRANSITION: &str = "fade";

/// Bedtimes are 24-hour "HH:MM"
pub fn validate_bedtime(value: &str) -> Result<(), ValidationError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map(|_| ())
        .map_err(|_| ValidationError::new("bedtime_format"))
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    #[validate(length(min = 1, max = 64))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    pub role: UserRole,
    #[serde(default)]
    pub preferred_agent: Option<AgentId>,
    #[serde(default)]
    pub voice_enabled: Option<bool>,
}

impl NewUser {
    pub fn into_record(self, id: i64, now: DateTime<Utc>) -> User {
        User {
            id,
            username: self.username,
            email: self.email,
            name: self.name,
            role: self.role,
            preferred_agent: self.preferred_agent,
            voice_enabled: self.voice_enabled.unwrap_or(true),
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewConversation {
    pub user_id: i64,
    pub agent_id: AgentId,
    #[validate(length(min = 1))]
    pub message: String,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub emotional_state: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl NewConversation {
    pub fn into_record(self, id: i64, now: DateTime<Utc>) -> Conversation {
        Conversation {
            id,
            user_id: self.user_id,
            agent_id: self.agent_id,
            message: self.message,
            response: self.response,
            emotional_state: self.emotional_state,
            timestamp: now,
            metadata: self.metadata,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewFamilyConnection {
    pub elderly_user_id: i64,
    pub caregiver_user_id: i64,
    #[validate(length(min = 1))]
    pub relationship_type: String,
    #[serde(default)]
    pub last_contact_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub contact_frequency: Option<String>,
}

impl NewFamilyConnection {
    pub fn into_record(self, id: i64, now: DateTime<Utc>) -> FamilyConnection {
        FamilyConnection {
            id,
            elderly_user_id: self.elderly_user_id,
            caregiver_user_id: self.caregiver_user_id,
            relationship_type: self.relationship_type,
            last_contact_date: self.last_contact_date,
            contact_frequency: self
                .contact_frequency
                .unwrap_or_else(|| DEFAULT_CONTACT_FREQUENCY.to_string()),
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewMemory {
    pub family_id: i64,
    #[validate(length(min = 1))]
    pub title: String,
    pub description: String,
    #[validate(length(min = 1))]
    pub category: String,
    #[serde(default)]
    pub participants: Option<Vec<String>>,
    #[serde(default)]
    pub date_of_memory: Option<DateTime<Utc>>,
}

impl NewMemory {
    pub fn into_record(self, id: i64, now: DateTime<Utc>) -> Memory {
        Memory {
            id,
            family_id: self.family_id,
            title: self.title,
            description: self.description,
            category: self.category,
            participants: self.participants,
            date_of_memory: self.date_of_memory,
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewReminder {
    pub user_id: i64,
    #[validate(length(min = 1))]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[validate(length(min = 1))]
    pub reminder_type: String,
    pub scheduled_time: DateTime<Utc>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub care_coordination: Option<serde_json::Value>,
}

impl NewReminder {
    pub fn into_record(self, id: i64, now: DateTime<Utc>) -> Reminder {
        Reminder {
            id,
            user_id: self.user_id,
            title: self.title,
            description: self.description,
            reminder_type: self.reminder_type,
            scheduled_time: self.scheduled_time,
            completed: false,
            priority: self.priority.unwrap_or_default(),
            care_coordination: self.care_coordination,
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewCareNotification {
    pub elderly_user_id: i64,
    #[validate(length(min = 1))]
    pub notification_type: String,
    #[validate(length(min = 1))]
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub scheduled_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub care_provider: Option<String>,
    #[serde(default)]
    pub family_invited: Option<bool>,
    #[serde(default)]
    pub assistance_needed: Option<bool>,
    #[serde(default)]
    pub urgency_level: Option<UrgencyLevel>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl NewCareNotification {
    pub fn into_record(self, id: i64, now: DateTime<Utc>) -> CareNotification {
        CareNotification {
            id,
            elderly_user_id: self.elderly_user_id,
            notification_type: self.notification_type,
            title: self.title,
            description: self.description,
            scheduled_time: self.scheduled_time,
            care_provider: self.care_provider,
            family_invited: self.family_invited.unwrap_or(true),
            assistance_needed: self.assistance_needed.unwrap_or(false),
            urgency_level: self.urgency_level.unwrap_or_default(),
            metadata: self.metadata,
            notified_family_members: Vec::new(),
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewAgentCommunication {
    pub from_agent: AgentId,
    pub to_agent: AgentId,
    #[validate(length(min = 1))]
    pub message: String,
    #[serde(default)]
    pub context: Option<serde_json::Value>,
}

impl NewAgentCommunication {
    pub fn into_record(self, id: i64, now: DateTime<Utc>) -> AgentCommunication {
        AgentCommunication {
            id,
            from_agent: self.from_agent,
            to_agent: self.to_agent,
            message: self.message,
            context: self.context,
            timestamp: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewSleepSchedule {
    pub user_id: i64,
    #[validate(custom(function = "validate_bedtime"))]
    pub bedtime: String,
    #[validate(range(min = 1, max = 720))]
    pub duration: i32,
    #[validate(length(min = 1))]
    pub music_type: String,
    #[validate(range(min = 1, max = 1000))]
    pub binaural_frequency: i32,
    #[serde(default)]
    #[validate(range(min = 0, max = 100))]
    pub volume: Option<i32>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub music_preferences: Option<serde_json::Value>,
    #[serde(default)]
    pub sleep_goals: Option<Vec<String>>,
}

impl NewSleepSchedule {
    pub fn into_record(self, id: i64, now: DateTime<Utc>) -> SleepSchedule {
        SleepSchedule {
            id,
            user_id: self.user_id,
            bedtime: self.bedtime,
            duration: self.duration,
            music_type: self.music_type,
            binaural_frequency: self.binaural_frequency,
            volume: self.volume.unwrap_or(DEFAULT_VOLUME),
            is_active: self.is_active.unwrap_or(true),
            music_preferences: self.music_preferences,
            sleep_goals: self.sleep_goals,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of a sleep schedule; absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SleepScheduleUpdate {
    #[validate(custom(function = "validate_bedtime"))]
    pub bedtime: Option<String>,
    #[validate(range(min = 1, max = 720))]
    pub duration: Option<i32>,
    pub music_type: Option<String>,
    #[validate(range(min = 1, max = 1000))]
    pub binaural_frequency: Option<i32>,
    #[validate(range(min = 0, max = 100))]
    pub volume: Option<i32>,
    pub is_active: Option<bool>,
    pub music_preferences: Option<serde_json::Value>,
    pub sleep_goals: Option<Vec<String>>,
}

impl SleepScheduleUpdate {
    pub fn apply(self, schedule: &mut SleepSchedule, now: DateTime<Utc>) {
        if let Some(bedtime) = self.bedtime {
            schedule.bedtime = bedtime;
        }
        if let Some(duration) = self.duration {
            schedule.duration = duration;
        }
        if let Some(music_type) = self.music_type {
            schedule.music_type = music_type;
        }
        if let Some(freq) = self.binaural_frequency {
            schedule.binaural_frequency = freq;
        }
        if let Some(volume) = self.volume {
            schedule.volume = volume;
        }
        if let Some(active) = self.is_active {
            schedule.is_active = active;
        }
        if self.music_preferences.is_some() {
            schedule.music_preferences = self.music_preferences;
        }
        if self.sleep_goals.is_some() {
            schedule.sleep_goals = self.sleep_goals;
        }
        schedule.updated_at = now;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewPictureFrame {
    pub elderly_user_id: i64,
    #[validate(length(min = 1, max = 128))]
    pub device_id: String,
    #[validate(length(min = 1))]
    pub device_name: String,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    #[validate(range(min = 1, max = 3600))]
    pub display_duration: Option<i32>,
    #[serde(default)]
    #[validate(range(min = 0, max = 100))]
    pub brightness: Option<i32>,
    #[serde(default)]
    pub transition_effect: Option<String>,
}

impl NewPictureFrame {
    pub fn into_record(self, id: i64, now: DateTime<Utc>) -> PictureFrame {
        PictureFrame {
            id,
            elderly_user_id: self.elderly_user_id,
            device_id: self.device_id,
            device_name: self.device_name,
            is_active: self.is_active.unwrap_or(true),
            display_duration: self.display_duration.unwrap_or(DEFAULT_DISPLAY_DURATION),
            brightness: self.brightness.unwrap_or(DEFAULT_BRIGHTNESS),
            transition_effect: self
                .transition_effect
                .unwrap_or_else(|| DEFAULT_TRANSITION.to_string()),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PictureFrameUpdate {
    pub device_name: Option<String>,
    pub is_active: Option<bool>,
    #[validate(range(min = 1, max = 3600))]
    pub display_duration: Option<i32>,
    #[validate(range(min = 0, max = 100))]
    pub brightness: Option<i32>,
    pub transition_effect: Option<String>,
}

impl PictureFrameUpdate {
    pub fn apply(self, frame: &mut PictureFrame, now: DateTime<Utc>) {
        if let Some(name) = self.device_name {
            frame.device_name = name;
        }
        if let Some(active) = self.is_active {
            frame.is_active = active;
        }
        if let Some(duration) = self.display_duration {
            frame.display_duration = duration;
        }
        if let Some(brightness) = self.brightness {
            frame.brightness = brightness;
        }
        if let Some(effect) = self.transition_effect {
            frame.transition_effect = effect;
        }
        frame.updated_at = now;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewFamilyPhoto {
    pub picture_frame_id: i64,
    pub sender_user_id: i64,
    #[validate(length(min = 1))]
    pub photo_url: String,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub is_approved: Option<bool>,
    #[serde(default)]
    pub display_order: Option<i32>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl NewFamilyPhoto {
    pub fn into_record(self, id: i64, now: DateTime<Utc>) -> FamilyPhoto {
        FamilyPhoto {
            id,
            picture_frame_id: self.picture_frame_id,
            sender_user_id: self.sender_user_id,
            photo_url: self.photo_url,
            caption: self.caption,
            is_approved: self.is_approved.unwrap_or(true),
            display_order: self.display_order.unwrap_or(0),
            uploaded_at: now,
            sent_at: now,
            viewed_at: None,
            metadata: self.metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sleep_payload(bedtime: &str) -> NewSleepSchedule {
        NewSleepSchedule {
            user_id: 1,
            bedtime: bedtime.to_string(),
            duration: 60,
            music_type: "nature".into(),
            binaural_frequency: 8,
            volume: None,
            is_active: None,
            music_preferences: None,
            sleep_goals: None,
        }
    }

    #[test]
    fn test_bedtime_validation() {
        assert!(sleep_payload("21:30").validate().is_ok());
        assert!(sleep_payload("9pm").validate().is_err());
        assert!(sleep_payload("25:00").validate().is_err());
    }

    #[test]
    fn test_volume_range() {
        let mut payload = sleep_payload("22:00");
        payload.volume = Some(101);
        assert!(payload.validate().is_err());
    }

    #[test]
    fn test_sleep_defaults() {
        let record = sleep_payload("22:00").into_record(7, Utc::now());
        assert_eq!(record.id, 7);
        assert_eq!(record.volume, DEFAULT_VOLUME);
        assert!(record.is_active);
    }

    #[test]
    fn test_user_email_validation() {
        let user: NewUser = serde_json::from_value(serde_json::json!({
            "username": "margaret",
            "email": "not-an-email",
            "name": "Margaret",
            "role": "elderly"
        }))
        .unwrap();
        assert!(user.validate().is_err());
    }

    #[test]
    fn test_frame_defaults_and_update() {
        let now = Utc::now();
        let payload: NewPictureFrame = serde_json::from_value(serde_json::json!({
            "elderlyUserId": 1,
            "deviceId": "frame_001",
            "deviceName": "Living Room Frame"
        }))
        .unwrap();
        let mut frame = payload.into_record(1, now);
        assert_eq!(frame.display_duration, DEFAULT_DISPLAY_DURATION);
        assert_eq!(frame.brightness, DEFAULT_BRIGHTNESS);
        assert_eq!(frame.transition_effect, "fade");

        let later = now + chrono::Duration::minutes(1);
        PictureFrameUpdate {
            brightness: Some(40),
            ..Default::default()
        }
        .apply(&mut frame, later);
        assert_eq!(frame.brightness, 40);
        assert_eq!(frame.device_name, "Living Room Frame");
        assert_eq!(frame.updated_at, later);
    }

    #[test]
    fn test_reminder_default_priority() {
        let reminder = NewReminder {
            user_id: 1,
            title: "Doctor Appointment".into(),
            description: None,
            reminder_type: "appointment".into(),
            scheduled_time: Utc::now(),
            priority: None,
            care_coordination: None,
        }
        .into_record(1, Utc::now());
        assert_eq!(reminder.priority, Priority::Medium);
        assert!(!reminder.completed);
    }
}

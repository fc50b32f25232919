//! The storage contract shared by every backend

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kincare_types::*;

use crate::DbResult;

/// Default page size for conversation history
pub const DEFAULT_CONVERSATION_LIMIT: i64 = 50;
/// Default page size for agent communications
pub const DEFAULT_COMMUNICATION_LIMIT: i64 = 50;
/// Default page size for recent photos
pub const DEFAULT_PHOTO_LIMIT: i64 = 10;

/// Persistence operations for the family-care domain
///
/// Listing operations return an empty vector for unknown owners. Updates of a
/// missing row return [`crate::DbError::NotFound`].
#[async_trait]
pub trait Storage: Send + Sync {
    /// Backend name for logs and the readiness probe
    fn backend(&self) -> &'static str;

    async fn health_check(&self) -> DbResult<()>;

    // Users
    async fn user_count(&self) -> DbResult<i64>;
    async fn get_user(&self, id: i64) -> DbResult<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> DbResult<Option<User>>;
    async fn create_user(&self, user: NewUser) -> DbResult<User>;

    // Conversations, newest first
    async fn get_conversations(&self, user_id: i64, limit: i64) -> DbResult<Vec<Conversation>>;
    async fn get_conversations_by_agent(
        &self,
        agent_id: AgentId,
        limit: i64,
    ) -> DbResult<Vec<Conversation>>;
    async fn create_conversation(&self, conversation: NewConversation) -> DbResult<Conversation>;

    // Family connections, matched on either side
    async fn get_family_connections(&self, user_id: i64) -> DbResult<Vec<FamilyConnection>>;
    async fn create_family_connection(
        &self,
        connection: NewFamilyConnection,
    ) -> DbResult<FamilyConnection>;
    async fn update_last_contact(&self, connection_id: i64) -> DbResult<FamilyConnection>;

    // Memories, newest `date_of_memory` first
    async fn get_memories(&self, family_id: i64) -> DbResult<Vec<Memory>>;
    async fn get_memories_by_category(
        &self,
        family_id: i64,
        category: &str,
    ) -> DbResult<Vec<Memory>>;
    async fn create_memory(&self, memory: NewMemory) -> DbResult<Memory>;

    // Reminders, earliest first
    async fn get_reminders(&self, user_id: i64) -> DbResult<Vec<Reminder>>;
    /// Reminders not yet completed whose time is at or before `now`
    async fn get_pending_reminders(
        &self,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> DbResult<Vec<Reminder>>;
    async fn create_reminder(&self, reminder: NewReminder) -> DbResult<Reminder>;
    async fn complete_reminder(&self, id: i64) -> DbResult<Reminder>;

    // Care notifications, earliest first
    async fn get_care_notifications(&self, elderly_user_id: i64)
        -> DbResult<Vec<CareNotification>>;
    async fn create_care_notification(
        &self,
        notification: NewCareNotification,
    ) -> DbResult<CareNotification>;
    async fn update_care_notification_family_notified(
        &self,
        id: i64,
        family_member_ids: &[i64],
    ) -> DbResult<CareNotification>;

    // Agent communications, newest first
    async fn get_agent_communications(&self, limit: i64) -> DbResult<Vec<AgentCommunication>>;
    async fn create_agent_communication(
        &self,
        communication: NewAgentCommunication,
    ) -> DbResult<AgentCommunication>;

    // Sleep schedules
    async fn get_sleep_schedule(&self, user_id: i64) -> DbResult<Option<SleepSchedule>>;
    async fn create_sleep_schedule(&self, schedule: NewSleepSchedule) -> DbResult<SleepSchedule>;
    async fn update_sleep_schedule(
        &self,
        id: i64,
        update: SleepScheduleUpdate,
    ) -> DbResult<SleepSchedule>;
    /// Mark the user's schedule active; `None` when the user has none
    async fn activate_sleep_schedule(&self, user_id: i64) -> DbResult<Option<SleepSchedule>>;

    // Picture frames
    async fn get_picture_frame(&self, elderly_user_id: i64) -> DbResult<Option<PictureFrame>>;
    async fn get_picture_frame_by_id(&self, id: i64) -> DbResult<Option<PictureFrame>>;
    async fn create_picture_frame(&self, frame: NewPictureFrame) -> DbResult<PictureFrame>;
    async fn update_picture_frame(
        &self,
        id: i64,
        update: PictureFrameUpdate,
    ) -> DbResult<PictureFrame>;

    // Family photos, newest `sent_at` first
    async fn get_family_photos(&self, picture_frame_id: i64) -> DbResult<Vec<FamilyPhoto>>;
    async fn create_family_photo(&self, photo: NewFamilyPhoto) -> DbResult<FamilyPhoto>;
    async fn delete_family_photo(&self, id: i64) -> DbResult<()>;
    async fn mark_photo_viewed(&self, id: i64) -> DbResult<FamilyPhoto>;

    /// Photos on the elderly user's frame; empty when they have no frame
    async fn get_recent_photos(&self, elderly_user_id: i64, limit: i64) -> DbResult<Vec<FamilyPhoto>> {
        match self.get_picture_frame(elderly_user_id).await? {
            Some(frame) => {
                let mut photos = self.get_family_photos(frame.id).await?;
                photos.truncate(limit.max(0) as usize);
                Ok(photos)
            }
            None => Ok(Vec::new()),
        }
    }
}

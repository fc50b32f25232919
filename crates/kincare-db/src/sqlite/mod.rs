//! SQLite storage backend

mod rows;

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kincare_types::*;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::store::Storage;
use crate::{DatabaseConfig, DbError, DbResult};

pub use rows::*;
use rows::{convert_all, to_json, to_millis};

/// SQLite-backed store
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect and run migrations
    pub async fn connect(config: &DatabaseConfig) -> DbResult<Self> {
        info!("Connecting to SQLite: {}", config.url_masked());

        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| DbError::Connection(e.to_string()))?
            .create_if_missing(true)
            .foreign_keys(true);

        // Every connection to `:memory:` opens its own database, so the pool
        // must hold exactly one connection and never recycle it.
        let mut pool_options = SqlitePoolOptions::new()
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs));
        pool_options = if config.is_in_memory_sqlite() {
            pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            pool_options.max_connections(config.max_connections)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| DbError::Connection(format!("SQLite: {}", e)))?;

        let store = Self { pool };
        store.migrate().await?;
        info!("Connected to SQLite");
        Ok(store)
    }

    /// Run database migrations
    pub async fn migrate(&self) -> DbResult<()> {
        info!("Running database migrations...");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DbError::Migration(e.to_string()))?;
        info!("Migrations complete");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn fetch_sleep_schedule(&self, id: i64) -> DbResult<SleepSchedule> {
        let row = sqlx::query_as::<_, DbSleepSchedule>("SELECT * FROM sleep_schedules WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("sleep schedule {}", id)))?;
        row.try_into()
    }

    async fn fetch_picture_frame(&self, id: i64) -> DbResult<PictureFrame> {
        self.get_picture_frame_by_id(id)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("picture frame {}", id)))
    }
}

#[async_trait]
impl Storage for SqliteStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn health_check(&self) -> DbResult<()> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }

    async fn user_count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn get_user(&self, id: i64) -> DbResult<Option<User>> {
        sqlx::query_as::<_, DbUser>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn get_user_by_email(&self, email: &str) -> DbResult<Option<User>> {
        sqlx::query_as::<_, DbUser>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn create_user(&self, user: NewUser) -> DbResult<User> {
        let record = user.into_record(0, Utc::now());
        let row = sqlx::query_as::<_, DbUser>(
            r#"
            INSERT INTO users (username, email, name, role, preferred_agent, voice_enabled, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&record.username)
        .bind(&record.email)
        .bind(&record.name)
        .bind(record.role.as_str())
        .bind(record.preferred_agent.map(|a| a.as_str()))
        .bind(record.voice_enabled)
        .bind(to_millis(record.created_at))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DbError::from_insert(e, &format!("user {}", record.email)))?;
        row.try_into()
    }

    async fn get_conversations(&self, user_id: i64, limit: i64) -> DbResult<Vec<Conversation>> {
        let rows = sqlx::query_as::<_, DbConversation>(
            "SELECT * FROM conversations WHERE user_id = ? ORDER BY timestamp DESC, id DESC LIMIT ?",
        )
        .bind(user_id)
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn get_conversations_by_agent(
        &self,
        agent_id: AgentId,
        limit: i64,
    ) -> DbResult<Vec<Conversation>> {
        let rows = sqlx::query_as::<_, DbConversation>(
            "SELECT * FROM conversations WHERE agent_id = ? ORDER BY timestamp DESC, id DESC LIMIT ?",
        )
        .bind(agent_id.as_str())
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn create_conversation(&self, conversation: NewConversation) -> DbResult<Conversation> {
        let record = conversation.into_record(0, Utc::now());
        let row = sqlx::query_as::<_, DbConversation>(
            r#"
            INSERT INTO conversations (user_id, agent_id, message, response, emotional_state, timestamp, metadata)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(record.user_id)
        .bind(record.agent_id.as_str())
        .bind(&record.message)
        .bind(&record.response)
        .bind(&record.emotional_state)
        .bind(to_millis(record.timestamp))
        .bind(to_json(&record.metadata)?)
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn get_family_connections(&self, user_id: i64) -> DbResult<Vec<FamilyConnection>> {
        let rows = sqlx::query_as::<_, DbFamilyConnection>(
            "SELECT * FROM family_connections WHERE elderly_user_id = ?1 OR caregiver_user_id = ?1 ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn create_family_connection(
        &self,
        connection: NewFamilyConnection,
    ) -> DbResult<FamilyConnection> {
        let record = connection.into_record(0, Utc::now());
        let row = sqlx::query_as::<_, DbFamilyConnection>(
            r#"
            INSERT INTO family_connections
                (elderly_user_id, caregiver_user_id, relationship_type, last_contact_date, contact_frequency, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(record.elderly_user_id)
        .bind(record.caregiver_user_id)
        .bind(&record.relationship_type)
        .bind(record.last_contact_date.map(to_millis))
        .bind(&record.contact_frequency)
        .bind(to_millis(record.created_at))
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn update_last_contact(&self, connection_id: i64) -> DbResult<FamilyConnection> {
        sqlx::query_as::<_, DbFamilyConnection>(
            "UPDATE family_connections SET last_contact_date = ? WHERE id = ? RETURNING *",
        )
        .bind(to_millis(Utc::now()))
        .bind(connection_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound(format!("family connection {}", connection_id)))?
        .try_into()
    }

    async fn get_memories(&self, family_id: i64) -> DbResult<Vec<Memory>> {
        let rows = sqlx::query_as::<_, DbMemory>(
            "SELECT * FROM memories WHERE family_id = ? ORDER BY COALESCE(date_of_memory, 0) DESC, id DESC",
        )
        .bind(family_id)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn get_memories_by_category(
        &self,
        family_id: i64,
        category: &str,
    ) -> DbResult<Vec<Memory>> {
        let rows = sqlx::query_as::<_, DbMemory>(
            "SELECT * FROM memories WHERE family_id = ? AND category = ? ORDER BY id",
        )
        .bind(family_id)
        .bind(category)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn create_memory(&self, memory: NewMemory) -> DbResult<Memory> {
        let record = memory.into_record(0, Utc::now());
        let row = sqlx::query_as::<_, DbMemory>(
            r#"
            INSERT INTO memories (family_id, title, description, category, participants, date_of_memory, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(record.family_id)
        .bind(&record.title)
        .bind(&record.description)
        .bind(&record.category)
        .bind(to_json(&record.participants)?)
        .bind(record.date_of_memory.map(to_millis))
        .bind(to_millis(record.created_at))
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn get_reminders(&self, user_id: i64) -> DbResult<Vec<Reminder>> {
        let rows = sqlx::query_as::<_, DbReminder>(
            "SELECT * FROM reminders WHERE user_id = ? ORDER BY scheduled_time ASC, id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn get_pending_reminders(
        &self,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> DbResult<Vec<Reminder>> {
        let rows = sqlx::query_as::<_, DbReminder>(
            r#"
            SELECT * FROM reminders
            WHERE user_id = ? AND completed = 0 AND scheduled_time <= ?
            ORDER BY scheduled_time ASC, id ASC
            "#,
        )
        .bind(user_id)
        .bind(to_millis(now))
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn create_reminder(&self, reminder: NewReminder) -> DbResult<Reminder> {
        let record = reminder.into_record(0, Utc::now());
        let row = sqlx::query_as::<_, DbReminder>(
            r#"
            INSERT INTO reminders
                (user_id, title, description, reminder_type, scheduled_time, completed, priority, care_coordination, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(record.user_id)
        .bind(&record.title)
        .bind(&record.description)
        .bind(&record.reminder_type)
        .bind(to_millis(record.scheduled_time))
        .bind(record.completed)
        .bind(record.priority.as_str())
        .bind(to_json(&record.care_coordination)?)
        .bind(to_millis(record.created_at))
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn complete_reminder(&self, id: i64) -> DbResult<Reminder> {
        sqlx::query_as::<_, DbReminder>("UPDATE reminders SET completed = 1 WHERE id = ? RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("reminder {}", id)))?
            .try_into()
    }

    async fn get_care_notifications(
        &self,
        elderly_user_id: i64,
    ) -> DbResult<Vec<CareNotification>> {
        let rows = sqlx::query_as::<_, DbCareNotification>(
            "SELECT * FROM care_notifications WHERE elderly_user_id = ? ORDER BY COALESCE(scheduled_time, 0) ASC, id ASC",
        )
        .bind(elderly_user_id)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn create_care_notification(
        &self,
        notification: NewCareNotification,
    ) -> DbResult<CareNotification> {
        let record = notification.into_record(0, Utc::now());
        let row = sqlx::query_as::<_, DbCareNotification>(
            r#"
            INSERT INTO care_notifications
                (elderly_user_id, notification_type, title, description, scheduled_time, care_provider,
                 family_invited, assistance_needed, urgency_level, metadata, notified_family_members, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(record.elderly_user_id)
        .bind(&record.notification_type)
        .bind(&record.title)
        .bind(&record.description)
        .bind(record.scheduled_time.map(to_millis))
        .bind(&record.care_provider)
        .bind(record.family_invited)
        .bind(record.assistance_needed)
        .bind(record.urgency_level.as_str())
        .bind(to_json(&record.metadata)?)
        .bind(serde_json::to_string(&record.notified_family_members)?)
        .bind(to_millis(record.created_at))
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn update_care_notification_family_notified(
        &self,
        id: i64,
        family_member_ids: &[i64],
    ) -> DbResult<CareNotification> {
        let members: Vec<String> = family_member_ids.iter().map(|id| id.to_string()).collect();
        sqlx::query_as::<_, DbCareNotification>(
            "UPDATE care_notifications SET notified_family_members = ? WHERE id = ? RETURNING *",
        )
        .bind(serde_json::to_string(&members)?)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound(format!("care notification {}", id)))?
        .try_into()
    }

    async fn get_agent_communications(&self, limit: i64) -> DbResult<Vec<AgentCommunication>> {
        let rows = sqlx::query_as::<_, DbAgentCommunication>(
            "SELECT * FROM agent_communications ORDER BY timestamp DESC, id DESC LIMIT ?",
        )
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn create_agent_communication(
        &self,
        communication: NewAgentCommunication,
    ) -> DbResult<AgentCommunication> {
        let record = communication.into_record(0, Utc::now());
        let row = sqlx::query_as::<_, DbAgentCommunication>(
            r#"
            INSERT INTO agent_communications (from_agent, to_agent, message, context, timestamp)
            VALUES (?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(record.from_agent.as_str())
        .bind(record.to_agent.as_str())
        .bind(&record.message)
        .bind(to_json(&record.context)?)
        .bind(to_millis(record.timestamp))
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn get_sleep_schedule(&self, user_id: i64) -> DbResult<Option<SleepSchedule>> {
        sqlx::query_as::<_, DbSleepSchedule>(
            "SELECT * FROM sleep_schedules WHERE user_id = ? ORDER BY id LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .map(SleepSchedule::try_from)
        .transpose()
    }

    async fn create_sleep_schedule(&self, schedule: NewSleepSchedule) -> DbResult<SleepSchedule> {
        let record = schedule.into_record(0, Utc::now());
        let row = sqlx::query_as::<_, DbSleepSchedule>(
            r#"
            INSERT INTO sleep_schedules
                (user_id, bedtime, duration, music_type, binaural_frequency, volume, is_active,
                 music_preferences, sleep_goals, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(record.user_id)
        .bind(&record.bedtime)
        .bind(record.duration)
        .bind(&record.music_type)
        .bind(record.binaural_frequency)
        .bind(record.volume)
        .bind(record.is_active)
        .bind(to_json(&record.music_preferences)?)
        .bind(to_json(&record.sleep_goals)?)
        .bind(to_millis(record.created_at))
        .bind(to_millis(record.updated_at))
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn update_sleep_schedule(
        &self,
        id: i64,
        update: SleepScheduleUpdate,
    ) -> DbResult<SleepSchedule> {
        let mut schedule = self.fetch_sleep_schedule(id).await?;
        update.apply(&mut schedule, Utc::now());

        sqlx::query_as::<_, DbSleepSchedule>(
            r#"
            UPDATE sleep_schedules
            SET bedtime = ?, duration = ?, music_type = ?, binaural_frequency = ?, volume = ?,
                is_active = ?, music_preferences = ?, sleep_goals = ?, updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&schedule.bedtime)
        .bind(schedule.duration)
        .bind(&schedule.music_type)
        .bind(schedule.binaural_frequency)
        .bind(schedule.volume)
        .bind(schedule.is_active)
        .bind(to_json(&schedule.music_preferences)?)
        .bind(to_json(&schedule.sleep_goals)?)
        .bind(to_millis(schedule.updated_at))
        .bind(id)
        .fetch_one(&self.pool)
        .await?
        .try_into()
    }

    async fn activate_sleep_schedule(&self, user_id: i64) -> DbResult<Option<SleepSchedule>> {
        let Some(schedule) = self.get_sleep_schedule(user_id).await? else {
            return Ok(None);
        };
        let update = SleepScheduleUpdate {
            is_active: Some(true),
            ..Default::default()
        };
        self.update_sleep_schedule(schedule.id, update).await.map(Some)
    }

    async fn get_picture_frame(&self, elderly_user_id: i64) -> DbResult<Option<PictureFrame>> {
        sqlx::query_as::<_, DbPictureFrame>(
            "SELECT * FROM picture_frames WHERE elderly_user_id = ? ORDER BY id LIMIT 1",
        )
        .bind(elderly_user_id)
        .fetch_optional(&self.pool)
        .await?
        .map(PictureFrame::try_from)
        .transpose()
    }

    async fn get_picture_frame_by_id(&self, id: i64) -> DbResult<Option<PictureFrame>> {
        sqlx::query_as::<_, DbPictureFrame>("SELECT * FROM picture_frames WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(PictureFrame::try_from)
            .transpose()
    }

    async fn create_picture_frame(&self, frame: NewPictureFrame) -> DbResult<PictureFrame> {
        let record = frame.into_record(0, Utc::now());
        let row = sqlx::query_as::<_, DbPictureFrame>(
            r#"
            INSERT INTO picture_frames
                (elderly_user_id, device_id, device_name, is_active, display_duration, brightness,
                 transition_effect, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(record.elderly_user_id)
        .bind(&record.device_id)
        .bind(&record.device_name)
        .bind(record.is_active)
        .bind(record.display_duration)
        .bind(record.brightness)
        .bind(&record.transition_effect)
        .bind(to_millis(record.created_at))
        .bind(to_millis(record.updated_at))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DbError::from_insert(e, &format!("device {}", record.device_id)))?;
        row.try_into()
    }

    async fn update_picture_frame(
        &self,
        id: i64,
        update: PictureFrameUpdate,
    ) -> DbResult<PictureFrame> {
        let mut frame = self.fetch_picture_frame(id).await?;
        update.apply(&mut frame, Utc::now());

        sqlx::query_as::<_, DbPictureFrame>(
            r#"
            UPDATE picture_frames
            SET device_name = ?, is_active = ?, display_duration = ?, brightness = ?,
                transition_effect = ?, updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&frame.device_name)
        .bind(frame.is_active)
        .bind(frame.display_duration)
        .bind(frame.brightness)
        .bind(&frame.transition_effect)
        .bind(to_millis(frame.updated_at))
        .bind(id)
        .fetch_one(&self.pool)
        .await?
        .try_into()
    }

    async fn get_family_photos(&self, picture_frame_id: i64) -> DbResult<Vec<FamilyPhoto>> {
        let rows = sqlx::query_as::<_, DbFamilyPhoto>(
            "SELECT * FROM family_photos WHERE picture_frame_id = ? ORDER BY sent_at DESC, id DESC",
        )
        .bind(picture_frame_id)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn create_family_photo(&self, photo: NewFamilyPhoto) -> DbResult<FamilyPhoto> {
        let record = photo.into_record(0, Utc::now());
        let row = sqlx::query_as::<_, DbFamilyPhoto>(
            r#"
            INSERT INTO family_photos
                (picture_frame_id, sender_user_id, photo_url, caption, is_approved, display_order,
                 uploaded_at, sent_at, viewed_at, metadata)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(record.picture_frame_id)
        .bind(record.sender_user_id)
        .bind(&record.photo_url)
        .bind(&record.caption)
        .bind(record.is_approved)
        .bind(record.display_order)
        .bind(to_millis(record.uploaded_at))
        .bind(to_millis(record.sent_at))
        .bind(record.viewed_at.map(to_millis))
        .bind(to_json(&record.metadata)?)
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn delete_family_photo(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM family_photos WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("family photo {}", id)));
        }
        Ok(())
    }

    async fn mark_photo_viewed(&self, id: i64) -> DbResult<FamilyPhoto> {
        sqlx::query_as::<_, DbFamilyPhoto>(
            "UPDATE family_photos SET viewed_at = ? WHERE id = ? RETURNING *",
        )
        .bind(to_millis(Utc::now()))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound(format!("family photo {}", id)))?
        .try_into()
    }
}

//! Process-local storage backend

use std::cmp::Reverse;
use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kincare_types::*;
use parking_lot::RwLock;

use crate::store::Storage;
use crate::{DbError, DbResult};

/// One table: rows keyed by id plus the next id to hand out
#[derive(Debug)]
struct Table<T> {
    rows: BTreeMap<i64, T>,
    next_id: i64,
}

impl<T: Clone> Table<T> {
    fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }

    fn insert_with(&mut self, build: impl FnOnce(i64) -> T) -> T {
        let id = self.next_id;
        self.next_id += 1;
        let row = build(id);
        self.rows.insert(id, row.clone());
        row
    }

    fn filtered(&self, pred: impl Fn(&T) -> bool) -> Vec<T> {
        self.rows.values().filter(|r| pred(r)).cloned().collect()
    }

    fn update(&mut self, id: i64, what: &str, f: impl FnOnce(&mut T)) -> DbResult<T> {
        let row = self
            .rows
            .get_mut(&id)
            .ok_or_else(|| DbError::NotFound(format!("{} {}", what, id)))?;
        f(row);
        Ok(row.clone())
    }
}

#[derive(Debug)]
struct Tables {
    users: Table<User>,
    conversations: Table<Conversation>,
    connections: Table<FamilyConnection>,
    memories: Table<Memory>,
    reminders: Table<Reminder>,
    care_notifications: Table<CareNotification>,
    communications: Table<AgentCommunication>,
    sleep_schedules: Table<SleepSchedule>,
    frames: Table<PictureFrame>,
    photos: Table<FamilyPhoto>,
}

/// In-memory store; the default backend and the one tests run against
#[derive(Debug)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables {
                users: Table::new(),
                conversations: Table::new(),
                connections: Table::new(),
                memories: Table::new(),
                reminders: Table::new(),
                care_notifications: Table::new(),
                communications: Table::new(),
                sleep_schedules: Table::new(),
                frames: Table::new(),
                photos: Table::new(),
            }),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Missing timestamps sort as the epoch
fn or_epoch(ts: Option<DateTime<Utc>>) -> DateTime<Utc> {
    ts.unwrap_or_default()
}

fn take(limit: i64) -> usize {
    limit.max(0) as usize
}

#[async_trait]
impl Storage for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn health_check(&self) -> DbResult<()> {
        Ok(())
    }

    async fn user_count(&self) -> DbResult<i64> {
        Ok(self.tables.read().users.rows.len() as i64)
    }

    async fn get_user(&self, id: i64) -> DbResult<Option<User>> {
        Ok(self.tables.read().users.rows.get(&id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> DbResult<Option<User>> {
        Ok(self
            .tables
            .read()
            .users
            .rows
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn create_user(&self, user: NewUser) -> DbResult<User> {
        let mut tables = self.tables.write();
        let clash = tables
            .users
            .rows
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email) || u.username == user.username);
        if clash {
            return Err(DbError::Duplicate(format!("user {}", user.email)));
        }
        let now = Utc::now();
        Ok(tables.users.insert_with(|id| user.into_record(id, now)))
    }

    async fn get_conversations(&self, user_id: i64, limit: i64) -> DbResult<Vec<Conversation>> {
        let mut rows = self
            .tables
            .read()
            .conversations
            .filtered(|c| c.user_id == user_id);
        rows.sort_by_key(|c| Reverse((c.timestamp, c.id)));
        rows.truncate(take(limit));
        Ok(rows)
    }

    async fn get_conversations_by_agent(
        &self,
        agent_id: AgentId,
        limit: i64,
    ) -> DbResult<Vec<Conversation>> {
        let mut rows = self
            .tables
            .read()
            .conversations
            .filtered(|c| c.agent_id == agent_id);
        rows.sort_by_key(|c| Reverse((c.timestamp, c.id)));
        rows.truncate(take(limit));
        Ok(rows)
    }

    async fn create_conversation(&self, conversation: NewConversation) -> DbResult<Conversation> {
        let now = Utc::now();
        Ok(self
            .tables
            .write()
            .conversations
            .insert_with(|id| conversation.into_record(id, now)))
    }

    async fn get_family_connections(&self, user_id: i64) -> DbResult<Vec<FamilyConnection>> {
        Ok(self
            .tables
            .read()
            .connections
            .filtered(|c| c.involves(user_id)))
    }

    async fn create_family_connection(
        &self,
        connection: NewFamilyConnection,
    ) -> DbResult<FamilyConnection> {
        let now = Utc::now();
        Ok(self
            .tables
            .write()
            .connections
            .insert_with(|id| connection.into_record(id, now)))
    }

    async fn update_last_contact(&self, connection_id: i64) -> DbResult<FamilyConnection> {
        let now = Utc::now();
        self.tables
            .write()
            .connections
            .update(connection_id, "family connection", |c| {
                c.last_contact_date = Some(now)
            })
    }

    async fn get_memories(&self, family_id: i64) -> DbResult<Vec<Memory>> {
        let mut rows = self
            .tables
            .read()
            .memories
            .filtered(|m| m.family_id == family_id);
        rows.sort_by_key(|m| Reverse((or_epoch(m.date_of_memory), m.id)));
        Ok(rows)
    }

    async fn get_memories_by_category(
        &self,
        family_id: i64,
        category: &str,
    ) -> DbResult<Vec<Memory>> {
        Ok(self
            .tables
            .read()
            .memories
            .filtered(|m| m.family_id == family_id && m.category == category))
    }

    async fn create_memory(&self, memory: NewMemory) -> DbResult<Memory> {
        let now = Utc::now();
        Ok(self
            .tables
            .write()
            .memories
            .insert_with(|id| memory.into_record(id, now)))
    }

    async fn get_reminders(&self, user_id: i64) -> DbResult<Vec<Reminder>> {
        let mut rows = self
            .tables
            .read()
            .reminders
            .filtered(|r| r.user_id == user_id);
        rows.sort_by_key(|r| (r.scheduled_time, r.id));
        Ok(rows)
    }

    async fn get_pending_reminders(
        &self,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> DbResult<Vec<Reminder>> {
        let mut rows = self
            .tables
            .read()
            .reminders
            .filtered(|r| r.user_id == user_id && r.is_pending_at(now));
        rows.sort_by_key(|r| (r.scheduled_time, r.id));
        Ok(rows)
    }

    async fn create_reminder(&self, reminder: NewReminder) -> DbResult<Reminder> {
        let now = Utc::now();
        Ok(self
            .tables
            .write()
            .reminders
            .insert_with(|id| reminder.into_record(id, now)))
    }

    async fn complete_reminder(&self, id: i64) -> DbResult<Reminder> {
        self.tables
            .write()
            .reminders
            .update(id, "reminder", |r| r.completed = true)
    }

    async fn get_care_notifications(
        &self,
        elderly_user_id: i64,
    ) -> DbResult<Vec<CareNotification>> {
        let mut rows = self
            .tables
            .read()
            .care_notifications
            .filtered(|n| n.elderly_user_id == elderly_user_id);
        rows.sort_by_key(|n| (or_epoch(n.scheduled_time), n.id));
        Ok(rows)
    }

    async fn create_care_notification(
        &self,
        notification: NewCareNotification,
    ) -> DbResult<CareNotification> {
        let now = Utc::now();
        Ok(self
            .tables
            .write()
            .care_notifications
            .insert_with(|id| notification.into_record(id, now)))
    }

    async fn update_care_notification_family_notified(
        &self,
        id: i64,
        family_member_ids: &[i64],
    ) -> DbResult<CareNotification> {
        let members: Vec<String> = family_member_ids.iter().map(|id| id.to_string()).collect();
        self.tables
            .write()
            .care_notifications
            .update(id, "care notification", |n| {
                n.notified_family_members = members
            })
    }

    async fn get_agent_communications(&self, limit: i64) -> DbResult<Vec<AgentCommunication>> {
        let mut rows = self.tables.read().communications.filtered(|_| true);
        rows.sort_by_key(|c| Reverse((c.timestamp, c.id)));
        rows.truncate(take(limit));
        Ok(rows)
    }

    async fn create_agent_communication(
        &self,
        communication: NewAgentCommunication,
    ) -> DbResult<AgentCommunication> {
        let now = Utc::now();
        Ok(self
            .tables
            .write()
            .communications
            .insert_with(|id| communication.into_record(id, now)))
    }

    async fn get_sleep_schedule(&self, user_id: i64) -> DbResult<Option<SleepSchedule>> {
        Ok(self
            .tables
            .read()
            .sleep_schedules
            .rows
            .values()
            .find(|s| s.user_id == user_id)
            .cloned())
    }

    async fn create_sleep_schedule(&self, schedule: NewSleepSchedule) -> DbResult<SleepSchedule> {
        let now = Utc::now();
        Ok(self
            .tables
            .write()
            .sleep_schedules
            .insert_with(|id| schedule.into_record(id, now)))
    }

    async fn update_sleep_schedule(
        &self,
        id: i64,
        update: SleepScheduleUpdate,
    ) -> DbResult<SleepSchedule> {
        let now = Utc::now();
        self.tables
            .write()
            .sleep_schedules
            .update(id, "sleep schedule", |s| update.apply(s, now))
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
        Ok(self
            .tables
            .read()
            .frames
            .rows
            .values()
            .find(|f| f.elderly_user_id == elderly_user_id)
            .cloned())
    }

    async fn get_picture_frame_by_id(&self, id: i64) -> DbResult<Option<PictureFrame>> {
        Ok(self.tables.read().frames.rows.get(&id).cloned())
    }

    async fn create_picture_frame(&self, frame: NewPictureFrame) -> DbResult<PictureFrame> {
        let mut tables = self.tables.write();
        if tables.frames.rows.values().any(|f| f.device_id == frame.device_id) {
            return Err(DbError::Duplicate(format!("device {}", frame.device_id)));
        }
        let now = Utc::now();
        Ok(tables.frames.insert_with(|id| frame.into_record(id, now)))
    }

    async fn update_picture_frame(
        &self,
        id: i64,
        update: PictureFrameUpdate,
    ) -> DbResult<PictureFrame> {
        let now = Utc::now();
        self.tables
            .write()
            .frames
            .update(id, "picture frame", |f| update.apply(f, now))
    }

    async fn get_family_photos(&self, picture_frame_id: i64) -> DbResult<Vec<FamilyPhoto>> {
        let mut rows = self
            .tables
            .read()
            .photos
            .filtered(|p| p.picture_frame_id == picture_frame_id);
        rows.sort_by_key(|p| Reverse((p.sent_at, p.id)));
        Ok(rows)
    }

    async fn create_family_photo(&self, photo: NewFamilyPhoto) -> DbResult<FamilyPhoto> {
        let now = Utc::now();
        Ok(self
            .tables
            .write()
            .photos
            .insert_with(|id| photo.into_record(id, now)))
    }

    async fn delete_family_photo(&self, id: i64) -> DbResult<()> {
        self.tables
            .write()
            .photos
            .rows
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| DbError::NotFound(format!("family photo {}", id)))
    }

    async fn mark_photo_viewed(&self, id: i64) -> DbResult<FamilyPhoto> {
        let now = Utc::now();
        self.tables
            .write()
            .photos
            .update(id, "family photo", |p| p.viewed_at = Some(now))
    }
}

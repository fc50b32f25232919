//! SQLite backend tests against an in-memory database

use chrono::{Duration, Utc};
use kincare_db::*;
use kincare_types::*;

async fn store() -> SqliteStore {
    SqliteStore::connect(&DatabaseConfig::sqlite_in_memory())
        .await
        .expect("in-memory sqlite")
}

#[tokio::test]
async fn test_seed_and_read_back() {
    let store = store().await;
    let household = seed_demo_data(&store)
        .await
        .unwrap()
        .expect("empty store is seeded");

    let margaret = store
        .get_user_by_email("margaret@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(margaret.id, household.elderly_user_id);
    assert_eq!(margaret.role, UserRole::Elderly);
    assert_eq!(margaret.preferred_agent, Some(AgentId::Grace));

    let connections = store
        .get_family_connections(household.caregiver_user_id)
        .await
        .unwrap();
    assert_eq!(connections.len(), 1);
    assert_eq!(connections[0].relationship_type, "child");

    let memories = store.get_memories(household.connection_id).await.unwrap();
    assert_eq!(memories[0].title, "Tommy's Soccer Game");
    assert_eq!(
        memories[0].participants.as_deref(),
        Some(&["1".to_string(), "2".to_string()][..])
    );

    let notifications = store
        .get_care_notifications(household.elderly_user_id)
        .await
        .unwrap();
    assert_eq!(notifications.len(), 1);
    assert!(notifications[0].assistance_needed);
    assert_eq!(
        notifications[0].metadata.as_ref().unwrap()["therapistName"],
        "Dr. Sarah Kim"
    );

    let photos = store
        .get_recent_photos(household.elderly_user_id, 2)
        .await
        .unwrap();
    assert_eq!(photos.len(), 2);

    // Second seed is a no-op
    assert!(seed_demo_data(&store).await.unwrap().is_none());
}

#[tokio::test]
async fn test_duplicate_email_is_rejected() {
    let store = store().await;
    let user = NewUser {
        username: "margaret_smith".into(),
        email: "margaret@example.com".into(),
        name: "Margaret Smith".into(),
        role: UserRole::Elderly,
        preferred_agent: None,
        voice_enabled: None,
    };
    store.create_user(user.clone()).await.unwrap();

    let mut again = user;
    again.username = "margaret2".into();
    again.email = "MARGARET@example.com".into();
    assert!(matches!(
        store.create_user(again).await,
        Err(DbError::Duplicate(_))
    ));
}

#[tokio::test]
async fn test_pending_reminders_and_completion() {
    let store = store().await;
    let now = Utc::now();
    let due = store
        .create_reminder(NewReminder {
            user_id: 1,
            title: "Take blood pressure pill".into(),
            description: None,
            reminder_type: "medication".into(),
            scheduled_time: now - Duration::minutes(10),
            priority: Some(Priority::High),
            care_coordination: Some(serde_json::json!({ "careProvider": "Dr. Williams" })),
        })
        .await
        .unwrap();
    store
        .create_reminder(NewReminder {
            user_id: 1,
            title: "Call Sarah".into(),
            description: None,
            reminder_type: "social".into(),
            scheduled_time: now + Duration::hours(3),
            priority: None,
            care_coordination: None,
        })
        .await
        .unwrap();

    let pending = store.get_pending_reminders(1, now).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].priority, Priority::High);
    assert_eq!(
        pending[0].care_coordination.as_ref().unwrap()["careProvider"],
        "Dr. Williams"
    );

    let done = store.complete_reminder(due.id).await.unwrap();
    assert!(done.completed);
    assert!(store.get_pending_reminders(1, now).await.unwrap().is_empty());
    assert!(matches!(
        store.complete_reminder(999).await,
        Err(DbError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_sleep_schedule_update_and_activate() {
    let store = store().await;
    let schedule = store
        .create_sleep_schedule(NewSleepSchedule {
            user_id: 1,
            bedtime: "21:30".into(),
            duration: 45,
            music_type: "ocean".into(),
            binaural_frequency: 6,
            volume: None,
            is_active: Some(false),
            music_preferences: None,
            sleep_goals: Some(vec!["fall asleep faster".into()]),
        })
        .await
        .unwrap();
    assert_eq!(schedule.volume, 50);
    assert!(!schedule.is_active);

    let updated = store
        .update_sleep_schedule(
            schedule.id,
            SleepScheduleUpdate {
                volume: Some(30),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.volume, 30);
    assert_eq!(updated.bedtime, "21:30");

    let active = store.activate_sleep_schedule(1).await.unwrap().unwrap();
    assert!(active.is_active);
    assert!(store.activate_sleep_schedule(2).await.unwrap().is_none());
}

#[tokio::test]
async fn test_photo_lifecycle() {
    let store = store().await;
    let frame = store
        .create_picture_frame(NewPictureFrame {
            elderly_user_id: 1,
            device_id: "frame_kitchen".into(),
            device_name: "Kitchen Frame".into(),
            is_active: None,
            display_duration: None,
            brightness: None,
            transition_effect: None,
        })
        .await
        .unwrap();
    assert_eq!(
        store.get_picture_frame_by_id(frame.id).await.unwrap(),
        Some(frame.clone())
    );

    let photo = store
        .create_family_photo(NewFamilyPhoto {
            picture_frame_id: frame.id,
            sender_user_id: 2,
            photo_url: "https://photos.example.com/garden.jpg".into(),
            caption: Some("The garden in bloom".into()),
            is_approved: None,
            display_order: None,
            metadata: None,
        })
        .await
        .unwrap();
    assert!(photo.viewed_at.is_none());

    let viewed = store.mark_photo_viewed(photo.id).await.unwrap();
    assert!(viewed.viewed_at.is_some());

    store.delete_family_photo(photo.id).await.unwrap();
    assert!(store.get_family_photos(frame.id).await.unwrap().is_empty());
    assert!(matches!(
        store.delete_family_photo(photo.id).await,
        Err(DbError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_memories_by_category() {
    let store = store().await;
    let household = seed_demo_data(&store).await.unwrap().unwrap();
    let family = household.connection_id;
    store
        .create_memory(NewMemory {
            family_id: family,
            title: "Sunday pancakes".into(),
            description: "Pancakes every Sunday morning".into(),
            category: "tradition".into(),
            participants: None,
            date_of_memory: None,
        })
        .await
        .unwrap();

    let traditions = store
        .get_memories_by_category(family, "tradition")
        .await
        .unwrap();
    assert!(!traditions.is_empty());
    assert!(traditions.iter().all(|m| m.category == "tradition"));
    assert!(traditions.iter().any(|m| m.title == "Sunday pancakes"));

    assert!(store
        .get_memories_by_category(family, "holiday")
        .await
        .unwrap()
        .is_empty());
    assert!(store
        .get_memories_by_category(family + 100, "tradition")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_update_last_contact() {
    let store = store().await;
    let connection = store
        .create_family_connection(NewFamilyConnection {
            elderly_user_id: 1,
            caregiver_user_id: 2,
            relationship_type: "grandchild".into(),
            last_contact_date: None,
            contact_frequency: Some("daily".into()),
        })
        .await
        .unwrap();
    assert!(connection.last_contact_date.is_none());

    // Stored at millisecond precision
    let before = Utc::now() - Duration::seconds(1);
    let touched = store.update_last_contact(connection.id).await.unwrap();
    assert!(touched.last_contact_date.unwrap() >= before);
    assert_eq!(touched.contact_frequency, "daily");

    let reread = store.get_family_connections(1).await.unwrap();
    assert_eq!(reread[0].last_contact_date, touched.last_contact_date);

    assert!(matches!(
        store.update_last_contact(999).await,
        Err(DbError::NotFound(_))
    ));
}

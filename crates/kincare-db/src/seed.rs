//! Demo household
//!
//! Margaret (elderly, talks to Grace) and her daughter Sarah (caregiver,
//! talks to Alex), with enough history for every screen to show something.

use chrono::{Duration, Utc};
use kincare_types::*;
use serde_json::json;
use tracing::info;

use crate::store::Storage;
use crate::DbResult;

/// Ids of the rows the seed created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeededHousehold {
    pub elderly_user_id: i64,
    pub caregiver_user_id: i64,
    pub connection_id: i64,
    pub picture_frame_id: i64,
}

/// Insert the demo household when the store has no users yet.
///
/// Returns `None` when the store already holds data.
pub async fn seed_demo_data(store: &dyn Storage) -> DbResult<Option<SeededHousehold>> {
    if store.user_count().await? > 0 {
        return Ok(None);
    }

    let now = Utc::now();

    let margaret = store
        .create_user(NewUser {
            username: "margaret_smith".into(),
            email: "margaret@example.com".into(),
            name: "Margaret Smith".into(),
            role: UserRole::Elderly,
            preferred_agent: Some(AgentId::Grace),
            voice_enabled: Some(true),
        })
        .await?;

    let sarah = store
        .create_user(NewUser {
            username: "sarah_johnson".into(),
            email: "sarah@example.com".into(),
            name: "Sarah Johnson".into(),
            role: UserRole::Caregiver,
            preferred_agent: Some(AgentId::Alex),
            voice_enabled: Some(true),
        })
        .await?;

    let connection = store
        .create_family_connection(NewFamilyConnection {
            elderly_user_id: margaret.id,
            caregiver_user_id: sarah.id,
            relationship_type: "child".into(),
            last_contact_date: Some(now - Duration::hours(2)),
            contact_frequency: Some("weekly".into()),
        })
        .await?;

    store
        .create_memory(NewMemory {
            family_id: connection.id,
            title: "Tommy's Soccer Game".into(),
            description: "Grandson's first soccer game of the season. He scored the winning goal!"
                .into(),
            category: "sports".into(),
            participants: Some(vec![margaret.id.to_string(), sarah.id.to_string()]),
            date_of_memory: Some(now - Duration::days(7)),
        })
        .await?;

    store
        .create_reminder(NewReminder {
            user_id: margaret.id,
            title: "Doctor Appointment".into(),
            description: Some("Annual checkup with Dr. Williams".into()),
            reminder_type: "appointment".into(),
            scheduled_time: now + Duration::days(1),
            priority: Some(Priority::Medium),
            care_coordination: None,
        })
        .await?;

    store
        .create_care_notification(NewCareNotification {
            elderly_user_id: margaret.id,
            notification_type: "appointment".into(),
            title: "Physical Therapy Session".into(),
            description: "Weekly physical therapy at Sunshine Care Center. Family assistance may be helpful for transportation.".into(),
            scheduled_time: Some(now + Duration::days(3)),
            care_provider: Some("Sunshine Care Center".into()),
            family_invited: Some(true),
            assistance_needed: Some(true),
            urgency_level: Some(UrgencyLevel::Normal),
            metadata: Some(json!({
                "therapistName": "Dr. Sarah Kim",
                "duration": "45 minutes",
                "location": "Room 203",
                "transportationNeeded": true
            })),
        })
        .await?;

    let frame = store
        .create_picture_frame(NewPictureFrame {
            elderly_user_id: margaret.id,
            device_id: "frame_001".into(),
            device_name: "Living Room Frame".into(),
            is_active: Some(true),
            display_duration: Some(30),
            brightness: Some(80),
            transition_effect: Some("fade".into()),
        })
        .await?;

    let photos = [
        (
            "https://images.unsplash.com/photo-1511895426328-dc8714191300?w=400&h=300&fit=crop",
            "Family dinner last Sunday - we missed you!",
            45_000,
        ),
        (
            "https://images.unsplash.com/photo-1469474968028-56623f02e42e?w=400&h=300&fit=crop",
            "Beautiful sunset from our vacation",
            52_000,
        ),
        (
            "https://images.unsplash.com/photo-1542037104857-ffbb0972142d?w=400&h=300&fit=crop",
            "The grandkids at the park today",
            48_000,
        ),
    ];
    for (order, (url, caption, size)) in photos.into_iter().enumerate() {
        store
            .create_family_photo(NewFamilyPhoto {
                picture_frame_id: frame.id,
                sender_user_id: sarah.id,
                photo_url: url.into(),
                caption: Some(caption.into()),
                is_approved: Some(true),
                display_order: Some(order as i32 + 1),
                metadata: Some(json!({ "width": 400, "height": 300, "fileSize": size })),
            })
            .await?;
    }

    info!(
        elderly_user_id = margaret.id,
        caregiver_user_id = sarah.id,
        backend = store.backend(),
        "Seeded demo household"
    );

    Ok(Some(SeededHousehold {
        elderly_user_id: margaret.id,
        caregiver_user_id: sarah.id,
        connection_id: connection.id,
        picture_frame_id: frame.id,
    }))
}

//! HTTP API integration tests
//!
//! Runs the full router against a seeded in-memory store.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use kincare_agents::KeywordGenerator;
use kincare_api::{create_test_router, AppState, HubConfig, ServerMessage};
use kincare_db::{seed_demo_data, MemoryStore, SeededHousehold};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn setup() -> (Router, Arc<AppState>, SeededHousehold) {
    let store = Arc::new(MemoryStore::new());
    let household = seed_demo_data(store.as_ref()).await.unwrap().unwrap();
    let state = Arc::new(AppState::new(
        store,
        Arc::new(KeywordGenerator::seeded(7)),
        HubConfig::default(),
    ));
    (create_test_router(state.clone()), state, household)
}

async fn json_request(
    router: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");

    let body = match body {
        Some(json_body) => Body::from(serde_json::to_vec(&json_body).unwrap()),
        None => Body::empty(),
    };

    let response = router
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body_bytes).unwrap_or(json!(null));

    (status, json)
}

mod health {
    use super::*;

    #[tokio::test]
    async fn test_health_and_ready() {
        let (router, _, _) = setup().await;

        let (status, json) = json_request(&router, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["generator"], "keyword");
        assert_eq!(json["connections"], 0);

        let (status, json) = json_request(&router, "GET", "/ready", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ready");
    }
}

mod users {
    use super::*;

    #[tokio::test]
    async fn test_get_user() {
        let (router, _, household) = setup().await;
        let uri = format!("/api/users/{}", household.elderly_user_id);

        let (status, json) = json_request(&router, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["name"], "Margaret Smith");
        assert_eq!(json["role"], "elderly");
        assert_eq!(json["preferredAgent"], "grace");
    }

    #[tokio::test]
    async fn test_missing_user_is_404() {
        let (router, _, _) = setup().await;
        let (status, json) = json_request(&router, "GET", "/api/users/9999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["message"], "User not found");
    }

    #[tokio::test]
    async fn test_bad_id_is_400() {
        let (router, _, _) = setup().await;
        let (status, json) = json_request(&router, "GET", "/api/users/abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["message"].is_string());
    }

    #[tokio::test]
    async fn test_get_user_by_email() {
        let (router, _, household) = setup().await;
        let (status, json) =
            json_request(&router, "GET", "/api/users/email/sarah@example.com", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["id"], household.caregiver_user_id);
    }

    #[tokio::test]
    async fn test_create_user() {
        let (router, _, _) = setup().await;
        let body = json!({
            "username": "tom",
            "email": "tom@example.com",
            "name": "Tom Smith",
            "role": "caregiver"
        });

        let (status, json) = json_request(&router, "POST", "/api/users", Some(body.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["voiceEnabled"], true);

        let (status, _) = json_request(&router, "POST", "/api/users", Some(body)).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_create_user_invalid_email() {
        let (router, _, _) = setup().await;
        let body = json!({
            "username": "tom",
            "email": "not-an-email",
            "name": "Tom",
            "role": "caregiver"
        });
        let (status, json) = json_request(&router, "POST", "/api/users", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["message"].as_str().unwrap().contains("email"));
    }

    #[tokio::test]
    async fn test_create_user_malformed_body() {
        let (router, _, _) = setup().await;
        let (status, _) =
            json_request(&router, "POST", "/api/users", Some(json!({"username": 3}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

mod agents {
    use super::*;

    #[tokio::test]
    async fn test_message_hands_off_loneliness() {
        let (router, state, household) = setup().await;
        let mut listener = state.hub.register();

        let body = json!({
            "userId": household.elderly_user_id,
            "agentId": "grace",
            "message": "I feel so lonely today"
        });
        let (status, json) = json_request(&router, "POST", "/api/agents/message", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["emotionalState"], "lonely");
        assert_eq!(json["agentCommunication"]["toAgent"], "alex");
        assert_eq!(json["agentCommunication"]["priority"], "high");

        match listener.next().await {
            Some(ServerMessage::AgentCommunication {
                from_agent,
                message,
                ..
            }) => {
                assert_eq!(from_agent.as_str(), "grace");
                assert!(message.starts_with("Margaret Smith is feeling lonely"));
            }
            other => panic!("unexpected broadcast: {:?}", other),
        }

        let (status, json) =
            json_request(&router, "GET", "/api/agents/communications", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json[0]["fromAgent"], "grace");

        let uri = format!("/api/conversations/{}", household.elderly_user_id);
        let (_, json) = json_request(&router, "GET", &uri, None).await;
        assert_eq!(json[0]["message"], "I feel so lonely today");
    }

    #[tokio::test]
    async fn test_message_for_unknown_user() {
        let (router, _, _) = setup().await;
        let body = json!({"userId": 404, "agentId": "alex", "message": "hi"});
        let (status, json) = json_request(&router, "POST", "/api/agents/message", Some(body)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["message"], "User not found");
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let (router, _, household) = setup().await;
        let body = json!({"userId": household.elderly_user_id, "agentId": "grace", "message": ""});
        let (status, _) = json_request(&router, "POST", "/api/agents/message", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_insights_and_contact_time() {
        let (router, _, household) = setup().await;

        let uri = format!("/api/agents/insights/{}", household.elderly_user_id);
        let (status, json) = json_request(&router, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["wellbeingScore"], 70);
        assert_eq!(json["recentActivity"], "Limited recent activity");

        let uri = format!("/api/agents/contact-time/{}", household.elderly_user_id);
        let (status, json) = json_request(&router, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["reason"].as_str().unwrap().contains("Sunday at 15:00"));
    }

    #[tokio::test]
    async fn test_memory_quiz() {
        let (router, _, household) = setup().await;
        let uri = format!("/api/memories/{}/quiz", household.connection_id);
        let (status, json) = json_request(&router, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["question"].is_string());
        assert_eq!(json["options"].as_array().unwrap().len(), 4);
    }
}

mod reminders {
    use super::*;

    #[tokio::test]
    async fn test_create_pending_and_complete() {
        let (router, _, household) = setup().await;
        let body = json!({
            "userId": household.elderly_user_id,
            "title": "Take pills",
            "reminderType": "medication",
            "scheduledTime": "2020-01-01T09:00:00Z"
        });
        let (status, json) = json_request(&router, "POST", "/api/reminders", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["priority"], "medium");
        let id = json["id"].as_i64().unwrap();

        let pending = format!("/api/reminders/{}/pending", household.elderly_user_id);
        let (_, json) = json_request(&router, "GET", &pending, None).await;
        // The seeded appointment is tomorrow, so only ours is due
        assert_eq!(json.as_array().unwrap().len(), 1);

        let uri = format!("/api/reminders/{}/complete", id);
        let (status, json) = json_request(&router, "PATCH", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Reminder completed");

        let (_, json) = json_request(&router, "GET", &pending, None).await;
        assert!(json.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_complete_missing_reminder() {
        let (router, _, _) = setup().await;
        let (status, _) = json_request(&router, "PATCH", "/api/reminders/999/complete", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

mod care {
    use super::*;

    #[tokio::test]
    async fn test_appointment_notifies_family() {
        let (router, state, household) = setup().await;
        let mut listener = state.hub.register();

        let body = json!({
            "elderlyUserId": household.elderly_user_id,
            "title": "Eye exam",
            "description": "Bring glasses",
            "scheduledTime": "2030-05-01T10:00:00Z",
            "careProvider": "Vision Center",
            "assistanceNeeded": true
        });
        let (status, json) =
            json_request(&router, "POST", "/api/care-coordination/appointment", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["urgencyLevel"], "high");
        assert_eq!(
            json["notifiedFamilyMembers"],
            json!([household.caregiver_user_id.to_string()])
        );

        assert!(matches!(
            listener.next().await,
            Some(ServerMessage::CareNotification { .. })
        ));

        let (_, json) = json_request(&router, "GET", "/api/agents/communications", None).await;
        assert!(json[0]["message"]
            .as_str()
            .unwrap()
            .starts_with("Care notification for Eye exam"));
    }

    #[tokio::test]
    async fn test_care_reminder() {
        let (router, _, household) = setup().await;
        let body = json!({
            "userId": household.elderly_user_id,
            "reminderType": "appointment",
            "title": "Dentist",
            "scheduledTime": "2030-05-02T10:00:00Z",
            "careCoordination": {"careProvider": "Smile Clinic"}
        });
        let (status, json) =
            json_request(&router, "POST", "/api/care-coordination/reminder", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["message"], "Care reminder processed and family notified");

        let uri = format!("/api/care-notifications/{}", household.elderly_user_id);
        let (_, json) = json_request(&router, "GET", &uri, None).await;
        let titles: Vec<&str> = json
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|n| n["title"].as_str())
            .collect();
        assert!(titles.contains(&"Dentist"));
    }
}

mod sleep {
    use super::*;

    #[tokio::test]
    async fn test_schedule_lifecycle() {
        let (router, _, household) = setup().await;
        let uri = format!("/api/sleep-schedule/{}", household.elderly_user_id);

        let (status, json) = json_request(&router, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["message"], "Sleep schedule not found");

        let body = json!({
            "userId": household.elderly_user_id,
            "bedtime": "21:30",
            "duration": 45,
            "musicType": "classical",
            "binauralFrequency": 10,
            "isActive": false
        });
        let (status, json) = json_request(&router, "POST", "/api/sleep-schedule", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = json["id"].as_i64().unwrap();

        let patch = format!("/api/sleep-schedule/{}", id);
        let (status, json) =
            json_request(&router, "PATCH", &patch, Some(json!({"volume": 20}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["volume"], 20);
        assert_eq!(json["bedtime"], "21:30");

        let activate = format!("/api/sleep-schedule/{}/activate", household.elderly_user_id);
        let (status, json) = json_request(&router, "POST", &activate, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["isActive"], true);
    }

    #[tokio::test]
    async fn test_bad_bedtime_rejected() {
        let (router, _, household) = setup().await;
        let body = json!({
            "userId": household.elderly_user_id,
            "bedtime": "25:99",
            "duration": 45,
            "musicType": "classical",
            "binauralFrequency": 10
        });
        let (status, _) = json_request(&router, "POST", "/api/sleep-schedule", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

mod frames {
    use super::*;

    #[tokio::test]
    async fn test_frame_and_photos() {
        let (router, state, household) = setup().await;
        let mut listener = state.hub.register();

        let uri = format!("/api/picture-frame/{}", household.elderly_user_id);
        let (status, json) = json_request(&router, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["deviceId"], "frame_001");

        let body = json!({
            "pictureFrameId": household.picture_frame_id,
            "senderUserId": household.caregiver_user_id,
            "photoUrl": "https://example.com/cake.jpg",
            "caption": "Birthday cake"
        });
        let (status, json) = json_request(&router, "POST", "/api/family-photos", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        let photo_id = json["id"].as_i64().unwrap();

        match listener.next().await {
            Some(ServerMessage::NewPhoto { frame_id, photo }) => {
                assert_eq!(frame_id, household.picture_frame_id);
                assert_eq!(photo.id, photo_id);
            }
            other => panic!("unexpected broadcast: {:?}", other),
        }

        let uri = format!("/api/recent-photos/{}?limit=2", household.elderly_user_id);
        let (_, json) = json_request(&router, "GET", &uri, None).await;
        assert_eq!(json.as_array().unwrap().len(), 2);

        let uri = format!("/api/family-photos/{}/viewed", photo_id);
        let (status, json) = json_request(&router, "PATCH", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Photo marked as viewed");

        let uri = format!("/api/family-photos/{}", photo_id);
        let (status, json) = json_request(&router, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Photo deleted successfully");

        let uri = format!("/api/family-photos/{}", household.picture_frame_id);
        let (_, json) = json_request(&router, "GET", &uri, None).await;
        assert_eq!(json.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_photo_for_unknown_frame() {
        let (router, _, household) = setup().await;
        let body = json!({
            "pictureFrameId": 999,
            "senderUserId": household.caregiver_user_id,
            "photoUrl": "https://example.com/a.jpg"
        });
        let (status, json) = json_request(&router, "POST", "/api/family-photos", Some(body)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["message"], "Picture frame not found");
    }

    #[tokio::test]
    async fn test_missing_frame() {
        let (router, _, _) = setup().await;
        let (status, json) = json_request(&router, "GET", "/api/picture-frame/999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["message"], "Picture frame not found");
    }
}

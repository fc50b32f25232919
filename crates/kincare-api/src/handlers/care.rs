//! Care notifications and care coordination

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use kincare_agents::{CareEvent, CareReminder};
use kincare_types::{CareNotification, NewCareNotification};
use serde::Deserialize;
use validator::Validate;

use crate::error::{message, ApiResult, ErrorResponse};
use crate::extractors::{Path, ValidatedJson};
use crate::state::AppState;
use crate::websocket::ServerMessage;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentRequest {
    pub elderly_user_id: i64,
    #[validate(length(min = 1))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub scheduled_time: DateTime<Utc>,
    #[serde(default)]
    pub care_provider: Option<String>,
    #[serde(default)]
    pub assistance_needed: bool,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CareReminderRequest {
    pub user_id: i64,
    #[validate(length(min = 1))]
    pub reminder_type: String,
    #[validate(length(min = 1))]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub scheduled_time: DateTime<Utc>,
    #[serde(default)]
    pub care_coordination: Option<serde_json::Value>,
}

fn announce(state: &AppState, notification: &CareNotification) {
    state.hub.broadcast(ServerMessage::CareNotification {
        notification: notification.clone(),
    });
}

/// Earliest first
pub async fn get_care_notifications(
    State(state): State<Arc<AppState>>,
    Path(elderly_user_id): Path<i64>,
) -> ApiResult<Json<Vec<CareNotification>>> {
    Ok(Json(
        state.store.get_care_notifications(elderly_user_id).await?,
    ))
}

pub async fn create_care_notification(
    State(state): State<Arc<AppState>>,
    ValidatedJson(new): ValidatedJson<NewCareNotification>,
) -> ApiResult<(StatusCode, Json<CareNotification>)> {
    let elderly_user_id = new.elderly_user_id;
    let created = state.store.create_care_notification(new).await?;
    let notification = state
        .agents
        .notify_family_members(elderly_user_id, &created)
        .await?;
    announce(&state, &notification);
    Ok((StatusCode::CREATED, Json(notification)))
}

pub async fn create_appointment(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<AppointmentRequest>,
) -> ApiResult<(StatusCode, Json<CareNotification>)> {
    let notification = state
        .agents
        .create_care_notification(
            req.elderly_user_id,
            CareEvent {
                notification_type: "appointment".to_string(),
                title: req.title,
                description: req.description,
                scheduled_time: Some(req.scheduled_time),
                care_provider: req.care_provider,
                assistance_needed: req.assistance_needed,
            },
        )
        .await?;
    announce(&state, &notification);
    Ok((StatusCode::CREATED, Json(notification)))
}

pub async fn process_care_reminder(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CareReminderRequest>,
) -> ApiResult<(StatusCode, Json<ErrorResponse>)> {
    let reminder = state
        .agents
        .process_care_reminder(
            req.user_id,
            CareReminder {
                reminder_type: req.reminder_type,
                title: req.title,
                description: req.description,
                scheduled_time: req.scheduled_time,
                care_coordination: req.care_coordination,
            },
        )
        .await?;
    tracing::info!(reminder = reminder.id, user_id = req.user_id, "Care reminder processed");
    Ok((
        StatusCode::CREATED,
        message("Care reminder processed and family notified"),
    ))
}

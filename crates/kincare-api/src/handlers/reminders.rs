use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use kincare_types::{NewReminder, Reminder};

use crate::error::{message, ApiResult, ErrorResponse};
use crate::extractors::{Path, ValidatedJson};
use crate::state::AppState;

pub async fn get_reminders(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<Vec<Reminder>>> {
    Ok(Json(state.store.get_reminders(user_id).await?))
}

/// Due and not yet completed
pub async fn get_pending_reminders(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<Vec<Reminder>>> {
    Ok(Json(
        state
            .store
            .get_pending_reminders(user_id, Utc::now())
            .await?,
    ))
}

pub async fn create_reminder(
    State(state): State<Arc<AppState>>,
    ValidatedJson(reminder): ValidatedJson<NewReminder>,
) -> ApiResult<(StatusCode, Json<Reminder>)> {
    let reminder = state.store.create_reminder(reminder).await?;
    Ok((StatusCode::CREATED, Json(reminder)))
}

pub async fn complete_reminder(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ErrorResponse>> {
    state.store.complete_reminder(id).await?;
    Ok(message("Reminder completed"))
}

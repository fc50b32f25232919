use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use kincare_types::{NewSleepSchedule, SleepSchedule, SleepScheduleUpdate};

use crate::error::{ApiError, ApiResult};
use crate::extractors::{Path, ValidatedJson};
use crate::state::AppState;

pub async fn get_sleep_schedule(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<SleepSchedule>> {
    state
        .store
        .get_sleep_schedule(user_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Sleep schedule"))
}

pub async fn create_sleep_schedule(
    State(state): State<Arc<AppState>>,
    ValidatedJson(schedule): ValidatedJson<NewSleepSchedule>,
) -> ApiResult<(StatusCode, Json<SleepSchedule>)> {
    let schedule = state.store.create_sleep_schedule(schedule).await?;
    Ok((StatusCode::CREATED, Json(schedule)))
}

pub async fn update_sleep_schedule(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    ValidatedJson(update): ValidatedJson<SleepScheduleUpdate>,
) -> ApiResult<Json<SleepSchedule>> {
    Ok(Json(state.store.update_sleep_schedule(id, update).await?))
}

pub async fn activate_sleep_schedule(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<SleepSchedule>> {
    state
        .store
        .activate_sleep_schedule(user_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Sleep schedule"))
}

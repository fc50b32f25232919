use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use kincare_types::{NewUser, User};

use crate::error::{ApiError, ApiResult};
use crate::extractors::{Path, ValidatedJson};
use crate::state::AppState;

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<User>> {
    state
        .store
        .get_user(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("User"))
}

pub async fn get_user_by_email(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> ApiResult<Json<User>> {
    state
        .store
        .get_user_by_email(&email)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("User"))
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    ValidatedJson(user): ValidatedJson<NewUser>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = state.store.create_user(user).await?;
    tracing::info!(user_id = user.id, role = user.role.as_str(), "User created");
    Ok((StatusCode::CREATED, Json(user)))
}

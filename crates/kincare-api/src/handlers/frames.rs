//! Picture frames and the photos shown on them

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use kincare_db::DEFAULT_PHOTO_LIMIT;
use kincare_types::{FamilyPhoto, NewFamilyPhoto, NewPictureFrame, PictureFrame, PictureFrameUpdate};

use crate::error::{message, ApiError, ApiResult, ErrorResponse};
use crate::extractors::{LimitQuery, Path, ValidatedJson};
use crate::state::AppState;
use crate::websocket::ServerMessage;

pub async fn get_picture_frame(
    State(state): State<Arc<AppState>>,
    Path(elderly_user_id): Path<i64>,
) -> ApiResult<Json<PictureFrame>> {
    state
        .store
        .get_picture_frame(elderly_user_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Picture frame"))
}

pub async fn create_picture_frame(
    State(state): State<Arc<AppState>>,
    ValidatedJson(frame): ValidatedJson<NewPictureFrame>,
) -> ApiResult<(StatusCode, Json<PictureFrame>)> {
    let frame = state.store.create_picture_frame(frame).await?;
    Ok((StatusCode::CREATED, Json(frame)))
}

pub async fn update_picture_frame(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    ValidatedJson(update): ValidatedJson<PictureFrameUpdate>,
) -> ApiResult<Json<PictureFrame>> {
    Ok(Json(state.store.update_picture_frame(id, update).await?))
}

pub async fn get_family_photos(
    State(state): State<Arc<AppState>>,
    Path(frame_id): Path<i64>,
) -> ApiResult<Json<Vec<FamilyPhoto>>> {
    Ok(Json(state.store.get_family_photos(frame_id).await?))
}

pub async fn get_recent_photos(
    State(state): State<Arc<AppState>>,
    Path(elderly_user_id): Path<i64>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<Vec<FamilyPhoto>>> {
    let limit = query.limit_or(DEFAULT_PHOTO_LIMIT);
    Ok(Json(
        state
            .store
            .get_recent_photos(elderly_user_id, limit)
            .await?,
    ))
}

/// Stores the photo and pushes `new_photo` to every socket
pub async fn create_family_photo(
    State(state): State<Arc<AppState>>,
    ValidatedJson(photo): ValidatedJson<NewFamilyPhoto>,
) -> ApiResult<(StatusCode, Json<FamilyPhoto>)> {
    let frame = state
        .store
        .get_picture_frame_by_id(photo.picture_frame_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Picture frame"))?;

    let photo = state.store.create_family_photo(photo).await?;
    state.hub.broadcast(ServerMessage::NewPhoto {
        frame_id: frame.id,
        photo: photo.clone(),
    });
    tracing::info!(photo = photo.id, frame = frame.id, "Photo sent to frame");
    Ok((StatusCode::CREATED, Json(photo)))
}

pub async fn delete_family_photo(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ErrorResponse>> {
    state.store.delete_family_photo(id).await?;
    Ok(message("Photo deleted successfully"))
}

pub async fn mark_photo_viewed(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ErrorResponse>> {
    state.store.mark_photo_viewed(id).await?;
    Ok(message("Photo marked as viewed"))
}

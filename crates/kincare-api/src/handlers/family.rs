//! Family connections and shared memories

use std::sync::Arc;

use axum::{extract::State, Json};
use kincare_agents::MemoryQuiz;
use kincare_types::{FamilyConnection, Memory};

use crate::error::ApiResult;
use crate::extractors::Path;
use crate::state::AppState;

pub async fn get_family_connections(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<Vec<FamilyConnection>>> {
    Ok(Json(state.store.get_family_connections(user_id).await?))
}

pub async fn get_memories(
    State(state): State<Arc<AppState>>,
    Path(family_id): Path<i64>,
) -> ApiResult<Json<Vec<Memory>>> {
    Ok(Json(state.store.get_memories(family_id).await?))
}

pub async fn get_memory_quiz(
    State(state): State<Arc<AppState>>,
    Path(family_id): Path<i64>,
) -> ApiResult<Json<MemoryQuiz>> {
    Ok(Json(state.agents.create_memory_quiz(family_id).await?))
}

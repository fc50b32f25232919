use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use kincare_db::DEFAULT_CONVERSATION_LIMIT;
use kincare_types::{AgentId, Conversation, NewConversation};

use crate::error::ApiResult;
use crate::extractors::{LimitQuery, Path, ValidatedJson};
use crate::state::AppState;

/// Newest first
pub async fn get_conversations(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<Vec<Conversation>>> {
    let limit = query.limit_or(DEFAULT_CONVERSATION_LIMIT);
    Ok(Json(state.store.get_conversations(user_id, limit).await?))
}

pub async fn get_conversations_by_agent(
    State(state): State<Arc<AppState>>,
    Path(agent_id): Path<AgentId>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<Vec<Conversation>>> {
    let limit = query.limit_or(DEFAULT_CONVERSATION_LIMIT);
    Ok(Json(
        state.store.get_conversations_by_agent(agent_id, limit).await?,
    ))
}

pub async fn create_conversation(
    State(state): State<Arc<AppState>>,
    ValidatedJson(conversation): ValidatedJson<NewConversation>,
) -> ApiResult<(StatusCode, Json<Conversation>)> {
    let conversation = state.store.create_conversation(conversation).await?;
    Ok((StatusCode::CREATED, Json(conversation)))
}

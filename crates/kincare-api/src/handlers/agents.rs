//! Persona endpoints

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use kincare_agents::{ContactSuggestion, FamilyInsights};
use kincare_types::{AgentCommunication, AgentId, AgentResponse};
use serde::Deserialize;
use validator::Validate;

use crate::error::ApiResult;
use crate::extractors::{LimitQuery, Path, ValidatedJson};
use crate::state::AppState;
use crate::websocket::relay_user_message;

const DEFAULT_COMMUNICATION_LIMIT: i64 = 10;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AgentMessageRequest {
    pub user_id: i64,
    pub agent_id: AgentId,
    #[validate(length(min = 1, max = 4000))]
    pub message: String,
}

/// Same path as a WebSocket `user_message`; a handoff goes to every socket
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<AgentMessageRequest>,
) -> ApiResult<Json<AgentResponse>> {
    let response =
        relay_user_message(&state, None, req.user_id, req.agent_id, &req.message).await?;
    Ok(Json(response))
}

pub async fn get_communications(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<Vec<AgentCommunication>>> {
    let limit = query.limit_or(DEFAULT_COMMUNICATION_LIMIT);
    Ok(Json(state.agents.agent_communications(limit).await?))
}

pub async fn get_insights(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<FamilyInsights>> {
    Ok(Json(state.agents.generate_family_insights(user_id).await?))
}

pub async fn get_contact_time(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<ContactSuggestion>> {
    Ok(Json(state.agents.suggest_optimal_contact_time(user_id).await?))
}

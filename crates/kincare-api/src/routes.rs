//! Route table
//!
//! Single-parameter routes all name the segment `:id`; the router rejects
//! sibling routes that name the same position differently.

use axum::{
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;

use crate::handlers::{agents, care, conversations, family, frames, reminders, sleep, users};
use crate::state::AppState;
use crate::websocket;

/// Everything under `/api`
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Users
        .route("/users", post(users::create_user))
        .route("/users/:id", get(users::get_user))
        .route("/users/email/:email", get(users::get_user_by_email))
        // Conversations
        .route("/conversations", post(conversations::create_conversation))
        .route("/conversations/:id", get(conversations::get_conversations))
        .route(
            "/conversations/agent/:agent_id",
            get(conversations::get_conversations_by_agent),
        )
        // Family and memories
        .route("/family/:id", get(family::get_family_connections))
        .route("/memories/:id", get(family::get_memories))
        .route("/memories/:id/quiz", get(family::get_memory_quiz))
        // Reminders
        .route("/reminders", post(reminders::create_reminder))
        .route("/reminders/:id", get(reminders::get_reminders))
        .route("/reminders/:id/pending", get(reminders::get_pending_reminders))
        .route("/reminders/:id/complete", patch(reminders::complete_reminder))
        // Agents
        .nest("/agents", agent_routes())
        // Care coordination
        .route("/care-notifications", post(care::create_care_notification))
        .route("/care-notifications/:id", get(care::get_care_notifications))
        .route("/care-coordination/appointment", post(care::create_appointment))
        .route("/care-coordination/reminder", post(care::process_care_reminder))
        // Sleep
        .route("/sleep-schedule", post(sleep::create_sleep_schedule))
        .route(
            "/sleep-schedule/:id",
            get(sleep::get_sleep_schedule).patch(sleep::update_sleep_schedule),
        )
        .route("/sleep-schedule/:id/activate", post(sleep::activate_sleep_schedule))
        // Picture frames
        .route("/picture-frame", post(frames::create_picture_frame))
        .route(
            "/picture-frame/:id",
            get(frames::get_picture_frame).patch(frames::update_picture_frame),
        )
        .route("/family-photos", post(frames::create_family_photo))
        .route(
            "/family-photos/:id",
            get(frames::get_family_photos).delete(frames::delete_family_photo),
        )
        .route("/family-photos/:id/viewed", patch(frames::mark_photo_viewed))
        .route("/recent-photos/:id", get(frames::get_recent_photos))
}

fn agent_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/message", post(agents::send_message))
        .route("/communications", get(agents::get_communications))
        .route("/insights/:id", get(agents::get_insights))
        .route("/contact-time/:id", get(agents::get_contact_time))
}

pub fn ws_routes() -> Router<Arc<AppState>> {
    Router::new().route("/ws", get(websocket::ws_handler))
}

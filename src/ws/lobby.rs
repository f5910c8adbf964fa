//! Lobby message handlers
//!
//! Room creation, joining and leaving.

use super::handlers::reject;
use crate::protocol::ServerMessage;
use crate::state::AppState;
use crate::types::ParticipantId;
use std::sync::Arc;

pub async fn handle_create_room(
    state: &Arc<AppState>,
    participant: &ParticipantId,
    password: Option<String>,
    faction_size: usize,
    room_name: Option<String>,
    duration_seconds: u64,
) -> Option<ServerMessage> {
    tracing::info!("Create room request from {}", participant);
    match state
        .create_room(password, faction_size, room_name, duration_seconds)
        .await
    {
        Ok(code) => Some(ServerMessage::RoomCreated { code }),
        Err(e) => reject(participant, e),
    }
}

/// The joined_room ack is delivered by the session itself, ahead of the
/// room's player list, so success needs no direct reply.
pub async fn handle_join_room(
    state: &Arc<AppState>,
    participant: &ParticipantId,
    code: String,
    password: Option<String>,
    display_name: String,
) -> Option<ServerMessage> {
    match state
        .join_room(participant, &code, password, display_name)
        .await
    {
        Ok(_) => None,
        Err(e) => reject(participant, e),
    }
}

pub async fn handle_leave_lobby(
    state: &Arc<AppState>,
    participant: &ParticipantId,
    code: String,
) -> Option<ServerMessage> {
    match state.leave_room(participant, &code).await {
        Ok(()) => None,
        Err(e) => reject(participant, e),
    }
}

//! WebSocket message dispatch
//!
//! Entry point for every parsed client frame. The return value is the direct
//! reply for the requester; everything else reaches clients through the hub.

use crate::error::GameError;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use crate::types::ParticipantId;
use std::sync::Arc;

use super::{game, lobby};

/// Turn a rejection into the requester's reply. Silent rejections get none.
pub(super) fn reject(participant: &ParticipantId, error: GameError) -> Option<ServerMessage> {
    if error.is_silent() {
        tracing::debug!("Dropped request from {}: {}", participant, error);
        return None;
    }
    tracing::info!("Rejected request from {}: {}", participant, error);
    Some(ServerMessage::from(&error))
}

/// Handle client messages and return optional response
pub async fn handle_message(
    msg: ClientMessage,
    participant: &ParticipantId,
    state: &Arc<AppState>,
) -> Option<ServerMessage> {
    match msg {
        // Lobby messages
        ClientMessage::CreateRoom {
            password,
            faction_size,
            room_name,
            duration_seconds,
        } => {
            lobby::handle_create_room(
                state,
                participant,
                password,
                faction_size,
                room_name,
                duration_seconds,
            )
            .await
        }

        ClientMessage::JoinRoom {
            code,
            password,
            display_name,
        } => lobby::handle_join_room(state, participant, code, password, display_name).await,

        ClientMessage::ListRooms => Some(ServerMessage::RoomListUpdate {
            rooms: state.room_list().await,
        }),

        ClientMessage::LeaveLobby { code } => {
            lobby::handle_leave_lobby(state, participant, code).await
        }

        // Gameplay messages
        ClientMessage::StartGame { code } => {
            game::handle_start_game(state, participant, code).await
        }

        ClientMessage::Vote { code, target_id } => {
            game::handle_vote(state, participant, code, target_id).await
        }

        ClientMessage::NightAction {
            code,
            action,
            target_id,
        } => game::handle_night_action(state, participant, code, action, target_id).await,
    }
}

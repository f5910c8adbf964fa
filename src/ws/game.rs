//! Gameplay message handlers

use super::handlers::reject;
use crate::protocol::ServerMessage;
use crate::state::AppState;
use crate::types::{NightActionKind, ParticipantId};
use std::sync::Arc;

pub async fn handle_start_game(
    state: &Arc<AppState>,
    participant: &ParticipantId,
    code: String,
) -> Option<ServerMessage> {
    tracing::info!("Start game request for room {} from {}", code, participant);
    state
        .start_game(participant, &code)
        .await
        .err()
        .and_then(|e| reject(participant, e))
}

pub async fn handle_vote(
    state: &Arc<AppState>,
    participant: &ParticipantId,
    code: String,
    target: ParticipantId,
) -> Option<ServerMessage> {
    state
        .vote(participant, &code, &target)
        .await
        .err()
        .and_then(|e| reject(participant, e))
}

pub async fn handle_night_action(
    state: &Arc<AppState>,
    participant: &ParticipantId,
    code: String,
    kind: NightActionKind,
    target: ParticipantId,
) -> Option<ServerMessage> {
    state
        .night_action(participant, &code, kind, &target)
        .await
        .err()
        .and_then(|e| reject(participant, e))
}

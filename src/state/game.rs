use super::AppState;
use crate::error::{GameError, GameResult};
use crate::session::SessionHandle;
use crate::types::*;

impl AppState {
    /// Look up the room a gameplay request is addressed to
    async fn session_for(&self, code: &str) -> GameResult<SessionHandle> {
        self.get(code).await.ok_or(GameError::RoomNotFound)
    }

    /// Deal roles and open the first day
    pub async fn start_game(&self, participant: &ParticipantId, code: &str) -> GameResult<()> {
        // The room's phase watcher announces the change to lobby browsers
        self.session_for(code)
            .await?
            .start_game(participant.clone())
            .await
    }

    pub async fn vote(
        &self,
        participant: &ParticipantId,
        code: &str,
        target: &ParticipantId,
    ) -> GameResult<()> {
        self.session_for(code)
            .await?
            .vote(participant.clone(), target.clone())
            .await
    }

    pub async fn night_action(
        &self,
        participant: &ParticipantId,
        code: &str,
        kind: NightActionKind,
        target: &ParticipantId,
    ) -> GameResult<()> {
        self.session_for(code)
            .await?
            .night_action(participant.clone(), kind, target.clone())
            .await
    }
}

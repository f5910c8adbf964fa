mod game;
mod room;

pub use room::spawn_room_reaper;

use crate::broadcast::Hub;
use crate::config::ServerConfig;
use crate::session::SessionHandle;
use crate::types::*;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Open connections, also the messenger every session talks through
    pub hub: Arc<Hub>,
    /// Session registry. Lock order: `sessions` before `seats`.
    sessions: Arc<RwLock<HashMap<RoomCode, SessionHandle>>>,
    /// Which room each participant currently sits in
    seats: Arc<RwLock<HashMap<ParticipantId, RoomCode>>>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config: Arc::new(config),
            hub: Arc::new(Hub::new()),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            seats: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Room the participant is seated in, if any
    pub async fn seat_of(&self, participant: &ParticipantId) -> Option<RoomCode> {
        self.seats.read().await.get(participant).cloned()
    }

    pub async fn room_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ServerConfig::default())
    }
}

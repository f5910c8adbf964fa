use super::AppState;
use crate::broadcast::Messenger;
use crate::error::{GameError, GameResult};
use crate::protocol::ServerMessage;
use crate::session::{spawn_session, JoinAck, SessionHandle};
use crate::types::*;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;

/// Room codes avoid easily confused characters (no I, L, O, 0, 1)
const CODE_CHARS: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";
const CODE_LENGTH: usize = 4;

fn generate_room_code() -> RoomCode {
    let mut rng = rand::rng();
    (0..CODE_LENGTH)
        .map(|_| CODE_CHARS[rng.random_range(0..CODE_CHARS.len())] as char)
        .collect()
}

/// Codes are typed by hand; accept any case and stray whitespace
fn normalize_code(code: &str) -> RoomCode {
    code.trim().to_uppercase()
}

/// Drop a room from the registry if nobody is seated. Caller holds the write lock.
async fn remove_locked(sessions: &mut HashMap<RoomCode, SessionHandle>, code: &str) -> bool {
    let empty = sessions
        .get(code)
        .is_some_and(|handle| handle.summary().player_count == 0);
    if !empty {
        return false;
    }

    if let Some(handle) = sessions.remove(code) {
        handle.close().await;
        tracing::info!("Room {} destroyed", code);
    }
    true
}

impl AppState {
    /// Create an empty room and return its code
    pub async fn create_room(
        &self,
        password: Option<String>,
        faction_size: usize,
        room_name: Option<String>,
        duration_seconds: u64,
    ) -> GameResult<RoomCode> {
        if faction_size < 1 {
            return Err(GameError::InvalidConfig(
                "faction size must be at least 1".to_string(),
            ));
        }
        let max = self.config.max_duration_seconds;
        if !(1..=max).contains(&duration_seconds) {
            return Err(GameError::InvalidConfig(format!(
                "discussion time must be between 1 and {} seconds",
                max
            )));
        }
        let password = password.filter(|p| !p.is_empty());
        let room_name = room_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        let code = {
            let mut sessions = self.sessions.write().await;
            // Uniqueness check and insert under the same lock
            let code = loop {
                let code = generate_room_code();
                if !sessions.contains_key(&code) {
                    break code;
                }
            };

            let config = SessionConfig {
                name: room_name.unwrap_or_else(|| format!("Room {}", code)),
                password,
                faction_size,
                discussion_seconds: duration_seconds,
            };
            let handle = spawn_session(
                code.clone(),
                config,
                self.config.night_duration(),
                self.hub.clone(),
            );
            self.spawn_phase_watcher(&handle);
            sessions.insert(code.clone(), handle);
            code
        };

        tracing::info!(
            "Room {} created (faction size {}, discussion {}s)",
            code,
            faction_size,
            duration_seconds
        );
        self.broadcast_room_list().await;
        Ok(code)
    }

    /// Announce the room list whenever the room's phase moves, however it moved.
    /// Ends when the session task stops.
    fn spawn_phase_watcher(&self, handle: &SessionHandle) {
        let state = self.clone();
        let mut summary = handle.subscribe();
        let mut phase = summary.borrow_and_update().phase;
        tokio::spawn(async move {
            while summary.changed().await.is_ok() {
                let next = summary.borrow_and_update().phase;
                if next != phase {
                    phase = next;
                    state.broadcast_room_list().await;
                }
            }
        });
    }

    pub async fn get(&self, code: &str) -> Option<SessionHandle> {
        self.sessions.read().await.get(&normalize_code(code)).cloned()
    }

    pub async fn join_room(
        &self,
        participant: &ParticipantId,
        code: &str,
        password: Option<String>,
        display_name: String,
    ) -> GameResult<JoinAck> {
        let code = normalize_code(code);
        if let Some(seated) = self.seat_of(participant).await {
            if seated != code {
                return Err(GameError::AlreadySeated);
            }
        }

        let ack = {
            // Held while the session decides, so the room can't be removed underneath the join
            let sessions = self.sessions.read().await;
            let handle = sessions.get(&code).ok_or(GameError::RoomNotFound)?;
            let ack = handle
                .join(participant.clone(), display_name, password)
                .await?;
            self.seats
                .write()
                .await
                .insert(participant.clone(), code.clone());
            ack
        };

        self.broadcast_room_list().await;
        Ok(ack)
    }

    pub async fn leave_room(&self, participant: &ParticipantId, code: &str) -> GameResult<()> {
        let code = normalize_code(code);
        let removed = {
            let mut sessions = self.sessions.write().await;
            let handle = sessions
                .get(&code)
                .cloned()
                .ok_or(GameError::RoomNotFound)?;
            let remaining = handle.leave(participant.clone()).await?;

            let mut seats = self.seats.write().await;
            if seats.get(participant) == Some(&code) {
                seats.remove(participant);
            }
            drop(seats);

            remaining == 0 && remove_locked(&mut sessions, &code).await
        };

        if removed {
            tracing::debug!("Last player left room {}", code);
        }
        self.broadcast_room_list().await;
        Ok(())
    }

    /// Remove the room if it has no players. Returns whether it was removed.
    pub async fn remove_if_empty(&self, code: &str) -> bool {
        let code = normalize_code(code);
        let mut sessions = self.sessions.write().await;
        remove_locked(&mut sessions, &code).await
    }

    /// A closed connection leaves whatever room it sat in
    pub async fn disconnect(&self, participant: &ParticipantId) {
        let Some(code) = self.seat_of(participant).await else {
            return;
        };
        if let Err(e) = self.leave_room(participant, &code).await {
            tracing::debug!("Disconnect of {} from room {}: {}", participant, code, e);
            self.seats.write().await.remove(participant);
        }
    }

    /// Summaries of every live room, ordered by code
    pub async fn room_list(&self) -> Vec<RoomSummary> {
        let mut rooms: Vec<RoomSummary> = self
            .sessions
            .read()
            .await
            .values()
            .map(|handle| handle.summary())
            .collect();
        rooms.sort_by(|a, b| a.code.cmp(&b.code));
        rooms
    }

    /// Announce the current room list to every connection
    pub async fn broadcast_room_list(&self) {
        let rooms = self.room_list().await;
        self.hub.announce(ServerMessage::RoomListUpdate { rooms });
    }

    /// Remove rooms that have sat empty for longer than the grace period
    async fn reap_empty_rooms(&self) -> usize {
        let grace = self.config.empty_room_grace();
        let mut sessions = self.sessions.write().await;
        let stale: Vec<RoomCode> = sessions
            .values()
            .filter(|h| h.summary().player_count == 0 && h.created_at().elapsed() >= grace)
            .map(|h| h.code().to_string())
            .collect();

        let mut removed = 0;
        for code in stale {
            if remove_locked(&mut sessions, &code).await {
                removed += 1;
            }
        }
        removed
    }
}

/// Spawn background task that sweeps rooms nobody ever joined
pub fn spawn_room_reaper(state: Arc<AppState>) {
    tokio::spawn(async move {
        let period = state.config.empty_room_grace();
        loop {
            tokio::time::sleep(period).await;

            let removed = state.reap_empty_rooms().await;
            if removed > 0 {
                tracing::info!("Reaped {} empty room(s)", removed);
                state.broadcast_room_list().await;
            }
        }
    });
}

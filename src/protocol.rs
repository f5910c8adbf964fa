use crate::types::*;
use serde::{Deserialize, Serialize};

fn default_faction_size() -> usize {
    1
}

fn default_duration_seconds() -> u64 {
    60
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    CreateRoom {
        #[serde(default)]
        password: Option<String>,
        #[serde(default = "default_faction_size")]
        faction_size: usize,
        #[serde(default)]
        room_name: Option<String>,
        #[serde(default = "default_duration_seconds")]
        duration_seconds: u64,
    },
    JoinRoom {
        code: RoomCode,
        #[serde(default)]
        password: Option<String>,
        display_name: String,
    },
    /// Ask for the current room listing
    ListRooms,
    StartGame {
        code: RoomCode,
    },
    Vote {
        code: RoomCode,
        target_id: ParticipantId,
    },
    NightAction {
        code: RoomCode,
        action: NightActionKind,
        target_id: ParticipantId,
    },
    LeaveLobby {
        code: RoomCode,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    /// First frame on every connection
    Welcome {
        participant_id: ParticipantId,
    },
    RoomListUpdate {
        rooms: Vec<RoomSummary>,
    },
    RoomCreated {
        code: RoomCode,
    },
    JoinedRoom {
        code: RoomCode,
        room_name: String,
        is_first_joiner: bool,
        duration_seconds: u64,
    },
    PlayerListUpdate {
        players: Vec<PlayerInfo>,
    },
    /// Private: the recipient's own role
    GameStarted {
        role: Role,
        teammates: Vec<String>,
    },
    StateUpdate {
        state: Phase,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        modifier: Option<ModifierInfo>,
        /// RFC 3339 time at which a timed phase ends
        #[serde(skip_serializing_if = "Option::is_none")]
        deadline: Option<String>,
        server_now: String,
    },
    /// Private: reminder of who is on the vampire side
    FactionRoster {
        members: Vec<String>,
    },
    VotingStarted {
        candidates: Vec<PlayerRef>,
    },
    VoteUpdate {
        count: usize,
        total: usize,
    },
    VoteResult {
        outcome: VoteOutcome,
        message: String,
    },
    NightStarted {
        message: String,
        alive_roster: Vec<PlayerRef>,
    },
    /// Broadcast at dawn, or sent privately to a seer after an inspection
    NightResult {
        message: String,
    },
    GameEnd {
        winner: Faction,
        message: String,
        roster: Vec<RoleReveal>,
    },
    Error {
        code: String,
        message: String,
    },
}

impl From<&crate::error::GameError> for ServerMessage {
    fn from(e: &crate::error::GameError) -> Self {
        ServerMessage::Error {
            code: e.code().to_string(),
            message: e.to_string(),
        }
    }
}

/// Public view of a player (never includes the role)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerInfo {
    pub id: ParticipantId,
    pub display_name: String,
    pub is_alive: bool,
    pub is_first_joiner: bool,
}

impl From<&Player> for PlayerInfo {
    fn from(p: &Player) -> Self {
        Self {
            id: p.id.clone(),
            display_name: p.display_name.clone(),
            is_alive: p.is_alive,
            is_first_joiner: p.is_first_joiner,
        }
    }
}

/// Targetable player (vote candidates, night roster)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerRef {
    pub id: ParticipantId,
    pub display_name: String,
}

impl From<&Player> for PlayerRef {
    fn from(p: &Player) -> Self {
        Self {
            id: p.id.clone(),
            display_name: p.display_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModifierInfo {
    pub id: DailyModifier,
    pub description: String,
}

impl From<DailyModifier> for ModifierInfo {
    fn from(m: DailyModifier) -> Self {
        Self {
            id: m,
            description: m.description().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VoteOutcome {
    Eliminated {
        id: ParticipantId,
        display_name: String,
        role: Role,
    },
    Tie {
        ids: Vec<ParticipantId>,
    },
    NoVotes,
}

/// End-of-game role reveal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoleReveal {
    pub id: ParticipantId,
    pub display_name: String,
    pub role: Option<Role>,
    pub is_alive: bool,
}

impl From<&Player> for RoleReveal {
    fn from(p: &Player) -> Self {
        Self {
            id: p.id.clone(),
            display_name: p.display_name.clone(),
            role: p.role,
            is_alive: p.is_alive,
        }
    }
}

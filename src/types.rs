use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Room code, also the key of the room's broadcast group
pub type RoomCode = String;

/// Opaque identity issued by the transport for one connection.
///
/// The engine only ever compares and hashes it; it is never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Issue a fresh id for a new connection
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }
}

impl Default for ParticipantId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ParticipantId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Lobby,
    Day,
    Voting,
    Night,
    Ended,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Member of the hidden faction
    Vampire,
    Villager,
    Protector,
    Seer,
    /// Sides with the vampires and knows them, but inspects as clean
    Mole,
}

impl Role {
    pub fn is_vampire(&self) -> bool {
        matches!(self, Role::Vampire)
    }

    /// Roles that are told who the vampires are
    pub fn knows_faction_roster(&self) -> bool {
        matches!(self, Role::Vampire | Role::Mole)
    }

    /// The night action this role may submit, if any
    pub fn night_action(&self) -> Option<NightActionKind> {
        match self {
            Role::Vampire => Some(NightActionKind::Kill),
            Role::Protector => Some(NightActionKind::Protect),
            Role::Seer => Some(NightActionKind::Inspect),
            Role::Villager | Role::Mole => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Vampire => "Vampire",
            Role::Villager => "Villager",
            Role::Protector => "Protector",
            Role::Seer => "Seer",
            Role::Mole => "Mole",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Faction {
    Village,
    Vampires,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: ParticipantId,
    pub display_name: String,
    /// Unassigned until the game starts
    pub role: Option<Role>,
    pub is_alive: bool,
    pub is_first_joiner: bool,
}

impl Player {
    pub fn new(id: ParticipantId, display_name: String, is_first_joiner: bool) -> Self {
        Self {
            id,
            display_name,
            role: None,
            is_alive: true,
            is_first_joiner,
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role == Some(role)
    }
}

/// Per-room settings, fixed at creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub name: String,
    pub password: Option<String>,
    pub faction_size: usize,
    pub discussion_seconds: u64,
}

impl SessionConfig {
    pub fn discussion(&self) -> Duration {
        Duration::from_secs(self.discussion_seconds)
    }

    /// An unset or empty password means the room is open
    pub fn has_password(&self) -> bool {
        self.password.as_deref().is_some_and(|p| !p.is_empty())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NightActionKind {
    Kill,
    Protect,
    Inspect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NightAction {
    pub actor: ParticipantId,
    pub kind: NightActionKind,
    pub target: ParticipantId,
}

/// Advisory rule flavour attached to a single day
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DailyModifier {
    BlindVote,
    Silence,
    DoubleTrouble,
}

impl DailyModifier {
    pub const ALL: [DailyModifier; 3] = [
        DailyModifier::BlindVote,
        DailyModifier::Silence,
        DailyModifier::DoubleTrouble,
    ];

    pub fn description(&self) -> &'static str {
        match self {
            DailyModifier::BlindVote => "Blind justice: votes are secret this round!",
            DailyModifier::Silence => "Vow of silence: no talking this round!",
            DailyModifier::DoubleTrouble => "Double trouble: two will hang today!",
        }
    }
}

/// Public listing entry for a room
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomSummary {
    pub code: RoomCode,
    pub name: String,
    pub has_password: bool,
    pub player_count: usize,
    pub phase: Phase,
}

//! One room's game
//!
//! [`Session`] owns all of a room's mutable state and is only ever touched by
//! its actor task (see [`actor`]), so every method here runs to completion
//! before the next client event or timer tick is looked at.

pub mod actor;
pub mod timer;

pub use actor::{spawn_session, SessionCommand, SessionHandle};
pub use timer::{PhaseTick, PhaseTimer, Timers, TokioTimers};

use crate::broadcast::Messenger;
use crate::error::{GameError, GameResult};
use crate::protocol::{
    ModifierInfo, PlayerInfo, PlayerRef, RoleReveal, ServerMessage, VoteOutcome,
};
use crate::rules::{self, TallyOutcome, Verdict};
use crate::types::*;
use rand::rngs::StdRng;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Default length of a night
pub const DEFAULT_NIGHT_SECONDS: u64 = 30;

/// Confirmation returned to a player who joined
#[derive(Debug, Clone, PartialEq)]
pub struct JoinAck {
    pub code: RoomCode,
    pub room_name: String,
    pub is_first_joiner: bool,
    pub duration_seconds: u64,
}

pub struct Session {
    code: RoomCode,
    config: SessionConfig,
    phase: Phase,
    /// Join order
    players: Vec<Player>,
    /// (voter, target), in the order ballots were first cast
    pending_votes: Vec<(ParticipantId, ParticipantId)>,
    /// In submission order; a resubmission moves to the back
    pending_night_actions: Vec<NightAction>,
    active_event: Option<DailyModifier>,
    phase_timer: Option<PhaseTimer>,
    /// Bumped on every phase entry
    epoch: u64,
    night_duration: Duration,
    messenger: Arc<dyn Messenger>,
    timers: Box<dyn Timers>,
    rng: StdRng,
}

impl Session {
    pub fn new(
        code: RoomCode,
        config: SessionConfig,
        night_duration: Duration,
        messenger: Arc<dyn Messenger>,
        timers: Box<dyn Timers>,
        rng: StdRng,
    ) -> Self {
        Self {
            code,
            config,
            phase: Phase::Lobby,
            players: Vec::new(),
            pending_votes: Vec::new(),
            pending_night_actions: Vec::new(),
            active_event: None,
            phase_timer: None,
            epoch: 0,
            night_duration,
            messenger,
            timers,
            rng,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn active_event(&self) -> Option<DailyModifier> {
        self.active_event
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            code: self.code.clone(),
            name: self.config.name.clone(),
            has_password: self.config.has_password(),
            player_count: self.players.len(),
            phase: self.phase,
        }
    }

    fn player(&self, id: &ParticipantId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id == id)
    }

    fn player_mut(&mut self, id: &ParticipantId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| &p.id == id)
    }

    fn is_alive(&self, id: &ParticipantId) -> bool {
        self.player(id).is_some_and(|p| p.is_alive)
    }

    fn alive_refs(&self) -> Vec<PlayerRef> {
        self.players
            .iter()
            .filter(|p| p.is_alive)
            .map(PlayerRef::from)
            .collect()
    }

    fn member_ids(&self) -> Vec<ParticipantId> {
        self.players.iter().map(|p| p.id.clone()).collect()
    }

    fn broadcast(&self, msg: ServerMessage) {
        self.messenger.broadcast(&self.member_ids(), msg);
    }

    fn broadcast_player_list(&self) {
        self.broadcast(ServerMessage::PlayerListUpdate {
            players: self.players.iter().map(PlayerInfo::from).collect(),
        });
    }

    fn broadcast_state(&self, message: String, deadline_in: Option<Duration>) {
        let now = chrono::Utc::now();
        let deadline = deadline_in
            .and_then(|d| chrono::TimeDelta::try_seconds(d.as_secs() as i64))
            .map(|d| (now + d).to_rfc3339());

        self.broadcast(ServerMessage::StateUpdate {
            state: self.phase,
            message,
            modifier: self.active_event.map(ModifierInfo::from),
            deadline,
            server_now: now.to_rfc3339(),
        });
    }

    /// Gameplay requests need a seat, and nothing is accepted once the game is over
    fn check_gameplay(&self, participant: &ParticipantId, phase: Phase) -> GameResult<()> {
        if self.player(participant).is_none() {
            return Err(GameError::NotInRoom);
        }
        if self.phase == Phase::Ended {
            return Err(GameError::SessionEnded);
        }
        if self.phase != phase {
            return Err(GameError::WrongPhase);
        }
        Ok(())
    }

    // ========== Membership ==========

    /// Seat a participant in the lobby
    pub fn join(
        &mut self,
        participant: ParticipantId,
        display_name: String,
        password: Option<String>,
    ) -> GameResult<JoinAck> {
        // Already seated: re-send the ack, no password needed
        if let Some(existing) = self.player(&participant) {
            let ack = self.join_ack(existing.is_first_joiner);
            self.send_join_ack(&participant, &ack);
            return Ok(ack);
        }

        if self.config.has_password() && password != self.config.password {
            return Err(GameError::WrongPassword);
        }

        if self.phase != Phase::Lobby {
            return Err(GameError::GameInProgress);
        }

        let display_name = display_name.trim().to_string();
        if display_name.is_empty() {
            return Err(GameError::InvalidName);
        }
        if self.players.iter().any(|p| p.display_name == display_name) {
            return Err(GameError::DuplicateName);
        }

        let is_first_joiner = self.players.is_empty();
        tracing::info!(
            "{} joined room {} (first joiner: {})",
            display_name,
            self.code,
            is_first_joiner
        );
        let ack = self.join_ack(is_first_joiner);
        self.send_join_ack(&participant, &ack);
        self.players
            .push(Player::new(participant, display_name, is_first_joiner));
        self.broadcast_player_list();

        Ok(ack)
    }

    /// The joiner hears about their seat before the room hears about them
    fn send_join_ack(&self, participant: &ParticipantId, ack: &JoinAck) {
        self.messenger.send_to(
            participant,
            ServerMessage::JoinedRoom {
                code: ack.code.clone(),
                room_name: ack.room_name.clone(),
                is_first_joiner: ack.is_first_joiner,
                duration_seconds: ack.duration_seconds,
            },
        );
    }

    fn join_ack(&self, is_first_joiner: bool) -> JoinAck {
        JoinAck {
            code: self.code.clone(),
            room_name: self.config.name.clone(),
            is_first_joiner,
            duration_seconds: self.config.discussion_seconds,
        }
    }

    /// Remove a participant; returns how many players remain
    pub fn leave(&mut self, participant: &ParticipantId) -> GameResult<usize> {
        let Some(index) = self.players.iter().position(|p| &p.id == participant) else {
            return Err(GameError::NotInRoom);
        };
        let player = self.players.remove(index);
        tracing::info!("{} left room {}", player.display_name, self.code);

        self.pending_votes
            .retain(|(voter, target)| voter != participant && target != participant);
        self.pending_night_actions
            .retain(|a| &a.actor != participant && &a.target != participant);

        if self.players.is_empty() {
            self.shutdown();
            return Ok(0);
        }

        self.broadcast_player_list();

        let in_play = matches!(self.phase, Phase::Day | Phase::Voting | Phase::Night);
        if in_play && !self.check_winner() && self.phase == Phase::Voting {
            self.close_ballot_if_complete();
        }

        Ok(self.players.len())
    }

    /// Cancel anything still scheduled
    pub fn shutdown(&mut self) {
        if let Some(timer) = self.phase_timer.take() {
            timer.cancel();
        }
    }

    // ========== Phase transitions ==========

    /// Deal roles and open the first day. Only the first joiner may start.
    pub fn start_game(&mut self, participant: &ParticipantId) -> GameResult<()> {
        self.check_gameplay(participant, Phase::Lobby)?;
        if !self.player(participant).is_some_and(|p| p.is_first_joiner) {
            return Err(GameError::NotModerator);
        }

        let ids = self.member_ids();
        let assigned = rules::assign_roles(&ids, self.config.faction_size, &mut self.rng)?;
        for (id, role) in assigned {
            if let Some(player) = self.player_mut(&id) {
                player.role = Some(role);
                player.is_alive = true;
            }
        }

        let roster = self.faction_roster();
        for player in &self.players {
            let Some(role) = player.role else { continue };
            let teammates = if role.knows_faction_roster() {
                roster
                    .iter()
                    .filter(|name| **name != player.display_name)
                    .cloned()
                    .collect()
            } else {
                Vec::new()
            };
            self.messenger
                .send_to(&player.id, ServerMessage::GameStarted { role, teammates });
        }

        tracing::info!(
            "Game started in room {} with {} players",
            self.code,
            self.players.len()
        );
        self.enter_day();
        Ok(())
    }

    fn faction_roster(&self) -> Vec<String> {
        self.players
            .iter()
            .filter(|p| p.role.is_some_and(|r| r.knows_faction_roster()))
            .map(|p| p.display_name.clone())
            .collect()
    }

    /// Common bookkeeping for every phase entry. Returns the tick for the new phase.
    fn enter_phase(&mut self, phase: Phase) -> PhaseTick {
        self.shutdown();
        self.epoch += 1;
        self.phase = phase;
        self.pending_votes.clear();
        self.pending_night_actions.clear();
        tracing::info!("Room {} entering {:?} (epoch {})", self.code, phase, self.epoch);
        PhaseTick {
            phase,
            epoch: self.epoch,
        }
    }

    fn arm(&mut self, delay: Duration, tick: PhaseTick) {
        self.phase_timer = Some(self.timers.schedule(delay, tick));
    }

    fn enter_day(&mut self) {
        let tick = self.enter_phase(Phase::Day);
        self.active_event = rules::roll_modifier(&mut self.rng);
        let discussion = self.config.discussion();
        self.arm(discussion, tick);

        self.broadcast_state(
            format!(
                "Day breaks! Discussion time: {} seconds.",
                self.config.discussion_seconds
            ),
            Some(discussion),
        );

        let roster = self.faction_roster();
        for player in &self.players {
            if player.role.is_some_and(|r| r.knows_faction_roster()) {
                self.messenger.send_to(
                    &player.id,
                    ServerMessage::FactionRoster {
                        members: roster.clone(),
                    },
                );
            }
        }
    }

    fn enter_voting(&mut self) {
        self.enter_phase(Phase::Voting);
        self.broadcast_state(
            "Voting has begun! Vote for the one you suspect.".to_string(),
            None,
        );
        self.broadcast(ServerMessage::VotingStarted {
            candidates: self.alive_refs(),
        });
    }

    fn enter_night(&mut self) {
        let tick = self.enter_phase(Phase::Night);
        self.active_event = None;
        self.arm(self.night_duration, tick);

        let message =
            "Night falls... The vampires hunt while the protector and seer get to work."
                .to_string();
        self.broadcast_state(message.clone(), Some(self.night_duration));
        self.broadcast(ServerMessage::NightStarted {
            message,
            alive_roster: self.alive_refs(),
        });
    }

    fn end_game(&mut self, winner: Faction) {
        self.enter_phase(Phase::Ended);
        self.active_event = None;

        let message = match winner {
            Faction::Village => "All the vampires are dead! The village wins!",
            Faction::Vampires => "The vampires have overrun the village! The vampires win!",
        };
        tracing::info!("Room {} ended, winner: {:?}", self.code, winner);

        self.broadcast(ServerMessage::GameEnd {
            winner,
            message: message.to_string(),
            roster: self.players.iter().map(RoleReveal::from).collect(),
        });
    }

    /// Ends the game if a side has won; true when it did
    fn check_winner(&mut self) -> bool {
        match rules::evaluate(&self.players) {
            Verdict::Winner(faction) => {
                self.end_game(faction);
                true
            }
            Verdict::Continue => false,
        }
    }

    /// Timer entry point. Ticks for a phase the session has already left do nothing.
    pub fn on_timer(&mut self, tick: PhaseTick) {
        if tick.phase != self.phase || tick.epoch != self.epoch {
            tracing::debug!(
                "Room {}: ignoring stale {:?} timer (epoch {}, now {:?}/{})",
                self.code,
                tick.phase,
                tick.epoch,
                self.phase,
                self.epoch
            );
            return;
        }
        self.phase_timer = None;

        match tick.phase {
            Phase::Day => self.enter_voting(),
            Phase::Night => self.resolve_night(),
            Phase::Lobby | Phase::Voting | Phase::Ended => {}
        }
    }

    // ========== Voting ==========

    pub fn vote(&mut self, voter: &ParticipantId, target: &ParticipantId) -> GameResult<()> {
        self.check_gameplay(voter, Phase::Voting)?;
        if !self.is_alive(voter) {
            return Err(GameError::NotYourTurn);
        }
        if !self.is_alive(target) {
            return Err(GameError::InvalidTarget);
        }

        match self.pending_votes.iter_mut().find(|(v, _)| v == voter) {
            Some((_, current)) => *current = target.clone(),
            None => self.pending_votes.push((voter.clone(), target.clone())),
        }
        tracing::debug!("Room {}: {} voted for {}", self.code, voter, target);

        self.close_ballot_if_complete();
        Ok(())
    }

    /// Report progress and tally once every living player has voted
    fn close_ballot_if_complete(&mut self) {
        let total = self.players.iter().filter(|p| p.is_alive).count();
        let count = self
            .pending_votes
            .iter()
            .filter(|(voter, _)| self.is_alive(voter))
            .count();
        self.broadcast(ServerMessage::VoteUpdate { count, total });

        if count >= total {
            self.resolve_votes();
        }
    }

    fn resolve_votes(&mut self) {
        let electorate: HashSet<ParticipantId> = self
            .players
            .iter()
            .filter(|p| p.is_alive)
            .map(|p| p.id.clone())
            .collect();

        let (outcome, message) = match rules::tally(&self.pending_votes, &electorate) {
            TallyOutcome::Eliminated(target) => match self.player_mut(&target) {
                Some(victim) => {
                    victim.is_alive = false;
                    let role = victim.role.unwrap_or(Role::Villager);
                    let message = format!(
                        "{} was hanged! Their role: {}",
                        victim.display_name,
                        role.display_name()
                    );
                    (
                        VoteOutcome::Eliminated {
                            id: victim.id.clone(),
                            display_name: victim.display_name.clone(),
                            role,
                        },
                        message,
                    )
                }
                None => (VoteOutcome::NoVotes, "Nobody was hanged.".to_string()),
            },
            TallyOutcome::Tie(ids) => (
                VoteOutcome::Tie { ids },
                "The vote is tied! Nobody was hanged.".to_string(),
            ),
            TallyOutcome::NoVotes => (VoteOutcome::NoVotes, "Nobody voted.".to_string()),
        };
        self.pending_votes.clear();
        tracing::info!("Room {}: {}", self.code, message);
        self.broadcast(ServerMessage::VoteResult { outcome, message });

        if !self.check_winner() {
            self.enter_night();
        }
    }

    // ========== Night ==========

    pub fn night_action(
        &mut self,
        actor: &ParticipantId,
        kind: NightActionKind,
        target: &ParticipantId,
    ) -> GameResult<()> {
        self.check_gameplay(actor, Phase::Night)?;
        let Some(player) = self.player(actor).filter(|p| p.is_alive) else {
            return Err(GameError::NotYourTurn);
        };
        if player.role.and_then(|r| r.night_action()) != Some(kind) {
            return Err(GameError::NotYourTurn);
        }
        if !self.is_alive(target) {
            return Err(GameError::InvalidTarget);
        }

        if kind == NightActionKind::Inspect {
            // One vision per night
            if self.pending_night_actions.iter().any(|a| &a.actor == actor) {
                return Err(GameError::NotYourTurn);
            }
            let Some(seen) = self.player(target) else {
                return Err(GameError::InvalidTarget);
            };
            let verdict = if rules::inspect(seen.role) {
                "a VAMPIRE"
            } else {
                "clean"
            };
            let message = format!("Vision: {} is {}!", seen.display_name, verdict);
            self.messenger
                .send_to(actor, ServerMessage::NightResult { message });
        }

        self.pending_night_actions.retain(|a| &a.actor != actor);
        self.pending_night_actions.push(NightAction {
            actor: actor.clone(),
            kind,
            target: target.clone(),
        });
        tracing::debug!(
            "Room {}: night action {:?} from {} on {}",
            self.code,
            kind,
            actor,
            target
        );
        Ok(())
    }

    fn resolve_night(&mut self) {
        let actions = std::mem::take(&mut self.pending_night_actions);
        let outcome = rules::resolve_night(&actions);

        let mut message = if outcome.attacked.is_some() {
            "A quiet night. The protector saved a life!".to_string()
        } else {
            "The night passed without incident.".to_string()
        };
        for id in &outcome.deaths {
            if let Some(victim) = self.player_mut(id) {
                victim.is_alive = false;
                message = format!("A terrible night! {} was found dead.", victim.display_name);
            }
        }
        tracing::info!("Room {}: {}", self.code, message);
        self.broadcast(ServerMessage::NightResult { message });

        if !self.check_winner() {
            self.enter_day();
        }
    }
}

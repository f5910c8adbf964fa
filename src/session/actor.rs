use super::timer::{PhaseTick, TokioTimers};
use super::{JoinAck, Session};
use crate::broadcast::Messenger;
use crate::error::{GameError, GameResult};
use crate::types::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;

const COMMAND_BUFFER: usize = 64;

type Reply<T> = oneshot::Sender<GameResult<T>>;

/// Everything a session reacts to, client requests and timer ticks alike
#[derive(Debug)]
pub enum SessionCommand {
    Join {
        participant: ParticipantId,
        display_name: String,
        password: Option<String>,
        reply: Reply<JoinAck>,
    },
    Leave {
        participant: ParticipantId,
        reply: Reply<usize>,
    },
    StartGame {
        participant: ParticipantId,
        reply: Reply<()>,
    },
    Vote {
        participant: ParticipantId,
        target: ParticipantId,
        reply: Reply<()>,
    },
    NightAction {
        participant: ParticipantId,
        kind: NightActionKind,
        target: ParticipantId,
        reply: Reply<()>,
    },
    TimerElapsed(PhaseTick),
    Close,
}

/// Cheap, cloneable handle to a running session task
#[derive(Debug, Clone)]
pub struct SessionHandle {
    code: RoomCode,
    tx: mpsc::Sender<SessionCommand>,
    summary: watch::Receiver<RoomSummary>,
    created_at: Instant,
}

/// Start a session task for a freshly created room
pub fn spawn_session(
    code: RoomCode,
    config: SessionConfig,
    night_duration: Duration,
    messenger: Arc<dyn Messenger>,
) -> SessionHandle {
    let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
    let timers = TokioTimers::new(tx.downgrade());
    let session = Session::new(
        code.clone(),
        config,
        night_duration,
        messenger,
        Box::new(timers),
        StdRng::from_os_rng(),
    );
    let (summary_tx, summary) = watch::channel(session.summary());

    tokio::spawn(run(session, rx, summary_tx));

    SessionHandle {
        code,
        tx,
        summary,
        created_at: Instant::now(),
    }
}

async fn run(
    mut session: Session,
    mut rx: mpsc::Receiver<SessionCommand>,
    summary: watch::Sender<RoomSummary>,
) {
    tracing::debug!("Session task started for room {}", session.code());

    while let Some(command) = rx.recv().await {
        match command {
            SessionCommand::Join {
                participant,
                display_name,
                password,
                reply,
            } => {
                let result = session.join(participant, display_name, password);
                respond(&session, &summary, reply, result);
            }
            SessionCommand::Leave { participant, reply } => {
                let result = session.leave(&participant);
                respond(&session, &summary, reply, result);
            }
            SessionCommand::StartGame { participant, reply } => {
                let result = session.start_game(&participant);
                respond(&session, &summary, reply, result);
            }
            SessionCommand::Vote {
                participant,
                target,
                reply,
            } => {
                let result = session.vote(&participant, &target);
                respond(&session, &summary, reply, result);
            }
            SessionCommand::NightAction {
                participant,
                kind,
                target,
                reply,
            } => {
                let result = session.night_action(&participant, kind, &target);
                respond(&session, &summary, reply, result);
            }
            SessionCommand::TimerElapsed(tick) => {
                session.on_timer(tick);
                publish(&session, &summary);
            }
            SessionCommand::Close => break,
        }
    }

    session.shutdown();
    tracing::debug!("Session task stopped for room {}", session.code());
}

/// The summary is current before the caller sees the reply
fn respond<T>(
    session: &Session,
    summary: &watch::Sender<RoomSummary>,
    reply: Reply<T>,
    result: GameResult<T>,
) {
    publish(session, summary);
    // Requester gave up waiting; the command still took effect
    let _ = reply.send(result);
}

fn publish(session: &Session, summary: &watch::Sender<RoomSummary>) {
    summary.send_if_modified(|current| {
        let next = session.summary();
        if *current == next {
            return false;
        }
        *current = next;
        true
    });
}

impl SessionHandle {
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Latest published summary
    pub fn summary(&self) -> RoomSummary {
        self.summary.borrow().clone()
    }

    /// Follow summary changes, including ones caused by the room's own timers
    pub fn subscribe(&self) -> watch::Receiver<RoomSummary> {
        self.summary.clone()
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> SessionCommand,
    ) -> GameResult<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| GameError::RoomNotFound)?;
        rx.await.map_err(|_| GameError::RoomNotFound)?
    }

    pub async fn join(
        &self,
        participant: ParticipantId,
        display_name: String,
        password: Option<String>,
    ) -> GameResult<JoinAck> {
        self.request(|reply| SessionCommand::Join {
            participant,
            display_name,
            password,
            reply,
        })
        .await
    }

    pub async fn leave(&self, participant: ParticipantId) -> GameResult<usize> {
        self.request(|reply| SessionCommand::Leave { participant, reply })
            .await
    }

    pub async fn start_game(&self, participant: ParticipantId) -> GameResult<()> {
        self.request(|reply| SessionCommand::StartGame { participant, reply })
            .await
    }

    pub async fn vote(&self, participant: ParticipantId, target: ParticipantId) -> GameResult<()> {
        self.request(|reply| SessionCommand::Vote {
            participant,
            target,
            reply,
        })
        .await
    }

    pub async fn night_action(
        &self,
        participant: ParticipantId,
        kind: NightActionKind,
        target: ParticipantId,
    ) -> GameResult<()> {
        self.request(|reply| SessionCommand::NightAction {
            participant,
            kind,
            target,
            reply,
        })
        .await
    }

    /// Stop the task. Pending timers are cancelled on the way out.
    pub async fn close(&self) {
        if self.tx.send(SessionCommand::Close).await.is_err() {
            tracing::debug!("Session {} already stopped", self.code);
        }
    }
}

use super::actor::SessionCommand;
use crate::types::Phase;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

/// Identifies the phase a timer was armed for.
///
/// `epoch` counts phase entries, so a tick from an earlier Day can't be
/// mistaken for the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTick {
    pub phase: Phase,
    pub epoch: u64,
}

/// Schedules a one-shot tick back into the owning session
pub trait Timers: Send {
    fn schedule(&self, delay: Duration, tick: PhaseTick) -> PhaseTimer;
}

/// Handle to a scheduled tick; dropping it does not cancel
#[derive(Debug, Default)]
pub struct PhaseTimer {
    handle: Option<AbortHandle>,
}

impl PhaseTimer {
    /// A timer with nothing to cancel
    pub fn detached() -> Self {
        Self { handle: None }
    }

    pub fn cancel(self) {
        if let Some(handle) = self.handle {
            handle.abort();
        }
    }
}

/// Tokio-backed timers delivering ticks through the session's command queue
pub struct TokioTimers {
    commands: mpsc::WeakSender<SessionCommand>,
}

impl TokioTimers {
    pub fn new(commands: mpsc::WeakSender<SessionCommand>) -> Self {
        Self { commands }
    }
}

impl Timers for TokioTimers {
    fn schedule(&self, delay: Duration, tick: PhaseTick) -> PhaseTimer {
        let commands = self.commands.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Session gone: nothing to wake
            let Some(tx) = commands.upgrade() else {
                return;
            };
            if tx.send(SessionCommand::TimerElapsed(tick)).await.is_err() {
                tracing::debug!("Session closed before {:?} timer fired", tick.phase);
            }
        });

        PhaseTimer {
            handle: Some(task.abort_handle()),
        }
    }
}

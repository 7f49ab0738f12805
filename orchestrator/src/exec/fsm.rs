//! Finite state machine for one poll session

use sdwan_models::CommandStatus;
use serde::{Deserialize, Serialize};

use super::channel::RemoteStatus;

/// Poll session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollState {
    /// Dispatched; not yet seen running
    Pending,

    /// Seen running on the target
    InProgress,

    Success,

    /// Remote failure, cancellation or remote timeout
    Failed,

    /// Local deadline elapsed without a terminal remote status
    TimedOut,
}

impl PollState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PollState::Success | PollState::Failed | PollState::TimedOut
        )
    }
}

/// Poll session event
#[derive(Debug, Clone)]
pub enum PollEvent {
    /// The service does not know the invocation yet
    NotYetVisible,

    /// The service reported a status
    Observed(RemoteStatus),

    /// The caller's deadline elapsed
    DeadlineElapsed,
}

/// Poll FSM
#[derive(Debug, Clone)]
pub struct PollFsm {
    state: PollState,
    polls: u32,
}

impl PollFsm {
    /// Create a new FSM in pending state
    pub fn new() -> Self {
        Self {
            state: PollState::Pending,
            polls: 0,
        }
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    /// Number of status observations processed
    pub fn polls(&self) -> u32 {
        self.polls
    }

    /// Normalized result status, once terminal
    pub fn outcome(&self) -> Option<CommandStatus> {
        match self.state {
            PollState::Success => Some(CommandStatus::Success),
            PollState::Failed => Some(CommandStatus::Failed),
            PollState::TimedOut => Some(CommandStatus::TimedOut),
            PollState::Pending | PollState::InProgress => None,
        }
    }

    /// Process an event and transition state
    pub fn process(&mut self, event: PollEvent) -> Result<(), String> {
        if self.state.is_terminal() {
            return Err(format!(
                "Invalid transition: {:?} -> {:?}",
                self.state, event
            ));
        }

        let new_state = match (&self.state, &event) {
            (_, PollEvent::DeadlineElapsed) => PollState::TimedOut,

            (state, PollEvent::NotYetVisible) => {
                self.polls += 1;
                *state
            }

            (state, PollEvent::Observed(status)) => {
                self.polls += 1;
                match status {
                    RemoteStatus::Success => PollState::Success,
                    RemoteStatus::Failed
                    | RemoteStatus::Cancelled
                    | RemoteStatus::Cancelling
                    | RemoteStatus::TimedOut => PollState::Failed,
                    RemoteStatus::Pending => *state,
                    RemoteStatus::InProgress | RemoteStatus::Delayed | RemoteStatus::Other(_) => {
                        PollState::InProgress
                    }
                }
            }
        };

        self.state = new_state;
        Ok(())
    }
}

impl Default for PollFsm {
    fn default() -> Self {
        Self::new()
    }
}

//! Dispatch one command and poll it to a terminal outcome

use std::time::Duration;

use sdwan_models::CommandResult;
use tracing::{debug, info, warn};

use crate::errors::OrchestratorError;

use super::channel::{ExecutionChannel, InvocationPoll, SendCommand};
use super::clock::Clock;
use super::fsm::{PollEvent, PollFsm};

/// Default delay between status queries
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    pub interval: Duration,
    /// Bound on the wait, measured from dispatch
    pub timeout: Duration,
}

impl PollOptions {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

/// Schedule `request` and wait for its outcome
///
/// A rejected send is a dispatch error and a failed status query is a poll
/// error; both propagate. A remote failure or an elapsed deadline is a
/// normal result. The dispatch is never retried.
pub async fn send_and_wait(
    channel: &dyn ExecutionChannel,
    clock: &dyn Clock,
    request: &SendCommand,
    options: &PollOptions,
) -> Result<CommandResult, OrchestratorError> {
    let command_id = channel.send(request).await.map_err(|e| match e {
        OrchestratorError::DispatchError { .. } => e,
        other => OrchestratorError::DispatchError {
            target: request.target_id.clone(),
            reason: other.to_string(),
        },
    })?;
    info!(
        "Dispatched command {} to {} in {}",
        command_id, request.target_id, request.region
    );

    let dispatched_at = clock.elapsed();
    let mut fsm = PollFsm::new();

    loop {
        let waited = clock.elapsed().saturating_sub(dispatched_at);
        if waited >= options.timeout {
            fsm.process(PollEvent::DeadlineElapsed)
                .map_err(OrchestratorError::StateError)?;
            warn!(
                "Command {} on {} timed out after {:?} ({} polls)",
                command_id,
                request.target_id,
                waited,
                fsm.polls()
            );
            return Ok(CommandResult::timed_out(command_id, &request.target_id));
        }

        clock
            .sleep(options.interval.min(options.timeout - waited))
            .await;

        let poll = channel
            .poll(&request.region, &command_id, &request.target_id)
            .await
            .map_err(|e| OrchestratorError::PollError {
                command_id: command_id.clone(),
                reason: e.to_string(),
            })?;

        let invocation = match poll {
            InvocationPoll::NotYetVisible => {
                debug!("Command {} not yet visible on {}", command_id, request.target_id);
                fsm.process(PollEvent::NotYetVisible)
                    .map_err(OrchestratorError::StateError)?;
                continue;
            }
            InvocationPoll::Observed(invocation) => invocation,
        };

        debug!(
            "Command {} on {}: {}",
            command_id, request.target_id, invocation.status
        );
        fsm.process(PollEvent::Observed(invocation.status.clone()))
            .map_err(OrchestratorError::StateError)?;

        if let Some(status) = fsm.outcome() {
            info!(
                "Command {} on {} finished: {}",
                command_id, request.target_id, invocation.status
            );
            return Ok(CommandResult {
                status,
                command_id,
                target_id: request.target_id.clone(),
                stdout: invocation.stdout,
                stderr: invocation.stderr,
            });
        }
    }
}

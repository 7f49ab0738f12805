//! Dispatch and poll loop tests on virtual time

use std::time::Duration;

use sdwan_models::CommandStatus;
use sdwan_orchestrator::errors::OrchestratorError;
use sdwan_orchestrator::exec::{
    send_and_wait, Clock, InvocationPoll, ManualClock, PollOptions, RemoteStatus, SendCommand,
};

use crate::common::{observed, ScriptedChannel};

const TARGET: &str = "i-0abc";

fn request() -> SendCommand {
    SendCommand::shell(TARGET, "us-east-1", "#!/bin/bash\necho hi\n", 60)
}

fn options(timeout_secs: u64) -> PollOptions {
    PollOptions::new(Duration::from_secs(15), Duration::from_secs(timeout_secs))
}

#[tokio::test]
async fn test_success_after_in_progress() {
    let channel = ScriptedChannel::new().script(
        TARGET,
        vec![
            observed(RemoteStatus::Pending, "", ""),
            observed(RemoteStatus::InProgress, "", ""),
            observed(RemoteStatus::Success, "done\n", ""),
        ],
    );
    let clock = ManualClock::new();

    let result = send_and_wait(&channel, &clock, &request(), &options(300))
        .await
        .unwrap();

    assert_eq!(result.status, CommandStatus::Success);
    assert_eq!(result.command_id, format!("cmd-{}", TARGET));
    assert_eq!(result.target_id, TARGET);
    assert_eq!(result.stdout, "done\n");
    assert_eq!(channel.sent().len(), 1);
    assert_eq!(channel.poll_count(), 3);
    assert_eq!(clock.sleeps(), vec![Duration::from_secs(15); 3]);
}

#[tokio::test]
async fn test_remote_failure_keeps_stderr() {
    let channel = ScriptedChannel::new().script(
        TARGET,
        vec![observed(RemoteStatus::Failed, "partial", "E: apt lock held")],
    );
    let clock = ManualClock::new();

    let result = send_and_wait(&channel, &clock, &request(), &options(300))
        .await
        .unwrap();

    assert_eq!(result.status, CommandStatus::Failed);
    assert_eq!(result.stdout, "partial");
    assert_eq!(result.stderr, "E: apt lock held");
}

#[tokio::test]
async fn test_cancelled_and_remote_timeout_are_failures() {
    for status in [
        RemoteStatus::Cancelled,
        RemoteStatus::Cancelling,
        RemoteStatus::TimedOut,
    ] {
        let channel = ScriptedChannel::new().script(TARGET, vec![observed(status, "", "")]);
        let result = send_and_wait(&channel, &ManualClock::new(), &request(), &options(300))
            .await
            .unwrap();
        assert_eq!(result.status, CommandStatus::Failed);
    }
}

#[tokio::test]
async fn test_not_yet_visible_is_transient() {
    let channel = ScriptedChannel::new().script(
        TARGET,
        vec![
            InvocationPoll::NotYetVisible,
            InvocationPoll::NotYetVisible,
            observed(RemoteStatus::Success, "ok", ""),
        ],
    );

    let result = send_and_wait(&channel, &ManualClock::new(), &request(), &options(300))
        .await
        .unwrap();
    assert_eq!(result.status, CommandStatus::Success);
    assert_eq!(channel.poll_count(), 3);
}

#[tokio::test]
async fn test_deadline_bounds_the_wait() {
    let channel =
        ScriptedChannel::new().script(TARGET, vec![observed(RemoteStatus::InProgress, "", "")]);
    let clock = ManualClock::new();

    let result = send_and_wait(&channel, &clock, &request(), &options(40))
        .await
        .unwrap();

    assert_eq!(result.status, CommandStatus::TimedOut);
    assert_eq!(result.command_id, format!("cmd-{}", TARGET));
    assert!(result.stdout.is_empty());
    assert_eq!(
        clock.sleeps(),
        vec![
            Duration::from_secs(15),
            Duration::from_secs(15),
            Duration::from_secs(10)
        ]
    );
    assert_eq!(clock.elapsed(), Duration::from_secs(40));
    assert_eq!(channel.sent().len(), 1);
}

#[tokio::test]
async fn test_never_visible_times_out() {
    let channel = ScriptedChannel::new().script(TARGET, vec![InvocationPoll::NotYetVisible]);
    let result = send_and_wait(&channel, &ManualClock::new(), &request(), &options(30))
        .await
        .unwrap();
    assert_eq!(result.status, CommandStatus::TimedOut);
    assert_eq!(channel.poll_count(), 2);
}

#[tokio::test]
async fn test_deadline_counts_from_dispatch() {
    let channel =
        ScriptedChannel::new().script(TARGET, vec![observed(RemoteStatus::InProgress, "", "")]);
    let clock = ManualClock::new();
    clock.advance(Duration::from_secs(1000));

    let result = send_and_wait(&channel, &clock, &request(), &options(30))
        .await
        .unwrap();
    assert_eq!(result.status, CommandStatus::TimedOut);
    assert_eq!(clock.elapsed(), Duration::from_secs(1030));
}

#[tokio::test]
async fn test_rejected_dispatch_is_an_error() {
    let channel = ScriptedChannel::new().reject(TARGET);
    let result = send_and_wait(&channel, &ManualClock::new(), &request(), &options(300)).await;

    match result {
        Err(OrchestratorError::DispatchError { target, reason }) => {
            assert_eq!(target, TARGET);
            assert!(reason.contains("throttled"));
        }
        other => panic!("expected a dispatch error, got {:?}", other),
    }
    assert_eq!(channel.poll_count(), 0);
}

#[tokio::test]
async fn test_failed_status_query_is_an_error() {
    let channel = ScriptedChannel::new().break_polls(TARGET);
    let result = send_and_wait(&channel, &ManualClock::new(), &request(), &options(300)).await;

    match result {
        Err(OrchestratorError::PollError { command_id, .. }) => {
            assert_eq!(command_id, format!("cmd-{}", TARGET));
        }
        other => panic!("expected a poll error, got {:?}", other),
    }
}

//! Remote command execution channel

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::OrchestratorError;

/// Document that runs its `commands` parameter as a shell script
pub const RUN_SHELL_SCRIPT: &str = "AWS-RunShellScript";

/// One command invocation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendCommand {
    pub target_id: String,
    pub region: String,
    pub document_name: String,
    pub commands: Vec<String>,
    pub timeout_seconds: u64,
}

impl SendCommand {
    /// Run `payload` as a shell script on `target_id`
    pub fn shell(
        target_id: impl Into<String>,
        region: impl Into<String>,
        payload: impl Into<String>,
        timeout_seconds: u64,
    ) -> Self {
        Self {
            target_id: target_id.into(),
            region: region.into(),
            document_name: RUN_SHELL_SCRIPT.to_string(),
            commands: vec![payload.into()],
            timeout_seconds,
        }
    }
}

/// Remote status vocabulary of the execution service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RemoteStatus {
    Pending,
    InProgress,
    Delayed,
    Success,
    Failed,
    Cancelled,
    Cancelling,
    TimedOut,
    /// Anything this client does not know about; treated as still running
    Other(String),
}

impl RemoteStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RemoteStatus::Success
                | RemoteStatus::Failed
                | RemoteStatus::Cancelled
                | RemoteStatus::Cancelling
                | RemoteStatus::TimedOut
        )
    }

    pub fn as_str(&self) -> &str {
        match self {
            RemoteStatus::Pending => "Pending",
            RemoteStatus::InProgress => "InProgress",
            RemoteStatus::Delayed => "Delayed",
            RemoteStatus::Success => "Success",
            RemoteStatus::Failed => "Failed",
            RemoteStatus::Cancelled => "Cancelled",
            RemoteStatus::Cancelling => "Cancelling",
            RemoteStatus::TimedOut => "TimedOut",
            RemoteStatus::Other(s) => s,
        }
    }
}

impl From<String> for RemoteStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Pending" => RemoteStatus::Pending,
            "InProgress" => RemoteStatus::InProgress,
            "Delayed" => RemoteStatus::Delayed,
            "Success" => RemoteStatus::Success,
            "Failed" => RemoteStatus::Failed,
            "Cancelled" => RemoteStatus::Cancelled,
            "Cancelling" => RemoteStatus::Cancelling,
            "TimedOut" => RemoteStatus::TimedOut,
            _ => RemoteStatus::Other(s),
        }
    }
}

impl From<RemoteStatus> for String {
    fn from(status: RemoteStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for RemoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observed state of one invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    pub status: RemoteStatus,
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
}

/// Poll answer; an invocation that the service has not registered yet is
/// an expected, transient condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationPoll {
    NotYetVisible,
    Observed(Invocation),
}

/// Asynchronous send-and-poll remote execution service
#[async_trait]
pub trait ExecutionChannel: Send + Sync {
    /// Schedule one invocation and return its command id
    async fn send(&self, request: &SendCommand) -> Result<String, OrchestratorError>;

    /// Query the invocation of `command_id` on `target_id`
    async fn poll(
        &self,
        region: &str,
        command_id: &str,
        target_id: &str,
    ) -> Result<InvocationPoll, OrchestratorError>;
}

//! Channel that records payloads instead of running them

use std::sync::Mutex;

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use crate::errors::OrchestratorError;

use super::channel::{ExecutionChannel, Invocation, InvocationPoll, RemoteStatus, SendCommand};

/// Accepts every command and reports it successful on the first poll
#[derive(Default)]
pub struct DryRunChannel {
    sent: Mutex<Vec<(String, SendCommand)>>,
}

impl DryRunChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded `(command_id, request)` pairs, in send order
    pub fn sent(&self) -> Vec<(String, SendCommand)> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl ExecutionChannel for DryRunChannel {
    async fn send(&self, request: &SendCommand) -> Result<String, OrchestratorError> {
        let command_id = Uuid::new_v4().to_string();
        let bytes: usize = request.commands.iter().map(String::len).sum();
        info!(
            "[dry-run] {} -> {} ({}, {} bytes)",
            command_id, request.target_id, request.document_name, bytes
        );
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((command_id.clone(), request.clone()));
        Ok(command_id)
    }

    async fn poll(
        &self,
        _region: &str,
        command_id: &str,
        _target_id: &str,
    ) -> Result<InvocationPoll, OrchestratorError> {
        let known = self
            .sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .any(|(id, _)| id == command_id);
        if !known {
            return Ok(InvocationPoll::NotYetVisible);
        }
        Ok(InvocationPoll::Observed(Invocation {
            status: RemoteStatus::Success,
            stdout: String::new(),
            stderr: String::new(),
        }))
    }
}

//! Execution gateway API

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::OrchestratorError;
use crate::exec::{ExecutionChannel, Invocation, InvocationPoll, SendCommand};
use crate::http::client::HttpClient;

/// Send command request body
#[derive(Debug, Clone, Serialize)]
pub struct SendCommandRequest<'a> {
    pub instance_ids: [&'a str; 1],
    pub document_name: &'a str,
    pub parameters: CommandParameters<'a>,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommandParameters<'a> {
    pub commands: &'a [String],
}

/// Send command response
#[derive(Debug, Clone, Deserialize)]
pub struct SendCommandResponse {
    pub command_id: String,
}

impl HttpClient {
    /// Schedule a command invocation
    pub async fn send_command(
        &self,
        request: &SendCommand,
    ) -> Result<SendCommandResponse, OrchestratorError> {
        let path = format!("/regions/{}/commands", request.region);
        let body = SendCommandRequest {
            instance_ids: [&request.target_id],
            document_name: &request.document_name,
            parameters: CommandParameters {
                commands: &request.commands,
            },
            timeout_seconds: request.timeout_seconds,
        };
        self.post(&path, &body).await
    }

    /// Fetch one invocation; `None` while the service has not registered it
    pub async fn get_invocation(
        &self,
        region: &str,
        command_id: &str,
        target_id: &str,
    ) -> Result<Option<Invocation>, OrchestratorError> {
        let path = format!(
            "/regions/{}/commands/{}/invocations/{}",
            region, command_id, target_id
        );
        self.get_optional(&path).await
    }
}

/// Execution channel backed by the execution gateway
pub struct HttpExecutionChannel {
    client: HttpClient,
}

impl HttpExecutionChannel {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ExecutionChannel for HttpExecutionChannel {
    async fn send(&self, request: &SendCommand) -> Result<String, OrchestratorError> {
        let response = self.client.send_command(request).await.map_err(|e| {
            OrchestratorError::DispatchError {
                target: request.target_id.clone(),
                reason: e.to_string(),
            }
        })?;
        Ok(response.command_id)
    }

    async fn poll(
        &self,
        region: &str,
        command_id: &str,
        target_id: &str,
    ) -> Result<InvocationPoll, OrchestratorError> {
        let invocation = self
            .client
            .get_invocation(region, command_id, target_id)
            .await?;
        Ok(match invocation {
            Some(invocation) => InvocationPoll::Observed(invocation),
            None => InvocationPoll::NotYetVisible,
        })
    }
}

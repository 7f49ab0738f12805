//! Shared fixtures: a populated directory and a scripted execution channel

use std::collections::{HashMap, HashSet, VecDeque};
use std::net::Ipv4Addr;
use std::sync::Mutex;

use async_trait::async_trait;

use sdwan_orchestrator::directory::{
    parameter_path, CloudPeering, InstanceRuntimeConfig, MemoryParameterStore, ParameterType,
};
use sdwan_orchestrator::errors::OrchestratorError;
use sdwan_orchestrator::exec::{
    ExecutionChannel, Invocation, InvocationPoll, RemoteStatus, SendCommand,
};

pub const PREFIX: &str = "/sdwan/";

/// Routers of the builtin topology with the region and host index used for
/// their fixture addresses
pub const FLEET: [(&str, &str, u8); 4] = [
    ("nv-sdwan", "us-east-1", 1),
    ("nv-branch1", "us-east-1", 2),
    ("fra-sdwan", "eu-central-1", 3),
    ("fra-branch1", "eu-central-1", 4),
];

pub fn instance_id(router: &str) -> String {
    format!("i-{}", router)
}

pub fn public_address(n: u8) -> Ipv4Addr {
    Ipv4Addr::new(54, 0, 0, n)
}

pub fn private_address(n: u8) -> Ipv4Addr {
    Ipv4Addr::new(10, 0, n, 10)
}

/// Publish the three required parameters of `router` into `region`
pub fn publish(store: &MemoryParameterStore, router: &str, region: &str, n: u8) {
    let put = |param, value: String| {
        store.insert(region, &parameter_path(PREFIX, router, param), &value);
    };
    put(ParameterType::InstanceId, instance_id(router));
    put(ParameterType::OutsideEip, public_address(n).to_string());
    put(ParameterType::OutsidePrivateIp, private_address(n).to_string());
}

/// A store holding every router of the builtin fleet
pub fn full_store() -> MemoryParameterStore {
    let store = MemoryParameterStore::new().with_page_size(3);
    for (router, region, n) in FLEET {
        publish(&store, router, region, n);
    }
    store
}

pub fn instance(router: &str, region: &str, n: u8) -> InstanceRuntimeConfig {
    InstanceRuntimeConfig {
        router: router.to_string(),
        region: region.to_string(),
        instance_id: instance_id(router),
        public_address: public_address(n),
        private_address: private_address(n),
        cloud: CloudPeering::default(),
    }
}

pub fn full_fleet() -> Vec<InstanceRuntimeConfig> {
    FLEET
        .iter()
        .map(|(router, region, n)| instance(router, region, *n))
        .collect()
}

pub fn observed(status: RemoteStatus, stdout: &str, stderr: &str) -> InvocationPoll {
    InvocationPoll::Observed(Invocation {
        status,
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
    })
}

/// Execution channel replaying per-target poll answers
///
/// The last scripted answer for a target repeats once the queue drains.
/// Targets without a script succeed on the first poll with empty output.
#[derive(Default)]
pub struct ScriptedChannel {
    answers: Mutex<HashMap<String, VecDeque<InvocationPoll>>>,
    rejected: Mutex<HashSet<String>>,
    broken_polls: Mutex<HashSet<String>>,
    sent: Mutex<Vec<SendCommand>>,
    polls: Mutex<usize>,
}

impl ScriptedChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, target: &str, answers: Vec<InvocationPoll>) -> Self {
        self.answers
            .lock()
            .unwrap()
            .insert(target.to_string(), answers.into());
        self
    }

    /// Refuse to schedule anything on `target`
    pub fn reject(self, target: &str) -> Self {
        self.rejected.lock().unwrap().insert(target.to_string());
        self
    }

    /// Fail every status query for `target`
    pub fn break_polls(self, target: &str) -> Self {
        self.broken_polls.lock().unwrap().insert(target.to_string());
        self
    }

    pub fn sent(&self) -> Vec<SendCommand> {
        self.sent.lock().unwrap().clone()
    }

    pub fn poll_count(&self) -> usize {
        *self.polls.lock().unwrap()
    }
}

#[async_trait]
impl ExecutionChannel for ScriptedChannel {
    async fn send(&self, request: &SendCommand) -> Result<String, OrchestratorError> {
        if self.rejected.lock().unwrap().contains(&request.target_id) {
            return Err(OrchestratorError::Internal("429: throttled".to_string()));
        }
        self.sent.lock().unwrap().push(request.clone());
        Ok(format!("cmd-{}", request.target_id))
    }

    async fn poll(
        &self,
        _region: &str,
        command_id: &str,
        target_id: &str,
    ) -> Result<InvocationPoll, OrchestratorError> {
        *self.polls.lock().unwrap() += 1;
        assert_eq!(command_id, format!("cmd-{}", target_id));

        if self.broken_polls.lock().unwrap().contains(target_id) {
            return Err(OrchestratorError::Internal("503: unavailable".to_string()));
        }

        let mut answers = self.answers.lock().unwrap();
        let Some(queue) = answers.get_mut(target_id) else {
            return Ok(observed(RemoteStatus::Success, "", ""));
        };
        let answer = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        Ok(answer.unwrap_or(InvocationPoll::NotYetVisible))
    }
}

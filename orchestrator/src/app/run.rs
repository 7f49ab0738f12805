//! Wire backends together and run one phase

use std::sync::Arc;
use std::time::Duration;

use sdwan_models::{PhaseName, PhaseResult};
use tracing::info;

use crate::app::options::{AppOptions, BackendOptions};
use crate::app::orchestrator::Orchestrator;
use crate::directory::{MemoryParameterStore, ParameterStore};
use crate::errors::OrchestratorError;
use crate::exec::{Clock, DryRunChannel, ExecutionChannel, ManualClock, TokioClock};
use crate::http::{HttpClient, HttpExecutionChannel, HttpParameterStore};
use crate::topology::Topology;

/// Run one phase invocation
pub async fn run(
    phase: PhaseName,
    event: serde_json::Value,
    topology: Topology,
    options: AppOptions,
) -> Result<PhaseResult, OrchestratorError> {
    let orchestrator = init(topology, options).await?;
    orchestrator.run_phase(phase, &event).await
}

// =============================== INITIALIZATION ================================== //

async fn init(topology: Topology, options: AppOptions) -> Result<Orchestrator, OrchestratorError> {
    let store = init_store(&options.backend).await?;
    let (channel, clock) = init_channel(&options.backend)?;

    Ok(Orchestrator::new(topology, options.run, channel, store, clock))
}

async fn init_store(backend: &BackendOptions) -> Result<Arc<dyn ParameterStore>, OrchestratorError> {
    if let Some(path) = &backend.params_file {
        info!("Reading directory parameters from {}", path.display());
        let store = MemoryParameterStore::from_file(path).await?;
        return Ok(Arc::new(store));
    }

    let client = gateway_client(&backend.gateway.parameters_url, backend)?;
    info!("Using parameter gateway at {}", client.base_url());
    Ok(Arc::new(HttpParameterStore::new(client)))
}

fn init_channel(
    backend: &BackendOptions,
) -> Result<(Arc<dyn ExecutionChannel>, Arc<dyn Clock>), OrchestratorError> {
    if backend.dry_run {
        info!("Dry run: payloads are recorded, not executed");
        return Ok((Arc::new(DryRunChannel::new()), Arc::new(ManualClock::new())));
    }

    let client = gateway_client(&backend.gateway.execution_url, backend)?;
    info!("Using execution gateway at {}", client.base_url());
    Ok((
        Arc::new(HttpExecutionChannel::new(client)),
        Arc::new(TokioClock::new()),
    ))
}

fn gateway_client(base_url: &str, backend: &BackendOptions) -> Result<HttpClient, OrchestratorError> {
    let timeout = Duration::from_secs(backend.gateway.request_timeout_secs);
    Ok(HttpClient::new(base_url, timeout)?.with_token(backend.gateway.token.clone()))
}

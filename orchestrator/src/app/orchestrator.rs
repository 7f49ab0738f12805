//! Phase orchestrator

use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt, TryStreamExt};
use sdwan_models::{CommandResult, CommandStatus, PhaseName, PhaseResult, RouterOutcome};
use tracing::{debug, info, warn};

use crate::app::options::RunOptions;
use crate::directory::{InstanceDirectory, ParameterStore};
use crate::errors::OrchestratorError;
use crate::exec::{send_and_wait, Clock, ExecutionChannel, PollOptions, SendCommand};
use crate::script::ScriptGenerator;
use crate::topology::Topology;
use crate::verify;

/// Runs one phase across its target set
pub struct Orchestrator {
    topology: Topology,
    options: RunOptions,
    channel: Arc<dyn ExecutionChannel>,
    store: Arc<dyn ParameterStore>,
    clock: Arc<dyn Clock>,
}

impl Orchestrator {
    pub fn new(
        topology: Topology,
        options: RunOptions,
        channel: Arc<dyn ExecutionChannel>,
        store: Arc<dyn ParameterStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            topology,
            options,
            channel,
            store,
            clock,
        }
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Routers targeted by `phase`, in processing order
    pub fn targets(&self, phase: PhaseName) -> Vec<String> {
        match phase {
            PhaseName::CloudPeering => self.topology.hub_names(),
            PhaseName::BaseSetup | PhaseName::VpnBgp | PhaseName::Verify => {
                self.topology.router_names()
            }
        }
    }

    /// Run `phase` on every target and reduce the outcomes
    ///
    /// A target without a usable directory entry gets a failed result and
    /// the phase moves on. Errors from the directory scan or the execution
    /// channel abort the invocation. `event` carries the previous phase's
    /// output and only gets logged.
    pub async fn run_phase(
        &self,
        phase: PhaseName,
        event: &serde_json::Value,
    ) -> Result<PhaseResult, OrchestratorError> {
        let started_at = Utc::now();
        let targets = self.targets(phase);
        info!("Starting {} on {} targets", phase, targets.len());
        if !event.is_null() {
            debug!("{} input event: {}", phase, event);
        }

        let directory = InstanceDirectory::load(
            self.store.as_ref(),
            &self.options.param_prefix,
            &self.options.regions,
        )
        .await?;
        let generator = ScriptGenerator::new(&self.topology, &directory, &self.options.scripts);
        let poll = self.options.poll_for(phase);

        let directory = &directory;
        let generator = &generator;
        let poll = &poll;
        let outcomes: Vec<(String, RouterOutcome)> = stream::iter(targets)
            .map(|router| async move {
                let outcome = self
                    .run_target(phase, &router, directory, generator, poll)
                    .await?;
                Ok::<_, OrchestratorError>((router, outcome))
            })
            .buffered(self.options.max_parallel_targets.max(1))
            .try_collect()
            .await?;

        let result = PhaseResult::from_outcomes(phase, outcomes).with_timing(started_at, Utc::now());
        info!(
            "Finished {}: {} succeeded, {} failed",
            phase, result.success_count, result.fail_count
        );

        if phase == PhaseName::Verify {
            self.publish_report(&result).await;
        }

        Ok(result)
    }

    async fn run_target(
        &self,
        phase: PhaseName,
        router: &str,
        directory: &InstanceDirectory,
        generator: &ScriptGenerator<'_>,
        poll: &PollOptions,
    ) -> Result<RouterOutcome, OrchestratorError> {
        let Some(instance) = directory.get(router) else {
            let reason = directory.miss_reason(router);
            warn!("{}", reason);
            return Ok(RouterOutcome::command(CommandResult::synthetic_failure(reason)));
        };

        let payload = match generator.payload(phase, router) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Cannot build {} payload for {}: {}", phase, router, e);
                return Ok(RouterOutcome::command(CommandResult::synthetic_failure(
                    e.to_string(),
                )));
            }
        };

        let request = SendCommand::shell(
            &instance.instance_id,
            &instance.region,
            payload,
            poll.timeout.as_secs(),
        );
        let result = send_and_wait(self.channel.as_ref(), self.clock.as_ref(), &request, poll).await?;

        // A timed-out command captured no output to judge
        if phase == PhaseName::Verify && result.status != CommandStatus::TimedOut {
            let details = verify::parse(&result.stdout, router, &self.topology);
            return Ok(RouterOutcome::verified(result, details));
        }
        Ok(RouterOutcome::command(result))
    }

    /// Persist the rendered report; failures are logged and dropped
    async fn publish_report(&self, result: &PhaseResult) {
        let report = verify::format_report(result);
        let persisted = verify::persist_report(
            self.store.as_ref(),
            &self.options.report.region,
            &self.options.report.parameter,
            &report,
        )
        .await;
        match persisted {
            Ok(()) => info!("Verification report written to {}", self.options.report.parameter),
            Err(e) => warn!(
                "Failed to persist verification report to {}: {}",
                self.options.report.parameter, e
            ),
        }
    }
}

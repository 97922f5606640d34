//! Background runs of catalogued agents.
//!
//! `call_agent` answers immediately; the agent runs on a [`TaskTracker`] so
//! shutdown can wait for in-flight runs. The outcome, success or failure, is
//! relayed through the notifier.

use crate::agents::{AgentExecutor, AgentSpec};
use crate::notifier::AgentNotifier;
use crate::types::RemoteAgentRequest;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;

#[derive(Debug, Clone, PartialEq)]
pub enum InvocationOutcome {
    Completed(String),
    Failed(String),
}

impl InvocationOutcome {
    /// The text posted to the notifier channel.
    pub fn message(&self) -> &str {
        match self {
            InvocationOutcome::Completed(text) | InvocationOutcome::Failed(text) => text,
        }
    }
}

/// Returned to the caller as soon as the run is scheduled.
#[derive(Debug)]
pub struct InvocationTicket {
    pub agent_name: String,
    pub handle: JoinHandle<InvocationOutcome>,
}

impl InvocationTicket {
    pub fn acknowledgement(&self) -> String {
        format!("{} started running..", self.agent_name)
    }
}

#[derive(Clone)]
pub struct RemoteInvoker {
    executor: Arc<AgentExecutor>,
    notifier: Arc<dyn AgentNotifier>,
    tracker: TaskTracker,
}

impl RemoteInvoker {
    pub fn new(
        executor: Arc<AgentExecutor>,
        notifier: Arc<dyn AgentNotifier>,
        tracker: TaskTracker,
    ) -> Self {
        Self {
            executor,
            notifier,
            tracker,
        }
    }

    pub fn invoke(&self, request: RemoteAgentRequest) -> InvocationTicket {
        let agent_name = request.agent_name.clone();
        let executor = self.executor.clone();
        let notifier = self.notifier.clone();

        let handle = self.tracker.spawn(async move {
            let spec = AgentSpec::from(&request);
            let outcome = match executor.execute_once(&spec, &request.input_query).await {
                Ok(trace) => match trace.final_response {
                    Some(text) => InvocationOutcome::Completed(text),
                    None => InvocationOutcome::Failed(format!(
                        "Agent {} failed: finished without a final response",
                        spec.name
                    )),
                },
                Err(e) => InvocationOutcome::Failed(format!("Agent {} failed: {}", spec.name, e)),
            };

            match &outcome {
                InvocationOutcome::Completed(_) => {
                    tracing::info!(agent = %spec.name, "Remote agent finished")
                }
                InvocationOutcome::Failed(reason) => {
                    tracing::error!(agent = %spec.name, error = %reason, "Remote agent failed")
                }
            }

            if let Err(e) = notifier.send_agent_response(outcome.message()).await {
                tracing::warn!(agent = %spec.name, error = %e, "Could not relay agent response");
            }
            outcome
        });

        InvocationTicket { agent_name, handle }
    }
}

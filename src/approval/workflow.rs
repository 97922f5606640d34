use crate::approval::card::{approved_text, expired_text, rejected_text};
use crate::approval::{
    ApprovalBook, ApprovalDecision, ApprovalRequest, ApprovalState, ChatChannel, ReviewCard,
};
use crate::db::Catalog;
use crate::types::{AgentDefinition, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::task::TaskTracker;

/// A button click that claimed its request. Acknowledge the interaction,
/// then hand it to [`ApprovalWorkflow::settle`].
#[derive(Debug)]
pub struct Claimed {
    request: ApprovalRequest,
    decision: ApprovalDecision,
}

impl Claimed {
    pub fn request_id(&self) -> &str {
        &self.request.id
    }

    pub fn decision(&self) -> ApprovalDecision {
        self.decision
    }
}

/// Outcome of resolving a button click.
#[derive(Debug)]
pub enum Click {
    Claimed(Claimed),
    /// The request was already decided or expired.
    Stale,
    /// The button id does not name a decision.
    Unrecognized,
}

impl Click {
    /// Ephemeral reply for clicks that change nothing.
    pub fn notice(&self) -> Option<&'static str> {
        match self {
            Click::Claimed(_) => None,
            Click::Stale => Some("This request is no longer pending."),
            Click::Unrecognized => Some("This button is not recognized."),
        }
    }
}

/// Drives review requests from card to decision.
#[derive(Clone)]
pub struct ApprovalWorkflow {
    book: Arc<ApprovalBook>,
    channel: Arc<dyn ChatChannel>,
    catalog: Arc<Catalog>,
    timeout: Duration,
    tracker: TaskTracker,
}

impl ApprovalWorkflow {
    pub fn new(
        channel: Arc<dyn ChatChannel>,
        catalog: Arc<Catalog>,
        timeout: Duration,
        tracker: TaskTracker,
    ) -> Self {
        Self {
            book: Arc::new(ApprovalBook::new()),
            channel,
            catalog,
            timeout,
            tracker,
        }
    }

    pub fn book(&self) -> &ApprovalBook {
        &self.book
    }

    /// Open a request, post its card and arm the expiry timer.
    /// Returns the request id.
    pub async fn submit(&self, definition: AgentDefinition) -> Result<String> {
        let card = ReviewCard::for_agent(&definition);
        let request = self.book.open(definition);

        let message = match self.channel.send_card(&request.id, &card).await {
            Ok(message) => message,
            Err(e) => {
                self.book.discard(&request.id);
                return Err(e);
            }
        };
        self.book.attach(&request.id, message);

        tracing::info!(
            request = %request.id,
            agent = %request.definition.agent_name,
            "Review request sent"
        );

        let workflow = self.clone();
        let id = request.id.clone();
        self.tracker.spawn(async move {
            tokio::time::sleep(workflow.timeout).await;
            workflow.expire(&id).await;
            workflow.book.forget(&id);
        });

        Ok(request.id)
    }

    /// Resolve a button click against the book. Claiming removes the
    /// request from the pending table, so only one click ever wins.
    pub fn click(&self, custom_id: &str) -> Click {
        let Some((decision, request_id)) = ApprovalDecision::parse_custom_id(custom_id) else {
            tracing::warn!(custom_id, "Unrecognized button click");
            return Click::Unrecognized;
        };
        match self.book.resolve(request_id, decision.state()) {
            Some(request) => Click::Claimed(Claimed { request, decision }),
            None => Click::Stale,
        }
    }

    /// Apply a claimed decision: close the card and, on approval, index the
    /// agent. A failure is also reported to the review channel.
    pub async fn settle(&self, claimed: Claimed, mention: &str) -> Result<ApprovalState> {
        let Claimed { request, decision } = claimed;
        let result = self.apply(&request, decision, mention).await;
        if let Err(e) = &result {
            tracing::error!(request = %request.id, error = %e, "Failed to apply decision");
            let notice = format!("Could not apply the decision: {}", e);
            if let Err(e) = self.relay_response(&notice).await {
                tracing::warn!(
                    request = %request.id,
                    error = %e,
                    "Failed to report decision failure"
                );
            }
        }
        result
    }

    async fn apply(
        &self,
        request: &ApprovalRequest,
        decision: ApprovalDecision,
        mention: &str,
    ) -> Result<ApprovalState> {
        let text = match decision {
            ApprovalDecision::Approve => approved_text(mention),
            ApprovalDecision::Reject => rejected_text(mention),
        };
        if let Some(message) = &request.message {
            if let Err(e) = self.channel.close_card(message, &text).await {
                tracing::warn!(
                    request = %request.id,
                    error = %e,
                    "Could not close decided card"
                );
            }
        }

        if decision == ApprovalDecision::Approve {
            self.catalog.register_agent(&request.definition).await?;
            tracing::info!(
                request = %request.id,
                agent = %request.definition.agent_name,
                "Agent approved and indexed"
            );
        } else {
            tracing::info!(
                request = %request.id,
                agent = %request.definition.agent_name,
                "Agent rejected"
            );
        }

        Ok(decision.state())
    }

    /// Time out a request that is still pending. Returns whether it was.
    pub async fn expire(&self, request_id: &str) -> bool {
        let Some(request) = self.book.resolve(request_id, ApprovalState::TimedOut) else {
            return false;
        };

        tracing::info!(
            request = %request.id,
            agent = %request.definition.agent_name,
            "Review request expired"
        );

        if let Some(message) = &request.message {
            if let Err(e) = self.channel.close_card(message, &expired_text(self.timeout)).await {
                tracing::warn!(request = %request.id, error = %e, "Could not close expired card");
            }
        }
        true
    }

    /// Post an agent's answer to the review channel.
    pub async fn relay_response(&self, text: &str) -> Result<()> {
        self.channel.send_text(text).await
    }
}

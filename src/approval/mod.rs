//! Human approval of new agents.
//!
//! A review request is opened when the registry asks for a new agent, shown
//! as a card with Approve/Reject buttons, and resolved by the first click or
//! by its expiry timer. Resolution removes the request from the pending
//! table, so exactly one outcome is ever applied.

pub mod card;
pub mod channel;
pub mod discord;
pub mod workflow;

pub use card::ReviewCard;
pub use channel::{ChatChannel, MessageRef};
pub use discord::{ApprovalHandler, DiscordChannel};
pub use workflow::{ApprovalWorkflow, Claimed, Click};

use crate::types::AgentDefinition;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalState {
    Pending,
    Approved,
    Rejected,
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalDecision {
    Approve,
    Reject,
}

impl ApprovalDecision {
    pub fn state(self) -> ApprovalState {
        match self {
            ApprovalDecision::Approve => ApprovalState::Approved,
            ApprovalDecision::Reject => ApprovalState::Rejected,
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            ApprovalDecision::Approve => "approve",
            ApprovalDecision::Reject => "reject",
        }
    }

    /// Button id carrying both the decision and the request it applies to.
    pub fn custom_id(self, request_id: &str) -> String {
        format!("{}:{}", self.prefix(), request_id)
    }

    pub fn parse_custom_id(custom_id: &str) -> Option<(Self, &str)> {
        let (prefix, request_id) = custom_id.split_once(':')?;
        let decision = match prefix {
            "approve" => ApprovalDecision::Approve,
            "reject" => ApprovalDecision::Reject,
            _ => return None,
        };
        if request_id.is_empty() {
            return None;
        }
        Some((decision, request_id))
    }
}

#[derive(Debug, Clone)]
pub struct ApprovalRequest {
    pub id: String,
    pub definition: AgentDefinition,
    pub created_at: DateTime<Utc>,
    /// The card showing this request, once it has been sent.
    pub message: Option<MessageRef>,
}

/// Pending requests plus the terminal state of resolved ones. A resolved
/// state is kept until the request's expiry timer forgets it.
#[derive(Default)]
pub struct ApprovalBook {
    pending: DashMap<String, ApprovalRequest>,
    resolved: DashMap<String, ApprovalState>,
}

impl ApprovalBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self, definition: AgentDefinition) -> ApprovalRequest {
        let request = ApprovalRequest {
            id: Uuid::new_v4().simple().to_string(),
            definition,
            created_at: Utc::now(),
            message: None,
        };
        self.pending.insert(request.id.clone(), request.clone());
        request
    }

    pub fn attach(&self, id: &str, message: MessageRef) {
        if let Some(mut request) = self.pending.get_mut(id) {
            request.message = Some(message);
        }
    }

    /// Move a pending request to `state`. Returns `None` when the request
    /// was already resolved (or never existed).
    pub fn resolve(&self, id: &str, state: ApprovalState) -> Option<ApprovalRequest> {
        let (_, request) = self.pending.remove(id)?;
        self.resolved.insert(request.id.clone(), state);
        Some(request)
    }

    /// Drop a request whose card could not be delivered.
    pub fn discard(&self, id: &str) {
        self.pending.remove(id);
    }

    /// Drop the resolved state of a request.
    pub fn forget(&self, id: &str) {
        self.resolved.remove(id);
    }

    pub fn state(&self, id: &str) -> Option<ApprovalState> {
        if self.pending.contains_key(id) {
            return Some(ApprovalState::Pending);
        }
        self.resolved.get(id).map(|state| *state)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn resolved_len(&self) -> usize {
        self.resolved.len()
    }
}

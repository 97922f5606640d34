use crate::types::AgentDefinition;
use std::time::Duration;

pub const CARD_TITLE: &str = "Agent Review Request";

/// Discord rejects embed field values longer than this.
pub const FIELD_VALUE_LIMIT: usize = 1024;

/// The approval card for one agent, independent of how it is rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewCard {
    pub title: String,
    pub fields: Vec<(String, String)>,
}

impl ReviewCard {
    pub fn for_agent(definition: &AgentDefinition) -> Self {
        Self {
            title: CARD_TITLE.to_string(),
            fields: vec![
                ("Agent Name".to_string(), definition.agent_name.clone()),
                (
                    "Agent Description".to_string(),
                    definition.agent_description.clone(),
                ),
                (
                    "Agent Instruction".to_string(),
                    definition.agent_instruction.clone(),
                ),
                ("Tools".to_string(), definition.tools.join(",")),
            ],
        }
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }
}

pub fn approved_text(mention: &str) -> String {
    format!("✅ **Approved** by {}", mention)
}

pub fn rejected_text(mention: &str) -> String {
    format!("❌ Rejected by {}", mention)
}

pub fn expired_text(timeout: Duration) -> String {
    format!(
        "⌛ **Expired**: no decision within {} seconds",
        timeout.as_secs()
    )
}

/// Clamp a field value for display. Empty values are shown as "-".
pub fn display_value(value: &str) -> String {
    if value.trim().is_empty() {
        return "-".to_string();
    }
    if value.chars().count() <= FIELD_VALUE_LIMIT {
        return value.to_string();
    }
    let mut clamped: String = value.chars().take(FIELD_VALUE_LIMIT - 3).collect();
    clamped.push_str("...");
    clamped
}

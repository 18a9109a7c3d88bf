use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tutorloom_catalog::Role;

/// Tag on one `interaction_history` entry (spec §3: "each event has
/// `timestamp`, `kind`, `payload`"). `role`/`text` below play the role of
/// `payload` — typed rather than free-form, since the set of shapes a
/// conversation event can take is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HistoryEventKind {
    UserMessage,
    BotTurn,
    UserInterrupt,
    UserInterruptMessage,
}

/// One append-only entry in `ConversationContext::interaction_history`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEvent {
    pub turn: usize,
    pub timestamp: DateTime<Utc>,
    pub kind: HistoryEventKind,
    /// Set only for `BOT_TURN` entries.
    pub role: Option<Role>,
    pub text: String,
}

impl HistoryEvent {
    /// Render as `[role name]: text`, the context-block line format the
    /// turn-generation contract feeds back to the generator (spec §4.D).
    pub fn render(&self) -> String {
        match self.role {
            Some(role) => format!("[{role}]: {}", self.text),
            None => format!("[user]: {}", self.text),
        }
    }
}

/// Record of one classified interruption message (spec §3 "InterruptionEvent").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterruptionRecord {
    pub turn: usize,
    pub unit_index_at_interrupt: usize,
    pub raw_text: String,
    pub classified_intent: String,
    pub confidence: f32,
    pub queue_before: [Role; 5],
    pub queue_after: [Role; 5],
    pub reallocated: bool,
}

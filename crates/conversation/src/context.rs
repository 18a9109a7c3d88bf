use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tutorloom_catalog::Role;

use crate::history::{HistoryEvent, InterruptionRecord};
use crate::state::ConversationState;

/// Bumped whenever the persisted blob shape changes. `load_state` rejects
/// any other value with `SCHEMA_MISMATCH` (spec §6).
pub const SCHEMA_VERSION: u32 = 1;

/// One recorded generator/embedding failure, surfaced read-only through
/// `get_state_summary()` so a UI can render "something went wrong, retry?"
/// without inspecting error types (spec §7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub turn: usize,
    pub timestamp: DateTime<Utc>,
    pub cause: String,
}

/// Per-session mutable state (spec §3 "ConversationContext"). Exclusively
/// owned by one [`crate::ConversationMachine`] — no other component may
/// mutate it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationContext {
    pub session_id: String,
    pub current_state: ConversationState,
    pub current_unit_index: usize,
    pub total_units: usize,
    pub interrupted_at_index: i64,
    pub interruption_count: usize,
    pub bot_is_generating: bool,
    pub awaiting_user_input: bool,
    pub interaction_history: Vec<HistoryEvent>,
    /// Role display name -> number of `BOT_TURN` history entries that used it.
    pub role_usage_count: BTreeMap<String, usize>,
    /// Role display name -> turn number a role is pinned under hysteresis until.
    pub hysteresis_until: BTreeMap<String, i64>,
    pub turn_number: usize,
    /// Unit id -> its current role queue. Mutated only by the Reallocator's
    /// output, applied here by [`crate::ConversationMachine`].
    pub queues: BTreeMap<String, [Role; 5]>,
    /// Index into the current unit's queue of the next role a bot turn
    /// should use. Reset to 0 whenever `current_unit_index` changes.
    pub queue_position: usize,
    /// Turn number before which a new reallocation attempt is ignored with
    /// `STABILITY_BLOCK` (spec §4.E bounded-delay window). `-1` = no freeze.
    pub realloc_frozen_until: i64,
    /// Bumped on every `USER_INTERRUPT`; lets a caller tell an in-flight
    /// generator response apart from the generation it was started for, so
    /// it can discard a stale `finish_bot_response` call (spec §5).
    pub generation_token: u64,
    pub interruption_log: Vec<InterruptionRecord>,
    pub last_error: Option<ErrorRecord>,
    #[serde(default)]
    pub session_metadata: BTreeMap<String, Value>,

    /// Ordered unit ids, set by `attach_assignment`. Lets `current_unit_index`
    /// resolve to the unit id `queues` is keyed by, without the machine
    /// having to own unit text.
    #[serde(default)]
    pub unit_ids: Vec<String>,
    /// Role resolved for the turn currently in flight (set by
    /// `start_bot_response`, consumed by `finish_bot_response`).
    #[serde(default)]
    pub pending_role: Option<Role>,
}

impl ConversationContext {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            current_state: ConversationState::Idle,
            current_unit_index: 0,
            total_units: 0,
            interrupted_at_index: -1,
            interruption_count: 0,
            bot_is_generating: false,
            awaiting_user_input: false,
            interaction_history: Vec::new(),
            role_usage_count: BTreeMap::new(),
            hysteresis_until: BTreeMap::new(),
            turn_number: 0,
            queues: BTreeMap::new(),
            queue_position: 0,
            realloc_frozen_until: -1,
            generation_token: 0,
            interruption_log: Vec::new(),
            last_error: None,
            session_metadata: BTreeMap::new(),
            unit_ids: Vec::new(),
            pending_role: None,
        }
    }

    /// The unit id `current_unit_index` resolves to, if a document is attached.
    pub fn current_unit_id(&self) -> Option<&str> {
        self.unit_ids.get(self.current_unit_index).map(String::as_str)
    }

    /// The queue currently in force for the unit at `current_unit_index`.
    pub fn current_queue(&self) -> Option<&[Role; 5]> {
        self.current_unit_id().and_then(|id| self.queues.get(id))
    }
}

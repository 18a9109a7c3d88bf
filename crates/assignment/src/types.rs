use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tutorloom_catalog::Role;

use crate::scoring::ScoreComponents;

/// One unit's role queue plus the full score telemetry that produced it
/// (spec §4.C "Output").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentEntry {
    pub unit_id: String,
    pub queue: [Role; 5],
    /// Keyed by role display name for stable serialization order.
    pub scores: BTreeMap<String, ScoreComponents>,
    pub primary: Role,
    pub confidence: f32,
}

/// The full `unit.id -> RoleQueue` mapping plus score telemetry
/// (spec §3 "Assignment").
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Assignment {
    pub entries: Vec<AssignmentEntry>,
}

impl Assignment {
    pub fn queue_for(&self, unit_id: &str) -> Option<&[Role; 5]> {
        self.entries.iter().find(|e| e.unit_id == unit_id).map(|e| &e.queue)
    }

    pub fn entry_for(&self, unit_id: &str) -> Option<&AssignmentEntry> {
        self.entries.iter().find(|e| e.unit_id == unit_id)
    }
}

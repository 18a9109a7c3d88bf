use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tutorloom_catalog::SectionKind;

/// A cohesive chunk of document content, the atom the rest of the engine
/// dialogues over. Created by [`crate::segment`]; immutable thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticUnit {
    /// Deterministic function of `(section index, group index)` — stable
    /// across repeated runs over the same document.
    pub id: String,
    pub title: Option<String>,
    pub text: String,
    pub section_kind: SectionKind,
    pub position: usize,
    pub cohesion: f32,
    pub word_count: usize,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl SemanticUnit {
    /// `true` when `unit.metadata["complexity"] == "high"` (spec §4.C topic
    /// score bonus). Tolerant of the key being absent or a non-string value.
    pub fn is_high_complexity(&self) -> bool {
        matches!(self.metadata.get("complexity"), Some(Value::String(s)) if s == "high")
    }
}

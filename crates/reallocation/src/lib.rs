//! Interruption intent classification and role-queue reallocation
//! (spec §4.E, component E).
//!
//! Both halves of this crate are pure functions of their inputs: intent
//! classification never looks beyond the text it's given, and
//! [`reallocate`] never mutates anything — it returns a new queue and the
//! set of roles that should acquire hysteresis, leaving the conversation
//! state machine to own the actual `ConversationContext` fields.

mod alignment;
mod intent;
mod reallocate;

pub use alignment::align;
pub use intent::{Intent, IntentClassification, RELOCATION_CONFIDENCE_THRESHOLD, classify};
pub use reallocate::{ReallocationOutcome, reallocate};

use serde::{Deserialize, Serialize};

/// The six per-session states (spec §4.D).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    Idle,
    Ready,
    Engaged,
    Interrupted,
    Paused,
    Completed,
}

impl ConversationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationState::Idle => "idle",
            ConversationState::Ready => "ready",
            ConversationState::Engaged => "engaged",
            ConversationState::Interrupted => "interrupted",
            ConversationState::Paused => "paused",
            ConversationState::Completed => "completed",
        }
    }
}

impl std::fmt::Display for ConversationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The full event alphabet (spec §4.D). The session control API in
/// [`crate::ConversationMachine`] is how callers actually drive the
/// machine; this enum exists so rejected transitions can name the event
/// that was rejected rather than just the verb that was called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Initialize,
    DocumentLoaded,
    RolesAssigned,
    StartDialogue,
    BotResponseStart,
    BotResponseEnd,
    UserMessage,
    UserInterrupt,
    UserInterruptMessage,
    Resume,
    Pause,
    ResumeFromPause,
    NextUnit,
    Complete,
    Error,
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::Initialize => "INITIALIZE",
            Event::DocumentLoaded => "DOCUMENT_LOADED",
            Event::RolesAssigned => "ROLES_ASSIGNED",
            Event::StartDialogue => "START_DIALOGUE",
            Event::BotResponseStart => "BOT_RESPONSE_START",
            Event::BotResponseEnd => "BOT_RESPONSE_END",
            Event::UserMessage => "USER_MESSAGE",
            Event::UserInterrupt => "USER_INTERRUPT",
            Event::UserInterruptMessage => "USER_INTERRUPT_MESSAGE",
            Event::Resume => "RESUME",
            Event::Pause => "PAUSE",
            Event::ResumeFromPause => "RESUME_FROM_PAUSE",
            Event::NextUnit => "NEXT_UNIT",
            Event::Complete => "COMPLETE",
            Event::Error => "ERROR",
        }
    }
}

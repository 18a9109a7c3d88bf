//! Per-session dialogue driver (spec §4.D, component D — the largest piece
//! of the engine). Consumes a [`tutorloom_assignment::Assignment`] and
//! drives the six-state session lifecycle: attach a document and its role
//! queues, run the bot/user turn loop, handle interruption (consulting
//! [`tutorloom_reallocation`] to reorder the queue), pause/resume, and
//! completion — with a serializable [`ConversationContext`] that a
//! [`tutorloom_storage::SessionStore`] can persist between calls.
//!
//! The machine never talks to a model provider or a disk directly; it only
//! knows the [`tutorloom_llm::Generator`] trait and produces an opaque JSON
//! blob for whatever session store the caller wires in.

mod context;
mod error;
mod history;
mod machine;
mod prompt;
mod state;

pub use context::{ConversationContext, ErrorRecord, SCHEMA_VERSION};
pub use error::ConversationError;
pub use history::{HistoryEvent, HistoryEventKind, InterruptionRecord};
pub use machine::{ConversationMachine, ConversationSummary, InterruptOutcome, ReallocationReport};
pub use prompt::{CONTEXT_WINDOW, build_prompt};
pub use state::{ConversationState, Event};

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use tutorloom_assignment::{Mode, assign};
    use tutorloom_catalog::Role;
    use tutorloom_llm::{CollaboratorError, GenerationRequest, Generator};
    use tutorloom_segmenter::SemanticUnit;

    use super::*;

    fn sample_unit(id: &str, position: usize, text: &str) -> SemanticUnit {
        SemanticUnit {
            id: id.to_string(),
            title: None,
            text: text.to_string(),
            section_kind: tutorloom_catalog::SectionKind::Body,
            position,
            cohesion: 1.0,
            word_count: text.split_whitespace().count(),
            metadata: Default::default(),
        }
    }

    struct EchoGenerator;

    #[async_trait]
    impl Generator for EchoGenerator {
        async fn generate(&self, request: GenerationRequest) -> Result<String, CollaboratorError> {
            Ok(format!("response to: {}", request.prompt.lines().last().unwrap_or_default()))
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl Generator for FailingGenerator {
        async fn generate(&self, _request: GenerationRequest) -> Result<String, CollaboratorError> {
            Err(CollaboratorError::Generator("backend is down".to_string()))
        }
    }

    fn two_unit_session() -> (ConversationMachine, Vec<SemanticUnit>) {
        let units =
            vec![sample_unit("S0_0", 0, "Entropy measures disorder."), sample_unit("S0_1", 1, "For example, shuffled cards.")];
        let assignment = assign(&units, Mode::Greedy);
        let mut machine = ConversationMachine::initialize("sess-1").unwrap();
        machine.load_document(units.len()).unwrap();
        machine.attach_assignment(&assignment).unwrap();
        machine.start_dialogue().unwrap();
        (machine, units)
    }

    #[test]
    fn fresh_machine_starts_idle() {
        let machine = ConversationMachine::initialize("sess-0").unwrap();
        assert_eq!(machine.context().current_state, ConversationState::Idle);
    }

    #[test]
    fn lifecycle_reaches_engaged_with_unit_zero() {
        let (machine, _units) = two_unit_session();
        assert_eq!(machine.context().current_state, ConversationState::Engaged);
        assert_eq!(machine.context().current_unit_index, 0);
    }

    #[test]
    fn document_loaded_before_idle_is_rejected() {
        let mut machine = ConversationMachine::initialize("sess-2").unwrap();
        machine.load_document(1).unwrap();
        let err = machine.load_document(1).unwrap_err();
        assert!(matches!(err, ConversationError::InvalidTransition { .. }));
    }

    #[test]
    fn zero_total_units_is_a_precondition_failure() {
        let mut machine = ConversationMachine::initialize("sess-3").unwrap();
        let err = machine.load_document(0).unwrap_err();
        assert!(matches!(err, ConversationError::PreconditionFailed(_)));
    }

    #[tokio::test]
    async fn run_bot_turn_records_history_and_advances_queue_position() {
        let (mut machine, units) = two_unit_session();
        let generator = EchoGenerator;
        let text = machine
            .run_bot_turn(&units[0].text, &generator, Duration::from_secs(30))
            .await
            .unwrap();
        assert!(text.contains("Entropy measures disorder."));
        assert_eq!(machine.context().interaction_history.len(), 1);
        assert_eq!(machine.context().queue_position, 1);
        assert!(!machine.context().bot_is_generating);
        assert!(machine.context().awaiting_user_input);
    }

    #[tokio::test]
    async fn generator_failure_reverts_flags_and_writes_no_history() {
        let (mut machine, units) = two_unit_session();
        let generator = FailingGenerator;
        let err = machine
            .run_bot_turn(&units[0].text, &generator, Duration::from_secs(30))
            .await
            .unwrap_err();
        assert!(matches!(err, ConversationError::GeneratorError(_)));
        assert!(machine.context().interaction_history.is_empty());
        assert!(!machine.context().bot_is_generating);
        assert!(machine.context().awaiting_user_input);
        assert!(machine.context().last_error.is_some());
    }

    #[test]
    fn finish_bot_response_with_a_stale_token_is_discarded() {
        let (mut machine, _units) = two_unit_session();
        let (_role, token) = machine.start_bot_response().unwrap();
        assert!(machine.context().bot_is_generating);
        // An interrupt arrives while the generator call is notionally in
        // flight — this bumps generation_token, modeling cancellation, and
        // immediately clears `bot_is_generating` rather than waiting for
        // the abandoned generation's `finish_bot_response` to show up.
        machine.user_clicks_interrupt().unwrap();
        assert!(!machine.context().bot_is_generating);

        // The generator's response for the pre-interrupt generation shows
        // up late; it must not be appended to history nor flip the flags
        // an interrupt-era caller may already be relying on.
        machine.finish_bot_response(token, Some("late answer")).unwrap();
        assert!(machine.context().interaction_history.is_empty());
        assert_eq!(machine.context().current_state, ConversationState::Interrupted);
        assert!(!machine.context().bot_is_generating);
    }

    #[test]
    fn finish_bot_response_with_the_current_token_is_accepted() {
        let (mut machine, _units) = two_unit_session();
        let (_role, token) = machine.start_bot_response().unwrap();
        machine.finish_bot_response(token, Some("on-time answer")).unwrap();
        assert_eq!(machine.context().interaction_history.len(), 1);
        assert!(!machine.context().bot_is_generating);
    }

    #[test]
    fn user_interrupt_records_index_and_count_exactly_once() {
        let (mut machine, _units) = two_unit_session();
        machine.process_user_message("let's begin").unwrap();
        let outcome = machine.user_clicks_interrupt().unwrap();
        assert_eq!(outcome, InterruptOutcome::Interrupted);
        assert_eq!(machine.context().current_state, ConversationState::Interrupted);
        assert_eq!(machine.context().interrupted_at_index, 0);
        assert_eq!(machine.context().interruption_count, 1);

        // Idempotent: clicking interrupt again must not re-increment, and
        // reports `AlreadyInterrupted` rather than silently succeeding.
        let outcome = machine.user_clicks_interrupt().unwrap();
        assert_eq!(outcome, InterruptOutcome::AlreadyInterrupted);
        assert_eq!(machine.context().interruption_count, 1);
    }

    #[test]
    fn interruption_via_other_event_does_not_touch_entry_fields() {
        let (mut machine, _units) = two_unit_session();
        machine.user_clicks_interrupt().unwrap();
        let before = machine.context().interruption_count;
        // BOT_RESPONSE_START while already interrupted must not recount.
        machine.start_bot_response().unwrap();
        assert_eq!(machine.context().interruption_count, before);
    }

    #[test]
    fn example_request_reallocates_example_generator_to_front() {
        let (mut machine, _units) = two_unit_session();
        machine.user_clicks_interrupt().unwrap();
        let report = machine
            .process_interruption_message(
                "can you give a concrete, real-world example to illustrate and demonstrate this?",
            )
            .unwrap();
        match report {
            ReallocationReport::Reallocated { queue, .. } => {
                assert_eq!(queue[0], Role::ExampleGenerator);
            }
            other => panic!("expected a reallocation, got {other:?}"),
        }
    }

    #[test]
    fn second_reallocation_within_freeze_window_is_stability_blocked() {
        let (mut machine, _units) = two_unit_session();
        machine.user_clicks_interrupt().unwrap();
        machine
            .process_interruption_message(
                "can you give a concrete, real-world example to illustrate and demonstrate this?",
            )
            .unwrap();
        let err = machine
            .process_interruption_message(
                "another concrete, real-world example to illustrate and demonstrate, please",
            )
            .unwrap_err();
        assert!(matches!(err, ConversationError::StabilityBlock { .. }));
    }

    #[test]
    fn low_confidence_message_leaves_queue_untouched() {
        let (mut machine, _units) = two_unit_session();
        machine.user_clicks_interrupt().unwrap();
        let queue_before = *machine.context().current_queue().unwrap();
        let report = machine.process_interruption_message("could you clarify").unwrap();
        assert!(matches!(report, ReallocationReport::BelowThreshold { .. }));
        assert_eq!(*machine.context().current_queue().unwrap(), queue_before);
    }

    #[test]
    fn unmatched_benign_message_leaves_queue_untouched() {
        // A message that matches none of the intent pattern families
        // classifies as `Other` with zero confidence — it must not clear
        // the reallocation threshold and rewrite the queue.
        let (mut machine, _units) = two_unit_session();
        machine.user_clicks_interrupt().unwrap();
        let queue_before = *machine.context().current_queue().unwrap();
        let report = machine.process_interruption_message("ok, thanks, got it").unwrap();
        match report {
            ReallocationReport::BelowThreshold { intent, confidence } => {
                assert_eq!(intent, "other");
                assert_eq!(confidence, 0.0);
            }
            other => panic!("expected BelowThreshold, got {other:?}"),
        }
        assert_eq!(*machine.context().current_queue().unwrap(), queue_before);
        assert_eq!(machine.context().realloc_frozen_until, -1);
    }

    #[test]
    fn resume_clears_interruption_and_returns_to_engaged() {
        let (mut machine, _units) = two_unit_session();
        machine.user_clicks_interrupt().unwrap();
        machine.resume_conversation(false).unwrap();
        assert_eq!(machine.context().current_state, ConversationState::Engaged);
        assert_eq!(machine.context().interrupted_at_index, -1);
    }

    #[test]
    fn advance_unit_reaches_completed_after_the_last_unit() {
        let (mut machine, _units) = two_unit_session();
        machine.advance_unit().unwrap();
        assert_eq!(machine.context().current_state, ConversationState::Engaged);
        assert_eq!(machine.context().current_unit_index, 1);
        machine.advance_unit().unwrap();
        assert_eq!(machine.context().current_state, ConversationState::Completed);
        assert_eq!(machine.context().current_unit_index, 1);
    }

    #[test]
    fn pause_and_resume_from_pause_round_trip() {
        let (mut machine, _units) = two_unit_session();
        machine.pause().unwrap();
        assert_eq!(machine.context().current_state, ConversationState::Paused);
        machine.resume_from_pause().unwrap();
        assert_eq!(machine.context().current_state, ConversationState::Engaged);
    }

    #[test]
    fn serialize_then_deserialize_preserves_observable_state() {
        let (mut machine, _units) = two_unit_session();
        machine.process_user_message("hello").unwrap();
        machine.user_clicks_interrupt().unwrap();
        machine.process_interruption_message("can you give a concrete example?").unwrap();

        let blob = machine.save_state();
        let restored = ConversationMachine::load_state(&blob).unwrap();

        assert_eq!(restored.context().turn_number, machine.context().turn_number);
        assert_eq!(restored.context().interruption_count, machine.context().interruption_count);
        assert_eq!(restored.context().current_unit_index, machine.context().current_unit_index);
        assert_eq!(
            restored.context().interaction_history.len(),
            machine.context().interaction_history.len()
        );
        assert_eq!(restored.context().queues, machine.context().queues);
    }

    #[test]
    fn load_state_rejects_unknown_schema_version() {
        let (machine, _units) = two_unit_session();
        let mut blob = machine.save_state();
        blob["schema_version"] = serde_json::json!(999);
        let err = ConversationMachine::load_state(&blob).unwrap_err();
        assert!(matches!(err, ConversationError::SchemaMismatch(_)));
    }
}

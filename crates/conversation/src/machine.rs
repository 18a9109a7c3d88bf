use std::time::Duration;

use chrono::Utc;
use serde_json::{Value, json};
use tutorloom_assignment::Assignment;
use tutorloom_catalog::{Role, lookup};
use tutorloom_llm::{GenerationRequest, Generator};
use tutorloom_reallocation::{RELOCATION_CONFIDENCE_THRESHOLD, classify, reallocate};

use crate::context::{ConversationContext, ErrorRecord, SCHEMA_VERSION};
use crate::error::ConversationError;
use crate::history::{HistoryEvent, HistoryEventKind, InterruptionRecord};
use crate::prompt::build_prompt;
use crate::state::{ConversationState, Event};

/// Hysteresis window applied to a role demoted ≥ 2 positions by a
/// reallocation (spec §4.E).
const HYSTERESIS_TURNS: i64 = 7;
/// Bounded-delay window during which further reallocation is refused
/// (spec §4.E).
const REALLOC_FREEZE_TURNS: i64 = 3;

/// Read-only projection returned by `get_state_summary()` (spec §6).
#[derive(Debug, Clone, serde::Serialize)]
pub struct ConversationSummary {
    pub session_id: String,
    pub state: ConversationState,
    pub current_unit_index: usize,
    pub total_units: usize,
    pub turn_number: usize,
    pub interruption_count: usize,
    pub awaiting_user_input: bool,
    pub bot_is_generating: bool,
    pub history_len: usize,
    pub error: Option<ErrorRecord>,
}

/// Outcome of `user_clicks_interrupt()` (spec §4.D idempotence, §6
/// `user_clicks_interrupt`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptOutcome {
    /// A fresh `USER_INTERRUPT`: the entry-rule fields were updated.
    Interrupted,
    /// The session was already `interrupted`; this call was a no-op and the
    /// entry-rule fields were left untouched (spec §4.D: "return success
    /// with a message `already interrupted`").
    AlreadyInterrupted,
}

/// Outcome of classifying and (maybe) acting on an interruption message
/// (spec §4.E).
#[derive(Debug, Clone, PartialEq)]
pub enum ReallocationReport {
    /// Confidence was below threshold; the queue was left untouched.
    BelowThreshold { intent: &'static str, confidence: f32 },
    /// Confidence cleared threshold and the queue was reordered.
    Reallocated { intent: &'static str, confidence: f32, queue: [Role; 5] },
}

/// The per-session conversation driver (spec §4.D, component D). Owns
/// exactly one [`ConversationContext`] and exposes the session control API
/// from spec §6 as inherent methods.
#[derive(Debug, Clone)]
pub struct ConversationMachine {
    context: ConversationContext,
}

impl ConversationMachine {
    /// `INITIALIZE`: idle -> idle (spec §4.D, §6 `initialize()`).
    pub fn initialize(session_id: impl Into<String>) -> Result<Self, ConversationError> {
        let session_id = session_id.into();
        if session_id.trim().is_empty() {
            return Err(ConversationError::InputInvalid("session_id must be non-empty".into()));
        }
        Ok(Self { context: ConversationContext::new(session_id) })
    }

    pub fn context(&self) -> &ConversationContext {
        &self.context
    }

    fn invalid(&self, event: Event) -> ConversationError {
        ConversationError::InvalidTransition {
            state: self.context.current_state.as_str(),
            event: event.name(),
        }
    }

    /// `DOCUMENT_LOADED`: idle -> ready (spec §6 `load_document`).
    pub fn load_document(&mut self, total_units: usize) -> Result<(), ConversationError> {
        if self.context.current_state != ConversationState::Idle {
            return Err(self.invalid(Event::DocumentLoaded));
        }
        if total_units == 0 {
            return Err(ConversationError::PreconditionFailed("total_units must be > 0".into()));
        }
        self.context.total_units = total_units;
        self.context.current_state = ConversationState::Ready;
        Ok(())
    }

    /// `ROLES_ASSIGNED`: ready -> ready (spec §6 `attach_assignment`).
    pub fn attach_assignment(&mut self, assignment: &Assignment) -> Result<(), ConversationError> {
        if self.context.current_state != ConversationState::Ready {
            return Err(self.invalid(Event::RolesAssigned));
        }
        if assignment.entries.len() != self.context.total_units {
            return Err(ConversationError::PreconditionFailed(format!(
                "assignment has {} entries but total_units is {}",
                assignment.entries.len(),
                self.context.total_units
            )));
        }
        self.context.unit_ids = assignment.entries.iter().map(|e| e.unit_id.clone()).collect();
        self.context.queues =
            assignment.entries.iter().map(|e| (e.unit_id.clone(), e.queue)).collect();
        Ok(())
    }

    /// `START_DIALOGUE`: ready -> engaged (spec §6 `start_dialogue`).
    pub fn start_dialogue(&mut self) -> Result<(), ConversationError> {
        if self.context.current_state != ConversationState::Ready {
            return Err(self.invalid(Event::StartDialogue));
        }
        self.context.current_unit_index = 0;
        self.context.queue_position = 0;
        self.context.current_state = ConversationState::Engaged;
        Ok(())
    }

    /// `BOT_RESPONSE_START`: engaged/interrupted -> same (spec §6
    /// `start_bot_response`). Returns the role resolved for this turn
    /// (current queue's next unused position) and the generation token the
    /// caller should present back to `finish_bot_response` to detect a
    /// stale response (spec §5).
    pub fn start_bot_response(&mut self) -> Result<(Role, u64), ConversationError> {
        if !matches!(
            self.context.current_state,
            ConversationState::Engaged | ConversationState::Interrupted
        ) {
            return Err(self.invalid(Event::BotResponseStart));
        }
        let queue = self
            .context
            .current_queue()
            .copied()
            .ok_or_else(|| ConversationError::PreconditionFailed("no queue for current unit".into()))?;
        let role = queue[self.context.queue_position % queue.len()];
        self.context.pending_role = Some(role);
        self.context.bot_is_generating = true;
        self.context.awaiting_user_input = false;
        Ok((role, self.context.generation_token))
    }

    /// `BOT_RESPONSE_END`: engaged/interrupted -> same (spec §6
    /// `finish_bot_response`). No-op once `bot_is_generating` is already
    /// `false` (spec §4.D idempotence). `token` is the value
    /// `start_bot_response` returned for the generation this call claims to
    /// finish; if a `USER_INTERRUPT` happened in the meantime the token has
    /// moved on, and this call is a late-arriving response from a
    /// generation the session has already abandoned — it is dropped with a
    /// logged `stale_generator_response` rather than appended to history
    /// (spec §5: "any in-flight generator response that arrives afterward
    /// must be *discarded* by the caller on the basis of the state
    /// transition"; invariant 3 depends on this never double-writing a
    /// turn into the wrong epoch). The token check runs before the
    /// idempotence check so a stale call is logged even though
    /// `user_clicks_interrupt` already cleared `bot_is_generating` for an
    /// in-flight generation.
    pub fn finish_bot_response(
        &mut self,
        token: u64,
        text: Option<&str>,
    ) -> Result<(), ConversationError> {
        if token != self.context.generation_token {
            tracing::info!(
                session_id = %self.context.session_id,
                expected = self.context.generation_token,
                got = token,
                "stale_generator_response"
            );
            if self.context.bot_is_generating {
                self.context.bot_is_generating = false;
                self.context.awaiting_user_input = true;
                self.context.pending_role = None;
            }
            return Ok(());
        }
        if !self.context.bot_is_generating {
            return Ok(());
        }
        let role = self.context.pending_role.take();
        self.context.bot_is_generating = false;
        self.context.awaiting_user_input = true;

        if let Some(text) = text {
            let turn = self.context.turn_number;
            self.context.interaction_history.push(HistoryEvent {
                turn,
                timestamp: Utc::now(),
                kind: HistoryEventKind::BotTurn,
                role,
                text: text.to_string(),
            });
            self.context.turn_number += 1;
            self.context.queue_position += 1;
            if let Some(role) = role {
                *self.context.role_usage_count.entry(role.name().to_string()).or_insert(0) += 1;
            }
        }
        Ok(())
    }

    /// `USER_MESSAGE`: engaged -> engaged (spec §6 `process_user_message`).
    pub fn process_user_message(&mut self, text: &str) -> Result<(), ConversationError> {
        if self.context.current_state != ConversationState::Engaged {
            return Err(self.invalid(Event::UserMessage));
        }
        if text.trim().is_empty() {
            return Err(ConversationError::InputInvalid("message text must be non-empty".into()));
        }
        let turn = self.context.turn_number;
        self.context.interaction_history.push(HistoryEvent {
            turn,
            timestamp: Utc::now(),
            kind: HistoryEventKind::UserMessage,
            role: None,
            text: text.to_string(),
        });
        self.context.turn_number += 1;
        Ok(())
    }

    /// `USER_INTERRUPT`: engaged -> interrupted (spec §6
    /// `user_clicks_interrupt`, critical entry rule in §4.D). Idempotent:
    /// calling this while already `interrupted` returns
    /// [`InterruptOutcome::AlreadyInterrupted`] rather than an error, and
    /// touches none of the entry-rule fields.
    pub fn user_clicks_interrupt(&mut self) -> Result<InterruptOutcome, ConversationError> {
        if self.context.current_state == ConversationState::Interrupted {
            return Ok(InterruptOutcome::AlreadyInterrupted);
        }
        if self.context.current_state != ConversationState::Engaged {
            return Err(self.invalid(Event::UserInterrupt));
        }
        self.context.interrupted_at_index = self.context.current_unit_index as i64;
        self.context.interruption_count += 1;
        self.context.generation_token += 1;
        // A generation in flight when the interrupt lands is cancelled
        // immediately: the session no longer expects a response for it, so
        // `bot_is_generating` must not hang even if the caller never calls
        // `finish_bot_response` for the abandoned generation (spec §5:
        // "USER_INTERRUPT is honored by setting the context fields
        // immediately").
        if self.context.bot_is_generating {
            self.context.bot_is_generating = false;
            self.context.awaiting_user_input = true;
            self.context.pending_role = None;
        }
        let turn = self.context.turn_number;
        self.context.interaction_history.push(HistoryEvent {
            turn,
            timestamp: Utc::now(),
            kind: HistoryEventKind::UserInterrupt,
            role: None,
            text: String::new(),
        });
        self.context.current_state = ConversationState::Interrupted;
        Ok(InterruptOutcome::Interrupted)
    }

    /// `USER_INTERRUPT_MESSAGE`: interrupted -> interrupted (spec §6
    /// `process_interruption_message`). Classifies intent (component E) and,
    /// if confidence clears threshold and the bounded-delay window has
    /// elapsed, reorders the current unit's queue.
    pub fn process_interruption_message(
        &mut self,
        text: &str,
    ) -> Result<ReallocationReport, ConversationError> {
        if self.context.current_state != ConversationState::Interrupted {
            return Err(self.invalid(Event::UserInterruptMessage));
        }
        if text.trim().is_empty() {
            return Err(ConversationError::InputInvalid("message text must be non-empty".into()));
        }

        let turn = self.context.turn_number;
        self.context.interaction_history.push(HistoryEvent {
            turn,
            timestamp: Utc::now(),
            kind: HistoryEventKind::UserInterruptMessage,
            role: None,
            text: text.to_string(),
        });
        self.context.turn_number += 1;

        let classification = classify(text);
        let intent_name = classification_intent_name(classification.intent);

        if classification.confidence < RELOCATION_CONFIDENCE_THRESHOLD {
            return Ok(ReallocationReport::BelowThreshold {
                intent: intent_name,
                confidence: classification.confidence,
            });
        }

        let current_turn = self.context.turn_number as i64;
        if current_turn < self.context.realloc_frozen_until {
            tracing::info!(
                session_id = %self.context.session_id,
                frozen_until = self.context.realloc_frozen_until,
                "stability_block"
            );
            return Err(ConversationError::StabilityBlock {
                frozen_until: self.context.realloc_frozen_until,
            });
        }

        let unit_id = self
            .context
            .current_unit_id()
            .ok_or_else(|| ConversationError::PreconditionFailed("no current unit".into()))?
            .to_string();
        let queue_before = *self
            .context
            .queues
            .get(&unit_id)
            .ok_or_else(|| ConversationError::NotFound(unit_id.clone()))?;

        let usage = role_counts_from(&self.context.role_usage_count);
        let hysteresis = turn_map_from(&self.context.hysteresis_until);
        let outcome =
            reallocate(&queue_before, classification.intent, &usage, &hysteresis, current_turn);

        self.context.queues.insert(unit_id.clone(), outcome.queue);
        for role in &outcome.newly_hysteresised {
            self.context
                .hysteresis_until
                .insert(role.name().to_string(), current_turn + HYSTERESIS_TURNS);
        }
        self.context.realloc_frozen_until = current_turn + REALLOC_FREEZE_TURNS;

        self.context.interruption_log.push(InterruptionRecord {
            turn,
            unit_index_at_interrupt: self.context.current_unit_index,
            raw_text: text.to_string(),
            classified_intent: intent_name.to_string(),
            confidence: classification.confidence,
            queue_before,
            queue_after: outcome.queue,
            reallocated: true,
        });

        Ok(ReallocationReport::Reallocated {
            intent: intent_name,
            confidence: classification.confidence,
            queue: outcome.queue,
        })
    }

    /// `RESUME`: interrupted -> engaged (spec §6 `resume_conversation`,
    /// §4.D "Resume semantics").
    pub fn resume_conversation(&mut self, from_start: bool) -> Result<(), ConversationError> {
        if self.context.current_state != ConversationState::Interrupted {
            return Err(self.invalid(Event::Resume));
        }
        if from_start && self.context.interrupted_at_index >= 0 {
            self.context.current_unit_index = self.context.interrupted_at_index as usize;
        }
        self.context.interrupted_at_index = -1;
        self.context.current_state = ConversationState::Engaged;
        Ok(())
    }

    /// `PAUSE`: engaged -> paused (spec §6 `pause`).
    pub fn pause(&mut self) -> Result<(), ConversationError> {
        if self.context.current_state != ConversationState::Engaged {
            return Err(self.invalid(Event::Pause));
        }
        self.context.current_state = ConversationState::Paused;
        Ok(())
    }

    /// `RESUME_FROM_PAUSE`: paused -> engaged (spec §6 `resume_from_pause`).
    pub fn resume_from_pause(&mut self) -> Result<(), ConversationError> {
        if self.context.current_state != ConversationState::Paused {
            return Err(self.invalid(Event::ResumeFromPause));
        }
        self.context.current_state = ConversationState::Engaged;
        Ok(())
    }

    /// `NEXT_UNIT`: engaged -> engaged or completed (spec §6 `advance_unit`,
    /// §4.D "Advance semantics").
    pub fn advance_unit(&mut self) -> Result<(), ConversationError> {
        if self.context.current_state != ConversationState::Engaged {
            return Err(self.invalid(Event::NextUnit));
        }
        let new_index = self.context.current_unit_index + 1;
        if new_index >= self.context.total_units {
            self.context.current_state = ConversationState::Completed;
        } else {
            self.context.current_unit_index = new_index;
            self.context.queue_position = 0;
        }
        Ok(())
    }

    /// Records a generator/embedding failure without mutating any other
    /// context field (spec §7: "leave the context in a clean state: no
    /// partial history, flags reverted").
    fn record_error(&mut self, cause: impl Into<String>) {
        self.context.last_error =
            Some(ErrorRecord { turn: self.context.turn_number, timestamp: Utc::now(), cause: cause.into() });
    }

    /// The full turn-generation contract (spec §4.D): resolves the role for
    /// the current queue position, builds the context-block prompt, calls
    /// the generator, and on success records the `BOT_TURN` history entry.
    /// On failure the flags `start_bot_response` set are reverted and no
    /// history entry is written — the caller sees a typed error instead.
    ///
    /// This convenience wrapper holds `&mut self` across the generator
    /// await, so within one call nothing else can interrupt it. A host that
    /// wants the suspension-point semantics of spec §5 — accepting
    /// `USER_INTERRUPT` *while* a generator call is in flight — should
    /// instead call `start_bot_response`/`finish_bot_response` directly
    /// around its own generator invocation, holding the machine behind a
    /// lock it releases for the duration of the await; `finish_bot_response`
    /// already discards a response whose token no longer matches.
    pub async fn run_bot_turn(
        &mut self,
        unit_text: &str,
        generator: &dyn Generator,
        deadline: Duration,
    ) -> Result<String, ConversationError> {
        let (role, token) = self.start_bot_response()?;
        let role_def = lookup(role);
        let prompt = build_prompt(role_def, &self.context.interaction_history, unit_text);

        let request = GenerationRequest { prompt, temperature: role_def.temperature, deadline };
        match generator.generate(request).await {
            Ok(text) => {
                self.finish_bot_response(token, Some(&text))?;
                Ok(text)
            }
            Err(err) => {
                self.context.bot_is_generating = false;
                self.context.awaiting_user_input = true;
                self.context.pending_role = None;
                let conv_err: ConversationError = err.into();
                self.record_error(conv_err.to_string());
                Err(conv_err)
            }
        }
    }

    /// `save_state()`: any -> unchanged (spec §6). Returns the persisted
    /// blob layout: `schema_version`, `session_id`, `state`, `context`, and
    /// `queues` (unit id -> ordered role-name list).
    pub fn save_state(&self) -> Value {
        let queues: std::collections::BTreeMap<String, Vec<&'static str>> = self
            .context
            .queues
            .iter()
            .map(|(unit_id, queue)| (unit_id.clone(), queue.iter().map(|r| r.name()).collect()))
            .collect();

        json!({
            "schema_version": SCHEMA_VERSION,
            "session_id": self.context.session_id,
            "state": self.context.current_state,
            "context": self.context,
            "queues": queues,
        })
    }

    /// `load_state(blob)`: idle -> restored (spec §6). Leaves the machine
    /// in `idle` on a `SCHEMA_MISMATCH` (spec §7 propagation policy).
    pub fn load_state(blob: &Value) -> Result<Self, ConversationError> {
        let schema_version = blob
            .get("schema_version")
            .and_then(Value::as_u64)
            .ok_or_else(|| ConversationError::SchemaMismatch("missing schema_version".into()))?;
        if schema_version != SCHEMA_VERSION as u64 {
            return Err(ConversationError::SchemaMismatch(format!(
                "unsupported schema_version {schema_version}"
            )));
        }
        let context_value = blob
            .get("context")
            .ok_or_else(|| ConversationError::SchemaMismatch("missing context".into()))?;
        let context: ConversationContext = serde_json::from_value(context_value.clone())
            .map_err(|err| ConversationError::SchemaMismatch(err.to_string()))?;
        Ok(Self { context })
    }

    /// `get_state_summary()`: any -> unchanged (spec §6).
    pub fn get_state_summary(&self) -> ConversationSummary {
        ConversationSummary {
            session_id: self.context.session_id.clone(),
            state: self.context.current_state,
            current_unit_index: self.context.current_unit_index,
            total_units: self.context.total_units,
            turn_number: self.context.turn_number,
            interruption_count: self.context.interruption_count,
            awaiting_user_input: self.context.awaiting_user_input,
            bot_is_generating: self.context.bot_is_generating,
            history_len: self.context.interaction_history.len(),
            error: self.context.last_error.clone(),
        }
    }
}

fn classification_intent_name(intent: tutorloom_reallocation::Intent) -> &'static str {
    use tutorloom_reallocation::Intent::*;
    match intent {
        Clarification => "clarification",
        Objection => "objection",
        ExampleRequest => "example-request",
        DepthRequest => "depth-request",
        SummaryRequest => "summary-request",
        TopicPivot => "topic-pivot",
        Other => "other",
    }
}

fn role_counts_from(
    by_name: &std::collections::BTreeMap<String, usize>,
) -> std::collections::BTreeMap<Role, usize> {
    by_name.iter().filter_map(|(name, count)| Role::from_name(name).map(|r| (r, *count))).collect()
}

fn turn_map_from(
    by_name: &std::collections::BTreeMap<String, i64>,
) -> std::collections::BTreeMap<Role, i64> {
    by_name.iter().filter_map(|(name, turn)| Role::from_name(name).map(|r| (r, *turn))).collect()
}

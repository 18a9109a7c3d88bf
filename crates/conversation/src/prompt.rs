use tutorloom_catalog::RoleDef;

use crate::history::HistoryEvent;

/// Last N turns rendered into the generator's context block (spec §4.D step 2).
pub const CONTEXT_WINDOW: usize = 10;

/// Build the full prompt body for one bot turn: the role's system prompt,
/// the last [`CONTEXT_WINDOW`] history turns rendered as `[role]: text`,
/// and the unit text the turn is about (spec §4.D "Turn generation
/// contract", step 2). The catalog's system prompts are appended verbatim
/// — nothing here interpolates variables into them (spec §4.B).
pub fn build_prompt(role: &RoleDef, history: &[HistoryEvent], unit_text: &str) -> String {
    let window_start = history.len().saturating_sub(CONTEXT_WINDOW);
    let context_block =
        history[window_start..].iter().map(HistoryEvent::render).collect::<Vec<_>>().join("\n");

    let mut prompt = String::with_capacity(role.system_prompt.len() + context_block.len() + unit_text.len() + 32);
    prompt.push_str(role.system_prompt);
    prompt.push_str("\n\n");
    prompt.push_str(&context_block);
    prompt.push_str("\n\nCurrent unit:\n");
    prompt.push_str(unit_text);
    prompt
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use tutorloom_catalog::{Role, lookup};

    use super::*;
    use crate::history::HistoryEventKind;

    #[test]
    fn prompt_includes_system_prompt_and_unit_text() {
        let role_def = lookup(Role::Explainer);
        let history = vec![HistoryEvent {
            turn: 1,
            timestamp: Utc::now(),
            kind: HistoryEventKind::UserMessage,
            role: None,
            text: "what does entropy mean?".to_string(),
        }];
        let prompt = build_prompt(role_def, &history, "Entropy measures disorder.");
        assert!(prompt.starts_with(role_def.system_prompt));
        assert!(prompt.contains("[user]: what does entropy mean?"));
        assert!(prompt.ends_with("Entropy measures disorder."));
    }

    #[test]
    fn prompt_keeps_only_the_last_context_window_turns() {
        let role_def = lookup(Role::Explainer);
        let history: Vec<HistoryEvent> = (0..25)
            .map(|i| HistoryEvent {
                turn: i,
                timestamp: Utc::now(),
                kind: HistoryEventKind::UserMessage,
                role: None,
                text: format!("turn {i}"),
            })
            .collect();
        let prompt = build_prompt(role_def, &history, "unit text");
        assert!(!prompt.contains("turn 14"));
        assert!(prompt.contains("turn 15"));
        assert!(prompt.contains("turn 24"));
    }
}

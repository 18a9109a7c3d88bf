use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tutorloom_catalog::{Role, RoleDef, SectionKind};
use tutorloom_segmenter::SemanticUnit;

/// The three weighted sub-scores plus their blend, all in `[0, 10]`
/// (spec §4.C).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub structural: f32,
    pub lexical: f32,
    pub topic: f32,
    pub total: f32,
}

/// Score every role against a single unit. `total_units` is needed for the
/// structural score's position-in-document heuristic.
pub fn score_unit(unit: &SemanticUnit, total_units: usize) -> Vec<(Role, ScoreComponents)> {
    Role::ALL
        .into_iter()
        .map(|role| {
            let def = tutorloom_catalog::lookup(role);
            let structural = structural_score(unit, def, total_units);
            let lexical = lexical_score(unit, def);
            let topic = topic_score(unit, def);
            let total = (0.4 * structural + 0.3 * lexical + 0.3 * topic).clamp(0.0, 10.0);
            (role, ScoreComponents { structural, lexical, topic, total })
        })
        .collect()
}

fn structural_score(unit: &SemanticUnit, def: &RoleDef, total_units: usize) -> f32 {
    let mut score = def.base_weight;

    score += section_bonus(unit.section_kind, def.role);
    score += position_bonus(unit.position, total_units, def.role);

    let word_count_matches = match def.role {
        Role::Summarizer => unit.word_count < 100,
        Role::Explainer => (100..=300).contains(&unit.word_count),
        _ => (50..=250).contains(&unit.word_count),
    };
    if word_count_matches {
        score += 0.2 * def.base_weight;
    }

    score.clamp(0.0, 10.0)
}

fn section_bonus(kind: SectionKind, role: Role) -> f32 {
    use Role::*;
    match (kind, role) {
        (SectionKind::Introduction, Summarizer) => 2.0,
        (SectionKind::Introduction, Explainer) => 2.0,
        (SectionKind::Introduction, MisconceptionSpotter) => 1.0,
        (SectionKind::Conclusion, Summarizer) => 3.0,
        (SectionKind::Conclusion, Explainer) => 0.5,
        (SectionKind::Conclusion, Challenger) => 0.5,
        (SectionKind::Methodology, MisconceptionSpotter) => 2.5,
        (SectionKind::Methodology, Explainer) => 2.0,
        (SectionKind::Methodology, ExampleGenerator) => 1.5,
        (SectionKind::Body, Challenger) => 1.5,
        (SectionKind::Body, ExampleGenerator) => 1.0,
        _ => 0.0,
    }
}

/// Position-in-document heuristic, capped at 1.0 (spec §4.C structural
/// score). `normalized` is `position / max(total_units - 1, 1)`, in `[0,1]`.
fn position_bonus(position: usize, total_units: usize, role: Role) -> f32 {
    let denom = (total_units.saturating_sub(1)).max(1) as f32;
    let normalized = (position as f32 / denom).clamp(0.0, 1.0);

    match role {
        Role::Explainer => 1.0 - normalized,
        Role::Summarizer => normalized,
        Role::Challenger => (1.0 - (normalized - 0.5).abs() * 2.0).max(0.0),
        _ => 0.0,
    }
}

/// Regex bonuses keyed by role name, each contributing a fixed +0.5 capped
/// at +1.0 total (spec §4.C: "each contribute fixed +0.5 up to a small
/// cap").
static ROLE_PATTERNS: Lazy<Vec<(Role, Regex)>> = Lazy::new(|| {
    vec![
        (Role::Explainer, Regex::new(r"(?i)defined as|refers to").unwrap()),
        (Role::ExampleGenerator, Regex::new(r"(?i)for example|for instance").unwrap()),
        (Role::Challenger, Regex::new(r"(?i)however|on the other hand").unwrap()),
        (Role::Summarizer, Regex::new(r"(?i)in (summary|short)").unwrap()),
        (Role::MisconceptionSpotter, Regex::new(r"(?i)common(ly)? (mistake|misconception)").unwrap()),
    ]
});

const REGEX_BONUS_CAP: f32 = 1.0;

fn lexical_score(unit: &SemanticUnit, def: &RoleDef) -> f32 {
    let lowered = unit.text.to_lowercase();

    let priority_hits: usize = def
        .priority_keywords
        .iter()
        .copied()
        .map(|kw| lowered.matches(kw).count())
        .sum();
    let avoid_hits: usize = def
        .avoid_keywords
        .iter()
        .copied()
        .map(|kw| lowered.matches(kw).count())
        .sum();

    let normalizer = (unit.word_count as f32 / 100.0).max(1.0);
    let scaled = (priority_hits as f32 / normalizer) * 2.0;
    let base_term = 0.5 * def.base_weight;
    let penalty = avoid_hits as f32 * 0.5;

    let regex_bonus: f32 = ROLE_PATTERNS
        .iter()
        .filter(|(role, _)| *role == def.role)
        .map(|(_, re)| if re.is_match(&lowered) { 0.5 } else { 0.0 })
        .sum::<f32>()
        .min(REGEX_BONUS_CAP);

    (scaled + base_term + regex_bonus - penalty).clamp(0.0, 10.0)
}

fn topic_score(unit: &SemanticUnit, def: &RoleDef) -> f32 {
    let mut score = def.base_weight;

    if def.affinity_tags.contains(&unit.section_kind) {
        score += 1.5;
    }

    if unit.is_high_complexity() && matches!(def.role, Role::Explainer | Role::MisconceptionSpotter) {
        score += 1.0;
    }

    if let Some(title) = &unit.title {
        let lowered_title = title.to_lowercase();
        let title_overlap =
            def.priority_keywords.iter().copied().any(|kw| lowered_title.contains(kw));
        if title_overlap {
            score += 0.3 * unit.cohesion * 10.0;
        }
    }

    score.clamp(0.0, 10.0)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn sample_unit(section_kind: SectionKind, text: &str, position: usize) -> SemanticUnit {
        SemanticUnit {
            id: "S0_0".to_string(),
            title: None,
            text: text.to_string(),
            section_kind,
            position,
            cohesion: 1.0,
            word_count: text.split_whitespace().count().max(1),
            metadata: HashMap::new(),
        }
    }

    #[test]
    fn introduction_unit_favors_summarizer_and_explainer() {
        let unit = sample_unit(
            SectionKind::Introduction,
            "This chapter introduces the core idea in plain terms for newcomers to the field.",
            0,
        );
        let scores = score_unit(&unit, 2);
        let scores: HashMap<Role, ScoreComponents> = scores.into_iter().collect();
        assert!(scores[&Role::Summarizer].total > scores[&Role::Challenger].total);
    }

    #[test]
    fn lexical_score_rewards_priority_keyword_density() {
        let unit = sample_unit(
            SectionKind::Body,
            "For example, consider a concrete case: for instance a small dataset.",
            1,
        );
        let scores = score_unit(&unit, 3);
        let scores: HashMap<Role, ScoreComponents> = scores.into_iter().collect();
        assert!(scores[&Role::ExampleGenerator].lexical > 4.0);
    }

    #[test]
    fn avoid_keywords_penalize_lexical_score() {
        let clean = sample_unit(SectionKind::Body, "A calm explanatory passage about the topic.", 0);
        let penalized = sample_unit(
            SectionKind::Body,
            "A calm explanatory passage that is wrong, wrong, and disagree, disagree.",
            0,
        );
        let clean_scores: HashMap<Role, ScoreComponents> = score_unit(&clean, 1).into_iter().collect();
        let penalized_scores: HashMap<Role, ScoreComponents> =
            score_unit(&penalized, 1).into_iter().collect();
        assert!(penalized_scores[&Role::Explainer].lexical < clean_scores[&Role::Explainer].lexical);
    }

    #[test]
    fn all_component_scores_are_clipped_to_valid_range() {
        let unit = sample_unit(
            SectionKind::Methodology,
            &"for example, defined as, common mistake, wrong wrong wrong ".repeat(20),
            0,
        );
        for (_, score) in score_unit(&unit, 1) {
            assert!((0.0..=10.0).contains(&score.structural));
            assert!((0.0..=10.0).contains(&score.lexical));
            assert!((0.0..=10.0).contains(&score.topic));
            assert!((0.0..=10.0).contains(&score.total));
        }
    }
}

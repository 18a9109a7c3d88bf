use std::collections::BTreeMap;

use tutorloom_catalog::Role;
use tutorloom_segmenter::SemanticUnit;

use crate::scoring::{ScoreComponents, score_unit};
use crate::types::{Assignment, AssignmentEntry};

/// Assignment strategy (spec §4.C).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Greedy,
    Balanced,
}

/// Target share of primary-role assignments under [`Mode::Balanced`]
/// (spec §4.C).
fn target_ratio(role: Role) -> f32 {
    match role {
        Role::Explainer => 0.30,
        Role::Challenger => 0.20,
        Role::ExampleGenerator => 0.20,
        Role::Summarizer => 0.15,
        Role::MisconceptionSpotter => 0.15,
    }
}

/// Sort a unit's five candidate roles by descending total score, ties
/// broken ascending by role name (spec §4.C determinism clause). This
/// ordering *is* the greedy queue, and is the candidate order balanced
/// mode walks.
fn sorted_candidates(unit: &SemanticUnit, total_units: usize) -> Vec<(Role, ScoreComponents)> {
    let mut scored = score_unit(unit, total_units);
    scored.sort_by(|(role_a, a), (role_b, b)| {
        b.total
            .partial_cmp(&a.total)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| role_a.name().cmp(role_b.name()))
    });
    scored
}

/// `assign(units, mode) -> Assignment` (spec §4.C). Pure and deterministic:
/// repeated calls over identical inputs produce byte-equal output
/// (spec §8 property 2, §8 scenario 6).
pub fn assign(units: &[SemanticUnit], mode: Mode) -> Assignment {
    let mut ordered_units: Vec<&SemanticUnit> = units.iter().collect();
    ordered_units.sort_by_key(|u| u.position);

    let total_units = ordered_units.len();
    let mut entries = Vec::with_capacity(total_units);

    let mut counts: BTreeMap<Role, usize> = Role::ALL.into_iter().map(|r| (r, 0usize)).collect();
    let mut running_total: usize = 0;

    for unit in ordered_units {
        let candidates = sorted_candidates(unit, total_units);

        let primary = match mode {
            Mode::Greedy => candidates[0].0,
            Mode::Balanced => {
                let chosen = candidates.iter().find(|(role, _)| {
                    let projected =
                        (counts[role] + 1) as f32 / (running_total.max(1)) as f32;
                    projected <= target_ratio(*role)
                });
                chosen.map(|(role, _)| *role).unwrap_or(candidates[0].0)
            }
        };

        if mode == Mode::Balanced {
            *counts.get_mut(&primary).expect("all roles pre-seeded") += 1;
            running_total += 1;
        }

        let mut queue: Vec<Role> = Vec::with_capacity(5);
        queue.push(primary);
        for (role, _) in &candidates {
            if *role != primary {
                queue.push(*role);
            }
        }
        let queue: [Role; 5] = queue.try_into().expect("exactly five roles scored per unit");

        let scores: BTreeMap<String, ScoreComponents> =
            candidates.iter().map(|(role, score)| (role.name().to_string(), *score)).collect();

        let confidence = ((candidates[0].1.total - candidates[1].1.total) / 10.0).clamp(0.0, 1.0);

        entries.push(AssignmentEntry {
            unit_id: unit.id.clone(),
            queue,
            scores,
            primary,
            confidence,
        });
    }

    Assignment { entries }
}

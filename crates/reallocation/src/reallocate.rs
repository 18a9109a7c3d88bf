use std::collections::BTreeMap;

use tutorloom_catalog::Role;

use crate::alignment::align;
use crate::intent::Intent;

/// Result of one reallocation pass (spec §4.E).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReallocationOutcome {
    pub queue: [Role; 5],
    /// Roles demoted by 2 or more queue positions in this pass — the caller
    /// (the conversation state machine) should set
    /// `hysteresis_until[role] = current_turn + 7` for each.
    pub newly_hysteresised: Vec<Role>,
}

/// Score = `base_weight + 5.0 * align(intent, role) - 0.2 * usage[role]`,
/// with a `-inf` sentinel for any role still under hysteresis
/// (spec §4.E). Pure function of its inputs — safe to call from any
/// scheduler context.
///
/// Hysteresis-pinned roles all score `-inf` and therefore always sort after
/// every non-pinned role, i.e. they occupy the tail of the returned queue.
/// When only one role is pinned that role is literally last; when two or
/// more roles are pinned simultaneously (reachable once a role pinned at
/// turn T is still under hysteresis when a later reallocation pins a
/// second role), they fill the last positions together, ordered by their
/// own `hysteresis_until` ascending — the role that frees up soonest sits
/// closer to the front of that tail block, the one pinned longest sits
/// last.
pub fn reallocate(
    current_queue: &[Role; 5],
    intent: Intent,
    usage: &BTreeMap<Role, usize>,
    hysteresis_until: &BTreeMap<Role, i64>,
    current_turn: i64,
) -> ReallocationOutcome {
    let mut scored: Vec<(Role, f32)> = Role::ALL
        .into_iter()
        .map(|role| {
            if hysteresis_until.get(&role).is_some_and(|&until| until > current_turn) {
                (role, f32::NEG_INFINITY)
            } else {
                let base = tutorloom_catalog::lookup(role).base_weight;
                let usage_count = usage.get(&role).copied().unwrap_or(0) as f32;
                (role, base + 5.0 * align(intent, role) - 0.2 * usage_count)
            }
        })
        .collect();

    scored.sort_by(|(role_a, score_a), (role_b, score_b)| {
        score_b
            .partial_cmp(score_a)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                // Both `-inf` (both pinned) is the only way this tie
                // actually fires in practice: break it by remaining
                // hysteresis so a longer-pinned role sorts strictly after
                // a shorter-pinned one instead of both landing on the same
                // "last" slot.
                let until_a = hysteresis_until.get(role_a).copied().unwrap_or(i64::MIN);
                let until_b = hysteresis_until.get(role_b).copied().unwrap_or(i64::MIN);
                until_a.cmp(&until_b)
            })
            .then_with(|| role_a.name().cmp(role_b.name()))
    });

    let queue: [Role; 5] =
        scored.into_iter().map(|(role, _)| role).collect::<Vec<_>>().try_into().expect("five roles");

    let old_position: BTreeMap<Role, usize> =
        current_queue.iter().enumerate().map(|(idx, role)| (*role, idx)).collect();
    let newly_hysteresised: Vec<Role> = queue
        .iter()
        .enumerate()
        .filter_map(|(new_idx, role)| {
            let old_idx = old_position.get(role).copied().unwrap_or(new_idx);
            if new_idx >= old_idx + 2 { Some(*role) } else { None }
        })
        .collect();

    ReallocationOutcome { queue, newly_hysteresised }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_maps() -> (BTreeMap<Role, usize>, BTreeMap<Role, i64>) {
        (BTreeMap::new(), BTreeMap::new())
    }

    #[test]
    fn example_request_promotes_example_generator_to_front() {
        let queue = [
            Role::Explainer,
            Role::Challenger,
            Role::Summarizer,
            Role::ExampleGenerator,
            Role::MisconceptionSpotter,
        ];
        let (usage, hysteresis) = empty_maps();
        let outcome = reallocate(&queue, Intent::ExampleRequest, &usage, &hysteresis, 0);
        assert_eq!(outcome.queue[0], Role::ExampleGenerator);
    }

    #[test]
    fn hysteresis_pins_role_to_the_tail() {
        let queue = [
            Role::Explainer,
            Role::Challenger,
            Role::Summarizer,
            Role::ExampleGenerator,
            Role::MisconceptionSpotter,
        ];
        let usage = BTreeMap::new();
        let mut hysteresis = BTreeMap::new();
        hysteresis.insert(Role::Challenger, 20);

        let outcome = reallocate(&queue, Intent::Objection, &usage, &hysteresis, 15);
        assert_eq!(outcome.queue[4], Role::Challenger);
        // Misconception-Spotter is next-best for Objection once Challenger
        // is pinned.
        assert_eq!(outcome.queue[0], Role::MisconceptionSpotter);
    }

    #[test]
    fn two_simultaneously_pinned_roles_both_occupy_the_tail() {
        // Challenger pinned until turn 20, Explainer pinned until turn 25 —
        // both reachable at once (a second pin landing after the 3-turn
        // freeze from the first has lifted). Neither can be singularly
        // "last", but both must land in the queue's last two slots, ordered
        // by which frees up soonest.
        let queue = [
            Role::Explainer,
            Role::Challenger,
            Role::Summarizer,
            Role::ExampleGenerator,
            Role::MisconceptionSpotter,
        ];
        let usage = BTreeMap::new();
        let mut hysteresis = BTreeMap::new();
        hysteresis.insert(Role::Challenger, 20);
        hysteresis.insert(Role::Explainer, 25);

        let outcome = reallocate(&queue, Intent::Objection, &usage, &hysteresis, 15);
        assert_eq!(outcome.queue[3], Role::Challenger);
        assert_eq!(outcome.queue[4], Role::Explainer);
        assert!(!outcome.queue[..3].contains(&Role::Challenger));
        assert!(!outcome.queue[..3].contains(&Role::Explainer));
    }

    #[test]
    fn usage_penalty_reduces_a_heavily_used_role_score() {
        let queue = [
            Role::Explainer,
            Role::Challenger,
            Role::Summarizer,
            Role::ExampleGenerator,
            Role::MisconceptionSpotter,
        ];
        let hysteresis = BTreeMap::new();
        let mut usage = BTreeMap::new();
        usage.insert(Role::ExampleGenerator, 100);

        let outcome = reallocate(&queue, Intent::ExampleRequest, &usage, &hysteresis, 0);
        // A 100-use penalty (-20.0) overwhelms the +4.75 alignment bonus, so
        // Example-Generator no longer leads despite being the aligned role.
        assert_ne!(outcome.queue[0], Role::ExampleGenerator);
    }

    #[test]
    fn demotion_by_two_or_more_positions_is_reported() {
        let queue = [
            Role::ExampleGenerator,
            Role::Explainer,
            Role::Challenger,
            Role::Summarizer,
            Role::MisconceptionSpotter,
        ];
        let (usage, hysteresis) = empty_maps();
        // Summary Request promotes Summarizer to front, which can push
        // Example-Generator (previously first) down several slots.
        let outcome = reallocate(&queue, Intent::SummaryRequest, &usage, &hysteresis, 0);
        assert!(outcome.newly_hysteresised.contains(&Role::ExampleGenerator));
    }
}

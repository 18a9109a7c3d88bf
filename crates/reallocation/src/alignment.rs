use tutorloom_catalog::Role;

use crate::intent::Intent;

/// Intent-role alignment matrix (spec §4.E). The spec pins five canonical
/// cells (Clarification→Explainer 0.9, Clarification→Misconception-Spotter
/// 0.8, Example Request→Example-Generator 0.95, Summary Request→Summarizer
/// 0.95, Objection→Challenger 0.9) and leaves the rest to the implementer
/// ("etc."). The remaining cells below follow the same pattern: the role
/// whose catalog purpose most directly answers the intent gets a high
/// alignment, a thematically adjacent role gets a moderate one, and
/// everything else gets a flat low baseline so no role is ever completely
/// locked out of contention.
pub fn align(intent: Intent, role: Role) -> f32 {
    use Intent::*;
    use Role::*;

    match (intent, role) {
        (Clarification, Explainer) => 0.9,
        (Clarification, MisconceptionSpotter) => 0.8,
        (Clarification, _) => 0.2,

        (Objection, Challenger) => 0.9,
        (Objection, MisconceptionSpotter) => 0.5,
        (Objection, _) => 0.2,

        (ExampleRequest, ExampleGenerator) => 0.95,
        (ExampleRequest, _) => 0.2,

        (DepthRequest, Explainer) => 0.7,
        (DepthRequest, ExampleGenerator) => 0.5,
        (DepthRequest, _) => 0.2,

        (SummaryRequest, Summarizer) => 0.95,
        (SummaryRequest, _) => 0.2,

        (TopicPivot, Explainer) => 0.6,
        (TopicPivot, _) => 0.3,

        (Other, _) => 0.3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_cells_match_spec_values() {
        assert_eq!(align(Intent::Clarification, Role::Explainer), 0.9);
        assert_eq!(align(Intent::Clarification, Role::MisconceptionSpotter), 0.8);
        assert_eq!(align(Intent::ExampleRequest, Role::ExampleGenerator), 0.95);
        assert_eq!(align(Intent::SummaryRequest, Role::Summarizer), 0.95);
        assert_eq!(align(Intent::Objection, Role::Challenger), 0.9);
    }
}

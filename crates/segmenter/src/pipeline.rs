use tutorloom_llm::Embedder;

use crate::error::SegmentError;
use crate::grouping::{
    DEFAULT_MAX_GROUP_SIZE, DEFAULT_MIN_GROUP_SIZE, DEFAULT_SIMILARITY_THRESHOLD, group_cohesion,
    merge_small_groups, similarity_group,
};
use crate::sections::split_sections;
use crate::types::SemanticUnit;

/// Tunable knobs for [`segment`], exposed so callers (and tests) can probe
/// grouping behavior without touching the defaults baked into the spec.
#[derive(Debug, Clone, Copy)]
pub struct SegmentConfig {
    pub similarity_threshold: f32,
    pub max_group_size: usize,
    pub min_group_size: usize,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            max_group_size: DEFAULT_MAX_GROUP_SIZE,
            min_group_size: DEFAULT_MIN_GROUP_SIZE,
        }
    }
}

/// Pure(-ish) pipeline: raw text -> ordered `SemanticUnit`s (spec §4.A).
///
/// Deterministic given an identical embedding backend: identical input text
/// yields byte-identical unit ids, texts, section kinds, and word counts
/// (spec §8 property 1). Embedding errors propagate without retry; empty
/// output (zero paragraphs surviving the length filter) is the caller's
/// usage error, signalled as [`SegmentError::InputInvalid`].
pub async fn segment(
    text: &str,
    embedder: &dyn Embedder,
    config: SegmentConfig,
) -> Result<Vec<SemanticUnit>, SegmentError> {
    let sections = split_sections(text);
    let mut units = Vec::new();
    let mut position = 0usize;

    for (section_idx, section) in sections.iter().enumerate() {
        if section.paragraphs.is_empty() {
            continue;
        }

        let mut vectors = Vec::with_capacity(section.paragraphs.len());
        for paragraph in &section.paragraphs {
            vectors.push(embedder.embed(paragraph).await?);
        }

        let groups = similarity_group(&vectors, config.similarity_threshold, config.max_group_size);
        let groups = merge_small_groups(groups, config.min_group_size);

        for (group_idx, indices) in groups.iter().enumerate() {
            let group_paragraphs: Vec<&String> =
                indices.iter().map(|&i| &section.paragraphs[i]).collect();
            let group_vectors: Vec<&Vec<f32>> = indices.iter().map(|&i| &vectors[i]).collect();

            let text = group_paragraphs
                .iter()
                .map(|p| p.as_str())
                .collect::<Vec<_>>()
                .join("\n\n");
            let word_count = text.split_whitespace().count().max(1);
            let cohesion = group_cohesion(&group_vectors);

            // Only the section's first group inherits the heading as its
            // title — later groups in the same section are un-headed
            // sub-topics split out by the similarity pass.
            let title = if group_idx == 0 {
                section.heading.as_ref().map(|h| h.text.clone())
            } else {
                None
            };

            units.push(SemanticUnit {
                id: format!("S{section_idx}_{group_idx}"),
                title,
                text,
                section_kind: section.kind,
                position,
                cohesion,
                word_count,
                metadata: Default::default(),
            });
            position += 1;
        }
    }

    if units.is_empty() {
        return Err(SegmentError::InputInvalid);
    }

    Ok(units)
}

#[cfg(test)]
mod tests {
    use tutorloom_llm::stub::StubEmbedder;

    use super::*;

    #[tokio::test]
    async fn empty_input_is_rejected() {
        let result = segment("", &StubEmbedder, SegmentConfig::default()).await;
        assert!(matches!(result, Err(SegmentError::InputInvalid)));
    }

    #[tokio::test]
    async fn positions_form_a_gapless_range() {
        let text = "1. Introduction\n\nThis introduction paragraph is long enough to survive filtering.\n\nThis is a second, unrelated paragraph about market economics and trade.\n\n2. Conclusion\n\nThis conclusion paragraph wraps everything up in a satisfying way for readers.";
        let units = segment(text, &StubEmbedder, SegmentConfig::default()).await.unwrap();
        for (idx, unit) in units.iter().enumerate() {
            assert_eq!(unit.position, idx);
        }
    }

    #[tokio::test]
    async fn segmentation_is_deterministic_across_repeated_runs() {
        let text = "INTRODUCTION OVERVIEW HERE\n\nThis is the opening paragraph that explains the topic fully.\n\nBODY CONTENT SECTION\n\nHere is a body paragraph discussing the core mechanism at length.\n\nAnother body paragraph, covering a related but distinct mechanism in detail.";
        let first = segment(text, &StubEmbedder, SegmentConfig::default()).await.unwrap();
        let second = segment(text, &StubEmbedder, SegmentConfig::default()).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn ids_are_deterministic_function_of_section_and_group() {
        let text = "1. Introduction\n\nFirst paragraph of the introduction section goes here nicely.\n\n2. Body\n\nFirst body paragraph with enough characters to pass the length filter.";
        let units = segment(text, &StubEmbedder, SegmentConfig::default()).await.unwrap();
        assert!(units.iter().any(|u| u.id == "S0_0"));
    }
}

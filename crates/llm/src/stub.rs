//! Deterministic stub collaborators for tests and offline runs.
//!
//! `StubEmbedder` derives a fixed-width vector from the text's own
//! character statistics so that repeated calls with identical input are
//! byte-identical (segmentation determinism, spec §8 property 1, depends on
//! this). `StubGenerator` synthesizes a short templated reply rather than
//! calling out to a model, which is sufficient for exercising the
//! conversation state machine without a live backend.

use async_trait::async_trait;

use crate::{CollaboratorError, Embedder, GenerationRequest, Generator};

const STUB_EMBEDDING_DIM: usize = 16;

/// Deterministic `(text) -> vector` collaborator. Not semantically
/// meaningful — it exists so the segmenter's cosine-similarity grouping can
/// be exercised without a live embedding backend.
#[derive(Debug, Clone, Default)]
pub struct StubEmbedder;

#[async_trait]
impl Embedder for StubEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, CollaboratorError> {
        Ok(deterministic_vector(text))
    }
}

/// Hashes each character into one of `STUB_EMBEDDING_DIM` buckets and counts
/// occurrences, then L2-normalizes. Two paragraphs sharing vocabulary land
/// close together in cosine space; this is the entire point for the
/// segmenter's grouping step and needs no real model.
pub fn deterministic_vector(text: &str) -> Vec<f32> {
    let mut buckets = vec![0f32; STUB_EMBEDDING_DIM];
    for word in text.split_whitespace() {
        let lowered = word.to_lowercase();
        let mut hash: u64 = 1469598103934665603; // FNV offset basis
        for byte in lowered.bytes() {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(1099511628211); // FNV prime
        }
        buckets[(hash as usize) % STUB_EMBEDDING_DIM] += 1.0;
    }

    let norm = buckets.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for bucket in &mut buckets {
            *bucket /= norm;
        }
    }
    buckets
}

/// Deterministic `(prompt, temperature, deadline) -> text` collaborator.
/// Echoes a short acknowledgement derived from the prompt's last line so
/// tests can assert on role-tagged turns without needing network access.
#[derive(Debug, Clone, Default)]
pub struct StubGenerator;

#[async_trait]
impl Generator for StubGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<String, CollaboratorError> {
        let last_line = request.prompt.lines().last().unwrap_or("").trim();
        Ok(format!("[stub reply t={:.2}] {}", request.temperature, last_line))
    }
}

pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.75;
pub const DEFAULT_MAX_GROUP_SIZE: usize = 5;
pub const DEFAULT_MIN_GROUP_SIZE: usize = 2;

/// Cosine similarity, 0.0 for zero-norm vectors or mismatched lengths
/// (spec §4.A step 5).
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }
    (dot / (mag_a * mag_b)).clamp(-1.0, 1.0)
}

fn centroid(vectors: &[&Vec<f32>]) -> Vec<f32> {
    let dim = vectors.first().map(|v| v.len()).unwrap_or(0);
    let mut mean = vec![0f32; dim];
    for vector in vectors {
        for (slot, value) in mean.iter_mut().zip(vector.iter()) {
            *slot += value;
        }
    }
    let n = vectors.len().max(1) as f32;
    for slot in &mut mean {
        *slot /= n;
    }
    mean
}

/// Walk paragraphs in order, growing a current group while the next
/// paragraph's embedding is within `threshold` cosine similarity of the
/// group's running centroid and the group is under `max_group_size`
/// (spec §4.A step 5). Returns groups as index lists into `vectors`.
pub fn similarity_group(
    vectors: &[Vec<f32>],
    threshold: f32,
    max_group_size: usize,
) -> Vec<Vec<usize>> {
    if vectors.is_empty() {
        return Vec::new();
    }

    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut current: Vec<usize> = vec![0];

    for idx in 1..vectors.len() {
        let current_vectors: Vec<&Vec<f32>> = current.iter().map(|&i| &vectors[i]).collect();
        let group_centroid = centroid(&current_vectors);
        let sim = cosine_similarity(&vectors[idx], &group_centroid);

        if sim >= threshold && current.len() < max_group_size {
            current.push(idx);
        } else {
            groups.push(std::mem::take(&mut current));
            current.push(idx);
        }
    }
    groups.push(current);
    groups
}

/// Merge any group with fewer than `min_group_size` paragraphs into the
/// adjacent later group, or the previous group if it is the last one
/// (spec §4.A step 6). Order of paragraph indices within the merged group
/// is preserved as a concatenation in document order.
pub fn merge_small_groups(mut groups: Vec<Vec<usize>>, min_group_size: usize) -> Vec<Vec<usize>> {
    if groups.len() <= 1 {
        return groups;
    }

    let mut idx = 0;
    while idx < groups.len() {
        if groups[idx].len() < min_group_size {
            if idx + 1 < groups.len() {
                let small = groups.remove(idx);
                groups[idx].splice(0..0, small);
                // Do not advance idx: the merged group itself might still
                // be under min_group_size and need another merge pass.
                if groups.len() == 1 {
                    break;
                }
                continue;
            } else if idx > 0 {
                let small = groups.remove(idx);
                let prev = groups.len() - 1;
                groups[prev].extend(small);
                break;
            }
        }
        idx += 1;
    }

    groups
}

/// Average pairwise cosine similarity within a group's vectors, or 1.0 for
/// a singleton group (spec §4.A step 7).
pub fn group_cohesion(vectors: &[&Vec<f32>]) -> f32 {
    if vectors.len() <= 1 {
        return 1.0;
    }
    let mut total = 0f32;
    let mut pairs = 0usize;
    for i in 0..vectors.len() {
        for j in (i + 1)..vectors.len() {
            total += cosine_similarity(vectors[i], vectors[j]);
            pairs += 1;
        }
    }
    if pairs == 0 { 1.0 } else { total / pairs as f32 }
}

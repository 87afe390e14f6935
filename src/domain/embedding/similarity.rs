//! Vector similarity helpers

/// Cosine similarity between two vectors
///
/// Returns 0.0 for empty vectors, mismatched lengths or zero-norm inputs.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Cosine similarity mapped into `[0, 1]` the way Elasticsearch scores
/// `cosine` knn hits: `(1 + cos) / 2`
pub fn normalized_cosine(a: &[f32], b: &[f32]) -> f64 {
    (1.0 + f64::from(cosine_similarity(a, b))) / 2.0
}

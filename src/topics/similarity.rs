// Vector similarity.

/// Cosine similarity between two vectors, clamped to [0.0, 1.0].
///
/// TF-IDF weights are non-negative so the raw value is already in range;
/// mismatched or zero-length vectors score 0.0 rather than erroring.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let mag_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    let denom = mag_a * mag_b;
    if denom < f64::EPSILON {
        0.0
    } else {
        (dot / denom).clamp(0.0, 1.0)
    }
}

/// Full pairwise similarity matrix for a set of row vectors.
pub fn pairwise(rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
    rows.iter()
        .map(|a| rows.iter().map(|b| cosine_similarity(a, b)).collect())
        .collect()
}

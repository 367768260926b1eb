/// Cosine similarity between two vectors
///
/// Returns a value in [-1, 1]. A zero-norm vector on either side yields exactly 0.
/// Accumulates in f64 so `cosine_similarity(a, b) == cosine_similarity(b, a)` bit for bit.
///
/// # Returns
/// `None` when the lengths differ
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f64> {
    if a.len() != b.len() {
        return None;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Some(0.0);
    }

    // One sqrt of the product keeps sim(a, a) exactly 1.0
    let similarity = dot / (norm_a * norm_b).sqrt();
    if similarity.is_nan() {
        return Some(0.0);
    }

    Some(similarity.clamp(-1.0, 1.0))
}

/// Cosine similarity folded into a [0,1] subscore
///
/// Opposed vectors (negative cosine) score 0.
#[inline]
pub fn similarity_score(a: &[f32], b: &[f32]) -> Option<f64> {
    cosine_similarity(a, b).map(|s| s.max(0.0))
}

/// Clamp any score into [0,1], mapping NaN to 0
#[inline]
pub fn unit(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

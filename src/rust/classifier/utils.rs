use ndarray::{Array1, ArrayView1};

/// Lower bound applied to every one-vs-rest output before the scores are
/// turned into a distribution.
pub(crate) const MIN_CLASS_SCORE: f32 = 1e-7;

pub(crate) fn normalize_vector(vec: &Array1<f32>) -> Array1<f32> {
    let norm: f32 = vec.iter().map(|&x| x * x).sum::<f32>().sqrt();
    if norm > 1e-10 {
        vec / norm
    } else {
        Array1::zeros(vec.len())
    }
}

/// Clamps raw per-class outputs into `(0, 1)` and rescales them to sum to one.
pub(crate) fn normalize_scores(raw: ArrayView1<f32>) -> Array1<f32> {
    let clamped = raw.mapv(|x| {
        if x.is_finite() {
            x.clamp(MIN_CLASS_SCORE, 1.0 - MIN_CLASS_SCORE)
        } else {
            MIN_CLASS_SCORE
        }
    });
    let total = clamped.sum();
    clamped / total
}

/// Index of the highest score. Ties resolve to the lowest index.
pub(crate) fn argmax(scores: ArrayView1<f32>) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &score) in scores.iter().enumerate() {
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((i, score)),
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_normalize_vector_zero_input() {
        let v = normalize_vector(&Array1::zeros(4));
        assert!(v.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_normalize_scores_sums_to_one() {
        let scores = normalize_scores(array![0.9f32, 0.05, 0.0, f32::NAN].view());
        assert!((scores.sum() - 1.0).abs() < 1e-5);
        assert!(scores.iter().all(|&s| s > 0.0));
        assert!(scores[0] > scores[1]);
    }

    #[test]
    fn test_argmax_prefers_first_tie() {
        assert_eq!(argmax(array![0.2f32, 0.4, 0.4].view()), Some(1));
        assert_eq!(argmax(Array1::<f32>::zeros(0).view()), None);
    }
}

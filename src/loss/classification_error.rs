pub struct ClassificationError;

impl ClassificationError {
    /// `1.0` when the predicted class differs from the labelled one, else `0.0`.
    pub fn error(logits: &[f32], labels: &[f32]) -> f32 {
        if argmax(logits) == argmax(labels) { 0.0 } else { 1.0 }
    }
}

/// Index of the maximum element; ties go to the first index.
pub fn argmax(v: &[f32]) -> usize {
    v.iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |(best_i, best), (i, &x)| {
            if x > best { (i, x) } else { (best_i, best) }
        })
        .0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_and_miss() {
        assert_eq!(ClassificationError::error(&[0.1, 0.9, 0.0], &[0.0, 1.0, 0.0]), 0.0);
        assert_eq!(ClassificationError::error(&[0.9, 0.1, 0.0], &[0.0, 1.0, 0.0]), 1.0);
    }

    #[test]
    fn ties_pick_the_first_index() {
        assert_eq!(argmax(&[2.0, 2.0, 1.0]), 0);
        assert_eq!(argmax(&[]), 0);
    }
}

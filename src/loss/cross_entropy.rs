/// Softmax followed by categorical cross-entropy, fused for stability.
pub struct CrossEntropyWithSoftmax;

impl CrossEntropyWithSoftmax {
    /// Per-sample loss on raw logits:
    ///   L = -sum(labels[i] * log_softmax(logits)[i])
    ///
    /// `log_softmax(z)_i = z_i - max(z) - log(sum(exp(z_j - max(z))))`, so
    /// large logits never overflow.
    pub fn loss(logits: &[f32], labels: &[f32]) -> f32 {
        let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let log_sum = logits.iter().map(|z| (z - max).exp()).sum::<f32>().ln();
        logits
            .iter()
            .zip(labels)
            .map(|(z, y)| -y * (z - max - log_sum))
            .sum()
    }
}

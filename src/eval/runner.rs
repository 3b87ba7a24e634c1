use std::collections::HashMap;
use std::time::Instant;

use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::device::Device;
use crate::errors::Result;
use crate::eval::batch::random_batch;
use crate::eval::eval_config::EvalConfig;
use crate::eval::eval_stats::EvalStats;
use crate::network::classifier::ClassifierNetwork;

/// Runs `config.iterations` forward passes of `network` over fresh random
/// batches and returns one `EvalStats` per pass.
///
/// The batch generator is seeded from `config.seed` on every call and is
/// private to the call, so concurrent callers never share random state.
/// The first failing pass aborts the run.
pub fn run_evaluation(network: &ClassifierNetwork, config: &EvalConfig, device: Device) -> Result<Vec<EvalStats>> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let input_dim = network.features().shape().total_size();
    let num_classes = network.labels().shape().total_size();
    let requested = [network.output().clone(), network.error().clone(), network.loss().clone()];

    let mut stats = Vec::with_capacity(config.iterations);
    for iteration in 1..=config.iterations {
        let (features, labels) = random_batch(&mut rng, input_dim, num_classes, config.batch_size, device)?;
        let bindings = HashMap::from([
            (network.features().clone(), features),
            (network.labels().clone(), labels),
        ]);

        let t_start = Instant::now();
        let outputs = network.function().forward(&bindings, &requested, device)?;
        let elapsed_us = t_start.elapsed().as_micros() as u64;

        let s = EvalStats {
            iteration,
            num_samples: config.batch_size,
            mean_loss: mean(outputs.get(network.loss()).map(|v| v.data())),
            error_rate: mean(outputs.get(network.error()).map(|v| v.data())),
            elapsed_us,
        };
        debug!(
            "iteration {}/{}: loss {:.4}, error {:.3}, {} us",
            iteration, config.iterations, s.mean_loss, s.error_rate, s.elapsed_us
        );
        stats.push(s);
    }

    Ok(stats)
}

fn mean(values: Option<&[f32]>) -> f32 {
    match values {
        Some(v) if !v.is_empty() => v.iter().sum::<f32>() / v.len() as f32,
        _ => 0.0,
    }
}

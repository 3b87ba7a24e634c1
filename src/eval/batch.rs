use rand::Rng;

use crate::device::Device;
use crate::errors::Result;
use crate::tensor::shape::Shape;
use crate::tensor::value::Value;

/// Generates one random batch: features uniform in `[0, 1)` shaped
/// `[input_dim, 1, num_samples]`, and one-hot labels over a uniformly
/// drawn class shaped `[num_classes, 1, num_samples]`.
pub fn random_batch<R: Rng + ?Sized>(
    rng: &mut R,
    input_dim: usize,
    num_classes: usize,
    num_samples: usize,
    device: Device,
) -> Result<(Value, Value)> {
    let features: Vec<f32> = (0..input_dim * num_samples).map(|_| rng.gen::<f32>()).collect();

    let mut labels = vec![0.0f32; num_classes * num_samples];
    if num_classes > 0 {
        for i in 0..num_samples {
            labels[i * num_classes + rng.gen_range(0..num_classes)] = 1.0;
        }
    }

    Ok((
        Value::new(Shape::batch(input_dim, num_samples), features, device)?,
        Value::new(Shape::batch(num_classes, num_samples), labels, device)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn shapes_and_one_hot_labels() {
        let mut rng = StdRng::seed_from_u64(2);
        let (x, y) = random_batch(&mut rng, 7, 5, 3, Device::Cpu).unwrap();
        assert_eq!(x.shape(), &Shape::batch(7, 3));
        assert_eq!(y.shape(), &Shape::batch(5, 3));
        assert!(x.data().iter().all(|v| (0.0..1.0).contains(v)));
        for i in 0..3 {
            let sample = y.sample(i).unwrap();
            assert_eq!(sample.iter().filter(|&&v| v == 1.0).count(), 1);
            assert_eq!(sample.iter().sum::<f32>(), 1.0);
        }
    }

    #[test]
    fn same_seed_same_batch() {
        let a = random_batch(&mut StdRng::seed_from_u64(2), 4, 3, 2, Device::Cpu).unwrap();
        let b = random_batch(&mut StdRng::seed_from_u64(2), 4, 3, 2, Device::Cpu).unwrap();
        assert_eq!(a, b);
    }
}

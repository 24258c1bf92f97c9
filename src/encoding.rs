//! Encoders converting static numeric vectors into spike trains.
//!
//! Every encoder maps each entry of its input vector to a firing probability per step,
//! then draws the spikes independently per neuron and per step.
//!
//! # Example
//! ```rust
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use rusty_lif::encoding::{Encoder, PoissonEncoder};
//!
//! let mut rng = StdRng::seed_from_u64(42);
//!
//! // Encode 3 neurons firing at 0, 50 and 200 Hz over 100 ms with steps of 1 ms
//! let spike_train = PoissonEncoder.encode(&[0.0, 50.0, 200.0], 100.0, 1.0, &mut rng).unwrap();
//! assert_eq!(spike_train.shape(), (100, 3));
//! assert_eq!(spike_train.spike_counts()[0], 0);
//! ```
use log;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Bernoulli, Distribution};
use rayon::prelude::*;

use crate::core::spike_train::SpikeTrain;
use crate::core::MIN_PARALLEL_NEURONS;
use crate::error::SNNError;
use crate::utils::{check_time_step, num_steps};

/// A rule mapping a numeric vector to per-step firing probabilities.
pub trait Encoder {
    /// The firing probability per step of size `dt` (in ms) for every entry of `data`.
    fn probabilities(&self, data: &[f64], dt: f64) -> Result<Vec<f64>, SNNError>;

    /// Encode `data` into a spike train covering `time` ms with steps of `dt` ms.
    /// The spike train has shape `(round(time / dt), data.len())`.
    fn encode<R: Rng + ?Sized>(
        &self,
        data: &[f64],
        time: f64,
        dt: f64,
        rng: &mut R,
    ) -> Result<SpikeTrain, SNNError> {
        let num_steps = num_steps(time, dt)?;
        let probabilities = self.probabilities(data, dt)?;
        let parallel = probabilities.len() >= MIN_PARALLEL_NEURONS;
        bernoulli_spike_train(&probabilities, num_steps, rng.gen(), parallel)
    }
}

/// Poisson process approximation: a neuron firing at `rate` Hz spikes at every step of `dt` ms
/// with probability `rate * dt / 1000`.
///
/// Rates must be finite and non-negative. Probabilities above one are clamped to one.
#[derive(Debug, PartialEq, Clone, Copy, Default)]
pub struct PoissonEncoder;

impl Encoder for PoissonEncoder {
    fn probabilities(&self, rates: &[f64], dt: f64) -> Result<Vec<f64>, SNNError> {
        check_time_step(dt)?;
        if let Some(rate) = rates.iter().find(|rate| !rate.is_finite() || **rate < 0.0) {
            return Err(SNNError::InvalidParameter(format!(
                "Firing rates must be finite and non-negative, got {}",
                rate
            )));
        }

        let probabilities: Vec<f64> = rates.iter().map(|rate| rate * dt / 1000.0).collect();
        let num_saturated = probabilities.iter().filter(|&&p| p > 1.0).count();
        if num_saturated > 0 {
            log::warn!(
                "{} firing rates exceed one spike per step of {} ms and are clamped",
                num_saturated,
                dt
            );
        }
        Ok(probabilities.into_iter().map(|p| p.min(1.0)).collect())
    }
}

/// Each entry in [0, 1] is used directly as a firing probability per step, scaled by `max_prob`.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct BernoulliEncoder {
    max_prob: f64,
}

impl BernoulliEncoder {
    /// Returns an error if `max_prob` is not in (0, 1].
    pub fn build(max_prob: f64) -> Result<Self, SNNError> {
        if !(max_prob > 0.0 && max_prob <= 1.0) {
            return Err(SNNError::InvalidParameter(format!(
                "Maximum firing probability must be in (0, 1], got {}",
                max_prob
            )));
        }
        Ok(BernoulliEncoder { max_prob })
    }

    pub fn max_prob(&self) -> f64 {
        self.max_prob
    }
}

impl Default for BernoulliEncoder {
    fn default() -> Self {
        BernoulliEncoder { max_prob: 1.0 }
    }
}

impl Encoder for BernoulliEncoder {
    fn probabilities(&self, data: &[f64], dt: f64) -> Result<Vec<f64>, SNNError> {
        check_time_step(dt)?;
        if let Some(x) = data.iter().find(|x| !(0.0..=1.0).contains(*x)) {
            return Err(SNNError::InvalidParameter(format!(
                "Bernoulli encoding expects values in [0, 1], got {}",
                x
            )));
        }
        Ok(data.iter().map(|x| x * self.max_prob).collect())
    }
}

/// Draw a spike train where neuron `i` fires at every step with probability `probabilities[i]`.
/// Every neuron uses its own ChaCha stream derived from `seed`, so the result is the same whether or not
/// the neurons are processed in parallel.
fn bernoulli_spike_train(
    probabilities: &[f64],
    num_steps: usize,
    seed: u64,
    parallel: bool,
) -> Result<SpikeTrain, SNNError> {
    let dists = probabilities
        .iter()
        .map(|&p| {
            Bernoulli::new(p).map_err(|e| {
                SNNError::InvalidParameter(format!("Invalid firing probability {}: {}", p, e))
            })
        })
        .collect::<Result<Vec<Bernoulli>, SNNError>>()?;

    let column = |(neuron_id, dist): (usize, &Bernoulli)| -> Vec<bool> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(neuron_id as u64);
        (0..num_steps).map(|_| dist.sample(&mut rng)).collect()
    };

    let columns: Vec<Vec<bool>> = if parallel {
        dists.par_iter().enumerate().map(column).collect()
    } else {
        dists.iter().enumerate().map(column).collect()
    };

    Ok(SpikeTrain::from_columns(num_steps, columns))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;

    #[test]
    fn test_poisson_shape_and_values() {
        let mut rng = StdRng::seed_from_u64(42);
        let spike_train = PoissonEncoder
            .encode(&[10.0, 0.0, 300.0, 1000.0], 10.0, 0.1, &mut rng)
            .unwrap();
        assert_eq!(spike_train.shape(), (100, 4));
        assert_eq!(spike_train.spike_counts()[1], 0);

        let spike_train = PoissonEncoder.encode(&[], 10.0, 1.0, &mut rng).unwrap();
        assert_eq!(spike_train.shape(), (10, 0));
    }

    #[test]
    fn test_poisson_zero_rates() {
        let mut rng = StdRng::seed_from_u64(7);
        let spike_train = PoissonEncoder
            .encode(&vec![0.0; 200], 50.0, 1.0, &mut rng)
            .unwrap();
        assert_eq!(spike_train.num_spikes(), 0);
    }

    #[test]
    fn test_poisson_mean_firing() {
        let mut rng = StdRng::seed_from_u64(42);
        let rates = [0.0, 100.0, 500.0, 1000.0];
        let spike_train = PoissonEncoder.encode(&rates, 20_000.0, 1.0, &mut rng).unwrap();
        let frequencies = spike_train.firing_frequencies();
        for (rate, frequency) in rates.iter().zip(frequencies) {
            assert!((rate / 1000.0 - frequency).abs() < 0.02);
        }
    }

    #[test]
    fn test_poisson_clamped_probabilities() {
        let probabilities = PoissonEncoder.probabilities(&[2000.0, 500.0], 1.0).unwrap();
        assert_eq!(probabilities, vec![1.0, 0.5]);

        let mut rng = StdRng::seed_from_u64(0);
        let spike_train = PoissonEncoder.encode(&[5000.0], 20.0, 1.0, &mut rng).unwrap();
        assert_eq!(spike_train.num_spikes(), 20);
    }

    #[test]
    fn test_poisson_invalid_rates() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            PoissonEncoder.encode(&[1.0, -1.0], 10.0, 1.0, &mut rng),
            Err(SNNError::InvalidParameter(_))
        ));
        assert!(matches!(
            PoissonEncoder.encode(&[f64::NAN], 10.0, 1.0, &mut rng),
            Err(SNNError::InvalidParameter(_))
        ));
        assert!(matches!(
            PoissonEncoder.encode(&[1.0], 10.0, 0.0, &mut rng),
            Err(SNNError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_encode_reproducible() {
        let rates: Vec<f64> = (0..50).map(|i| i as f64 * 10.0).collect();
        let first = PoissonEncoder
            .encode(&rates, 100.0, 1.0, &mut StdRng::seed_from_u64(3))
            .unwrap();
        let second = PoissonEncoder
            .encode(&rates, 100.0, 1.0, &mut StdRng::seed_from_u64(3))
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let probabilities: Vec<f64> = (0..MIN_PARALLEL_NEURONS + 20)
            .map(|i| (i % 10) as f64 / 10.0)
            .collect();
        let parallel = bernoulli_spike_train(&probabilities, 64, 11, true).unwrap();
        let sequential = bernoulli_spike_train(&probabilities, 64, 11, false).unwrap();
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn test_bernoulli_encoder() {
        assert!(BernoulliEncoder::build(0.0).is_err());
        assert!(BernoulliEncoder::build(1.5).is_err());

        let encoder = BernoulliEncoder::build(0.5).unwrap();
        assert_eq!(
            encoder.probabilities(&[0.0, 0.5, 1.0], 1.0).unwrap(),
            vec![0.0, 0.25, 0.5]
        );
        assert!(matches!(
            encoder.probabilities(&[1.2], 1.0),
            Err(SNNError::InvalidParameter(_))
        ));

        let mut rng = StdRng::seed_from_u64(5);
        let spike_train = BernoulliEncoder::default()
            .encode(&[0.0, 1.0], 30.0, 1.0, &mut rng)
            .unwrap();
        assert_eq!(spike_train.spike_counts(), vec![0, 30]);
    }
}

//! Module implementing the concept of a discrete-time spike train.
use itertools::Itertools;
use std::fmt;

use crate::error::SNNError;

/// A time-indexed binary tensor of shape `(num_steps, num_neurons)`.
/// Row `t` holds the spike indicators of all neurons at step `t`.
#[derive(Debug, PartialEq, Clone)]
pub struct SpikeTrain {
    num_steps: usize,
    num_neurons: usize,
    spikes: Vec<bool>,
}

impl SpikeTrain {
    /// Create a spike train from its rows, one per time step.
    /// Returns an error if the rows do not all have the same length.
    pub fn build(rows: Vec<Vec<bool>>) -> Result<Self, SNNError> {
        let num_steps = rows.len();
        let num_neurons = rows.first().map_or(0, |row| row.len());
        if let Some((t, row)) = rows.iter().find_position(|row| row.len() != num_neurons) {
            return Err(SNNError::ShapeMismatch(format!(
                "Step {} has {} neurons, expected {}",
                t,
                row.len(),
                num_neurons
            )));
        }
        let spikes = rows.into_iter().flatten().collect();
        Ok(SpikeTrain {
            num_steps,
            num_neurons,
            spikes,
        })
    }

    /// Create a silent spike train with the given shape.
    pub fn zeros(num_steps: usize, num_neurons: usize) -> Self {
        SpikeTrain {
            num_steps,
            num_neurons,
            spikes: vec![false; num_steps * num_neurons],
        }
    }

    /// Assemble a spike train from per-neuron columns of equal length.
    pub(crate) fn from_columns(num_steps: usize, columns: Vec<Vec<bool>>) -> Self {
        let num_neurons = columns.len();
        let mut spikes = vec![false; num_steps * num_neurons];
        for (neuron_id, column) in columns.iter().enumerate() {
            for (t, &spike) in column.iter().enumerate() {
                spikes[t * num_neurons + neuron_id] = spike;
            }
        }
        SpikeTrain {
            num_steps,
            num_neurons,
            spikes,
        }
    }

    /// Returns the number of time steps.
    pub fn num_steps(&self) -> usize {
        self.num_steps
    }

    /// Returns the number of neurons (channels).
    pub fn num_neurons(&self) -> usize {
        self.num_neurons
    }

    /// Returns the shape `(num_steps, num_neurons)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.num_steps, self.num_neurons)
    }

    /// Returns the spike indicators of all neurons at step `t`, if it exists.
    pub fn step(&self, t: usize) -> Option<&[bool]> {
        if t >= self.num_steps {
            return None;
        }
        let start = t * self.num_neurons;
        Some(&self.spikes[start..start + self.num_neurons])
    }

    /// Returns whether the neuron fired at step `t`, if both exist.
    pub fn get(&self, t: usize, neuron_id: usize) -> Option<bool> {
        if neuron_id >= self.num_neurons {
            return None;
        }
        self.step(t).map(|row| row[neuron_id])
    }

    /// An iterator over the rows of the spike train.
    pub fn steps_iter(&self) -> impl Iterator<Item = &[bool]> + '_ {
        (0..self.num_steps).filter_map(move |t| self.step(t))
    }

    /// The total number of spikes.
    pub fn num_spikes(&self) -> usize {
        self.spikes.iter().filter(|&&s| s).count()
    }

    /// The number of spikes emitted by each neuron.
    pub fn spike_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.num_neurons];
        for row in self.steps_iter() {
            for (count, &spike) in counts.iter_mut().zip(row) {
                if spike {
                    *count += 1;
                }
            }
        }
        counts
    }

    /// The fraction of steps at which each neuron fired.
    /// Returns zeros for an empty spike train.
    pub fn firing_frequencies(&self) -> Vec<f64> {
        if self.num_steps == 0 {
            return vec![0.0; self.num_neurons];
        }
        self.spike_counts()
            .into_iter()
            .map(|count| count as f64 / self.num_steps as f64)
            .collect()
    }
}

impl fmt::Display for SpikeTrain {
    /// Raster view: one line per neuron, `|` for a spike and `.` for silence.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for neuron_id in 0..self.num_neurons {
            let line: String = (0..self.num_steps)
                .map(|t| if self.spikes[t * self.num_neurons + neuron_id] { '|' } else { '.' })
                .collect();
            writeln!(f, "{:>4} {}", neuron_id, line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spike_train_build() {
        let spike_train =
            SpikeTrain::build(vec![vec![true, false], vec![false, false], vec![true, true]]).unwrap();
        assert_eq!(spike_train.shape(), (3, 2));
        assert_eq!(spike_train.step(0), Some(&[true, false][..]));
        assert_eq!(spike_train.step(2), Some(&[true, true][..]));
        assert_eq!(spike_train.step(3), None);
        assert_eq!(spike_train.get(2, 1), Some(true));
        assert_eq!(spike_train.get(1, 2), None);
        assert_eq!(spike_train.num_spikes(), 3);
        assert_eq!(spike_train.spike_counts(), vec![2, 1]);

        // Test empty spike train
        let spike_train = SpikeTrain::build(vec![]).unwrap();
        assert_eq!(spike_train.shape(), (0, 0));
        assert_eq!(spike_train.steps_iter().count(), 0);

        // Test ragged rows
        let spike_train = SpikeTrain::build(vec![vec![true], vec![false, true]]);
        assert!(matches!(spike_train, Err(SNNError::ShapeMismatch(_))));
    }

    #[test]
    fn test_spike_train_rows_cover_shape() {
        let spike_trains = [
            SpikeTrain::build(vec![vec![false, true, false]; 4]).unwrap(),
            SpikeTrain::zeros(5, 2),
            SpikeTrain::zeros(3, 0),
            SpikeTrain::from_columns(2, vec![vec![true, false], vec![false, true], vec![true, true]]),
        ];
        for spike_train in spike_trains.iter() {
            let (num_steps, num_neurons) = spike_train.shape();
            for t in 0..num_steps {
                assert_eq!(spike_train.step(t).map(|row| row.len()), Some(num_neurons));
            }
            assert_eq!(spike_train.step(num_steps), None);
            assert_eq!(spike_train.steps_iter().count(), num_steps);
            assert_eq!(spike_train.spike_counts().len(), num_neurons);
        }
    }

    #[test]
    fn test_from_columns() {
        let spike_train =
            SpikeTrain::from_columns(3, vec![vec![true, false, true], vec![false, false, true]]);
        let expected =
            SpikeTrain::build(vec![vec![true, false], vec![false, false], vec![true, true]]).unwrap();
        assert_eq!(spike_train, expected);
    }

    #[test]
    fn test_firing_frequencies() {
        let spike_train = SpikeTrain::build(vec![
            vec![true, false],
            vec![true, false],
            vec![false, false],
            vec![true, true],
        ])
        .unwrap();
        assert_eq!(spike_train.firing_frequencies(), vec![0.75, 0.25]);
        assert_eq!(SpikeTrain::zeros(0, 3).firing_frequencies(), vec![0.0; 3]);
    }

    #[test]
    fn test_display_raster() {
        let spike_train = SpikeTrain::build(vec![vec![true, false], vec![false, true]]).unwrap();
        assert_eq!(spike_train.to_string(), "   0 |.\n   1 .|\n");
    }
}

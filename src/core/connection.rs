//! Module implementing the weighted connections between layers.
use nalgebra::{DMatrix, DVector};
use rand::Rng;
use rand_distr::{Distribution, Uniform};

use crate::error::SNNError;

/// A weighted all-to-all connection from the neurons of a source layer to the neurons of a target layer.
/// The weight matrix has one row per source neuron and one column per target neuron.
#[derive(Debug, PartialEq, Clone)]
pub struct Connection {
    source: String,
    target: String,
    w: DMatrix<f64>,
    b: Option<DVector<f64>>,
    bounds: Option<WeightBounds>,
}

/// Closed interval the weights of a connection are clamped into.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct WeightBounds {
    wmin: f64,
    wmax: f64,
}

impl WeightBounds {
    pub fn build(wmin: f64, wmax: f64) -> Result<Self, SNNError> {
        if !wmin.is_finite() || !wmax.is_finite() || wmin >= wmax {
            return Err(SNNError::InvalidParameter(format!(
                "Weight bounds must be finite with wmin < wmax, got [{}, {}]",
                wmin, wmax
            )));
        }
        Ok(WeightBounds { wmin, wmax })
    }

    /// Returns the lower bound.
    pub fn wmin(&self) -> f64 {
        self.wmin
    }

    /// Returns the upper bound.
    pub fn wmax(&self) -> f64 {
        self.wmax
    }
}

impl Connection {
    /// Create a new connection with the specified weights.
    /// Returns an error if any weight is not finite.
    pub fn build(
        source: impl Into<String>,
        target: impl Into<String>,
        w: DMatrix<f64>,
    ) -> Result<Self, SNNError> {
        if w.iter().any(|x| !x.is_finite()) {
            return Err(SNNError::InvalidParameter(
                "Connection weights must be finite".to_string(),
            ));
        }
        Ok(Connection {
            source: source.into(),
            target: target.into(),
            w,
            b: None,
            bounds: None,
        })
    }

    /// Create a connection with random weights between a source layer of `num_sources` neurons and a target layer of `num_targets` neurons.
    /// The weights are drawn uniformly in [0, 1).
    pub fn rand<R: Rng>(
        source: impl Into<String>,
        target: impl Into<String>,
        num_sources: usize,
        num_targets: usize,
        rng: &mut R,
    ) -> Self {
        let w = DMatrix::from_fn(num_sources, num_targets, |_, _| rng.gen::<f64>());
        Connection {
            source: source.into(),
            target: target.into(),
            w,
            b: None,
            bounds: None,
        }
    }

    /// Create a connection with random weights drawn uniformly within the provided bounds.
    /// The bounds are kept and enforced by subsequent weight updates.
    pub fn rand_bounded<R: Rng>(
        source: impl Into<String>,
        target: impl Into<String>,
        num_sources: usize,
        num_targets: usize,
        bounds: WeightBounds,
        rng: &mut R,
    ) -> Self {
        let weight_dist = Uniform::new(bounds.wmin(), bounds.wmax());
        let w = DMatrix::from_fn(num_sources, num_targets, |_, _| weight_dist.sample(rng));
        Connection {
            source: source.into(),
            target: target.into(),
            w,
            b: None,
            bounds: Some(bounds),
        }
    }

    /// Add a bias to the connection, one value per target neuron.
    pub fn with_bias(mut self, b: DVector<f64>) -> Result<Self, SNNError> {
        if b.len() != self.w.ncols() {
            return Err(SNNError::ShapeMismatch(format!(
                "Bias has {} entries but the connection has {} targets",
                b.len(),
                self.w.ncols()
            )));
        }
        self.b = Some(b);
        Ok(self)
    }

    /// Clamp the weights into the provided bounds, now and after every weight update.
    pub fn with_bounds(mut self, bounds: WeightBounds) -> Self {
        self.bounds = Some(bounds);
        self.clamp_weights();
        self
    }

    /// Returns the name of the source layer.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the name of the target layer.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Returns the weight matrix.
    pub fn weights(&self) -> &DMatrix<f64> {
        &self.w
    }

    /// Returns the bias, if any.
    pub fn bias(&self) -> Option<&DVector<f64>> {
        self.b.as_ref()
    }

    /// Returns the weight bounds, if any.
    pub fn bounds(&self) -> Option<WeightBounds> {
        self.bounds
    }

    /// Returns the number of source neurons.
    pub fn num_sources(&self) -> usize {
        self.w.nrows()
    }

    /// Returns the number of target neurons.
    pub fn num_targets(&self) -> usize {
        self.w.ncols()
    }

    /// Replace the weight matrix, keeping its shape.
    /// The new weights are clamped into the connection bounds, if any.
    pub fn set_weights(&mut self, w: DMatrix<f64>) -> Result<(), SNNError> {
        if w.shape() != self.w.shape() {
            return Err(SNNError::ShapeMismatch(format!(
                "Expected a {:?} weight matrix, got {:?}",
                self.w.shape(),
                w.shape()
            )));
        }
        if w.iter().any(|x| !x.is_finite()) {
            return Err(SNNError::InvalidParameter(
                "Connection weights must be finite".to_string(),
            ));
        }
        self.w = w;
        self.clamp_weights();
        Ok(())
    }

    /// Scale the weights so that the absolute incoming weights of every target neuron sum to `norm`.
    /// Target neurons without any incoming weight are left untouched.
    pub fn normalize(&mut self, norm: f64) {
        for mut column in self.w.column_iter_mut() {
            let total: f64 = column.iter().map(|x| x.abs()).sum();
            if total > 0.0 {
                column *= norm / total;
            }
        }
        self.clamp_weights();
    }

    /// Compute the input delivered to the target layer by the spikes of the source layer: `s^T W + b`.
    pub fn compute(&self, spikes: &[bool]) -> Result<DVector<f64>, SNNError> {
        if spikes.len() != self.w.nrows() {
            return Err(SNNError::ShapeMismatch(format!(
                "Connection {} -> {} expects {} source spikes, got {}",
                self.source,
                self.target,
                self.w.nrows(),
                spikes.len()
            )));
        }

        let mut post = match &self.b {
            Some(b) => b.clone(),
            None => DVector::zeros(self.w.ncols()),
        };
        for (i, _) in spikes.iter().enumerate().filter(|&(_, &s)| s) {
            post += self.w.row(i).transpose();
        }
        Ok(post)
    }

    fn clamp_weights(&mut self) {
        if let Some(bounds) = self.bounds {
            let (wmin, wmax) = (bounds.wmin(), bounds.wmax());
            self.w.apply(|x| *x = x.clamp(wmin, wmax));
        }
    }
}

//! Module implementing the layers (groups of neurons) of a network.
use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SNNError;

/// A state variable of a layer that can be recorded by a monitor.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum StateVariable {
    /// The membrane voltage, "v".
    #[serde(rename = "v")]
    Voltage,
    /// The spike indicators, "s", recorded as 0.0 or 1.0.
    #[serde(rename = "s")]
    Spikes,
    /// The remaining refractory time, "refrac_count".
    #[serde(rename = "refrac_count")]
    RefractoryCount,
}

impl StateVariable {
    /// Returns the short name of the state variable.
    pub fn name(&self) -> &'static str {
        match self {
            StateVariable::Voltage => "v",
            StateVariable::Spikes => "s",
            StateVariable::RefractoryCount => "refrac_count",
        }
    }
}

impl fmt::Display for StateVariable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for StateVariable {
    type Err = SNNError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "v" => Ok(StateVariable::Voltage),
            "s" => Ok(StateVariable::Spikes),
            "refrac_count" => Ok(StateVariable::RefractoryCount),
            other => Err(SNNError::UnsupportedVariable(other.to_string())),
        }
    }
}

/// A group of neurons sharing the same state-update rule.
pub trait Nodes: fmt::Debug + Send {
    /// The number of neurons in the layer.
    fn num_neurons(&self) -> usize;

    /// Advance the layer by one step of size `dt` given the total drive `x` of each neuron.
    /// The drive must have exactly `num_neurons()` entries.
    fn forward(&mut self, x: &DVector<f64>, dt: f64);

    /// The spike indicators produced by the last call to `forward`.
    fn spikes(&self) -> &[bool];

    /// The state variables exposed by the layer.
    fn variables(&self) -> &'static [StateVariable];

    /// The current value of a state variable, or `None` if the layer does not expose it.
    fn state(&self, variable: StateVariable) -> Option<DVector<f64>>;

    /// Bring the layer back to its initial state.
    fn reset_state_variables(&mut self);

    /// Whether the layer exposes the given state variable.
    fn has_variable(&self, variable: StateVariable) -> bool {
        self.variables().contains(&variable)
    }

    /// The number of neurons that fired at the last step.
    fn num_spikes(&self) -> usize {
        self.spikes().iter().filter(|&&s| s).count()
    }
}

fn spikes_to_vector(spikes: &[bool]) -> DVector<f64> {
    DVector::from_iterator(spikes.len(), spikes.iter().map(|&s| if s { 1.0 } else { 0.0 }))
}

/// A layer of input neurons whose spikes are a copy of their drive.
#[derive(Debug, PartialEq, Clone)]
pub struct InputNodes {
    s: Vec<bool>,
}

impl InputNodes {
    pub fn new(num_neurons: usize) -> Self {
        InputNodes {
            s: vec![false; num_neurons],
        }
    }
}

impl Nodes for InputNodes {
    fn num_neurons(&self) -> usize {
        self.s.len()
    }

    fn forward(&mut self, x: &DVector<f64>, _dt: f64) {
        debug_assert_eq!(x.len(), self.s.len());
        self.s.iter_mut().zip(x.iter()).for_each(|(s, &x)| *s = x > 0.0);
    }

    fn spikes(&self) -> &[bool] {
        &self.s
    }

    fn variables(&self) -> &'static [StateVariable] {
        &[StateVariable::Spikes]
    }

    fn state(&self, variable: StateVariable) -> Option<DVector<f64>> {
        match variable {
            StateVariable::Spikes => Some(spikes_to_vector(&self.s)),
            _ => None,
        }
    }

    fn reset_state_variables(&mut self) {
        self.s.fill(false);
    }
}

/// Parameters of a layer of leaky integrate-and-fire neurons.
/// Voltages are in mV and times in ms.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LifParameters {
    /// Spike threshold voltage.
    pub thresh: f64,
    /// Resting membrane voltage.
    pub rest: f64,
    /// Post-spike reset voltage.
    pub reset: f64,
    /// Refractory period.
    pub refrac: f64,
    /// Time constant of the voltage decay towards rest.
    pub tc_decay: f64,
    /// Optional lower bound on the voltage.
    pub lbound: Option<f64>,
}

impl Default for LifParameters {
    fn default() -> Self {
        LifParameters {
            thresh: -52.0,
            rest: -65.0,
            reset: -65.0,
            refrac: 5.0,
            tc_decay: 100.0,
            lbound: None,
        }
    }
}

impl LifParameters {
    /// Check that the parameters describe a valid neuron model.
    pub fn validate(&self) -> Result<(), SNNError> {
        if ![self.thresh, self.rest, self.reset].iter().all(|x| x.is_finite()) {
            return Err(SNNError::InvalidParameter(
                "Threshold, rest and reset voltages must be finite".to_string(),
            ));
        }
        if !self.refrac.is_finite() || self.refrac < 0.0 {
            return Err(SNNError::InvalidParameter(format!(
                "Refractory period must be finite and non-negative, got {}",
                self.refrac
            )));
        }
        if !self.tc_decay.is_finite() || self.tc_decay <= 0.0 {
            return Err(SNNError::InvalidParameter(format!(
                "Decay time constant must be finite and positive, got {}",
                self.tc_decay
            )));
        }
        if let Some(lbound) = self.lbound {
            if !lbound.is_finite() || lbound > self.reset {
                return Err(SNNError::InvalidParameter(format!(
                    "Voltage lower bound must be finite and at most the reset voltage, got {}",
                    lbound
                )));
            }
        }
        Ok(())
    }
}

/// A layer of leaky integrate-and-fire neurons.
#[derive(Debug, PartialEq, Clone)]
pub struct LifNodes {
    params: LifParameters,
    v: DVector<f64>,
    refrac_count: DVector<f64>,
    s: Vec<bool>,
}

impl LifNodes {
    /// Create a layer with default parameters.
    pub fn new(num_neurons: usize) -> Self {
        LifNodes::from_parts(num_neurons, LifParameters::default())
    }

    /// Create a layer with the specified parameters.
    /// Returns an error if the parameters are invalid.
    pub fn build(num_neurons: usize, params: LifParameters) -> Result<Self, SNNError> {
        params.validate()?;
        Ok(LifNodes::from_parts(num_neurons, params))
    }

    fn from_parts(num_neurons: usize, params: LifParameters) -> Self {
        LifNodes {
            v: DVector::from_element(num_neurons, params.rest),
            refrac_count: DVector::zeros(num_neurons),
            s: vec![false; num_neurons],
            params,
        }
    }

    /// Returns the parameters of the layer.
    pub fn params(&self) -> &LifParameters {
        &self.params
    }

    /// Returns the membrane voltages.
    pub fn v(&self) -> &DVector<f64> {
        &self.v
    }

    /// Returns the remaining refractory times.
    pub fn refrac_count(&self) -> &DVector<f64> {
        &self.refrac_count
    }
}

impl Nodes for LifNodes {
    fn num_neurons(&self) -> usize {
        self.s.len()
    }

    fn forward(&mut self, x: &DVector<f64>, dt: f64) {
        debug_assert_eq!(x.len(), self.s.len());
        let decay = (-dt / self.params.tc_decay).exp();
        let LifParameters {
            thresh,
            rest,
            reset,
            refrac,
            lbound,
            ..
        } = self.params;

        for i in 0..self.s.len() {
            let mut v = rest + decay * (self.v[i] - rest);
            // Drive is ignored while the neuron is refractory.
            if self.refrac_count[i] <= 0.0 {
                v += x[i];
            }
            self.refrac_count[i] -= dt;

            let fired = v >= thresh;
            if fired {
                self.refrac_count[i] = refrac;
                v = reset;
            }
            if let Some(lbound) = lbound {
                v = v.max(lbound);
            }
            self.v[i] = v;
            self.s[i] = fired;
        }
    }

    fn spikes(&self) -> &[bool] {
        &self.s
    }

    fn variables(&self) -> &'static [StateVariable] {
        &[
            StateVariable::Voltage,
            StateVariable::Spikes,
            StateVariable::RefractoryCount,
        ]
    }

    fn state(&self, variable: StateVariable) -> Option<DVector<f64>> {
        match variable {
            StateVariable::Voltage => Some(self.v.clone()),
            StateVariable::Spikes => Some(spikes_to_vector(&self.s)),
            StateVariable::RefractoryCount => Some(self.refrac_count.clone()),
        }
    }

    fn reset_state_variables(&mut self) {
        self.v.fill(self.params.rest);
        self.refrac_count.fill(0.0);
        self.s.fill(false);
    }
}

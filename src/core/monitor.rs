//! Module implementing monitors, i.e., recorders of the state of a layer at every step.
use derivative::Derivative;
use itertools::Itertools;
use nalgebra::{DMatrix, DVector};
use std::collections::{HashMap, VecDeque};
use std::fmt;

use crate::core::layer::{Nodes, StateVariable};
use crate::error::SNNError;

/// Records selected state variables of one layer at every simulation step.
///
/// Without a capacity, the history grows by one entry per step until the monitor is reset.
/// With a capacity, only the most recent `capacity` entries are kept.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct Monitor {
    layer: String,
    variables: Vec<StateVariable>,
    capacity: Option<usize>,
    #[derivative(Debug = "ignore")]
    history: HashMap<StateVariable, VecDeque<DVector<f64>>>,
    num_recorded: usize,
}

impl Monitor {
    /// Create a monitor for the given layer and variables.
    /// Duplicate variables are recorded once.
    /// Returns an error if no variable is provided.
    pub fn new(layer: impl Into<String>, variables: &[StateVariable]) -> Result<Self, SNNError> {
        let variables: Vec<StateVariable> = variables.iter().copied().unique().collect();
        if variables.is_empty() {
            return Err(SNNError::InvalidParameter(
                "A monitor must record at least one state variable".to_string(),
            ));
        }
        let history = variables
            .iter()
            .map(|&variable| (variable, VecDeque::new()))
            .collect();
        Ok(Monitor {
            layer: layer.into(),
            variables,
            capacity: None,
            history,
            num_recorded: 0,
        })
    }

    /// Keep only the last `capacity` recorded steps.
    pub fn with_capacity(mut self, capacity: usize) -> Result<Self, SNNError> {
        if capacity == 0 {
            return Err(SNNError::InvalidParameter(
                "Monitor capacity must be positive".to_string(),
            ));
        }
        self.capacity = Some(capacity);
        self.history.values_mut().for_each(|buffer| {
            while buffer.len() > capacity {
                buffer.pop_front();
            }
        });
        Ok(self)
    }

    /// Returns the name of the monitored layer.
    pub fn layer(&self) -> &str {
        &self.layer
    }

    /// Returns the recorded state variables.
    pub fn variables(&self) -> &[StateVariable] {
        &self.variables
    }

    /// Returns the capacity, if any.
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Returns the number of steps currently held in the history.
    pub fn len(&self) -> usize {
        self.variables
            .first()
            .and_then(|variable| self.history.get(variable))
            .map_or(0, |buffer| buffer.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of steps recorded since the last reset, including the ones dropped because of the capacity.
    pub fn num_recorded(&self) -> usize {
        self.num_recorded
    }

    /// Append the current state of the layer to the history.
    pub fn record(&mut self, nodes: &dyn Nodes) -> Result<(), SNNError> {
        let mut snapshot = Vec::with_capacity(self.variables.len());
        for &variable in self.variables.iter() {
            let value = nodes.state(variable).ok_or_else(|| {
                SNNError::UnsupportedVariable(format!(
                    "layer {} does not expose {}",
                    self.layer, variable
                ))
            })?;
            snapshot.push((variable, value));
        }

        for (variable, value) in snapshot {
            let buffer = self.history.entry(variable).or_default();
            if self.capacity.is_some_and(|capacity| buffer.len() >= capacity) {
                buffer.pop_front();
            }
            buffer.push_back(value);
        }
        self.num_recorded += 1;
        Ok(())
    }

    /// Returns the history of a variable as a `(steps, neurons)` matrix, oldest step first.
    /// Returns `None` if the variable is not recorded by this monitor.
    pub fn get(&self, variable: StateVariable) -> Option<DMatrix<f64>> {
        let buffer = self.history.get(&variable)?;
        let num_neurons = buffer.front().map_or(0, |value| value.len());
        Some(DMatrix::from_fn(buffer.len(), num_neurons, |t, i| buffer[t][i]))
    }

    /// Returns the recorded value of a variable at one entry of the history.
    pub fn get_step(&self, variable: StateVariable, t: usize) -> Option<&DVector<f64>> {
        self.history.get(&variable)?.get(t)
    }

    /// Clear the recorded history.
    pub fn reset_state_variables(&mut self) {
        self.history.values_mut().for_each(|buffer| buffer.clear());
        self.num_recorded = 0;
    }
}

impl fmt::Display for Monitor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "Monitor(layer={}, variables=[{}], steps={})",
            self.layer,
            self.variables.iter().format(", "),
            self.len()
        )?;
        for &variable in self.variables.iter() {
            if let Some(last) = self.history.get(&variable).and_then(|buffer| buffer.back()) {
                writeln!(
                    f,
                    "  {} (last step): [{}]",
                    variable,
                    last.iter().format_with(", ", |x, f| f(&format_args!("{:.3}", x)))
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::layer::{InputNodes, LifNodes};

    #[test]
    fn test_monitor_new() {
        let monitor = Monitor::new(
            "Y",
            &[StateVariable::Voltage, StateVariable::Spikes, StateVariable::Voltage],
        )
        .unwrap();
        assert_eq!(monitor.layer(), "Y");
        assert_eq!(
            monitor.variables(),
            &[StateVariable::Voltage, StateVariable::Spikes]
        );
        assert!(monitor.is_empty());

        assert!(matches!(
            Monitor::new("Y", &[]),
            Err(SNNError::InvalidParameter(_))
        ));
        assert!(matches!(
            Monitor::new("Y", &[StateVariable::Voltage]).unwrap().with_capacity(0),
            Err(SNNError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_monitor_record() {
        let mut layer = LifNodes::new(2);
        let mut monitor = Monitor::new("Y", &[StateVariable::Voltage, StateVariable::Spikes]).unwrap();

        layer.forward(&DVector::from_vec(vec![13.0, 1.0]), 1.0);
        monitor.record(&layer).unwrap();
        layer.forward(&DVector::zeros(2), 1.0);
        monitor.record(&layer).unwrap();
        layer.forward(&DVector::zeros(2), 1.0);
        monitor.record(&layer).unwrap();

        assert_eq!(monitor.len(), 3);
        assert_eq!(monitor.num_recorded(), 3);

        let v = monitor.get(StateVariable::Voltage).unwrap();
        assert_eq!(v.shape(), (3, 2));
        assert_eq!(v[(0, 0)], -65.0);
        assert_eq!(v[(0, 1)], -64.0);

        let s = monitor.get(StateVariable::Spikes).unwrap();
        assert_eq!(s.column(0).iter().copied().collect::<Vec<f64>>(), vec![1.0, 0.0, 0.0]);
        assert_eq!(monitor.get(StateVariable::RefractoryCount), None);
        assert_eq!(monitor.get_step(StateVariable::Spikes, 0).map(|s| s[0]), Some(1.0));

        monitor.reset_state_variables();
        assert!(monitor.is_empty());
        assert_eq!(monitor.num_recorded(), 0);
        assert_eq!(monitor.get(StateVariable::Voltage).unwrap().shape(), (0, 0));
    }

    #[test]
    fn test_monitor_capacity() {
        let mut layer = InputNodes::new(1);
        let mut monitor = Monitor::new("X", &[StateVariable::Spikes])
            .unwrap()
            .with_capacity(2)
            .unwrap();

        for drive in [1.0, 0.0, 1.0, 1.0, 0.0] {
            layer.forward(&DVector::from_vec(vec![drive]), 1.0);
            monitor.record(&layer).unwrap();
        }
        assert_eq!(monitor.len(), 2);
        assert_eq!(monitor.num_recorded(), 5);
        assert_eq!(
            monitor.get(StateVariable::Spikes).unwrap().as_slice(),
            &[1.0, 0.0]
        );
    }

    #[test]
    fn test_monitor_unsupported_variable() {
        let layer = InputNodes::new(1);
        let mut monitor = Monitor::new("X", &[StateVariable::Voltage]).unwrap();
        assert!(matches!(
            monitor.record(&layer),
            Err(SNNError::UnsupportedVariable(_))
        ));
        assert!(monitor.is_empty());
    }

    #[test]
    fn test_monitor_display() {
        let layer = LifNodes::new(2);
        let mut monitor = Monitor::new("Y", &[StateVariable::Voltage]).unwrap();
        monitor.record(&layer).unwrap();
        assert_eq!(
            monitor.to_string(),
            "Monitor(layer=Y, variables=[v], steps=1)\n  v (last step): [-65.000, -65.000]\n"
        );
    }
}

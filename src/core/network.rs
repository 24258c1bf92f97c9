//! Network-related structures: named layers, the connections between them and the monitors recording them.
use log;
use nalgebra::DVector;
use std::collections::HashMap;

use crate::core::connection::Connection;
use crate::core::layer::Nodes;
use crate::core::monitor::Monitor;
use crate::core::spike_train::SpikeTrain;
use crate::error::SNNError;
use crate::utils::{check_time_step, num_steps};

/// A connection together with the positions of its source and target layers.
#[derive(Debug)]
struct Projection {
    source_id: usize,
    target_id: usize,
    connection: Connection,
}

/// A monitor together with its name and the position of its layer.
#[derive(Debug)]
struct Recorder {
    name: String,
    layer_id: usize,
    monitor: Monitor,
}

/// A network of layers advanced in lockstep with a fixed time step.
///
/// At every step, each connection first delivers the spikes its source layer emitted at the previous step,
/// then every layer is updated in insertion order, and finally every monitor records its layer.
#[derive(Debug)]
pub struct Network {
    dt: f64,
    layers: Vec<(String, Box<dyn Nodes>)>,
    projections: Vec<Projection>,
    recorders: Vec<Recorder>,
    num_steps_run: usize,
}

impl Network {
    /// Create an empty network with time step `dt` (in ms).
    /// Returns an error if the time step is not finite and positive.
    pub fn new(dt: f64) -> Result<Self, SNNError> {
        check_time_step(dt)?;
        Ok(Network {
            dt,
            layers: vec![],
            projections: vec![],
            recorders: vec![],
            num_steps_run: 0,
        })
    }

    /// Returns the time step of the network.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Returns the number of steps simulated since the last reset.
    pub fn num_steps_run(&self) -> usize {
        self.num_steps_run
    }

    /// Add a layer to the network under the given name.
    /// Returns an error if the name is already taken or the layer has no neuron.
    pub fn add_layer<L: Nodes + 'static>(
        &mut self,
        name: impl Into<String>,
        layer: L,
    ) -> Result<(), SNNError> {
        let name = name.into();
        if self.layer_id(&name).is_some() {
            return Err(SNNError::DuplicateName(name));
        }
        if layer.num_neurons() == 0 {
            return Err(SNNError::InvalidParameter(format!(
                "Layer {} must have at least one neuron",
                name
            )));
        }
        log::debug!("Adding layer {} with {} neurons", name, layer.num_neurons());
        let layer: Box<dyn Nodes> = Box::new(layer);
        self.layers.push((name, layer));
        Ok(())
    }

    /// Add a connection between two layers of the network.
    /// Returns an error if one of the layers does not exist, if the two layers are already connected,
    /// or if the weight matrix does not fit the layer sizes.
    pub fn add_connection(&mut self, connection: Connection) -> Result<(), SNNError> {
        let source_id = self
            .layer_id(connection.source())
            .ok_or_else(|| SNNError::LayerNotFound(connection.source().to_string()))?;
        let target_id = self
            .layer_id(connection.target())
            .ok_or_else(|| SNNError::LayerNotFound(connection.target().to_string()))?;

        if self
            .projections
            .iter()
            .any(|p| p.source_id == source_id && p.target_id == target_id)
        {
            return Err(SNNError::DuplicateName(format!(
                "{} -> {}",
                connection.source(),
                connection.target()
            )));
        }

        let num_sources = self.layers[source_id].1.num_neurons();
        let num_targets = self.layers[target_id].1.num_neurons();
        if connection.num_sources() != num_sources || connection.num_targets() != num_targets {
            return Err(SNNError::ShapeMismatch(format!(
                "Connection {} -> {} has a {}x{} weight matrix but the layers have {} and {} neurons",
                connection.source(),
                connection.target(),
                connection.num_sources(),
                connection.num_targets(),
                num_sources,
                num_targets
            )));
        }

        log::debug!(
            "Adding connection {} -> {}",
            connection.source(),
            connection.target()
        );
        self.projections.push(Projection {
            source_id,
            target_id,
            connection,
        });
        Ok(())
    }

    /// Add a monitor to the network under the given name.
    /// Returns an error if the name is already taken, the monitored layer does not exist,
    /// or the layer does not expose one of the monitored variables.
    pub fn add_monitor(&mut self, name: impl Into<String>, monitor: Monitor) -> Result<(), SNNError> {
        let name = name.into();
        if self.recorders.iter().any(|recorder| recorder.name == name) {
            return Err(SNNError::DuplicateName(name));
        }
        let layer_id = self
            .layer_id(monitor.layer())
            .ok_or_else(|| SNNError::LayerNotFound(monitor.layer().to_string()))?;
        let layer = &self.layers[layer_id].1;
        if let Some(variable) = monitor
            .variables()
            .iter()
            .find(|&&variable| !layer.has_variable(variable))
        {
            return Err(SNNError::UnsupportedVariable(format!(
                "layer {} does not expose {}",
                monitor.layer(),
                variable
            )));
        }
        self.recorders.push(Recorder {
            name,
            layer_id,
            monitor,
        });
        Ok(())
    }

    fn layer_id(&self, name: &str) -> Option<usize> {
        self.layers.iter().position(|(layer_name, _)| layer_name == name)
    }

    /// Returns a reference to a layer of the network.
    pub fn layer(&self, name: &str) -> Option<&dyn Nodes> {
        self.layer_id(name).map(|id| self.layers[id].1.as_ref())
    }

    /// Returns a mutable reference to a layer of the network.
    pub fn layer_mut(&mut self, name: &str) -> Option<&mut dyn Nodes> {
        let id = self.layer_id(name)?;
        Some(self.layers[id].1.as_mut())
    }

    /// An iterator over the layer names, in update order.
    pub fn layer_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.layers.iter().map(|(name, _)| name.as_str())
    }

    /// Returns the connection from `source` to `target`, if any.
    pub fn connection(&self, source: &str, target: &str) -> Option<&Connection> {
        self.projections
            .iter()
            .map(|p| &p.connection)
            .find(|c| c.source() == source && c.target() == target)
    }

    /// Returns a mutable reference to the connection from `source` to `target`, if any.
    pub fn connection_mut(&mut self, source: &str, target: &str) -> Option<&mut Connection> {
        self.projections
            .iter_mut()
            .map(|p| &mut p.connection)
            .find(|c| c.source() == source && c.target() == target)
    }

    /// Returns a monitor of the network.
    pub fn monitor(&self, name: &str) -> Option<&Monitor> {
        self.recorders
            .iter()
            .find(|recorder| recorder.name == name)
            .map(|recorder| &recorder.monitor)
    }

    /// Returns a mutable reference to a monitor of the network.
    pub fn monitor_mut(&mut self, name: &str) -> Option<&mut Monitor> {
        self.recorders
            .iter_mut()
            .find(|recorder| recorder.name == name)
            .map(|recorder| &mut recorder.monitor)
    }

    /// The number of layers in the network.
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    /// The number of connections in the network.
    pub fn num_connections(&self) -> usize {
        self.projections.len()
    }

    /// The number of monitors in the network.
    pub fn num_monitors(&self) -> usize {
        self.recorders.len()
    }

    /// Simulate the network for `time` ms, i.e., `round(time / dt)` steps.
    /// The inputs map layer names to spike trains driving them; each must cover at least the simulated steps.
    /// Layers without input only receive synaptic input.
    pub fn run(&mut self, inputs: &HashMap<String, SpikeTrain>, time: f64) -> Result<(), SNNError> {
        let num_steps = num_steps(time, self.dt)?;
        self.check_inputs(inputs, num_steps)?;

        let external: Vec<Option<&SpikeTrain>> = self
            .layers
            .iter()
            .map(|(name, _)| inputs.get(name))
            .collect();

        log::info!(
            "Running {} steps of {} ms on {} layers",
            num_steps,
            self.dt,
            self.layers.len()
        );
        for t in 0..num_steps {
            self.step(&external, t)?;
        }
        log::info!("Simulation completed after {} steps", self.num_steps_run);
        Ok(())
    }

    fn check_inputs(
        &self,
        inputs: &HashMap<String, SpikeTrain>,
        num_steps: usize,
    ) -> Result<(), SNNError> {
        for (name, spike_train) in inputs.iter() {
            let layer = self
                .layer(name)
                .ok_or_else(|| SNNError::LayerNotFound(name.clone()))?;
            if spike_train.num_neurons() != layer.num_neurons() {
                return Err(SNNError::ShapeMismatch(format!(
                    "Input for layer {} has {} neurons, expected {}",
                    name,
                    spike_train.num_neurons(),
                    layer.num_neurons()
                )));
            }
            if spike_train.num_steps() < num_steps {
                return Err(SNNError::MissingInput(format!(
                    "input for layer {} covers {} steps, but {} are simulated",
                    name,
                    spike_train.num_steps(),
                    num_steps
                )));
            }
        }
        Ok(())
    }

    fn step(&mut self, external: &[Option<&SpikeTrain>], t: usize) -> Result<(), SNNError> {
        let mut drives: Vec<DVector<f64>> = self
            .layers
            .iter()
            .map(|(_, layer)| DVector::zeros(layer.num_neurons()))
            .collect();

        // Synaptic input from the spikes of the previous step.
        for projection in self.projections.iter() {
            let source = &self.layers[projection.source_id].1;
            drives[projection.target_id] += projection.connection.compute(source.spikes())?;
        }

        for (drive, spike_train) in drives.iter_mut().zip(external) {
            if let Some(spike_train) = spike_train {
                let row = spike_train.step(t).ok_or_else(|| {
                    SNNError::MissingInput(format!("no input spikes at step {}", t))
                })?;
                for (x, &spike) in drive.iter_mut().zip(row) {
                    if spike {
                        *x += 1.0;
                    }
                }
            }
        }

        for ((_, layer), drive) in self.layers.iter_mut().zip(drives.iter()) {
            layer.forward(drive, self.dt);
        }

        for recorder in self.recorders.iter_mut() {
            recorder.monitor.record(self.layers[recorder.layer_id].1.as_ref())?;
        }

        self.num_steps_run += 1;
        log::debug!(
            "Step {}: {} spikes",
            t,
            self.layers.iter().map(|(_, layer)| layer.num_spikes()).sum::<usize>()
        );
        Ok(())
    }

    /// Bring every layer back to its initial state and clear every monitor.
    pub fn reset_state_variables(&mut self) {
        self.layers
            .iter_mut()
            .for_each(|(_, layer)| layer.reset_state_variables());
        self.recorders
            .iter_mut()
            .for_each(|recorder| recorder.monitor.reset_state_variables());
        self.num_steps_run = 0;
    }
}

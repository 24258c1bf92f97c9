//! The feed-forward simulation program: an input layer driven by Poisson spike trains,
//! fully connected to a layer of leaky integrate-and-fire neurons whose state is recorded.
//!
//! # Example
//! ```rust
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use rusty_lif::core::layer::StateVariable;
//! use rusty_lif::simulator::{Simulation, SimulationConfig};
//!
//! let mut rng = StdRng::seed_from_u64(42);
//!
//! // 20 input and 20 LIF neurons, simulated for 10 ms with steps of 0.1 ms
//! let mut simulation = Simulation::build(SimulationConfig::default(), &mut rng).unwrap();
//! simulation.run().unwrap();
//!
//! let voltages = simulation.monitor().unwrap().get(StateVariable::Voltage).unwrap();
//! assert_eq!(voltages.shape(), (100, 20));
//! ```
use log;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::core::connection::Connection;
use crate::core::layer::{InputNodes, LifNodes, LifParameters, StateVariable};
use crate::core::monitor::Monitor;
use crate::core::network::Network;
use crate::core::spike_train::SpikeTrain;
use crate::encoding::{Encoder, PoissonEncoder};
use crate::error::SNNError;
use crate::utils::{check_time_step, num_steps};

/// Name of the input layer.
pub const INPUT_LAYER: &str = "X";
/// Name of the LIF layer.
pub const OUTPUT_LAYER: &str = "Y";
/// Name of the monitor attached to the LIF layer.
pub const OUTPUT_MONITOR: &str = "y_monitor";

/// Parameters of the feed-forward simulation. Times are in ms and rates in Hz.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of neurons in each of the two layers.
    pub n_neurons: usize,
    /// Simulated duration.
    pub time: f64,
    /// Time step of the network and of the encoding.
    pub dt: f64,
    /// The input rates are drawn uniformly in [0, max_rate).
    pub max_rate: f64,
    /// Parameters of the LIF layer.
    pub lif: LifParameters,
    /// State variables of the LIF layer to record.
    pub monitored: Vec<StateVariable>,
    /// Seed of the random number generator, if any.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            n_neurons: 20,
            time: 10.0,
            dt: 0.1,
            max_rate: 1000.0,
            lif: LifParameters::default(),
            monitored: vec![StateVariable::Voltage],
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Check that the configuration describes a valid simulation.
    pub fn validate(&self) -> Result<(), SNNError> {
        if self.n_neurons == 0 {
            return Err(SNNError::InvalidParameter(
                "The number of neurons must be positive".to_string(),
            ));
        }
        check_time_step(self.dt)?;
        num_steps(self.time, self.dt)?;
        if !self.max_rate.is_finite() || self.max_rate < 0.0 {
            return Err(SNNError::InvalidParameter(format!(
                "Maximum rate must be finite and non-negative, got {}",
                self.max_rate
            )));
        }
        if self.monitored.is_empty() {
            return Err(SNNError::InvalidParameter(
                "At least one state variable must be monitored".to_string(),
            ));
        }
        self.lif.validate()
    }

    /// Returns the number of simulated steps.
    pub fn num_steps(&self) -> Result<usize, SNNError> {
        num_steps(self.time, self.dt)
    }

    /// Save the configuration to a file.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), SNNError> {
        let file = File::create(path).map_err(|e| SNNError::IOError(e.to_string()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .map_err(|e| SNNError::IOError(e.to_string()))?;
        writer.flush().map_err(|e| SNNError::IOError(e.to_string()))
    }

    /// Load a configuration from a file. Missing fields take their default value.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, SNNError> {
        let file = File::open(path).map_err(|e| SNNError::IOError(e.to_string()))?;
        let reader = BufReader::new(file);
        let config: SimulationConfig =
            serde_json::from_reader(reader).map_err(|e| SNNError::IOError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

/// A ready-to-run feed-forward simulation.
#[derive(Debug)]
pub struct Simulation {
    config: SimulationConfig,
    network: Network,
    inputs: HashMap<String, SpikeTrain>,
}

impl Simulation {
    /// Build the network described by the configuration and encode its input.
    /// The connection weights are drawn uniformly in [0, 1) and the input rates uniformly in [0, max_rate).
    pub fn build<R: Rng>(config: SimulationConfig, rng: &mut R) -> Result<Self, SNNError> {
        config.validate()?;
        let n = config.n_neurons;

        let mut network = Network::new(config.dt)?;
        network.add_layer(INPUT_LAYER, InputNodes::new(n))?;
        network.add_layer(OUTPUT_LAYER, LifNodes::build(n, config.lif.clone())?)?;
        network.add_connection(Connection::rand(INPUT_LAYER, OUTPUT_LAYER, n, n, rng))?;

        let monitor = Monitor::new(OUTPUT_LAYER, &config.monitored)?
            .with_capacity(config.num_steps()?.max(1))?;
        network.add_monitor(OUTPUT_MONITOR, monitor)?;

        let rates: Vec<f64> = (0..n).map(|_| rng.gen::<f64>() * config.max_rate).collect();
        let input = PoissonEncoder.encode(&rates, config.time, config.dt, rng)?;
        log::info!(
            "Encoded {} input spikes for {} neurons over {} steps",
            input.num_spikes(),
            input.num_neurons(),
            input.num_steps()
        );

        Ok(Simulation {
            config,
            network,
            inputs: HashMap::from([(INPUT_LAYER.to_string(), input)]),
        })
    }

    /// Run the network for the configured duration.
    pub fn run(&mut self) -> Result<(), SNNError> {
        self.network.run(&self.inputs, self.config.time)
    }

    /// Returns the configuration of the simulation.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Returns the network.
    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Returns a mutable reference to the network.
    pub fn network_mut(&mut self) -> &mut Network {
        &mut self.network
    }

    /// Returns the spike train driving the input layer.
    pub fn input(&self) -> Option<&SpikeTrain> {
        self.inputs.get(INPUT_LAYER)
    }

    /// Returns the monitor attached to the LIF layer.
    pub fn monitor(&self) -> Option<&Monitor> {
        self.network.monitor(OUTPUT_MONITOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_validate() {
        assert!(SimulationConfig::default().validate().is_ok());
        assert_eq!(SimulationConfig::default().num_steps(), Ok(100));

        let config = SimulationConfig {
            n_neurons: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = SimulationConfig {
            dt: -0.1,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = SimulationConfig {
            max_rate: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = SimulationConfig {
            monitored: vec![],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_save_load() {
        let config = SimulationConfig {
            n_neurons: 5,
            seed: Some(7),
            monitored: vec![StateVariable::Voltage, StateVariable::Spikes],
            ..Default::default()
        };
        let file = NamedTempFile::new().unwrap();
        config.save_to(file.path()).unwrap();
        assert_eq!(SimulationConfig::load_from(file.path()).unwrap(), config);
    }

    #[test]
    fn test_config_load_partial() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"n_neurons": 4, "time": 5.0, "monitored": ["v", "s"], "lif": {{"thresh": -50.0}}}}"#).unwrap();
        let config = SimulationConfig::load_from(file.path()).unwrap();
        assert_eq!(config.n_neurons, 4);
        assert_eq!(config.time, 5.0);
        assert_eq!(config.dt, 0.1);
        assert_eq!(config.monitored, vec![StateVariable::Voltage, StateVariable::Spikes]);
        assert_eq!(config.lif.thresh, -50.0);
        assert_eq!(config.lif.rest, -65.0);
    }

    #[test]
    fn test_config_load_errors() {
        assert!(matches!(
            SimulationConfig::load_from("does/not/exist.json"),
            Err(SNNError::IOError(_))
        ));

        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"n_neurons": 0}}"#).unwrap();
        assert!(matches!(
            SimulationConfig::load_from(file.path()),
            Err(SNNError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_simulation_run() {
        let mut rng = StdRng::seed_from_u64(42);
        let config = SimulationConfig {
            monitored: vec![StateVariable::Voltage, StateVariable::Spikes],
            ..Default::default()
        };
        let mut simulation = Simulation::build(config, &mut rng).unwrap();
        assert_eq!(simulation.input().map(|input| input.shape()), Some((100, 20)));
        assert!(simulation.monitor().unwrap().is_empty());

        simulation.run().unwrap();
        let monitor = simulation.monitor().unwrap();
        assert_eq!(monitor.get(StateVariable::Voltage).unwrap().shape(), (100, 20));
        assert_eq!(monitor.get(StateVariable::Spikes).unwrap().shape(), (100, 20));
        assert_eq!(simulation.network().num_steps_run(), 100);

        // The monitor keeps the last run only.
        simulation.run().unwrap();
        assert_eq!(simulation.monitor().unwrap().len(), 100);
        assert_eq!(simulation.monitor().unwrap().num_recorded(), 200);
    }

    #[test]
    fn test_simulation_unit_step_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"dt": 1.0, "max_rate": 1.0, "seed": 5}}"#).unwrap();
        let config = SimulationConfig::load_from(file.path()).unwrap();
        assert_eq!(config.num_steps(), Ok(10));
        assert_eq!(config.n_neurons, 20);
        assert_eq!(config.time, 10.0);

        let mut rng = StdRng::seed_from_u64(5);
        let mut simulation = Simulation::build(config, &mut rng).unwrap();
        assert_eq!(simulation.input().map(|input| input.shape()), Some((10, 20)));
        simulation.run().unwrap();
        assert_eq!(simulation.monitor().unwrap().len(), 10);
        assert_eq!(simulation.network().num_steps_run(), 10);

        // The default configuration runs 100 steps of 0.1 ms instead.
        assert_eq!(SimulationConfig::default().num_steps(), Ok(100));
    }

    #[test]
    fn test_simulation_silent_input() {
        let mut rng = StdRng::seed_from_u64(1);
        let config = SimulationConfig {
            max_rate: 0.0,
            ..Default::default()
        };
        let mut simulation = Simulation::build(config, &mut rng).unwrap();
        simulation.run().unwrap();
        let voltages = simulation.monitor().unwrap().get(StateVariable::Voltage).unwrap();
        assert!(voltages.iter().all(|&v| v == -65.0));
    }

    #[test]
    fn test_simulation_reproducible() {
        let run = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut simulation = Simulation::build(SimulationConfig::default(), &mut rng).unwrap();
            simulation.run().unwrap();
            simulation.monitor().unwrap().get(StateVariable::Voltage).unwrap()
        };
        assert_eq!(run(3), run(3));
    }
}

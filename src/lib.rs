//! This crate provides tools for simulating layered spiking neural networks in discrete time.
//!
//! A [`core::network::Network`] owns named layers of neurons, the weighted connections between them,
//! and monitors recording their state. It is advanced in lockstep: at every step, the connections deliver
//! the spikes of the previous step, every layer updates its state, and every monitor records its layer.
//!
//! # Creating Networks
//!
//! ```rust
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use rusty_lif::core::connection::Connection;
//! use rusty_lif::core::layer::{InputNodes, LifNodes};
//! use rusty_lif::core::network::Network;
//!
//! let mut rng = StdRng::seed_from_u64(42);
//!
//! // An input layer X and a LIF layer Y of 20 neurons each, with a time step of 1 ms
//! let mut network = Network::new(1.0).unwrap();
//! network.add_layer("X", InputNodes::new(20)).unwrap();
//! network.add_layer("Y", LifNodes::new(20)).unwrap();
//!
//! // Connect X to Y with random weights
//! network.add_connection(Connection::rand("X", "Y", 20, 20, &mut rng)).unwrap();
//!
//! assert_eq!(network.num_layers(), 2);
//! assert_eq!(network.num_connections(), 1);
//! ```
//!
//! # Simulating Networks
//!
//! ```rust
//! use std::collections::HashMap;
//! use rand::rngs::StdRng;
//! use rand::{Rng, SeedableRng};
//! use rusty_lif::core::connection::Connection;
//! use rusty_lif::core::layer::{InputNodes, LifNodes, StateVariable};
//! use rusty_lif::core::monitor::Monitor;
//! use rusty_lif::core::network::Network;
//! use rusty_lif::encoding::{Encoder, PoissonEncoder};
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let mut network = Network::new(1.0).unwrap();
//! network.add_layer("X", InputNodes::new(20)).unwrap();
//! network.add_layer("Y", LifNodes::new(20)).unwrap();
//! network.add_connection(Connection::rand("X", "Y", 20, 20, &mut rng)).unwrap();
//! network.add_monitor("y", Monitor::new("Y", &[StateVariable::Voltage]).unwrap()).unwrap();
//!
//! // Encode random rates (in Hz) into Poisson spike trains and run for 50 ms
//! let rates: Vec<f64> = (0..20).map(|_| rng.gen_range(0.0..100.0)).collect();
//! let input = PoissonEncoder.encode(&rates, 50.0, 1.0, &mut rng).unwrap();
//! network.run(&HashMap::from([("X".to_string(), input)]), 50.0).unwrap();
//!
//! let voltages = network.monitor("y").unwrap().get(StateVariable::Voltage).unwrap();
//! assert_eq!(voltages.shape(), (50, 20));
//! ```

pub mod core;
pub mod encoding;
pub mod error;
pub mod simulator;
pub mod utils;

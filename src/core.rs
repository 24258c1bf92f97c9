//! Core module defining the main components of the Rusty LIF library.
//!
//! This module provides the building blocks for creating and simulating
//! layered spiking neural networks in discrete time:
//!
//! - [`spike_train`]: Binary spike events indexed by time step
//! - [`layer`]: Groups of neurons and their state-update rules
//! - [`connection`]: Weighted connections between layers
//! - [`monitor`]: Recorders of the state of a layer at every step
//! - [`network`]: Owns the layers, connections and monitors, and advances them in lockstep
//!
//! # Examples
//!
//! ```
//! use std::collections::HashMap;
//! use nalgebra::DMatrix;
//! use rusty_lif::core::{
//!     connection::Connection,
//!     layer::{InputNodes, LifNodes, StateVariable},
//!     monitor::Monitor,
//!     network::Network,
//!     spike_train::SpikeTrain,
//! };
//!
//! // Create a network with a time step of 1 ms
//! let mut network = Network::new(1.0).unwrap();
//!
//! // Add an input layer and a LIF layer of 2 neurons each, and connect them
//! network.add_layer("X", InputNodes::new(2)).unwrap();
//! network.add_layer("Y", LifNodes::new(2)).unwrap();
//! network.add_connection(Connection::build("X", "Y", DMatrix::from_element(2, 2, 5.0)).unwrap()).unwrap();
//!
//! // Record the voltages of the LIF layer
//! network.add_monitor("y", Monitor::new("Y", &[StateVariable::Voltage]).unwrap()).unwrap();
//!
//! // Drive the input layer for 10 ms
//! let input = SpikeTrain::build(vec![vec![true, false]; 10]).unwrap();
//! network.run(&HashMap::from([("X".to_string(), input)]), 10.0).unwrap();
//!
//! assert_eq!(network.monitor("y").unwrap().get(StateVariable::Voltage).unwrap().shape(), (10, 2));
//! ```
pub mod connection;
pub mod layer;
pub mod monitor;
pub mod network;
pub mod spike_train;

/// Minimum number of neurons to consider parallel processing.
pub const MIN_PARALLEL_NEURONS: usize = 100;

//! Error module for the Rusty LIF library.
use std::error::Error;
use std::fmt;

/// Error types for the library.
#[derive(Debug, PartialEq)]
pub enum SNNError {
    /// Error for invalid parameters, e.g., a negative rate or a non-positive time step.
    InvalidParameter(String),
    /// Error for incompatible shapes, e.g., a weight matrix that does not fit the layers it connects.
    ShapeMismatch(String),
    /// Error for a layer name that does not exist in the network.
    LayerNotFound(String),
    /// Error for a layer or monitor name that is already taken.
    DuplicateName(String),
    /// Error for a state variable the layer does not expose.
    UnsupportedVariable(String),
    /// Error for an input spike train that does not cover the whole run.
    MissingInput(String),
    /// Error for I/O operations.
    IOError(String),
}

impl fmt::Display for SNNError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SNNError::InvalidParameter(e) => write!(f, "Invalid parameters: {}", e),
            SNNError::ShapeMismatch(e) => write!(f, "Shape mismatch: {}", e),
            SNNError::LayerNotFound(name) => write!(f, "Layer not found in the network: {}", name),
            SNNError::DuplicateName(name) => write!(f, "Name already in use: {}", name),
            SNNError::UnsupportedVariable(e) => write!(f, "Unsupported state variable: {}", e),
            SNNError::MissingInput(e) => write!(f, "Missing input: {}", e),
            SNNError::IOError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl Error for SNNError {}

//! Utility functions shared by the simulation components.
use crate::error::SNNError;

/// Returns the number of discrete steps needed to cover `time` with steps of size `dt`.
/// The ratio is rounded to the nearest integer, so that `0.3 / 0.1` gives 3 steps.
pub fn num_steps(time: f64, dt: f64) -> Result<usize, SNNError> {
    check_time_step(dt)?;
    if !time.is_finite() || time < 0.0 {
        return Err(SNNError::InvalidParameter(format!(
            "Simulation time must be finite and non-negative, got {}",
            time
        )));
    }
    Ok((time / dt).round() as usize)
}

/// Checks that a time step is finite and strictly positive.
pub fn check_time_step(dt: f64) -> Result<(), SNNError> {
    if !dt.is_finite() || dt <= 0.0 {
        return Err(SNNError::InvalidParameter(format!(
            "Time step must be finite and positive, got {}",
            dt
        )));
    }
    Ok(())
}

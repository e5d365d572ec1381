//! Conversion of annual decay-rate constants to sub-annual timesteps.
//!
//! Decay constants are specified as continuous annual rates $k$. A pool
//! decaying at $k$ retains $e^{-k}$ of its carbon after one year, so the
//! equivalent fraction lost over a step of $d$ days is
//!
//! $$f(k, d) = 1 - e^{-k d / 365}$$
//!
//! Applying $f$ for $365/d$ consecutive steps reproduces the annual survival.

use crate::errors::{SomError, SomResult};
use crate::FloatValue;

/// Days in a simulation year.
pub const DAYS_PER_YEAR: FloatValue = 365.0;

/// Fraction of a pool decomposed during one timestep.
///
/// # Arguments
///
/// * `kcont` - Continuous annual decay rate
///   unit: 1 / yr
/// * `timestep_days` - Length of the timestep
///   unit: day
///
/// # Errors
///
/// * [`SomError::InvalidTimestep`] if the timestep is not within (0, 365] days
/// * [`SomError::Configuration`] if the rate is negative or not finite
pub fn timescaling(kcont: FloatValue, timestep_days: FloatValue) -> SomResult<FloatValue> {
    validate_timestep(timestep_days)?;
    if !kcont.is_finite() || kcont < 0.0 {
        return Err(SomError::Configuration(format!(
            "decay rate must be a non-negative number, got {}",
            kcont
        )));
    }
    Ok(1.0 - (-kcont * timestep_days / DAYS_PER_YEAR).exp())
}

/// Checks that a timestep lies within (0, 365] days.
pub fn validate_timestep(timestep_days: FloatValue) -> SomResult<()> {
    if !(timestep_days > 0.0 && timestep_days <= DAYS_PER_YEAR) {
        return Err(SomError::InvalidTimestep(timestep_days));
    }
    Ok(())
}

/// Fraction of carbon remaining after one year at continuous rate `kcont`.
pub fn annual_survival(kcont: FloatValue) -> FloatValue {
    (-kcont).exp()
}

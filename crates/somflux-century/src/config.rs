//! TOML configuration of a pool network.
//!
//! Every field has a default, so a configuration file only needs to list what
//! it changes:
//!
//! ```toml
//! timestep_days = 1.0
//!
//! [options]
//! woody = false
//!
//! [leaching]
//! threshold_flow = 2.5
//!
//! [initial_state.passive]
//! carbon = 4200.0
//! nutrient = { c_to_n = 9.0, c_to_p = 90.0, c_to_s = 90.0, c_to_k = 50.0 }
//! ```

use crate::network::{PoolNetwork, StepOptions};
use crate::parameters::{
    DecompositionParameters, InitialState, LeachingParameters, LitterParameters,
    RestrictionParameters,
};
use crate::pools::SoilState;
use serde::{Deserialize, Serialize};
use somflux_core::errors::{SomError, SomResult};
use somflux_core::timestep::validate_timestep;
use somflux_core::FloatValue;
use std::path::Path;

/// Complete configuration of one soil layer's pool network.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SomConfig {
    /// Length of a step
    /// unit: day
    /// default: 1.0
    pub timestep_days: FloatValue,
    pub options: StepOptions,
    pub decomposition: DecompositionParameters,
    pub restriction: RestrictionParameters,
    pub leaching: LeachingParameters,
    pub litter: LitterParameters,
    pub initial_state: InitialState,
}

impl Default for SomConfig {
    fn default() -> Self {
        Self {
            timestep_days: 1.0,
            options: StepOptions::default(),
            decomposition: DecompositionParameters::default(),
            restriction: RestrictionParameters::default(),
            leaching: LeachingParameters::default(),
            litter: LitterParameters::default(),
            initial_state: InitialState::default(),
        }
    }
}

impl SomConfig {
    pub fn from_toml_str(content: &str) -> SomResult<Self> {
        let config: SomConfig = toml::from_str(content)
            .map_err(|e| SomError::Configuration(format!("could not parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> SomResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SomError::Configuration(format!("could not read {}: {}", path.display(), e))
        })?;
        log::info!("Loading configuration from {}", path.display());
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> SomResult<String> {
        toml::to_string(self)
            .map_err(|e| SomError::Configuration(format!("could not write TOML: {}", e)))
    }

    /// Checks every part of the configuration.
    ///
    /// # Errors
    ///
    /// * [`SomError::InvalidTimestep`] for a timestep outside (0, 365] days
    /// * [`SomError::UnsupportedGatingNutrient`] for gating on anything but N
    /// * [`SomError::Configuration`] for any other invalid value
    pub fn validate(&self) -> SomResult<()> {
        validate_timestep(self.timestep_days)?;
        self.options.validate()?;
        for (pool, kind) in self.decomposition.iter() {
            kind.validate(pool)?;
        }
        self.restriction.validate()?;
        self.leaching.validate()?;
        self.litter.validate()?;
        self.initial_state.validate()?;
        Ok(())
    }

    pub fn build_network(&self) -> SomResult<PoolNetwork> {
        PoolNetwork::from_config(self)
    }

    pub fn initial_soil_state(&self) -> SoilState {
        SoilState::from_initial_state(&self.initial_state)
    }
}

//! Daily turnover of soil organic matter.
//!
//! Carbon, with the nitrogen, phosphorus, sulfur and potassium that travel
//! with it, moves through a fixed network of litter, wood and soil organic
//! matter pools under the control of temperature, moisture, pH, texture and
//! redox conditions.
//!
//! ```no_run
//! use somflux::century::config::SomConfig;
//! use somflux::century::network::StepOptions;
//!
//! let config = SomConfig::from_path("somflux.toml")?;
//! let network = config.build_network()?;
//! let mut state = config.initial_soil_state();
//!
//! for _ in 0..365 {
//!     state.environment.soil_temperature = 14.0;
//!     let report = network.step(&mut state, &StepOptions::default())?;
//!     println!("{}", report.heterotrophic_respiration);
//! }
//! # Ok::<(), somflux::core::errors::SomError>(())
//! ```

pub use somflux_century as century;
pub use somflux_core as core;

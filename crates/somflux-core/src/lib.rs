//! Core building blocks for soil organic matter models
//!
//! This crate holds the pieces shared by every pool network:
//!
//! - `stoichiometry`: carbon and carbon-to-element records and the
//!   carbon-weighted merges between them
//! - `modifiers`: dimensionless environmental effects on decomposition
//! - `environment`: per-layer drivers and mineral nutrient levels
//! - `timestep`: conversion of annual decay constants to the model timestep
//! - `errors`: the error type returned throughout the workspace

pub mod element;
pub mod environment;
pub mod errors;
pub mod modifiers;
pub mod stoichiometry;
pub mod timestep;

/// Floating point type used for all state and parameters.
pub type FloatValue = f64;

//! CENTURY-style litter and soil organic matter network
//!
//! This crate moves carbon, and the nitrogen, phosphorus, sulfur and
//! potassium that travel with it, through the litter, wood and soil organic
//! matter pools of one soil layer.
//!
//! # Module Organisation
//!
//! - `pools`: pool identifiers, pool records and the per-layer state
//! - `flows`: per-step transfers out of a pool
//! - `restriction`: required C:E ratios of material entering a pool
//! - `leaching`: dissolved organic matter lost with drainage
//! - `decomposition`: the generic per-pool decomposition routine
//! - `network`: ordering, gating and the decompose/commit step
//! - `litter`: additions of dead plant material
//! - `config`: TOML configuration
//!
//! # Parameters
//!
//! Each part has an associated parameters struct in the `parameters` module
//! with defaults matching the CENTURY `fix.100` configuration.

pub mod config;
pub mod decomposition;
pub mod flows;
pub mod leaching;
pub mod litter;
pub mod network;
pub mod parameters;
pub mod pools;
pub mod restriction;

//! Pool network parameters
//!
//! This module contains the parameter structures for every part of the
//! network. Each struct provides defaults matching the CENTURY `fix.100`
//! configuration where one exists.

mod decomposition;
mod initial_state;
mod leaching;
mod litter;
mod restriction;

pub use decomposition::{
    DecompositionParameters, Destination, MixingRule, PhotodecompositionParameters,
    PoolKindParameters, Share, Split, SplitRule,
};
pub use initial_state::{InitialState, PoolInit};
pub use leaching::LeachingParameters;
pub use litter::{AbsorptionParameters, LitterParameters};
pub use restriction::{FlowRestriction, RatioBounds, RestrictionParameters};

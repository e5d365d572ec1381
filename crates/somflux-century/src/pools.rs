//! Pool identifiers and pool records.

use crate::flows::FlowSet;
use crate::parameters::InitialState;
use serde::{Deserialize, Serialize};
use somflux_core::environment::{Environment, Layer};
use somflux_core::stoichiometry::{Carbon, Nutrient};
use somflux_core::FloatValue;
use std::fmt;
use std::ops::{Index, IndexMut};

/// Identifier of a pool in the network.
///
/// The declaration order is also the tie-break order used when sequencing
/// decomposition, so wood pools come first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PoolId {
    /// Dead fine branches
    FineBranch,
    /// Dead large wood
    LargeWood,
    /// Dead coarse roots
    CoarseRoot,
    StructuralSurface,
    StructuralSoil,
    MetabolicSurface,
    MetabolicSoil,
    /// Surface microbes (SOM1 surface)
    ActiveSurface,
    /// Soil microbes (SOM1 soil)
    ActiveSoil,
    SlowSurface,
    SlowSoil,
    Passive,
    /// Dissolved organic matter leached below the profile
    Leachate,
}

impl PoolId {
    pub const COUNT: usize = 13;

    pub const ALL: [PoolId; PoolId::COUNT] = [
        PoolId::FineBranch,
        PoolId::LargeWood,
        PoolId::CoarseRoot,
        PoolId::StructuralSurface,
        PoolId::StructuralSoil,
        PoolId::MetabolicSurface,
        PoolId::MetabolicSoil,
        PoolId::ActiveSurface,
        PoolId::ActiveSoil,
        PoolId::SlowSurface,
        PoolId::SlowSoil,
        PoolId::Passive,
        PoolId::Leachate,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Layer whose drivers control this pool.
    ///
    /// Fine branches and large wood lie on the surface; coarse roots are
    /// belowground.
    pub fn layer(self) -> Layer {
        match self {
            PoolId::FineBranch
            | PoolId::LargeWood
            | PoolId::StructuralSurface
            | PoolId::MetabolicSurface
            | PoolId::ActiveSurface
            | PoolId::SlowSurface => Layer::Surface,
            PoolId::CoarseRoot
            | PoolId::StructuralSoil
            | PoolId::MetabolicSoil
            | PoolId::ActiveSoil
            | PoolId::SlowSoil
            | PoolId::Passive
            | PoolId::Leachate => Layer::Soil,
        }
    }

    pub fn is_wood(self) -> bool {
        matches!(
            self,
            PoolId::FineBranch | PoolId::LargeWood | PoolId::CoarseRoot
        )
    }

    /// Pools that only receive material and never decompose.
    pub fn is_sink(self) -> bool {
        self == PoolId::Leachate
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One compartment of litter or soil organic matter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pool {
    pub carbon: Carbon,
    pub nutrient: Nutrient,
    /// Lignin fraction of the pool's carbon (structural and wood pools)
    /// unit: fraction
    pub lignin_fraction: FloatValue,
    /// Flows committed from this pool during the last step
    pub flux: FlowSet,
}

impl Pool {
    pub fn new(carbon: Carbon, nutrient: Nutrient, lignin_fraction: FloatValue) -> Self {
        Self {
            carbon,
            nutrient,
            lignin_fraction,
            flux: FlowSet::default(),
        }
    }

    pub fn total_c(&self) -> FloatValue {
        self.carbon.total_c
    }
}

/// Every pool of one network, indexed by [`PoolId`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolSet {
    pools: [Pool; PoolId::COUNT],
}

impl PoolSet {
    pub fn from_initial_state(initial: &InitialState) -> Self {
        let pools = std::array::from_fn(|i| {
            let init = initial.get(PoolId::ALL[i]);
            Pool::new(
                Carbon::new(init.carbon, init.isotope_ratio),
                init.nutrient,
                init.lignin_fraction,
            )
        });
        Self { pools }
    }

    pub fn iter(&self) -> impl Iterator<Item = (PoolId, &Pool)> {
        PoolId::ALL.iter().copied().zip(self.pools.iter())
    }

    /// Sum of carbon over every pool, leachate included.
    pub fn total_carbon(&self) -> FloatValue {
        self.pools.iter().map(|p| p.carbon.total_c).sum()
    }

    /// Sum of carbon over the pools that still decompose.
    pub fn organic_carbon(&self) -> FloatValue {
        self.iter()
            .filter(|(id, _)| !id.is_sink())
            .map(|(_, p)| p.carbon.total_c)
            .sum()
    }
}

impl Default for PoolSet {
    fn default() -> Self {
        Self::from_initial_state(&InitialState::default())
    }
}

impl Index<PoolId> for PoolSet {
    type Output = Pool;

    fn index(&self, id: PoolId) -> &Pool {
        &self.pools[id.index()]
    }
}

impl IndexMut<PoolId> for PoolSet {
    fn index_mut(&mut self, id: PoolId) -> &mut Pool {
        &mut self.pools[id.index()]
    }
}

/// The full state of one soil layer: its pools and its environment.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SoilState {
    pub pools: PoolSet,
    pub environment: Environment,
}

impl SoilState {
    pub fn new(pools: PoolSet, environment: Environment) -> Self {
        Self { pools, environment }
    }

    pub fn from_initial_state(initial: &InitialState) -> Self {
        Self::new(
            PoolSet::from_initial_state(initial),
            initial.environment.clone(),
        )
    }
}

//! Flow-restriction resolver
//!
//! Material entering a soil organic matter pool adopts the pool's required
//! stoichiometry rather than that of its sources. The required C:E ratio is
//! interpolated between the nutrient-poor and nutrient-rich bounds by the
//! ambient mineral level, once per step, and then shared by every inbound
//! flow of that pool.

use crate::parameters::{FlowRestriction, RatioBounds, RestrictionParameters};
use crate::pools::PoolId;
use somflux_core::element::{Element, PerElement};
use somflux_core::stoichiometry::Nutrient;
use somflux_core::FloatValue;

/// Required C:E ratio of material entering a pool.
///
/// - `ambient <= 0`: `max_ratio`
/// - `0 < ambient < min_mineral`: linear from `max_ratio` to `min_ratio`
/// - `ambient >= min_mineral`: `min_ratio`
///
/// The result always lies within `[min_ratio, max_ratio]`.
pub fn resolve_inflow_ratio(bounds: &RatioBounds, ambient: FloatValue) -> FloatValue {
    if ambient <= 0.0 {
        bounds.max_ratio
    } else if ambient < bounds.min_mineral {
        bounds.max_ratio + (bounds.min_ratio - bounds.max_ratio) * ambient / bounds.min_mineral
    } else {
        bounds.min_ratio
    }
}

/// Required ratios for every element, each resolved independently against
/// its own ambient level.
pub fn resolve_inflow_nutrient(restriction: &FlowRestriction, minerals: &PerElement) -> Nutrient {
    let mut nutrient = Nutrient::default();
    for element in Element::ALL {
        nutrient.set_ratio(
            element,
            resolve_inflow_ratio(restriction.bounds(element), minerals.get(element)),
        );
    }
    nutrient
}

/// Resolved inbound ratios for one step, indexed by receiving pool.
#[derive(Debug, Clone, PartialEq)]
pub struct InflowRatios {
    ratios: [Option<Nutrient>; PoolId::COUNT],
}

impl InflowRatios {
    pub fn resolve(params: &RestrictionParameters, minerals: &PerElement) -> Self {
        let ratios = std::array::from_fn(|i| {
            params
                .get(PoolId::ALL[i])
                .map(|restriction| resolve_inflow_nutrient(restriction, minerals))
        });
        Self { ratios }
    }

    /// Ratio required by `pool`, or `None` when inbound material keeps the
    /// ratios of its source.
    pub fn get(&self, pool: PoolId) -> Option<&Nutrient> {
        self.ratios[pool.index()].as_ref()
    }

    /// Ratio carried by a flow from a source with `source` ratios into `pool`.
    pub fn for_flow(&self, pool: PoolId, source: &Nutrient) -> Nutrient {
        self.get(pool).copied().unwrap_or(*source)
    }
}

use crate::pools::PoolId;
use serde::{Deserialize, Serialize};
use somflux_core::element::Element;
use somflux_core::errors::{SomError, SomResult};
use somflux_core::FloatValue;

/// Bounds on the C:E ratio of material entering a pool.
///
/// The required ratio moves from `max_ratio` (nutrient-poor, no mineral
/// available) to `min_ratio` (nutrient-rich) as the ambient mineral level
/// rises toward `min_mineral`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatioBounds {
    /// unit: g C / g E
    pub max_ratio: FloatValue,
    /// unit: g C / g E
    pub min_ratio: FloatValue,
    /// Mineral level at and above which `min_ratio` applies
    /// unit: g E / m^2
    pub min_mineral: FloatValue,
}

impl RatioBounds {
    pub fn new(max_ratio: FloatValue, min_ratio: FloatValue, min_mineral: FloatValue) -> Self {
        Self {
            max_ratio,
            min_ratio,
            min_mineral,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.min_ratio > 0.0 && self.max_ratio >= self.min_ratio && self.min_mineral >= 0.0
    }
}

/// Ratio bounds for every element of one receiving pool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlowRestriction {
    pub n: RatioBounds,
    pub p: RatioBounds,
    pub s: RatioBounds,
    pub k: RatioBounds,
}

impl FlowRestriction {
    pub fn bounds(&self, element: Element) -> &RatioBounds {
        match element {
            Element::N => &self.n,
            Element::P => &self.p,
            Element::S => &self.s,
            Element::K => &self.k,
        }
    }
}

/// Flow restriction of the pools whose inbound material is ratio-controlled.
///
/// Litter and wood pools receive material only from [`add_litter`] and keep
/// the ratios of that material; the leachate pool keeps the enriched ratios
/// computed by the leaching calculator.
///
/// [`add_litter`]: crate::litter::add_litter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestrictionParameters {
    pub active_surface: FlowRestriction,
    pub active_soil: FlowRestriction,
    pub slow_surface: FlowRestriction,
    pub slow_soil: FlowRestriction,
    pub passive: FlowRestriction,
}

impl Default for RestrictionParameters {
    fn default() -> Self {
        let som_p = RatioBounds::new(150.0, 30.0, 2.0);
        let som_s = RatioBounds::new(200.0, 50.0, 2.0);
        let som_k = RatioBounds::new(100.0, 20.0, 2.0);
        let slow_p = RatioBounds::new(400.0, 90.0, 2.0);
        let slow_s = RatioBounds::new(400.0, 50.0, 2.0);
        let slow_k = RatioBounds::new(200.0, 50.0, 2.0);
        Self {
            active_surface: FlowRestriction {
                n: RatioBounds::new(14.0, 3.0, 2.0),
                p: som_p,
                s: som_s,
                k: som_k,
            },
            active_soil: FlowRestriction {
                n: RatioBounds::new(18.0, 8.0, 2.0),
                p: som_p,
                s: som_s,
                k: som_k,
            },
            slow_surface: FlowRestriction {
                n: RatioBounds::new(30.0, 15.0, 2.0),
                p: slow_p,
                s: slow_s,
                k: slow_k,
            },
            slow_soil: FlowRestriction {
                n: RatioBounds::new(40.0, 12.0, 2.0),
                p: slow_p,
                s: slow_s,
                k: slow_k,
            },
            passive: FlowRestriction {
                n: RatioBounds::new(20.0, 6.0, 2.0),
                p: RatioBounds::new(200.0, 20.0, 2.0),
                s: RatioBounds::new(200.0, 20.0, 2.0),
                k: RatioBounds::new(100.0, 20.0, 2.0),
            },
        }
    }
}

impl RestrictionParameters {
    /// Restriction of `pool`, or `None` for pools without one.
    pub fn get(&self, pool: PoolId) -> Option<&FlowRestriction> {
        match pool {
            PoolId::ActiveSurface => Some(&self.active_surface),
            PoolId::ActiveSoil => Some(&self.active_soil),
            PoolId::SlowSurface => Some(&self.slow_surface),
            PoolId::SlowSoil => Some(&self.slow_soil),
            PoolId::Passive => Some(&self.passive),
            _ => None,
        }
    }

    pub fn validate(&self) -> SomResult<()> {
        for pool in PoolId::ALL {
            if let Some(restriction) = self.get(pool) {
                for element in Element::ALL {
                    if !restriction.bounds(element).is_valid() {
                        return Err(SomError::Configuration(format!(
                            "{}: invalid {} ratio bounds {:?}",
                            pool,
                            element,
                            restriction.bounds(element)
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

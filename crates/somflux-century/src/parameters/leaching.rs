use serde::{Deserialize, Serialize};
use somflux_core::element::{Element, PerElement};
use somflux_core::errors::{SomError, SomResult};
use somflux_core::FloatValue;

/// Parameters for leaching of dissolved organic matter from the soil
/// active pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeachingParameters {
    /// Leached fraction on a sand-free soil (`omlech(1)`)
    /// unit: fraction
    /// default: 0.03
    pub coef0: FloatValue,
    /// Increase of the leached fraction per unit sand (`omlech(2)`)
    /// unit: fraction
    /// default: 0.12
    pub coef1: FloatValue,
    /// Drainage at which leaching reaches its full intensity (`omlech(3)`)
    /// unit: cm
    /// default: 1.9
    pub threshold_flow: FloatValue,
    /// Multiplier on the source C:E ratios; below one the leachate is
    /// nutrient-enriched
    /// unit: dimensionless
    pub enrichment: PerElement,
}

impl Default for LeachingParameters {
    fn default() -> Self {
        Self {
            coef0: 0.03,
            coef1: 0.12,
            threshold_flow: 1.9,
            enrichment: PerElement::new(0.5, 0.5, 0.5, 0.8),
        }
    }
}

impl LeachingParameters {
    pub fn validate(&self) -> SomResult<()> {
        if self.threshold_flow <= 0.0 {
            return Err(SomError::Configuration(format!(
                "leaching threshold flow must be positive, got {}",
                self.threshold_flow
            )));
        }
        if self.coef0 < 0.0 || self.coef1 < 0.0 {
            return Err(SomError::Configuration(
                "leaching coefficients must be non-negative".to_string(),
            ));
        }
        for element in Element::ALL {
            let factor = self.enrichment.get(element);
            if !(factor > 0.0 && factor <= 1.0) {
                return Err(SomError::Configuration(format!(
                    "{} leaching enrichment must be within (0, 1], got {}",
                    element, factor
                )));
            }
        }
        Ok(())
    }
}

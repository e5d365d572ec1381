use serde::{Deserialize, Serialize};
use somflux_core::environment::Layer;
use somflux_core::errors::{SomError, SomResult};
use somflux_core::stoichiometry::Nutrient;
use somflux_core::FloatValue;

/// Immobilisation of mineral nutrient into fresh litter before it is
/// partitioned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbsorptionParameters {
    /// Fraction of the mineral pool available to surface litter (`damr(1)`)
    /// unit: fraction
    /// default: 0.0
    pub surface_fraction: FloatValue,
    /// Fraction of the mineral pool available to soil litter (`damr(2)`)
    /// unit: fraction
    /// default: 0.02
    pub soil_fraction: FloatValue,
    /// C:E ratio above which litter absorbs mineral nutrient (`damrmn`)
    /// unit: g C / g E
    pub threshold_ratio: Nutrient,
}

impl Default for AbsorptionParameters {
    fn default() -> Self {
        Self {
            surface_fraction: 0.0,
            soil_fraction: 0.02,
            threshold_ratio: Nutrient::new(15.0, 150.0, 150.0, 50.0),
        }
    }
}

impl AbsorptionParameters {
    pub fn fraction(&self, layer: Layer) -> FloatValue {
        match layer {
            Layer::Surface => self.surface_fraction,
            Layer::Soil => self.soil_fraction,
        }
    }
}

/// Parameters partitioning litter between the structural and metabolic pools.
///
/// The metabolic fraction falls with the lignin to nitrogen ratio of the
/// material:
///
/// $$f_{met} = a - b \cdot \frac{L}{N / B}$$
///
/// where $N / B$ is the nitrogen content per unit biomass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LitterParameters {
    /// Intercept of the metabolic fraction (`spl(1)`)
    /// unit: fraction
    /// default: 0.85
    pub metabolic_intercept: FloatValue,
    /// Slope of the metabolic fraction on lignin:N (`spl(2)`)
    /// unit: dimensionless
    /// default: 0.013
    pub metabolic_slope: FloatValue,
    /// Lower bound of the metabolic fraction
    /// unit: fraction
    /// default: 0.2
    pub min_metabolic: FloatValue,
    /// Carbon content of biomass
    /// unit: g C / g biomass
    /// default: 0.4
    pub biomass_carbon_fraction: FloatValue,
    /// Fixed C:E ratio of material entering the structural pools (`rcestr`)
    /// unit: g C / g E
    pub structural_ratio: Nutrient,
    pub absorption: AbsorptionParameters,
}

impl Default for LitterParameters {
    fn default() -> Self {
        Self {
            metabolic_intercept: 0.85,
            metabolic_slope: 0.013,
            min_metabolic: 0.2,
            biomass_carbon_fraction: 0.4,
            structural_ratio: Nutrient::new(150.0, 500.0, 500.0, 150.0),
            absorption: AbsorptionParameters::default(),
        }
    }
}

impl LitterParameters {
    pub fn validate(&self) -> SomResult<()> {
        let fractions = [
            ("min_metabolic", self.min_metabolic),
            ("biomass_carbon_fraction", self.biomass_carbon_fraction),
            ("absorption.surface_fraction", self.absorption.surface_fraction),
            ("absorption.soil_fraction", self.absorption.soil_fraction),
        ];
        for (name, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(SomError::Configuration(format!(
                    "litter {} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        if self.biomass_carbon_fraction == 0.0 {
            return Err(SomError::Configuration(
                "litter biomass_carbon_fraction must be positive".to_string(),
            ));
        }
        if !self.structural_ratio.is_valid() || !self.absorption.threshold_ratio.is_valid() {
            return Err(SomError::Configuration(
                "litter C:E ratios must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        LitterParameters::default().validate().unwrap();
    }

    #[test]
    fn test_absorption_fraction_by_layer() {
        let params = AbsorptionParameters::default();
        assert_eq!(params.fraction(Layer::Surface), 0.0);
        assert_eq!(params.fraction(Layer::Soil), 0.02);
    }

    #[test]
    fn test_partial_toml() {
        let params: LitterParameters = toml::from_str("metabolic_intercept = 0.8").unwrap();
        assert_eq!(params.metabolic_intercept, 0.8);
        assert_eq!(params.min_metabolic, 0.2);
    }
}

//! Per-layer environmental state shared by every pool of a network.
//!
//! The climate drivers are written by the caller between steps. Mineral
//! nutrient levels are written by the commit phase of the pool network and by
//! litter direct absorption. Decomposition only ever reads this record.

use crate::element::{Element, PerElement};
use crate::FloatValue;
use serde::{Deserialize, Serialize};

/// Which set of drivers a pool responds to.
///
/// Surface pools (aboveground litter, fine branches and large wood) respond to
/// the surface temperature and water content; belowground pools respond to the
/// soil values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layer {
    Surface,
    Soil,
}

/// Soil particle size fractions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoilTexture {
    /// unit: fraction
    pub sand: FloatValue,
    /// unit: fraction
    pub silt: FloatValue,
    /// unit: fraction
    pub clay: FloatValue,
}

impl SoilTexture {
    pub fn new(sand: FloatValue, silt: FloatValue, clay: FloatValue) -> Self {
        Self { sand, silt, clay }
    }

    /// True when every fraction is within [0, 1] and they sum to one.
    pub fn is_valid(&self) -> bool {
        let fractions = [self.sand, self.silt, self.clay];
        fractions.iter().all(|f| (0.0..=1.0).contains(f))
            && (fractions.iter().sum::<FloatValue>() - 1.0).abs() < 1e-6
    }
}

impl Default for SoilTexture {
    fn default() -> Self {
        // Loam
        Self::new(0.4, 0.4, 0.2)
    }
}

/// Environmental drivers and mineral nutrient levels for one soil layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Environment {
    /// Ambient mineral nutrient levels
    /// unit: g / m^2
    pub mineral: PerElement,
    /// Surface (litter layer) temperature
    /// unit: degC
    pub surface_temperature: FloatValue,
    /// Soil temperature
    /// unit: degC
    pub soil_temperature: FloatValue,
    /// Relative water content of the litter layer
    /// unit: fraction
    pub surface_water_content: FloatValue,
    /// Relative water content of the soil
    /// unit: fraction
    pub soil_water_content: FloatValue,
    /// Potential evapotranspiration for the step
    /// unit: cm
    pub potential_evapotranspiration: FloatValue,
    /// Water available in the profile for the step
    /// unit: cm
    pub available_water: FloatValue,
    /// Fraction of excess water lost to drainage
    /// unit: fraction
    pub drainage: FloatValue,
    /// Soil pH
    pub ph: FloatValue,
    /// Incoming radiation proxy at the soil surface
    /// unit: W / m^2
    pub radiation: FloatValue,
    pub texture: SoilTexture,
    /// Water leaving the layer by drainage
    /// unit: cm
    pub leached_water: FloatValue,
}

impl Environment {
    /// Temperature seen by pools in `layer`.
    pub fn temperature(&self, layer: Layer) -> FloatValue {
        match layer {
            Layer::Surface => self.surface_temperature,
            Layer::Soil => self.soil_temperature,
        }
    }

    /// Relative water content seen by pools in `layer`.
    pub fn water_content(&self, layer: Layer) -> FloatValue {
        match layer {
            Layer::Surface => self.surface_water_content,
            Layer::Soil => self.soil_water_content,
        }
    }

    pub fn mineral(&self, element: Element) -> FloatValue {
        self.mineral.get(element)
    }

    pub fn mineral_mut(&mut self, element: Element) -> &mut FloatValue {
        self.mineral.get_mut(element)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            mineral: PerElement::new(2.0, 0.5, 0.5, 5.0),
            surface_temperature: 15.0,
            soil_temperature: 12.0,
            surface_water_content: 0.5,
            soil_water_content: 0.6,
            potential_evapotranspiration: 0.3,
            available_water: 0.3,
            drainage: 0.5,
            ph: 6.5,
            radiation: 200.0,
            texture: SoilTexture::default(),
            leached_water: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_selects_drivers() {
        let env = Environment {
            surface_temperature: 20.0,
            soil_temperature: 10.0,
            surface_water_content: 0.2,
            soil_water_content: 0.8,
            ..Environment::default()
        };
        assert_eq!(env.temperature(Layer::Surface), 20.0);
        assert_eq!(env.temperature(Layer::Soil), 10.0);
        assert_eq!(env.water_content(Layer::Surface), 0.2);
        assert_eq!(env.water_content(Layer::Soil), 0.8);
    }

    #[test]
    fn test_texture_validity() {
        assert!(SoilTexture::default().is_valid());
        assert!(!SoilTexture::new(0.7, 0.4, 0.2).is_valid());
        assert!(!SoilTexture::new(-0.1, 0.9, 0.2).is_valid());
    }

    #[test]
    fn test_partial_environment_deserialises_with_defaults() {
        let env: Environment = serde_json::from_str(r#"{"ph": 5.2}"#).unwrap();
        assert_eq!(env.ph, 5.2);
        assert_eq!(env.texture, SoilTexture::default());
    }
}

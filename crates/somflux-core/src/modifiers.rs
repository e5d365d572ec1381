//! Environmental rate modifiers
//!
//! Dimensionless multipliers applied to the potential decomposition rate of a
//! pool. All functions here are pure and never fail: degenerate parameters
//! (zero-width segments, non-positive PET) fall back to a defined constant
//! instead of dividing by zero.
//!
//! The optional per-pool modifiers are expressed as [`RateModifier`] trait
//! objects so a pool's response chain can be assembled (and serialised) from
//! configuration.

use crate::environment::{Environment, Layer};
use crate::FloatValue;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt::Debug;

/// Lower bound of the normalised temperature response.
pub const MIN_TEMPERATURE_EFFECT: FloatValue = 0.01;

/// Arctangent temperature response.
///
/// $$f(T) = \frac{y + \frac{s}{\pi}\arctan(\pi k (T - x))}{y + \frac{s}{\pi}\arctan(\pi k (T_{ref} - x))}$$
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureCurve {
    /// Inflection point
    /// unit: degC
    pub x_location: FloatValue,
    pub y_location: FloatValue,
    pub step_size: FloatValue,
    pub slope: FloatValue,
    /// Temperature at which the response is normalised to one
    /// unit: degC
    pub reference_temperature: FloatValue,
}

impl Default for TemperatureCurve {
    fn default() -> Self {
        Self {
            x_location: 15.4,
            y_location: 11.75,
            step_size: 29.7,
            slope: 0.031,
            reference_temperature: 30.0,
        }
    }
}

impl TemperatureCurve {
    fn raw(&self, temperature: FloatValue) -> FloatValue {
        self.y_location
            + (self.step_size / PI) * (PI * self.slope * (temperature - self.x_location)).atan()
    }

    /// Normalised temperature effect, floored at [`MIN_TEMPERATURE_EFFECT`].
    pub fn effect(&self, temperature: FloatValue) -> FloatValue {
        let normaliser = self.raw(self.reference_temperature);
        if normaliser <= 0.0 {
            return MIN_TEMPERATURE_EFFECT;
        }
        (self.raw(temperature) / normaliser).max(MIN_TEMPERATURE_EFFECT)
    }
}

/// Logistic moisture response on relative water content.
///
/// $$g(w) = \frac{1}{1 + a e^{-b w}}$$
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoistureCurve {
    pub scale: FloatValue,
    pub steepness: FloatValue,
}

impl Default for MoistureCurve {
    fn default() -> Self {
        Self {
            scale: 30.0,
            steepness: 9.0,
        }
    }
}

impl MoistureCurve {
    pub fn effect(&self, relative_water_content: FloatValue) -> FloatValue {
        1.0 / (1.0 + self.scale * (-self.steepness * relative_water_content).exp())
    }
}

/// Combined temperature and moisture effect on decomposition.
///
/// # Arguments
///
/// * `temperature_curve` - Temperature response parameters
/// * `moisture_curve` - Moisture response parameters
/// * `relative_water_content` - Relative water content (fraction)
/// * `temperature` - Temperature (degC)
///
/// # Returns
///
/// Product of the two responses, within (0, ~1.3]
pub fn temperature_moisture_factor(
    temperature_curve: &TemperatureCurve,
    moisture_curve: &MoistureCurve,
    relative_water_content: FloatValue,
    temperature: FloatValue,
) -> FloatValue {
    temperature_curve.effect(temperature) * moisture_curve.effect(relative_water_content)
}

/// Arctangent pH response.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhCurve {
    pub x_location: FloatValue,
    pub y_location: FloatValue,
    pub step_size: FloatValue,
    pub slope: FloatValue,
}

impl Default for PhCurve {
    fn default() -> Self {
        Self {
            x_location: 4.0,
            y_location: 0.5,
            step_size: 1.1,
            slope: 0.7,
        }
    }
}

/// pH effect on decomposition, clamped to [0, 1].
///
/// $$f(pH) = y + \frac{s}{\pi}\arctan(\pi k (pH - x))$$
pub fn ph_factor(curve: &PhCurve, ph: FloatValue) -> FloatValue {
    let raw = curve.y_location
        + (curve.step_size / PI) * (PI * curve.slope * (ph - curve.x_location)).atan();
    raw.clamp(0.0, 1.0)
}

/// Parameters of the redox (waterlogging) response.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnaerobicCurve {
    /// Ratio of available water to PET above which decomposition slows
    pub threshold: FloatValue,
    /// Ratio at which the response reaches its floor
    pub saturation: FloatValue,
    /// Minimum multiplier under fully anaerobic conditions
    pub floor: FloatValue,
}

impl Default for AnaerobicCurve {
    fn default() -> Self {
        Self {
            threshold: 1.5,
            saturation: 3.0,
            floor: 0.3,
        }
    }
}

/// Anaerobic effect on decomposition.
///
/// Returns 1 while the ratio of available water to PET stays at or below the
/// threshold. Above it the undrained excess water lowers the multiplier
/// linearly toward `curve.floor`.
///
/// # Arguments
///
/// * `curve` - Anaerobic response parameters
/// * `potential_evapotranspiration` - PET (cm)
/// * `available_water` - Available water (cm)
/// * `drainage` - Fraction of excess water drained (0-1)
///
/// # Returns
///
/// Multiplier within [`curve.floor`, 1]
pub fn anaerobic_factor(
    curve: &AnaerobicCurve,
    potential_evapotranspiration: FloatValue,
    available_water: FloatValue,
    drainage: FloatValue,
) -> FloatValue {
    if potential_evapotranspiration <= 0.0 {
        return 1.0;
    }
    let ratio = available_water / potential_evapotranspiration;
    if ratio <= curve.threshold {
        return 1.0;
    }

    let excess = (ratio - curve.threshold) * potential_evapotranspiration * (1.0 - drainage);
    let mut factor = 1.0;
    if excess > 0.0 && curve.threshold != curve.saturation {
        let new_ratio = curve.threshold + excess / potential_evapotranspiration;
        let slope = (1.0 - curve.floor) / (curve.threshold - curve.saturation);
        factor = 1.0 + slope * (new_ratio - curve.threshold);
    }
    factor.clamp(curve.floor, 1.0)
}

/// Constant below `x1`, linear from `first` to `last` between `x1` and `x2`,
/// constant above `x2`.
fn two_segment(
    first: FloatValue,
    last: FloatValue,
    x1: FloatValue,
    x2: FloatValue,
    x: FloatValue,
) -> FloatValue {
    if x <= x1 {
        first
    } else if x >= x2 {
        last
    } else {
        first + (last - first) * (x - x1) / (x2 - x1)
    }
}

/// Radiation index that rises from `a` to `b` between `x1` and `x2`.
pub fn radiation_mix_index(
    a: FloatValue,
    b: FloatValue,
    x1: FloatValue,
    x2: FloatValue,
    radiation: FloatValue,
) -> FloatValue {
    two_segment(a, b, x1, x2, radiation)
}

/// Radiation index that falls from `b` to `a` between `x1` and `x2`.
pub fn radiation_decomp_index(
    a: FloatValue,
    b: FloatValue,
    x1: FloatValue,
    x2: FloatValue,
    radiation: FloatValue,
) -> FloatValue {
    two_segment(b, a, x1, x2, radiation)
}

/// Bounds and breakpoints of a radiation index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadiationIndex {
    pub low: FloatValue,
    pub high: FloatValue,
    /// unit: W / m^2
    pub x1: FloatValue,
    /// unit: W / m^2
    pub x2: FloatValue,
}

impl RadiationIndex {
    pub fn rising(&self, radiation: FloatValue) -> FloatValue {
        radiation_mix_index(self.low, self.high, self.x1, self.x2, radiation)
    }

    pub fn falling(&self, radiation: FloatValue) -> FloatValue {
        radiation_decomp_index(self.low, self.high, self.x1, self.x2, radiation)
    }
}

/// Inputs available to a rate modifier.
#[derive(Debug, Clone, Copy)]
pub struct ModifierContext<'a> {
    pub environment: &'a Environment,
    pub layer: Layer,
    /// Lignin fraction of the decomposing pool
    pub lignin_fraction: FloatValue,
}

/// A multiplicative effect on a pool's decomposition rate.
#[typetag::serde]
pub trait RateModifier: Debug + Send + Sync {
    fn factor(&self, context: &ModifierContext) -> FloatValue;
}

/// Soil pH effect.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhResponse {
    pub curve: PhCurve,
}

#[typetag::serde]
impl RateModifier for PhResponse {
    fn factor(&self, context: &ModifierContext) -> FloatValue {
        ph_factor(&self.curve, context.environment.ph)
    }
}

/// Waterlogging effect.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnaerobicResponse {
    pub curve: AnaerobicCurve,
}

#[typetag::serde]
impl RateModifier for AnaerobicResponse {
    fn factor(&self, context: &ModifierContext) -> FloatValue {
        let env = context.environment;
        anaerobic_factor(
            &self.curve,
            env.potential_evapotranspiration,
            env.available_water,
            env.drainage,
        )
    }
}

/// Slowdown of lignified material, $e^{-p \cdot lignin}$.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LigninResponse {
    pub pligst: FloatValue,
}

#[typetag::serde]
impl RateModifier for LigninResponse {
    fn factor(&self, context: &ModifierContext) -> FloatValue {
        (-self.pligst * context.lignin_fraction).exp()
    }
}

/// Linear texture effect, `intercept + sand_slope * sand`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextureResponse {
    pub intercept: FloatValue,
    pub sand_slope: FloatValue,
}

#[typetag::serde]
impl RateModifier for TextureResponse {
    fn factor(&self, context: &ModifierContext) -> FloatValue {
        (self.intercept + self.sand_slope * context.environment.texture.sand).max(0.0)
    }
}

/// Radiation effect on surface decomposition (falls with radiation).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RadiationResponse {
    pub index: RadiationIndex,
}

#[typetag::serde]
impl RateModifier for RadiationResponse {
    fn factor(&self, context: &ModifierContext) -> FloatValue {
        self.index.falling(context.environment.radiation)
    }
}

/// Constant multiplier, e.g. a cultivation or management effect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CultivationResponse {
    pub factor: FloatValue,
}

#[typetag::serde]
impl RateModifier for CultivationResponse {
    fn factor(&self, _context: &ModifierContext) -> FloatValue {
        self.factor.max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use is_close::is_close;
    use std::sync::Arc;

    // ===== Temperature and Moisture =====

    #[test]
    fn test_temperature_effect_normalised_at_reference() {
        let curve = TemperatureCurve::default();
        assert!(is_close!(curve.effect(30.0), 1.0));
    }

    #[test]
    fn test_temperature_effect_bounds() {
        let curve = TemperatureCurve::default();
        for t in [-60.0, -20.0, 0.0, 10.0, 25.0, 45.0, 80.0] {
            let e = curve.effect(t);
            assert!(e >= MIN_TEMPERATURE_EFFECT, "effect at {} was {}", t, e);
            assert!(e <= 1.3, "effect at {} was {}", t, e);
        }
        assert_eq!(curve.effect(-200.0), MIN_TEMPERATURE_EFFECT);
    }

    #[test]
    fn test_temperature_effect_increasing() {
        let curve = TemperatureCurve::default();
        assert!(curve.effect(5.0) < curve.effect(15.0));
        assert!(curve.effect(15.0) < curve.effect(25.0));
    }

    #[test]
    fn test_moisture_effect() {
        let curve = MoistureCurve::default();
        assert!(is_close!(curve.effect(0.0), 1.0 / 31.0));
        assert!(curve.effect(1.0) > 0.99);
        assert!(curve.effect(0.3) < curve.effect(0.6));
    }

    #[test]
    fn test_temperature_moisture_product() {
        let t = TemperatureCurve::default();
        let m = MoistureCurve::default();
        let f = temperature_moisture_factor(&t, &m, 0.5, 20.0);
        assert!(is_close!(f, t.effect(20.0) * m.effect(0.5)));
        assert!(f > 0.0 && f <= 1.3);
    }

    // ===== pH =====

    #[test]
    fn test_ph_factor() {
        let curve = PhCurve::default();
        assert!(is_close!(ph_factor(&curve, 4.0), 0.5));
        assert!(ph_factor(&curve, 7.0) > 0.95);
        assert!(ph_factor(&curve, 3.0) < 0.5);
        assert_eq!(ph_factor(&curve, 14.0), 1.0);
        assert!(ph_factor(&curve, 0.0) >= 0.0);
    }

    // ===== Anaerobic =====

    #[test]
    fn test_anaerobic_dry_is_one() {
        let curve = AnaerobicCurve::default();
        assert_eq!(anaerobic_factor(&curve, 0.5, 0.5, 0.0), 1.0);
        assert_eq!(anaerobic_factor(&curve, 0.0, 2.0, 0.0), 1.0);
    }

    #[test]
    fn test_anaerobic_wet_decreases() {
        let curve = AnaerobicCurve::default();
        // ratio 2.25, undrained: new ratio 2.25, slope -0.4667
        let f = anaerobic_factor(&curve, 0.4, 0.9, 0.0);
        assert!(is_close!(f, 1.0 - 0.7 / 1.5 * 0.75));
        // drainage removes part of the excess
        let drained = anaerobic_factor(&curve, 0.4, 0.9, 0.5);
        assert!(drained > f);
        // fully drained soils stay aerobic
        assert_eq!(anaerobic_factor(&curve, 0.4, 0.9, 1.0), 1.0);
    }

    #[test]
    fn test_anaerobic_floor() {
        let curve = AnaerobicCurve::default();
        let f = anaerobic_factor(&curve, 0.1, 100.0, 0.0);
        assert_eq!(f, curve.floor);
    }

    // ===== Radiation =====

    #[test]
    fn test_radiation_indices() {
        let (a, b, x1, x2) = (0.5, 1.0, 100.0, 300.0);
        assert_eq!(radiation_mix_index(a, b, x1, x2, 50.0), 0.5);
        assert_eq!(radiation_mix_index(a, b, x1, x2, 400.0), 1.0);
        assert!(is_close!(radiation_mix_index(a, b, x1, x2, 200.0), 0.75));

        assert_eq!(radiation_decomp_index(a, b, x1, x2, 50.0), 1.0);
        assert_eq!(radiation_decomp_index(a, b, x1, x2, 400.0), 0.5);
        assert!(is_close!(radiation_decomp_index(a, b, x1, x2, 150.0), 0.875));
    }

    #[test]
    fn test_radiation_degenerate_segment() {
        assert_eq!(radiation_mix_index(0.2, 0.9, 100.0, 100.0, 99.0), 0.2);
        assert_eq!(radiation_mix_index(0.2, 0.9, 100.0, 100.0, 101.0), 0.9);
        assert!(radiation_mix_index(0.2, 0.9, 100.0, 100.0, 100.0).is_finite());
    }

    // ===== Modifier chain =====

    #[test]
    fn test_lignin_response() {
        let env = Environment::default();
        let ctx = ModifierContext {
            environment: &env,
            layer: Layer::Surface,
            lignin_fraction: 0.2,
        };
        let m = LigninResponse { pligst: 3.0 };
        assert!(is_close!(m.factor(&ctx), (-0.6_f64).exp()));
    }

    #[test]
    fn test_modifier_chain_serialization() {
        let chain: Vec<Arc<dyn RateModifier>> = vec![
            Arc::new(PhResponse::default()),
            Arc::new(LigninResponse { pligst: 3.0 }),
            Arc::new(TextureResponse {
                intercept: 0.25,
                sand_slope: 0.75,
            }),
        ];
        let json = serde_json::to_string(&chain).expect("Serialization failed");
        let parsed: Vec<Arc<dyn RateModifier>> =
            serde_json::from_str(&json).expect("Deserialization failed");

        let env = Environment::default();
        let ctx = ModifierContext {
            environment: &env,
            layer: Layer::Soil,
            lignin_fraction: 0.1,
        };
        for (a, b) in chain.iter().zip(parsed.iter()) {
            assert!(is_close!(a.factor(&ctx), b.factor(&ctx)));
        }
    }
}

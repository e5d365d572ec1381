//! Leaching calculator
//!
//! Dissolved organic matter leaves the soil active pool with drainage water.
//! Sandier soils and wetter steps leach more; the leachate is
//! nutrient-enriched relative to its source.

use crate::flows::Flow;
use crate::parameters::LeachingParameters;
use somflux_core::element::Element;
use somflux_core::errors::{SomError, SomResult};
use somflux_core::stoichiometry::{Carbon, Nutrient};
use somflux_core::FloatValue;

/// Leached part of a carbon flow.
///
/// $$C_{leach} = C \cdot (c_0 + c_1 \cdot sand) \cdot \min(1, W / W_{th})$$
///
/// # Arguments
///
/// * `total_c` - Carbon flow subject to leaching (g C / m^2)
/// * `source` - C:E ratios of the source material
/// * `isotope_ratio` - Isotope ratio of the source material
/// * `leached_water` - Drainage out of the layer this step (cm)
/// * `sand` - Sand fraction of the soil
/// * `params` - Leaching parameters
///
/// # Errors
///
/// [`SomError::DivideByZero`] when `params.threshold_flow <= 0`.
pub fn compute_leach_flow(
    total_c: FloatValue,
    source: &Nutrient,
    isotope_ratio: FloatValue,
    leached_water: FloatValue,
    sand: FloatValue,
    params: &LeachingParameters,
) -> SomResult<Flow> {
    if params.threshold_flow <= 0.0 {
        return Err(SomError::DivideByZero("compute_leach_flow"));
    }

    let mut nutrient = *source;
    for element in Element::ALL {
        nutrient.set_ratio(
            element,
            source.ratio(element) * params.enrichment.get(element),
        );
    }

    if total_c <= 0.0 || leached_water <= 0.0 {
        return Ok(Flow::new(Carbon::new(0.0, isotope_ratio), nutrient));
    }

    let fraction = (params.coef0 + params.coef1 * sand).max(0.0);
    let intensity = (leached_water / params.threshold_flow).min(1.0);
    let leached = (total_c * fraction * intensity).min(total_c);

    Ok(Flow::new(Carbon::new(leached, isotope_ratio), nutrient))
}

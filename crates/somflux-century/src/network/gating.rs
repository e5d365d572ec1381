//! Nutrient gating of decomposition.
//!
//! A pool may decompose when enough mineral nutrient is around to cover any
//! immobilisation, or when its own material is already rich enough to meet
//! the ratio required downstream. Only nitrogen gating is implemented; asking
//! for any other element is an error rather than a silent pass.

use crate::decomposition::PoolDecomposer;
use crate::pools::Pool;
use crate::restriction::InflowRatios;
use somflux_core::element::Element;
use somflux_core::environment::Environment;
use somflux_core::errors::{SomError, SomResult};
use somflux_core::stoichiometry::Nutrient;
use somflux_core::FloatValue;

/// Mineral level below which the soil counts as exhausted.
/// unit: g E / m^2
pub const MINERAL_THRESHOLD: FloatValue = 1e-7;

/// Checks that `element` can gate decomposition.
pub fn validate_gating(element: Element) -> SomResult<()> {
    match element {
        Element::N => Ok(()),
        other => Err(SomError::UnsupportedGatingNutrient(other)),
    }
}

/// Whether material with `source` ratios may decompose into a flow
/// requiring `target` ratios.
pub fn should_decompose(
    source: &Nutrient,
    target: &Nutrient,
    environment: &Environment,
    element: Element,
) -> SomResult<bool> {
    validate_gating(element)?;
    Ok(environment.mineral(element) > MINERAL_THRESHOLD
        || source.ratio(element) <= target.ratio(element))
}

/// Gate of one pool: open only when every gated destination clears.
pub fn gate(
    pool: &Pool,
    decomposer: &PoolDecomposer,
    ratios: &InflowRatios,
    environment: &Environment,
    element: Element,
) -> SomResult<bool> {
    validate_gating(element)?;
    for target in decomposer.gated_destinations() {
        let required = ratios.for_flow(target, &pool.nutrient);
        if !should_decompose(&pool.nutrient, &required, environment, element)? {
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use somflux_core::element::PerElement;

    fn env_with_n(n: FloatValue) -> Environment {
        Environment {
            mineral: PerElement::new(n, 1.0, 1.0, 1.0),
            ..Environment::default()
        }
    }

    #[test]
    fn test_mineral_available() {
        let source = Nutrient::uniform(40.0);
        let target = Nutrient::uniform(10.0);
        assert!(should_decompose(&source, &target, &env_with_n(0.01), Element::N).unwrap());
    }

    #[test]
    fn test_exhausted_mineral_blocks_immobilisation() {
        let source = Nutrient::uniform(40.0);
        let target = Nutrient::uniform(10.0);
        assert!(!should_decompose(&source, &target, &env_with_n(0.0), Element::N).unwrap());
        assert!(!should_decompose(&source, &target, &env_with_n(1e-8), Element::N).unwrap());
    }

    #[test]
    fn test_rich_source_decomposes_without_mineral() {
        let source = Nutrient::uniform(8.0);
        let target = Nutrient::uniform(10.0);
        assert!(should_decompose(&source, &target, &env_with_n(0.0), Element::N).unwrap());
        // equal ratios need no immobilisation
        assert!(should_decompose(&target, &target, &env_with_n(0.0), Element::N).unwrap());
    }

    #[test]
    fn test_other_elements_fail_loudly() {
        let n = Nutrient::default();
        for element in [Element::P, Element::S, Element::K] {
            assert_eq!(
                should_decompose(&n, &n, &Environment::default(), element),
                Err(SomError::UnsupportedGatingNutrient(element))
            );
        }
    }
}

//! Litter-input interface
//!
//! Converts dead plant material into additions to the litter pools. Fresh
//! material first absorbs mineral nutrient directly when it is poorer than
//! the absorption threshold. Leaf and root litter is then split between the
//! structural and metabolic pools by its lignin to nitrogen ratio; woody
//! material goes whole to its wood pool.

use crate::parameters::LitterParameters;
use crate::pools::{Pool, PoolId, SoilState};
use serde::{Deserialize, Serialize};
use somflux_core::element::{Element, PerElement};
use somflux_core::environment::Layer;
use somflux_core::errors::{SomError, SomResult};
use somflux_core::stoichiometry::{
    carbon_weighted_average, merge_nutrient, update_carbon_record, Carbon, Nutrient,
};
use somflux_core::FloatValue;

/// Where litter enters the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LitterDestination {
    /// Aboveground litter (structural/metabolic surface pools)
    Surface,
    /// Belowground litter (structural/metabolic soil pools)
    Soil,
    /// One of the wood pools
    Wood(PoolId),
}

impl LitterDestination {
    fn layer(&self) -> Layer {
        match self {
            LitterDestination::Surface => Layer::Surface,
            LitterDestination::Soil => Layer::Soil,
            LitterDestination::Wood(pool) => pool.layer(),
        }
    }
}

/// Dead plant material handed over by the plant model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LitterInput {
    /// Carbon in the dying material
    /// unit: g C / m^2
    pub carbon: FloatValue,
    /// Fraction of `carbon` that falls this step
    /// unit: fraction
    pub fall_rate: FloatValue,
    /// unit: fraction
    pub lignin_fraction: FloatValue,
    pub nutrient: Nutrient,
    pub isotope_ratio: FloatValue,
    pub destination: LitterDestination,
}

impl LitterInput {
    fn validate(&self) -> SomResult<()> {
        if !(0.0..=1.0).contains(&self.fall_rate) {
            return Err(SomError::Configuration(format!(
                "litter fall rate must be within [0, 1], got {}",
                self.fall_rate
            )));
        }
        if !(0.0..=1.0).contains(&self.lignin_fraction) {
            return Err(SomError::Configuration(format!(
                "litter lignin fraction must be within [0, 1], got {}",
                self.lignin_fraction
            )));
        }
        if !self.nutrient.is_valid() {
            return Err(SomError::Configuration(
                "litter C:E ratios must be positive".to_string(),
            ));
        }
        if let LitterDestination::Wood(pool) = self.destination {
            if !pool.is_wood() {
                return Err(SomError::Configuration(format!(
                    "{} is not a wood pool",
                    pool
                )));
            }
        }
        Ok(())
    }
}

/// What one call to [`add_litter`] did.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LitterReport {
    /// unit: g C / m^2
    pub carbon_added: FloatValue,
    /// unit: g C / m^2
    pub structural_carbon: FloatValue,
    /// unit: g C / m^2
    pub metabolic_carbon: FloatValue,
    /// unit: fraction
    pub metabolic_fraction: FloatValue,
    /// Mineral nutrient taken up by the fresh material
    /// unit: g E / m^2
    pub absorbed: PerElement,
}

/// Add falling litter to the pools of `state`.
///
/// # Errors
///
/// [`SomError::Configuration`] for an invalid input.
pub fn add_litter(
    state: &mut SoilState,
    params: &LitterParameters,
    input: &LitterInput,
) -> SomResult<LitterReport> {
    input.validate()?;

    let carbon = input.carbon * input.fall_rate;
    if carbon <= 0.0 {
        return Ok(LitterReport::default());
    }

    let mut report = LitterReport {
        carbon_added: carbon,
        ..LitterReport::default()
    };

    // Element content after direct absorption
    let absorption_fraction = params.absorption.fraction(input.destination.layer());
    let mut element = PerElement::default();
    for e in Element::ALL {
        let mut content = input.nutrient.element_mass(e, carbon);
        let threshold = params.absorption.threshold_ratio.ratio(e);
        if input.nutrient.ratio(e) > threshold {
            let needed = carbon / threshold - content;
            let mineral = state.environment.mineral_mut(e);
            let absorbed = (absorption_fraction * mineral.max(0.0)).min(needed).max(0.0);
            *mineral -= absorbed;
            content += absorbed;
            *report.absorbed.get_mut(e) = absorbed;
        }
        *element.get_mut(e) = content;
    }
    let absorbed_nutrient = ratios_of(carbon, &element);

    let carbon_record = Carbon::new(carbon, input.isotope_ratio);
    let (structural, metabolic) = match input.destination {
        LitterDestination::Wood(pool) => {
            merge_into(
                &mut state.pools[pool],
                &carbon_record,
                &absorbed_nutrient,
                input.lignin_fraction,
            )?;
            report.structural_carbon = carbon;
            log::trace!("Added {:.6} g C of litter to {}", carbon, pool);
            return Ok(report);
        }
        LitterDestination::Surface => (PoolId::StructuralSurface, PoolId::MetabolicSurface),
        LitterDestination::Soil => (PoolId::StructuralSoil, PoolId::MetabolicSoil),
    };

    let frmet = metabolic_fraction(params, input.lignin_fraction, &absorbed_nutrient);
    let structural_c = carbon * (1.0 - frmet);
    let metabolic_c = carbon * frmet;

    let (structural_element, metabolic_element) =
        split_elements(params, &element, structural_c, metabolic_c);

    if structural_c > 0.0 {
        let lignin = (input.lignin_fraction / (1.0 - frmet)).min(1.0);
        merge_into(
            &mut state.pools[structural],
            &Carbon::new(structural_c, input.isotope_ratio),
            &ratios_of(structural_c, &structural_element),
            lignin,
        )?;
    }
    if metabolic_c > 0.0 {
        merge_into(
            &mut state.pools[metabolic],
            &Carbon::new(metabolic_c, input.isotope_ratio),
            &ratios_of(metabolic_c, &metabolic_element),
            0.0,
        )?;
    }

    report.structural_carbon = structural_c;
    report.metabolic_carbon = metabolic_c;
    report.metabolic_fraction = frmet;
    log::trace!(
        "Added {:.6} g C of litter: {:.6} structural, {:.6} metabolic",
        carbon,
        structural_c,
        metabolic_c
    );
    Ok(report)
}

/// Fraction of fresh litter entering the metabolic pool.
///
/// Bounded below by `min_metabolic` and above by `1 - lignin`, so the
/// structural part can always hold the lignin.
pub fn metabolic_fraction(
    params: &LitterParameters,
    lignin_fraction: FloatValue,
    nutrient: &Nutrient,
) -> FloatValue {
    let n_per_biomass = params.biomass_carbon_fraction / nutrient.c_to_n;
    let frmet = if n_per_biomass > 0.0 {
        params.metabolic_intercept - params.metabolic_slope * lignin_fraction / n_per_biomass
    } else {
        params.min_metabolic
    };
    frmet
        .max(params.min_metabolic)
        .min(1.0 - lignin_fraction)
        .max(0.0)
}

/// Divide the element content of fresh litter between its structural and
/// metabolic parts.
///
/// The structural part takes `structural_ratio` and the metabolic part the
/// rest. When the litter cannot supply both that and a non-zero metabolic
/// share, the element is split in proportion to carbon so both parts carry
/// the bulk ratio.
fn split_elements(
    params: &LitterParameters,
    element: &PerElement,
    structural_c: FloatValue,
    metabolic_c: FloatValue,
) -> (PerElement, PerElement) {
    let carbon = structural_c + metabolic_c;
    let mut structural = PerElement::default();
    let mut metabolic = PerElement::default();
    for e in Element::ALL {
        let available = element.get(e);
        let demand = params.structural_ratio.element_mass(e, structural_c);
        let to_structural = if metabolic_c > 0.0 && available > demand {
            demand
        } else {
            available * structural_c / carbon
        };
        *structural.get_mut(e) = to_structural;
        *metabolic.get_mut(e) = available - to_structural;
    }
    (structural, metabolic)
}

/// C:E ratios of `carbon` holding `element`.
///
/// Every element content must be positive.
fn ratios_of(carbon: FloatValue, element: &PerElement) -> Nutrient {
    let mut nutrient = Nutrient::default();
    for e in Element::ALL {
        nutrient.set_ratio(e, carbon / element.get(e));
    }
    nutrient
}

fn merge_into(
    pool: &mut Pool,
    carbon: &Carbon,
    nutrient: &Nutrient,
    lignin_fraction: FloatValue,
) -> SomResult<()> {
    let before = pool.carbon.total_c.max(0.0);
    merge_nutrient(before, &mut pool.nutrient, carbon.total_c, nutrient)?;
    pool.lignin_fraction =
        carbon_weighted_average(before, pool.lignin_fraction, carbon.total_c, lignin_fraction)?;
    update_carbon_record(&mut pool.carbon, before, carbon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::InitialState;
    use approx::assert_relative_eq;

    fn state() -> SoilState {
        SoilState::from_initial_state(&InitialState::default())
    }

    fn leaf_litter(destination: LitterDestination) -> LitterInput {
        LitterInput {
            carbon: 40.0,
            fall_rate: 0.5,
            lignin_fraction: 0.2,
            nutrient: Nutrient::new(50.0, 400.0, 400.0, 100.0),
            isotope_ratio: 0.02,
            destination,
        }
    }

    #[test]
    fn test_metabolic_fraction() {
        let params = LitterParameters::default();
        // 0.85 - 0.013 * 0.2 / (0.4 / 50)
        let frmet = metabolic_fraction(&params, 0.2, &Nutrient::uniform(50.0));
        assert_relative_eq!(frmet, 0.525, epsilon = 1e-12);
        // very poor material bottoms out
        assert_eq!(
            metabolic_fraction(&params, 0.3, &Nutrient::uniform(500.0)),
            0.2
        );
        // the structural part always holds the lignin
        assert_eq!(
            metabolic_fraction(&params, 0.9, &Nutrient::uniform(10.0)),
            1.0 - 0.9
        );
    }

    #[test]
    fn test_surface_litter_conserves_carbon() {
        let mut state = state();
        let params = LitterParameters::default();
        let before = state.pools.total_carbon();
        let report = add_litter(&mut state, &params, &leaf_litter(LitterDestination::Surface))
            .unwrap();

        assert_relative_eq!(report.carbon_added, 20.0);
        assert_relative_eq!(
            report.structural_carbon + report.metabolic_carbon,
            report.carbon_added,
            epsilon = 1e-12
        );
        assert_relative_eq!(state.pools.total_carbon(), before + 20.0, epsilon = 1e-9);
        assert_relative_eq!(
            state.pools[PoolId::MetabolicSurface].total_c(),
            20.0 + report.metabolic_carbon,
            epsilon = 1e-12
        );
        // no absorption at the surface by default
        assert_eq!(report.absorbed, PerElement::default());
    }

    #[test]
    fn test_soil_litter_absorbs_mineral_nitrogen() {
        let mut state = state();
        let params = LitterParameters::default();
        let mineral_before = state.environment.mineral.n;
        let report =
            add_litter(&mut state, &params, &leaf_litter(LitterDestination::Soil)).unwrap();

        // needed: 20/15 - 20/50, available: 0.02 * 2.0
        assert_relative_eq!(report.absorbed.n, 0.04, epsilon = 1e-12);
        assert_relative_eq!(
            state.environment.mineral.n,
            mineral_before - 0.04,
            epsilon = 1e-12
        );
        // P is poorer than its threshold too
        assert!(report.absorbed.p > 0.0);
    }

    #[test]
    fn test_structural_part_takes_fixed_ratio() {
        let mut state = state();
        let params = LitterParameters::default();
        add_litter(&mut state, &params, &leaf_litter(LitterDestination::Soil)).unwrap();

        // structural material enters at 150 into a pool already at 150
        assert_relative_eq!(
            state.pools[PoolId::StructuralSoil].nutrient.c_to_n,
            150.0,
            epsilon = 1e-9
        );
        // the remaining nitrogen makes the metabolic part richer than the
        // litter as a whole
        let metabolic = state.pools[PoolId::MetabolicSoil].nutrient.c_to_n;
        assert!(metabolic > 25.0 && metabolic < 50.0, "C:N was {}", metabolic);
    }

    /// Pool element mass plus mineral level.
    fn element_total(state: &SoilState, element: Element) -> f64 {
        state
            .pools
            .iter()
            .map(|(_, pool)| pool.nutrient.element_mass(element, pool.total_c()))
            .sum::<f64>()
            + state.environment.mineral(element)
    }

    #[test]
    fn test_poor_litter_keeps_bulk_ratio() {
        let mut state = SoilState::from_initial_state(&InitialState::empty());
        let input = LitterInput {
            carbon: 20.0,
            fall_rate: 1.0,
            lignin_fraction: 0.2,
            nutrient: Nutrient::new(200.0, 400.0, 400.0, 100.0),
            isotope_ratio: 0.0,
            destination: LitterDestination::Surface,
        };
        add_litter(&mut state, &LitterParameters::default(), &input).unwrap();

        // C:N 200 cannot supply the structural demand at 150
        for pool in [PoolId::StructuralSurface, PoolId::MetabolicSurface] {
            assert_relative_eq!(
                state.pools[pool].nutrient.c_to_n,
                200.0,
                max_relative = 1e-12
            );
        }
        // P is plentiful, so structural material takes its fixed ratio
        assert_relative_eq!(
            state.pools[PoolId::StructuralSurface].nutrient.c_to_p,
            500.0,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_litter_conserves_element_mass() {
        let params = LitterParameters::default();
        for c_to_n in [20.0, 50.0, 150.0, 200.0, 600.0] {
            for destination in [LitterDestination::Surface, LitterDestination::Soil] {
                let mut state = SoilState::from_initial_state(&InitialState::empty());
                let before: Vec<f64> =
                    Element::ALL.iter().map(|e| element_total(&state, *e)).collect();
                let input = LitterInput {
                    carbon: 20.0,
                    fall_rate: 1.0,
                    lignin_fraction: 0.15,
                    nutrient: Nutrient::new(c_to_n, 700.0, 300.0, 100.0),
                    isotope_ratio: 0.0,
                    destination,
                };
                add_litter(&mut state, &params, &input).unwrap();

                for (i, e) in Element::ALL.iter().enumerate() {
                    let added = input.nutrient.element_mass(*e, input.carbon);
                    assert_relative_eq!(
                        element_total(&state, *e),
                        before[i] + added,
                        max_relative = 1e-12
                    );
                }
            }
        }
    }

    #[test]
    fn test_wood_input() {
        let mut state = state();
        let params = LitterParameters::default();
        let before = state.pools[PoolId::LargeWood].clone();
        let input = LitterInput {
            lignin_fraction: 0.35,
            ..leaf_litter(LitterDestination::Wood(PoolId::LargeWood))
        };
        let report = add_litter(&mut state, &params, &input).unwrap();
        let wood = &state.pools[PoolId::LargeWood];
        assert_relative_eq!(wood.total_c(), before.total_c() + 20.0);
        assert_relative_eq!(
            wood.lignin_fraction,
            (before.total_c() * before.lignin_fraction + 20.0 * 0.35) / wood.total_c(),
            epsilon = 1e-12
        );
        assert_eq!(report.metabolic_carbon, 0.0);
    }

    #[test]
    fn test_invalid_inputs() {
        let mut state = state();
        let params = LitterParameters::default();
        let not_wood = leaf_litter(LitterDestination::Wood(PoolId::Passive));
        assert!(add_litter(&mut state, &params, &not_wood).is_err());

        let too_fast = LitterInput {
            fall_rate: 1.5,
            ..leaf_litter(LitterDestination::Surface)
        };
        assert!(add_litter(&mut state, &params, &too_fast).is_err());
    }

    #[test]
    fn test_nothing_falls() {
        let mut state = state();
        let before = state.clone();
        let input = LitterInput {
            fall_rate: 0.0,
            ..leaf_litter(LitterDestination::Surface)
        };
        let report = add_litter(&mut state, &LitterParameters::default(), &input).unwrap();
        assert_eq!(report, LitterReport::default());
        assert_eq!(state, before);
    }
}

//! Commit of one pool's flows into the state.

use crate::flows::FlowSet;
use crate::pools::{PoolId, SoilState};
use somflux_core::element::{Element, PerElement};
use somflux_core::errors::SomResult;
use somflux_core::stoichiometry::{merge_nutrient, update_carbon_record};
use somflux_core::FloatValue;

/// Smallest carbon a pool is left with after being driven negative.
/// unit: g C / m^2
pub const CARBON_FLOOR: FloatValue = 1e-6;

/// Apply `flux` from `source` to `state`.
///
/// Receiving pools merge nutrient ratios before carbon, both against their
/// pre-transfer mass. The ambient mineral level of each element changes by
/// the element released from the source minus the element carried by the
/// transfers; that net release is added to `mineralization`.
pub(crate) fn commit_pool(
    state: &mut SoilState,
    source: PoolId,
    flux: &FlowSet,
    mineralization: &mut PerElement,
) -> SomResult<()> {
    let source_ratio = state.pools[source].nutrient;
    let released = -flux.outflow;

    state.pools[source].carbon.total_c -= released;

    let mut delta = PerElement::default();
    for element in Element::ALL {
        *delta.get_mut(element) = -source_ratio.element_mass(element, released);
    }

    for (target, flow) in flux.transfers() {
        let receiver = &mut state.pools[target];
        let before = receiver.carbon.total_c;
        merge_nutrient(
            before,
            &mut receiver.nutrient,
            flow.carbon.total_c,
            &flow.nutrient,
        )?;
        update_carbon_record(&mut receiver.carbon, before, &flow.carbon)?;

        for element in Element::ALL {
            *delta.get_mut(element) += flow.nutrient.element_mass(element, flow.carbon.total_c);
        }
    }

    for element in Element::ALL {
        let change = delta.get(element);
        *mineralization.get_mut(element) -= change;

        let mineral = state.environment.mineral_mut(element);
        *mineral -= change;
        if *mineral < 0.0 {
            log::warn!(
                "mineral {} fell to {:.3e} after committing {}; clamping to zero",
                element,
                *mineral,
                source
            );
            *mineral = 0.0;
        }
    }

    let pool = &mut state.pools[source];
    if pool.carbon.total_c < 0.0 {
        log::warn!(
            "{} carbon fell to {:.3e}; clamping to {:e}",
            source,
            pool.carbon.total_c,
            CARBON_FLOOR
        );
        pool.carbon.total_c = CARBON_FLOOR;
    }
    pool.flux = flux.clone();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::InitialState;
    use approx::assert_relative_eq;
    use somflux_core::stoichiometry::Nutrient;

    fn state() -> SoilState {
        SoilState::from_initial_state(&InitialState::default())
    }

    #[test]
    fn test_transfer_updates_receiver() {
        let mut state = state();
        state.pools[PoolId::MetabolicSoil].nutrient = Nutrient::uniform(20.0);
        state.pools[PoolId::ActiveSoil].carbon.total_c = 10.0;
        state.pools[PoolId::ActiveSoil].nutrient = Nutrient::uniform(10.0);

        let mut flux = FlowSet::default();
        flux.outflow = -2.0;
        flux.respiration = 1.0;
        flux.add_transfer(PoolId::ActiveSoil, 1.0, 0.0);
        flux.flow_mut(PoolId::ActiveSoil).nutrient = Nutrient::uniform(12.0);

        let metabolic_before = state.pools[PoolId::MetabolicSoil].total_c();
        let mut mineralization = PerElement::default();
        commit_pool(&mut state, PoolId::MetabolicSoil, &flux, &mut mineralization).unwrap();

        assert_relative_eq!(
            state.pools[PoolId::MetabolicSoil].total_c(),
            metabolic_before - 2.0
        );
        let active = &state.pools[PoolId::ActiveSoil];
        assert_relative_eq!(active.total_c(), 11.0);
        assert_relative_eq!(active.nutrient.c_to_n, (10.0 * 10.0 + 12.0) / 11.0);

        // released 2/20 = 0.1 N, transferred 1/12
        assert_relative_eq!(mineralization.n, 0.1 - 1.0 / 12.0, epsilon = 1e-12);
        assert_eq!(state.pools[PoolId::MetabolicSoil].flux, flux);
    }

    #[test]
    fn test_negative_mineral_clamped() {
        let mut state = state();
        state.environment.mineral = PerElement::new(1e-4, 1.0, 1.0, 1.0);
        state.pools[PoolId::MetabolicSoil].nutrient = Nutrient::uniform(40.0);

        let mut flux = FlowSet::default();
        flux.outflow = -1.0;
        flux.add_transfer(PoolId::ActiveSoil, 1.0, 0.0);
        flux.flow_mut(PoolId::ActiveSoil).nutrient = Nutrient::uniform(5.0);

        let mut mineralization = PerElement::default();
        commit_pool(&mut state, PoolId::MetabolicSoil, &flux, &mut mineralization).unwrap();
        assert_eq!(state.environment.mineral.n, 0.0);
        assert!(mineralization.n < 0.0);
    }

    #[test]
    fn test_negative_carbon_clamped() {
        let mut state = state();
        state.pools[PoolId::StructuralSurface].carbon.total_c = 0.01;

        let mut flux = FlowSet::default();
        flux.outflow = -0.05;
        flux.respiration = 0.02;
        flux.add_transfer(PoolId::ActiveSurface, 0.03, 0.0);

        let mut mineralization = PerElement::default();
        commit_pool(
            &mut state,
            PoolId::StructuralSurface,
            &flux,
            &mut mineralization,
        )
        .unwrap();
        assert_eq!(
            state.pools[PoolId::StructuralSurface].total_c(),
            CARBON_FLOOR
        );
    }
}

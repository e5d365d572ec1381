//! Scenario tests for the pool network.

use approx::assert_relative_eq;
use serde::{Deserialize, Serialize};
use somflux_century::config::SomConfig;
use somflux_century::network::{PoolNetwork, StepOptions, CARBON_FLOOR};
use somflux_century::parameters::{InitialState, RatioBounds, SplitRule};
use somflux_century::pools::{PoolId, SoilState};
use somflux_core::element::{Element, PerElement};
use somflux_core::errors::SomError;
use somflux_core::modifiers::{ModifierContext, RateModifier};
use somflux_core::stoichiometry::Nutrient;
use std::sync::Arc;

/// Only `pool` holds carbon.
fn single_pool_state(pool: PoolId, carbon: f64, nutrient: Nutrient) -> SoilState {
    let mut initial = InitialState::empty();
    let init = initial.get_mut(pool);
    init.carbon = carbon;
    init.nutrient = nutrient;
    SoilState::from_initial_state(&initial)
}

mod stoichiometry {
    use super::*;

    /// Material at C:N 20 entering a pool that requires C:N 12 draws mineral
    /// nitrogen down.
    #[test]
    fn test_immobilization_sign() {
        let mut config = SomConfig::default();
        config.restriction.active_soil.n = RatioBounds::new(12.0, 12.0, 2.0);
        config.decomposition.metabolic_soil.split = SplitRule::single(PoolId::ActiveSoil, 0.3);
        let network = config.build_network().unwrap();

        let mut state = single_pool_state(PoolId::MetabolicSoil, 100.0, Nutrient::uniform(20.0));
        state.environment.mineral = PerElement::new(0.0005, 1.0, 1.0, 1.0);

        let report = network.step(&mut state, &StepOptions::default()).unwrap();

        let flux = &state.pools[PoolId::MetabolicSoil].flux;
        let released = -flux.outflow;
        assert!(released > 0.0);
        let transferred = flux.flow(PoolId::ActiveSoil);
        assert_eq!(transferred.nutrient.c_to_n, 12.0);

        // delta = outflow / 20 + transfer / 12 > 0
        let delta = -released / 20.0 + transferred.carbon.total_c / 12.0;
        assert!(delta > 0.0);
        assert_relative_eq!(report.net_mineralization.n, -delta, max_relative = 1e-12);
        assert!(state.environment.mineral.n < 0.0005);
    }

    /// Nutrient-rich material mineralizes nitrogen.
    #[test]
    fn test_mineralization_sign() {
        let network = SomConfig::default().build_network().unwrap();
        let mut state = single_pool_state(PoolId::MetabolicSoil, 100.0, Nutrient::uniform(10.0));
        let before = state.environment.mineral.n;

        let report = network.step(&mut state, &StepOptions::default()).unwrap();
        assert!(report.net_mineralization.n > 0.0);
        assert_relative_eq!(
            state.environment.mineral.n,
            before + report.net_mineralization.n,
            max_relative = 1e-12
        );
    }
}

mod edge_cases {
    use super::*;

    /// Empty pools stay empty and nothing turns into NaN.
    #[test]
    fn test_zero_input() {
        let network = SomConfig::default().build_network().unwrap();
        let mut state = SoilState::from_initial_state(&InitialState::empty());
        let mineral = state.environment.mineral;

        let report = network.step(&mut state, &StepOptions::default()).unwrap();

        for (pool, record) in state.pools.iter() {
            assert_eq!(record.total_c(), 0.0, "{} gained carbon", pool);
            assert_eq!(record.flux.outflow, 0.0);
            assert_eq!(record.flux.transfers().count(), 0);
            assert!(!record.carbon.isotope_ratio.is_nan());
            assert!(record.nutrient.is_valid());
        }
        assert_eq!(report.heterotrophic_respiration, 0.0);
        assert_eq!(state.environment.mineral, mineral);
    }

    /// Without mineral nitrogen, nutrient-poor litter stops decomposing while
    /// rich microbial material keeps going.
    #[test]
    fn test_gating_shutoff() {
        let network = SomConfig::default().build_network().unwrap();
        let mut state = SoilState::from_initial_state(&InitialState::default());
        state.environment.mineral.n = 0.0;
        let metabolic_before = state.pools[PoolId::MetabolicSoil].total_c();

        let report = network.step(&mut state, &StepOptions::default()).unwrap();

        assert!(report.gated.contains(&PoolId::MetabolicSoil));
        assert!(report.gated.contains(&PoolId::LargeWood));
        assert!(!report.gated.contains(&PoolId::ActiveSurface));

        let metabolic = &state.pools[PoolId::MetabolicSoil];
        assert_eq!(metabolic.total_c(), metabolic_before);
        assert_eq!(metabolic.flux.outflow, 0.0);
        assert_eq!(metabolic.flux.respiration, 0.0);
        assert_eq!(metabolic.flux.transfers().count(), 0);
        assert_eq!(report.respiration(PoolId::MetabolicSoil), 0.0);

        // sunlight keeps breaking surface litter down
        let structural = &state.pools[PoolId::StructuralSurface].flux;
        assert!(report.gated.contains(&PoolId::StructuralSurface));
        assert!(structural.photodecomposed > 0.0);
        assert_eq!(structural.outflow, -structural.photodecomposed);
    }

    /// Photodecomposition under extreme radiation cannot leave negative carbon.
    #[test]
    fn test_photodecomposition_clamp() {
        let network = SomConfig::default().build_network().unwrap();
        let mut state = single_pool_state(
            PoolId::StructuralSurface,
            0.001,
            Nutrient::new(150.0, 500.0, 500.0, 150.0),
        );
        state.environment.radiation = 5000.0;

        let report = network.step(&mut state, &StepOptions::default()).unwrap();

        assert!(report.photodecomposed_carbon > 0.001);
        assert_eq!(
            state.pools[PoolId::StructuralSurface].total_c(),
            CARBON_FLOOR
        );
    }
}

mod configuration {
    use super::*;

    #[test]
    fn test_timestep_over_a_year() {
        let config = SomConfig::default();
        let result = PoolNetwork::new(
            &config.decomposition,
            config.restriction.clone(),
            config.leaching.clone(),
            366.0,
        );
        assert_eq!(result.unwrap_err(), SomError::InvalidTimestep(366.0));
    }

    #[test]
    fn test_non_nitrogen_gating_fails_loudly() {
        let network = SomConfig::default().build_network().unwrap();
        let mut state = SoilState::from_initial_state(&InitialState::default());
        for element in [Element::P, Element::S, Element::K] {
            let options = StepOptions {
                gating: element,
                ..StepOptions::default()
            };
            assert_eq!(
                network.step(&mut state, &options).unwrap_err(),
                SomError::UnsupportedGatingNutrient(element)
            );
        }
    }

    #[test]
    fn test_wood_decomposes_first() {
        let network = SomConfig::default().build_network().unwrap();
        assert_eq!(
            &network.order()[..3],
            &[PoolId::FineBranch, PoolId::LargeWood, PoolId::CoarseRoot]
        );
        let position = |p: PoolId| network.order().iter().position(|x| *x == p).unwrap();
        assert!(position(PoolId::MetabolicSoil) < position(PoolId::ActiveSoil));
        assert!(position(PoolId::ActiveSurface) < position(PoolId::ActiveSoil));
    }

    /// A configuration written to TOML and read back behaves identically.
    #[test]
    fn test_toml_round_trip() {
        let mut config = SomConfig::default();
        config.timestep_days = 2.0;
        config.options.woody = false;
        config.leaching.coef1 = 0.2;

        let serialised = config.to_toml_string().unwrap();
        let deserialised = SomConfig::from_toml_str(&serialised).unwrap();
        assert_eq!(deserialised.timestep_days, 2.0);
        assert!(!deserialised.options.woody);

        let a = config.build_network().unwrap();
        let b = deserialised.build_network().unwrap();
        assert_eq!(a.order(), b.order());

        let mut state_a = config.initial_soil_state();
        let mut state_b = deserialised.initial_soil_state();
        let report_a = a.step(&mut state_a, &config.options).unwrap();
        let report_b = b.step(&mut state_b, &deserialised.options).unwrap();
        assert_eq!(report_a, report_b);
        assert_eq!(state_a, state_b);
    }
}

mod custom_modifiers {
    use super::*;

    /// Frozen soils stop decomposing entirely.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct FrozenSoil {
        threshold: f64,
    }

    #[typetag::serde]
    impl RateModifier for FrozenSoil {
        fn factor(&self, context: &ModifierContext) -> f64 {
            if context.environment.temperature(context.layer) < self.threshold {
                0.0
            } else {
                1.0
            }
        }
    }

    #[test]
    fn test_modifier_from_outside_the_workspace() {
        let mut config = SomConfig::default();
        config
            .decomposition
            .passive
            .modifiers
            .push(Arc::new(FrozenSoil { threshold: 0.0 }));

        let serialised = config.to_toml_string().unwrap();
        assert!(serialised.contains("FrozenSoil"));
        let config = SomConfig::from_toml_str(&serialised).unwrap();
        let network = config.build_network().unwrap();

        let mut state = config.initial_soil_state();
        state.environment.soil_temperature = -5.0;
        let report = network.step(&mut state, &StepOptions::default()).unwrap();
        assert_eq!(report.respiration(PoolId::Passive), 0.0);
        assert!(report.respiration(PoolId::SlowSoil) > 0.0);
    }
}

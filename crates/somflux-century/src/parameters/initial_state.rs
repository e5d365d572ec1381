use crate::pools::PoolId;
use serde::{Deserialize, Serialize};
use somflux_core::environment::Environment;
use somflux_core::errors::{SomError, SomResult};
use somflux_core::stoichiometry::Nutrient;
use somflux_core::FloatValue;

/// Starting contents of one pool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoolInit {
    /// unit: g C / m^2
    pub carbon: FloatValue,
    #[serde(default)]
    pub isotope_ratio: FloatValue,
    pub nutrient: Nutrient,
    /// unit: fraction
    #[serde(default)]
    pub lignin_fraction: FloatValue,
}

impl PoolInit {
    pub fn new(carbon: FloatValue, nutrient: Nutrient) -> Self {
        Self {
            carbon,
            isotope_ratio: 0.0,
            nutrient,
            lignin_fraction: 0.0,
        }
    }

    pub fn with_lignin(mut self, lignin_fraction: FloatValue) -> Self {
        self.lignin_fraction = lignin_fraction;
        self
    }
}

/// Starting pool contents and environment of one soil layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialState {
    pub fine_branch: PoolInit,
    pub large_wood: PoolInit,
    pub coarse_root: PoolInit,
    pub structural_surface: PoolInit,
    pub structural_soil: PoolInit,
    pub metabolic_surface: PoolInit,
    pub metabolic_soil: PoolInit,
    pub active_surface: PoolInit,
    pub active_soil: PoolInit,
    pub slow_surface: PoolInit,
    pub slow_soil: PoolInit,
    pub passive: PoolInit,
    pub leachate: PoolInit,
    pub environment: Environment,
}

impl Default for InitialState {
    fn default() -> Self {
        let structural = Nutrient::new(150.0, 500.0, 500.0, 150.0);
        let metabolic = Nutrient::new(25.0, 150.0, 150.0, 50.0);
        let active = Nutrient::new(10.0, 60.0, 80.0, 40.0);
        let slow = Nutrient::new(20.0, 200.0, 200.0, 100.0);
        let wood = Nutrient::new(250.0, 1500.0, 1500.0, 500.0);

        Self {
            fine_branch: PoolInit::new(300.0, wood).with_lignin(0.25),
            large_wood: PoolInit::new(600.0, wood).with_lignin(0.25),
            coarse_root: PoolInit::new(200.0, wood).with_lignin(0.25),
            structural_surface: PoolInit::new(100.0, structural).with_lignin(0.25),
            structural_soil: PoolInit::new(150.0, structural).with_lignin(0.25),
            metabolic_surface: PoolInit::new(20.0, metabolic),
            metabolic_soil: PoolInit::new(20.0, metabolic),
            active_surface: PoolInit::new(10.0, active),
            active_soil: PoolInit::new(80.0, active),
            slow_surface: PoolInit::new(40.0, slow),
            slow_soil: PoolInit::new(1800.0, slow),
            passive: PoolInit::new(3500.0, Nutrient::new(9.0, 90.0, 90.0, 50.0)),
            leachate: PoolInit::new(0.0, Nutrient::default()),
            environment: Environment::default(),
        }
    }
}

impl InitialState {
    pub fn get(&self, pool: PoolId) -> &PoolInit {
        match pool {
            PoolId::FineBranch => &self.fine_branch,
            PoolId::LargeWood => &self.large_wood,
            PoolId::CoarseRoot => &self.coarse_root,
            PoolId::StructuralSurface => &self.structural_surface,
            PoolId::StructuralSoil => &self.structural_soil,
            PoolId::MetabolicSurface => &self.metabolic_surface,
            PoolId::MetabolicSoil => &self.metabolic_soil,
            PoolId::ActiveSurface => &self.active_surface,
            PoolId::ActiveSoil => &self.active_soil,
            PoolId::SlowSurface => &self.slow_surface,
            PoolId::SlowSoil => &self.slow_soil,
            PoolId::Passive => &self.passive,
            PoolId::Leachate => &self.leachate,
        }
    }

    pub fn get_mut(&mut self, pool: PoolId) -> &mut PoolInit {
        match pool {
            PoolId::FineBranch => &mut self.fine_branch,
            PoolId::LargeWood => &mut self.large_wood,
            PoolId::CoarseRoot => &mut self.coarse_root,
            PoolId::StructuralSurface => &mut self.structural_surface,
            PoolId::StructuralSoil => &mut self.structural_soil,
            PoolId::MetabolicSurface => &mut self.metabolic_surface,
            PoolId::MetabolicSoil => &mut self.metabolic_soil,
            PoolId::ActiveSurface => &mut self.active_surface,
            PoolId::ActiveSoil => &mut self.active_soil,
            PoolId::SlowSurface => &mut self.slow_surface,
            PoolId::SlowSoil => &mut self.slow_soil,
            PoolId::Passive => &mut self.passive,
            PoolId::Leachate => &mut self.leachate,
        }
    }

    /// A state with every pool empty, keeping the default ratios.
    pub fn empty() -> Self {
        let mut state = Self::default();
        for pool in PoolId::ALL {
            state.get_mut(pool).carbon = 0.0;
        }
        state
    }

    pub fn validate(&self) -> SomResult<()> {
        for pool in PoolId::ALL {
            let init = self.get(pool);
            if !(init.carbon >= 0.0) {
                return Err(SomError::Configuration(format!(
                    "{}: initial carbon must be non-negative, got {}",
                    pool, init.carbon
                )));
            }
            if !init.nutrient.is_valid() {
                return Err(SomError::Configuration(format!(
                    "{}: initial C:E ratios must be positive",
                    pool
                )));
            }
            if !(0.0..=1.0).contains(&init.lignin_fraction) {
                return Err(SomError::Configuration(format!(
                    "{}: lignin fraction must be within [0, 1]",
                    pool
                )));
            }
        }
        if !self.environment.texture.is_valid() {
            return Err(SomError::Configuration(
                "soil texture fractions must be within [0, 1] and sum to one".to_string(),
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
        InitialState::default().validate().unwrap();
    }

    #[test]
    fn test_empty_state() {
        let state = InitialState::empty();
        for pool in PoolId::ALL {
            assert_eq!(state.get(pool).carbon, 0.0);
        }
        state.validate().unwrap();
    }

    #[test]
    fn test_negative_carbon_rejected() {
        let mut state = InitialState::default();
        state.get_mut(PoolId::SlowSoil).carbon = -1.0;
        assert!(matches!(
            state.validate(),
            Err(SomError::Configuration(_))
        ));
    }
}

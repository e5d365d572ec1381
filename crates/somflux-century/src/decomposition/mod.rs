//! Per-Pool Decomposition
//!
//! A single routine decomposes every pool kind. The differences between kinds
//! live in [`PoolKindParameters`]; [`PoolDecomposer`] binds a record to its pool
//! and to the timestep-scaled rates.
//!
//! # Algorithm
//!
//! For a pool holding $C$ grams of carbon:
//!
//! 1. Environmental multiplier
//!    $$m = f_T(T) \cdot g(w) \cdot \prod_i h_i$$
//!    where $h_i$ are the pool's [`RateModifier`]s.
//!
//! 2. Decomposed carbon, never more than the pool holds:
//!    $$D = \min(C, C \cdot m \cdot k_{step})$$
//!
//! 3. Split $D$ among the destinations of the [`SplitRule`]; each share loses
//!    its respiration fraction to CO2 before transfer.
//!
//! 4. Mixing (surface active pool): a non-respiring transfer
//!    $$M = C \cdot f_T g \cdot k_{mix} \cdot I_{mix}(R)$$
//!    scaled down together with $D$ if $D + M > C$.
//!
//! 5. Leaching (soil active pool): part of one transfer is diverted to the
//!    leachate pool, see [`compute_leach_flow`].
//!
//! When the gate is closed steps 1-5 are skipped and every flow stays zero.
//! Photodecomposition is applied afterwards regardless of the gate.
//!
//! [`RateModifier`]: somflux_core::modifiers::RateModifier
//! [`SplitRule`]: crate::parameters::SplitRule

mod photodecomposition;

pub use photodecomposition::apply_photodecomposition;

use crate::flows::FlowSet;
use crate::leaching::compute_leach_flow;
use crate::parameters::{LeachingParameters, PoolKindParameters};
use crate::pools::{Pool, PoolId};
use crate::restriction::InflowRatios;
use somflux_core::environment::Environment;
use somflux_core::errors::{SomError, SomResult};
use somflux_core::modifiers::{temperature_moisture_factor, ModifierContext};
use somflux_core::timestep::{timescaling, validate_timestep};
use somflux_core::FloatValue;

/// Decomposition behaviour of one pool with its timestep-scaled rates.
#[derive(Debug, Clone)]
pub struct PoolDecomposer {
    pool: PoolId,
    parameters: PoolKindParameters,
    step_rate: FloatValue,
    mixing_step_rate: FloatValue,
    timestep_days: FloatValue,
}

impl PoolDecomposer {
    /// Bind `parameters` to `pool`, converting annual rates to the timestep.
    ///
    /// # Errors
    ///
    /// * [`SomError::InvalidTimestep`] for a timestep outside (0, 365] days
    /// * [`SomError::Configuration`] for invalid parameters or a sink pool
    pub fn new(
        pool: PoolId,
        parameters: PoolKindParameters,
        timestep_days: FloatValue,
    ) -> SomResult<Self> {
        validate_timestep(timestep_days)?;
        if pool.is_sink() {
            return Err(SomError::Configuration(format!(
                "{} is a sink and cannot decompose",
                pool
            )));
        }
        parameters.validate(pool)?;

        let step_rate = timescaling(parameters.rate_constant, timestep_days)?;
        let mixing_step_rate = match &parameters.mixing {
            Some(mixing) => timescaling(mixing.rate_constant, timestep_days)?,
            None => 0.0,
        };
        Ok(Self {
            pool,
            parameters,
            step_rate,
            mixing_step_rate,
            timestep_days,
        })
    }

    /// Bind `parameters` to `pool` with an already scaled decay fraction.
    ///
    /// The mixing rate is still converted from its annual value.
    pub fn with_step_rate(
        pool: PoolId,
        parameters: PoolKindParameters,
        step_rate: FloatValue,
        timestep_days: FloatValue,
    ) -> SomResult<Self> {
        let mut decomposer = Self::new(pool, parameters, timestep_days)?;
        if !(0.0..=1.0).contains(&step_rate) {
            return Err(SomError::Configuration(format!(
                "{}: step rate must be within [0, 1], got {}",
                pool, step_rate
            )));
        }
        decomposer.step_rate = step_rate;
        Ok(decomposer)
    }

    pub fn pool(&self) -> PoolId {
        self.pool
    }

    pub fn parameters(&self) -> &PoolKindParameters {
        &self.parameters
    }

    /// Fraction of the pool decomposed per step at unit multiplier.
    pub fn step_rate(&self) -> FloatValue {
        self.step_rate
    }

    pub fn mixing_step_rate(&self) -> FloatValue {
        self.mixing_step_rate
    }

    pub fn timestep_days(&self) -> FloatValue {
        self.timestep_days
    }

    /// Every pool this one sends carbon to.
    pub fn destinations(&self) -> Vec<PoolId> {
        self.parameters.destinations()
    }

    /// Destinations whose required ratio gates decomposition.
    pub fn gated_destinations(&self) -> Vec<PoolId> {
        self.parameters.split.targets()
    }

    /// Temperature and moisture effect on this pool.
    pub fn temperature_moisture(&self, environment: &Environment) -> FloatValue {
        let layer = self.parameters.layer;
        temperature_moisture_factor(
            &self.parameters.temperature,
            &self.parameters.moisture,
            environment.water_content(layer),
            environment.temperature(layer),
        )
    }

    /// Combined environmental multiplier on the decay rate.
    pub fn environmental_multiplier(&self, pool: &Pool, environment: &Environment) -> FloatValue {
        let context = ModifierContext {
            environment,
            layer: self.parameters.layer,
            lignin_fraction: pool.lignin_fraction,
        };
        self.parameters
            .modifiers
            .iter()
            .fold(self.temperature_moisture(environment), |m, modifier| {
                m * modifier.factor(&context)
            })
    }
}

/// Flows out of one pool for a single step.
///
/// # Arguments
///
/// * `pool` - The decomposing pool as committed at the end of the last step
/// * `decomposer` - Behaviour of the pool
/// * `environment` - Drivers for this step
/// * `ratios` - Required inbound ratios of every receiving pool
/// * `leaching` - Leaching parameters
/// * `flag` - Whether biological decomposition proceeds this step
///
/// # Errors
///
/// Propagates leaching failures. In debug builds the mass balance of the
/// result is checked and [`SomError::InvariantViolation`] returned if it fails.
pub fn decompose(
    pool: &Pool,
    decomposer: &PoolDecomposer,
    environment: &Environment,
    ratios: &InflowRatios,
    leaching: &LeachingParameters,
    flag: bool,
) -> SomResult<FlowSet> {
    let params = &decomposer.parameters;
    let mut flux = FlowSet::default();

    // Ratios are fixed before any carbon is assigned
    for target in decomposer.destinations() {
        flux.flow_mut(target).nutrient = ratios.for_flow(target, &pool.nutrient);
    }

    let total_c = pool.carbon.total_c;
    let isotope = pool.carbon.isotope_ratio;

    if flag && total_c > 0.0 {
        let multiplier = decomposer.environmental_multiplier(pool, environment);
        let mut decomposed = (total_c * multiplier * decomposer.step_rate).min(total_c);

        let mut mixed = match &params.mixing {
            Some(mixing) => {
                total_c
                    * decomposer.temperature_moisture(environment)
                    * decomposer.mixing_step_rate
                    * mixing.index.rising(environment.radiation)
            }
            None => 0.0,
        };
        if decomposed + mixed > total_c {
            let scale = total_c / (decomposed + mixed);
            decomposed *= scale;
            mixed *= scale;
        }

        for (target, fraction, respiration) in
            params.split.allocate(pool.lignin_fraction, &environment.texture)
        {
            let split = decomposed * fraction;
            let respired = split * respiration;
            flux.respiration += respired;
            flux.add_transfer(target, split - respired, isotope);
        }
        if let Some(mixing) = &params.mixing {
            if mixed > 0.0 {
                flux.add_transfer(mixing.target, mixed, isotope);
            }
        }
        flux.outflow = -(decomposed + mixed);

        if let Some(source) = params.leaching {
            let transfer = flux.flow(source).carbon.total_c;
            let leach = compute_leach_flow(
                transfer,
                &pool.nutrient,
                isotope,
                environment.leached_water,
                environment.texture.sand,
                leaching,
            )?;
            if leach.carbon.total_c > 0.0 {
                flux.flow_mut(source).carbon.total_c -= leach.carbon.total_c;
                *flux.flow_mut(PoolId::Leachate) = leach;
            }
        }
    }

    if let Some(photo) = &params.photodecomposition {
        apply_photodecomposition(&mut flux, photo, pool, environment, decomposer.timestep_days);
    }

    log::trace!(
        "{}: outflow {:.6} respiration {:.6} (flag {})",
        decomposer.pool,
        flux.outflow,
        flux.respiration,
        flag
    );

    if cfg!(debug_assertions) {
        flux.check_mass_balance(decomposer.pool)?;
    }
    Ok(flux)
}

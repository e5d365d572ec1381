use crate::flows::FlowSet;
use crate::parameters::PhotodecompositionParameters;
use crate::pools::Pool;
use somflux_core::environment::Environment;
use somflux_core::FloatValue;

/// Add sunlight-driven breakdown of surface litter to `flux`.
///
/// Independent of the biological gate and of the temperature and moisture
/// multiplier. The amount is not limited by the pool size, so a pool can be
/// driven negative under extreme radiation; the commit phase clamps it. An
/// empty pool has nothing to break down.
pub fn apply_photodecomposition(
    flux: &mut FlowSet,
    params: &PhotodecompositionParameters,
    pool: &Pool,
    environment: &Environment,
    timestep_days: FloatValue,
) {
    if pool.carbon.total_c <= 0.0 {
        return;
    }
    let carbon = params.carbon(environment.radiation, timestep_days);
    if carbon <= 0.0 {
        return;
    }

    let respired = carbon * params.respiration_fraction;
    flux.respiration += respired;
    flux.add_transfer(params.target, carbon - respired, pool.carbon.isotope_ratio);
    flux.outflow -= carbon;
    flux.photodecomposed += carbon;
}

//! Per-step carbon transfers between pools.

use crate::pools::PoolId;
use serde::{Deserialize, Serialize};
use somflux_core::errors::{SomError, SomResult};
use somflux_core::stoichiometry::{Carbon, Nutrient};
use somflux_core::FloatValue;

/// Relative tolerance of the per-pool mass balance check.
const MASS_BALANCE_TOLERANCE: FloatValue = 1e-9;

/// Carbon moving from one pool to another during a single step, together
/// with the carbon-to-element ratios it carries.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Flow {
    pub carbon: Carbon,
    pub nutrient: Nutrient,
}

impl Flow {
    pub fn new(carbon: Carbon, nutrient: Nutrient) -> Self {
        Self { carbon, nutrient }
    }
}

/// Everything leaving a pool during one step.
///
/// `outflow` is the self slot: the (non-positive) change of the source pool.
/// Its magnitude equals the sum of the transfers plus respiration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FlowSet {
    pub outflow: FloatValue,
    /// Carbon respired to CO2
    pub respiration: FloatValue,
    /// Part of `outflow` removed by photodecomposition
    pub photodecomposed: FloatValue,
    flows: [Flow; PoolId::COUNT],
}

impl FlowSet {
    pub fn flow(&self, target: PoolId) -> &Flow {
        &self.flows[target.index()]
    }

    pub fn flow_mut(&mut self, target: PoolId) -> &mut Flow {
        &mut self.flows[target.index()]
    }

    /// Add carbon to the transfer toward `target`.
    pub fn add_transfer(&mut self, target: PoolId, carbon: FloatValue, isotope_ratio: FloatValue) {
        let flow = self.flow_mut(target);
        flow.carbon.total_c += carbon;
        flow.carbon.isotope_ratio = isotope_ratio;
    }

    /// Transfers carrying carbon this step.
    pub fn transfers(&self) -> impl Iterator<Item = (PoolId, &Flow)> {
        PoolId::ALL
            .iter()
            .copied()
            .zip(self.flows.iter())
            .filter(|(_, flow)| flow.carbon.total_c != 0.0)
    }

    /// Total carbon transferred to other pools.
    pub fn transferred(&self) -> FloatValue {
        self.flows.iter().map(|f| f.carbon.total_c).sum()
    }

    /// Checks that the outflow is fully accounted for by transfers and
    /// respiration.
    pub fn check_mass_balance(&self, pool: PoolId) -> SomResult<()> {
        let accounted = self.transferred() + self.respiration;
        let scale = self.outflow.abs().max(1.0);
        if self.outflow > 0.0 || (self.outflow.abs() - accounted).abs() > MASS_BALANCE_TOLERANCE * scale
        {
            return Err(SomError::InvariantViolation {
                pool: pool.to_string(),
                outflow: self.outflow,
                accounted,
            });
        }
        Ok(())
    }
}

//! Pool-Network Orchestrator
//!
//! Runs one step of the pool network in two phases:
//!
//! 1. **Decompose** reads the state left by the last commit. Inbound ratios
//!    are resolved once from the ambient mineral levels, then every pool is
//!    gated and decomposed in upstream-to-downstream order.
//! 2. **Commit** applies the flows in the same order, merging transfers into
//!    their receivers and moving the net element release into the mineral
//!    pools.
//!
//! The commit works on a copy of the state which replaces the caller's only
//! once every pool has been committed, so a failed step leaves the state
//! untouched.

mod commit;
mod gating;
mod graph;

pub use commit::CARBON_FLOOR;
pub use gating::{gate, should_decompose, validate_gating, MINERAL_THRESHOLD};
pub use graph::{build_graph, decomposition_order, EdgeKind, PoolGraph};

use crate::config::SomConfig;
use crate::decomposition::{decompose, PoolDecomposer};
use crate::flows::FlowSet;
use crate::parameters::{DecompositionParameters, LeachingParameters, RestrictionParameters};
use crate::pools::{PoolId, SoilState};
use crate::restriction::InflowRatios;
use commit::commit_pool;
use petgraph::dot::{Config, Dot};
use serde::{Deserialize, Serialize};
use somflux_core::element::{Element, PerElement};
use somflux_core::errors::SomResult;
use somflux_core::timestep::validate_timestep;
use somflux_core::FloatValue;

/// Per-call options of a step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepOptions {
    /// Whether the wood pools decompose
    pub woody: bool,
    /// Element whose availability gates decomposition
    pub gating: Element,
}

impl Default for StepOptions {
    fn default() -> Self {
        Self {
            woody: true,
            gating: Element::N,
        }
    }
}

impl StepOptions {
    pub fn validate(&self) -> SomResult<()> {
        validate_gating(self.gating)
    }
}

/// Result of the decompose phase.
#[derive(Debug, Clone, PartialEq)]
pub struct StepFlows {
    flows: [Option<FlowSet>; PoolId::COUNT],
    closed: Vec<PoolId>,
}

impl StepFlows {
    pub fn get(&self, pool: PoolId) -> Option<&FlowSet> {
        self.flows[pool.index()].as_ref()
    }

    /// Pools whose gate was closed this step.
    pub fn closed(&self) -> &[PoolId] {
        &self.closed
    }
}

/// Totals of one committed step.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StepReport {
    respiration: [FloatValue; PoolId::COUNT],
    /// Carbon respired by all pools
    /// unit: g C / m^2
    pub heterotrophic_respiration: FloatValue,
    /// Net release of each element to the mineral pool; negative values are
    /// net immobilisation
    /// unit: g E / m^2
    pub net_mineralization: PerElement,
    /// unit: g C / m^2
    pub leached_carbon: FloatValue,
    /// unit: g C / m^2
    pub photodecomposed_carbon: FloatValue,
    /// Pools whose decomposition was gated off
    pub gated: Vec<PoolId>,
}

impl StepReport {
    /// Carbon respired by `pool`.
    pub fn respiration(&self, pool: PoolId) -> FloatValue {
        self.respiration[pool.index()]
    }

    fn record(&mut self, pool: PoolId, flux: &FlowSet) {
        self.respiration[pool.index()] = flux.respiration;
        self.heterotrophic_respiration += flux.respiration;
        self.leached_carbon += flux.flow(PoolId::Leachate).carbon.total_c;
        self.photodecomposed_carbon += flux.photodecomposed;
    }
}

/// The litter and soil organic matter pools of one layer and the rules
/// moving carbon between them.
#[derive(Debug, Clone)]
pub struct PoolNetwork {
    decomposers: Vec<PoolDecomposer>,
    restriction: RestrictionParameters,
    leaching: LeachingParameters,
    graph: PoolGraph,
    order: Vec<PoolId>,
    timestep_days: FloatValue,
}

impl PoolNetwork {
    /// Build a network, converting every rate to the timestep.
    ///
    /// # Errors
    ///
    /// * [`SomError::InvalidTimestep`] for a timestep outside (0, 365] days
    /// * [`SomError::Configuration`] for invalid parameters
    ///
    /// [`SomError::InvalidTimestep`]: somflux_core::errors::SomError::InvalidTimestep
    /// [`SomError::Configuration`]: somflux_core::errors::SomError::Configuration
    pub fn new(
        decomposition: &DecompositionParameters,
        restriction: RestrictionParameters,
        leaching: LeachingParameters,
        timestep_days: FloatValue,
    ) -> SomResult<Self> {
        validate_timestep(timestep_days)?;
        restriction.validate()?;
        leaching.validate()?;

        let decomposers = decomposition
            .iter()
            .map(|(pool, kind)| PoolDecomposer::new(pool, kind.clone(), timestep_days))
            .collect::<SomResult<Vec<_>>>()?;

        let graph = build_graph(&decomposers);
        let order: Vec<PoolId> = decomposition_order(&graph)?
            .into_iter()
            .filter(|pool| !pool.is_sink())
            .collect();

        log::info!(
            "Built pool network with {} decomposing pools, timestep {} days",
            order.len(),
            timestep_days
        );
        log::debug!("Decomposition order: {:?}", order);

        Ok(Self {
            decomposers,
            restriction,
            leaching,
            graph,
            order,
            timestep_days,
        })
    }

    pub fn from_config(config: &SomConfig) -> SomResult<Self> {
        config.validate()?;
        Self::new(
            &config.decomposition,
            config.restriction.clone(),
            config.leaching.clone(),
            config.timestep_days,
        )
    }

    /// Order in which pools are decomposed and committed.
    pub fn order(&self) -> &[PoolId] {
        &self.order
    }

    pub fn graph(&self) -> &PoolGraph {
        &self.graph
    }

    pub fn timestep_days(&self) -> FloatValue {
        self.timestep_days
    }

    pub fn decomposer(&self, pool: PoolId) -> Option<&PoolDecomposer> {
        self.decomposers.iter().find(|d| d.pool() == pool)
    }

    /// Create a diagram that represents the pool graph
    ///
    /// Useful for debugging
    pub fn as_dot(&self) -> Dot<'_, &PoolGraph> {
        Dot::with_attr_getters(
            &self.graph,
            &[Config::NodeNoLabel, Config::EdgeNoLabel],
            &|_, er| format!("label = \"{:?}\"", er.weight()),
            &|_, (_, pool)| format!("label = \"{}\"", pool),
        )
    }

    /// Decompose phase: flows of every pool for this step.
    ///
    /// Reads `state` only.
    pub fn decompose(&self, state: &SoilState, options: &StepOptions) -> SomResult<StepFlows> {
        options.validate()?;

        let environment = &state.environment;
        let ratios = InflowRatios::resolve(&self.restriction, &environment.mineral);
        let mut flows: [Option<FlowSet>; PoolId::COUNT] = Default::default();
        let mut closed = vec![];

        for &pool_id in &self.order {
            let Some(decomposer) = self.decomposer(pool_id) else {
                continue;
            };
            let pool = &state.pools[pool_id];

            let flux = if pool_id.is_wood() && !options.woody {
                FlowSet::default()
            } else {
                let flag = gate(pool, decomposer, &ratios, environment, options.gating)?;
                if !flag {
                    closed.push(pool_id);
                }
                decompose(pool, decomposer, environment, &ratios, &self.leaching, flag)?
            };
            flows[pool_id.index()] = Some(flux);
        }

        Ok(StepFlows { flows, closed })
    }

    /// Commit phase: apply `flows` to `state`.
    ///
    /// `state` is only replaced once every pool has been committed.
    pub fn commit(&self, state: &mut SoilState, flows: &StepFlows) -> SomResult<StepReport> {
        let mut next = state.clone();
        let mut report = StepReport {
            gated: flows.closed.clone(),
            ..StepReport::default()
        };

        for &pool_id in &self.order {
            if let Some(flux) = flows.get(pool_id) {
                commit_pool(&mut next, pool_id, flux, &mut report.net_mineralization)?;
                report.record(pool_id, flux);
            }
        }

        log::debug!(
            "Committed step: respiration {:.6}, net N mineralization {:.6}, leached {:.6}",
            report.heterotrophic_respiration,
            report.net_mineralization.n,
            report.leached_carbon
        );
        if !report.gated.is_empty() {
            log::debug!("Decomposition gated off for {:?}", report.gated);
        }

        *state = next;
        Ok(report)
    }

    /// Run one full step: decompose then commit.
    pub fn step(&self, state: &mut SoilState, options: &StepOptions) -> SomResult<StepReport> {
        let flows = self.decompose(state, options)?;
        self.commit(state, &flows)
    }
}

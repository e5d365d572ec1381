//! Decomposition Parameters
//!
//! One [`PoolKindParameters`] record per decomposing pool. A single generic
//! decomposition routine reads these records, so the differences between pool
//! kinds (which drivers they respond to, how their outflow is split, whether
//! they mix, leach or photodecompose) are data rather than code.
//!
//! # Carbon Flows
//!
//! ```text
//!   [FINE BRANCH] [LARGE WOOD]      [STRUCTURAL SURF] [METABOLIC SURF]
//!         \           |                |      |            |
//!          +----------+--------+-------+      | lignin     |
//!                              v              v            v
//!                     [ACTIVE SURF] <----> [SLOW SURF]  <--+
//!                          | mixing
//!   [COARSE ROOT] [STRUCTURAL SOIL] [METABOLIC SOIL]
//!          \          |     \           |
//!           v         v      v          v
//!          [SLOW SOIL] <----> [ACTIVE SOIL] --> [LEACHATE]
//!                 \           ^     |
//!                  v          |     v
//!                   +----> [PASSIVE]
//! ```
//!
//! Every arrow also loses a respiration fraction to CO2.

use crate::pools::PoolId;
use serde::{Deserialize, Serialize};
use somflux_core::environment::{Layer, SoilTexture};
use somflux_core::errors::{SomError, SomResult};
use somflux_core::modifiers::{
    AnaerobicResponse, LigninResponse, MoistureCurve, PhResponse, RadiationIndex,
    RadiationResponse, RateModifier, TemperatureCurve, TextureResponse,
};
use somflux_core::FloatValue;
use std::sync::Arc;

/// Lignin decay constant for surface material (`pligst(1)`)
const PLIGST_SURFACE: FloatValue = 3.0;
/// Lignin decay constant for soil material (`pligst(2)`)
const PLIGST_SOIL: FloatValue = 3.0;
/// Respiration of the lignin part of structural and wood decomposition (`rsplig`)
const RESP_LIGNIN: FloatValue = 0.3;

/// A fraction that may depend linearly on soil texture.
///
/// $$s = a + b_{sand} \cdot sand + b_{clay} \cdot clay$$
///
/// Evaluated values are clamped to [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Share {
    pub intercept: FloatValue,
    #[serde(default)]
    pub sand: FloatValue,
    #[serde(default)]
    pub clay: FloatValue,
}

impl Share {
    pub fn constant(value: FloatValue) -> Self {
        Self {
            intercept: value,
            sand: 0.0,
            clay: 0.0,
        }
    }

    pub fn evaluate(&self, texture: &SoilTexture) -> FloatValue {
        (self.intercept + self.sand * texture.sand + self.clay * texture.clay).clamp(0.0, 1.0)
    }
}

/// Destination that receives a computed share of the outflow.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    pub target: PoolId,
    /// Fraction of this split respired before transfer
    pub respiration: Share,
}

impl Destination {
    pub fn new(target: PoolId, respiration: FloatValue) -> Self {
        Self {
            target,
            respiration: Share::constant(respiration),
        }
    }
}

/// Destination that receives an explicit share of the outflow.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Split {
    pub target: PoolId,
    pub fraction: Share,
    pub respiration: Share,
}

/// How the decomposed carbon of a pool is divided between destinations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SplitRule {
    /// The lignin fraction of the pool goes to `lignin`, the rest to
    /// `remainder`.
    Lignin {
        lignin: Destination,
        remainder: Destination,
    },
    /// Explicit shares; `remainder` receives whatever the splits leave.
    Fractions {
        splits: Vec<Split>,
        remainder: Destination,
    },
}

impl SplitRule {
    /// A single destination receiving the whole outflow.
    pub fn single(target: PoolId, respiration: FloatValue) -> Self {
        SplitRule::Fractions {
            splits: vec![],
            remainder: Destination::new(target, respiration),
        }
    }

    /// Divide the outflow into `(target, fraction, respiration fraction)`
    /// entries whose fractions sum to one.
    pub fn allocate(
        &self,
        lignin_fraction: FloatValue,
        texture: &SoilTexture,
    ) -> Vec<(PoolId, FloatValue, FloatValue)> {
        match self {
            SplitRule::Lignin { lignin, remainder } => {
                let l = lignin_fraction.clamp(0.0, 1.0);
                vec![
                    (lignin.target, l, lignin.respiration.evaluate(texture)),
                    (
                        remainder.target,
                        1.0 - l,
                        remainder.respiration.evaluate(texture),
                    ),
                ]
            }
            SplitRule::Fractions { splits, remainder } => {
                let mut allocated = 0.0;
                let mut out = Vec::with_capacity(splits.len() + 1);
                for split in splits {
                    let fraction = split.fraction.evaluate(texture).min(1.0 - allocated);
                    allocated += fraction;
                    out.push((split.target, fraction, split.respiration.evaluate(texture)));
                }
                out.push((
                    remainder.target,
                    1.0 - allocated,
                    remainder.respiration.evaluate(texture),
                ));
                out
            }
        }
    }

    /// Every pool this rule sends carbon to.
    pub fn targets(&self) -> Vec<PoolId> {
        match self {
            SplitRule::Lignin { lignin, remainder } => vec![lignin.target, remainder.target],
            SplitRule::Fractions { splits, remainder } => splits
                .iter()
                .map(|s| s.target)
                .chain(std::iter::once(remainder.target))
                .collect(),
        }
    }
}

/// Physical mixing of a surface pool into its belowground counterpart.
///
/// Mixing moves carbon without respiration and is independent of the
/// texture-weighted split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MixingRule {
    pub target: PoolId,
    /// Continuous annual mixing rate
    /// unit: 1 / yr
    pub rate_constant: FloatValue,
    /// Rising radiation index applied to the mixing rate
    pub index: RadiationIndex,
}

/// Sunlight-driven breakdown of surface litter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhotodecompositionParameters {
    pub target: PoolId,
    /// Carbon photodecomposed per day at saturating radiation
    /// unit: g C / m^2 / day
    /// default: 0.05
    pub max_rate: FloatValue,
    /// Radiation scale of the saturation curve
    /// unit: W / m^2
    /// default: 300.0
    pub saturation_radiation: FloatValue,
    /// Fraction of photodecomposed carbon lost directly as CO2
    /// unit: fraction
    /// default: 0.4
    pub respiration_fraction: FloatValue,
}

impl Default for PhotodecompositionParameters {
    fn default() -> Self {
        Self {
            target: PoolId::ActiveSurface,
            max_rate: 0.05,
            saturation_radiation: 300.0,
            respiration_fraction: 0.4,
        }
    }
}

impl PhotodecompositionParameters {
    /// Carbon photodecomposed over a step.
    ///
    /// $$C_{photo} = r_{max} \cdot d \cdot (1 - e^{-R / R_{sat}})$$
    ///
    /// The amount does not depend on the pool size and may exceed it.
    pub fn carbon(&self, radiation: FloatValue, timestep_days: FloatValue) -> FloatValue {
        if radiation <= 0.0 || self.saturation_radiation <= 0.0 {
            return 0.0;
        }
        self.max_rate * timestep_days * (1.0 - (-radiation / self.saturation_radiation).exp())
    }
}

/// Decomposition behaviour of one pool kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolKindParameters {
    /// Continuous annual decay rate
    /// unit: 1 / yr
    pub rate_constant: FloatValue,
    /// Drivers the pool responds to
    pub layer: Layer,
    #[serde(default)]
    pub temperature: TemperatureCurve,
    #[serde(default)]
    pub moisture: MoistureCurve,
    /// Additional multiplicative effects on the decay rate
    #[serde(default)]
    pub modifiers: Vec<Arc<dyn RateModifier>>,
    pub split: SplitRule,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mixing: Option<MixingRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photodecomposition: Option<PhotodecompositionParameters>,
    /// Destination whose transfer is subject to leaching
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leaching: Option<PoolId>,
}

impl PoolKindParameters {
    fn new(rate_constant: FloatValue, layer: Layer, split: SplitRule) -> Self {
        Self {
            rate_constant,
            layer,
            temperature: TemperatureCurve::default(),
            moisture: MoistureCurve::default(),
            modifiers: vec![],
            split,
            mixing: None,
            photodecomposition: None,
            leaching: None,
        }
    }

    fn with_modifiers(mut self, modifiers: Vec<Arc<dyn RateModifier>>) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Every pool receiving carbon from this kind, including mixing,
    /// photodecomposition and leaching targets.
    pub fn destinations(&self) -> Vec<PoolId> {
        let mut targets = self.split.targets();
        if let Some(mixing) = &self.mixing {
            targets.push(mixing.target);
        }
        if let Some(photo) = &self.photodecomposition {
            targets.push(photo.target);
        }
        if self.leaching.is_some() {
            targets.push(PoolId::Leachate);
        }
        targets.sort();
        targets.dedup();
        targets
    }

    /// Checks the record for use by `pool`.
    pub fn validate(&self, pool: PoolId) -> SomResult<()> {
        if !self.rate_constant.is_finite() || self.rate_constant < 0.0 {
            return Err(SomError::Configuration(format!(
                "{}: rate constant must be non-negative, got {}",
                pool, self.rate_constant
            )));
        }
        if self.destinations().contains(&pool) {
            return Err(SomError::Configuration(format!(
                "{} cannot transfer carbon to itself",
                pool
            )));
        }
        if let Some(target) = self.leaching {
            if !self.split.targets().contains(&target) {
                return Err(SomError::Configuration(format!(
                    "{}: leaching source {} is not a split destination",
                    pool, target
                )));
            }
        }
        if let Some(mixing) = &self.mixing {
            if !mixing.rate_constant.is_finite() || mixing.rate_constant < 0.0 {
                return Err(SomError::Configuration(format!(
                    "{}: mixing rate must be non-negative",
                    pool
                )));
            }
        }
        if let Some(photo) = &self.photodecomposition {
            if photo.max_rate < 0.0 || !(0.0..=1.0).contains(&photo.respiration_fraction) {
                return Err(SomError::Configuration(format!(
                    "{}: invalid photodecomposition parameters",
                    pool
                )));
            }
        }
        Ok(())
    }
}

fn surface_radiation() -> Arc<dyn RateModifier> {
    Arc::new(RadiationResponse {
        index: RadiationIndex {
            low: 0.6,
            high: 1.0,
            x1: 150.0,
            x2: 450.0,
        },
    })
}

fn ph() -> Arc<dyn RateModifier> {
    Arc::new(PhResponse::default())
}

fn anaerobic() -> Arc<dyn RateModifier> {
    Arc::new(AnaerobicResponse::default())
}

fn lignin(pligst: FloatValue) -> Arc<dyn RateModifier> {
    Arc::new(LigninResponse { pligst })
}

fn lignin_split(slow: PoolId, active: PoolId, active_respiration: FloatValue) -> SplitRule {
    SplitRule::Lignin {
        lignin: Destination::new(slow, RESP_LIGNIN),
        remainder: Destination::new(active, active_respiration),
    }
}

/// Decomposition parameters for every decomposing pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecompositionParameters {
    pub fine_branch: PoolKindParameters,
    pub large_wood: PoolKindParameters,
    pub coarse_root: PoolKindParameters,
    pub structural_surface: PoolKindParameters,
    pub structural_soil: PoolKindParameters,
    pub metabolic_surface: PoolKindParameters,
    pub metabolic_soil: PoolKindParameters,
    pub active_surface: PoolKindParameters,
    pub active_soil: PoolKindParameters,
    pub slow_surface: PoolKindParameters,
    pub slow_soil: PoolKindParameters,
    pub passive: PoolKindParameters,
}

impl Default for DecompositionParameters {
    fn default() -> Self {
        use PoolId::*;

        let mut structural_surface = PoolKindParameters::new(
            3.9,
            Layer::Surface,
            lignin_split(SlowSurface, ActiveSurface, 0.45),
        )
        .with_modifiers(vec![lignin(PLIGST_SURFACE), surface_radiation()]);
        structural_surface.photodecomposition = Some(PhotodecompositionParameters::default());

        let mut active_surface = PoolKindParameters::new(
            6.0,
            Layer::Surface,
            SplitRule::single(SlowSurface, 0.6),
        )
        .with_modifiers(vec![surface_radiation()]);
        active_surface.mixing = Some(MixingRule {
            target: ActiveSoil,
            rate_constant: 0.5,
            index: RadiationIndex {
                low: 0.5,
                high: 1.0,
                x1: 100.0,
                x2: 400.0,
            },
        });

        let mut active_soil = PoolKindParameters::new(
            7.3,
            Layer::Soil,
            SplitRule::Fractions {
                splits: vec![Split {
                    target: Passive,
                    fraction: Share {
                        intercept: 0.003,
                        sand: 0.0,
                        clay: 0.032,
                    },
                    respiration: Share::constant(0.0),
                }],
                remainder: Destination {
                    target: SlowSoil,
                    respiration: Share {
                        intercept: 0.17,
                        sand: 0.68,
                        clay: 0.0,
                    },
                },
            },
        )
        .with_modifiers(vec![
            Arc::new(TextureResponse {
                intercept: 0.25,
                sand_slope: 0.75,
            }),
            ph(),
            anaerobic(),
        ]);
        active_soil.leaching = Some(SlowSoil);

        Self {
            fine_branch: PoolKindParameters::new(
                1.5,
                Layer::Surface,
                lignin_split(SlowSurface, ActiveSurface, 0.45),
            )
            .with_modifiers(vec![lignin(PLIGST_SURFACE)]),
            large_wood: PoolKindParameters::new(
                0.5,
                Layer::Surface,
                lignin_split(SlowSurface, ActiveSurface, 0.45),
            )
            .with_modifiers(vec![lignin(PLIGST_SURFACE)]),
            coarse_root: PoolKindParameters::new(
                0.6,
                Layer::Soil,
                lignin_split(SlowSoil, ActiveSoil, 0.55),
            )
            .with_modifiers(vec![lignin(PLIGST_SOIL), anaerobic()]),
            structural_surface,
            structural_soil: PoolKindParameters::new(
                4.9,
                Layer::Soil,
                lignin_split(SlowSoil, ActiveSoil, 0.55),
            )
            .with_modifiers(vec![lignin(PLIGST_SOIL), ph(), anaerobic()]),
            metabolic_surface: PoolKindParameters::new(
                14.8,
                Layer::Surface,
                SplitRule::single(ActiveSurface, 0.55),
            )
            .with_modifiers(vec![surface_radiation()]),
            metabolic_soil: PoolKindParameters::new(
                18.5,
                Layer::Soil,
                SplitRule::single(ActiveSoil, 0.55),
            )
            .with_modifiers(vec![ph(), anaerobic()]),
            active_surface,
            active_soil,
            slow_surface: PoolKindParameters::new(
                0.2,
                Layer::Surface,
                SplitRule::single(ActiveSurface, 0.55),
            )
            .with_modifiers(vec![surface_radiation()]),
            slow_soil: PoolKindParameters::new(
                0.2,
                Layer::Soil,
                SplitRule::Fractions {
                    splits: vec![Split {
                        target: Passive,
                        fraction: Share {
                            intercept: 0.003,
                            sand: 0.0,
                            clay: 0.009,
                        },
                        respiration: Share::constant(0.0),
                    }],
                    remainder: Destination::new(ActiveSoil, 0.55),
                },
            )
            .with_modifiers(vec![ph(), anaerobic()]),
            passive: PoolKindParameters::new(
                0.0045,
                Layer::Soil,
                SplitRule::single(ActiveSoil, 0.55),
            )
            .with_modifiers(vec![ph(), anaerobic()]),
        }
    }
}

impl DecompositionParameters {
    /// Parameters of `pool`, or `None` for pools that never decompose.
    pub fn get(&self, pool: PoolId) -> Option<&PoolKindParameters> {
        match pool {
            PoolId::FineBranch => Some(&self.fine_branch),
            PoolId::LargeWood => Some(&self.large_wood),
            PoolId::CoarseRoot => Some(&self.coarse_root),
            PoolId::StructuralSurface => Some(&self.structural_surface),
            PoolId::StructuralSoil => Some(&self.structural_soil),
            PoolId::MetabolicSurface => Some(&self.metabolic_surface),
            PoolId::MetabolicSoil => Some(&self.metabolic_soil),
            PoolId::ActiveSurface => Some(&self.active_surface),
            PoolId::ActiveSoil => Some(&self.active_soil),
            PoolId::SlowSurface => Some(&self.slow_surface),
            PoolId::SlowSoil => Some(&self.slow_soil),
            PoolId::Passive => Some(&self.passive),
            PoolId::Leachate => None,
        }
    }

    pub fn get_mut(&mut self, pool: PoolId) -> Option<&mut PoolKindParameters> {
        match pool {
            PoolId::FineBranch => Some(&mut self.fine_branch),
            PoolId::LargeWood => Some(&mut self.large_wood),
            PoolId::CoarseRoot => Some(&mut self.coarse_root),
            PoolId::StructuralSurface => Some(&mut self.structural_surface),
            PoolId::StructuralSoil => Some(&mut self.structural_soil),
            PoolId::MetabolicSurface => Some(&mut self.metabolic_surface),
            PoolId::MetabolicSoil => Some(&mut self.metabolic_soil),
            PoolId::ActiveSurface => Some(&mut self.active_surface),
            PoolId::ActiveSoil => Some(&mut self.active_soil),
            PoolId::SlowSurface => Some(&mut self.slow_surface),
            PoolId::SlowSoil => Some(&mut self.slow_soil),
            PoolId::Passive => Some(&mut self.passive),
            PoolId::Leachate => None,
        }
    }

    /// Every decomposing pool with its parameters, in [`PoolId`] order.
    pub fn iter(&self) -> impl Iterator<Item = (PoolId, &PoolKindParameters)> {
        PoolId::ALL
            .iter()
            .filter_map(move |id| self.get(*id).map(|p| (*id, p)))
    }
}

//! Carbon and nutrient records and the mass-weighted merges between them.
//!
//! Every merge of material into a pool goes through [`carbon_weighted_average`]:
//! isotope ratios and carbon-to-element ratios of the receiving pool become the
//! carbon-mass-weighted average of the pool value before the merge and the
//! incoming value.

use crate::element::Element;
use crate::errors::{SomError, SomResult};
use crate::FloatValue;
use serde::{Deserialize, Serialize};

/// Carbon held in a pool or carried by a flow.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Carbon {
    /// Mass of carbon
    /// unit: g C / m^2
    pub total_c: FloatValue,
    /// Conserved tracer ratio (labelled:unlabelled carbon)
    /// unit: dimensionless
    pub isotope_ratio: FloatValue,
}

impl Carbon {
    pub fn new(total_c: FloatValue, isotope_ratio: FloatValue) -> Self {
        Self {
            total_c,
            isotope_ratio,
        }
    }
}

/// Carbon-to-element mass ratios of a pool or flow.
///
/// Smaller ratios mean more nutrient-rich material.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Nutrient {
    pub c_to_n: FloatValue,
    pub c_to_p: FloatValue,
    pub c_to_s: FloatValue,
    pub c_to_k: FloatValue,
}

impl Nutrient {
    pub fn new(
        c_to_n: FloatValue,
        c_to_p: FloatValue,
        c_to_s: FloatValue,
        c_to_k: FloatValue,
    ) -> Self {
        Self {
            c_to_n,
            c_to_p,
            c_to_s,
            c_to_k,
        }
    }

    /// The same ratio for every element.
    pub fn uniform(ratio: FloatValue) -> Self {
        Self::new(ratio, ratio, ratio, ratio)
    }

    pub fn ratio(&self, element: Element) -> FloatValue {
        match element {
            Element::N => self.c_to_n,
            Element::P => self.c_to_p,
            Element::S => self.c_to_s,
            Element::K => self.c_to_k,
        }
    }

    pub fn set_ratio(&mut self, element: Element, ratio: FloatValue) {
        match element {
            Element::N => self.c_to_n = ratio,
            Element::P => self.c_to_p = ratio,
            Element::S => self.c_to_s = ratio,
            Element::K => self.c_to_k = ratio,
        }
    }

    /// Mass of `element` carried by `carbon` grams of this material.
    pub fn element_mass(&self, element: Element, carbon: FloatValue) -> FloatValue {
        let ratio = self.ratio(element);
        if ratio > 0.0 {
            carbon / ratio
        } else {
            0.0
        }
    }

    /// True when every ratio is finite and strictly positive.
    pub fn is_valid(&self) -> bool {
        Element::ALL
            .iter()
            .all(|e| self.ratio(*e).is_finite() && self.ratio(*e) > 0.0)
    }
}

impl Default for Nutrient {
    fn default() -> Self {
        Self::new(10.0, 100.0, 100.0, 100.0)
    }
}

/// Carbon-mass-weighted average of two values.
///
/// $$\bar{v} = \frac{m_0 v_0 + m_1 v_1}{m_0 + m_1}$$
///
/// # Arguments
///
/// * `existing_mass` - Carbon mass already present
/// * `existing_value` - Value attached to the existing mass
/// * `incoming_mass` - Carbon mass being added
/// * `incoming_value` - Value attached to the incoming mass
///
/// # Errors
///
/// [`SomError::DivideByZero`] when both masses sum to zero.
pub fn carbon_weighted_average(
    existing_mass: FloatValue,
    existing_value: FloatValue,
    incoming_mass: FloatValue,
    incoming_value: FloatValue,
) -> SomResult<FloatValue> {
    let total = existing_mass + incoming_mass;
    if total == 0.0 {
        return Err(SomError::DivideByZero("carbon_weighted_average"));
    }
    // exact when one side carries no mass
    if incoming_mass == 0.0 {
        return Ok(existing_value);
    }
    if existing_mass == 0.0 {
        return Ok(incoming_value);
    }
    Ok((existing_mass * existing_value + incoming_mass * incoming_value) / total)
}

/// Merge one carbon-to-element ratio of a flow into a pool.
///
/// `pool_carbon_before_flow` must be the pool carbon before the flow's carbon
/// is added.
pub fn update_nutrient_ratio(
    pool_carbon_before_flow: FloatValue,
    pool_ratio: FloatValue,
    flow_carbon: FloatValue,
    flow_ratio: FloatValue,
) -> SomResult<FloatValue> {
    carbon_weighted_average(pool_carbon_before_flow, pool_ratio, flow_carbon, flow_ratio)
}

/// Merge every element ratio of a flow into a pool's nutrient record.
///
/// A merge where both masses are zero leaves the record unchanged.
pub fn merge_nutrient(
    pool_carbon_before_flow: FloatValue,
    pool: &mut Nutrient,
    flow_carbon: FloatValue,
    flow: &Nutrient,
) -> SomResult<()> {
    if pool_carbon_before_flow + flow_carbon == 0.0 {
        return Ok(());
    }
    for element in Element::ALL {
        let merged = update_nutrient_ratio(
            pool_carbon_before_flow,
            pool.ratio(element),
            flow_carbon,
            flow.ratio(element),
        )?;
        pool.set_ratio(element, merged);
    }
    Ok(())
}

/// Add a flow's carbon to a pool's carbon record.
///
/// The isotope ratio is averaged against `pool_carbon_before_flow`, which the
/// caller passes explicitly so that an already-updated total can never be
/// read by mistake. The flow carbon is then added to the pool total.
pub fn update_carbon_record(
    pool: &mut Carbon,
    pool_carbon_before_flow: FloatValue,
    flow: &Carbon,
) -> SomResult<()> {
    if pool_carbon_before_flow + flow.total_c != 0.0 {
        pool.isotope_ratio = carbon_weighted_average(
            pool_carbon_before_flow,
            pool.isotope_ratio,
            flow.total_c,
            flow.isotope_ratio,
        )?;
    }
    pool.total_c = pool_carbon_before_flow + flow.total_c;
    Ok(())
}

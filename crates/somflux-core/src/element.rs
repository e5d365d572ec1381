//! Nutrient elements tracked alongside carbon.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A nutrient element that is tracked as a carbon-to-element ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Element {
    N,
    P,
    S,
    K,
}

impl Element {
    /// All tracked elements, in record order.
    pub const ALL: [Element; 4] = [Element::N, Element::P, Element::S, Element::K];

    /// Position of the element within per-element arrays.
    pub fn index(self) -> usize {
        match self {
            Element::N => 0,
            Element::P => 1,
            Element::S => 2,
            Element::K => 3,
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Element::N => "nitrogen",
            Element::P => "phosphorus",
            Element::S => "sulfur",
            Element::K => "potassium",
        };
        write!(f, "{}", name)
    }
}

/// One value per tracked element.
///
/// Used for ambient mineral levels, net mineralization totals and any other
/// quantity that is carried independently for N, P, S and K.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PerElement {
    pub n: f64,
    pub p: f64,
    pub s: f64,
    pub k: f64,
}

impl PerElement {
    pub fn new(n: f64, p: f64, s: f64, k: f64) -> Self {
        Self { n, p, s, k }
    }

    pub fn get(&self, element: Element) -> f64 {
        match element {
            Element::N => self.n,
            Element::P => self.p,
            Element::S => self.s,
            Element::K => self.k,
        }
    }

    pub fn get_mut(&mut self, element: Element) -> &mut f64 {
        match element {
            Element::N => &mut self.n,
            Element::P => &mut self.p,
            Element::S => &mut self.s,
            Element::K => &mut self.k,
        }
    }
}

use crate::element::Element;
use thiserror::Error;

/// Error type for invalid operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SomError {
    #[error("{0}")]
    Error(String),
    #[error("Mass balance violated for pool {pool}: |outflow|={outflow}, transfers+respiration={accounted}")]
    InvariantViolation {
        pool: String,
        outflow: f64,
        accounted: f64,
    },
    #[error("Invalid configuration: {0}")]
    Configuration(String),
    #[error("Decomposition timestep must be within (0, 365] days, got {0}")]
    InvalidTimestep(f64),
    #[error("Decomposition gating on {0} is not implemented; only nitrogen gating is supported")]
    UnsupportedGatingNutrient(Element),
    #[error("Division by zero in {0}")]
    DivideByZero(&'static str),
}

/// Convenience type for `Result<T, SomError>`.
pub type SomResult<T> = Result<T, SomError>;

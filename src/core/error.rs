use thiserror::Error;

/// Errors raised while constructing knot vectors, bases and derivative functions.
///
/// Evaluation itself never fails: zero denominators in the recursions and sites
/// outside the knot domain are defined conventions, not errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("At least {needed} {what} are required, but {got} were given.")]
    TooFewPoints {
        what: &'static str,
        needed: usize,
        got: usize,
    },

    #[error("{what} must be strictly increasing, but entry {index} ({next}) does not exceed the previous entry ({prev}).")]
    NotStrictlyIncreasing {
        what: &'static str,
        index: usize,
        prev: f64,
        next: f64,
    },

    #[error("{what} must be non-decreasing, but entry {index} ({next}) is less than the previous entry ({prev}).")]
    Decreasing {
        what: &'static str,
        index: usize,
        prev: f64,
        next: f64,
    },

    #[error("Entry {index} is not a finite number ({value}).")]
    NonFiniteValue { index: usize, value: f64 },

    #[error("A basis of order {order} needs at least {needed} knots, but the knot vector has {len}.")]
    TooFewKnots {
        order: usize,
        needed: usize,
        len: usize,
    },

    #[error("Derivative order ({requested}) must not exceed the spline order ({order}).")]
    DerivativeOrderTooHigh { requested: usize, order: usize },

    #[error("Running average window must contain at least one element.")]
    EmptyAveragingWindow,

    #[error("Repeated site {site} asks for derivative order {requested}, which exceeds the spline order ({order}).")]
    MultiplicityTooHigh {
        site: f64,
        requested: usize,
        order: usize,
    },
}

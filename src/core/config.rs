use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::core::basis::BsplineBasis;
use crate::core::error::DomainError;
use crate::core::knots::{averaged_knots, clamp_ends, KnotVector};

/// How raw points are turned into a knot vector.
/// This is part of the public API and may be stored in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnotStrategy {
    /// The points are breakpoints; both ends are clamped with `order + 1` copies.
    #[default]
    ClampedBreakpoints,
    /// The points are collocation sites; interior knots are running averages of
    /// the sites, which makes interpolation at those sites well posed.
    AveragedSites,
}

/// A serializable description of a B-spline basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasisConfig {
    /// Polynomial degree of the basis (3 = cubic).
    pub order: usize,
    #[serde(default)]
    pub strategy: KnotStrategy,
}

impl BasisConfig {
    pub fn new(order: usize, strategy: KnotStrategy) -> Self {
        BasisConfig { order, strategy }
    }

    /// Builds the knot vector for `points` according to the strategy.
    pub fn knots(&self, points: &Array1<f64>) -> Result<KnotVector, DomainError> {
        match self.strategy {
            KnotStrategy::ClampedBreakpoints => clamp_ends(points, self.order),
            KnotStrategy::AveragedSites => averaged_knots(points, self.order),
        }
    }

    /// Builds the basis described by this configuration over `points`.
    pub fn build(&self, points: &Array1<f64>) -> Result<BsplineBasis, DomainError> {
        BsplineBasis::new(self.knots(points)?, self.order)
    }
}

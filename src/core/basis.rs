use std::sync::Arc;

use log::debug;
use ndarray::{Array1, Array2};

use crate::core::collocation;
use crate::core::derivatives::DerivativeFunction;
use crate::core::error::DomainError;
use crate::core::knots::KnotVector;
use crate::core::splines::{
    ensure_enough_knots, evaluate_basis, evaluate_basis_into, num_basis_functions, BasisWorkspace,
};

/// A B-spline basis: a knot vector together with a spline order.
///
/// The basis is immutable; every query is a pure function of the knots and
/// the order. The knot vector is held behind an `Arc` and handed to every
/// [`DerivativeFunction`] built from this basis.
#[derive(Debug, Clone, PartialEq)]
pub struct BsplineBasis {
    knots: Arc<KnotVector>,
    order: usize,
}

impl BsplineBasis {
    /// Creates the basis of order `order` on `knots`.
    ///
    /// # Errors
    /// `TooFewKnots` unless `knots.len() >= 2 * (order + 1)`.
    pub fn new(knots: KnotVector, order: usize) -> Result<Self, DomainError> {
        Self::from_shared(Arc::new(knots), order)
    }

    /// Like [`BsplineBasis::new`], reusing an already shared knot vector.
    pub fn from_shared(knots: Arc<KnotVector>, order: usize) -> Result<Self, DomainError> {
        ensure_enough_knots(&knots, order)?;
        debug!(
            "order-{} basis on [{}, {}]: {} knots, {} basis functions",
            order,
            knots.first(),
            knots.last(),
            knots.len(),
            num_basis_functions(&knots, order)
        );
        Ok(BsplineBasis { knots, order })
    }

    pub fn knots(&self) -> &KnotVector {
        &self.knots
    }

    pub fn shared_knots(&self) -> Arc<KnotVector> {
        Arc::clone(&self.knots)
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// Number of basis functions, `m - p - 1`.
    pub fn num_basis(&self) -> usize {
        num_basis_functions(&self.knots, self.order)
    }

    /// The interval `[t_p, t_{m-p-1}]` on which the basis is a partition of unity.
    pub fn domain(&self) -> (f64, f64) {
        let m = self.knots.len();
        (self.knots[self.order], self.knots[m - self.order - 1])
    }

    /// Values of all basis functions at `x`.
    pub fn evaluate(&self, x: f64) -> Array1<f64> {
        evaluate_basis(&self.knots, self.order, x)
    }

    /// Values of all basis functions at `x`, written into `out` using caller-owned scratch.
    pub fn evaluate_into(&self, x: f64, workspace: &mut BasisWorkspace, out: &mut [f64]) {
        evaluate_basis_into(&self.knots, self.order, x, workspace, out)
    }

    /// Builds a reusable function returning the `derivative_order`-th derivative
    /// of every basis function.
    ///
    /// # Errors
    /// `DerivativeOrderTooHigh` if `derivative_order > order`.
    pub fn derivative(&self, derivative_order: usize) -> Result<DerivativeFunction, DomainError> {
        DerivativeFunction::new(self.shared_knots(), self.order, derivative_order)
    }

    /// Shorthand for `derivative(1)`.
    ///
    /// # Errors
    /// `DerivativeOrderTooHigh` for an order-0 basis.
    pub fn first_derivative(&self) -> Result<DerivativeFunction, DomainError> {
        self.derivative(1)
    }

    /// Collocation matrix of the `derivative_order`-th derivative at `sites`,
    /// see [`collocation::collocation_matrix`].
    pub fn collocation_matrix(
        &self,
        sites: &Array1<f64>,
        derivative_order: usize,
    ) -> Result<Array2<f64>, DomainError> {
        collocation::collocation_matrix(self, sites, derivative_order)
    }

    /// Collocation matrix where repeated sites select higher derivatives,
    /// see [`collocation::osculatory_collocation_matrix`].
    pub fn osculatory_collocation_matrix(
        &self,
        sites: &Array1<f64>,
    ) -> Result<Array2<f64>, DomainError> {
        collocation::osculatory_collocation_matrix(self, sites)
    }

    /// Row-parallel [`BsplineBasis::collocation_matrix`].
    #[cfg(feature = "rayon")]
    pub fn par_collocation_matrix(
        &self,
        sites: &Array1<f64>,
        derivative_order: usize,
    ) -> Result<Array2<f64>, DomainError> {
        collocation::par_collocation_matrix(self, sites, derivative_order)
    }
}

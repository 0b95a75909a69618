//! B-spline basis functions over arbitrary knot vectors.
//!
//! Knot vectors are built with [`clamp_ends`] or [`averaged_knots`], wrapped
//! in a [`BsplineBasis`], and evaluated pointwise, as reusable
//! [`DerivativeFunction`]s, or as collocation matrices.
//!
//! ```
//! use bspline_rs::{clamp_ends, BsplineBasis};
//! use ndarray::arr1;
//!
//! let knots = clamp_ends(&arr1(&[0.0, 1.0]), 3).unwrap();
//! let basis = BsplineBasis::new(knots, 3).unwrap();
//! assert_eq!(basis.evaluate(0.0).to_vec(), vec![1.0, 0.0, 0.0, 0.0]);
//!
//! let slopes = basis.collocation_matrix(&arr1(&[0.0, 1.0]), 1).unwrap();
//! assert_eq!(slopes.shape(), &[2, 4]);
//! ```

pub mod core;

pub use crate::core::basis::BsplineBasis;
pub use crate::core::collocation::{collocation_matrix, osculatory_collocation_matrix};
#[cfg(feature = "rayon")]
pub use crate::core::collocation::par_collocation_matrix;
pub use crate::core::config::{BasisConfig, KnotStrategy};
pub use crate::core::derivatives::DerivativeFunction;
pub use crate::core::error::DomainError;
pub use crate::core::knots::{
    averaged_knots, clamp_ends, knot_multiplicities, running_average, KnotVector,
};
pub use crate::core::splines::{evaluate_basis, evaluate_basis_into, BasisWorkspace};

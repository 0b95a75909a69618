//! Collocation matrices: basis (or derivative) values stacked row by row over a set of sites.

use log::trace;
use ndarray::{Array1, Array2, ArrayView1};

use crate::core::basis::BsplineBasis;
use crate::core::derivatives::DerivativeFunction;
use crate::core::error::DomainError;
use crate::core::knots::knot_multiplicities;
use crate::core::splines::BasisWorkspace;

/// Builds the collocation matrix `A[i, j] = D^d B_j(sites[i])`.
///
/// Sites are used verbatim: no sorting, no deduplication. A site outside the
/// knot domain gives a row of zeros.
///
/// # Arguments
/// * `basis` - The B-spline basis.
/// * `sites` - Evaluation sites, in the order the rows should appear.
/// * `derivative_order` - `d`; 0 for plain basis values.
///
/// # Returns
/// An `Array2<f64>` of shape `[sites.len(), basis.num_basis()]`, or
/// `DerivativeOrderTooHigh` if `d` exceeds the spline order.
pub fn collocation_matrix(
    basis: &BsplineBasis,
    sites: &Array1<f64>,
    derivative_order: usize,
) -> Result<Array2<f64>, DomainError> {
    let function = basis.derivative(derivative_order)?;
    trace!(
        "collocating derivative {} at {} sites, {} columns",
        derivative_order,
        sites.len(),
        function.num_basis()
    );

    let mut matrix = Array2::zeros((sites.len(), function.num_basis()));
    let mut workspace = BasisWorkspace::with_capacity(basis.knots().len());
    let mut row_values = vec![0.0; function.num_basis()];

    for (i, &x) in sites.iter().enumerate() {
        function.evaluate_into(x, &mut workspace, &mut row_values);
        matrix.row_mut(i).assign(&ArrayView1::from(&row_values[..]));
    }

    Ok(matrix)
}

/// Builds a collocation matrix where repeated sites ask for derivatives.
///
/// The `k`-th repeat of a site (counting from 0) produces the `k`-th
/// derivative row at that site, so `sites = [0, 0, 1]` yields the value and
/// the slope at 0 followed by the value at 1. This is the matrix of Hermite
/// (osculatory) interpolation.
///
/// # Errors
/// * `Decreasing` if the sites are not sorted,
/// * `MultiplicityTooHigh` if a site is repeated more than `order + 1` times.
pub fn osculatory_collocation_matrix(
    basis: &BsplineBasis,
    sites: &Array1<f64>,
) -> Result<Array2<f64>, DomainError> {
    let multiplicities = knot_multiplicities(sites)?;
    if let Some(i) = multiplicities.iter().position(|&d| d > basis.order()) {
        return Err(DomainError::MultiplicityTooHigh {
            site: sites[i],
            requested: multiplicities[i],
            order: basis.order(),
        });
    }

    let highest = multiplicities.iter().copied().max().unwrap_or(0);
    let functions = (0..=highest)
        .map(|d| basis.derivative(d))
        .collect::<Result<Vec<DerivativeFunction>, DomainError>>()?;
    trace!(
        "osculatory collocation at {} sites, derivatives up to {}",
        sites.len(),
        highest
    );

    let mut matrix = Array2::zeros((sites.len(), basis.num_basis()));
    let mut workspace = BasisWorkspace::with_capacity(basis.knots().len());
    let mut row_values = vec![0.0; basis.num_basis()];

    for (i, (&x, &d)) in sites.iter().zip(multiplicities.iter()).enumerate() {
        functions[d].evaluate_into(x, &mut workspace, &mut row_values);
        matrix.row_mut(i).assign(&ArrayView1::from(&row_values[..]));
    }

    Ok(matrix)
}

/// [`collocation_matrix`] with rows evaluated in parallel.
///
/// Produces the same matrix; each row only reads the shared derivative
/// function, and each worker evaluates with its own scratch.
#[cfg(feature = "rayon")]
pub fn par_collocation_matrix(
    basis: &BsplineBasis,
    sites: &Array1<f64>,
    derivative_order: usize,
) -> Result<Array2<f64>, DomainError> {
    use ndarray::Zip;

    let function = basis.derivative(derivative_order)?;
    let mut matrix = Array2::zeros((sites.len(), function.num_basis()));

    Zip::from(matrix.rows_mut())
        .and(sites)
        .par_for_each(|mut row, &x| row.assign(&function.evaluate(x)));

    Ok(matrix)
}

use ndarray::Array1;

use crate::core::error::DomainError;
use crate::core::knots::KnotVector;

/// Reusable scratch memory for the Cox-de Boor recursion.
///
/// Evaluators never own one of these; the caller keeps a workspace per thread
/// and hands it in, so the same basis can be evaluated concurrently.
#[derive(Debug, Clone, Default)]
pub struct BasisWorkspace {
    pub(crate) current: Vec<f64>,
    pub(crate) next: Vec<f64>,
}

impl BasisWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-sizes the buffers for a knot vector of `num_knots` knots.
    pub fn with_capacity(num_knots: usize) -> Self {
        BasisWorkspace {
            current: Vec::with_capacity(num_knots),
            next: Vec::with_capacity(num_knots),
        }
    }
}

/// Number of order-`order` basis functions defined on `knots`, or 0 if there are too few knots.
pub fn num_basis_functions(knots: &KnotVector, order: usize) -> usize {
    knots.len().saturating_sub(order + 1)
}

/// Checks that `knots` can carry a basis of order `order`.
///
/// Both ends need `order + 1` knots, so at least `2 * (order + 1)` knots are
/// required, which also guarantees `nbasis >= order + 1`.
pub fn ensure_enough_knots(knots: &KnotVector, order: usize) -> Result<(), DomainError> {
    let needed = 2 * (order + 1);
    if knots.len() < needed {
        return Err(DomainError::TooFewKnots {
            order,
            needed,
            len: knots.len(),
        });
    }
    Ok(())
}

/// Evaluates all order-`order` B-spline basis functions at `x`.
///
/// Convenience wrapper around [`evaluate_basis_into`] that allocates its own
/// workspace and output.
///
/// # Returns
/// An array of length `knots.len() - order - 1`. All zeros if `x` lies outside
/// `[t_0, t_{m-1}]`.
pub fn evaluate_basis(knots: &KnotVector, order: usize, x: f64) -> Array1<f64> {
    let mut out = Array1::zeros(num_basis_functions(knots, order));
    let mut workspace = BasisWorkspace::with_capacity(knots.len());
    if let Some(slice) = out.as_slice_mut() {
        evaluate_basis_into(knots, order, x, &mut workspace, slice);
    }
    out
}

/// Evaluates all order-`order` basis functions at `x` into `out`.
///
/// Order 0 is the indicator of the half-open interval `[t_i, t_{i+1})`;
/// degenerate intervals are always 0. A site equal to the last knot falls in the
/// last non-degenerate interval, closed on the right, so evaluating at the right
/// end of the domain gives the limit from the left.
///
/// Each higher order `r` blends two neighbours of order `r - 1`:
///
/// `B_{i,r}(x) = (x - t_i) / (t_{i+r} - t_i) * B_{i,r-1}(x) + (t_{i+r+1} - x) / (t_{i+r+1} - t_{i+1}) * B_{i+1,r-1}(x)`
///
/// where a term with a zero denominator contributes 0.
///
/// `out.len()` must equal [`num_basis_functions`]; with fewer than `order + 2`
/// knots there is nothing to write.
pub fn evaluate_basis_into(
    knots: &KnotVector,
    order: usize,
    x: f64,
    workspace: &mut BasisWorkspace,
    out: &mut [f64],
) {
    debug_assert_eq!(out.len(), num_basis_functions(knots, order));
    if out.is_empty() {
        return;
    }
    fill_basis(knots, order, x, workspace);
    out.copy_from_slice(&workspace.current);
}

/// Runs the recursion up to `order`, leaving the `m - order - 1` values in `workspace.current`.
///
/// Callers guarantee `knots.len() >= order + 2`.
pub(crate) fn fill_basis(knots: &KnotVector, order: usize, x: f64, workspace: &mut BasisWorkspace) {
    let m = knots.len();
    let (first, last) = knots.domain();
    if !(x >= first && x <= last) {
        // Outside the domain (or NaN): every basis function vanishes.
        workspace.current.clear();
        workspace.current.resize(m - order - 1, 0.0);
        return;
    }

    order_zero_into(knots, x, &mut workspace.current);

    for r in 1..=order {
        let width = m - r - 1;
        let prev = &workspace.current;
        let next = &mut workspace.next;
        next.clear();
        next.extend((0..width).map(|i| {
            let left = blend_weight(x - knots[i], knots[i + r] - knots[i]);
            let right = blend_weight(knots[i + r + 1] - x, knots[i + r + 1] - knots[i + 1]);
            left * prev[i] + right * prev[i + 1]
        }));
        std::mem::swap(&mut workspace.current, &mut workspace.next);
    }
}

/// Fills `buf` with the `m - 1` order-0 basis values at `x`.
fn order_zero_into(knots: &KnotVector, x: f64, buf: &mut Vec<f64>) {
    let m = knots.len();
    buf.clear();
    buf.extend((0..m - 1).map(|i| {
        if knots[i] <= x && x < knots[i + 1] {
            1.0
        } else {
            0.0
        }
    }));

    if x == knots.last() {
        if let Some(j) = knots.last_nondegenerate_interval() {
            buf[j] = 1.0;
        }
    }
}

/// `numerator / denominator`, or 0 when the denominator vanishes (repeated knot).
#[inline]
pub(crate) fn blend_weight(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

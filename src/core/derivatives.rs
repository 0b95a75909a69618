use std::sync::Arc;

use log::debug;
use ndarray::Array1;

use crate::core::error::DomainError;
use crate::core::knots::KnotVector;
use crate::core::splines::{
    blend_weight, ensure_enough_knots, fill_basis, num_basis_functions, BasisWorkspace,
};

/// Coefficients turning order `order - 1` basis values into derivatives at order `order`.
///
/// `B'_{i,q}(x) = left[i] * B_{i,q-1}(x) - right[i] * B_{i+1,q-1}(x)` with
/// `left[i] = q / (t_{i+q} - t_i)` and `right[i] = q / (t_{i+q+1} - t_{i+1})`,
/// a zero denominator giving a zero coefficient.
#[derive(Debug, Clone, PartialEq)]
struct DifferenceLevel {
    left: Vec<f64>,
    right: Vec<f64>,
}

impl DifferenceLevel {
    fn new(knots: &KnotVector, order: usize) -> Self {
        let q = order as f64;
        let width = num_basis_functions(knots, order);
        let left = (0..width)
            .map(|i| blend_weight(q, knots[i + order] - knots[i]))
            .collect();
        let right = (0..width)
            .map(|i| blend_weight(q, knots[i + order + 1] - knots[i + 1]))
            .collect();
        DifferenceLevel { left, right }
    }

    fn apply(&self, prev: &[f64], next: &mut Vec<f64>) {
        debug_assert_eq!(prev.len(), self.left.len() + 1);
        next.clear();
        next.extend(
            self.left
                .iter()
                .zip(&self.right)
                .enumerate()
                .map(|(i, (l, r))| l * prev[i] - r * prev[i + 1]),
        );
    }
}

/// Evaluates the `d`-th derivative of every basis function of order `p`.
///
/// The difference coefficients for orders `p - d + 1 ..= p` are computed once
/// at construction; each evaluation then runs Cox-de Boor up to order `p - d`
/// and applies the `d` difference levels. The knot vector is shared, so a
/// derivative function outlives the basis it came from and can be cloned and
/// sent across threads freely.
#[derive(Debug, Clone)]
pub struct DerivativeFunction {
    knots: Arc<KnotVector>,
    order: usize,
    derivative_order: usize,
    levels: Vec<DifferenceLevel>,
}

impl DerivativeFunction {
    /// Prepares the `derivative_order`-th derivative of the order-`order` basis on `knots`.
    ///
    /// `derivative_order == 0` gives plain basis evaluation. `derivative_order == order`
    /// is allowed and yields piecewise constant values.
    ///
    /// # Errors
    /// * `DerivativeOrderTooHigh` if `derivative_order > order`,
    /// * `TooFewKnots` if `knots` cannot carry a basis of this order.
    pub fn new(
        knots: Arc<KnotVector>,
        order: usize,
        derivative_order: usize,
    ) -> Result<Self, DomainError> {
        if derivative_order > order {
            return Err(DomainError::DerivativeOrderTooHigh {
                requested: derivative_order,
                order,
            });
        }
        ensure_enough_knots(&knots, order)?;

        let levels: Vec<DifferenceLevel> = (order - derivative_order + 1..=order)
            .map(|q| DifferenceLevel::new(&knots, q))
            .collect();

        debug!(
            "derivative {} of order-{} basis on {} knots: {} difference levels",
            derivative_order,
            order,
            knots.len(),
            levels.len()
        );
        Ok(DerivativeFunction {
            knots,
            order,
            derivative_order,
            levels,
        })
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn derivative_order(&self) -> usize {
        self.derivative_order
    }

    pub fn knots(&self) -> &KnotVector {
        &self.knots
    }

    /// Length of every result vector.
    pub fn num_basis(&self) -> usize {
        num_basis_functions(&self.knots, self.order)
    }

    /// Derivative values of all basis functions at `x`.
    pub fn evaluate(&self, x: f64) -> Array1<f64> {
        let mut workspace = BasisWorkspace::with_capacity(self.knots.len());
        let mut out = vec![0.0; self.num_basis()];
        self.evaluate_into(x, &mut workspace, &mut out);
        Array1::from(out)
    }

    /// Writes the derivative values at `x` into `out`, which must have length [`Self::num_basis`].
    pub fn evaluate_into(&self, x: f64, workspace: &mut BasisWorkspace, out: &mut [f64]) {
        debug_assert_eq!(out.len(), self.num_basis());
        let reduced = self.order - self.derivative_order;
        fill_basis(&self.knots, reduced, x, workspace);

        for level in &self.levels {
            level.apply(&workspace.current, &mut workspace.next);
            std::mem::swap(&mut workspace.current, &mut workspace.next);
        }
        out.copy_from_slice(&workspace.current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::splines::evaluate_basis;
    use approx::assert_abs_diff_eq;
    use ndarray::arr1;

    const TOL: f64 = 1e-10;

    fn shared(values: &[f64]) -> Arc<KnotVector> {
        Arc::new(KnotVector::new(arr1(values)).unwrap())
    }

    fn assert_arr_eq(a: &Array1<f64>, b: &[f64]) {
        assert_eq!(a.len(), b.len(), "Array lengths differ.");
        for (i, (val_a, val_b)) in a.iter().zip(b.iter()).enumerate() {
            assert!((val_a - val_b).abs() < TOL, "Mismatch at index {}: {} vs {}", i, val_a, val_b);
        }
    }

    const BEZIER3: [f64; 8] = [0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];

    #[test]
    fn test_zeroth_derivative_is_plain_evaluation() {
        let k = shared(&[0.0, 0.0, 0.0, 0.3, 0.7, 1.0, 1.0, 1.0]);
        let f = DerivativeFunction::new(k.clone(), 2, 0).unwrap();
        for &x in &[0.0, 0.1, 0.3, 0.55, 0.99, 1.0, 1.5] {
            // Bit-for-bit, not just within tolerance.
            assert_eq!(f.evaluate(x), evaluate_basis(&k, 2, x));
        }
    }

    #[test]
    fn test_first_derivative_cubic_bezier() {
        // d/dt of Bernstein cubics:
        // [-3(1-t)^2, 3(1-t)(1-3t), 3t(2-3t), 3t^2]
        let f = DerivativeFunction::new(shared(&BEZIER3), 3, 1).unwrap();
        assert_arr_eq(&f.evaluate(0.0), &[-3.0, 3.0, 0.0, 0.0]);
        assert_arr_eq(&f.evaluate(1.0), &[0.0, 0.0, -3.0, 3.0]);

        let t = 0.25;
        assert_arr_eq(
            &f.evaluate(t),
            &[
                -3.0 * (1.0 - t) * (1.0 - t),
                3.0 * (1.0 - t) * (1.0 - 3.0 * t),
                3.0 * t * (2.0 - 3.0 * t),
                3.0 * t * t,
            ],
        );
    }

    #[test]
    fn test_second_and_third_derivative_cubic_bezier() {
        // Second derivatives: [6(1-t), -6(2-3t), 6(1-3t), 6t]
        let f2 = DerivativeFunction::new(shared(&BEZIER3), 3, 2).unwrap();
        let t = 0.4;
        assert_arr_eq(
            &f2.evaluate(t),
            &[6.0 * (1.0 - t), -6.0 * (2.0 - 3.0 * t), 6.0 * (1.0 - 3.0 * t), 6.0 * t],
        );

        // Third derivative is constant: [-6, 18, -18, 6]
        let f3 = DerivativeFunction::new(shared(&BEZIER3), 3, 3).unwrap();
        for &x in &[0.0, 0.5, 1.0] {
            assert_arr_eq(&f3.evaluate(x), &[-6.0, 18.0, -18.0, 6.0]);
        }
    }

    #[test]
    fn test_derivative_order_above_spline_order_is_rejected() {
        let err = DerivativeFunction::new(shared(&BEZIER3), 3, 4).unwrap_err();
        assert_eq!(err, DomainError::DerivativeOrderTooHigh { requested: 4, order: 3 });
    }

    #[test]
    fn test_too_few_knots_is_rejected() {
        // order 2 needs 6 knots
        let err = DerivativeFunction::new(shared(&[0.0, 0.0, 1.0, 1.0]), 2, 1).unwrap_err();
        assert_eq!(err, DomainError::TooFewKnots { order: 2, needed: 6, len: 4 });
    }

    #[test]
    fn test_derivative_zero_denominator_coefficients() {
        // Interior double knot at 0.5: t = [0,0,0,0.5,0.5,1,1,1], p = 2.
        let k = shared(&[0.0, 0.0, 0.0, 0.5, 0.5, 1.0, 1.0, 1.0]);
        let level = DifferenceLevel::new(&k, 2);
        // left[i] = 2 / (t_{i+2} - t_i), right[i] = 2 / (t_{i+3} - t_{i+1})
        // i=0: t2-t0 = 0 -> 0,      t3-t1 = 0.5 -> 4
        // i=1: t3-t1 = 0.5 -> 4,    t4-t2 = 0.5 -> 4
        // i=2: t4-t2 = 0.5 -> 4,    t5-t3 = 0.5 -> 4
        // i=3: t5-t3 = 0.5 -> 4,    t6-t4 = 0.5 -> 4
        // i=4: t6-t4 = 0.5 -> 4,    t7-t5 = 0   -> 0
        assert_eq!(level.left, vec![0.0, 4.0, 4.0, 4.0, 4.0]);
        assert_eq!(level.right, vec![4.0, 4.0, 4.0, 4.0, 0.0]);
    }

    #[test]
    fn test_derivative_with_interior_double_knot() {
        // Two quadratic Bezier pieces joined with C0 continuity at 0.5.
        // On [0, 0.5) with u = 2x: B0 = (1-u)^2, B1 = 2u(1-u), B2 = u^2.
        // d/dx = 2 d/du: [-4(1-u), 4(1-2u), 4u, 0, 0]
        let k = shared(&[0.0, 0.0, 0.0, 0.5, 0.5, 1.0, 1.0, 1.0]);
        let f = DerivativeFunction::new(k, 2, 1).unwrap();
        let x = 0.2;
        let u = 2.0 * x;
        assert_arr_eq(
            &f.evaluate(x),
            &[-4.0 * (1.0 - u), 4.0 * (1.0 - 2.0 * u), 4.0 * u, 0.0, 0.0],
        );
        // Right piece at x = 0.75 (u = 0.5): [0, 0, -2, 0, 2]
        assert_arr_eq(&f.evaluate(0.75), &[0.0, 0.0, -2.0, 0.0, 2.0]);
    }

    #[test]
    fn test_derivatives_sum_to_zero() {
        // Partition of unity differentiates to zero.
        let k = shared(&[0.0, 0.0, 0.0, 0.0, 0.2, 0.5, 0.9, 1.0, 1.0, 1.0, 1.0]);
        for d in 1..=3 {
            let f = DerivativeFunction::new(k.clone(), 3, d).unwrap();
            for &x in &[0.05, 0.3, 0.6, 0.95] {
                assert_abs_diff_eq!(f.evaluate(x).sum(), 0.0, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_derivative_matches_finite_difference() {
        let k = shared(&[0.0, 0.0, 0.0, 0.0, 0.25, 0.5, 0.75, 1.0, 1.0, 1.0, 1.0]);
        let f = DerivativeFunction::new(k.clone(), 3, 1).unwrap();
        let h = 1e-6;
        let x = 0.4;
        let fd = (evaluate_basis(&k, 3, x + h) - evaluate_basis(&k, 3, x - h)) / (2.0 * h);
        let exact = f.evaluate(x);
        for (a, b) in exact.iter().zip(fd.iter()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_outside_domain_is_zero() {
        let f = DerivativeFunction::new(shared(&BEZIER3), 3, 2).unwrap();
        assert_arr_eq(&f.evaluate(-0.5), &[0.0; 4]);
        assert_arr_eq(&f.evaluate(1.5), &[0.0; 4]);
    }

    #[test]
    fn test_repeated_evaluation_is_idempotent() {
        let f = DerivativeFunction::new(shared(&BEZIER3), 3, 2).unwrap();
        let mut ws = BasisWorkspace::new();
        let mut a = vec![0.0; 4];
        let mut b = vec![0.0; 4];
        f.evaluate_into(0.37, &mut ws, &mut a);
        f.evaluate_into(0.81, &mut ws, &mut b);
        f.evaluate_into(0.37, &mut ws, &mut b);
        assert_eq!(a, b);
        assert_eq!(f.evaluate(0.37), f.evaluate(0.37));
    }

    #[test]
    fn test_derivative_function_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DerivativeFunction>();
    }
}

use std::ops::Index;

use log::debug;
use ndarray::{s, Array1, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::core::error::DomainError;

/// A finite, non-decreasing sequence of knots.
///
/// Once built, a knot vector is never mutated. Bases and derivative functions
/// share it read-only, so it can be evaluated from any number of threads.
///
/// Serializes as a plain array of numbers. Deserialization runs the same checks
/// as [`KnotVector::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct KnotVector {
    knots: Array1<f64>,
}

impl KnotVector {
    /// Validates `knots` and wraps them.
    ///
    /// # Errors
    /// * fewer than two knots,
    /// * a NaN or infinite knot,
    /// * a knot smaller than its predecessor.
    pub fn new(knots: Array1<f64>) -> Result<Self, DomainError> {
        if knots.len() < 2 {
            return Err(DomainError::TooFewPoints {
                what: "knots",
                needed: 2,
                got: knots.len(),
            });
        }
        ensure_finite(knots.view())?;
        ensure_non_decreasing(knots.view(), "Knot vector")?;
        Ok(KnotVector { knots })
    }

    pub fn len(&self) -> usize {
        self.knots.len()
    }

    /// Always false: a valid knot vector holds at least two knots.
    pub fn is_empty(&self) -> bool {
        self.knots.is_empty()
    }

    pub fn view(&self) -> ArrayView1<'_, f64> {
        self.knots.view()
    }

    pub fn as_array(&self) -> &Array1<f64> {
        &self.knots
    }

    pub fn first(&self) -> f64 {
        self.knots[0]
    }

    pub fn last(&self) -> f64 {
        self.knots[self.knots.len() - 1]
    }

    /// The closed interval `[t_0, t_{m-1}]` outside which every basis function vanishes.
    pub fn domain(&self) -> (f64, f64) {
        (self.first(), self.last())
    }

    /// Index `j` of the last interval `[t_j, t_{j+1}]` with positive length, if any.
    ///
    /// A site equal to the last knot is attributed to this interval, which is
    /// then treated as closed on the right.
    pub fn last_nondegenerate_interval(&self) -> Option<usize> {
        (0..self.knots.len() - 1)
            .rev()
            .find(|&j| self.knots[j] < self.knots[j + 1])
    }

    /// Multiplicity count of every knot, see [`knot_multiplicities`].
    pub fn multiplicities(&self) -> Array1<usize> {
        count_previous_repeats(self.knots.view())
    }
}

impl Index<usize> for KnotVector {
    type Output = f64;

    fn index(&self, i: usize) -> &f64 {
        &self.knots[i]
    }
}

impl TryFrom<Vec<f64>> for KnotVector {
    type Error = DomainError;

    fn try_from(knots: Vec<f64>) -> Result<Self, Self::Error> {
        KnotVector::new(Array1::from(knots))
    }
}

impl TryFrom<Array1<f64>> for KnotVector {
    type Error = DomainError;

    fn try_from(knots: Array1<f64>) -> Result<Self, Self::Error> {
        KnotVector::new(knots)
    }
}

impl From<KnotVector> for Vec<f64> {
    fn from(knots: KnotVector) -> Self {
        knots.knots.to_vec()
    }
}

/// Builds an end-clamped knot vector from breakpoints.
///
/// The first and last breakpoint are repeated `order + 1` times; interior
/// breakpoints are kept once each. A spline of order `p` needs this
/// multiplicity at the ends so that the end basis functions interpolate the
/// endpoint values.
///
/// # Arguments
/// * `breakpoints` - Strictly increasing breakpoints, domain endpoints included once.
/// * `order` - Spline order `p` (polynomial degree, 3 = cubic).
///
/// # Returns
/// A knot vector of length `breakpoints.len() + 2 * order`.
pub fn clamp_ends(breakpoints: &Array1<f64>, order: usize) -> Result<KnotVector, DomainError> {
    if breakpoints.len() < 2 {
        return Err(DomainError::TooFewPoints {
            what: "breakpoints",
            needed: 2,
            got: breakpoints.len(),
        });
    }
    ensure_finite(breakpoints.view())?;
    ensure_strictly_increasing(breakpoints.view(), "Breakpoints")?;

    let x_min = breakpoints[0];
    let x_max = breakpoints[breakpoints.len() - 1];

    // One copy of each endpoint comes from the breakpoints themselves.
    let mut knots_vec = Vec::with_capacity(breakpoints.len() + 2 * order);
    knots_vec.extend(std::iter::repeat(x_min).take(order));
    knots_vec.extend(breakpoints.iter().copied());
    knots_vec.extend(std::iter::repeat(x_max).take(order));

    debug!(
        "clamped {} breakpoints on [{}, {}] for order {}: {} knots",
        breakpoints.len(),
        x_min,
        x_max,
        order,
        knots_vec.len()
    );
    KnotVector::new(Array1::from(knots_vec))
}

/// Builds a knot vector suited for interpolation at `sites`.
///
/// The ends are clamped as in [`clamp_ends`]. Interior knot `i` (for
/// `i = 1..n-p-1`) is the mean of the `p` sites `sites[i..i+p]`, so no
/// interior knot coincides with an end site and the collocation matrix at
/// `sites` is typically invertible.
///
/// For `order == 0` the averaging window is empty; interior knots are then
/// placed halfway between consecutive sites, which puts every site in its own
/// knot interval.
///
/// # Arguments
/// * `sites` - Strictly increasing collocation sites, `n >= max(order + 1, 2)`.
/// * `order` - Spline order `p`.
///
/// # Returns
/// A knot vector of length `n + order + 1`.
pub fn averaged_knots(sites: &Array1<f64>, order: usize) -> Result<KnotVector, DomainError> {
    let n = sites.len();
    let needed = (order + 1).max(2);
    if n < needed {
        return Err(DomainError::TooFewPoints {
            what: "collocation sites",
            needed,
            got: n,
        });
    }
    ensure_finite(sites.view())?;
    ensure_strictly_increasing(sites.view(), "Collocation sites")?;

    let interior = if order == 0 {
        Array1::from_iter((1..n).map(|i| 0.5 * (sites[i - 1] + sites[i])))
    } else {
        // Windows of `order` sites over sites[1..n-1] give exactly n - order - 1 knots.
        running_average(sites.slice(s![1..n - 1]), order)?
    };

    let mut knots_vec = Vec::with_capacity(n + order + 1);
    knots_vec.extend(std::iter::repeat(sites[0]).take(order + 1));
    knots_vec.extend(interior.iter().copied());
    knots_vec.extend(std::iter::repeat(sites[n - 1]).take(order + 1));
    debug_assert_eq!(knots_vec.len(), n + order + 1);

    debug!(
        "averaged {} sites for order {}: {} knots, {} interior",
        n,
        order,
        knots_vec.len(),
        interior.len()
    );
    KnotVector::new(Array1::from(knots_vec))
}

/// Running mean of `k` successive values.
///
/// # Returns
/// An array of length `max(0, n - k + 1)`; entry `j` is the mean of
/// `values[j..j+k]`. An input shorter than the window gives an empty array.
pub fn running_average(values: ArrayView1<f64>, k: usize) -> Result<Array1<f64>, DomainError> {
    if k == 0 {
        return Err(DomainError::EmptyAveragingWindow);
    }
    let n = values.len();
    let u = (n + 1).saturating_sub(k);
    Ok(Array1::from_iter(
        (0..u).map(|j| values.slice(s![j..j + k]).sum() / k as f64),
    ))
}

/// Counts, for each entry, how many earlier entries are equal to it.
///
/// `[1, 1, 2, 3, 3, 3]` gives `[0, 1, 0, 0, 1, 2]`. Used to turn repeated
/// collocation sites into derivative orders.
///
/// # Errors
/// The input must be non-decreasing.
pub fn knot_multiplicities(values: &Array1<f64>) -> Result<Array1<usize>, DomainError> {
    ensure_finite(values.view())?;
    ensure_non_decreasing(values.view(), "Sites")?;
    Ok(count_previous_repeats(values.view()))
}

fn count_previous_repeats(values: ArrayView1<f64>) -> Array1<usize> {
    let mut out = Array1::zeros(values.len());
    for j in 1..values.len() {
        if values[j] == values[j - 1] {
            out[j] = out[j - 1] + 1;
        }
    }
    out
}

fn ensure_finite(values: ArrayView1<f64>) -> Result<(), DomainError> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(DomainError::NonFiniteValue {
            index,
            value: values[index],
        }),
        None => Ok(()),
    }
}

fn ensure_non_decreasing(values: ArrayView1<f64>, what: &'static str) -> Result<(), DomainError> {
    for i in 1..values.len() {
        if values[i] < values[i - 1] {
            return Err(DomainError::Decreasing {
                what,
                index: i,
                prev: values[i - 1],
                next: values[i],
            });
        }
    }
    Ok(())
}

fn ensure_strictly_increasing(
    values: ArrayView1<f64>,
    what: &'static str,
) -> Result<(), DomainError> {
    for i in 1..values.len() {
        if values[i] <= values[i - 1] {
            return Err(DomainError::NotStrictlyIncreasing {
                what,
                index: i,
                prev: values[i - 1],
                next: values[i],
            });
        }
    }
    Ok(())
}

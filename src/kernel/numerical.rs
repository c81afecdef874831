/* ************************************************************************ **
** This file is part of mlpot, and is licensed under EITHER the MIT license **
** or the Apache 2.0 license, at your option.                               **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
**                                                                          **
** Be aware that not all of mlpot is provided under this permissive        **
** license, and that the project as a whole is licensed under the GPL 3.0.  **
** ************************************************************************ */

//! Finite differences, for checking analytic force matrices.
//!
//! These are public so that downstream crates can debug a fitted model
//! against its own energy function.

/// Approximation method for a numerical 1D derivative.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DerivativeKind {
    /// n-point central stencil. Only implemented for `n = 3, 5, 7`.
    Stencil(u32),
}

impl DerivativeKind {
    /// Alias for `DerivativeKind::Stencil(3)`.
    #[allow(bad_style)]
    pub const CentralDifference: Self = DerivativeKind::Stencil(3);
}

impl Default for DerivativeKind {
    fn default() -> DerivativeKind { DerivativeKind::Stencil(5) }
}

enum Never {}

// (offset, coefficient) pairs in units of the step, and the denominator.
// http://www.holoborodko.com/pavel/numerical-methods/numerical-derivative/central-differences/
fn stencil(n: u32) -> (&'static [(f64, f64)], f64) {
    match n {
        3 => (&[(-1.0, -1.0), (1.0, 1.0)], 2.0),
        5 => (&[(-2.0, 1.0), (-1.0, -8.0), (1.0, 8.0), (2.0, -1.0)], 12.0),
        7 => (&[
            (-3.0, -1.0), (-2.0, 9.0), (-1.0, -45.0),
            (1.0, 45.0), (2.0, -9.0), (3.0, 1.0),
        ], 60.0),
        n if n < 3 || n % 2 == 0 => panic!("{}-point stencil does not exist", n),
        n => panic!("{}-point stencil is not implemented", n),
    }
}

/// Numerical derivative of a scalar function at `point`.
pub fn slope(
    step: f64,
    kind: Option<DerivativeKind>,
    point: f64,
    mut value_fn: impl FnMut(f64) -> f64,
) -> f64 {
    try_slope::<Never, _>(step, kind, point, |x| Ok(value_fn(x)))
        .unwrap_or_else(|e| match e {})
}

/// `slope` for functions that can fail.
pub fn try_slope<E, F>(
    step: f64,
    kind: Option<DerivativeKind>,
    point: f64,
    mut value_fn: F,
) -> Result<f64, E>
where
    F: FnMut(f64) -> Result<f64, E>,
{
    let DerivativeKind::Stencil(n) = kind.unwrap_or_default();
    let (terms, denom) = stencil(n);

    let mut numer = 0.0;
    for &(offset, coeff) in terms {
        numer += coeff * value_fn(point + offset * step)?;
    }
    Ok(numer / (denom * step))
}

/// Numerical gradient, one `slope` per coordinate.
///
/// The number of function calls is proportional to `point.len()`.
pub fn gradient(
    step: f64,
    kind: Option<DerivativeKind>,
    point: &[f64],
    mut value_fn: impl FnMut(&[f64]) -> f64,
) -> Vec<f64> {
    try_gradient::<Never, _>(step, kind, point, |x| Ok(value_fn(x)))
        .unwrap_or_else(|e| match e {})
}

/// `gradient` for functions that can fail.
pub fn try_gradient<E, F>(
    step: f64,
    kind: Option<DerivativeKind>,
    point: &[f64],
    mut value_fn: F,
) -> Result<Vec<f64>, E>
where
    F: FnMut(&[f64]) -> Result<f64, E>,
{
    let mut work = point.to_vec();
    (0..point.len())
        .map(|i| {
            let out = try_slope(step, kind, point[i], |x| {
                work[i] = x;
                value_fn(&work)
            });
            work[i] = point[i];
            out
        })
        .collect()
}

#[cfg(test)]
#[deny(unused)]
mod tests {
    use super::*;

    #[test]
    fn exact_for_low_order_polynomials() {
        // an n-point stencil is exact for polynomials up to order n - 1
        let poly = |x: f64| 0.5 - 2.0 * x + 0.25 * x * x * x;
        let deriv = |x: f64| -2.0 + 0.75 * x * x;
        for &n in &[5, 7] {
            for &x in &[-3.0, 0.1, 2.5] {
                let actual = slope(1e-1, Some(DerivativeKind::Stencil(n)), x, poly);
                assert_close!(abs=1e-9, rel=1e-9, actual, deriv(x), "{}-point", n);
            }
        }
        let quad = |x: f64| 3.0 * x * x - x;
        let actual = slope(1e-1, Some(DerivativeKind::CentralDifference), 2.0, quad);
        assert_close!(abs=1e-9, rel=1e-9, actual, 11.0);
    }

    #[test]
    fn gradient_restores_point() {
        let point = [1.0, -2.0, 0.5];
        let grad = gradient(1e-3, None, &point, |x| {
            x[0] * x[0] + 3.0 * x[1] + x[0] * x[2]
        });
        assert_close!(abs=1e-8, grad, vec![2.0 + 0.5, 3.0, 1.0]);
    }

    #[test]
    #[should_panic(expected = "does not exist")]
    fn even_stencil() {
        slope(1e-1, Some(DerivativeKind::Stencil(4)), 0.0, |x| x);
    }
}

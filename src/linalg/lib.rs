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

//! Ridge regression: `(KᵗK + λI) w = Kᵗy`.
//!
//! The normal equations are solved by Cholesky factorization; nothing is
//! ever explicitly inverted.

#[macro_use] extern crate log;
#[cfg(test)] #[macro_use] extern crate mlpot_assert_close;

use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RidgeError {
    #[error("ridge penalty must be positive and finite (got {0})")]
    NonPositivePenalty(f64),

    #[error("matrix has {rows} rows, but {observations} observations were given")]
    ShapeMismatch { rows: usize, observations: usize },

    #[error("matrix has {cols} columns, but {weights} weights were given")]
    WeightMismatch { cols: usize, weights: usize },

    #[error("the system contains NaN or infinite values")]
    NonFinite,

    #[error("normal equations are not positive definite (size {0})")]
    NotPositiveDefinite(usize),
}

/// Which of the two equivalent linear systems to factorize.
///
/// * `Primal`: `(KᵗK + λI) w = Kᵗy`, size `cols`.
/// * `Dual`: `(KKᵗ + λI) a = y` followed by `w = Kᵗa`, size `rows`.
///
/// Both give the same `w` up to rounding.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Form {
    /// Whichever of the two is smaller.
    Auto,
    Primal,
    Dual,
}

impl Default for Form {
    fn default() -> Self { Form::Auto }
}

impl Form {
    fn resolve(self, rows: usize, cols: usize) -> Form {
        match self {
            Form::Auto if rows < cols => Form::Dual,
            Form::Auto => Form::Primal,
            form => form,
        }
    }

    /// Number of elements in the matrix that gets factorized.
    pub fn system_len(self, rows: usize, cols: usize) -> usize {
        match self.resolve(rows, cols) {
            Form::Dual => rows * rows,
            _ => cols * cols,
        }
    }
}

/// Solve the ridge problem for weights `w`, choosing the smaller system.
pub fn ridge_solve(
    k: ArrayView2<'_, f64>,
    y: ArrayView1<'_, f64>,
    lambda: f64,
) -> Result<Array1<f64>, RidgeError> {
    ridge_solve_with(Form::Auto, k, y, lambda)
}

pub fn ridge_solve_with(
    form: Form,
    k: ArrayView2<'_, f64>,
    y: ArrayView1<'_, f64>,
    lambda: f64,
) -> Result<Array1<f64>, RidgeError> {
    if !(lambda > 0.0 && lambda.is_finite()) {
        return Err(RidgeError::NonPositivePenalty(lambda));
    }
    if k.nrows() != y.len() {
        return Err(RidgeError::ShapeMismatch { rows: k.nrows(), observations: y.len() });
    }
    if !(k.iter().all(|x| x.is_finite()) && y.iter().all(|x| x.is_finite())) {
        return Err(RidgeError::NonFinite);
    }

    let (rows, cols) = k.dim();
    let form = form.resolve(rows, cols);
    debug!("ridge solve: {} observations, {} weights, {:?} form, lambda = {:e}", rows, cols, form, lambda);

    Ok(match form {
        Form::Dual => {
            let gram = k.dot(&k.t());
            let alpha = solve_regularized(gram, y.to_owned(), lambda)?;
            k.t().dot(&alpha)
        },
        _ => {
            let gram = k.t().dot(&k);
            let rhs = k.t().dot(&y);
            solve_regularized(gram, rhs, lambda)?
        },
    })
}

/// `K w`.
pub fn predict(k: ArrayView2<'_, f64>, w: ArrayView1<'_, f64>) -> Result<Array1<f64>, RidgeError> {
    if k.ncols() != w.len() {
        return Err(RidgeError::WeightMismatch { cols: k.ncols(), weights: w.len() });
    }
    Ok(k.dot(&w))
}

// solves (a + λI) x = b for symmetric positive semidefinite a
fn solve_regularized(mut a: Array2<f64>, b: Array1<f64>, lambda: f64) -> Result<Array1<f64>, RidgeError> {
    let n = a.nrows();
    a.diag_mut().mapv_inplace(|x| x + lambda);

    let a = DMatrix::from_fn(n, n, |r, c| a[[r, c]]);
    let b = DVector::from_iterator(n, b.iter().cloned());
    let chol = a.cholesky().ok_or(RidgeError::NotPositiveDefinite(n))?;
    let x = chol.solve(&b);
    Ok(x.iter().cloned().collect())
}

#[cfg(test)]
#[deny(unused)]
mod tests {
    use super::*;
    use ndarray::{arr1, Array2};
    use rand::{Rng, SeedableRng};
    use rand::rngs::StdRng;

    fn random_matrix(rng: &mut StdRng, rows: usize, cols: usize) -> Array2<f64> {
        Array2::from_shape_fn((rows, cols), |_| rng.gen_range(-1.0..1.0))
    }

    #[test]
    fn identity_reproduces_targets() {
        let k = Array2::eye(4);
        let y = arr1(&[1.5, -2.0, 0.25, 8.0]);
        let w = ridge_solve(k.view(), y.view(), 1e-12).unwrap();
        assert_close!(rel=1e-10, w.view(), y.view());
        assert_close!(rel=1e-10, predict(k.view(), w.view()).unwrap(), y);
    }

    #[test]
    fn overdetermined_exact_fit() {
        let mut rng = StdRng::seed_from_u64(1);
        let k = random_matrix(&mut rng, 30, 5);
        let expected = arr1(&[0.5, -1.0, 2.0, 0.0, 3.0]);
        let y = k.dot(&expected);
        let w = ridge_solve(k.view(), y.view(), 1e-10).unwrap();
        assert_close!(abs=1e-7, w, expected);
    }

    #[test]
    fn primal_and_dual_agree() {
        let mut rng = StdRng::seed_from_u64(2);
        for &(rows, cols) in &[(6, 20), (20, 6), (9, 9)] {
            let k = random_matrix(&mut rng, rows, cols);
            let y = Array1::from_shape_fn(rows, |_| rng.gen_range(-1.0..1.0));
            let primal = ridge_solve_with(Form::Primal, k.view(), y.view(), 0.1).unwrap();
            let dual = ridge_solve_with(Form::Dual, k.view(), y.view(), 0.1).unwrap();
            assert_close!(rel=1e-8, abs=1e-10, primal, dual);
        }
    }

    #[test]
    fn rank_deficient_is_regularized() {
        // two identical columns
        let k = Array2::from_shape_fn((5, 2), |(i, _)| i as f64);
        let y = Array1::from_shape_fn(5, |i| 2.0 * i as f64);
        let w = ridge_solve_with(Form::Primal, k.view(), y.view(), 1e-4).unwrap();
        assert_close!(rel=1e-5, w[0], w[1]);
        assert_close!(rel=1e-5, w[0] + w[1], 2.0);
    }

    #[test]
    fn preconditions() {
        let k = Array2::eye(2);
        let y = arr1(&[1.0, 2.0]);
        assert_eq!(ridge_solve(k.view(), y.view(), 0.0), Err(RidgeError::NonPositivePenalty(0.0)));
        assert_eq!(ridge_solve(k.view(), y.view(), -1.0), Err(RidgeError::NonPositivePenalty(-1.0)));
        assert_eq!(
            ridge_solve(k.view(), arr1(&[1.0]).view(), 1.0),
            Err(RidgeError::ShapeMismatch { rows: 2, observations: 1 }),
        );
        assert_eq!(
            predict(k.view(), arr1(&[1.0; 3]).view()),
            Err(RidgeError::WeightMismatch { cols: 2, weights: 3 }),
        );
        assert_eq!(
            ridge_solve(k.view(), arr1(&[1.0, f64::NAN]).view(), 1.0),
            Err(RidgeError::NonFinite),
        );
    }

    #[test]
    fn system_len() {
        assert_eq!(Form::Auto.system_len(10, 1000), 100);
        assert_eq!(Form::Auto.system_len(1000, 10), 100);
        assert_eq!(Form::Primal.system_len(10, 1000), 1_000_000);
    }
}

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

use crate::KernelError;
use crate::geometry::PairGeometry;

use ndarray::{Array1, Array2, ArrayView2, Axis, Zip};

/// Radial basis function kernel `exp(-|a - b|² / (2 σ²))`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Gaussian {
    sigma: f64,
}

impl Gaussian {
    pub fn new(sigma: f64) -> Result<Self, KernelError> {
        if !(sigma > 0.0 && sigma.is_finite()) {
            return Err(KernelError::NonPositiveBandwidth(sigma));
        }
        Ok(Gaussian { sigma })
    }

    pub fn sigma(&self) -> f64 { self.sigma }

    /// Uses `|a|² - 2 a·b + |b|²` so that no `(m, n, q)` temporary is built.
    pub(crate) fn matrix(&self, a: ArrayView2<'_, f64>, b: ArrayView2<'_, f64>) -> Array2<f64> {
        let sq_a = row_norms_sqr(a);
        let sq_b = row_norms_sqr(b);
        let denom = 2.0 * self.sigma * self.sigma;

        let mut out = a.dot(&b.t());
        for ((i, j), x) in out.indexed_iter_mut() {
            // cancellation can leave tiny negative values
            let d2 = f64::max(sq_a[i] - 2.0 * *x + sq_b[j], 0.0);
            *x = f64::exp(-d2 / denom);
        }
        out
    }

    /// Force matrix for one configuration.
    ///
    /// With `k[a, r] = K(d_a, D_r)` the kernel derivative is
    /// `∂k/∂d_a = k[a, r] (D_r - d_a) / σ²`, and the descriptor derivative of
    /// [`PairGeometry`] yields four partial sums:
    ///
    /// ```text
    /// own_ref[(a,x), r]   = k[a,r] Σ_l S[(a,x),l] D[r,l]
    /// own_self[(a,x), r]  = k[a,r] Σ_l S[(a,x),l] d[a,l]
    /// pair_ref[(a,x), r]  = Σ_j Σ_l g[a,j,l] u[a,j,x] k[j,r] D[r,l]
    /// pair_self[(a,x), r] = Σ_j Σ_l g[a,j,l] u[a,j,x] k[j,r] d[j,l]
    /// ```
    ///
    /// where `g[a,j,l] = q_l cos(q_l r_aj)`. The result is
    /// `(own_ref - own_self + pair_ref - pair_self) / σ²`.
    pub(crate) fn force_matrix(
        &self,
        geom: &PairGeometry,
        descriptors: ArrayView2<'_, f64>,
        reference: ArrayView2<'_, f64>,
    ) -> Array2<f64> {
        let n = geom.num_atoms();
        let kmat = self.matrix(descriptors, reference);
        let own = geom.own_gradient();

        let own_ref = {
            let mut out = own.dot(&reference.t());
            scale_rows_by_atom(&mut out, kmat.view());
            out
        };

        let own_self = {
            // P[(a,x)] = Σ_l S[(a,x),l] d[a,l]
            let mut out = Array2::zeros((3 * n, reference.nrows()));
            for (i, mut row) in out.axis_iter_mut(Axis(0)).enumerate() {
                row.fill(own.row(i).dot(&descriptors.row(i / 3)));
            }
            scale_rows_by_atom(&mut out, kmat.view());
            out
        };

        let pair_self = {
            // h[a,j] = Σ_l g[a,j,l] d[j,l]
            let mut h = Array2::zeros((n, n));
            for ((a, j), entry) in h.indexed_iter_mut() {
                *entry = geom.dsin.slice(s![a, j, ..]).dot(&descriptors.row(j));
            }
            geom.scale_units(h.view()).dot(&kmat)
        };

        let pair_ref = {
            let mut out = Array2::zeros((3 * n, reference.nrows()));
            for (l, column) in reference.axis_iter(Axis(1)).enumerate() {
                let weights = geom.dsin.index_axis(Axis(2), l);
                let partial = geom.scale_units(weights).dot(&kmat);
                Zip::from(&mut out)
                    .and(&partial)
                    .and_broadcast(&column.insert_axis(Axis(0)))
                    .for_each(|out, &partial, &d| *out += partial * d);
            }
            out
        };

        let mut out = own_ref;
        out -= &own_self;
        out += &pair_ref;
        out -= &pair_self;
        out /= self.sigma * self.sigma;
        out
    }
}

fn row_norms_sqr(m: ArrayView2<'_, f64>) -> Array1<f64> {
    m.map_axis(Axis(1), |row| row.dot(&row))
}

// multiplies row (a, x) by k[a, r]
fn scale_rows_by_atom(out: &mut Array2<f64>, kmat: ArrayView2<'_, f64>) {
    for (i, mut row) in out.axis_iter_mut(Axis(0)).enumerate() {
        row *= &kmat.row(i / 3);
    }
}

#[cfg(test)]
#[deny(unused)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn rejects_bad_sigma() {
        assert_eq!(Gaussian::new(0.0), Err(KernelError::NonPositiveBandwidth(0.0)));
        assert_eq!(Gaussian::new(-1.0), Err(KernelError::NonPositiveBandwidth(-1.0)));
        assert!(Gaussian::new(f64::NAN).is_err());
    }

    #[test]
    fn self_similarity() {
        let kernel = Gaussian::new(0.7).unwrap();
        let a = arr2(&[[1.0, 2.0, 3.0], [10.0, -20.0, 5.0], [0.0, 0.0, 0.0]]);
        let k = kernel.matrix(a.view(), a.view());
        for i in 0..3 {
            assert_close!(k[[i, i]], 1.0);
        }
        assert_close!(k.view(), k.t());

        let zeros = Array2::<f64>::zeros((1, 4));
        assert_eq!(kernel.matrix(zeros.view(), zeros.view()), arr2(&[[1.0]]));
    }

    #[test]
    fn matches_direct_formula() {
        let kernel = Gaussian::new(1.5).unwrap();
        let a = arr2(&[[0.0, 1.0], [2.0, -1.0]]);
        let b = arr2(&[[1.0, 1.0], [0.0, 0.0], [3.0, 2.0]]);
        let k = kernel.matrix(a.view(), b.view());
        for i in 0..2 {
            for j in 0..3 {
                let d2: f64 = (0..2).map(|l| (a[[i, l]] - b[[j, l]]).powi(2)).sum();
                assert_close!(k[[i, j]], f64::exp(-d2 / (2.0 * 1.5 * 1.5)));
            }
        }
    }
}

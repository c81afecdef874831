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

//! Pieces of the descriptor derivative shared by both kernels.
//!
//! With `u_aj` the unit vector from atom `a` towards neighbor `j`, the descriptor
//! `d_il = Σ_j sin(q_l r_ij)` satisfies
//!
//! ```text
//!   -∂d_al/∂r_a = Σ_j q_l cos(q_l r_aj) u_aj      (own row)
//!   -∂d_jl/∂r_a =     q_l cos(q_l r_aj) u_aj      (each neighbor's row)
//! ```
//!
//! Rows of force matrices are indexed by `3 * atom + axis`.

use mlpot_structure::{ModeVector, Neighbors};

use ndarray::{Array2, Array3, ArrayView2, Axis};

pub(crate) struct PairGeometry {
    /// `(n, n, 3)` unit displacements, zero for non-neighbors.
    pub unit: Array3<f64>,
    /// `(n, n, m)` values of `q_l cos(q_l r_aj)`, zero for non-neighbors.
    pub dsin: Array3<f64>,
}

impl PairGeometry {
    pub fn new(neighbors: &Neighbors, modes: &ModeVector) -> Self {
        let dist = neighbors.distances();
        let q = modes.values();
        let n = dist.nrows();

        let mut dsin = Array3::zeros((n, n, q.len()));
        for ((a, j), &r) in dist.indexed_iter() {
            if r > 0.0 {
                let mut out = dsin.slice_mut(s![a, j, ..]);
                out.zip_mut_with(&q, |out, &q| *out = q * (q * r).cos());
            }
        }
        PairGeometry { unit: neighbors.unit_displacements(), dsin }
    }

    pub fn num_atoms(&self) -> usize { self.unit.len_of(Axis(0)) }

    /// `(3n, m)` matrix `S[(a, x), l] = Σ_j q_l cos(q_l r_aj) u_aj,x`.
    ///
    /// This is minus the gradient of atom `a`'s own descriptor.
    pub fn own_gradient(&self) -> Array2<f64> {
        let n = self.num_atoms();
        let m = self.dsin.len_of(Axis(2));
        let mut out = Array2::zeros((3 * n, m));
        for a in 0..n {
            let unit = self.unit.index_axis(Axis(0), a);
            let dsin = self.dsin.index_axis(Axis(0), a);
            out.slice_mut(s![3 * a..3 * a + 3, ..]).assign(&unit.t().dot(&dsin));
        }
        out
    }

    /// `(3n, n)` matrix with entries `weight[a, j] * u_aj,x`.
    pub fn scale_units(&self, weight: ArrayView2<'_, f64>) -> Array2<f64> {
        let n = self.num_atoms();
        let mut out = Array2::zeros((3 * n, n));
        for ((a, j, x), &u) in self.unit.indexed_iter() {
            out[[3 * a + x, j]] = weight[[a, j]] * u;
        }
        out
    }
}

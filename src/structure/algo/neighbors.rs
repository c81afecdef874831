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

use crate::{Lattice, StructureError};

use ndarray::{Array2, Array3, ArrayView1, ArrayView2, ArrayView3, Axis};

/// Minimum-image neighbor data for one configuration.
///
/// `distances[[i, j]]` is the minimum-image distance between atoms `i` and `j`
/// and `displacements[[i, j, ..]]` the displacement `r_j - r_i`. Both are exactly
/// zero on the diagonal and for every pair at or beyond the cutoff, so sums over
/// a full row only see true neighbors.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbors {
    cutoff: f64,
    distances: Array2<f64>,
    displacements: Array3<f64>,
}

impl Neighbors {
    /// Brute-force O(n²) search under the minimum image convention.
    ///
    /// The cutoff is validated against the lattice first.
    pub fn compute(
        positions: &[[f64; 3]],
        lattice: &Lattice,
        cutoff: f64,
    ) -> Result<Self, StructureError> {
        lattice.check_cutoff(cutoff)?;

        let n = positions.len();
        let mut distances = Array2::zeros((n, n));
        let mut displacements = Array3::zeros((n, n, 3));

        // Only the upper triangle is computed; the lower one is its mirror image,
        // which keeps the distance matrix exactly symmetric.
        for i in 0..n {
            for j in i + 1..n {
                let raw = [
                    positions[j][0] - positions[i][0],
                    positions[j][1] - positions[i][1],
                    positions[j][2] - positions[i][2],
                ];
                let disp = lattice.minimum_image(raw);
                let dist = disp.iter().map(|x| x * x).sum::<f64>().sqrt();
                if dist >= cutoff {
                    continue;
                }

                distances[[i, j]] = dist;
                distances[[j, i]] = dist;
                for k in 0..3 {
                    displacements[[i, j, k]] = disp[k];
                    displacements[[j, i, k]] = -disp[k];
                }
            }
        }

        trace!("neighbor search: {} atoms, {} pairs within {}", n, count_nonzero(&distances) / 2, cutoff);
        Ok(Neighbors { cutoff, distances, displacements })
    }

    pub fn cutoff(&self) -> f64 { self.cutoff }

    pub fn num_atoms(&self) -> usize { self.distances.nrows() }

    /// `(n_atom, n_atom)` matrix of minimum-image distances; zero for non-neighbors.
    pub fn distances(&self) -> ArrayView2<'_, f64> { self.distances.view() }

    /// `(n_atom, n_atom, 3)` raw displacements `r_j - r_i`; zero for non-neighbors.
    pub fn displacements(&self) -> ArrayView3<'_, f64> { self.displacements.view() }

    /// Displacements normalized to unit length, zero for non-neighbors.
    pub fn unit_displacements(&self) -> Array3<f64> {
        let mut out = self.displacements.clone();
        for ((i, j), &dist) in self.distances.indexed_iter() {
            if dist > 0.0 {
                out.slice_mut(s![i, j, ..]).mapv_inplace(|x| x / dist);
            }
        }
        out
    }

    /// Indices of the neighbors of atom `i`, in increasing order.
    pub fn neighbors_of(&self, i: usize) -> Vec<usize> {
        self.distance_row(i).iter().enumerate()
            .filter(|&(_, &d)| d > 0.0)
            .map(|(j, _)| j)
            .collect()
    }

    pub fn neighbor_count(&self, i: usize) -> usize {
        self.distance_row(i).iter().filter(|&&d| d > 0.0).count()
    }

    fn distance_row(&self, i: usize) -> ArrayView1<'_, f64> {
        self.distances.index_axis(Axis(0), i)
    }
}

fn count_nonzero(m: &Array2<f64>) -> usize {
    m.iter().filter(|&&x| x != 0.0).count()
}

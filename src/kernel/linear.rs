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

use crate::geometry::PairGeometry;

use ndarray::{Array2, ArrayView2};

/// `K(A, B) = A Bᵗ`. Widths are assumed to match.
pub(crate) fn matrix(a: ArrayView2<'_, f64>, b: ArrayView2<'_, f64>) -> Array2<f64> {
    a.dot(&b.t())
}

/// `T[(a, x), r] = 2 Σ_l S[(a, x), l] D[r, l]`.
///
/// Both the own-row term and the neighbor-row terms of the descriptor derivative
/// reduce to `S` because the linear kernel's gradient does not depend on which
/// descriptor it is taken at; hence the factor of two.
pub(crate) fn force_matrix(geom: &PairGeometry, reference: ArrayView2<'_, f64>) -> Array2<f64> {
    let mut out = geom.own_gradient().dot(&reference.t());
    out *= 2.0;
    out
}

#[cfg(test)]
#[deny(unused)]
mod tests {
    use super::*;
    use ndarray::{arr2, Array2};

    #[test]
    fn ones() {
        let a = Array2::<f64>::ones((1, 10));
        assert_eq!(matrix(a.view(), a.view()), arr2(&[[10.0]]));
    }

    #[test]
    fn symmetric_and_bilinear() {
        let a = arr2(&[[1.0, 2.0, 0.5], [-1.0, 0.0, 3.0]]);
        let b = arr2(&[[0.5, 0.5, 0.5], [2.0, -1.0, 1.0], [0.0, 0.0, 1.0]]);

        let ab = matrix(a.view(), b.view());
        let ba = matrix(b.view(), a.view());
        assert_eq!(ab.dim(), (2, 3));
        assert_close!(ab.view(), ba.t());

        let scaled = &a * 2.5;
        assert_close!(matrix(scaled.view(), b.view()), &ab * 2.5);
    }
}

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

use crate::StructureError;

/// Off-diagonal elements with a magnitude below this are treated as zero.
pub const ORTHORHOMBIC_TOL: f64 = 1e-8;

/// Defines a vector basis for periodic boundary conditions in three dimensions.
///
/// Only the minimum-image logic for orthorhombic cells is implemented.
/// Skewed lattices can be constructed (so that they can be reported), but
/// [`Lattice::check_cutoff`] rejects them.
#[derive(Debug, Clone, PartialEq)]
pub struct Lattice {
    // rows are lattice vectors
    matrix: [[f64; 3]; 3],
}

impl Lattice {
    /// Create a lattice from a matrix where the rows are lattice vectors.
    #[inline]
    pub fn new(matrix: &[[f64; 3]; 3]) -> Self
    { Lattice { matrix: *matrix } }

    /// A cubic lattice ((a, a, a), (90, 90, 90))
    #[inline]
    pub fn cubic(a: f64) -> Self { Self::orthorhombic(a, a, a) }

    /// An orthorhombic lattice ((a, b, c), (90, 90, 90))
    #[inline]
    pub fn orthorhombic(a: f64, b: f64, c: f64) -> Self
    { Self::new(&[[a, 0., 0.], [0., b, 0.], [0., 0., c]]) }

    /// Matrix where lattice vectors are rows.
    #[inline]
    pub fn matrix(&self) -> &[[f64; 3]; 3]
    { &self.matrix }

    /// Lengths of the three lattice vectors.
    pub fn norms(&self) -> [f64; 3] {
        let norm = |v: &[f64; 3]| v.iter().map(|x| x * x).sum::<f64>().sqrt();
        [norm(&self.matrix[0]), norm(&self.matrix[1]), norm(&self.matrix[2])]
    }

    /// The diagonal of the matrix; the box lengths of an orthorhombic cell.
    pub fn diagonal(&self) -> [f64; 3]
    { [self.matrix[0][0], self.matrix[1][1], self.matrix[2][2]] }

    /// Whether the matrix is diagonal with positive entries (up to `ORTHORHOMBIC_TOL`).
    pub fn is_orthorhombic(&self) -> bool {
        (0..3).all(|r| (0..3).all(|c| match r == c {
            true => self.matrix[r][c] > 0.0,
            false => self.matrix[r][c].abs() <= ORTHORHOMBIC_TOL,
        }))
    }

    /// Whether the lattice vectors are mutually orthogonal, regardless of orientation.
    ///
    /// (a rotated orthorhombic cell is orthogonal, but not `is_orthorhombic`)
    pub fn is_orthogonal(&self) -> bool {
        let m = &self.matrix;
        let dot = |a: usize, b: usize| (0..3).map(|k| m[a][k] * m[b][k]).sum::<f64>();
        let scale = self.norms().iter().cloned().fold(0.0, f64::max).powi(2);
        [(0, 1), (0, 2), (1, 2)].iter().all(|&(a, b)| dot(a, b).abs() <= ORTHORHOMBIC_TOL * scale)
    }

    /// Largest cutoff radius for which the minimum image of a neighbor is unique.
    pub fn max_cutoff(&self) -> f64 {
        0.5 * self.diagonal().iter().cloned().fold(f64::INFINITY, f64::min)
    }

    /// Validate a cutoff radius for neighbor searches in this cell.
    ///
    /// Requires an orthorhombic cell and `0 < cutoff < 0.5 * min(diagonal)`.
    pub fn check_cutoff(&self, cutoff: f64) -> Result<(), StructureError> {
        if !(cutoff > 0.0 && cutoff.is_finite()) {
            return Err(StructureError::NonPositiveCutoff(cutoff));
        }
        if !self.is_orthorhombic() {
            return Err(StructureError::NonOrthorhombicLattice(self.matrix));
        }
        let max = self.max_cutoff();
        if cutoff >= max {
            return Err(StructureError::CutoffTooLarge { cutoff, max });
        }
        Ok(())
    }

    /// Fold a cartesian displacement into its minimum image.
    ///
    /// Each component ends up in `[-a/2, a/2)`, where `a` is the matching
    /// diagonal element. Only meaningful for orthorhombic cells.
    #[inline]
    pub fn minimum_image(&self, disp: [f64; 3]) -> [f64; 3] {
        let diag = self.diagonal();
        let mut out = [0.0; 3];
        for k in 0..3 {
            let a = diag[k];
            out[k] = disp[k] - a * (disp[k] / a + 0.5).floor();
        }
        out
    }
}

impl<'a> From<&'a [[f64; 3]; 3]> for Lattice {
    #[inline(always)]
    fn from(m: &'a [[f64; 3]; 3]) -> Self
    { Lattice::new(m) }
}

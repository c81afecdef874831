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

use crate::{Neighbors, StructureError};

use ndarray::{Array1, Array2, ArrayView1, Axis};
use std::f64::consts::PI;

/// Sine-basis frequencies `q`.
///
/// All entries are strictly positive. The same vector must be used for
/// training and prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeVector {
    values: Array1<f64>,
}

impl ModeVector {
    /// `q[n-1] = n π / cutoff` for `n = 1..=num_modes`.
    pub fn new(cutoff: f64, num_modes: usize) -> Result<Self, StructureError> {
        if !(cutoff > 0.0 && cutoff.is_finite()) {
            return Err(StructureError::NonPositiveCutoff(cutoff));
        }
        if num_modes == 0 {
            return Err(StructureError::NoModes);
        }
        let values = (1..=num_modes).map(|n| n as f64 * PI / cutoff).collect();
        Ok(ModeVector { values })
    }

    /// Use explicit frequencies.
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Result<Self, StructureError> {
        let values: Array1<f64> = values.into_iter().collect();
        if values.is_empty() {
            return Err(StructureError::NoModes);
        }
        for (index, &value) in values.iter().enumerate() {
            if !(value > 0.0 && value.is_finite()) {
                return Err(StructureError::NonPositiveMode { index, value });
            }
        }
        Ok(ModeVector { values })
    }

    pub fn len(&self) -> usize { self.values.len() }

    pub fn values(&self) -> ArrayView1<'_, f64> { self.values.view() }
}

/// `descriptor[[i, l]] = Σ_j sin(q[l] · dist[[i, j]])`.
///
/// Zero entries of the distance matrix contribute `sin(0) = 0`, so an isolated
/// atom gets an all-zero row.
pub fn sine_descriptors(neighbors: &Neighbors, modes: &ModeVector) -> Array2<f64> {
    let dist = neighbors.distances();
    let q = modes.values();
    let n = dist.nrows();

    let mut out = Array2::zeros((n, q.len()));
    for (i, mut row) in out.axis_iter_mut(Axis(0)).enumerate() {
        for &d in dist.index_axis(Axis(0), i).iter().filter(|&&d| d > 0.0) {
            // vectorized over modes
            row.zip_mut_with(&q, |acc, &q| *acc += (q * d).sin());
        }
    }
    out
}

#[cfg(test)]
#[deny(unused)]
mod tests {
    use super::*;
    use crate::Lattice;

    #[test]
    fn mode_vector() {
        let modes = ModeVector::new(4.0, 3).unwrap();
        assert_close!(modes.values().to_vec(), vec![PI / 4.0, PI / 2.0, 3.0 * PI / 4.0]);

        assert_eq!(ModeVector::new(4.0, 0), Err(StructureError::NoModes));
        assert_eq!(ModeVector::new(-1.0, 2), Err(StructureError::NonPositiveCutoff(-1.0)));
        assert_eq!(
            ModeVector::from_values(vec![1.0, 0.0]),
            Err(StructureError::NonPositiveMode { index: 1, value: 0.0 }),
        );
    }

    #[test]
    fn isolated_atom_has_zero_descriptor() {
        let lattice = Lattice::cubic(10.0);
        let positions = [[1.0, 1.0, 1.0], [2.0, 1.0, 1.0], [6.0, 6.0, 6.0]];
        let neighbors = Neighbors::compute(&positions, &lattice, 3.0).unwrap();
        let modes = ModeVector::new(3.0, 5).unwrap();
        let desc = sine_descriptors(&neighbors, &modes);

        assert_eq!(desc.dim(), (3, 5));
        assert!(desc.row(2).iter().all(|&x| x == 0.0));

        // the pair at distance 1 gives sin(q)
        let expected: Vec<f64> = modes.values().iter().map(|q| q.sin()).collect();
        assert_close!(desc.row(0).to_vec(), expected.clone());
        assert_close!(desc.row(1).to_vec(), expected);
    }
}

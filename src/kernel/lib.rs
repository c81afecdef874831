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

//! Similarity kernels between descriptor batches, and the analytic force
//! matrices that map kernel weights to per-atom forces.
//!
//! For a configuration with descriptors `d_i` and a reference batch `D`, the
//! predicted energy is `Σ_i Σ_r w_r K(d_i, D_r)`, and the force matrix `T`
//! of [`Kernel::force_matrix`] satisfies `F = T w` where `F = -∂E/∂r`.

#[macro_use] extern crate log;
#[macro_use] extern crate ndarray;
#[cfg(test)] #[macro_use] extern crate mlpot_assert_close;

mod error;
mod geometry;
mod linear;
mod gaussian;
pub mod numerical;

pub use crate::error::KernelError;
pub use crate::gaussian::Gaussian;

use crate::geometry::PairGeometry;

use mlpot_structure::{Configuration, ModeVector, Neighbors, StructureError};
use ndarray::{Array1, Array2, ArrayView2, Axis};

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Kernel {
    Linear,
    Gaussian(Gaussian),
}

impl Kernel {
    pub fn linear() -> Self { Kernel::Linear }

    /// Fails unless `sigma` is positive and finite.
    pub fn gaussian(sigma: f64) -> Result<Self, KernelError> {
        Gaussian::new(sigma).map(Kernel::Gaussian)
    }

    /// Construct from a name and an optional bandwidth.
    ///
    /// A bandwidth given for the linear kernel is ignored with a warning.
    pub fn from_tag(tag: &str, sigma: Option<f64>) -> Result<Self, KernelError> {
        match (tag, sigma) {
            ("linear", None) => Ok(Kernel::Linear),
            ("linear", Some(sigma)) => {
                warn!("ignoring bandwidth {} for the linear kernel", sigma);
                Ok(Kernel::Linear)
            },
            ("gaussian", None) => Err(KernelError::MissingBandwidth),
            ("gaussian", Some(sigma)) => Kernel::gaussian(sigma),
            (other, _) => Err(KernelError::UnknownKernel(other.to_string())),
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Kernel::Linear => "linear",
            Kernel::Gaussian(_) => "gaussian",
        }
    }

    pub fn sigma(&self) -> Option<f64> {
        match self {
            Kernel::Linear => None,
            Kernel::Gaussian(g) => Some(g.sigma()),
        }
    }

    /// `(m, n)` similarity matrix between the rows of `a` `(m, q)` and `b` `(n, q)`.
    pub fn matrix(
        &self,
        a: ArrayView2<'_, f64>,
        b: ArrayView2<'_, f64>,
    ) -> Result<Array2<f64>, KernelError> {
        if a.ncols() != b.ncols() {
            return Err(KernelError::WidthMismatch { left: a.ncols(), right: b.ncols() });
        }
        trace!("{} kernel matrix: {:?} x {:?}", self.tag(), a.dim(), b.dim());
        Ok(match self {
            Kernel::Linear => linear::matrix(a, b),
            Kernel::Gaussian(g) => g.matrix(a, b),
        })
    }

    /// Energy basis row `e[r] = Σ_i K(d_i, D_r)`, so that the energy is `e · w`.
    pub fn energy_row(
        &self,
        descriptors: ArrayView2<'_, f64>,
        reference: ArrayView2<'_, f64>,
    ) -> Result<Array1<f64>, KernelError> {
        Ok(self.matrix(descriptors, reference)?.sum_axis(Axis(0)))
    }

    /// `(3 n_atom, n_ref)` force matrix of a configuration whose descriptors are ready.
    pub fn force_matrix(
        &self,
        config: &Configuration,
        modes: &ModeVector,
        reference: ArrayView2<'_, f64>,
    ) -> Result<Array2<f64>, KernelError> {
        let neighbors = config.neighbors().ok_or(StructureError::NeighborsNotInitialized)?;
        let descriptors = config.descriptors().ok_or(StructureError::DescriptorsNotComputed)?;
        self.force_matrix_from_parts(neighbors, descriptors, modes, reference)
    }

    /// [`Kernel::force_matrix`] for data that does not live in a [`Configuration`].
    pub fn force_matrix_from_parts(
        &self,
        neighbors: &Neighbors,
        descriptors: ArrayView2<'_, f64>,
        modes: &ModeVector,
        reference: ArrayView2<'_, f64>,
    ) -> Result<Array2<f64>, KernelError> {
        check_mode_width("descriptor matrix", descriptors, modes)?;
        check_mode_width("reference batch", reference, modes)?;
        if neighbors.num_atoms() != descriptors.nrows() {
            return Err(KernelError::AtomCountMismatch {
                neighbors: neighbors.num_atoms(),
                descriptors: descriptors.nrows(),
            });
        }

        let geom = PairGeometry::new(neighbors, modes);
        let out = match self {
            Kernel::Linear => linear::force_matrix(&geom, reference),
            Kernel::Gaussian(g) => g.force_matrix(&geom, descriptors, reference),
        };
        trace!("{} force matrix: {:?}", self.tag(), out.dim());
        Ok(out)
    }
}

fn check_mode_width(
    what: &'static str,
    m: ArrayView2<'_, f64>,
    modes: &ModeVector,
) -> Result<(), KernelError> {
    match m.ncols() == modes.len() {
        true => Ok(()),
        false => Err(KernelError::ModeMismatch { what, width: m.ncols(), modes: modes.len() }),
    }
}

#[cfg(test)]
#[deny(unused)]
mod tests {
    use super::*;
    use crate::numerical::{self, DerivativeKind};

    use mlpot_structure::Lattice;
    use ndarray::{arr2, Array1, Array2};
    use rand::{Rng, SeedableRng};
    use rand::rngs::StdRng;
    use slice_of_array::prelude::*;

    const CUTOFF: f64 = 4.0;

    // every pair distance is at least 0.1 away from the cutoff
    const POSITIONS: &[[f64; 3]] = &[
        [1.0, 1.0, 1.0],
        [2.3, 1.4, 0.7],
        [0.2, 2.9, 1.8],
        [9.1, 0.5, 9.6],
        [3.5, 3.7, 2.9],
    ];

    struct Setup {
        lattice: Lattice,
        modes: ModeVector,
        reference: Array2<f64>,
        weights: Array1<f64>,
    }

    impl Setup {
        fn new(seed: u64) -> Self {
            let mut rng = StdRng::seed_from_u64(seed);
            let lattice = Lattice::cubic(10.0);
            let modes = ModeVector::new(CUTOFF, 4).unwrap();

            // reference descriptors from an unrelated configuration, plus our own
            let other: Vec<[f64; 3]> = (0..6).map(|_| {
                [rng.gen_range(0.0..6.0), rng.gen_range(0.0..6.0), rng.gen_range(0.0..6.0)]
            }).collect();
            let other = prepared(&other, &lattice, &modes);
            let own = prepared(POSITIONS, &lattice, &modes);
            let reference = ndarray::concatenate(Axis(0), &[
                other.descriptors().unwrap(),
                own.descriptors().unwrap(),
            ]).unwrap();

            let weights = (0..reference.nrows()).map(|_| rng.gen_range(-1.0..1.0)).collect();
            Setup { lattice, modes, reference, weights }
        }

        fn energy(&self, kernel: &Kernel, positions: &[[f64; 3]]) -> f64 {
            let config = prepared(positions, &self.lattice, &self.modes);
            let row = kernel.energy_row(config.descriptors().unwrap(), self.reference.view()).unwrap();
            row.dot(&self.weights)
        }

        fn analytic_forces(&self, kernel: &Kernel) -> Array1<f64> {
            let config = prepared(POSITIONS, &self.lattice, &self.modes);
            let t = kernel.force_matrix(&config, &self.modes, self.reference.view()).unwrap();
            assert_eq!(t.dim(), (3 * POSITIONS.len(), self.reference.nrows()));
            t.dot(&self.weights)
        }
    }

    fn prepared(positions: &[[f64; 3]], lattice: &Lattice, modes: &ModeVector) -> Configuration {
        let mut config = Configuration::new(positions.to_vec());
        config.prepare(CUTOFF, lattice, modes).unwrap();
        config
    }

    fn check_full_gradient(kernel: Kernel) {
        let setup = Setup::new(7);
        let analytic = setup.analytic_forces(&kernel);
        let numeric = numerical::gradient(1e-4, Some(DerivativeKind::Stencil(5)), POSITIONS.flat(), |x| {
            setup.energy(&kernel, x.nest())
        });
        let numeric_forces: Vec<f64> = numeric.iter().map(|g| -g).collect();
        assert_close!(rel=1e-6, abs=1e-8, analytic.to_vec(), numeric_forces);
    }

    // a single coordinate with the plain central difference (E(+δ) - E(-δ)) / 2δ
    fn check_central_difference(kernel: Kernel) {
        let setup = Setup::new(11);
        let analytic = setup.analytic_forces(&kernel);
        let (index, &expected) = analytic.iter().enumerate()
            .max_by(|a, b| a.1.abs().partial_cmp(&b.1.abs()).unwrap())
            .unwrap();

        let point = POSITIONS.flat()[index];
        let slope = numerical::slope(1e-4, Some(DerivativeKind::CentralDifference), point, |x| {
            let mut positions = POSITIONS.to_vec();
            positions.flat_mut()[index] = x;
            setup.energy(&kernel, &positions)
        });
        assert_close!(rel=1e-5, expected, -slope);
    }

    #[test]
    fn linear_forces_match_finite_differences() {
        check_full_gradient(Kernel::linear());
        check_central_difference(Kernel::linear());
    }

    #[test]
    fn gaussian_forces_match_finite_differences() {
        for &sigma in &[0.8, 2.0, 5.0] {
            check_full_gradient(Kernel::gaussian(sigma).unwrap());
            check_central_difference(Kernel::gaussian(sigma).unwrap());
        }
    }

    #[test]
    fn isolated_atoms_feel_no_force() {
        let lattice = Lattice::cubic(20.0);
        let modes = ModeVector::new(CUTOFF, 3).unwrap();
        let config = prepared(&[[1.0; 3], [11.0; 3]], &lattice, &modes);
        let reference = arr2(&[[0.5, 0.1, -0.3], [1.0, 2.0, 3.0]]);
        for kernel in vec![Kernel::linear(), Kernel::gaussian(1.0).unwrap()] {
            let t = kernel.force_matrix(&config, &modes, reference.view()).unwrap();
            assert_eq!(t, Array2::zeros((6, 2)));
        }
    }

    #[test]
    fn factory() {
        assert_eq!(Kernel::from_tag("linear", None), Ok(Kernel::Linear));
        assert_eq!(Kernel::from_tag("gaussian", None), Err(KernelError::MissingBandwidth));
        assert_eq!(Kernel::from_tag("gaussian", Some(-2.0)), Err(KernelError::NonPositiveBandwidth(-2.0)));
        assert_eq!(Kernel::from_tag("gaussian", Some(2.0)).unwrap().sigma(), Some(2.0));
        assert!(matches!(Kernel::from_tag("cubic", None), Err(KernelError::UnknownKernel(_))));
    }

    #[test]
    fn shape_checks() {
        let ones = Array2::<f64>::ones((1, 10));
        assert_eq!(Kernel::linear().matrix(ones.view(), ones.view()).unwrap(), arr2(&[[10.0]]));
        assert_eq!(
            Kernel::linear().matrix(ones.view(), Array2::ones((2, 9)).view()),
            Err(KernelError::WidthMismatch { left: 10, right: 9 }),
        );

        let zeros = Array2::<f64>::zeros((1, 3));
        let k = Kernel::gaussian(3.0).unwrap().matrix(zeros.view(), zeros.view()).unwrap();
        assert_eq!(k, arr2(&[[1.0]]));

        let lattice = Lattice::cubic(10.0);
        let modes = ModeVector::new(CUTOFF, 4).unwrap();
        let config = prepared(POSITIONS, &lattice, &modes);
        let wrong = Array2::zeros((2, 3));
        assert_eq!(
            Kernel::linear().force_matrix(&config, &modes, wrong.view()),
            Err(KernelError::ModeMismatch { what: "reference batch", width: 3, modes: 4 }),
        );

        let raw = Configuration::new(POSITIONS.to_vec());
        assert_eq!(
            Kernel::linear().force_matrix(&raw, &modes, Array2::zeros((2, 4)).view()),
            Err(KernelError::Structure(StructureError::NeighborsNotInitialized)),
        );
    }
}

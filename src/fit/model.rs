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

use crate::{FitError, FitTarget};

use mlpot_kernel::Kernel;
use mlpot_structure::{Configuration, Lattice, ModeVector};

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use slice_of_array::prelude::*;

/// Solved weights, aligned with the rows of the reference batch.
#[derive(Debug, Clone, PartialEq)]
pub enum Weights {
    /// One vector for both energies and forces.
    Joint(Array1<f64>),
    /// Independently fitted energy and force weights.
    Separate { energy: Array1<f64>, forces: Array1<f64> },
}

impl Weights {
    pub fn energy(&self) -> ArrayView1<'_, f64> {
        match self {
            Weights::Joint(w) => w.view(),
            Weights::Separate { energy, .. } => energy.view(),
        }
    }

    pub fn forces(&self) -> ArrayView1<'_, f64> {
        match self {
            Weights::Joint(w) => w.view(),
            Weights::Separate { forces, .. } => forces.view(),
        }
    }

    pub fn num_reference(&self) -> usize { self.energy().len() }

    pub fn num_sets(&self) -> usize {
        match self {
            Weights::Joint(_) => 1,
            Weights::Separate { .. } => 2,
        }
    }

    /// `w`, or `[w_E, w_F]` for separate weights.
    pub fn to_flat(&self) -> Array1<f64> {
        match self {
            Weights::Joint(w) => w.clone(),
            Weights::Separate { energy, forces } => energy.iter().chain(forces).cloned().collect(),
        }
    }

    /// Inverse of [`Weights::to_flat`].
    pub fn from_flat(target: FitTarget, num_reference: usize, flat: Array1<f64>) -> Result<Self, FitError> {
        let expected = num_reference * target.weight_sets();
        if flat.len() != expected {
            return Err(FitError::ShapeMismatch { what: "weight vector", expected, actual: flat.len() });
        }
        Ok(match target {
            FitTarget::Separate => Weights::Separate {
                energy: flat.slice(s![..num_reference]).to_owned(),
                forces: flat.slice(s![num_reference..]).to_owned(),
            },
            _ => Weights::Joint(flat),
        })
    }
}

/// Energy and forces predicted for one configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub energy: f64,
    pub forces: Vec<[f64; 3]>,
}

/// `(D, w, E_average)` together with what is needed to rebuild descriptors.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedModel {
    kernel: Kernel,
    cutoff: f64,
    modes: ModeVector,
    reference: Array2<f64>,
    weights: Weights,
    energy_average: f64,
    target: FitTarget,
}

impl FittedModel {
    /// Checks that the reference batch, mode vector and weights agree in shape.
    pub fn new(
        kernel: Kernel,
        cutoff: f64,
        modes: ModeVector,
        reference: Array2<f64>,
        weights: Weights,
        energy_average: f64,
        target: FitTarget,
    ) -> Result<Self, FitError> {
        if reference.ncols() != modes.len() {
            return Err(FitError::ShapeMismatch {
                what: "reference descriptor width",
                expected: modes.len(),
                actual: reference.ncols(),
            });
        }
        let layout_ok = match (&weights, target) {
            (Weights::Separate { .. }, FitTarget::Separate) => true,
            (Weights::Joint(_), FitTarget::Energy) => true,
            (Weights::Joint(_), FitTarget::EnergyAndForces) => true,
            _ => false,
        };
        if !layout_ok {
            return Err(FitError::ShapeMismatch {
                what: "weight sets for the fit target",
                expected: target.weight_sets(),
                actual: weights.num_sets(),
            });
        }
        for w in &[weights.energy(), weights.forces()] {
            if w.len() != reference.nrows() {
                return Err(FitError::ShapeMismatch {
                    what: "weights per reference descriptor",
                    expected: reference.nrows(),
                    actual: w.len(),
                });
            }
        }
        Ok(FittedModel { kernel, cutoff, modes, reference, weights, energy_average, target })
    }

    pub fn kernel(&self) -> &Kernel { &self.kernel }
    pub fn cutoff(&self) -> f64 { self.cutoff }
    pub fn modes(&self) -> &ModeVector { &self.modes }
    pub fn reference(&self) -> ArrayView2<'_, f64> { self.reference.view() }
    pub fn weights(&self) -> &Weights { &self.weights }
    pub fn energy_average(&self) -> f64 { self.energy_average }

    /// The observables the weights were fitted against.
    pub fn target(&self) -> FitTarget { self.target }

    /// Predict energy and forces, computing neighbors and descriptors as needed.
    pub fn predict(&self, config: &mut Configuration, lattice: &Lattice) -> Result<Prediction, FitError> {
        config.prepare(self.cutoff, lattice, &self.modes)?;
        let energy = self.predict_energy(config)?;
        let forces = self.kernel.force_matrix(config, &self.modes, self.reference.view())?
            .dot(&self.weights.forces());
        Ok(Prediction { energy, forces: forces.to_vec().nest().to_vec() })
    }

    /// Energy of a configuration whose descriptors are ready.
    pub fn predict_energy(&self, config: &Configuration) -> Result<f64, FitError> {
        let descriptors = config.descriptors()
            .ok_or(mlpot_structure::StructureError::DescriptorsNotComputed)?;
        let row = self.kernel.energy_row(descriptors, self.reference.view())?;
        Ok(row.dot(&self.weights.energy()) + self.energy_average)
    }
}

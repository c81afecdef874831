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

use crate::{Lattice, ModeVector, Neighbors, StructureError};
use crate::algo::descriptor::sine_descriptors;

use ndarray::{Array2, ArrayView2};

/// One snapshot of a periodic system.
///
/// Neighbor data and descriptors are derived lazily and follow a strict
/// progression `Raw -> NeighborsReady -> DescriptorsReady`. Calls that would
/// skip or repeat a step fail instead of silently recomputing; use
/// [`Configuration::clear`] to start over.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    positions: Vec<[f64; 3]>,
    energy: Option<f64>,
    forces: Option<Vec<[f64; 3]>>,
    state: State,
}

#[derive(Debug, Clone, PartialEq)]
enum State {
    Raw,
    NeighborsReady(Neighbors),
    DescriptorsReady(Neighbors, ModeVector, Array2<f64>),
}

/// Observable progress of a [`Configuration`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Stage {
    Raw,
    NeighborsReady,
    DescriptorsReady,
}

impl Configuration {
    /// A configuration without reference data, e.g. for prediction.
    pub fn new(positions: Vec<[f64; 3]>) -> Self {
        Configuration { positions, energy: None, forces: None, state: State::Raw }
    }

    pub fn with_energy(mut self, energy: f64) -> Self {
        self.energy = Some(energy);
        self
    }

    /// Attach reference forces; there must be one per atom.
    pub fn with_forces(mut self, forces: Vec<[f64; 3]>) -> Result<Self, StructureError> {
        if forces.len() != self.positions.len() {
            return Err(StructureError::CountMismatch {
                what: "force vectors",
                expected: self.positions.len(),
                actual: forces.len(),
            });
        }
        self.forces = Some(forces);
        Ok(self)
    }

    pub fn num_atoms(&self) -> usize { self.positions.len() }
    pub fn positions(&self) -> &[[f64; 3]] { &self.positions }
    pub fn energy(&self) -> Option<f64> { self.energy }
    pub fn forces(&self) -> Option<&[[f64; 3]]> { self.forces.as_ref().map(|f| &f[..]) }

    pub fn stage(&self) -> Stage {
        match self.state {
            State::Raw => Stage::Raw,
            State::NeighborsReady(_) => Stage::NeighborsReady,
            State::DescriptorsReady(..) => Stage::DescriptorsReady,
        }
    }

    /// Compute minimum-image neighbor data. Only valid on a `Raw` configuration.
    pub fn init_neighbors(&mut self, cutoff: f64, lattice: &Lattice) -> Result<(), StructureError> {
        if self.stage() != Stage::Raw {
            return Err(StructureError::NeighborsAlreadyInitialized);
        }
        let neighbors = Neighbors::compute(&self.positions, lattice, cutoff)?;
        self.state = State::NeighborsReady(neighbors);
        Ok(())
    }

    /// Compute the sine descriptors. Requires neighbors, and fails if descriptors exist.
    pub fn init_descriptors(&mut self, modes: &ModeVector) -> Result<(), StructureError> {
        let state = std::mem::replace(&mut self.state, State::Raw);
        let (result, state) = match state {
            State::Raw => (Err(StructureError::NeighborsNotInitialized), State::Raw),
            state @ State::DescriptorsReady(..) => (Err(StructureError::DescriptorsAlreadyComputed), state),
            State::NeighborsReady(neighbors) => {
                let descriptors = sine_descriptors(&neighbors, modes);
                (Ok(()), State::DescriptorsReady(neighbors, modes.clone(), descriptors))
            },
        };
        self.state = state;
        result
    }

    /// Bring the configuration to `DescriptorsReady` from whatever stage it is in.
    ///
    /// A configuration whose neighbors were computed with a different cutoff, or
    /// whose descriptors were computed with a different mode vector, is rejected.
    pub fn prepare(
        &mut self,
        cutoff: f64,
        lattice: &Lattice,
        modes: &ModeVector,
    ) -> Result<(), StructureError> {
        if let Some(neighbors) = self.neighbors() {
            if neighbors.cutoff() != cutoff {
                return Err(StructureError::CutoffMismatch { expected: cutoff, actual: neighbors.cutoff() });
            }
        }
        if let Some(prepared) = self.modes() {
            if prepared != modes {
                return Err(StructureError::ModeMismatch { expected: modes.len(), actual: prepared.len() });
            }
        }
        if self.stage() == Stage::Raw {
            self.init_neighbors(cutoff, lattice)?;
        }
        if self.stage() == Stage::NeighborsReady {
            self.init_descriptors(modes)?;
        }
        Ok(())
    }

    /// Drop all derived data.
    pub fn clear(&mut self) { self.state = State::Raw; }

    /// Replace the positions (e.g. after an integration step). Derived data is dropped.
    pub fn set_positions(&mut self, positions: Vec<[f64; 3]>) -> Result<(), StructureError> {
        if positions.len() != self.positions.len() {
            return Err(StructureError::CountMismatch {
                what: "positions",
                expected: self.positions.len(),
                actual: positions.len(),
            });
        }
        self.positions = positions;
        self.clear();
        Ok(())
    }

    pub fn neighbors(&self) -> Option<&Neighbors> {
        match &self.state {
            State::Raw => None,
            State::NeighborsReady(neighbors) |
            State::DescriptorsReady(neighbors, ..) => Some(neighbors),
        }
    }

    /// The mode vector the descriptors were computed with.
    pub fn modes(&self) -> Option<&ModeVector> {
        match &self.state {
            State::DescriptorsReady(_, modes, _) => Some(modes),
            _ => None,
        }
    }

    /// `(n_atom, n_modes)` descriptor matrix.
    pub fn descriptors(&self) -> Option<ArrayView2<'_, f64>> {
        match &self.state {
            State::DescriptorsReady(_, _, descriptors) => Some(descriptors.view()),
            _ => None,
        }
    }
}

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

use crate::{FitError, MemoryLimit};

use mlpot_kernel::Kernel;
use mlpot_linalg::RidgeError;
use mlpot_structure::{ModeVector, StructureError};

/// Which observables the ridge weights are fitted against.
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde-support", serde(rename_all = "kebab-case"))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FitTarget {
    /// `K w = E`.
    Energy,
    /// One weight vector for the stacked system `[K; T] w = [E; F]`.
    EnergyAndForces,
    /// Independent solves `K w_E = E` and `T w_F = F`.
    Separate,
}

impl FitTarget {
    /// Number of stored weights per reference descriptor.
    pub fn weight_sets(self) -> usize {
        match self {
            FitTarget::Energy | FitTarget::EnergyAndForces => 1,
            FitTarget::Separate => 2,
        }
    }
}

/// A high-level control of how multiple cores are used.
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde-support", serde(rename_all = "kebab-case"))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Threading {
    /// Per-configuration work is spread over the rayon thread pool.
    Rayon,
    /// Everything runs on the calling thread.
    Serial,
}

impl Threading {
    pub fn is_parallel(self) -> bool { self == Threading::Rayon }
}

impl Default for Threading {
    fn default() -> Self { Threading::Rayon }
}

/// Everything that stays fixed during one fitting run.
#[derive(Debug, Clone, PartialEq)]
pub struct FitSettings {
    /// Neighbor cutoff radius.
    pub cutoff: f64,
    pub num_modes: usize,
    pub kernel: Kernel,
    /// Ridge penalty; must be positive.
    pub lambda: f64,
    pub target: FitTarget,
    pub threading: Threading,
    pub memory_limit: MemoryLimit,
}

impl FitSettings {
    pub fn new(cutoff: f64, num_modes: usize, kernel: Kernel, lambda: f64) -> Self {
        FitSettings {
            cutoff,
            num_modes,
            kernel,
            lambda,
            target: FitTarget::EnergyAndForces,
            threading: Threading::default(),
            memory_limit: MemoryLimit::default(),
        }
    }

    /// Sine-basis frequencies `n π / cutoff`.
    pub fn modes(&self) -> Result<ModeVector, StructureError> {
        ModeVector::new(self.cutoff, self.num_modes)
    }

    /// Checks that do not need any data.
    pub fn validate(&self) -> Result<(), FitError> {
        self.modes()?;
        if !(self.lambda > 0.0 && self.lambda.is_finite()) {
            return Err(RidgeError::NonPositivePenalty(self.lambda).into());
        }
        Ok(())
    }
}

#[cfg(test)]
#[deny(unused)]
mod tests {
    use super::*;

    #[test]
    fn validation() {
        let settings = FitSettings::new(4.0, 8, Kernel::linear(), 1e-8);
        assert!(settings.validate().is_ok());
        assert_eq!(settings.modes().unwrap().len(), 8);

        let bad = FitSettings { lambda: 0.0, ..settings.clone() };
        assert_eq!(bad.validate(), Err(FitError::Ridge(RidgeError::NonPositivePenalty(0.0))));

        let bad = FitSettings { num_modes: 0, ..settings.clone() };
        assert_eq!(bad.validate(), Err(FitError::Structure(StructureError::NoModes)));
    }
}

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

use std::convert::TryFrom;
use std::fmt;
use std::mem::size_of;

/// Ceiling on the dense matrices allocated by a fit.
///
/// Estimates are checked before allocating; there is no chunked fallback.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MemoryLimit {
    bytes: u64,
}

impl MemoryLimit {
    pub const DEFAULT_MB: u64 = 4096;

    pub fn from_bytes(bytes: u64) -> Self { MemoryLimit { bytes } }
    pub fn from_mb(mb: u64) -> Self { MemoryLimit { bytes: mb.saturating_mul(1 << 20) } }
    pub fn unlimited() -> Self { MemoryLimit { bytes: u64::MAX } }

    pub fn bytes(&self) -> u64 { self.bytes }

    /// Fail if `elements` f64 values would not fit.
    pub fn check(&self, what: &'static str, elements: u128) -> Result<(), FitError> {
        let required = elements.saturating_mul(size_of::<f64>() as u128);
        if required > self.bytes as u128 {
            let required = u64::try_from(required).unwrap_or(u64::MAX);
            return Err(FitError::MemoryLimitExceeded { what, required, limit: self.bytes });
        }
        Ok(())
    }
}

impl Default for MemoryLimit {
    fn default() -> Self { MemoryLimit::from_mb(Self::DEFAULT_MB) }
}

/// Element counts of the dense matrices of one fit.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MemoryEstimate {
    /// Descriptor tensor `C` plus the reference batch `D`.
    pub descriptors: u128,
    /// Energy matrix `K`.
    pub energy_matrix: u128,
    /// Force matrix `T`.
    pub force_matrix: u128,
    /// Copy made when `K` and `T` are stacked.
    pub stacked: u128,
    /// Largest matrix handed to the factorization.
    pub normal_matrix: u128,
    /// The factorization works on its own copy of the normal matrix.
    pub factorization: u128,
    /// Kernel block and force block held by each worker while `K` and `T` are filled.
    pub worker_scratch: u128,
}

impl MemoryEstimate {
    /// `workers` is the number of configurations processed at once.
    pub fn new(
        num_configs: usize,
        num_atoms: usize,
        num_modes: usize,
        target: FitTarget,
        workers: usize,
    ) -> Self {
        let (n_conf, n_atom, n_modes) = (num_configs as u128, num_atoms as u128, num_modes as u128);
        let workers = u128::min(u128::max(workers as u128, 1), u128::max(n_conf, 1));
        let n_ref = n_conf * n_atom;
        let force_rows = 3 * n_conf * n_atom;

        // the solver factorizes whichever of KᵗK and KKᵗ is smaller (mlpot_linalg::Form::Auto)
        let system = |rows: u128| u128::min(rows, n_ref).pow(2);

        let (stacked, normal_matrix) = match target {
            FitTarget::Energy => (0, system(n_conf)),
            FitTarget::EnergyAndForces => ((n_conf + force_rows) * n_ref, system(n_conf + force_rows)),
            FitTarget::Separate => (0, u128::max(system(n_conf), system(force_rows))),
        };

        MemoryEstimate {
            descriptors: 2 * n_ref * n_modes,
            energy_matrix: n_conf * n_ref,
            force_matrix: force_rows * n_ref,
            stacked,
            normal_matrix,
            factorization: normal_matrix,
            worker_scratch: workers * (n_atom + 3 * n_atom) * n_ref,
        }
    }

    pub fn total(&self) -> u128 {
        self.descriptors + self.energy_matrix + self.force_matrix + self.stacked
            + self.normal_matrix + self.factorization + self.worker_scratch
    }

    /// Checks the largest single matrix first, so the error names the culprit.
    pub fn check(&self, limit: MemoryLimit) -> Result<(), FitError> {
        limit.check("force matrix", self.force_matrix)?;
        limit.check("stacked linear system", self.stacked)?;
        limit.check("normal equations", self.normal_matrix + self.factorization)?;
        limit.check("dense matrices of the fit", self.total())
    }
}

impl fmt::Display for MemoryEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mib = |elements: u128| (elements * size_of::<f64>() as u128) as f64 / (1u64 << 20) as f64;
        write!(
            f, "{:.1} MiB (C/D {:.1}, K {:.1}, T {:.1}, stacked {:.1}, normal {:.1} x2, scratch {:.1})",
            mib(self.total()), mib(self.descriptors), mib(self.energy_matrix),
            mib(self.force_matrix), mib(self.stacked), mib(self.normal_matrix),
            mib(self.worker_scratch),
        )
    }
}

#[cfg(test)]
#[deny(unused)]
mod tests {
    use super::*;

    #[test]
    fn estimate() {
        let est = MemoryEstimate::new(10, 4, 3, FitTarget::EnergyAndForces, 1);
        assert_eq!(est.descriptors, 2 * 40 * 3);
        assert_eq!(est.energy_matrix, 10 * 40);
        assert_eq!(est.force_matrix, 120 * 40);
        assert_eq!(est.stacked, 130 * 40);
        // 130 rows, 40 columns: primal form
        assert_eq!(est.normal_matrix, 40 * 40);
        assert_eq!(est.factorization, est.normal_matrix);
        assert_eq!(est.worker_scratch, (4 + 12) * 40);
        assert_eq!(
            est.total(),
            240 + 400 + 4800 + 5200 + 2 * 1600 + 640,
        );

        let est = MemoryEstimate::new(10, 4, 3, FitTarget::Energy, 1);
        // 10 rows, 40 columns: dual form
        assert_eq!(est.normal_matrix, 10 * 10);
        assert_eq!(est.stacked, 0);
    }

    #[test]
    fn limit() {
        let est = MemoryEstimate::new(100, 64, 10, FitTarget::EnergyAndForces, 1);
        assert!(est.check(MemoryLimit::unlimited()).is_ok());
        match est.check(MemoryLimit::from_mb(1)) {
            Err(FitError::MemoryLimitExceeded { what, limit, .. }) => {
                assert_eq!(what, "force matrix");
                assert_eq!(limit, 1 << 20);
            },
            r => panic!("unexpected: {:?}", r),
        }
        assert_eq!(MemoryLimit::default().bytes(), 4096 << 20);
    }

    #[test]
    fn scratch_grows_with_workers() {
        let serial = MemoryEstimate::new(10, 4, 3, FitTarget::Separate, 1);
        let parallel = MemoryEstimate::new(10, 4, 3, FitTarget::Separate, 4);
        assert_eq!(parallel.worker_scratch, 4 * serial.worker_scratch);
        // never more workers than configurations
        let capped = MemoryEstimate::new(10, 4, 3, FitTarget::Separate, 64);
        assert_eq!(capped.worker_scratch, 10 * serial.worker_scratch);

        // a limit that fits the matrices but not the factorization copy
        let est = MemoryEstimate::new(10, 4, 3, FitTarget::Separate, 1);
        let once = (est.total() - est.factorization) as u64 * 8;
        assert!(est.check(MemoryLimit::from_bytes(once)).is_err());
        assert!(est.check(MemoryLimit::from_bytes(est.total() as u64 * 8)).is_ok());
    }
}

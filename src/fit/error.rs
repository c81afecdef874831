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

use mlpot_kernel::KernelError;
use mlpot_linalg::RidgeError;
use mlpot_structure::StructureError;

use std::fmt;

/// Broad categories of failure, for callers that need to decide what to report.
///
/// None of them are worth retrying with the same input.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorClass {
    /// Bad input or settings: shapes, cutoffs, missing data, penalty.
    Precondition,
    /// The linear algebra broke down despite valid settings.
    Numerical,
    /// The dense matrices would not fit under the memory limit.
    ResourceExhausted,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorClass::Precondition => "precondition violated",
            ErrorClass::Numerical => "numerical failure",
            ErrorClass::ResourceExhausted => "resource exhausted",
        })
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FitError {
    #[error("no training configurations were given")]
    EmptyTrainingSet,

    #[error("configuration {index}: {source}")]
    Configuration { index: usize, #[source] source: StructureError },

    #[error("configuration {index} has no reference energy")]
    MissingEnergy { index: usize },

    #[error("configuration {index} has no reference forces")]
    MissingForces { index: usize },

    #[error("configuration {index} has {actual} atoms, expected {expected}")]
    AtomCountMismatch { index: usize, expected: usize, actual: usize },

    #[error("{what}: expected {expected} values, got {actual}")]
    ShapeMismatch { what: &'static str, expected: usize, actual: usize },

    #[error("{what} needs {required} bytes, above the limit of {limit} bytes")]
    MemoryLimitExceeded { what: &'static str, required: u64, limit: u64 },

    #[error(transparent)]
    Structure(#[from] StructureError),

    #[error(transparent)]
    Kernel(#[from] KernelError),

    #[error(transparent)]
    Ridge(#[from] RidgeError),
}

impl FitError {
    pub fn class(&self) -> ErrorClass {
        match self {
            FitError::MemoryLimitExceeded { .. } => ErrorClass::ResourceExhausted,
            FitError::Ridge(RidgeError::NotPositiveDefinite(_)) |
            FitError::Ridge(RidgeError::NonFinite) => ErrorClass::Numerical,
            _ => ErrorClass::Precondition,
        }
    }
}

#[cfg(test)]
#[deny(unused)]
mod tests {
    use super::*;

    #[test]
    fn classes() {
        assert_eq!(FitError::EmptyTrainingSet.class(), ErrorClass::Precondition);
        assert_eq!(FitError::Ridge(RidgeError::NonPositivePenalty(0.0)).class(), ErrorClass::Precondition);
        assert_eq!(FitError::Ridge(RidgeError::NotPositiveDefinite(3)).class(), ErrorClass::Numerical);
        assert_eq!(FitError::Kernel(KernelError::MissingBandwidth).class(), ErrorClass::Precondition);
        let err = FitError::MemoryLimitExceeded { what: "force matrix", required: 10, limit: 5 };
        assert_eq!(err.class(), ErrorClass::ResourceExhausted);
        assert_eq!(err.to_string(), "force matrix needs 10 bytes, above the limit of 5 bytes");
        assert_eq!(err.class().to_string(), "resource exhausted");
    }
}

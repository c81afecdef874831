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

/// Precondition violations raised while building neighbor tables and descriptors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StructureError {
    #[error("neighbors not initialized; call init_neighbors before computing descriptors")]
    NeighborsNotInitialized,

    #[error("descriptors not computed; call init_descriptors first")]
    DescriptorsNotComputed,

    #[error("neighbors were already initialized for this configuration")]
    NeighborsAlreadyInitialized,

    #[error("descriptors were already computed for this configuration")]
    DescriptorsAlreadyComputed,

    #[error("cutoff must be positive and finite (got {0})")]
    NonPositiveCutoff(f64),

    #[error("cutoff {cutoff} must be smaller than half the shortest box length ({max})")]
    CutoffTooLarge { cutoff: f64, max: f64 },

    #[error("only orthorhombic (diagonal) lattices are supported, got {0:?}")]
    NonOrthorhombicLattice([[f64; 3]; 3]),

    #[error("configuration was prepared with cutoff {actual}, expected {expected}")]
    CutoffMismatch { expected: f64, actual: f64 },

    #[error("configuration was prepared with a different mode vector ({actual} modes, expected {expected})")]
    ModeMismatch { expected: usize, actual: usize },

    #[error("the mode vector must contain at least one mode")]
    NoModes,

    #[error("mode {index} must be strictly positive (got {value})")]
    NonPositiveMode { index: usize, value: f64 },

    #[error("expected {expected} {what}, got {actual}")]
    CountMismatch { what: &'static str, expected: usize, actual: usize },
}

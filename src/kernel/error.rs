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

use mlpot_structure::StructureError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum KernelError {
    #[error("unknown kernel '{0}' (expected 'linear' or 'gaussian')")]
    UnknownKernel(String),

    #[error("the gaussian kernel requires a bandwidth (sigma)")]
    MissingBandwidth,

    #[error("gaussian bandwidth must be positive and finite (got {0})")]
    NonPositiveBandwidth(f64),

    #[error("kernel arguments have {left} and {right} columns")]
    WidthMismatch { left: usize, right: usize },

    #[error("{what} has {width} columns, but there are {modes} modes")]
    ModeMismatch { what: &'static str, width: usize, modes: usize },

    #[error("neighbor data is for {neighbors} atoms, but {descriptors} descriptor rows were given")]
    AtomCountMismatch { neighbors: usize, descriptors: usize },

    #[error("configuration is not ready: {0}")]
    Structure(#[from] StructureError),
}

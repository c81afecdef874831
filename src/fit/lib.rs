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

//! Training-system assembly and ridge fitting of kernel potentials.
//!
//! [`assemble`] turns a set of configurations with reference energies and forces
//! into the energy matrix `K` and force matrix `T`; [`TrainingSystem::fit`] solves
//! for the weights; [`FittedModel::predict`] applies them to new configurations.

#[macro_use] extern crate log;
#[macro_use] extern crate ndarray;
#[cfg(feature = "serde-support")] #[macro_use] extern crate serde_derive;
#[cfg(test)] #[macro_use] extern crate mlpot_assert_close;

mod error;
mod settings;
mod memory;
mod assemble;
mod model;
mod evaluate;

//---------------------------
// public reexports; API

pub use crate::error::{ErrorClass, FitError};
pub use crate::settings::{FitSettings, FitTarget, Threading};
pub use crate::memory::{MemoryEstimate, MemoryLimit};
pub use crate::assemble::{assemble, fit, TrainingSystem};
pub use crate::model::{FittedModel, Prediction, Weights};
pub use crate::evaluate::{evaluate, ErrorReport};

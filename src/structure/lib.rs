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

//! Periodic configurations, minimum-image neighbor tables and sine-basis descriptors.

#[macro_use] extern crate log;
#[macro_use] extern crate ndarray;
#[cfg(test)] #[macro_use] extern crate mlpot_assert_close;

mod core;
mod algo;
mod error;

//---------------------------
// public reexports; API

pub use crate::core::lattice::{Lattice, ORTHORHOMBIC_TOL};
pub use crate::core::configuration::{Configuration, Stage};

pub use crate::algo::neighbors::Neighbors;
pub use crate::algo::descriptor::{ModeVector, sine_descriptors};

pub use crate::error::StructureError;

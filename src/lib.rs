/* ********************************************************************** **
**  This file is part of mlpot.                                           **
**                                                                        **
**  mlpot is free software: you can redistribute it and/or modify it      **
**  under the terms of the GNU General Public License as published by     **
**  the Free Software Foundation, either version 3 of the License, or     **
**  (at your option) any later version.                                   **
**                                                                        **
**      http://www.gnu.org/licenses/                                      **
**                                                                        **
** Do note that, while the whole of mlpot is licensed under the GPL, many **
** parts of it are licensed under more permissive terms.                  **
** ********************************************************************** */

//! Kernel-regression interatomic potentials fitted to OUTCAR trajectories.
//!
//! The functionality lives in the member crates, re-exported here under short names.

pub use mlpot_structure as structure;
pub use mlpot_linalg as linalg;
pub use mlpot_kernel as kernel;
pub use mlpot_fit as fit;
pub use mlpot_outcar_io as outcar;
pub use mlpot_tasks_config as config;
pub use mlpot_tasks as tasks;

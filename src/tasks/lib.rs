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

//! The high-level commands of mlpot.
//!
//! This crate is where library errors meet the user: everything here returns
//! `failure::Error`, and the entry points log every cause before exiting.

#[macro_use] extern crate log;
#[macro_use] extern crate failure;
#[macro_use] extern crate serde_derive;
#[macro_use] extern crate lazy_static;
#[macro_use] extern crate clap;

pub type FailResult<T> = Result<T, failure::Error>;

mod traits;
mod ui;
mod model_io;
mod cmd;

pub mod entry_points;

pub use crate::traits::{Save, Load, Json};
pub use crate::ui::logging::{init_global_logger, SetGlobalLogfile, ColorizedLevel};
pub use crate::model_io::StoredModel;
pub use crate::cmd::{TrainArgs, run_train, PredictArgs, run_predict, PredictionRecord};

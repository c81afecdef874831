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

pub use self::train::{TrainArgs, run_train};
mod train;

pub use self::predict::{PredictArgs, run_predict, PredictionRecord};
mod predict;

use crate::FailResult;

use mlpot_fit::FitError;
use mlpot_outcar_io::Frame;
use mlpot_structure::Configuration;

/// Attach the error class, which the library leaves for the caller to report.
fn describe_fit_error(e: FitError) -> failure::Error {
    let class = e.class();
    failure::Error::from(e).context(format!("fitting failed: {}", class)).into()
}

fn frames_to_configurations(frames: Vec<Frame>) -> FailResult<Vec<Configuration>> {
    frames.into_iter()
        .map(|frame| {
            let index = frame.index;
            frame.into_configuration()
                .map_err(|e| format_err!("ionic step {}: {}", index, e))
        })
        .collect()
}

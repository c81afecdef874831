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

use super::{describe_fit_error, frames_to_configurations};
use crate::FailResult;
use crate::model_io::{create_model_dir, StoredModel};
use crate::traits::Save;
use crate::ui::logging::SetGlobalLogfile;

use mlpot_fit::{assemble, evaluate};
use mlpot_fs_util as fsx;
use mlpot_outcar_io::Outcar;
use mlpot_tasks_config::{ValidatedSettings, YamlRead};

use std::path::PathBuf;

pub const LOG_FILE: &str = "mlpot.log";
pub const SETTINGS_FILE: &str = "settings.yaml";

#[derive(Debug, Clone)]
pub struct TrainArgs {
    pub settings: PathBuf,
    pub outcar: PathBuf,
    pub model_dir: PathBuf,
    /// Replace an existing model directory.
    pub force: bool,
}

/// Fit a model to the ionic steps of an OUTCAR and save it.
///
/// When a `logfile` token is given, the log is written into the model directory.
pub fn run_train(args: &TrainArgs, logfile: Option<SetGlobalLogfile>) -> FailResult<StoredModel> {
    let TrainArgs { settings, outcar, model_dir, force } = args;

    // validate before an existing model directory is touched
    let settings = ValidatedSettings::from_reader(fsx::open_text(settings)?)?;
    let ValidatedSettings(ref raw_settings) = settings;
    let fit_settings = settings.fit_settings()?;

    let outcar = Outcar::from_path(outcar)?;
    let lattice = outcar.lattice()?;
    lattice.check_cutoff(fit_settings.cutoff)?;

    create_model_dir(model_dir, *force)?;
    if let Some(logfile) = logfile {
        logfile.start(model_dir.join(LOG_FILE))?;
    }
    fsx::write(model_dir.join(SETTINGS_FILE), settings.to_yaml_string()?)?;

    let frames = outcar.configurations(raw_settings.step_size)?;
    let mut configs = frames_to_configurations(frames)?;
    info!("training on {} configurations", configs.len());

    let system = assemble(&mut configs, &lattice, &fit_settings).map_err(describe_fit_error)?;
    let model = system.fit(fit_settings.target, fit_settings.lambda).map_err(describe_fit_error)?;
    let num_atoms = system.num_atoms();
    drop(system);

    let (_, report) = evaluate(&model, &mut configs, &lattice)?;
    info!("training error:\n{}", report);

    let stored = StoredModel { model, lattice, num_atoms };
    stored.save(model_dir)?;
    Ok(stored)
}

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
use crate::model_io::StoredModel;
use crate::traits::{Json, Load, Save};

use mlpot_fit::{evaluate, ErrorReport};
use mlpot_outcar_io::Outcar;

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct PredictArgs {
    pub model_dir: PathBuf,
    pub outcar: PathBuf,
    /// Index of the first ionic step to predict.
    pub offset: usize,
    pub step_size: usize,
    /// Where to write the predictions as JSON.
    pub output: Option<PathBuf>,
}

/// Predicted and (when available) reference values of one ionic step.
#[derive(Serialize, Deserialize)]
#[derive(Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct PredictionRecord {
    /// Position of the step in the OUTCAR.
    pub index: usize,
    pub energy: f64,
    pub forces: Vec<[f64; 3]>,
    pub reference_energy: Option<f64>,
    pub reference_forces: Option<Vec<[f64; 3]>>,
}

/// Apply a stored model to the ionic steps of an OUTCAR.
pub fn run_predict(args: &PredictArgs) -> FailResult<(Vec<PredictionRecord>, ErrorReport)> {
    let PredictArgs { model_dir, outcar, offset, step_size, output } = args;

    let StoredModel { model, lattice: trained_lattice, num_atoms } = StoredModel::load(model_dir)?;

    let outcar = Outcar::from_path(outcar)?;
    let lattice = outcar.lattice()?;
    if lattice != trained_lattice {
        warn!("the cell {:?} differs from the training cell {:?}", lattice.matrix(), trained_lattice.matrix());
    }

    let frames = outcar.configurations_from(*offset, *step_size)?;
    let indices: Vec<_> = frames.iter().map(|frame| frame.index).collect();
    let mut configs = frames_to_configurations(frames)?;
    if let Some(config) = configs.iter().find(|c| c.num_atoms() != num_atoms) {
        warn!("predicting for {} atoms with a model trained on {}", config.num_atoms(), num_atoms);
    }

    let (predictions, report) = evaluate(&model, &mut configs, &lattice).map_err(describe_fit_error)?;
    info!("prediction error:\n{}", report);

    let records: Vec<_> = indices.into_iter()
        .zip(configs)
        .zip(predictions)
        .map(|((index, config), prediction)| PredictionRecord {
            index,
            energy: prediction.energy,
            forces: prediction.forces,
            reference_energy: config.energy(),
            reference_forces: config.forces().map(|f| f.to_vec()),
        })
        .collect();

    if let Some(output) = output {
        Json(&records).save(output)?;
        info!("wrote {} predictions to {}", records.len(), output.display());
    }
    Ok((records, report))
}

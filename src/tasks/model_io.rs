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

//! On-disk layout of a fitted model.
//!
//! ```text
//! MODEL_DIR/
//!   descriptors.dat     reference descriptors, one row per reference atom
//!   weights.dat         one weight per line ([w_E, w_F] for separate fits)
//!   energy-offset.dat   "E_average E_average"
//!   model.json          everything needed to interpret the tables
//! ```

use crate::FailResult;
use crate::traits::{Json, Load, Save};

use mlpot_fit::{FitTarget, FittedModel, Weights};
use mlpot_fs_util as fsx;
use mlpot_kernel::Kernel;
use mlpot_structure::{Lattice, ModeVector};
use mlpot_tasks_config::{KernelGaussian, KernelSettings};

use ndarray::{Array1, Array2};
use std::io::Write;
use std::path::Path;

const FORMAT_VERSION: u32 = 1;

const DESCRIPTORS_FILE: &str = "descriptors.dat";
const WEIGHTS_FILE: &str = "weights.dat";
const ENERGY_OFFSET_FILE: &str = "energy-offset.dat";
const META_FILE: &str = "model.json";

/// A fitted model together with the cell it was trained in.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredModel {
    pub model: FittedModel,
    pub lattice: Lattice,
    /// Atoms per training configuration.
    pub num_atoms: usize,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct StoredModelMeta {
    format_version: u32,
    cutoff: f64,
    num_modes: usize,
    kernel: KernelSettings,
    fit_target: FitTarget,
    num_atoms: usize,
    num_reference: usize,
    lattice: [[f64; 3]; 3],
}

/// Create an empty model directory.
///
/// An existing non-empty directory is an error, unless `force` is given, in which
/// case it is deleted first.
pub fn create_model_dir(dir: impl AsRef<Path>, force: bool) -> FailResult<()> {
    let dir = dir.as_ref();
    if !fsx::is_missing_or_empty_dir(dir)? {
        if !force {
            bail!("{}: already exists and is not empty (use --force to replace it)", dir.display());
        }
        warn!("replacing existing directory {}", dir.display());
        fsx::rm_rf(dir)?;
    }
    fsx::create_dir_all(dir)?;
    Ok(())
}

impl Save for StoredModel {
    fn save(&self, dir: impl AsRef<Path>) -> FailResult<()> {
        let dir = dir.as_ref();
        fsx::create_dir_all(dir)?; // (does not fail on existing directories)
        let StoredModel { model, lattice, num_atoms } = self;

        let mut file = fsx::create_text(dir.join(DESCRIPTORS_FILE))?;
        for row in model.reference().outer_iter() {
            let words: Vec<_> = row.iter().map(|x| format!("{:.18e}", x)).collect();
            writeln!(file, "{}", words.join(" "))?;
        }
        file.flush()?;

        let mut file = fsx::create_text(dir.join(WEIGHTS_FILE))?;
        for w in model.weights().to_flat().iter() {
            writeln!(file, "{:.18e}", w)?;
        }
        file.flush()?;

        let e = model.energy_average();
        fsx::write(dir.join(ENERGY_OFFSET_FILE), format!("{:.18e} {:.18e}\n", e, e))?;

        Json(StoredModelMeta {
            format_version: FORMAT_VERSION,
            cutoff: model.cutoff(),
            num_modes: model.modes().len(),
            kernel: kernel_settings(model.kernel()),
            fit_target: model.target(),
            num_atoms: *num_atoms,
            num_reference: model.weights().num_reference(),
            lattice: *lattice.matrix(),
        }).save(dir.join(META_FILE))?;

        info!("saved model ({} reference descriptors) to {}", model.weights().num_reference(), dir.display());
        Ok(())
    }
}

impl Load for StoredModel {
    fn load(dir: impl AsRef<Path>) -> FailResult<Self> {
        let dir = dir.as_ref();

        let Json(meta) = Json::<StoredModelMeta>::load(dir.join(META_FILE))?;
        let StoredModelMeta {
            format_version, cutoff, num_modes, kernel, fit_target, num_atoms, num_reference, lattice,
        } = meta;
        ensure!(
            format_version == FORMAT_VERSION,
            "{}: unsupported format version {} (expected {})", META_FILE, format_version, FORMAT_VERSION,
        );

        let rows = read_table(&dir.join(DESCRIPTORS_FILE))?;
        ensure!(
            rows.len() == num_reference,
            "{}: {} rows, expected {}", DESCRIPTORS_FILE, rows.len(), num_reference,
        );
        let mut reference = Array2::zeros((num_reference, num_modes));
        for (i, row) in rows.iter().enumerate() {
            ensure!(
                row.len() == num_modes,
                "{}: row {} has {} columns, expected {}", DESCRIPTORS_FILE, i + 1, row.len(), num_modes,
            );
            reference.row_mut(i).assign(&Array1::from(row.clone()));
        }

        let weights: Array1<f64> = read_table(&dir.join(WEIGHTS_FILE))?.into_iter().flatten().collect();
        let weights = Weights::from_flat(fit_target, num_reference, weights)?;

        let energy_average = match read_table(&dir.join(ENERGY_OFFSET_FILE))?.first().and_then(|row| row.first()) {
            Some(&e) => e,
            None => bail!("{}: file is empty", ENERGY_OFFSET_FILE),
        };

        let model = FittedModel::new(
            kernel.to_kernel()?,
            cutoff,
            ModeVector::new(cutoff, num_modes)?,
            reference,
            weights,
            energy_average,
            fit_target,
        )?;
        debug!("loaded model from {}", dir.display());
        Ok(StoredModel { model, lattice: Lattice::new(&lattice), num_atoms })
    }
}

fn kernel_settings(kernel: &Kernel) -> KernelSettings {
    match *kernel {
        Kernel::Linear => KernelSettings::Linear,
        Kernel::Gaussian(g) => KernelSettings::Gaussian(KernelGaussian { sigma: g.sigma() }),
    }
}

// whitespace-separated floats, skipping blank lines
fn read_table(path: &Path) -> FailResult<Vec<Vec<f64>>> {
    let text = fsx::read_to_string(path)?;
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            line.split_whitespace()
                .map(|word| word.parse::<f64>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| format_err!("{}:{}: {}", path.display(), i + 1, e))
        })
        .collect()
}

#[cfg(test)]
#[deny(unused)]
mod tests {
    use super::*;
    use mlpot_fs_util::TempDir;
    use ndarray::arr1;

    fn stored(target: FitTarget) -> StoredModel {
        let modes = ModeVector::new(3.0, 2).unwrap();
        let reference = Array2::from_shape_fn((3, 2), |(i, j)| (i as f64 + 1.0) / 7.0 - j as f64 * 1e-3);
        let weights = match target {
            FitTarget::Separate => Weights::Separate {
                energy: arr1(&[0.1, -0.2, 1.0 / 3.0]),
                forces: arr1(&[1e-12, 2.5, -7.0]),
            },
            _ => Weights::Joint(arr1(&[0.1, -0.2, 1.0 / 3.0])),
        };
        let model = FittedModel::new(Kernel::gaussian(2.5).unwrap(), 3.0, modes, reference, weights, -123.456, target).unwrap();
        StoredModel { model, lattice: Lattice::orthorhombic(7.0, 8.0, 9.0), num_atoms: 3 }
    }

    #[test]
    fn round_trip() {
        for &target in &[FitTarget::Energy, FitTarget::EnergyAndForces, FitTarget::Separate] {
            let dir = TempDir::new("mlpot-model").unwrap();
            let original = stored(target);
            original.save(dir.path()).unwrap();
            let loaded = StoredModel::load(dir.path()).unwrap();
            assert_eq!(loaded, original);
        }
    }

    #[test]
    fn files() {
        let dir = TempDir::new("mlpot-model").unwrap();
        stored(FitTarget::Separate).save(dir.path()).unwrap();

        let weights = read_table(&dir.path().join(WEIGHTS_FILE)).unwrap();
        assert_eq!(weights.len(), 6);
        assert!(weights.iter().all(|row| row.len() == 1));

        let offset = read_table(&dir.path().join(ENERGY_OFFSET_FILE)).unwrap();
        assert_eq!(offset, vec![vec![-123.456, -123.456]]);
    }

    #[test]
    fn inconsistent_tables_are_rejected() {
        let dir = TempDir::new("mlpot-model").unwrap();
        stored(FitTarget::Energy).save(dir.path()).unwrap();
        fsx::write(dir.path().join(WEIGHTS_FILE), "1.0\n2.0\n").unwrap();
        assert!(StoredModel::load(dir.path()).is_err());

        let dir = TempDir::new("mlpot-model").unwrap();
        stored(FitTarget::Energy).save(dir.path()).unwrap();
        fsx::write(dir.path().join(DESCRIPTORS_FILE), "1.0 2.0\n3.0 4.0\n5.0\n").unwrap();
        assert!(StoredModel::load(dir.path()).is_err());
    }

    #[test]
    fn model_dir_needs_force() {
        let dir = TempDir::new("mlpot-model").unwrap();
        let model_dir = dir.path().join("model");
        create_model_dir(&model_dir, false).unwrap();
        // empty is fine
        create_model_dir(&model_dir, false).unwrap();

        fsx::write(model_dir.join("stuff"), "x").unwrap();
        assert!(create_model_dir(&model_dir, false).is_err());
        create_model_dir(&model_dir, true).unwrap();
        assert!(fsx::is_missing_or_empty_dir(&model_dir).unwrap());
    }
}

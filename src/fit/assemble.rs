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

use crate::{FitError, FitSettings, FitTarget, FittedModel, MemoryEstimate, Weights};

use mlpot_kernel::{Kernel, KernelError};
use mlpot_linalg::ridge_solve;
use mlpot_structure::{Configuration, Lattice, ModeVector};

use ndarray::{Array1, Array2, Array3, ArrayView1, ArrayView2, ArrayView3, Axis};
use rayon_cond::CondIterator;
use slice_of_array::prelude::*;
use std::time::Instant;

/// The assembled linear system of a training set.
///
/// * `descriptors` (`C`): `(n_conf, n_atom, n_modes)`
/// * `reference` (`D`): `C` flattened to `(n_conf * n_atom, n_modes)`
/// * `energy_matrix` (`K`): `(n_conf, n_ref)`, row `α` is `Σ_i K(C[α, i], D)`
/// * `force_matrix` (`T`): `(3 n_conf n_atom, n_ref)`
/// * `energies` (`E`): `(n_conf)`, mean-subtracted
/// * `forces` (`F`): `(3 n_conf n_atom)`
#[derive(Debug, Clone)]
pub struct TrainingSystem {
    kernel: Kernel,
    cutoff: f64,
    modes: ModeVector,
    descriptors: Array3<f64>,
    energy_matrix: Array2<f64>,
    force_matrix: Array2<f64>,
    energies: Array1<f64>,
    energy_average: f64,
    forces: Array1<f64>,
}

/// Build the training system.
///
/// Every configuration is brought to `DescriptorsReady` (which is the only
/// mutation), and must carry reference energy and forces. Fails on the first
/// bad configuration; nothing partial is returned.
pub fn assemble(
    configs: &mut [Configuration],
    lattice: &Lattice,
    settings: &FitSettings,
) -> Result<TrainingSystem, FitError> {
    settings.validate()?;
    lattice.check_cutoff(settings.cutoff)?;
    let modes = settings.modes()?;

    let n_conf = configs.len();
    let n_atom = match configs.first() {
        None => return Err(FitError::EmptyTrainingSet),
        Some(config) => config.num_atoms(),
    };
    for (index, config) in configs.iter().enumerate() {
        if config.num_atoms() != n_atom {
            return Err(FitError::AtomCountMismatch { index, expected: n_atom, actual: config.num_atoms() });
        }
        if config.energy().is_none() {
            return Err(FitError::MissingEnergy { index });
        }
        if config.forces().is_none() {
            return Err(FitError::MissingForces { index });
        }
    }

    let parallel = settings.threading.is_parallel();
    let workers = if parallel { rayon::current_num_threads() } else { 1 };

    let estimate = MemoryEstimate::new(n_conf, n_atom, modes.len(), settings.target, workers);
    debug!("estimated memory: {}", estimate);
    estimate.check(settings.memory_limit)?;

    let start = Instant::now();
    prepare_all(configs, lattice, settings.cutoff, &modes, parallel)?;
    info!("neighbors and descriptors of {} configurations: {:.3}s", n_conf, start.elapsed().as_secs_f64());

    let mut descriptors = Array3::zeros((n_conf, n_atom, modes.len()));
    for (mut slot, config) in descriptors.outer_iter_mut().zip(&configs[..]) {
        slot.assign(&ready_descriptors(config)?);
    }
    let reference = flatten_configs(descriptors.view());

    let start = Instant::now();
    let energy_matrix = energy_matrix(&settings.kernel, descriptors.view(), reference.view(), parallel)?;
    info!("energy matrix {:?}: {:.3}s", energy_matrix.dim(), start.elapsed().as_secs_f64());

    let start = Instant::now();
    let force_matrix = force_matrix(&settings.kernel, configs, &modes, reference.view(), parallel)?;
    info!("force matrix {:?}: {:.3}s", force_matrix.dim(), start.elapsed().as_secs_f64());

    let raw_energies: Array1<f64> = configs.iter().filter_map(|c| c.energy()).collect();
    let energy_average = raw_energies.mean().unwrap_or(0.0);
    let energies = raw_energies - energy_average;

    let forces: Array1<f64> = configs.iter()
        .filter_map(|c| c.forces())
        .flat_map(|f| f.flat().iter().cloned())
        .collect();

    Ok(TrainingSystem {
        kernel: settings.kernel,
        cutoff: settings.cutoff,
        modes,
        descriptors,
        energy_matrix,
        force_matrix,
        energies,
        energy_average,
        forces,
    })
}

fn prepare_all(
    configs: &mut [Configuration],
    lattice: &Lattice,
    cutoff: f64,
    modes: &ModeVector,
    parallel: bool,
) -> Result<(), FitError> {
    let results: Vec<_> = CondIterator::new(&mut configs[..], parallel)
        .map(|config| config.prepare(cutoff, lattice, modes))
        .collect();

    for (index, result) in results.into_iter().enumerate() {
        result.map_err(|source| FitError::Configuration { index, source })?;
        trace!("configuration {} ready", index);
    }
    Ok(())
}

fn ready_descriptors(config: &Configuration) -> Result<ArrayView2<'_, f64>, FitError> {
    config.descriptors().ok_or_else(|| mlpot_structure::StructureError::DescriptorsNotComputed.into())
}

// (n_conf, n_atom, n_modes) -> (n_conf * n_atom, n_modes)
fn flatten_configs(c: ArrayView3<'_, f64>) -> Array2<f64> {
    let (n_conf, n_atom, n_modes) = c.dim();
    let mut out = Array2::zeros((n_conf * n_atom, n_modes));
    for (alpha, block) in c.outer_iter().enumerate() {
        out.slice_mut(s![alpha * n_atom..(alpha + 1) * n_atom, ..]).assign(&block);
    }
    out
}

/// `K`: the raw kernel matrix `K(D, D)` with every block of `n_atom` rows summed.
///
/// Each configuration's block of raw rows is computed and reduced independently,
/// so the full `(n_ref, n_ref)` raw matrix never exists at once. Rows are written
/// straight into `K`.
fn energy_matrix(
    kernel: &Kernel,
    descriptors: ArrayView3<'_, f64>,
    reference: ArrayView2<'_, f64>,
    parallel: bool,
) -> Result<Array2<f64>, FitError> {
    let mut out = Array2::zeros((descriptors.len_of(Axis(0)), reference.nrows()));
    let jobs: Vec<_> = out.outer_iter_mut().zip(descriptors.outer_iter()).collect();

    let results: Vec<Result<(), KernelError>> = CondIterator::new(jobs, parallel)
        .map(|(mut dest, config)| {
            dest.assign(&kernel.energy_row(config, reference)?);
            Ok(())
        })
        .collect();
    results.into_iter().collect::<Result<(), _>>()?;
    Ok(out)
}

/// `T`: per-configuration force blocks stacked vertically.
///
/// Every configuration owns a disjoint range of `3 n_atom` rows of `T`, and its
/// block is written there as soon as it is computed.
fn force_matrix(
    kernel: &Kernel,
    configs: &[Configuration],
    modes: &ModeVector,
    reference: ArrayView2<'_, f64>,
    parallel: bool,
) -> Result<Array2<f64>, FitError> {
    let n_atom = configs.first().map_or(0, |c| c.num_atoms());
    let mut out = Array2::zeros((3 * n_atom * configs.len(), reference.nrows()));

    // (a chunk size of zero is not allowed; with no atoms there are no rows anyway)
    let jobs: Vec<_> = out.axis_chunks_iter_mut(Axis(0), usize::max(3 * n_atom, 1))
        .zip(configs)
        .collect();

    let results: Vec<Result<(), KernelError>> = CondIterator::new(jobs, parallel)
        .map(|(mut dest, config)| {
            dest.assign(&kernel.force_matrix(config, modes, reference)?);
            Ok(())
        })
        .collect();
    results.into_iter().collect::<Result<(), _>>()?;
    Ok(out)
}

impl TrainingSystem {
    pub fn kernel(&self) -> &Kernel { &self.kernel }
    pub fn cutoff(&self) -> f64 { self.cutoff }
    pub fn modes(&self) -> &ModeVector { &self.modes }

    pub fn num_configs(&self) -> usize { self.descriptors.len_of(Axis(0)) }
    pub fn num_atoms(&self) -> usize { self.descriptors.len_of(Axis(1)) }
    pub fn num_reference(&self) -> usize { self.num_configs() * self.num_atoms() }

    pub fn descriptors(&self) -> ArrayView3<'_, f64> { self.descriptors.view() }
    /// `(n_ref, n_modes)` reference batch.
    pub fn reference(&self) -> Array2<f64> { flatten_configs(self.descriptors.view()) }
    pub fn energy_matrix(&self) -> ArrayView2<'_, f64> { self.energy_matrix.view() }
    pub fn force_matrix(&self) -> ArrayView2<'_, f64> { self.force_matrix.view() }
    pub fn energies(&self) -> ArrayView1<'_, f64> { self.energies.view() }
    pub fn energy_average(&self) -> f64 { self.energy_average }
    pub fn forces(&self) -> ArrayView1<'_, f64> { self.forces.view() }

    /// Solve for the weights.
    pub fn fit(&self, target: FitTarget, lambda: f64) -> Result<FittedModel, FitError> {
        let start = Instant::now();
        let weights = match target {
            FitTarget::Energy => {
                Weights::Joint(ridge_solve(self.energy_matrix.view(), self.energies.view(), lambda)?)
            },
            FitTarget::EnergyAndForces => {
                let k = ndarray::concatenate(Axis(0), &[self.energy_matrix.view(), self.force_matrix.view()])
                    .map_err(|_| FitError::ShapeMismatch {
                        what: "stacked energy and force matrices",
                        expected: self.energy_matrix.ncols(),
                        actual: self.force_matrix.ncols(),
                    })?;
                let y = ndarray::concatenate(Axis(0), &[self.energies.view(), self.forces.view()])
                    .map_err(|_| FitError::ShapeMismatch {
                        what: "stacked energies and forces",
                        expected: self.energies.len(),
                        actual: self.forces.len(),
                    })?;
                Weights::Joint(ridge_solve(k.view(), y.view(), lambda)?)
            },
            FitTarget::Separate => Weights::Separate {
                energy: ridge_solve(self.energy_matrix.view(), self.energies.view(), lambda)?,
                forces: ridge_solve(self.force_matrix.view(), self.forces.view(), lambda)?,
            },
        };
        info!("ridge solve ({:?}): {:.3}s", target, start.elapsed().as_secs_f64());

        FittedModel::new(
            self.kernel,
            self.cutoff,
            self.modes.clone(),
            self.reference(),
            weights,
            self.energy_average,
            target,
        )
    }
}

/// Assemble and fit in one go, as configured by `settings`.
pub fn fit(
    configs: &mut [Configuration],
    lattice: &Lattice,
    settings: &FitSettings,
) -> Result<FittedModel, FitError> {
    assemble(configs, lattice, settings)?.fit(settings.target, settings.lambda)
}

#[cfg(test)]
#[deny(unused)]
mod tests {
    use super::*;
    use crate::{ErrorClass, MemoryLimit, Threading};
    use mlpot_linalg::predict;
    use mlpot_structure::StructureError;
    use rand::{Rng, SeedableRng};
    use rand::rngs::StdRng;

    const CUTOFF: f64 = 3.5;

    fn lattice() -> Lattice { Lattice::cubic(8.0) }

    // random configurations with fake reference data from a pair potential
    fn training_set(seed: u64, n_conf: usize, n_atom: usize) -> Vec<Configuration> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n_conf).map(|_| {
            let positions: Vec<[f64; 3]> = (0..n_atom).map(|_| {
                [rng.gen_range(0.0..8.0), rng.gen_range(0.0..8.0), rng.gen_range(0.0..8.0)]
            }).collect();
            let forces = (0..n_atom).map(|_| [
                rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0),
            ]).collect();
            Configuration::new(positions)
                .with_energy(rng.gen_range(-100.0..-90.0))
                .with_forces(forces).unwrap()
        }).collect()
    }

    fn settings(kernel: Kernel) -> FitSettings {
        FitSettings::new(CUTOFF, 5, kernel, 1e-6)
    }

    #[test]
    fn shapes_and_reductions() {
        let mut configs = training_set(3, 4, 6);
        let system = assemble(&mut configs, &lattice(), &settings(Kernel::gaussian(1.5).unwrap())).unwrap();

        assert_eq!(system.descriptors().dim(), (4, 6, 5));
        assert_eq!(system.reference().dim(), (24, 5));
        assert_eq!(system.energy_matrix().dim(), (4, 24));
        assert_eq!(system.force_matrix().dim(), (72, 24));
        assert_eq!(system.energies().len(), 4);
        assert_eq!(system.forces().len(), 72);
        assert_close!(abs=1e-10, system.energies().sum(), 0.0);

        // K is the raw kernel matrix with blocks of n_atom rows summed
        let reference = system.reference();
        let raw = system.kernel().matrix(reference.view(), reference.view()).unwrap();
        let energy_matrix = system.energy_matrix();
        for alpha in 0..4 {
            let expected = raw.slice(s![alpha * 6..(alpha + 1) * 6, ..]).sum_axis(Axis(0));
            assert_close!(rel=1e-10, abs=1e-12, energy_matrix.row(alpha), expected.view());
        }

        // configurations were mutated into the ready state, in order
        for (alpha, config) in configs.iter().enumerate() {
            assert_eq!(system.descriptors().index_axis(Axis(0), alpha), config.descriptors().unwrap());
            assert_eq!(&system.forces().as_slice().unwrap()[18 * alpha..18 * (alpha + 1)], config.forces().unwrap().flat());
        }
    }

    #[test]
    fn serial_and_parallel_agree() {
        let kernel = Kernel::gaussian(2.0).unwrap();
        let mut a = training_set(5, 5, 4);
        let mut b = a.clone();
        let serial = assemble(&mut a, &lattice(), &FitSettings { threading: Threading::Serial, ..settings(kernel) }).unwrap();
        let rayon = assemble(&mut b, &lattice(), &FitSettings { threading: Threading::Rayon, ..settings(kernel) }).unwrap();
        assert_eq!(serial.energy_matrix(), rayon.energy_matrix());
        assert_eq!(serial.force_matrix(), rayon.force_matrix());
    }

    #[test]
    fn fitted_weights_reproduce_training_energies() {
        // fewer configurations than modes, so the linear kernel can interpolate
        let mut configs = training_set(9, 4, 5);
        let system = assemble(&mut configs, &lattice(), &settings(Kernel::linear())).unwrap();
        let model = system.fit(FitTarget::Energy, 1e-10).unwrap();
        let predicted = predict(system.energy_matrix(), model.weights().energy()).unwrap();
        assert_close!(rel=1e-6, abs=1e-6, predicted, system.energies().to_owned());
    }

    #[test]
    fn targets_produce_expected_weight_layouts() {
        let mut configs = training_set(4, 3, 4);
        let system = assemble(&mut configs, &lattice(), &settings(Kernel::linear())).unwrap();
        for &target in &[FitTarget::Energy, FitTarget::EnergyAndForces, FitTarget::Separate] {
            let model = system.fit(target, 1e-6).unwrap();
            assert_eq!(model.weights().to_flat().len(), 12 * target.weight_sets());
            assert_eq!(model.target(), target);
        }
    }

    #[test]
    fn preconditions() {
        let lat = lattice();
        let s = settings(Kernel::linear());

        assert_eq!(assemble(&mut [], &lat, &s).unwrap_err(), FitError::EmptyTrainingSet);

        let mut configs = training_set(1, 2, 3);
        configs.push(Configuration::new(vec![[0.0; 3]; 3]).with_energy(1.0));
        assert_eq!(assemble(&mut configs, &lat, &s).unwrap_err(), FitError::MissingForces { index: 2 });

        let mut configs = training_set(1, 2, 3);
        configs.push(Configuration::new(vec![[0.0; 3]; 2]));
        assert_eq!(
            assemble(&mut configs, &lat, &s).unwrap_err(),
            FitError::AtomCountMismatch { index: 2, expected: 3, actual: 2 },
        );

        let mut configs = training_set(1, 2, 3);
        let err = assemble(&mut configs, &Lattice::cubic(6.0), &s).unwrap_err();
        assert_eq!(err, FitError::Structure(StructureError::CutoffTooLarge { cutoff: CUTOFF, max: 3.0 }));
        assert_eq!(err.class(), ErrorClass::Precondition);

        // a configuration prepared with another cutoff
        let mut configs = training_set(1, 2, 3);
        configs[1].prepare(3.0, &lat, &ModeVector::new(3.0, 5).unwrap()).unwrap();
        match assemble(&mut configs, &lat, &s) {
            Err(FitError::Configuration { index: 1, source: StructureError::CutoffMismatch { .. } }) => {},
            r => panic!("unexpected: {:?}", r),
        }

        // a configuration prepared with the same cutoff but fewer modes
        let mut configs = training_set(1, 2, 3);
        configs[1].prepare(CUTOFF, &lat, &ModeVector::new(CUTOFF, 2).unwrap()).unwrap();
        match assemble(&mut configs, &lat, &s) {
            Err(FitError::Configuration { index: 1, source: StructureError::ModeMismatch { actual: 2, .. } }) => {},
            r => panic!("unexpected: {:?}", r),
        }

        let mut configs = training_set(1, 50, 3);
        let tiny = FitSettings { memory_limit: MemoryLimit::from_bytes(1024), ..s.clone() };
        let err = assemble(&mut configs, &lat, &tiny).unwrap_err();
        assert_eq!(err.class(), ErrorClass::ResourceExhausted);
        // fail-fast: nothing was computed
        assert!(configs.iter().all(|c| c.descriptors().is_none()));
    }
}

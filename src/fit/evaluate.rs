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

use crate::{FitError, FittedModel, Prediction};

use mlpot_structure::{Configuration, Lattice};

use std::fmt;

/// Deviation of predictions from the reference data of a set of configurations.
///
/// Every metric is `None` when no configuration (or atom) contributed to it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ErrorReport {
    pub num_configs: usize,
    /// Root mean square energy error.
    pub energy_rmse: Option<f64>,
    /// Mean of `|E_pred - E_ref| / |E_ref|`.
    pub energy_mean_relative: Option<f64>,
    /// Root mean square error per force component.
    pub force_rmse: Option<f64>,
    /// Mean over atoms of `|F_pred - F_ref| / |F_ref|`.
    pub force_mean_relative_norm: Option<f64>,
    /// Mean over atoms of the cosine between predicted and reference force.
    pub force_mean_cosine: Option<f64>,
}

#[derive(Debug, Copy, Clone, Default)]
struct Mean { sum: f64, count: usize }

impl Mean {
    fn push(&mut self, x: f64) { self.sum += x; self.count += 1; }
    fn get(self) -> Option<f64> {
        match self.count {
            0 => None,
            n => Some(self.sum / n as f64),
        }
    }
}

impl ErrorReport {
    /// Compare predictions against the reference data carried by `configs`.
    pub fn new(configs: &[Configuration], predictions: &[Prediction]) -> Result<Self, FitError> {
        if configs.len() != predictions.len() {
            return Err(FitError::ShapeMismatch {
                what: "predictions per configuration",
                expected: configs.len(),
                actual: predictions.len(),
            });
        }

        let mut energy_sqr = Mean::default();
        let mut energy_rel = Mean::default();
        let mut force_sqr = Mean::default();
        let mut force_rel = Mean::default();
        let mut force_cos = Mean::default();

        for (index, (config, prediction)) in configs.iter().zip(predictions).enumerate() {
            if let Some(energy) = config.energy() {
                let diff = prediction.energy - energy;
                energy_sqr.push(diff * diff);
                if energy != 0.0 {
                    energy_rel.push((diff / energy).abs());
                }
            }

            if let Some(forces) = config.forces() {
                if forces.len() != prediction.forces.len() {
                    return Err(FitError::AtomCountMismatch {
                        index,
                        expected: forces.len(),
                        actual: prediction.forces.len(),
                    });
                }
                for (reference, predicted) in forces.iter().zip(&prediction.forces) {
                    let diff = sub(predicted, reference);
                    for &d in &diff {
                        force_sqr.push(d * d);
                    }

                    let ref_norm = norm(reference);
                    let pred_norm = norm(predicted);
                    if ref_norm > 0.0 {
                        force_rel.push(norm(&diff) / ref_norm);
                    }
                    if ref_norm > 0.0 && pred_norm > 0.0 {
                        force_cos.push(dot(predicted, reference) / (ref_norm * pred_norm));
                    }
                }
            }
        }

        Ok(ErrorReport {
            num_configs: configs.len(),
            energy_rmse: energy_sqr.get().map(f64::sqrt),
            energy_mean_relative: energy_rel.get(),
            force_rmse: force_sqr.get().map(f64::sqrt),
            force_mean_relative_norm: force_rel.get(),
            force_mean_cosine: force_cos.get(),
        })
    }
}

fn sub(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] { [a[0] - b[0], a[1] - b[1], a[2] - b[2]] }
fn dot(a: &[f64; 3], b: &[f64; 3]) -> f64 { a[0] * b[0] + a[1] * b[1] + a[2] * b[2] }
fn norm(a: &[f64; 3]) -> f64 { dot(a, a).sqrt() }

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        struct Metric(Option<f64>);
        impl fmt::Display for Metric {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self.0 {
                    Some(x) => write!(f, "{:.6e}", x),
                    None => write!(f, "n/a"),
                }
            }
        }

        writeln!(f, "{} configurations", self.num_configs)?;
        writeln!(f, "  energy RMSE:               {}", Metric(self.energy_rmse))?;
        writeln!(f, "  energy mean relative:      {}", Metric(self.energy_mean_relative))?;
        writeln!(f, "  force RMSE:                {}", Metric(self.force_rmse))?;
        writeln!(f, "  force mean relative norm:  {}", Metric(self.force_mean_relative_norm))?;
        write!(f, "  force mean cosine:         {}", Metric(self.force_mean_cosine))
    }
}

/// Predict every configuration and compare against its reference data.
pub fn evaluate(
    model: &FittedModel,
    configs: &mut [Configuration],
    lattice: &Lattice,
) -> Result<(Vec<Prediction>, ErrorReport), FitError> {
    let predictions = configs.iter_mut()
        .enumerate()
        .map(|(index, config)| {
            let prediction = model.predict(config, lattice)?;
            trace!("configuration {}: predicted energy {}", index, prediction.energy);
            Ok(prediction)
        })
        .collect::<Result<Vec<_>, FitError>>()?;

    let report = ErrorReport::new(configs, &predictions)?;
    Ok((predictions, report))
}

#[cfg(test)]
#[deny(unused)]
mod tests {
    use super::*;

    fn prediction(energy: f64, forces: Vec<[f64; 3]>) -> Prediction {
        Prediction { energy, forces }
    }

    #[test]
    fn metrics() {
        let configs = vec![
            Configuration::new(vec![[0.0; 3]; 2])
                .with_energy(-10.0)
                .with_forces(vec![[1.0, 0.0, 0.0], [0.0, 2.0, 0.0]]).unwrap(),
            Configuration::new(vec![[0.0; 3]; 2])
                .with_energy(-20.0)
                .with_forces(vec![[0.0, 0.0, 0.0], [0.0, 0.0, 4.0]]).unwrap(),
        ];
        let predictions = vec![
            prediction(-11.0, vec![[1.0, 0.0, 0.0], [0.0, 2.0, 0.0]]),
            prediction(-17.0, vec![[1.0, 0.0, 0.0], [0.0, 0.0, -4.0]]),
        ];
        let report = ErrorReport::new(&configs, &predictions).unwrap();
        assert_eq!(report.num_configs, 2);
        assert_close!(report.energy_rmse.unwrap(), f64::sqrt((1.0 + 9.0) / 2.0));
        assert_close!(report.energy_mean_relative.unwrap(), (0.1 + 0.15) / 2.0);
        // squared component errors: 1 (zero-force atom) + 64, over 12 components
        assert_close!(report.force_rmse.unwrap(), f64::sqrt(65.0 / 12.0));
        // the zero reference force is skipped
        assert_close!(report.force_mean_relative_norm.unwrap(), (0.0 + 0.0 + 2.0) / 3.0);
        assert_close!(report.force_mean_cosine.unwrap(), (1.0 + 1.0 - 1.0) / 3.0);
    }

    #[test]
    fn missing_reference_data() {
        let configs = vec![Configuration::new(vec![[0.0; 3]])];
        let report = ErrorReport::new(&configs, &[prediction(1.0, vec![[1.0, 2.0, 3.0]])]).unwrap();
        assert_eq!(report, ErrorReport { num_configs: 1, ..Default::default() });
        assert!(format!("{}", report).contains("n/a"));

        assert!(ErrorReport::new(&configs, &[]).is_err());
    }
}

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

//! All of the checks that occur after deserialization are written here.

use crate::config::*;

use failure::Error;
use mlpot_fit::{FitSettings, MemoryLimit};
use mlpot_kernel::Kernel;

impl Settings {
    pub fn validate(self) -> Result<ValidatedSettings, Error> {
        if !(self.cutoff > 0.0 && self.cutoff.is_finite()) {
            bail!("`cutoff: {}` is invalid. (must be positive)", self.cutoff);
        }
        if self.num_modes == 0 {
            bail!("`num-modes` must be at least 1.");
        }
        if !(self.lambda > 0.0 && self.lambda.is_finite()) {
            bail!("`lambda: {}` is invalid. (must be positive)", self.lambda);
        }
        if self.step_size == 0 {
            bail!("`step-size` must be at least 1.");
        }
        if let KernelSettings::Gaussian(KernelGaussian { sigma }) = self.kernel {
            if !(sigma > 0.0 && sigma.is_finite()) {
                bail!("`kernel.gaussian.sigma: {}` is invalid. (must be positive)", sigma);
            }
        }
        if self.memory_limit_mb == Some(0) {
            warn!("`memory-limit-mb: 0` will reject every training set.");
        }

        Ok(ValidatedSettings(self))
    }
}

impl KernelSettings {
    pub fn to_kernel(&self) -> Result<Kernel, Error> {
        Ok(match *self {
            KernelSettings::Linear => Kernel::linear(),
            KernelSettings::Gaussian(KernelGaussian { sigma }) => Kernel::gaussian(sigma)?,
        })
    }
}

impl ValidatedSettings {
    /// The parameters of the fitting pipeline.
    pub fn fit_settings(&self) -> Result<FitSettings, Error> {
        let Settings {
            cutoff, num_modes, ref kernel, lambda, fit_target, threading, memory_limit_mb,
            step_size: _,
        } = self.0;

        Ok(FitSettings {
            target: fit_target,
            threading,
            memory_limit: memory_limit_mb.map_or_else(MemoryLimit::default, MemoryLimit::from_mb),
            ..FitSettings::new(cutoff, num_modes, kernel.to_kernel()?, lambda)
        })
    }
}

#[cfg(test)]
#[deny(unused)]
mod tests {
    use crate::{ValidatedSettings, YamlRead};
    use mlpot_fit::{FitTarget, MemoryLimit, Threading};
    use mlpot_kernel::Kernel;

    fn settings(extra: &str) -> String {
        format!("{{ cutoff: 4.0, num-modes: 6, kernel: linear, lambda: 1.0e-8, {} }}", extra)
    }

    fn check(text: &str) -> Result<ValidatedSettings, String> {
        ValidatedSettings::from_reader(text.as_bytes()).map_err(|e| e.to_string())
    }

    #[test]
    fn invalid_values() {
        let cases = &[
            "cutoff: 4.0, num-modes: 6, kernel: linear, lambda: 0.0",
            "cutoff: -1.0, num-modes: 6, kernel: linear, lambda: 1.0",
            "cutoff: 4.0, num-modes: 0, kernel: linear, lambda: 1.0",
            "cutoff: 4.0, num-modes: 6, kernel: linear, lambda: 1.0, step-size: 0",
            "cutoff: 4.0, num-modes: 6, kernel: { gaussian: { sigma: 0.0 } }, lambda: 1.0",
        ];
        for case in cases {
            let text = format!("{{ {} }}", case);
            assert!(check(&text).is_err(), "accepted: {}", text);
        }
    }

    #[test]
    fn fit_settings() {
        let validated = check(&settings("fit-target: energy, memory-limit-mb: 16")).unwrap();
        let fit = validated.fit_settings().unwrap();
        assert_eq!(fit.cutoff, 4.0);
        assert_eq!(fit.num_modes, 6);
        assert_eq!(fit.kernel, Kernel::linear());
        assert_eq!(fit.lambda, 1e-8);
        assert_eq!(fit.target, FitTarget::Energy);
        assert_eq!(fit.threading, Threading::Rayon);
        assert_eq!(fit.memory_limit, MemoryLimit::from_mb(16));

        let text = "{ cutoff: 4.0, num-modes: 6, kernel: { gaussian: { sigma: 3.0 } }, lambda: 1.0 }";
        let fit = check(text).unwrap().fit_settings().unwrap();
        assert_eq!(fit.kernel, Kernel::gaussian(3.0).unwrap());
        assert_eq!(fit.memory_limit, MemoryLimit::default());
    }
}

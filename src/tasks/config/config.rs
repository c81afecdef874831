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

// NOTE: Please make sure to use the YamlRead trait when deserializing these types!

use crate::YamlRead;

use serde::de;

pub use mlpot_fit::{FitTarget, Threading};

/// Root settings object.
///
/// This is what you should deserialize.
#[derive(Serialize)]
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSettings(pub Settings);

/// Raw deserialized form of settings.
///
/// You shouldn't deserialize this type directly; deserialize `ValidatedSettings` instead,
/// so that the values are checked before any work is done.
#[derive(Serialize, Deserialize)]
#[derive(Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct Settings {
    /// Neighbor cutoff radius, in the length unit of the input positions.
    ///
    /// Must be less than half of the smallest lattice side.
    pub cutoff: f64,

    /// Number of sine-basis frequencies `n π / cutoff` in each descriptor.
    pub num_modes: usize,

    pub kernel: KernelSettings,

    /// Ridge penalty.
    pub lambda: f64,

    /// Only every `step-size`-th configuration of the input is used.
    #[serde(default = "_settings__step_size")]
    pub step_size: usize,

    #[serde(default = "_settings__fit_target")]
    pub fit_target: FitTarget,

    #[serde(default)]
    pub threading: Threading,

    /// Ceiling on the dense matrices of a fit, in MiB.
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_limit_mb: Option<u64>,
}
fn _settings__step_size() -> usize { 1 }
fn _settings__fit_target() -> FitTarget { FitTarget::EnergyAndForces }

derive_yaml_read!{ValidatedSettings}

impl<'de> de::Deserialize<'de> for ValidatedSettings {
    fn deserialize<D: de::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let cereal: Settings = de::Deserialize::deserialize(deserializer)?;

        cereal.validate().map_err(de::Error::custom)
    }
}

/// Similarity kernel between descriptors.
///
/// ```yaml
/// kernel: linear
/// ```
/// ```yaml
/// kernel:
///   gaussian:
///     sigma: 20.0
/// ```
#[derive(Serialize, Deserialize)]
#[derive(Debug, Copy, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum KernelSettings {
    Linear,
    Gaussian(KernelGaussian),
}

#[derive(Serialize, Deserialize)]
#[derive(Debug, Copy, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct KernelGaussian {
    /// Bandwidth.
    pub sigma: f64,
}

impl ValidatedSettings {
    /// Render the settings back into YAML, e.g. to store alongside a model.
    pub fn to_yaml_string(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self.0)
    }
}

#[cfg(test)]
#[deny(unused)]
mod tests {
    use super::*;
    use crate::YamlRead;

    fn parse(text: &str) -> Result<ValidatedSettings, serde_yaml::Error> {
        ValidatedSettings::from_reader(text.as_bytes())
    }

    #[test]
    fn full_document() {
        let ValidatedSettings(settings) = parse("
            cutoff: 4.0
            num-modes: 10
            kernel:
              gaussian:
                sigma: 20.0
            lambda: 1.0e-12
            step-size: 25
            fit-target: separate
            threading: serial
            memory-limit-mb: 512
        ").unwrap();

        assert_eq!(settings, Settings {
            cutoff: 4.0,
            num_modes: 10,
            kernel: KernelSettings::Gaussian(KernelGaussian { sigma: 20.0 }),
            lambda: 1e-12,
            step_size: 25,
            fit_target: FitTarget::Separate,
            threading: Threading::Serial,
            memory_limit_mb: Some(512),
        });
    }

    #[test]
    fn defaults() {
        let ValidatedSettings(settings) = parse("
            cutoff: 4.0
            num-modes: 10
            kernel: linear
            lambda: 1.0e-8
        ").unwrap();

        assert_eq!(settings.kernel, KernelSettings::Linear);
        assert_eq!(settings.step_size, 1);
        assert_eq!(settings.fit_target, FitTarget::EnergyAndForces);
        assert_eq!(settings.threading, Threading::Rayon);
        assert_eq!(settings.memory_limit_mb, None);
    }

    #[test]
    fn round_trip_through_yaml() {
        let original = parse("
            cutoff: 3.5
            num-modes: 4
            kernel: { gaussian: { sigma: 2.5 } }
            lambda: 0.5
            fit-target: energy
        ").unwrap();
        let text = original.to_yaml_string().unwrap();
        assert_eq!(parse(&text).unwrap(), original);
    }

    #[test]
    fn rejects_unknown_kernel() {
        assert!(parse("
            cutoff: 4.0
            num-modes: 10
            kernel: cubic
            lambda: 1.0e-8
        ").is_err());
    }
}

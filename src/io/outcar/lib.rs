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

//! Reader for the ionic steps of a VASP `OUTCAR`.
//!
//! Only the pieces needed for fitting are extracted: the ion count, the direct
//! lattice vectors, and for each ionic step the free energy together with the
//! `POSITION / TOTAL-FORCE` table.

#[macro_use] extern crate log;
#[macro_use] extern crate lazy_static;
#[cfg(test)] #[macro_use] extern crate mlpot_assert_close;

use mlpot_fs_util as fsx;
use mlpot_structure::{Configuration, Lattice, StructureError};

use regex::Regex;
use std::path::Path;
use std::str::FromStr;

lazy_static! {
    static ref ION_COUNT: Regex = re(r"(?i)number\s+of\s+ions\s+nions\s*=\s*(\d+)");
    static ref LATTICE_HEADER: Regex = re(r"(?i)direct\s+lattice\s+vectors");
    static ref STEP_HEADER: Regex = re(r"POSITION\s+TOTAL-FORCE \(eV/Angst\)");
    static ref ENERGY: Regex = re(r"(?i)free\s+energy\s+toten\s*=\s*(-?\d+(?:\.\d*)?(?:[eE][-+]?\d+)?)");
}

// patterns are literals
fn re(pattern: &str) -> Regex {
    match Regex::new(pattern) {
        Ok(re) => re,
        Err(e) => panic!("bad built-in pattern {:?}: {}", pattern, e),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OutcarError {
    #[error(transparent)]
    Io(#[from] fsx::Error),

    #[error("could not find the number of ions (NIONS)")]
    MissingIonCount,

    #[error("could not find three direct lattice vectors")]
    MissingLattice,

    #[error("step size must be at least 1")]
    ZeroStepSize,

    #[error("configuration {index}: no `free energy TOTEN` line")]
    MissingEnergy { index: usize },

    #[error("configuration {index}: no position/force table between dashed lines")]
    MissingTable { index: usize },

    #[error("configuration {index}: expected six numbers, got {line:?}")]
    MalformedRow { index: usize, line: String },

    #[error("configuration {index} has {actual} rows, expected one per ion ({expected})")]
    IonCountMismatch { index: usize, expected: usize, actual: usize },
}

/// One ionic step.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Position of the step in the file, counting from zero.
    pub index: usize,
    pub energy: f64,
    pub positions: Vec<[f64; 3]>,
    pub forces: Vec<[f64; 3]>,
}

impl Frame {
    pub fn into_configuration(self) -> Result<Configuration, StructureError> {
        Configuration::new(self.positions)
            .with_energy(self.energy)
            .with_forces(self.forces)
    }
}

/// The text of an `OUTCAR`, held in memory.
#[derive(Debug, Clone)]
pub struct Outcar {
    text: String,
}

impl FromStr for Outcar {
    type Err = OutcarError;

    fn from_str(s: &str) -> Result<Self, OutcarError> {
        Ok(Outcar { text: s.to_string() })
    }
}

impl Outcar {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, OutcarError> {
        let path = path.as_ref();
        let text = fsx::read_to_string(path)?;
        debug!("read {} bytes from {}", text.len(), path.display());
        Ok(Outcar { text })
    }

    pub fn ion_count(&self) -> Result<usize, OutcarError> {
        ION_COUNT.captures(&self.text)
            .and_then(|caps| caps[1].parse().ok())
            .ok_or(OutcarError::MissingIonCount)
    }

    /// The direct lattice vectors, as rows.
    ///
    /// Cells that are not orthogonal are returned anyway (with a warning);
    /// whether they are usable is for the caller to decide.
    pub fn lattice(&self) -> Result<Lattice, OutcarError> {
        let start = LATTICE_HEADER.find(&self.text).ok_or(OutcarError::MissingLattice)?.end();

        // the header line also names the reciprocal vectors; skip the rest of it
        let mut lines = self.text[start..].lines().skip(1);
        let mut rows = [[0.0; 3]; 3];
        for row in &mut rows {
            let line = lines.next().ok_or(OutcarError::MissingLattice)?;
            let values = parse_floats(line).ok_or(OutcarError::MissingLattice)?;
            if values.len() < 3 {
                return Err(OutcarError::MissingLattice);
            }
            row.copy_from_slice(&values[..3]);
        }

        let lattice = Lattice::new(&rows);
        if !lattice.is_orthogonal() {
            warn!("lattice vectors {:?} are not orthogonal; fitting requires an orthorhombic cell", rows);
        }
        Ok(lattice)
    }

    /// Number of `POSITION / TOTAL-FORCE` tables in the file.
    pub fn num_steps(&self) -> usize { STEP_HEADER.find_iter(&self.text).count() }

    /// Every `step_size`-th ionic step, starting from the first.
    pub fn configurations(&self, step_size: usize) -> Result<Vec<Frame>, OutcarError> {
        self.configurations_from(0, step_size)
    }

    /// Every `step_size`-th ionic step, starting from the one at `offset`.
    pub fn configurations_from(&self, offset: usize, step_size: usize) -> Result<Vec<Frame>, OutcarError> {
        if step_size == 0 {
            return Err(OutcarError::ZeroStepSize);
        }
        let num_ions = self.ion_count()?;

        let frames = STEP_HEADER.split(&self.text)
            .skip(1) // preamble
            .enumerate()
            .skip(offset)
            .step_by(step_size)
            .map(|(index, block)| parse_step(index, block, num_ions))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            "{} of {} ionic steps selected (offset {}, step size {})",
            frames.len(), self.num_steps(), offset, step_size,
        );
        Ok(frames)
    }
}

fn parse_step(index: usize, block: &str, num_ions: usize) -> Result<Frame, OutcarError> {
    let energy = ENERGY.captures(block)
        .and_then(|caps| caps[1].parse().ok())
        .ok_or(OutcarError::MissingEnergy { index })?;

    let mut lines = block.lines().skip_while(|line| !is_separator(line));
    if lines.next().is_none() {
        return Err(OutcarError::MissingTable { index });
    }

    let mut positions = vec![];
    let mut forces = vec![];
    let mut closed = false;
    for line in lines {
        if is_separator(line) {
            closed = true;
            break;
        }
        if line.trim().is_empty() {
            continue;
        }
        match parse_floats(line) {
            Some(ref v) if v.len() == 6 => {
                positions.push([v[0], v[1], v[2]]);
                forces.push([v[3], v[4], v[5]]);
            },
            _ => return Err(OutcarError::MalformedRow { index, line: line.trim().to_string() }),
        }
    }
    if !closed {
        return Err(OutcarError::MissingTable { index });
    }
    if positions.len() != num_ions {
        return Err(OutcarError::IonCountMismatch { index, expected: num_ions, actual: positions.len() });
    }

    trace!("ionic step {}: energy {}", index, energy);
    Ok(Frame { index, energy, positions, forces })
}

fn is_separator(line: &str) -> bool {
    let line = line.trim();
    line.len() >= 10 && line.chars().all(|c| c == '-')
}

fn parse_floats(line: &str) -> Option<Vec<f64>> {
    line.split_whitespace().map(|word| word.parse().ok()).collect()
}

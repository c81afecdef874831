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

pub use ::tempdir::TempDir as ActualTempDir;

use std::ffi::{OsStr, OsString};
use std::io::Result as IoResult;
use std::path::{Path, PathBuf};

/// Wrapper around `tempdir::TempDir` that does not destroy the directory on unwind.
///
/// A failing test leaves its files behind for inspection. If `MLPOT_SAVETEMP` is set,
/// the directory is moved there instead of being left in the system temp dir.
#[derive(Debug)]
pub struct TempDir(Option<ActualTempDir>);

impl From<ActualTempDir> for TempDir {
    fn from(tmp: ActualTempDir) -> Self { TempDir(Some(tmp)) }
}

/// Forward everything to the tempdir crate.
impl TempDir {
    pub fn new(prefix: &str) -> IoResult<TempDir> {
        ActualTempDir::new(prefix).map(Self::from)
    }

    pub fn new_in(tmpdir: impl AsRef<Path>, prefix: &str) -> IoResult<TempDir> {
        ActualTempDir::new_in(tmpdir, prefix).map(Self::from)
    }

    pub fn path(&self) -> &Path { self.inner().path() }
    pub fn into_path(mut self) -> PathBuf { self.take().into_path() }
    pub fn close(mut self) -> IoResult<()> { self.take().close() }

    fn inner(&self) -> &ActualTempDir {
        // only None after a consuming method, so never observable here
        self.0.as_ref().unwrap_or_else(|| unreachable!())
    }

    fn take(&mut self) -> ActualTempDir {
        self.0.take().unwrap_or_else(|| unreachable!())
    }
}

impl AsRef<Path> for TempDir {
    fn as_ref(&self) -> &Path { self.path() }
}

/// Leaks the inner TempDir if we are unwinding.
impl Drop for TempDir {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.recover();
        }
    }
}

impl TempDir {
    fn recover(&mut self) {
        let temp = match self.0.take() {
            Some(temp) => temp.into_path(),
            None => {
                error!("A TempDir was double-dropped during panic");
                return; // avoid double-panic
            },
        };

        let dest = match non_empty_env("MLPOT_SAVETEMP") {
            None => {
                info!("successfully leaked tempdir at {}", temp.display());
                return;
            },
            Some(dest) => PathBuf::from(dest),
        };

        let name = match temp.file_name() {
            None => {
                warn!("could not get temp dir name during panic");
                return;
            },
            Some(name) => name,
        };

        if let Err(e) = std::fs::create_dir_all(&dest) {
            warn!("failed to create '{}' during panic: {}", dest.display(), e);
            return;
        }

        let dest_file = dest.join(name);
        match std::fs::rename(&temp, &dest_file) {
            Err(e) => warn!("failed to move during panic: from '{}' to '{}': {}", temp.display(), dest_file.display(), e),
            Ok(()) => info!("recovered tempdir during panic: {}", dest_file.display()),
        }
    }
}

fn non_empty_env(key: impl AsRef<OsStr>) -> Option<OsString> {
    std::env::var_os(key).filter(|s| !s.is_empty())
}

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

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub use crate::tempdir::{ActualTempDir, TempDir};
mod tempdir;

#[macro_use]
extern crate log;

pub type Result<T> = std::result::Result<T, Error>;

/// An `io::Error` annotated with what we were doing to which path.
#[derive(Debug, thiserror::Error)]
#[error("{action} '{}': {source}", .path.display())]
pub struct Error {
    action: &'static str,
    path: PathBuf,
    #[source]
    source: io::Error,
}

impl Error {
    pub fn path(&self) -> &Path { &self.path }
    pub fn io_error(&self) -> &io::Error { &self.source }
}

trait ResultExt<T> {
    fn with_path(self, action: &'static str, path: &Path) -> Result<T>;
}

impl<T> ResultExt<T> for io::Result<T> {
    fn with_path(self, action: &'static str, path: &Path) -> Result<T> {
        self.map_err(|source| Error { action, path: path.to_owned(), source })
    }
}

/// Wrapper around `File::open` that adds context.
pub fn open(path: impl AsRef<Path>) -> Result<File> {
    let path = path.as_ref();
    File::open(path).with_path("while opening file", path)
}

/// Wrapper around `File::open` that adds context and makes a `BufReader`.
pub fn open_text(path: impl AsRef<Path>) -> Result<BufReader<File>>
{ open(path).map(BufReader::new) }

/// Wrapper around `File::create` that adds context.
pub fn create(path: impl AsRef<Path>) -> Result<File> {
    let path = path.as_ref();
    File::create(path).with_path("could not create file", path)
}

/// Wrapper around `File::create` that adds context and makes a `BufWriter`.
pub fn create_text(path: impl AsRef<Path>) -> Result<BufWriter<File>>
{ create(path).map(BufWriter::new) }

/// Wrapper around `std::fs::read_to_string` that adds context.
pub fn read_to_string(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    fs::read_to_string(path).with_path("could not read file", path)
}

/// Write a whole file at once.
pub fn write(path: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> Result<()> {
    let path = path.as_ref();
    let mut file = create(path)?;
    file.write_all(contents.as_ref()).with_path("could not write file", path)
}

/// Wrapper around `std::fs::create_dir_all` that adds context.
pub fn create_dir_all(dir: impl AsRef<Path>) -> Result<()> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).with_path("could not create directory", dir)
}

/// `true` if the path does not exist, or is a directory without entries.
pub fn is_missing_or_empty_dir(dir: impl AsRef<Path>) -> Result<bool> {
    let dir = dir.as_ref();
    if !dir.exists() {
        return Ok(true);
    }
    let mut entries = fs::read_dir(dir).with_path("could not read directory", dir)?;
    Ok(entries.next().is_none())
}

/// Simulates `rm -rf`.
///
/// Properties:
/// * Deletes files and folders alike.
/// * Does not require the path or its ancestors to exist.
/// * **Does** fail if other problems occur (e.g. insufficient permissions).
pub fn rm_rf(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let result = match path.is_dir() {
        true => fs::remove_dir_all(path),
        false => fs::remove_file(path),
    };
    match result {
        Err(ref e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other.with_path("could not delete", path),
    }
}

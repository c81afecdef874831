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

use crate::FailResult;

use mlpot_fs_util as fsx;
use std::path::Path;

pub trait Load: Sized {
    fn load(path: impl AsRef<Path>) -> FailResult<Self>;
}

pub trait Save {
    fn save(&self, path: impl AsRef<Path>) -> FailResult<()>;
}

/// Utility adapter for `Load`/`Save` that serializes as JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Json<T: ?Sized>(pub T);

impl<T> Load for Json<T> where T: for<'de> serde::Deserialize<'de> {
    fn load(path: impl AsRef<Path>) -> FailResult<Json<T>>
    { Ok(serde_json::from_reader(fsx::open_text(path)?)?).map(Json) }
}

impl<T> Save for Json<T> where T: serde::Serialize {
    fn save(&self, path: impl AsRef<Path>) -> FailResult<()>
    { Ok(serde_json::to_writer_pretty(fsx::create_text(path)?, &self.0)?) }
}

#[cfg(test)]
#[deny(unused)]
mod tests {
    use super::*;
    use mlpot_fs_util::TempDir;
    use std::collections::BTreeMap;

    #[test]
    fn json_round_trip() {
        let dir = TempDir::new("mlpot-json").unwrap();
        let path = dir.path().join("thing.json");

        let mut map = BTreeMap::new();
        map.insert("energy".to_string(), vec![1.5, -2.0]);
        Json(&map).save(&path).unwrap();

        let Json(loaded): Json<BTreeMap<String, Vec<f64>>> = Load::load(&path).unwrap();
        assert_eq!(loaded, map);

        assert!(<Json<Vec<f64>>>::load(dir.path().join("missing.json")).is_err());
    }
}

// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fs::write;
use std::path::Path;
use std::path::PathBuf;

use tempfile::TempDir;
use tempfile::tempdir;

use crate::error::Fallible;

/// A scratch directory, deleted when the returned value is dropped.
pub fn create_tmp_directory() -> Fallible<TempDir> {
    Ok(tempdir()?)
}

pub fn write_file(directory: &Path, name: &str, contents: &str) -> Fallible<PathBuf> {
    let path = directory.join(name);
    write(&path, contents)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_file() -> Fallible<()> {
        let dir = create_tmp_directory()?;
        let path = write_file(dir.path(), "a.txt", "hello")?;
        assert_eq!(std::fs::read_to_string(path)?, "hello");
        Ok(())
    }
}

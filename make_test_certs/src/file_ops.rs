// Copyright 2025 Adobe. All rights reserved.
// This file is licensed to you under the Apache License,
// Version 2.0 (http://www.apache.org/licenses/LICENSE-2.0)
// or the MIT license (http://opensource.org/licenses/MIT),
// at your option.

// Unless required by applicable law or agreed to in writing,
// this software is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR REPRESENTATIONS OF ANY KIND, either express or
// implied. See the LICENSE-MIT and LICENSE-APACHE files for the
// specific language governing permissions and limitations under
// each license.

//! Small filesystem helpers used while assembling the fixture tree.
use std::{
    fs::{self, File, OpenOptions},
    io::{self, Write},
    path::Path,
};

use glob::Pattern;
use log::debug;
use twoway::find_bytes;

use crate::error::{Error, Result};

/// Creates or truncates `path` and writes exactly `bytes`.
pub fn create_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    Ok(())
}

/// Creates `path` if it does not exist, leaving existing content alone.
pub fn touch(path: &Path) -> Result<()> {
    OpenOptions::new().create(true).append(true).open(path)?;
    Ok(())
}

/// Returns the content of `path` without its last `trim` bytes.
pub fn read_tail_trimmed(path: &Path, trim: usize) -> Result<Vec<u8>> {
    let mut buf = fs::read(path)?;
    if buf.len() < trim {
        return Err(Error::Truncated {
            path: path.to_path_buf(),
            len: buf.len(),
            trim,
        });
    }
    buf.truncate(buf.len() - trim);
    Ok(buf)
}

/// Writes the content of every file in `inputs`, in order, to `output`.
pub fn concat_files<P: AsRef<Path>>(inputs: &[P], output: &Path) -> Result<()> {
    let mut out = File::create(output)?;
    for input in inputs {
        let mut file = File::open(input.as_ref())?;
        io::copy(&mut file, &mut out)?;
    }
    out.flush()?;
    Ok(())
}

/// Deletes every file below `root` whose name matches `pattern`.
///
/// Returns the number of files removed.
pub fn purge_matching(root: &Path, pattern: &str) -> Result<usize> {
    let root = Pattern::escape(&root.to_string_lossy());
    let mut removed = 0;
    for entry in glob::glob(&format!("{root}/**/{pattern}"))? {
        let path = entry.map_err(io::Error::from)?;
        if path.is_file() {
            debug!("removing {}", path.display());
            fs::remove_file(&path)?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Replaces the first occurrence of `search` in `buf` with `replace`.
///
/// Returns the offset of the replacement, or `None` if `search` is absent.
pub fn splice_first(buf: &mut Vec<u8>, search: &[u8], replace: &[u8]) -> Option<usize> {
    let start = find_bytes(buf.as_slice(), search)?;
    buf.splice(start..start + search.len(), replace.iter().cloned());
    Some(start)
}

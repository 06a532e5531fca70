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

use std::{io, path::PathBuf};

use thiserror::Error;

/// `Error` enumerates the ways certificate fixture generation can fail.
///
/// Every error is fatal: the pipeline stops at the first one and a rerun
/// starts again from an empty output directory.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The toolkit ran but exited with a nonzero status.
    #[error("`{command}` failed with {}{}", describe_status(.status), format_stderr(.stderr))]
    ToolFailure {
        command: String,
        status: Option<i32>,
        stderr: Vec<String>,
    },

    /// The toolkit executable could not be started.
    #[error("unable to run {}: {source}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A corruption routine did not find the bytes it was meant to replace.
    #[error("{step}: pattern {pattern} not found in {}", .path.display())]
    PatternNotFound {
        step: &'static str,
        path: PathBuf,
        pattern: String,
    },

    /// A path expression still had an unbound variable or an empty segment.
    #[error("unresolved path segment: {0}")]
    UnresolvedPath(String),

    #[error("{} holds {len} bytes, cannot trim {trim}", .path.display())]
    Truncated { path: PathBuf, len: usize, trim: usize },

    #[error("bad fixture configuration: {0}")]
    BadConfig(String),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Glob(#[from] glob::PatternError),
}

fn describe_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exit status {code}"),
        None => "termination by signal".to_owned(),
    }
}

fn format_stderr(stderr: &[String]) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(":\n{}", stderr.join("\n"))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

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

//! Composable path expressions.
//!
//! A [`PathSpec`] is built from literal segments and named variables
//! (`dest`, `source`) combined with directory joins and plain string
//! concatenation. It is only turned into a concrete path when a
//! [`Bindings`] table is supplied, typically right before handing the
//! path to the toolkit.
use std::{
    collections::BTreeMap,
    fmt,
    path::{Path, PathBuf},
};

use crate::error::{Error, Result};

/// A path expression, resolved to a single string on demand.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathSpec {
    /// A literal fragment.
    Lit(String),
    /// A variable looked up in [`Bindings`] at resolve time.
    Var(String),
    /// `left/right`
    Join(Box<PathSpec>, Box<PathSpec>),
    /// `left` immediately followed by `right`
    Concat(Box<PathSpec>, Box<PathSpec>),
}

impl PathSpec {
    pub fn lit(s: impl Into<String>) -> Self {
        Self::Lit(s.into())
    }

    pub fn var(name: impl Into<String>) -> Self {
        Self::Var(name.into())
    }

    /// Appends `other` as a new path component.
    pub fn join(&self, other: impl Into<PathSpec>) -> Self {
        Self::Join(Box::new(self.clone()), Box::new(other.into()))
    }

    /// Appends `other` to the last component without a separator.
    pub fn concat(&self, other: impl Into<PathSpec>) -> Self {
        Self::Concat(Box::new(self.clone()), Box::new(other.into()))
    }

    /// Resolves the expression against `bindings`.
    ///
    /// Fails if a variable is unbound or any segment is empty.
    pub fn resolve(&self, bindings: &Bindings) -> Result<String> {
        match self {
            Self::Lit(s) if s.is_empty() => Err(Error::UnresolvedPath(format!(
                "empty segment in {self}"
            ))),
            Self::Lit(s) => Ok(s.clone()),
            Self::Var(name) => bindings
                .get(name)
                .map(str::to_owned)
                .ok_or_else(|| Error::UnresolvedPath(format!("unbound variable ${name}"))),
            Self::Join(left, right) => {
                let left = left.resolve(bindings)?;
                let right = right.resolve(bindings)?;
                if left.ends_with('/') {
                    Ok(format!("{left}{right}"))
                } else {
                    Ok(format!("{left}/{right}"))
                }
            }
            Self::Concat(left, right) => Ok(left.resolve(bindings)? + &right.resolve(bindings)?),
        }
    }

    pub fn resolve_path(&self, bindings: &Bindings) -> Result<PathBuf> {
        self.resolve(bindings).map(PathBuf::from)
    }
}

impl fmt::Display for PathSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lit(s) => write!(f, "{s:?}"),
            Self::Var(name) => write!(f, "${name}"),
            Self::Join(left, right) => write!(f, "{left}/{right}"),
            Self::Concat(left, right) => write!(f, "{left}+{right}"),
        }
    }
}

impl From<&str> for PathSpec {
    fn from(s: &str) -> Self {
        Self::lit(s)
    }
}

impl From<String> for PathSpec {
    fn from(s: String) -> Self {
        Self::Lit(s)
    }
}

/// Variable table used to resolve [`PathSpec`] expressions.
#[derive(Clone, Debug, Default)]
pub struct Bindings {
    vars: BTreeMap<String, String>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `name`, failing if `path` is not valid UTF-8.
    pub fn bind(mut self, name: impl Into<String>, path: impl AsRef<Path>) -> Result<Self> {
        let name = name.into();
        let path = path.as_ref();
        let value = path.to_str().ok_or_else(|| {
            Error::UnresolvedPath(format!("${name} is not valid UTF-8: {}", path.display()))
        })?;
        self.vars.insert(name, value.to_owned());
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }
}

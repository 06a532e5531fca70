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

//! Invocation of the external certificate toolkit.
use std::{
    env,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use log::{debug, error};

use crate::{
    error::{Error, Result},
    path_spec::{Bindings, PathSpec},
};

/// One argument of a toolkit command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Arg {
    /// An option name, rendered with a leading `-`.
    Flag(String),
    /// Passed through untouched.
    Value(String),
    /// A path expression, resolved before the process is spawned.
    File(PathSpec),
}

impl Arg {
    pub fn flag(name: impl Into<String>) -> Self {
        Self::Flag(name.into())
    }

    pub fn value(value: impl Into<String>) -> Self {
        Self::Value(value.into())
    }

    pub fn file(spec: PathSpec) -> Self {
        Self::File(spec)
    }

    fn render(&self, bindings: &Bindings) -> Result<String> {
        match self {
            Self::Flag(name) => Ok(format!("-{name}")),
            Self::Value(value) => Ok(value.clone()),
            Self::File(spec) => spec.resolve(bindings),
        }
    }
}

/// Builder for a toolkit command line, starting with its subcommand.
#[derive(Clone, Debug)]
pub struct ToolArgs {
    args: Vec<Arg>,
}

impl ToolArgs {
    pub fn new(subcommand: &str) -> Self {
        Self {
            args: vec![Arg::value(subcommand)],
        }
    }

    pub fn flag(mut self, name: &str) -> Self {
        self.args.push(Arg::flag(name));
        self
    }

    pub fn option(mut self, name: &str, value: impl Into<String>) -> Self {
        self.args.push(Arg::flag(name));
        self.args.push(Arg::value(value));
        self
    }

    pub fn file(mut self, name: &str, spec: PathSpec) -> Self {
        self.args.push(Arg::flag(name));
        self.args.push(Arg::file(spec));
        self
    }

    /// Adds a positional file argument.
    pub fn input(mut self, spec: PathSpec) -> Self {
        self.args.push(Arg::file(spec));
        self
    }

    pub fn extend(mut self, args: impl IntoIterator<Item = Arg>) -> Self {
        self.args.extend(args);
        self
    }

    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    /// Turns flags into `-name` and resolves every file reference.
    pub fn render(&self, bindings: &Bindings) -> Result<Vec<String>> {
        self.args.iter().map(|arg| arg.render(bindings)).collect()
    }
}

/// Runs the certificate toolkit with a fully rendered argument list.
#[cfg_attr(test, mockall::automock)]
pub trait ToolInvoker {
    /// Runs the toolkit once, returning an error on any nonzero exit.
    fn invoke(&self, args: &[String]) -> Result<()>;
}

/// Process environment handed to the toolkit.
#[derive(Clone, Debug, Default)]
pub struct ToolEnv {
    /// Exported as `HOME`.
    pub home: Option<PathBuf>,
    /// Exported as `OPENSSL_CONF`.
    pub openssl_conf: Option<PathBuf>,
    /// Working directory of the toolkit process.
    pub working_dir: Option<PathBuf>,
}

impl ToolEnv {
    /// Reads the optional overrides from the generator's own environment.
    pub fn from_env() -> Self {
        Self {
            home: env::var_os("MAKE_TEST_CERTS_HOME").map(PathBuf::from),
            openssl_conf: env::var_os("MAKE_TEST_CERTS_OPENSSL_CONF").map(PathBuf::from),
            working_dir: None,
        }
    }
}

/// [`ToolInvoker`] that spawns the toolkit executable.
///
/// Stdout is discarded and stderr captured; a nonzero exit becomes
/// [`Error::ToolFailure`] carrying the stderr lines.
#[derive(Clone, Debug)]
pub struct ProcessInvoker {
    program: PathBuf,
    env: ToolEnv,
}

impl ProcessInvoker {
    pub fn new(program: impl Into<PathBuf>, env: ToolEnv) -> Self {
        Self {
            program: program.into(),
            env,
        }
    }

    /// Uses `MAKE_TEST_CERTS_OPENSSL` if set, else `openssl` from `PATH`.
    pub fn from_env(env: ToolEnv) -> Self {
        let program = env::var_os("MAKE_TEST_CERTS_OPENSSL")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("openssl"));
        Self::new(program, env)
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl ToolInvoker for ProcessInvoker {
    fn invoke(&self, args: &[String]) -> Result<()> {
        debug!("{} {}", self.program.display(), args.join(" "));

        let mut command = Command::new(&self.program);
        command
            .args(args)
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        if let Some(home) = &self.env.home {
            command.env("HOME", home);
        }
        if let Some(conf) = &self.env.openssl_conf {
            command.env("OPENSSL_CONF", conf);
        }
        if let Some(dir) = &self.env.working_dir {
            command.current_dir(dir);
        }

        let output = command.output().map_err(|source| Error::Spawn {
            program: self.program.clone(),
            source,
        })?;
        if output.status.success() {
            return Ok(());
        }

        let stderr: Vec<String> = String::from_utf8_lossy(&output.stderr)
            .lines()
            .map(str::to_owned)
            .collect();
        for line in &stderr {
            error!("{line}");
        }
        Err(Error::ToolFailure {
            command: args.first().cloned().unwrap_or_default(),
            status: output.status.code(),
            stderr,
        })
    }
}

/// Toolkit access shared by the CA builder and the pipeline.
pub struct Toolkit<'a> {
    tool: &'a dyn ToolInvoker,
    bindings: &'a Bindings,
    passphrase: Option<&'a str>,
}

impl<'a> Toolkit<'a> {
    pub fn new(
        tool: &'a dyn ToolInvoker,
        bindings: &'a Bindings,
        passphrase: Option<&'a str>,
    ) -> Self {
        Self {
            tool,
            bindings,
            passphrase,
        }
    }

    pub fn run(&self, args: &ToolArgs) -> Result<()> {
        let rendered = args.render(self.bindings)?;
        self.tool.invoke(&rendered)
    }

    pub fn path(&self, spec: &PathSpec) -> Result<PathBuf> {
        spec.resolve_path(self.bindings)
    }

    /// `-passout` for commands that write a new private key.
    pub fn passout(&self) -> Vec<Arg> {
        self.pass_arg("passout")
    }

    /// `-passin` for commands that read a private key.
    pub fn passin(&self) -> Vec<Arg> {
        self.pass_arg("passin")
    }

    fn pass_arg(&self, name: &str) -> Vec<Arg> {
        match self.passphrase {
            Some(pass) => vec![Arg::flag(name), Arg::value(format!("pass:{pass}"))],
            None => Vec::new(),
        }
    }
}

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

//! Generates the X.509 certificate fixtures used by the TLS tests.
//! To run this, use the following command in a terminal
//! cargo run --bin make_test_certs -- --source <config dir> --dest <output dir>
use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use make_test_certs::{Bindings, CertPipeline, Config, ProcessInvoker, ToolEnv};

/// Generates X.509 test certificates and CA fixtures with OpenSSL.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct CliArgs {
    /// Enable debug logging.
    #[arg(short, long)]
    debug: bool,

    /// Directory to write the certificates to. Its previous content is removed.
    #[arg(long, default_value = "target/certs")]
    dest: PathBuf,

    /// Directory holding the OpenSSL configuration for every certificate.
    #[arg(long)]
    source: PathBuf,
}

fn main() -> Result<()> {
    let args = CliArgs::parse();

    // RUST_LOG still takes precedence over --debug
    let level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let source = fs::canonicalize(&args.source)
        .context(format!("Reading source directory {:?}", args.source))?;
    let config = Config::load(&source).context("Fixture table format")?;

    fs::create_dir_all(&args.dest).context(format!("Creating {:?}", args.dest))?;
    let dest = fs::canonicalize(&args.dest)?;

    let env = ToolEnv {
        working_dir: Some(dest.clone()),
        ..ToolEnv::from_env()
    };
    let tool = ProcessInvoker::from_env(env);
    log::debug!("using toolkit {}", tool.program().display());

    let bindings = Bindings::new()
        .bind("dest", &dest)?
        .bind("source", &source)?;
    CertPipeline::new(&tool, &bindings, &config)
        .run()
        .context(format!("Generating certificates in {}", dest.display()))?;

    Ok(())
}

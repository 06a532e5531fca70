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

//! Creation of certificate authority directories.
use std::fs;

use log::info;

use crate::{
    error::Result,
    file_ops::{create_file, touch},
    path_spec::PathSpec,
    tool::{Arg, ToolArgs, Toolkit},
};

/// Subdirectories of every CA directory.
pub const CA_SUBDIRS: [&str; 4] = ["certs", "crl", "newcerts", "private"];

pub const CRLNUMBER_SEED: &[u8] = b"01\n";
pub const SERIAL_SEED: &[u8] = b"1000\n";

/// Builds CA directories that the toolkit's `ca` command can operate on.
pub struct CaBuilder<'a, 'b> {
    toolkit: &'b Toolkit<'a>,
}

impl<'a, 'b> CaBuilder<'a, 'b> {
    pub fn new(toolkit: &'b Toolkit<'a>) -> Self {
        Self { toolkit }
    }

    /// Options that make the signing step self-sign with the CA's own key.
    pub fn self_sign_options(dir: &PathSpec) -> Vec<Arg> {
        vec![
            Arg::flag("selfsign"),
            Arg::flag("keyfile"),
            Arg::file(Self::private_key(dir)),
        ]
    }

    pub fn private_key(dir: &PathSpec) -> PathSpec {
        dir.join("private").join("cakey.pem")
    }

    pub fn certificate(dir: &PathSpec) -> PathSpec {
        dir.join("cacert.pem")
    }

    /// Creates the CA skeleton in `dir`, then a key and request with
    /// `config`, then signs it into `dir/cacert.pem` as a CA certificate.
    ///
    /// `req_options` are added to the request, `sign_options` to the
    /// signing step.
    pub fn make_ca(
        &self,
        dir: &PathSpec,
        config: &PathSpec,
        req_options: &[Arg],
        sign_options: &[Arg],
    ) -> Result<()> {
        let root = self.toolkit.path(dir)?;
        info!("creating CA {}", root.display());

        for sub in CA_SUBDIRS {
            fs::create_dir_all(root.join(sub))?;
        }
        touch(&root.join("index.txt"))?;
        create_file(&root.join("crlnumber"), CRLNUMBER_SEED)?;
        create_file(&root.join("serial"), SERIAL_SEED)?;

        let request = dir.join("careq.pem");
        let no_passphrase = req_options.contains(&Arg::flag("nodes"));
        self.toolkit.run(
            &ToolArgs::new("req")
                .flag("new")
                .file("config", config.clone())
                .file("keyout", Self::private_key(dir))
                .file("out", request.clone())
                .extend(req_options.iter().cloned())
                .extend(if no_passphrase {
                    Vec::new()
                } else {
                    self.toolkit.passout()
                }),
        )?;

        self.toolkit.run(
            &ToolArgs::new("ca")
                .flag("batch")
                .file("config", config.clone())
                .flag("create_serial")
                .option("extensions", "v3_ca")
                .file("out", Self::certificate(dir))
                .extend(sign_options.iter().cloned())
                .extend(self.toolkit.passin())
                .flag("infiles")
                .input(request),
        )
    }
}

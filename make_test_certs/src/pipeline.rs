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

//! Generates the certificate corpus described by a [`Config`].
use std::{fs, path::Path};

use log::{info, warn};

use crate::{
    ca_builder::CaBuilder,
    error::{Error, Result},
    file_ops,
    fixture::{Authority, Config, FixtureKind, FixtureSpec, Patch, Revocation},
    patch,
    path_spec::{Bindings, PathSpec},
    tool::{Arg, ToolArgs, ToolInvoker, Toolkit},
};

/// Files involved in issuing one certificate.
struct Issue {
    stem: String,
    req_config: PathSpec,
    sign_config: PathSpec,
    key: PathSpec,
    csr: PathSpec,
    cert: PathSpec,
}

/// Runs every step of fixture generation against an output directory.
///
/// `bindings` must define `dest` (output directory) and `source`
/// (directory holding the OpenSSL configs).
pub struct CertPipeline<'a> {
    toolkit: Toolkit<'a>,
    config: &'a Config,
}

impl<'a> CertPipeline<'a> {
    pub fn new(tool: &'a dyn ToolInvoker, bindings: &'a Bindings, config: &'a Config) -> Self {
        Self {
            toolkit: Toolkit::new(tool, bindings, config.passphrase.as_deref()),
            config,
        }
    }

    fn dest(&self, name: impl Into<PathSpec>) -> PathSpec {
        PathSpec::var("dest").join(name)
    }

    fn source(&self, name: impl Into<PathSpec>) -> PathSpec {
        PathSpec::var("source").join(name)
    }

    /// Generates the whole corpus, stopping at the first failure.
    pub fn run(&self) -> Result<()> {
        self.config.validate()?;
        self.reset_output()?;

        info!("creating root CA");
        let root = self.dest(self.config.root_dir.as_str());
        CaBuilder::new(&self.toolkit).make_ca(
            &root,
            &self.source(self.config.root_config.as_str()),
            &[],
            &CaBuilder::self_sign_options(&root),
        )?;

        for fixture in &self.config.fixtures {
            self.make_fixture(fixture)?;
        }
        for revocation in &self.config.revocations {
            self.revoke(revocation)?;
        }
        for authority in &self.config.crls {
            self.make_crl(authority)?;
        }
        for peer in &self.config.peers {
            self.make_fixture(peer)?;
        }

        let dest = self.toolkit.path(&PathSpec::var("dest"))?;
        let purged = file_ops::purge_matching(&dest, "*.old")?;
        info!("removed {purged} stale *.old files");
        Ok(())
    }

    /// Removes whatever a previous run left behind.
    ///
    /// Refuses to touch `dest` when the config directory lives inside it.
    fn reset_output(&self) -> Result<()> {
        let dest = self.toolkit.path(&PathSpec::var("dest"))?;
        let source = self.toolkit.path(&PathSpec::var("source"))?;
        let canonical = |p: &Path| fs::canonicalize(p).unwrap_or_else(|_| p.to_path_buf());
        if canonical(&source).starts_with(canonical(&dest)) {
            return Err(Error::BadConfig(format!(
                "source {} is inside the output directory {}",
                source.display(),
                dest.display()
            )));
        }
        if dest.exists() {
            info!("removing {}", dest.display());
            fs::remove_dir_all(&dest)?;
        }
        fs::create_dir_all(&dest)?;
        Ok(())
    }

    fn make_fixture(&self, fixture: &FixtureSpec) -> Result<()> {
        info!("creating fixture {} ({:?})", fixture.name, fixture.kind);
        let ca_dir = self.dest(fixture.ca_dir());
        let ca_config = self.source(fixture.ca_config());
        let builder = CaBuilder::new(&self.toolkit);
        match fixture.kind {
            FixtureKind::Leaf => {}
            FixtureKind::SelfSignedCa => builder.make_ca(
                &ca_dir,
                &ca_config,
                &[Arg::flag("nodes")],
                &CaBuilder::self_sign_options(&ca_dir),
            )?,
            FixtureKind::Chain => builder.make_ca(&ca_dir, &ca_config, &[], &[])?,
        }

        let issue = self.issue_for(fixture)?;
        self.request(&issue)?;
        if fixture.patch == Some(Patch::NullInRequest) {
            self.embed_null_bytes(&issue)?;
        }
        self.sign(&issue, fixture.policy.as_deref())?;
        if fixture.patch == Some(Patch::CorruptSignature) {
            self.corrupt_signature(&issue)?;
        }

        if fixture.kind == FixtureKind::Chain {
            let chain = self.dest(format!("{}-cert.pem", fixture.name));
            file_ops::concat_files(
                &[
                    self.toolkit.path(&issue.cert)?,
                    self.toolkit.path(&CaBuilder::certificate(&ca_dir))?,
                ],
                &self.toolkit.path(&chain)?,
            )?;
        }
        Ok(())
    }

    fn issue_for(&self, fixture: &FixtureSpec) -> Result<Issue> {
        let stem = fixture.stem();
        let req_config = self.source(fixture.leaf_config());
        let sign_config = match &fixture.authority {
            Some(authority) => self.source(self.config.authority_config(authority)?),
            None => req_config.clone(),
        };
        Ok(Issue {
            req_config,
            sign_config,
            key: self.dest(format!("{stem}-key.pem")),
            csr: self.dest(format!("{stem}.csr")),
            cert: self.dest(format!("{stem}-cert.pem")),
            stem,
        })
    }

    fn request(&self, issue: &Issue) -> Result<()> {
        self.toolkit.run(
            &ToolArgs::new("req")
                .flag("new")
                .file("config", issue.req_config.clone())
                .file("keyout", issue.key.clone())
                .file("out", issue.csr.clone())
                .extend(self.toolkit.passout()),
        )
    }

    fn sign(&self, issue: &Issue, policy: Option<&str>) -> Result<()> {
        let mut args = ToolArgs::new("ca")
            .flag("batch")
            .file("config", issue.sign_config.clone());
        if let Some(policy) = policy {
            args = args.option("policy", policy);
        }
        self.toolkit.run(
            &args
                .extend(self.toolkit.passin())
                .file("in", issue.csr.clone())
                .file("out", issue.cert.clone()),
        )
    }

    /// Replaces `NULL` in the request with zero bytes and re-signs the
    /// request with its own key, leaving a well formed request whose
    /// subject carries the null bytes.
    fn embed_null_bytes(&self, issue: &Issue) -> Result<()> {
        let der = self.dest(format!("{}.der", issue.stem));
        let tbs = self.dest(format!("{}.tbs", issue.stem));
        let sig = self.dest(format!("{}.sig", issue.stem));

        self.toolkit.run(
            &ToolArgs::new("req")
                .file("in", issue.csr.clone())
                .option("outform", "DER")
                .file("out", der.clone()),
        )?;

        let der_path = self.toolkit.path(&der)?;
        let mut bytes = fs::read(&der_path)?;
        if patch::embed_null_bytes(&mut bytes).is_none() {
            return Err(Error::PatternNotFound {
                step: "embedding null bytes",
                path: der_path,
                pattern: "NULL".to_owned(),
            });
        }
        file_ops::create_file(&der_path, &bytes)?;

        self.toolkit.run(
            &ToolArgs::new("asn1parse")
                .file("in", der.clone())
                .option("inform", "DER")
                .option("strparse", "4")
                .flag("noout")
                .file("out", tbs.clone()),
        )?;
        self.toolkit.run(
            &ToolArgs::new("dgst")
                .flag("sha256")
                .file("sign", issue.key.clone())
                .extend(self.toolkit.passin())
                .file("out", sig.clone())
                .input(tbs),
        )?;

        let mut resigned = file_ops::read_tail_trimmed(&der_path, patch::SIGNATURE_LEN)?;
        resigned.extend(fs::read(self.toolkit.path(&sig)?)?);
        file_ops::create_file(&der_path, &resigned)?;

        self.toolkit.run(
            &ToolArgs::new("req")
                .file("in", der)
                .option("inform", "DER")
                .option("outform", "PEM")
                .file("out", issue.csr.clone()),
        )
    }

    /// Damages the body of the issued certificate so its signature no
    /// longer verifies.
    fn corrupt_signature(&self, issue: &Issue) -> Result<()> {
        let path = self.toolkit.path(&issue.cert)?;
        let pem = fs::read(&path)?;
        let corrupted = patch::corrupt_pem_body(&pem).ok_or_else(|| Error::PatternNotFound {
            step: "corrupting certificate body",
            path: path.clone(),
            pattern: "XXXXXYYY\\n-----END CERTIFICATE-----\\n".to_owned(),
        })?;
        file_ops::create_file(&path, &corrupted)
    }

    fn revoke(&self, revocation: &Revocation) -> Result<()> {
        info!(
            "revoking {} by {:?}",
            revocation.certificate, revocation.authority
        );
        self.warn_if_missing(&revocation.authority)?;
        let config = self.config.authority_config(&revocation.authority)?;
        self.toolkit.run(
            &ToolArgs::new("ca")
                .flag("batch")
                .file("config", self.source(config))
                .extend(self.toolkit.passin())
                .file("revoke", self.dest(revocation.certificate.as_str())),
        )
    }

    fn make_crl(&self, authority: &Authority) -> Result<()> {
        info!("creating CRL for {authority:?}");
        self.warn_if_missing(authority)?;
        let config = self.config.authority_config(authority)?;
        let dir = self.config.authority_dir(authority)?;
        self.toolkit.run(
            &ToolArgs::new("ca")
                .flag("batch")
                .file("config", self.source(config))
                .flag("gencrl")
                .extend(self.toolkit.passin())
                .file("out", self.dest(dir).join("crl").join("crl.pem")),
        )
    }

    fn warn_if_missing(&self, authority: &Authority) -> Result<()> {
        let dir = self.dest(self.config.authority_dir(authority)?);
        let path = self.toolkit.path(&dir)?;
        if !path.is_dir() {
            warn!("CA directory {} does not exist", path.display());
        }
        Ok(())
    }
}

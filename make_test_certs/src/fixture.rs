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

//! Declarative description of the certificate corpus.
use std::{collections::HashSet, fs, path::Path};

use log::info;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Name of the optional fixture table in the source directory.
pub const FIXTURES_FILE: &str = "fixtures.json";

/// How a fixture's certificate is issued.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FixtureKind {
    /// A certificate signed with `{name}.cnf`.
    #[default]
    Leaf,
    /// A standalone CA `{name}_CA` that signs the `{name}` certificate.
    SelfSignedCa,
    /// A CA `{name}_CA` signed by its parent, a tail certificate
    /// `{name}-tail` signed by that CA, and the two concatenated.
    Chain,
}

/// Deliberate corruption applied to a fixture.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Patch {
    /// Null bytes in the request subject, re-signed so the request stays valid.
    NullInRequest,
    /// Damaged base64 near the end of the issued certificate.
    CorruptSignature,
}

/// A CA that can sign, revoke and publish a CRL.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Authority {
    Root,
    /// The CA owned by the named fixture.
    Fixture(String),
}

/// Defines one fixture of the corpus.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FixtureSpec {
    /// Prefix of every file generated for this fixture.
    pub name: String,
    #[serde(default)]
    pub kind: FixtureKind,
    #[serde(default)]
    pub patch: Option<Patch>,
    /// Sign with this authority's config instead of the fixture's own.
    #[serde(default)]
    pub authority: Option<Authority>,
    /// Value for `ca -policy`.
    #[serde(default)]
    pub policy: Option<String>,
}

impl FixtureSpec {
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FixtureKind::Leaf,
            patch: None,
            authority: None,
            policy: None,
        }
    }

    pub fn with_kind(mut self, kind: FixtureKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_patch(mut self, patch: Patch) -> Self {
        self.patch = Some(patch);
        self
    }

    /// Directory of the CA this fixture owns.
    pub fn ca_dir(&self) -> String {
        format!("{}_CA", self.name)
    }

    /// Config used to create and sign this fixture's own CA.
    pub fn ca_config(&self) -> String {
        format!("{}_CA.cnf", self.name)
    }

    /// File stem of the certificate issued for this fixture.
    pub fn stem(&self) -> String {
        match self.kind {
            FixtureKind::Chain => format!("{}-tail", self.name),
            FixtureKind::Leaf | FixtureKind::SelfSignedCa => self.name.clone(),
        }
    }

    /// Config of the issued certificate; also the one naming the fixture's CA database.
    pub fn leaf_config(&self) -> String {
        format!("{}.cnf", self.stem())
    }

    pub fn owns_ca(&self) -> bool {
        self.kind != FixtureKind::Leaf
    }
}

/// Revokes `certificate` (relative to the output directory) in the
/// database of `authority`.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Revocation {
    pub authority: Authority,
    pub certificate: String,
}

/// Configuration of a corpus run.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory of the root CA inside the output directory.
    pub root_dir: String,
    /// Config of the root CA inside the source directory.
    pub root_config: String,
    /// Private key passphrase, if the configs encrypt keys.
    pub passphrase: Option<String>,
    /// Fixtures, generated in order.
    pub fixtures: Vec<FixtureSpec>,
    /// Applied after all fixtures exist.
    pub revocations: Vec<Revocation>,
    /// CAs whose CRL is generated after the revocations.
    pub crls: Vec<Authority>,
    /// Server and client certificates, generated last.
    pub peers: Vec<FixtureSpec>,
}

// Defaults for Config
impl Default for Config {
    fn default() -> Self {
        let fixtures = (1..=27)
            .map(|id| {
                let fixture = FixtureSpec::leaf(id.to_string());
                match id {
                    11 => fixture.with_patch(Patch::NullInRequest),
                    14 => fixture.with_kind(FixtureKind::SelfSignedCa),
                    15 => fixture.with_patch(Patch::CorruptSignature),
                    18..=22 | 25..=27 => fixture.with_kind(FixtureKind::Chain),
                    _ => fixture,
                }
            })
            .collect();

        let peer = |name: &str| FixtureSpec {
            authority: Some(Authority::Root),
            policy: Some("policy_anything".to_owned()),
            ..FixtureSpec::leaf(name)
        };

        Self {
            root_dir: "root".to_owned(),
            root_config: "ca.cnf".to_owned(),
            passphrase: None,
            fixtures,
            revocations: vec![
                Revocation {
                    authority: Authority::Root,
                    certificate: "24-cert.pem".to_owned(),
                },
                Revocation {
                    authority: Authority::Root,
                    certificate: "27_CA/cacert.pem".to_owned(),
                },
                Revocation {
                    authority: Authority::Fixture("26".to_owned()),
                    certificate: "26-tail-cert.pem".to_owned(),
                },
            ],
            crls: vec![
                Authority::Root,
                Authority::Fixture("25".to_owned()),
                Authority::Fixture("26".to_owned()),
                Authority::Fixture("27".to_owned()),
            ],
            peers: vec![peer("server"), peer("client")],
        }
    }
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads `fixtures.json` from `source` if present, else the default corpus.
    pub fn load(source: &Path) -> Result<Self> {
        let path = source.join(FIXTURES_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        info!("reading fixture table {}", path.display());
        Self::from_json(&fs::read_to_string(&path)?)
    }

    pub fn fixture(&self, name: &str) -> Option<&FixtureSpec> {
        self.fixtures
            .iter()
            .chain(&self.peers)
            .find(|f| f.name == name)
    }

    /// Config whose `ca` section points at `authority`'s database.
    pub fn authority_config(&self, authority: &Authority) -> Result<String> {
        match authority {
            Authority::Root => Ok(self.root_config.clone()),
            Authority::Fixture(name) => Ok(self.ca_fixture(name)?.leaf_config()),
        }
    }

    /// Directory of `authority` inside the output directory.
    pub fn authority_dir(&self, authority: &Authority) -> Result<String> {
        match authority {
            Authority::Root => Ok(self.root_dir.clone()),
            Authority::Fixture(name) => Ok(self.ca_fixture(name)?.ca_dir()),
        }
    }

    fn ca_fixture(&self, name: &str) -> Result<&FixtureSpec> {
        match self.fixture(name) {
            Some(f) if f.owns_ca() => Ok(f),
            Some(_) => Err(Error::BadConfig(format!("fixture {name} does not own a CA"))),
            None => Err(Error::BadConfig(format!("no fixture named {name}"))),
        }
    }

    /// Checks names are unique and every authority resolves to a CA.
    pub fn validate(&self) -> Result<()> {
        if self.root_dir.is_empty() || self.root_config.is_empty() {
            return Err(Error::BadConfig("root CA is not configured".to_owned()));
        }

        let mut names = HashSet::new();
        for fixture in self.fixtures.iter().chain(&self.peers) {
            if fixture.name.is_empty() || fixture.name.contains('/') {
                return Err(Error::BadConfig(format!(
                    "invalid fixture name {:?}",
                    fixture.name
                )));
            }
            if !names.insert(fixture.name.as_str()) {
                return Err(Error::BadConfig(format!(
                    "duplicate fixture name {}",
                    fixture.name
                )));
            }
            if let Some(authority) = &fixture.authority {
                self.authority_config(authority)?;
            }
        }

        for revocation in &self.revocations {
            self.authority_config(&revocation.authority)?;
        }
        for authority in &self.crls {
            self.authority_config(authority)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn default_corpus() {
        let config = Config::default();
        config.validate().unwrap();

        let names: Vec<_> = config.fixtures.iter().map(|f| f.name.as_str()).collect();
        let expected: Vec<String> = (1..=27).map(|id| id.to_string()).collect();
        assert_eq!(names, expected);

        let kind = |name: &str| config.fixture(name).unwrap().kind;
        assert_eq!(kind("14"), FixtureKind::SelfSignedCa);
        for name in ["18", "19", "20", "21", "22", "25", "26", "27"] {
            assert_eq!(kind(name), FixtureKind::Chain);
        }
        assert_eq!(kind("23"), FixtureKind::Leaf);
        assert_eq!(config.fixture("11").unwrap().patch, Some(Patch::NullInRequest));
        assert_eq!(config.fixture("15").unwrap().patch, Some(Patch::CorruptSignature));

        let server = config.fixture("server").unwrap();
        assert_eq!(server.authority, Some(Authority::Root));
        assert_eq!(server.policy.as_deref(), Some("policy_anything"));
    }

    #[test]
    fn file_names() {
        let config = Config::default();
        let chain = config.fixture("26").unwrap();
        assert_eq!(chain.ca_dir(), "26_CA");
        assert_eq!(chain.ca_config(), "26_CA.cnf");
        assert_eq!(chain.stem(), "26-tail");
        assert_eq!(chain.leaf_config(), "26-tail.cnf");

        let own = config.fixture("14").unwrap();
        assert_eq!(own.stem(), "14");
        assert_eq!(own.leaf_config(), "14.cnf");

        assert_eq!(
            config.authority_config(&Authority::Fixture("26".to_owned())).unwrap(),
            "26-tail.cnf"
        );
        assert_eq!(config.authority_dir(&Authority::Root).unwrap(), "root");
        assert!(matches!(
            config.authority_dir(&Authority::Fixture("23".to_owned())),
            Err(Error::BadConfig(_))
        ));
    }

    #[test]
    fn json_overrides_defaults() {
        let config = Config::from_json(
            r#"{
                "passphrase": "secret",
                "fixtures": [
                    { "name": "1" },
                    { "name": "2", "kind": "chain" },
                    { "name": "3", "patch": "corrupt_signature" }
                ],
                "revocations": [
                    { "authority": { "fixture": "2" }, "certificate": "2-tail-cert.pem" }
                ],
                "crls": ["root", { "fixture": "2" }]
            }"#,
        )
        .unwrap();
        config.validate().unwrap();

        assert_eq!(config.passphrase.as_deref(), Some("secret"));
        assert_eq!(config.root_config, "ca.cnf");
        assert_eq!(config.fixtures.len(), 3);
        assert_eq!(config.fixtures[1].kind, FixtureKind::Chain);
        assert_eq!(config.crls[1], Authority::Fixture("2".to_owned()));
        assert_eq!(config.peers.len(), 2);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let json = r#"{ "fixtures": [{ "name": "1", "colour": "red" }] }"#;
        assert!(Config::from_json(json).is_err());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut config = Config::default();
        config.peers.push(FixtureSpec::leaf("7"));
        assert!(matches!(
            config.validate(),
            Err(Error::BadConfig(msg)) if msg.contains("duplicate")
        ));
    }

    #[test]
    fn leaf_authority_is_rejected() {
        let mut config = Config::default();
        config.crls.push(Authority::Fixture("24".to_owned()));
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_without_table_uses_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.fixtures.len(), 27);

        fs::write(dir.path().join(FIXTURES_FILE), r#"{ "fixtures": [] }"#).unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert!(config.fixtures.is_empty());
    }
}

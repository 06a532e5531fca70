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

//! Generates a deterministic corpus of X.509 test certificates.
//!
//! Every cryptographic operation is delegated to the OpenSSL command line
//! tool; this crate only sequences the calls, lays out the CA directories
//! and applies a couple of byte-level corruptions for edge-case fixtures.
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::unwrap_used)]

pub mod ca_builder;
pub mod error;
pub mod file_ops;
pub mod fixture;
pub mod patch;
pub mod path_spec;
pub mod pipeline;
pub mod tool;

pub use ca_builder::CaBuilder;
pub use error::{Error, Result};
pub use fixture::{Authority, Config, FixtureKind, FixtureSpec, Patch, Revocation};
pub use path_spec::{Bindings, PathSpec};
pub use pipeline::CertPipeline;
pub use tool::{Arg, ProcessInvoker, ToolArgs, ToolEnv, ToolInvoker, Toolkit};

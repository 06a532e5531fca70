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

//! Byte-level corruption of requests and certificates.
//!
//! These only compute the patched bytes; reading, writing and re-signing
//! are driven by the pipeline.
use crate::file_ops::splice_first;

/// Marker in the request subject that gets replaced by zero bytes.
pub const NULL_MARKER: &[u8] = b"NULL";

/// Length of the placeholder signature at the end of the DER request.
pub const SIGNATURE_LEN: usize = 256;

pub const PEM_FOOTER: &[u8] = b"\n-----END CERTIFICATE-----\n";

const CORRUPT_RUN: &[u8] = b"AAAAA";

/// Characters left untouched between the corrupted run and the footer.
const KEPT_TAIL: usize = 3;

/// Replaces the first [`NULL_MARKER`] in `der` with four zero bytes.
///
/// Returns the offset of the replacement.
pub fn embed_null_bytes(der: &mut Vec<u8>) -> Option<usize> {
    splice_first(der, NULL_MARKER, &[0; 4])
}

/// Overwrites five base64 characters near the end of a PEM certificate.
///
/// The run sits right before the last three characters of the body so the
/// padding is untouched. Line breaks are skipped when counting, so a short
/// final line is handled. Returns `None` when the input does not end with
/// [`PEM_FOOTER`], the body is too short, or the run is already `AAAAA`.
pub fn corrupt_pem_body(pem: &[u8]) -> Option<Vec<u8>> {
    let body = pem.strip_suffix(PEM_FOOTER)?;

    let positions: Vec<usize> = body
        .iter()
        .enumerate()
        .rev()
        .filter(|(_, b)| !matches!(b, b'\n' | b'\r'))
        .take(KEPT_TAIL + CORRUPT_RUN.len())
        .map(|(i, _)| i)
        .collect();
    if positions.len() < KEPT_TAIL + CORRUPT_RUN.len()
        || !positions.iter().all(|&i| is_base64(body[i]))
    {
        return None;
    }

    // positions run backwards from the footer
    let run = &positions[KEPT_TAIL..];
    if run.iter().all(|&i| body[i] == b'A') {
        return None;
    }

    let mut out = pem.to_vec();
    for (&i, &c) in run.iter().rev().zip(CORRUPT_RUN) {
        out[i] = c;
    }
    Some(out)
}

fn is_base64(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'=')
}

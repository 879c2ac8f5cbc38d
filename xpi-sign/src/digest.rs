// Copyright 2024 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use base64::{prelude::BASE64_STANDARD, Engine};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use xpi_common::*;

/// Hash algorithms that can appear in manifest and signature file headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestAlgorithm {
    Sha1,
    Sha256
}

impl DigestAlgorithm {
    /// Header spelling, as in `SHA256-Digest` and `Digest-Algorithms: SHA1 SHA256`.
    pub fn header_name(self) -> &'static str {
        match self {
            DigestAlgorithm::Sha1 => "SHA1",
            DigestAlgorithm::Sha256 => "SHA256"
        }
    }

    pub fn b64_digest(self, input: impl AsRef<[u8]>) -> String {
        match self {
            DigestAlgorithm::Sha1 => BASE64_STANDARD.encode(Sha1::digest(input)),
            DigestAlgorithm::Sha256 => BASE64_STANDARD.encode(Sha256::digest(input))
        }
    }
}

/// Which digests go into generated manifests and signature files, in the
/// order they are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestConfig {
    pub algorithms: Vec<DigestAlgorithm>
}

impl Default for ManifestConfig {
    fn default() -> Self {
        ManifestConfig {
            algorithms: vec![DigestAlgorithm::Sha1, DigestAlgorithm::Sha256]
        }
    }
}

impl ManifestConfig {
    pub(crate) fn checked_algorithms(&self) -> Result<&[DigestAlgorithm]> {
        match self.algorithms.as_slice() {
            [] => Err(XpiError::NoDigestAlgorithms),
            algorithms => Ok(algorithms)
        }
    }

    // "SHA1 SHA256"
    pub(crate) fn algorithms_header(&self) -> String {
        self.algorithms
            .iter()
            .map(|alg| alg.header_name())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

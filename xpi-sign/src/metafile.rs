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

use xpi_common::*;

/// The only directory signature related entries may live in.
pub const META_INF_DIR: &str = "META-INF/";

pub const MANIFEST_PATH: &str = "META-INF/manifest.mf";
pub const SIGNATURE_FILE_PATH: &str = "META-INF/mozilla.sf";
pub const PKCS7_SIGNATURE_PATH: &str = "META-INF/mozilla.rsa";
pub const COSE_MANIFEST_PATH: &str = "META-INF/cose.manifest";
pub const COSE_SIGNATURE_PATH: &str = "META-INF/cose.sig";

/// A file destined for `META-INF/` in the signed archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metafile {
    pub name: String,
    pub body: Vec<u8>
}

impl Metafile {
    pub fn new(name: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Metafile {
            name: name.into(),
            body: body.into()
        }
    }

    /// Checks that the name points at a file strictly below `META-INF/`.
    ///
    /// Empty and `.` segments are ignored, any `..` segment is rejected
    /// outright. Absolute names, backslashes, NULs and names ending in `/`
    /// are rejected too.
    pub fn is_name_valid(&self) -> bool {
        let name = self.name.as_str();
        if name.is_empty() || name.starts_with('/') || name.ends_with('/') {
            return false;
        }
        if name.contains(['\\', '\0']) {
            return false;
        }

        let mut segments = vec![];
        for segment in name.split('/') {
            match segment {
                "" | "." => continue,
                ".." => return false,
                _ => segments.push(segment)
            }
        }

        segments.len() >= 2 && META_INF_DIR.strip_suffix('/') == Some(segments[0])
    }
}

/// Fails with [XpiError::InvalidMetafileName] on the first bad name.
pub fn validate_metafiles(metafiles: &[Metafile]) -> Result<()> {
    match metafiles.iter().find(|meta| !meta.is_name_valid()) {
        Some(meta) => Err(XpiError::InvalidMetafileName(meta.name.clone())),
        None => Ok(())
    }
}

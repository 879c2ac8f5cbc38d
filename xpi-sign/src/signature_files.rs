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

//! Recognises signature files left behind by an earlier signing pass.
//!
//! Only direct children of `META-INF/` count. The directory name is matched
//! exactly, the file name without regard to case.

use crate::metafile::META_INF_DIR;

enum Matcher {
    Exact(&'static str),
    Extension(&'static str),
    Prefix(&'static str)
}

impl Matcher {
    // `name` is already lower-cased
    fn matches(&self, name: &str) -> bool {
        match self {
            Matcher::Exact(exact) => name == *exact,
            Matcher::Extension(ext) => name
                .rsplit_once('.')
                .is_some_and(|(_, actual)| actual == *ext),
            Matcher::Prefix(prefix) => name.starts_with(prefix)
        }
    }
}

// Signed JAR File: https://docs.oracle.com/javase/8/docs/technotes/guides/jar/jar.html#Signed_JAR_File
const JAR_SIGNATURE_FILES: &[(&str, Matcher)] = &[
    (META_INF_DIR, Matcher::Exact("manifest.mf")),
    (META_INF_DIR, Matcher::Extension("sf")),
    (META_INF_DIR, Matcher::Extension("rsa")),
    (META_INF_DIR, Matcher::Extension("dsa")),
    (META_INF_DIR, Matcher::Extension("ec")),
    (META_INF_DIR, Matcher::Prefix("sig-"))
];

const COSE_SIGNATURE_FILES: &[(&str, Matcher)] = &[
    (META_INF_DIR, Matcher::Exact("cose.manifest")),
    (META_INF_DIR, Matcher::Exact("cose.sig"))
];

/// Whether `name` is a PKCS7 (signed JAR) manifest, signature file or
/// signature block.
pub fn is_jar_signature_file(name: &str) -> bool {
    matches_any(JAR_SIGNATURE_FILES, name)
}

/// Whether `name` is the COSE manifest or COSE signature.
pub fn is_cose_signature_file(name: &str) -> bool {
    matches_any(COSE_SIGNATURE_FILES, name)
}

/// Either kind of signature file. These never end up in a manifest and never
/// survive a repack.
pub fn is_signature_file(name: &str) -> bool {
    is_jar_signature_file(name) || is_cose_signature_file(name)
}

fn matches_any(rules: &[(&str, Matcher)], name: &str) -> bool {
    rules.iter().any(|(dir, matcher)| {
        name.strip_prefix(dir)
            .filter(|file_name| !file_name.is_empty() && !file_name.contains('/'))
            .is_some_and(|file_name| matcher.matches(&file_name.to_ascii_lowercase()))
    })
}

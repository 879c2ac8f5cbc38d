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

//! Archives and expected outputs shared by the unit tests.

use std::io::Cursor;

/// Unsigned bootstrapped add-on with `bootstrap.js`, `install.rdf` and
/// `test.txt`, the first two deflated and the last one stored.
pub const UNSIGNED_BOOTSTRAP: &[u8] = include_bytes!("unsigned_bootstrap.xpi");

/// Holds nothing but a `META-INF/` directory, `META-INF/cose.manifest` and
/// `META-INF/cose.sig`.
pub const UNSIGNED_EMPTY_COSE: &[u8] = include_bytes!("unsigned_empty_cose.xpi");

pub const UNSIGNED_BOOTSTRAP_MANIFEST: &[u8] = b"Manifest-Version: 1.0

Name: bootstrap.js
Digest-Algorithms: SHA1 SHA256
SHA1-Digest: RBQlzx98wYTuqEZZQKdav2H9Gag=
SHA256-Digest: m186SAMS1n5Q8hOWNE6+vGOXxfxH45sAzDlji1E3qaI=

Name: install.rdf
Digest-Algorithms: SHA1 SHA256
SHA1-Digest: WRohqAlB/BhgUjM2RDI+pTV6ihQ=
SHA256-Digest: LHIIuDZ3MKJG7tRhByz81k3UThgCjakBe0JxGZhxF9w=

Name: test.txt
Digest-Algorithms: SHA1 SHA256
SHA1-Digest: 8mPWZnQPS9arW9Tu/vmC+JHgnYA=
SHA256-Digest: 8usFS0xIHQV5njGLlVZofDfPreYQP4+qWMMvYF5fvNw=

";

pub const UNSIGNED_BOOTSTRAP_SIGNATURE_FILE: &[u8] = b"Signature-Version: 1.0
SHA1-Digest-Manifest: hWJRXCpbMGcu7pD6jEH4YibF5KQ=
SHA256-Digest-Manifest: DEeZKUfwfIdRBxyA9IkCXkUaYaTn6mWnljQtELTy4cg=

";

// The signature block is opaque to us, any bytes will do
pub const UNSIGNED_BOOTSTRAP_SIGNATURE: &[u8] = &[0; 13];

pub const EMPTY_MANIFEST: &[u8] = b"Manifest-Version: 1.0\n\n";

/// Zips `(path, data)` pairs in order, all deflated.
pub fn build_zip(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut buf = vec![];
    let mut writer = xpi_zip::ArchiveWriter::new(Cursor::new(&mut buf));
    for (path, data) in files {
        writer
            .add_file(&xpi_zip::File {
                path: path.to_string(),
                data: data.to_vec()
            })
            .unwrap();
    }
    writer.finish().unwrap();
    buf
}

/// Reads every entry back as `(name, contents)`.
pub fn unzip(buf: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut reader = xpi_zip::ArchiveReader::new(buf).unwrap();
    let entries = reader.entries().to_vec();
    entries
        .iter()
        .map(|entry| (entry.name.clone(), reader.read_contents(entry.index).unwrap()))
        .collect()
}

/// Clears the UTF-8 flag (general purpose bit 11) on every local and central
/// header, the way many zip tools leave names.
pub fn clear_utf8_flags(buf: &mut [u8]) {
    for pos in 0..buf.len().saturating_sub(10) {
        let magic = [buf[pos], buf[pos + 1], buf[pos + 2], buf[pos + 3]];
        match &magic {
            b"PK\x03\x04" => buf[pos + 7] &= !0x08,
            b"PK\x01\x02" => buf[pos + 9] &= !0x08,
            _ => {}
        }
    }
}

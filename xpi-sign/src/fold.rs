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

//! Line folding for the `Name:` header of manifest records.
//!
//! From the JAR File Specification: no line may be longer than 72 bytes (not
//! characters), in its UTF8-encoded form. If a value would make the initial
//! line longer than this, it should be continued on extra lines (each starting
//! with a single SPACE).
//!
//! https://docs.oracle.com/javase/8/docs/technotes/guides/jar/jar.html#Notes_on_Manifest_and_Signature_Files

use xpi_common::*;

/// Line budget including the trailing `\n`.
pub const MAX_LINE_BYTES: usize = 72;
/// Name bytes that fit on the `Name: ` line.
pub const FIRST_LINE_BYTES: usize = MAX_LINE_BYTES - "Name: ".len() - 1;
/// Name bytes that fit on each continuation line after its leading space.
pub const CONTINUATION_LINE_BYTES: usize = MAX_LINE_BYTES - 2;
/// Longest name we agree to fold. Matches the JAR header value limit.
pub const MAX_HEADER_BYTES: usize = 65535;

/// Folds an entry name so every physical line of its `Name:` header fits in
/// [MAX_LINE_BYTES].
///
/// The first segment gets [FIRST_LINE_BYTES], every following one starts with
/// `\n ` and gets [CONTINUATION_LINE_BYTES]. A fold point that would land in
/// the middle of a multi-byte character moves back to the start of that
/// character, so each line stays valid UTF-8 on its own.
pub fn fold_filename(filename: &[u8]) -> Result<Vec<u8>> {
    let name = std::str::from_utf8(filename)
        .map_err(|_| XpiError::InvalidEncoding(filename.to_vec()))?;
    if name.len() > MAX_HEADER_BYTES {
        return Err(XpiError::NameTooLong(name.len()));
    }

    let mut folded = Vec::with_capacity(name.len() + 2 * (name.len() / CONTINUATION_LINE_BYTES + 1));
    let mut pos = 0;
    let mut budget = FIRST_LINE_BYTES;
    while pos < name.len() {
        if pos > 0 {
            folded.extend_from_slice(b"\n ");
        }
        let end = fold_point(name, pos, budget);
        folded.extend_from_slice(&name.as_bytes()[pos..end]);
        pos = end;
        budget = CONTINUATION_LINE_BYTES;
    }

    Ok(folded)
}

// Last char boundary at most `budget` bytes past `start`
fn fold_point(name: &str, start: usize, budget: usize) -> usize {
    let mut end = (start + budget).min(name.len());
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    end
}

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

use log::debug;
use std::io::Cursor;
use xpi_common::*;
use xpi_zip::{ArchiveReader, ArchiveWriter};

use crate::metafile::{
    validate_metafiles, Metafile, MANIFEST_PATH, PKCS7_SIGNATURE_PATH, SIGNATURE_FILE_PATH
};
use crate::signature_files::is_signature_file;

/// Rebuilds `archive` with `metafiles` appended after its content.
///
/// Signature files from earlier signing passes and directory entries are
/// dropped. Everything else is copied across in its original order with its
/// original compressed bytes. Metafiles are added deflated, in the order
/// given. Names are checked before anything is written, so a bad name means
/// no output at all.
pub fn repack(archive: &[u8], metafiles: &[Metafile]) -> Result<Vec<u8>> {
    validate_metafiles(metafiles)?;
    let mut reader = ArchiveReader::new(archive)?;

    // Decide what survives before writing anything
    let retained: Vec<usize> = reader
        .entries()
        .iter()
        .filter(|entry| {
            let dropped = entry.is_dir || is_signature_file(&entry.name);
            if dropped {
                debug!("Dropping {} from repacked archive", entry.name);
            }
            !dropped
        })
        .map(|entry| entry.index)
        .collect();

    let mut writer = ArchiveWriter::new(Cursor::new(Vec::with_capacity(archive.len())));
    for index in &retained {
        reader.copy_entry_to(*index, &mut writer)?;
    }
    for meta in metafiles {
        writer.add_file(&xpi_zip::File {
            path: meta.name.clone(),
            data: meta.body.clone()
        })?;
    }
    debug!(
        "Repacked {} entries and {} metafiles",
        retained.len(),
        metafiles.len()
    );

    Ok(writer.finish()?.into_inner())
}

/// Repacks with the classic three file PKCS7 layout: manifest, signature
/// file and the signature block over the signature file.
pub fn repack_legacy(
    archive: &[u8],
    manifest: &[u8],
    sig_file: &[u8],
    signature: &[u8]
) -> Result<Vec<u8>> {
    repack(
        archive,
        &[
            Metafile::new(MANIFEST_PATH, manifest),
            Metafile::new(SIGNATURE_FILE_PATH, sig_file),
            Metafile::new(PKCS7_SIGNATURE_PATH, signature)
        ]
    )
}

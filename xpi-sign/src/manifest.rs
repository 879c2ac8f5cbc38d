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

//! Manifest and signature file generation for signed JAR style archives.
//!
//! The output has to match what the verifying browser computes byte for
//! byte: records are written in central directory order with `\n` line
//! endings, and the signature file digests the manifest exactly as returned.

use log::{debug, trace};
use xpi_common::*;
use xpi_zip::ArchiveReader;

use crate::digest::{DigestAlgorithm, ManifestConfig};
use crate::fold::fold_filename;
use crate::metafile::{validate_metafiles, Metafile};
use crate::signature_files::is_signature_file;

const MANIFEST_HEADER: &str = "Manifest-Version: 1.0\n\n";
const SIGNATURE_FILE_HEADER: &str = "Signature-Version: 1.0\n";

/// Builds the manifest on its own. COSE signatures sign this directly.
pub fn build_manifest(archive: &[u8]) -> Result<Vec<u8>> {
    build_manifest_with(archive, &ManifestConfig::default())
}

pub fn build_manifest_with(archive: &[u8], config: &ManifestConfig) -> Result<Vec<u8>> {
    let algorithms = config.checked_algorithms()?;
    let mut reader = ArchiveReader::new(archive)?;
    let entries = reader.entries().to_vec();

    let mut manifest = MANIFEST_HEADER.as_bytes().to_vec();
    let mut records = 0;
    for entry in &entries {
        if entry.is_dir {
            trace!("Leaving directory {} out of the manifest", entry.name);
            continue;
        }
        // Signature files from a previous signing pass never sign themselves
        if is_signature_file(&entry.name) {
            debug!("Leaving signature file {} out of the manifest", entry.name);
            continue;
        }
        let data = reader.read_contents(entry.index)?;
        append_record(&mut manifest, &entry.raw_name, &data, config, algorithms)?;
        records += 1;
    }
    debug!("Built manifest with {records} records");

    Ok(manifest)
}

/// Builds the manifest plus the signature file that digests it. The
/// signature file is what the PKCS7 signature covers.
pub fn build_manifest_and_signature_file(archive: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
    build_manifest_and_signature_file_with(archive, &ManifestConfig::default())
}

pub fn build_manifest_and_signature_file_with(
    archive: &[u8],
    config: &ManifestConfig
) -> Result<(Vec<u8>, Vec<u8>)> {
    let manifest = build_manifest_with(archive, config)?;
    let sig_file = build_signature_file_with(&manifest, config)?;
    Ok((manifest, sig_file))
}

pub fn build_signature_file(manifest: &[u8]) -> Result<Vec<u8>> {
    build_signature_file_with(manifest, &ManifestConfig::default())
}

pub fn build_signature_file_with(manifest: &[u8], config: &ManifestConfig) -> Result<Vec<u8>> {
    let mut output_sig = SIGNATURE_FILE_HEADER.to_string();
    for alg in config.checked_algorithms()? {
        let digest = alg.b64_digest(manifest);
        output_sig = format!("{output_sig}{}-Digest-Manifest: {digest}\n", alg.header_name());
    }
    output_sig.push('\n');
    Ok(output_sig.into_bytes())
}

/// Builds a manifest for the archive and then lists `metafiles` after the
/// archive's own entries, so a PKCS7 signature also covers files that will
/// only be added at repack time (the COSE manifest and signature).
///
/// Metafile names are validated before the archive is even opened.
pub fn build_pkcs7_manifest(archive: &[u8], metafiles: &[Metafile]) -> Result<Vec<u8>> {
    build_pkcs7_manifest_with(archive, metafiles, &ManifestConfig::default())
}

pub fn build_pkcs7_manifest_with(
    archive: &[u8],
    metafiles: &[Metafile],
    config: &ManifestConfig
) -> Result<Vec<u8>> {
    validate_metafiles(metafiles)?;
    let algorithms = config.checked_algorithms()?;

    let mut manifest = build_manifest_with(archive, config)?;
    for meta in metafiles {
        append_record(&mut manifest, meta.name.as_bytes(), &meta.body, config, algorithms)?;
    }
    Ok(manifest)
}

fn append_record(
    manifest: &mut Vec<u8>,
    raw_name: &[u8],
    data: &[u8],
    config: &ManifestConfig,
    algorithms: &[DigestAlgorithm]
) -> Result<()> {
    let file_name = fold_filename(raw_name)?;
    manifest.extend_from_slice(b"Name: ");
    manifest.extend_from_slice(&file_name);
    manifest.push(b'\n');

    let mut headers = format!("Digest-Algorithms: {}\n", config.algorithms_header());
    for alg in algorithms {
        let digest = alg.b64_digest(data);
        headers = format!("{headers}{}-Digest: {digest}\n", alg.header_name());
    }
    headers.push('\n');
    manifest.extend_from_slice(headers.as_bytes());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metafile::{COSE_MANIFEST_PATH, COSE_SIGNATURE_PATH};
    use crate::testdata::*;

    #[test]
    fn bootstrap_manifest_and_signature_file() {
        let (manifest, sig_file) = build_manifest_and_signature_file(UNSIGNED_BOOTSTRAP).unwrap();
        assert_eq!(
            String::from_utf8_lossy(&manifest),
            String::from_utf8_lossy(UNSIGNED_BOOTSTRAP_MANIFEST)
        );
        assert_eq!(
            String::from_utf8_lossy(&sig_file),
            String::from_utf8_lossy(UNSIGNED_BOOTSTRAP_SIGNATURE_FILE)
        );
    }

    #[test]
    fn signature_file_digests_the_manifest() {
        let (manifest, sig_file) = build_manifest_and_signature_file(UNSIGNED_BOOTSTRAP).unwrap();
        let sig_file = String::from_utf8(sig_file).unwrap();
        for alg in [DigestAlgorithm::Sha1, DigestAlgorithm::Sha256] {
            let line = format!("{}-Digest-Manifest: {}\n", alg.header_name(), alg.b64_digest(&manifest));
            assert!(sig_file.contains(&line), "missing {line:?}");
        }
        assert_eq!(build_signature_file(&manifest).unwrap(), sig_file.as_bytes());
    }

    #[test]
    fn cose_files_and_directories_are_left_out() {
        assert_eq!(build_manifest(UNSIGNED_EMPTY_COSE).unwrap(), EMPTY_MANIFEST);
    }

    #[test]
    fn stale_signature_files_are_left_out() {
        let archive = build_zip(&[
            ("META-INF/MANIFEST.MF", b"old manifest"),
            ("META-INF/mozilla.sf", b"old sig file"),
            ("META-INF/mozilla.rsa", b"old sig"),
            ("META-INF/cose.sig", b"old cose sig"),
            ("META-INF/extra.txt", b"kept"),
            ("a.txt", b"hello"),
        ]);
        let manifest = String::from_utf8(build_manifest(&archive).unwrap()).unwrap();
        let names: Vec<_> = manifest
            .lines()
            .filter_map(|line| line.strip_prefix("Name: "))
            .collect();
        assert_eq!(names, ["META-INF/extra.txt", "a.txt"]);
    }

    #[test]
    fn records_follow_archive_order() {
        let archive = build_zip(&[("z.txt", b"z"), ("a.txt", b"a"), ("m/n.txt", b"n")]);
        let manifest = String::from_utf8(build_manifest(&archive).unwrap()).unwrap();
        let names: Vec<_> = manifest
            .lines()
            .filter_map(|line| line.strip_prefix("Name: "))
            .collect();
        assert_eq!(names, ["z.txt", "a.txt", "m/n.txt"]);
    }

    #[test]
    fn long_names_are_folded() {
        let name = "assets/org/apache/commons/math3/exception/util/LocalizedFormats_fr.properties";
        let archive = build_zip(&[(name, b"")]);
        let manifest = String::from_utf8(build_manifest(&archive).unwrap()).unwrap();
        assert!(manifest.contains(
            "Name: assets/org/apache/commons/math3/exception/util/LocalizedFormats_f\n r.properties\nDigest-Algorithms: SHA1 SHA256\n"
        ));
    }

    #[test]
    fn configured_algorithms_are_honoured() {
        let config = ManifestConfig {
            algorithms: vec![DigestAlgorithm::Sha256]
        };
        let archive = build_zip(&[("a.txt", b"")]);
        let (manifest, sig_file) =
            build_manifest_and_signature_file_with(&archive, &config).unwrap();
        let expected_manifest = "Manifest-Version: 1.0\n\nName: a.txt\nDigest-Algorithms: SHA256\nSHA256-Digest: 47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=\n\n";
        assert_eq!(String::from_utf8(manifest.clone()).unwrap(), expected_manifest);
        let expected_sig_file = format!(
            "Signature-Version: 1.0\nSHA256-Digest-Manifest: {}\n\n",
            DigestAlgorithm::Sha256.b64_digest(&manifest)
        );
        assert_eq!(String::from_utf8(sig_file).unwrap(), expected_sig_file);
    }

    #[test]
    fn empty_algorithm_set_fails() {
        let config = ManifestConfig { algorithms: vec![] };
        assert!(matches!(
            build_manifest_with(UNSIGNED_BOOTSTRAP, &config),
            Err(XpiError::NoDigestAlgorithms)
        ));
    }

    #[test]
    fn corrupt_archive_fails() {
        assert!(matches!(
            build_manifest(b"PK\x03\x04 but nothing else"),
            Err(XpiError::CorruptArchive(_))
        ));
        assert!(matches!(
            build_manifest_and_signature_file(&UNSIGNED_BOOTSTRAP[..UNSIGNED_BOOTSTRAP.len() - 10]),
            Err(XpiError::CorruptArchive(_))
        ));
    }

    #[test]
    fn corrupt_entry_fails() {
        let mut stored = vec![];
        {
            use std::io::{Cursor, Write};
            use zip::write::SimpleFileOptions;
            let mut zip = zip::ZipWriter::new(Cursor::new(&mut stored));
            let options =
                SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
            zip.start_file("a.txt", options).unwrap();
            zip.write_all(b"hello world").unwrap();
            zip.finish().unwrap();
        }
        // Flip the stored contents so the CRC no longer matches
        let pos = stored
            .windows(11)
            .position(|window| window == b"hello world")
            .unwrap();
        stored[pos..pos + 11].copy_from_slice(b"HELLO WORLD");

        match build_manifest(&stored) {
            Err(XpiError::CorruptEntry(name, _)) => assert_eq!(name, "a.txt"),
            other => panic!("unexpected result {other:?}")
        }
    }

    #[test]
    fn non_utf8_entry_name_fails() {
        let mut archive = build_zip(&[("aX.txt", b"data")]);
        // Name appears in the local header and the central directory
        for pos in 0..archive.len() - 6 {
            if &archive[pos..pos + 6] == b"aX.txt" {
                archive[pos + 1] = 0xFF;
            }
        }
        assert!(matches!(
            build_manifest(&archive),
            Err(XpiError::InvalidEncoding(name)) if name == b"a\xFF.txt"
        ));
    }

    #[test]
    fn pkcs7_manifest_lists_metafiles_last() {
        let metafiles = vec![
            Metafile::new(COSE_MANIFEST_PATH, EMPTY_MANIFEST.to_vec()),
            Metafile::new(COSE_SIGNATURE_PATH, b"dummy signature".to_vec()),
        ];
        let manifest = build_pkcs7_manifest(UNSIGNED_BOOTSTRAP, &metafiles).unwrap();
        let prefix_len = UNSIGNED_BOOTSTRAP_MANIFEST.len();
        assert_eq!(&manifest[..prefix_len], UNSIGNED_BOOTSTRAP_MANIFEST);

        let expected_tail = format!(
            "Name: META-INF/cose.manifest\nDigest-Algorithms: SHA1 SHA256\nSHA1-Digest: {}\nSHA256-Digest: {}\n\n\
             Name: META-INF/cose.sig\nDigest-Algorithms: SHA1 SHA256\nSHA1-Digest: {}\nSHA256-Digest: {}\n\n",
            DigestAlgorithm::Sha1.b64_digest(EMPTY_MANIFEST),
            DigestAlgorithm::Sha256.b64_digest(EMPTY_MANIFEST),
            DigestAlgorithm::Sha1.b64_digest(b"dummy signature"),
            DigestAlgorithm::Sha256.b64_digest(b"dummy signature"),
        );
        assert_eq!(String::from_utf8_lossy(&manifest[prefix_len..]), expected_tail);
    }

    #[test]
    fn pkcs7_manifest_rejects_bad_metafile_names_first() {
        let metafiles = vec![Metafile::new("./", b"foo".to_vec())];
        assert!(matches!(
            build_pkcs7_manifest(b"", &metafiles),
            Err(XpiError::InvalidMetafileName(name)) if name == "./"
        ));
    }
}

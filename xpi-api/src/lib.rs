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

//! # XPI API
//!
//! This crate exposes the main public API through which other projects can
//! sign browser add-ons. The cryptography is not done here: callers plug in a
//! [Pkcs7Signer] and/or a [CoseSigner] backed by whatever holds their keys
//! (an HSM, a KMS, a local key file).
//!
//! ## Signing with PKCS7
//!
//! ```ignore
//! let signer = |sig_file: &[u8]| -> Result<Vec<u8>> { my_hsm.sign_pkcs7_detached(sig_file) };
//! let signed_xpi = sign_pkcs7(&unsigned_xpi, &signer)?;
//! ```
//!
//! ## Signing with COSE and PKCS7
//!
//! The COSE signature covers the archive contents, and the PKCS7 signature
//! covers both the contents and the COSE files.
//!
//! ```ignore
//! let signed_xpi = sign_pkcs7_and_cose(&unsigned_xpi, &cose_signer, &pkcs7_signer)?;
//! ```

use log::debug;
use xpi_sign::metafile::{
    COSE_MANIFEST_PATH, COSE_SIGNATURE_PATH, MANIFEST_PATH, PKCS7_SIGNATURE_PATH,
    SIGNATURE_FILE_PATH
};

pub use xpi_common::{Result, XpiError};
pub use xpi_sign::{
    build_manifest, build_manifest_and_signature_file, build_pkcs7_manifest, build_signature_file,
    repack, repack_legacy, DigestAlgorithm, ManifestConfig, Metafile
};

/// Produces a detached PKCS7 signature over a signature file.
///
/// The returned bytes are embedded as `META-INF/mozilla.rsa` without being
/// looked at. Failures should be reported as [XpiError::SignerFailed].
pub trait Pkcs7Signer {
    fn sign_signature_file(&self, sig_file: &[u8]) -> Result<Vec<u8>>;
}

/// Produces a COSE signature over a manifest, embedded as `META-INF/cose.sig`.
pub trait CoseSigner {
    fn sign_manifest(&self, manifest: &[u8]) -> Result<Vec<u8>>;
}

impl<F: Fn(&[u8]) -> Result<Vec<u8>>> Pkcs7Signer for F {
    fn sign_signature_file(&self, sig_file: &[u8]) -> Result<Vec<u8>> {
        self(sig_file)
    }
}

impl<F: Fn(&[u8]) -> Result<Vec<u8>>> CoseSigner for F {
    fn sign_manifest(&self, manifest: &[u8]) -> Result<Vec<u8>> {
        self(manifest)
    }
}

/// Signs an add-on with the PKCS7 (signed JAR) scheme.
///
/// Returns: the archive with any old signature removed and
/// `META-INF/manifest.mf`, `META-INF/mozilla.sf` and `META-INF/mozilla.rsa`
/// appended.
pub fn sign_pkcs7(archive: &[u8], signer: &impl Pkcs7Signer) -> Result<Vec<u8>> {
    let (manifest, sig_file) = build_manifest_and_signature_file(archive)?;
    let signature = signer.sign_signature_file(&sig_file)?;
    debug!("Got {} byte PKCS7 signature", signature.len());
    repack_legacy(archive, &manifest, &sig_file, &signature)
}

/// Signs an add-on with COSE only, adding `META-INF/cose.manifest` and
/// `META-INF/cose.sig`.
pub fn sign_cose(archive: &[u8], signer: &impl CoseSigner) -> Result<Vec<u8>> {
    let metafiles = cose_metafiles(archive, signer)?;
    repack(archive, &metafiles)
}

/// Signs an add-on with COSE, then signs the result again with PKCS7 so that
/// older verifiers still accept it.
///
/// The PKCS7 manifest lists the COSE manifest and signature after the
/// archive's own entries. Output order is `cose.manifest`, `cose.sig`,
/// `manifest.mf`, `mozilla.sf`, `mozilla.rsa`.
pub fn sign_pkcs7_and_cose(
    archive: &[u8],
    cose_signer: &impl CoseSigner,
    pkcs7_signer: &impl Pkcs7Signer
) -> Result<Vec<u8>> {
    let mut metafiles = cose_metafiles(archive, cose_signer)?;

    let manifest = build_pkcs7_manifest(archive, &metafiles)?;
    let sig_file = build_signature_file(&manifest)?;
    let signature = pkcs7_signer.sign_signature_file(&sig_file)?;
    debug!("Got {} byte PKCS7 signature", signature.len());

    metafiles.push(Metafile::new(MANIFEST_PATH, manifest));
    metafiles.push(Metafile::new(SIGNATURE_FILE_PATH, sig_file));
    metafiles.push(Metafile::new(PKCS7_SIGNATURE_PATH, signature));
    repack(archive, &metafiles)
}

fn cose_metafiles(archive: &[u8], signer: &impl CoseSigner) -> Result<Vec<Metafile>> {
    let manifest = build_manifest(archive)?;
    let signature = signer.sign_manifest(&manifest)?;
    debug!("Got {} byte COSE signature", signature.len());
    Ok(vec![
        Metafile::new(COSE_MANIFEST_PATH, manifest),
        Metafile::new(COSE_SIGNATURE_PATH, signature),
    ])
}

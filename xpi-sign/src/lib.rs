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

//! Signed JAR File format for browser add-ons (XPI files).
//!
//! This crate produces the bytes that get signed (manifest and signature
//! file) and puts the resulting signature back into the archive. It never
//! touches key material: signatures come in as opaque bytes.
//!
//! The format is described in
//! https://docs.oracle.com/javase/8/docs/technotes/guides/jar/jar.html#Signed_JAR_File

pub mod digest;
pub mod fold;
pub mod manifest;
pub mod metafile;
pub mod repack;
pub mod signature_files;

#[cfg(test)]
mod testdata;

pub use digest::{DigestAlgorithm, ManifestConfig};
pub use manifest::{
    build_manifest, build_manifest_and_signature_file, build_pkcs7_manifest, build_signature_file
};
pub use metafile::Metafile;
pub use repack::{repack, repack_legacy};

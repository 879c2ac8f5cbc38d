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

use std::{fmt, io, rc::Rc};

use zip::result::ZipError;

/// Common error type making it easier to share `Result`s between the XPI crates.
///
/// Every variant is terminal for the signing request it occurred in: nothing
/// in the workspace retries, and no partially built archive is ever returned
/// alongside one of these.
#[derive(Debug, Clone)]
pub enum XpiError {
    /// xpi-cli encountered an error while processing something specific to
    /// the command line implementation. For example, not enough arguments were
    /// passed via the shell.
    Cli(String),
    /// An archive entry name is not valid UTF-8. Manifest text is UTF-8 only,
    /// so the raw name bytes are kept here for the caller to report.
    InvalidEncoding(Vec<u8>),
    /// An archive entry name is longer than a manifest header may be. The
    /// length of the offending name in bytes is attached.
    NameTooLong(usize),
    /// The input could not be opened as a ZIP archive, usually because the
    /// End Of Central Directory record is missing or the central directory
    /// itself is truncated.
    CorruptArchive(Rc<ZipError>),
    /// The named entry was listed in the central directory but its contents
    /// could not be read or decompressed.
    CorruptEntry(String, Rc<io::Error>),
    /// A metafile would have been written outside `META-INF/`, contains `..`
    /// or names a directory. Names are never sanitised, the request fails.
    InvalidMetafileName(String),
    /// A manifest was requested with an empty set of digest algorithms.
    NoDigestAlgorithms,
    /// An error occurred while reading or writing bytes. Since only `xpi-cli`
    /// interacts with the disk, inside the library this means an in-memory
    /// buffer write failed.
    IoFailure(Rc<io::Error>),
    /// `xpi-zip` failed to write the output archive in-memory.
    ZipWritingFailed(Rc<ZipError>),
    /// The external signer (PKCS7 or COSE) refused or failed to sign the
    /// bytes it was handed. The message is whatever the signer reported.
    SignerFailed(String)
}

/// Result type where the error is always [XpiError].
pub type Result<T> = std::result::Result<T, XpiError>;

impl fmt::Display for XpiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XpiError::Cli(msg) => write!(f, "{msg}"),
            XpiError::InvalidEncoding(name) => {
                write!(f, "invalid UTF-8 in entry name {}", String::from_utf8_lossy(name))
            }
            XpiError::NameTooLong(len) => write!(f, "entry name of {len} bytes is too long"),
            XpiError::CorruptArchive(err) => write!(f, "failed to open archive: {err}"),
            XpiError::CorruptEntry(name, err) => write!(f, "failed to read entry {name}: {err}"),
            XpiError::InvalidMetafileName(name) => {
                write!(f, "cannot pack metafile with invalid path: {name}")
            }
            XpiError::NoDigestAlgorithms => write!(f, "no digest algorithms configured"),
            XpiError::IoFailure(err) => write!(f, "I/O failure: {err}"),
            XpiError::ZipWritingFailed(err) => write!(f, "failed to write archive: {err}"),
            XpiError::SignerFailed(msg) => write!(f, "signer failed: {msg}")
        }
    }
}

impl std::error::Error for XpiError {}

/// This makes it easier for Result<Something, XpiError> to be handed to hosts that only carry strings
impl From<XpiError> for String {
    fn from(value: XpiError) -> Self {
        format!("{:?}", value)
    }
}

// Automatic conversion from other types of error to XpiError makes the rest of the code cleaner
impl From<io::Error> for XpiError {
    fn from(value: io::Error) -> Self {
        XpiError::IoFailure(value.into())
    }
}

// Read-side zip errors are mapped explicitly to CorruptArchive/CorruptEntry,
// anything reaching this conversion came from the writer.
impl From<ZipError> for XpiError {
    fn from(value: ZipError) -> Self {
        XpiError::ZipWritingFailed(value.into())
    }
}

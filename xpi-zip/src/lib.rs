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

//! In-memory access to ZIP based containers (XPI, JAR).
//!
//! Reading goes through [ArchiveReader], which indexes the central directory
//! once and hands out entry contents on demand. Writing goes through
//! [ArchiveWriter], which can either copy an entry across untouched (same
//! compressed bytes, method and timestamp) or add a new one.

use log::trace;
use std::io::{self, Cursor, Read, Seek, Write};
use std::rc::Rc;
use xpi_common::*;
use zip::{write::SimpleFileOptions, CompressionMethod, DateTime, ZipArchive, ZipWriter};

pub struct File {
    pub path: String,
    pub data: Vec<u8>
}

/// What the central directory says about one entry.
#[derive(Debug, Clone)]
pub struct EntryInfo {
    /// Position of the entry in the central directory.
    pub index: usize,
    /// Name as decoded by the zip reader. Used for classification only, the
    /// manifest is always written from `raw_name`.
    pub name: String,
    /// Name bytes exactly as stored in the archive.
    pub raw_name: Vec<u8>,
    pub is_dir: bool,
    pub compression: CompressionMethod,
    pub last_modified: Option<DateTime>
}

/// Read-only view over an archive held in memory.
pub struct ArchiveReader<'a> {
    archive: ZipArchive<Cursor<&'a [u8]>>,
    entries: Vec<EntryInfo>,
    input_len: usize
}

impl<'a> ArchiveReader<'a> {
    /// Parses the central directory of `zip_buf`.
    ///
    /// Fails with [XpiError::CorruptArchive] if the buffer isn't a ZIP file or
    /// any central directory record can't be read.
    pub fn new(zip_buf: &'a [u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(zip_buf)).map_err(corrupt_archive)?;

        let mut entries = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let file = archive.by_index_raw(index).map_err(corrupt_archive)?;
            entries.push(EntryInfo {
                index,
                name: file.name().to_string(),
                raw_name: file.name_raw().to_vec(),
                is_dir: file.is_dir(),
                compression: file.compression(),
                last_modified: file.last_modified()
            });
        }
        trace!("Indexed {} archive entries", entries.len());

        Ok(ArchiveReader {
            archive,
            entries,
            input_len: zip_buf.len()
        })
    }

    /// Entries in central directory order.
    pub fn entries(&self) -> &[EntryInfo] {
        &self.entries
    }

    /// Decompresses the contents of the entry at `index`.
    ///
    /// The decompression stream lives only for the duration of this call. The
    /// declared size is only a capacity hint and is capped at the input
    /// length, since it comes straight from the archive.
    pub fn read_contents(&mut self, index: usize) -> Result<Vec<u8>> {
        let name = self.entry_name(index);
        let mut file = self
            .archive
            .by_index(index)
            .map_err(|e| XpiError::CorruptEntry(name.clone(), Rc::new(io::Error::from(e))))?;

        let capacity = file.size().min(self.input_len as u64) as usize;
        let mut data = Vec::with_capacity(capacity);
        file.read_to_end(&mut data)
            .map_err(|e| XpiError::CorruptEntry(name, Rc::new(e)))?;
        Ok(data)
    }

    /// Copies the entry at `index` into `writer` without recompressing it.
    ///
    /// The entry keeps its exact name bytes, which must be UTF-8. The CP437
    /// decoding the reader applies to names without the UTF-8 flag is never
    /// written back.
    pub fn copy_entry_to<W: Write + Seek>(
        &mut self,
        index: usize,
        writer: &mut ArchiveWriter<W>
    ) -> Result<()> {
        let raw_name = self
            .entries
            .get(index)
            .map(|entry| entry.raw_name.clone())
            .unwrap_or_default();
        let name = String::from_utf8(raw_name)
            .map_err(|e| XpiError::InvalidEncoding(e.into_bytes()))?;

        let file = self.archive.by_index_raw(index).map_err(corrupt_archive)?;
        writer.zip.raw_copy_file_rename(file, name)?;
        Ok(())
    }

    fn entry_name(&self, index: usize) -> String {
        self.entries
            .get(index)
            .map(|entry| entry.name.clone())
            .unwrap_or_default()
    }
}

/// Builds a new archive into any seekable output.
pub struct ArchiveWriter<W: Write + Seek> {
    zip: ZipWriter<W>,
    options: SimpleFileOptions
}

impl<W: Write + Seek> ArchiveWriter<W> {
    /// New entries are always deflated, copied entries keep their own method.
    pub fn new(output: W) -> Self {
        ArchiveWriter {
            zip: ZipWriter::new(output),
            options: SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
        }
    }

    pub fn add_file(&mut self, file: &File) -> Result<()> {
        self.zip.start_file(file.path.as_str(), self.options)?;
        self.zip.write_all(&file.data)?;
        Ok(())
    }

    /// Writes the central directory and hands back the output.
    pub fn finish(self) -> Result<W> {
        Ok(self.zip.finish()?)
    }
}

fn corrupt_archive(err: zip::result::ZipError) -> XpiError {
    XpiError::CorruptArchive(err.into())
}

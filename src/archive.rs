use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::ArchiveError;

#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub path: String,
    pub bytes: Vec<u8>,
}

/// Builds a deflate-compressed ZIP in memory.
///
/// Entries land in the archive in the order they are added.
pub struct ArchiveAssembler {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
    entries: usize,
}

impl ArchiveAssembler {
    pub fn new() -> Self {
        ArchiveAssembler {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            // Default timestamp is the ZIP epoch, keeping output reproducible
            options: SimpleFileOptions::default().compression_method(CompressionMethod::Deflated),
            entries: 0,
        }
    }

    pub fn add(&mut self, entry: ArchiveEntry) -> Result<(), ArchiveError> {
        self.zip.start_file(entry.path, self.options)?;
        self.zip.write_all(&entry.bytes)?;
        self.entries += 1;
        Ok(())
    }

    pub fn entry_count(&self) -> usize {
        self.entries
    }

    pub fn finalize(self) -> Result<Vec<u8>, ArchiveError> {
        let cursor = self.zip.finish()?;
        Ok(cursor.into_inner())
    }
}

//! Memory-mapped `.kmd` file contents.

use std::fs::File;
use std::ops::Deref;

use memmap2::{Mmap, MmapOptions};

/// A read-only memory map of a whole file.
///
/// The map is dropped (and the file unmapped) together with this value, so
/// decoded data that must outlive it has to be copied out, which the decoder
/// always does.
#[derive(Debug)]
pub struct MappedFile {
    mmap: Mmap,
}

impl MappedFile {
    /// Map `file` read-only.
    ///
    /// The caller must not map empty files; some platforms reject zero-length maps.
    pub fn map(file: &File) -> std::io::Result<Self> {
        // Safety: the map is read-only and the decoder copies everything it
        // keeps. Concurrent truncation of the file by another process is the
        // usual mmap caveat and is not guarded against.
        let mmap = unsafe { MmapOptions::new().map(file)? };
        Ok(MappedFile { mmap })
    }

    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }
}

impl AsRef<[u8]> for MappedFile {
    fn as_ref(&self) -> &[u8] {
        &self.mmap
    }
}

impl Deref for MappedFile {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.mmap
    }
}

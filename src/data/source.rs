//! Turning a path on disk into bytes the decoder can read.
//!
//! All file-system failures are folded into the file-access class of
//! [`ImportError`], so callers only ever see one error type.

use std::borrow::Cow;
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io;
use std::path::Path;

use tracing::debug;

use crate::data::wrappers::mmap::MappedFile;
use crate::error::{IResult, ImportError};
use crate::models::header::check_file_size;

/// Required file extension, without the dot.
pub const KMD_EXTENSION: &str = "kmd";

/// Something that can hand the decoder a complete container.
pub trait DataFileLoader {
    fn load(&self) -> IResult<Cow<'_, [u8]>>;
}

/// A [`DataFileLoader`] backed by a closure, for bytes that come from
/// somewhere other than a plain file (archives, network, tests).
pub struct DataFileWithCallback<F> {
    callback: F,
}

impl<F> DataFileWithCallback<F>
where
    F: Fn() -> IResult<Vec<u8>>,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> DataFileLoader for DataFileWithCallback<F>
where
    F: Fn() -> IResult<Vec<u8>>,
{
    fn load(&self) -> IResult<Cow<'_, [u8]>> {
        (self.callback)().map(Cow::Owned)
    }
}

impl DataFileLoader for MappedFile {
    fn load(&self) -> IResult<Cow<'_, [u8]>> {
        Ok(Cow::Borrowed(self.as_ref()))
    }
}

fn open_error(err: io::Error) -> ImportError {
    match err.kind() {
        io::ErrorKind::NotFound => ImportError::FileNotFound,
        io::ErrorKind::PermissionDenied => ImportError::UnauthorizedRead,
        io::ErrorKind::ResourceBusy | io::ErrorKind::ExecutableFileBusy => {
            ImportError::FileLocked
        }
        _ => ImportError::UnknownReadError,
    }
}

#[cfg(unix)]
fn has_read_permission(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;

    metadata.permissions().mode() & 0o444 != 0
}

#[cfg(not(unix))]
fn has_read_permission(_metadata: &fs::Metadata) -> bool {
    true
}

/// Open and memory-map a `.kmd` file after the same pre-read checks the
/// decoder's callers have always relied on:
///
/// 1. the path exists
/// 2. it is a regular file ending in exactly `.kmd`
/// 3. someone has read permission on it
/// 4. it can be opened
/// 5. it is neither empty nor outside the supported size range
///
/// Oversized files are rejected before they are mapped.
pub fn open_kmd<P: AsRef<Path>>(path: P) -> IResult<MappedFile> {
    let path = path.as_ref();

    let metadata = fs::metadata(path).map_err(open_error)?;

    if !metadata.is_file() || path.extension() != Some(OsStr::new(KMD_EXTENSION)) {
        return Err(ImportError::InvalidExtension);
    }

    if !has_read_permission(&metadata) {
        return Err(ImportError::UnauthorizedRead);
    }

    let file = File::open(path).map_err(open_error)?;
    let len = file.metadata().map_err(open_error)?.len();

    if len == 0 {
        return Err(ImportError::FileEmpty);
    }
    let len = usize::try_from(len).map_err(|_| ImportError::UnsupportedFileSize)?;
    check_file_size(len)?;

    let mapped = MappedFile::map(&file).map_err(open_error)?;
    debug!(path = %path.display(), len = mapped.len(), "mapped kmd file");

    Ok(mapped)
}

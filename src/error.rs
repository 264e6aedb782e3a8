use std::fmt;

use thiserror::Error;

/// Every way importing a `.kmd` container can fail.
///
/// The first six variants come from the byte source (opening and checking the
/// file); the rest are raised by the decoder itself. Variants carry no payload:
/// the code is the whole diagnostic.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ImportError {
    #[error("file does not exist")]
    FileNotFound = 1,
    #[error("file is not a regular '.kmd' file")]
    InvalidExtension = 2,
    #[error("not authorized to read this file")]
    UnauthorizedRead = 3,
    #[error("file is in use by another process")]
    FileLocked = 4,
    #[error("unknown error while reading file")]
    UnknownReadError = 5,
    #[error("file is empty")]
    FileEmpty = 6,

    #[error("file size is outside the supported range")]
    UnsupportedFileSize = 7,
    #[error("magic must be 'KMD\\0'")]
    InvalidMagic = 8,
    #[error("unsupported kmd version")]
    InvalidVersion = 9,
    #[error("model count is out of range")]
    InvalidModelCount = 10,
    #[error("model position is out of range")]
    InvalidModelPosition = 11,
    #[error("model size is out of range")]
    InvalidModelSize = 12,
    #[error("combined model table size is out of range")]
    InvalidModelTableSize = 13,
    #[error("combined model block size is out of range")]
    InvalidModelBlockSize = 14,
    #[error("file ended sooner than expected")]
    UnexpectedEof = 15,
}

impl ImportError {
    /// Numeric status code of this error. Never 0, which is reserved for success.
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl From<winnow::error::ErrMode<winnow::error::ContextError>> for ImportError {
    fn from(_: winnow::error::ErrMode<winnow::error::ContextError>) -> Self {
        // Every reader works on a region that was bounds-checked up front, so
        // the only way a fixed-width winnow parser fails is by running out of input.
        ImportError::UnexpectedEof
    }
}

pub type IResult<T> = Result<T, ImportError>;

/// Flat outcome of an import, success included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ImportResult {
    Success = 0,
    FileNotFound = 1,
    InvalidExtension = 2,
    UnauthorizedRead = 3,
    FileLocked = 4,
    UnknownReadError = 5,
    FileEmpty = 6,
    UnsupportedFileSize = 7,
    InvalidMagic = 8,
    InvalidVersion = 9,
    InvalidModelCount = 10,
    InvalidModelPosition = 11,
    InvalidModelSize = 12,
    InvalidModelTableSize = 13,
    InvalidModelBlockSize = 14,
    UnexpectedEof = 15,
}

impl ImportResult {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn is_success(self) -> bool {
        self == ImportResult::Success
    }

    /// Look up a result by its numeric code.
    pub fn from_code(code: u8) -> Option<ImportResult> {
        use ImportResult::*;
        let result = match code {
            0 => Success,
            1 => FileNotFound,
            2 => InvalidExtension,
            3 => UnauthorizedRead,
            4 => FileLocked,
            5 => UnknownReadError,
            6 => FileEmpty,
            7 => UnsupportedFileSize,
            8 => InvalidMagic,
            9 => InvalidVersion,
            10 => InvalidModelCount,
            11 => InvalidModelPosition,
            12 => InvalidModelSize,
            13 => InvalidModelTableSize,
            14 => InvalidModelBlockSize,
            15 => UnexpectedEof,
            _ => return None,
        };
        Some(result)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ImportResult::Success => "RESULT_SUCCESS",
            ImportResult::FileNotFound => "RESULT_FILE_NOT_FOUND",
            ImportResult::InvalidExtension => "RESULT_INVALID_EXTENSION",
            ImportResult::UnauthorizedRead => "RESULT_UNAUTHORIZED_READ",
            ImportResult::FileLocked => "RESULT_FILE_LOCKED",
            ImportResult::UnknownReadError => "RESULT_UNKNOWN_READ_ERROR",
            ImportResult::FileEmpty => "RESULT_FILE_EMPTY",
            ImportResult::UnsupportedFileSize => "RESULT_UNSUPPORTED_FILE_SIZE",
            ImportResult::InvalidMagic => "RESULT_INVALID_MAGIC",
            ImportResult::InvalidVersion => "RESULT_INVALID_VERSION",
            ImportResult::InvalidModelCount => "RESULT_INVALID_MODEL_COUNT",
            ImportResult::InvalidModelPosition => "RESULT_INVALID_MODEL_POSITION",
            ImportResult::InvalidModelSize => "RESULT_INVALID_MODEL_SIZE",
            ImportResult::InvalidModelTableSize => "RESULT_INVALID_MODEL_TABLE_SIZE",
            ImportResult::InvalidModelBlockSize => "RESULT_INVALID_MODEL_BLOCK_SIZE",
            ImportResult::UnexpectedEof => "RESULT_UNEXPECTED_EOF",
        }
    }
}

impl From<ImportError> for ImportResult {
    fn from(err: ImportError) -> Self {
        // Both enums share their discriminants.
        ImportResult::from_code(err.code()).unwrap_or(ImportResult::UnknownReadError)
    }
}

impl<T> From<&Result<T, ImportError>> for ImportResult {
    fn from(result: &Result<T, ImportError>) -> Self {
        match result {
            Ok(_) => ImportResult::Success,
            Err(err) => (*err).into(),
        }
    }
}

impl fmt::Display for ImportResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Byte sources and low-level parsing helpers
pub mod data;
/// Error and status code definitions
pub mod error;
/// The KMD container format: header, model table and model blocks
pub mod models;
/// Generic wrapper for values that may or may not match a known variant.
pub mod recognized;

pub use error::{IResult, ImportError, ImportResult};
pub use models::{KmdFile, decode, decode_from, import_kmd};

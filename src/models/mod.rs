/// Per-model blocks: metadata, vertices and indices
pub mod block;
/// The fixed container header
pub mod header;
/// Whole-container decoding
pub mod kmd;
/// The model table locating each block
pub mod table;

#[cfg(test)]
pub(crate) mod fixtures;

pub use block::{DataTypeFlags, ModelBlock, RenderType, Vertex};
pub use header::{ModelHeader, ScaleFactor};
pub use kmd::{KmdFile, decode, decode_from, import_kmd};
pub use table::ModelTable;

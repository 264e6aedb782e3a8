//! Decoder for `.kmd` model containers.
//!
//! A container is laid out as:
//! - an 18-byte header (magic, version, scale factor, model count, region sizes)
//! - a table of 28-byte entries, one per model, pointing at its block
//! - the model blocks themselves, each a 148-byte metadata region followed by
//!   its vertex and index arrays
//!
//! Decoding is all-or-nothing: the first violated constraint aborts the whole
//! decode and nothing parsed up to that point is returned.

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use tracing::{debug, warn};

use crate::data::source::{DataFileLoader, open_kmd};
use crate::error::{IResult, ImportError};
use crate::models::block::{ModelBlock, parse_block};
use crate::models::header::{ModelHeader, parse_header};
use crate::models::table::{ModelTable, parse_tables};

/// A fully decoded and validated container.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct KmdFile {
    pub header: ModelHeader,
    pub tables: Vec<ModelTable>,
    /// One block per table entry, in table order.
    pub blocks: Vec<ModelBlock>,
}

impl KmdFile {
    /// Table entries paired with the blocks they describe.
    pub fn models(&self) -> impl Iterator<Item = (&ModelTable, &ModelBlock)> {
        self.tables.iter().zip(&self.blocks)
    }

    pub fn total_vertices(&self) -> usize {
        self.blocks.iter().map(ModelBlock::vertex_count).sum()
    }

    pub fn total_indices(&self) -> usize {
        self.blocks.iter().map(ModelBlock::index_count).sum()
    }
}

fn decode_stages(file_data: &[u8]) -> IResult<KmdFile> {
    let header = parse_header(file_data)?;
    let tables = parse_tables(file_data, &header)?;

    let blocks = tables
        .iter()
        .map(|table| parse_block(file_data, table))
        .collect::<IResult<Vec<_>>>()?;

    debug!(models = blocks.len(), "decoded kmd container");

    Ok(KmdFile {
        header,
        tables,
        blocks,
    })
}

/// Run `read` with panics mapped to [`ImportError::UnknownReadError`].
fn catch_read_panic<T>(read: impl FnOnce() -> IResult<T>) -> IResult<T> {
    match panic::catch_unwind(AssertUnwindSafe(read)) {
        Ok(result) => result,
        Err(_) => {
            warn!("panic while reading kmd data");
            Err(ImportError::UnknownReadError)
        }
    }
}

/// Decode a complete `.kmd` container held in memory.
///
/// Blocks are parsed strictly in table order and the first failure is
/// returned as-is. A panic while decoding (for example a failed allocation)
/// is reported as [`ImportError::UnknownReadError`] instead of unwinding into
/// the caller.
pub fn decode(file_data: &[u8]) -> IResult<KmdFile> {
    catch_read_panic(|| decode_stages(file_data))
}

/// Load a container from `loader` and decode it.
///
/// Loading sits behind the same panic boundary as decoding, so a loader that
/// panics yields [`ImportError::UnknownReadError`].
pub fn decode_from<L: DataFileLoader + ?Sized>(loader: &L) -> IResult<KmdFile> {
    catch_read_panic(|| {
        let bytes = loader.load()?;
        decode_stages(&bytes)
    })
}

/// Open, check and decode the `.kmd` file at `path`.
pub fn import_kmd<P: AsRef<Path>>(path: P) -> IResult<KmdFile> {
    decode_from(&open_kmd(path)?)
}

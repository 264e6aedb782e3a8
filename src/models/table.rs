//! Model table entries: one fixed 28-byte record per model, locating its block.

use tracing::{debug, warn};
use winnow::Parser;
use winnow::binary::le_u32;
use winnow::combinator::repeat;

use crate::data::parser_utils::{WResult, parse_fixed_name, region};
use crate::error::IResult;
use crate::models::header::{HEADER_SIZE, ModelHeader};

pub const TABLE_ENTRY_SIZE: usize = 28;

/// Width of the NUL-padded node name (19 characters + terminator).
pub const NODE_NAME_SIZE: usize = 20;

/// A parsed model table entry.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ModelTable {
    pub node_name: String,
    /// Absolute offset of the model block from the start of the file.
    pub block_offset: u32,
    /// Size of the model block in bytes.
    pub block_size: u32,
}

impl ModelTable {
    /// End of the block this entry points at, or `None` if it does not fit a `usize`.
    pub fn block_end(&self) -> Option<usize> {
        (self.block_offset as usize).checked_add(self.block_size as usize)
    }
}

fn parse_table_entry(input: &mut &[u8]) -> WResult<ModelTable> {
    let node_name = parse_fixed_name::<NODE_NAME_SIZE>(input)?;
    let block_offset = le_u32.parse_next(input)?;
    let block_size = le_u32.parse_next(input)?;
    Ok(ModelTable {
        node_name,
        block_offset,
        block_size,
    })
}

fn parse_table_entries(input: &mut &[u8], count: usize) -> WResult<Vec<ModelTable>> {
    repeat(count, parse_table_entry).parse_next(input)
}

/// Read every whole table entry in `[18, 18 + model_tables_size)`.
///
/// Block offsets are not checked here; that happens when each block is read.
/// The number of entries is not compared with `model_count`.
pub fn parse_tables(file_data: &[u8], header: &ModelHeader) -> IResult<Vec<ModelTable>> {
    let count = header.table_entry_count();
    let tables_size = header.model_tables_size as usize;

    let remainder = tables_size % TABLE_ENTRY_SIZE;
    if remainder != 0 {
        warn!("model table region has {remainder} trailing bytes, ignoring them");
    }
    if count != header.model_count as usize {
        warn!(
            "header claims {} models but the table holds {count} entries",
            header.model_count
        );
    }

    let input = &mut region(file_data, HEADER_SIZE, count * TABLE_ENTRY_SIZE)?;
    let tables = parse_table_entries(input, count)?;

    debug!("read {} model table entries", tables.len());

    Ok(tables)
}

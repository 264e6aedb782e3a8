//! The fixed 18-byte header at the start of every `.kmd` container.

use tracing::{debug, warn};
use winnow::Parser;
use winnow::binary::{le_u8, le_u32};
use winnow::token::take;

use crate::data::parser_utils::{WResult, region};
use crate::error::{IResult, ImportError};
use crate::models::block::BLOCK_METADATA_SIZE;
use crate::models::table::TABLE_ENTRY_SIZE;

/// `K`, `M`, `D`, `\0`.
pub const KMD_MAGIC: [u8; 4] = *b"KMD\0";

/// The only container version this decoder understands.
pub const KMD_VERSION: u8 = 1;

pub const HEADER_SIZE: usize = 18;

pub const MAX_MODEL_COUNT: u32 = 1024;

/// Largest combined size of all table entries (28 KiB).
pub const MAX_MODEL_TABLE_SIZE: u32 = 28672;

/// Largest combined size of all model blocks (1 GiB).
pub const MAX_MODEL_BLOCK_SIZE: u32 = 1_073_741_824;

/// A header, one table entry and one block without geometry.
pub const MIN_TOTAL_SIZE: usize = HEADER_SIZE + TABLE_ENTRY_SIZE + BLOCK_METADATA_SIZE;

pub const MAX_TOTAL_SIZE: usize =
    HEADER_SIZE + MAX_MODEL_TABLE_SIZE as usize + MAX_MODEL_BLOCK_SIZE as usize;

/// Global model-space downscale multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ScaleFactor {
    #[default]
    One = 0,
    Ten = 1,
    Hundred = 2,
    Thousand = 3,
    TenThousand = 4,
    Tenth = 5,
    Hundredth = 6,
    Thousandth = 7,
    TenThousandth = 8,
}

impl ScaleFactor {
    /// Map a raw header byte to a scale factor. Unused indices (9-255) fall back to `One`.
    pub fn from_index(index: u8) -> ScaleFactor {
        match index {
            1 => ScaleFactor::Ten,
            2 => ScaleFactor::Hundred,
            3 => ScaleFactor::Thousand,
            4 => ScaleFactor::TenThousand,
            5 => ScaleFactor::Tenth,
            6 => ScaleFactor::Hundredth,
            7 => ScaleFactor::Thousandth,
            8 => ScaleFactor::TenThousandth,
            _ => ScaleFactor::One,
        }
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn multiplier(self) -> f32 {
        match self {
            ScaleFactor::One => 1.0,
            ScaleFactor::Ten => 10.0,
            ScaleFactor::Hundred => 100.0,
            ScaleFactor::Thousand => 1000.0,
            ScaleFactor::TenThousand => 10000.0,
            ScaleFactor::Tenth => 0.1,
            ScaleFactor::Hundredth => 0.01,
            ScaleFactor::Thousandth => 0.001,
            ScaleFactor::TenThousandth => 0.0001,
        }
    }
}

/// The validated container header.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ModelHeader {
    pub magic: [u8; 4],
    pub version: u8,
    pub scale_factor: ScaleFactor,
    /// Number of models the writer claims to have stored. Not cross-checked
    /// against the number of table entries.
    pub model_count: u32,
    pub model_tables_size: u32,
    pub model_blocks_size: u32,
}

impl ModelHeader {
    pub fn scale_multiplier(&self) -> f32 {
        self.scale_factor.multiplier()
    }

    /// Number of whole table entries that fit in `model_tables_size`.
    pub fn table_entry_count(&self) -> usize {
        self.model_tables_size as usize / TABLE_ENTRY_SIZE
    }
}

/// Reject buffers that cannot possibly hold a container, before reading anything.
pub fn check_file_size(len: usize) -> IResult<()> {
    if !(MIN_TOTAL_SIZE..=MAX_TOTAL_SIZE).contains(&len) {
        return Err(ImportError::UnsupportedFileSize);
    }
    Ok(())
}

/// Header fields as stored, before validation.
struct HeaderFields<'a> {
    magic: &'a [u8],
    version: u8,
    scale_index: u8,
    model_count: u32,
    model_tables_size: u32,
    model_blocks_size: u32,
}

fn parse_header_fields<'a>(input: &mut &'a [u8]) -> WResult<HeaderFields<'a>> {
    let magic = take(KMD_MAGIC.len()).parse_next(input)?;
    let version = le_u8.parse_next(input)?;
    let scale_index = le_u8.parse_next(input)?;
    let model_count = le_u32.parse_next(input)?;
    let model_tables_size = le_u32.parse_next(input)?;
    let model_blocks_size = le_u32.parse_next(input)?;
    Ok(HeaderFields {
        magic,
        version,
        scale_index,
        model_count,
        model_tables_size,
        model_blocks_size,
    })
}

/// Read and validate the header.
///
/// Fields are checked in file order and the first violation wins, so a file
/// with both a bad version and a bad model count reports `InvalidVersion`.
pub fn parse_header(file_data: &[u8]) -> IResult<ModelHeader> {
    check_file_size(file_data.len())?;

    let input = &mut region(file_data, 0, HEADER_SIZE)?;
    let fields = parse_header_fields(input)?;

    if fields.magic != KMD_MAGIC {
        return Err(ImportError::InvalidMagic);
    }

    if fields.version != KMD_VERSION {
        return Err(ImportError::InvalidVersion);
    }

    let scale_factor = ScaleFactor::from_index(fields.scale_index);
    if scale_factor.index() != fields.scale_index {
        warn!(
            "scale factor index {} is unused, falling back to 1.0",
            fields.scale_index
        );
    }

    if fields.model_count > MAX_MODEL_COUNT {
        return Err(ImportError::InvalidModelCount);
    }

    if !(TABLE_ENTRY_SIZE as u32..=MAX_MODEL_TABLE_SIZE).contains(&fields.model_tables_size) {
        return Err(ImportError::InvalidModelTableSize);
    }

    if !(BLOCK_METADATA_SIZE as u32..=MAX_MODEL_BLOCK_SIZE).contains(&fields.model_blocks_size) {
        return Err(ImportError::InvalidModelBlockSize);
    }

    let header = ModelHeader {
        magic: KMD_MAGIC,
        version: fields.version,
        scale_factor,
        model_count: fields.model_count,
        model_tables_size: fields.model_tables_size,
        model_blocks_size: fields.model_blocks_size,
    };

    debug!(
        version = header.version,
        scale = header.scale_multiplier(),
        model_count = header.model_count,
        model_tables_size = header.model_tables_size,
        model_blocks_size = header.model_blocks_size,
        "accepted kmd header"
    );

    Ok(header)
}

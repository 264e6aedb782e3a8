//! Shared winnow-based parsing utilities used by the header, table and block parsers.

use std::ops::RangeInclusive;

use winnow::Parser;
use winnow::binary::le_f32;
use winnow::error::ContextError;
use winnow::token::take;

use crate::error::{IResult, ImportError};

/// Common result type for winnow parsers.
pub type WResult<T> = Result<T, winnow::error::ErrMode<ContextError>>;

/// Borrow `len` bytes of `file_data` starting at `offset`.
///
/// This is the single bounds check every stage goes through before reading.
/// Offsets come straight from the file, so the end is computed without
/// overflowing and anything past the buffer is `UnexpectedEof`.
pub fn region(file_data: &[u8], offset: usize, len: usize) -> IResult<&[u8]> {
    let end = offset.checked_add(len).ok_or(ImportError::UnexpectedEof)?;
    file_data.get(offset..end).ok_or(ImportError::UnexpectedEof)
}

/// Decode a NUL-padded fixed-width text field.
///
/// Everything from the first NUL on is dropped. Bytes before it are not
/// validated; invalid UTF-8 is replaced for display.
pub fn fixed_str(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// Parse an `N`-byte NUL-padded name.
pub fn parse_fixed_name<const N: usize>(input: &mut &[u8]) -> WResult<String> {
    let raw: &[u8] = take(N).parse_next(input)?;
    Ok(fixed_str(raw))
}

/// Parse three consecutive little-endian f32s.
pub fn parse_vec3(input: &mut &[u8]) -> WResult<[f32; 3]> {
    Ok([
        le_f32.parse_next(input)?,
        le_f32.parse_next(input)?,
        le_f32.parse_next(input)?,
    ])
}

/// Parse four consecutive little-endian f32s.
pub fn parse_vec4(input: &mut &[u8]) -> WResult<[f32; 4]> {
    Ok([
        le_f32.parse_next(input)?,
        le_f32.parse_next(input)?,
        le_f32.parse_next(input)?,
        le_f32.parse_next(input)?,
    ])
}

/// Whether every component lies inside `range`. NaN never does.
pub fn all_within<const N: usize>(values: &[f32; N], range: &RangeInclusive<f32>) -> bool {
    values.iter().all(|v| range.contains(v))
}

/// Shared winnow helpers and the bounds-checked region accessor
pub mod parser_utils;
/// Opening `.kmd` files and other byte sources
pub mod source;
/// Wrappers around the ways file contents are held in memory
pub mod wrappers;

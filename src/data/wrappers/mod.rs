/// Memory-mapped file access
pub mod mmap;

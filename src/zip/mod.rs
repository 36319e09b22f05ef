//! ZIP archive parsing and extraction.
//!
//! Artifact archives arrive as a single downloaded byte buffer, so this
//! module parses and extracts entirely in memory:
//!
//! - [`structures`]: Data structures representing ZIP format elements (EOCD, file headers, etc.)
//! - [`parser`]: Low-level parsing of ZIP structures from the raw buffer
//! - [`extractor`]: Extraction of a whole archive into a directory
//!
//! A ZIP file is read from the end: the End of Central Directory (EOCD)
//! record locates the Central Directory, which carries the metadata for
//! every entry, and each entry's Local File Header locates its data.
//!
//! ## Supported Features
//!
//! - Standard ZIP format (PKZIP APPNOTE 6.3.x compatible)
//! - ZIP64 extensions for archives > 4GB
//! - STORED (no compression) method
//! - DEFLATE compression method
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support
//! - No BZIP2, LZMA, or other compression methods

mod extractor;
mod parser;
mod structures;

pub use extractor::ZipExtractor;
pub use parser::ZipParser;
pub use structures::*;

use thiserror::Error;

/// Errors produced while parsing or extracting an artifact archive
#[derive(Debug, Error)]
pub enum ZipError {
    /// The buffer is not a well-formed ZIP archive
    #[error("invalid archive: {0}")]
    Malformed(String),

    /// Entry uses a compression method other than STORED or DEFLATE
    #[error("unsupported compression method: {0}")]
    UnsupportedCompression(u16),

    /// Entry path would land outside the destination directory
    #[error("archive entry escapes destination: {0}")]
    UnsafeEntryPath(String),

    /// Filesystem error while writing extracted entries
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

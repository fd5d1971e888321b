//! Error taxonomy for grid decoding

use std::io;
use thiserror::Error;

/// Result alias used throughout the decoders
pub type Result<T> = std::result::Result<T, GridError>;

/// Every way a decode call can fail
#[derive(Debug, Error)]
pub enum GridError {
    /// The ZIP container is structurally broken (EOCD, directory or local header)
    #[error("container format error: {0}")]
    ContainerFormat(String),

    #[error("unsupported compression method {0}")]
    UnsupportedCompression(u16),

    #[error("encrypted entry not supported: {0}")]
    EncryptedEntry(String),

    #[error("entry '{name}' is {size} bytes, above the {limit} byte limit")]
    EntryTooLarge { name: String, size: u64, limit: u64 },

    #[error("CRC-32 mismatch for '{name}': expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch {
        name: String,
        expected: u32,
        actual: u32,
    },

    /// An expected archive entry is absent (e.g. no worksheet)
    #[error("missing entry: {0}")]
    MissingEntry(String),

    /// The `.xls` payload is not an HTML document with a table
    #[error("legacy .xls format error: {0}")]
    LegacyFormat(String),

    #[error("unsupported file extension: {0}")]
    UnsupportedExtension(String),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    XmlAttribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("inflate error: {0}")]
    Inflate(#[source] io::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Coarse failure category, for callers that only need to branch on the kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed container: bad signatures, bounds, checksums, payload decoding
    Container,
    /// Compression method or encryption the reader cannot handle
    Compression,
    MissingEntry,
    Legacy,
    /// Problems with the input itself (extension, I/O)
    Input,
}

impl GridError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GridError::ContainerFormat(_)
            | GridError::EntryTooLarge { .. }
            | GridError::ChecksumMismatch { .. }
            | GridError::Xml(_)
            | GridError::XmlAttribute(_)
            | GridError::Inflate(_) => ErrorKind::Container,
            GridError::UnsupportedCompression(_) | GridError::EncryptedEntry(_) => {
                ErrorKind::Compression
            }
            GridError::MissingEntry(_) => ErrorKind::MissingEntry,
            GridError::LegacyFormat(_) => ErrorKind::Legacy,
            GridError::UnsupportedExtension(_) | GridError::Io(_) => ErrorKind::Input,
        }
    }

    pub(crate) fn container(msg: impl Into<String>) -> Self {
        GridError::ContainerFormat(msg.into())
    }
}

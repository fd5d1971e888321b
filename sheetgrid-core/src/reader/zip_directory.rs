//! ZIP central directory reader and entry extractor
//!
//! Only the parts of the ZIP format that OOXML packages use are handled:
//! a single-disk archive, stored or deflated entries, no ZIP64.
//!
//! Workflow: [`find_eocd`] -> [`CentralDirectory::parse`] -> [`ZipContainer::extract`]

use log::{debug, warn};
use std::collections::HashMap;

use super::cursor::ByteCursor;
use super::inflate::Inflate;
use crate::config::ContainerConfig;
use crate::error::{GridError, Result};

pub const EOCD_SIGNATURE: u32 = 0x0605_4b50;
pub const CENTRAL_HEADER_SIGNATURE: u32 = 0x0201_4b50;
pub const LOCAL_HEADER_SIGNATURE: u32 = 0x0403_4b50;

pub const METHOD_STORED: u16 = 0;
pub const METHOD_DEFLATE: u16 = 8;

const EOCD_LEN: usize = 22;
const MAX_COMMENT_LEN: usize = 0xFFFF;
const LOCAL_HEADER_LEN: usize = 30;

const FLAG_ENCRYPTED: u16 = 0x0001;

/// The End-Of-Central-Directory record fields the reader consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndOfCentralDirectory {
    /// Byte offset of the record's signature in the buffer
    pub position: usize,
    pub total_entries: u16,
    pub directory_size: u32,
    pub directory_offset: u32,
}

/// Locate the EOCD record by scanning backward from the end of the buffer.
///
/// The scan covers at most the last 64KB + 22 bytes, the largest span a
/// trailing archive comment can push the record back by.
pub fn find_eocd(data: &[u8]) -> Result<EndOfCentralDirectory> {
    if data.len() < EOCD_LEN {
        return Err(GridError::container("EOCD not found"));
    }

    let start = data.len() - EOCD_LEN;
    let floor = start.saturating_sub(MAX_COMMENT_LEN);
    let signature = EOCD_SIGNATURE.to_le_bytes();

    let position = (floor..=start)
        .rev()
        .find(|&pos| data[pos..pos + 4] == signature)
        .ok_or_else(|| GridError::container("EOCD not found"))?;

    let mut cursor = ByteCursor::window(data, position, EOCD_LEN, "EOCD record")?;
    cursor.skip(4)?; // signature
    cursor.skip(2)?; // number of this disk
    cursor.skip(2)?; // disk where central directory starts
    cursor.skip(2)?; // entries on this disk
    let total_entries = cursor.read_u16()?;
    let directory_size = cursor.read_u32()?;
    let directory_offset = cursor.read_u32()?;

    Ok(EndOfCentralDirectory {
        position,
        total_entries,
        directory_size,
        directory_offset,
    })
}

/// One central directory file header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: String,
    pub flags: u16,
    pub compression_method: u16,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub local_header_offset: u32,
}

impl DirectoryEntry {
    pub fn is_encrypted(&self) -> bool {
        self.flags & FLAG_ENCRYPTED != 0
    }

    pub fn is_dir(&self) -> bool {
        self.name.ends_with('/')
    }

    fn read(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        cursor.skip(4)?; // signature, checked by the caller
        cursor.skip(2)?; // version made by
        cursor.skip(2)?; // version needed
        let flags = cursor.read_u16()?;
        let compression_method = cursor.read_u16()?;
        cursor.skip(4)?; // modification time and date
        let crc32 = cursor.read_u32()?;
        let compressed_size = cursor.read_u32()?;
        let uncompressed_size = cursor.read_u32()?;
        let name_len = cursor.read_u16()? as usize;
        let extra_len = cursor.read_u16()? as usize;
        let comment_len = cursor.read_u16()? as usize;
        cursor.skip(8)?; // disk start, internal and external attributes
        let local_header_offset = cursor.read_u32()?;
        let name = String::from_utf8_lossy(cursor.read_bytes(name_len)?).into_owned();
        cursor.skip(extra_len)?;
        cursor.skip(comment_len)?;

        Ok(Self {
            name,
            flags,
            compression_method,
            crc32,
            compressed_size,
            uncompressed_size,
            local_header_offset,
        })
    }
}

/// Parsed central directory: entries in archive order plus a name index
#[derive(Debug, Clone, Default)]
pub struct CentralDirectory {
    entries: Vec<DirectoryEntry>,
    index: HashMap<String, usize>,
}

impl CentralDirectory {
    /// Walk the central directory declared by the EOCD record.
    ///
    /// The walk stops at the first header whose signature does not match.
    /// With `strict` set, that early stop (or any shortfall against the
    /// EOCD's entry count) is an error instead.
    pub fn parse(data: &[u8], strict: bool) -> Result<Self> {
        let eocd = find_eocd(data)?;
        let mut cursor = ByteCursor::window(
            &data[..eocd.position],
            eocd.directory_offset as usize,
            eocd.directory_size as usize,
            "central directory",
        )?;

        let mut directory = CentralDirectory::default();
        while !cursor.is_empty() {
            if cursor.peek_u32() != Some(CENTRAL_HEADER_SIGNATURE) {
                if strict {
                    return Err(GridError::container(format!(
                        "invalid central directory header at offset {}",
                        eocd.directory_offset as usize + cursor.position()
                    )));
                }
                warn!(
                    "Central directory walk stopped after {} entries: signature mismatch at offset {}",
                    directory.entries.len(),
                    eocd.directory_offset as usize + cursor.position()
                );
                break;
            }
            let entry = DirectoryEntry::read(&mut cursor)?;
            directory.insert(entry);
        }

        if strict && directory.entries.len() != eocd.total_entries as usize {
            return Err(GridError::container(format!(
                "central directory holds {} entries, EOCD declares {}",
                directory.entries.len(),
                eocd.total_entries
            )));
        }

        debug!(
            "Central directory: {} entries at offset {}",
            directory.entries.len(),
            eocd.directory_offset
        );
        Ok(directory)
    }

    fn insert(&mut self, entry: DirectoryEntry) {
        // Duplicate names resolve to the last header
        self.index.insert(entry.name.clone(), self.entries.len());
        self.entries.push(entry);
    }

    /// Look up an entry by name, ignoring a leading `/`
    pub fn get(&self, name: &str) -> Option<&DirectoryEntry> {
        let name = name.strip_prefix('/').unwrap_or(name);
        self.index.get(name).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Entry names in central directory order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A ZIP buffer together with its parsed directory
#[derive(Debug)]
pub struct ZipContainer<'a> {
    data: &'a [u8],
    directory: CentralDirectory,
}

impl<'a> ZipContainer<'a> {
    pub fn open(data: &'a [u8], config: &ContainerConfig) -> Result<Self> {
        let directory = CentralDirectory::parse(data, config.strict_directory)?;
        Ok(Self { data, directory })
    }

    pub fn directory(&self) -> &CentralDirectory {
        &self.directory
    }

    /// Extract and decompress one entry; `Ok(None)` when the name is absent
    pub fn extract<I: Inflate>(
        &self,
        name: &str,
        inflater: &I,
        config: &ContainerConfig,
    ) -> Result<Option<Vec<u8>>> {
        let Some(entry) = self.directory.get(name) else {
            return Ok(None);
        };

        if entry.is_encrypted() {
            return Err(GridError::EncryptedEntry(entry.name.clone()));
        }
        if entry.uncompressed_size as u64 > config.max_entry_size {
            return Err(GridError::EntryTooLarge {
                name: entry.name.clone(),
                size: entry.uncompressed_size as u64,
                limit: config.max_entry_size,
            });
        }

        let offset = entry.local_header_offset as usize;
        let mut header = ByteCursor::window(self.data, offset, LOCAL_HEADER_LEN, "local header")?;
        if header.read_u32()? != LOCAL_HEADER_SIGNATURE {
            return Err(GridError::container("invalid local header"));
        }
        header.skip(22)?; // version, flags, method, time, date, crc, sizes
        let name_len = header.read_u16()? as usize;
        let extra_len = header.read_u16()? as usize;

        // The local name/extra lengths may differ from the central directory copy
        let data_start = offset + LOCAL_HEADER_LEN + name_len + extra_len;
        let compressed_size = entry.compressed_size as usize;
        let mut body = ByteCursor::window(self.data, data_start, compressed_size, "entry data")?;
        let raw = body.read_bytes(compressed_size)?;

        let limit = usize::try_from(config.max_entry_size).unwrap_or(usize::MAX);
        let bytes = match entry.compression_method {
            METHOD_STORED => raw.to_vec(),
            METHOD_DEFLATE => inflater
                .inflate_raw(raw, entry.uncompressed_size as usize, limit)
                .map_err(GridError::Inflate)?,
            method => return Err(GridError::UnsupportedCompression(method)),
        };

        if bytes.len() as u64 > config.max_entry_size {
            return Err(GridError::EntryTooLarge {
                name: entry.name.clone(),
                size: bytes.len() as u64,
                limit: config.max_entry_size,
            });
        }

        if config.verify_crc {
            let actual = crc32fast::hash(&bytes);
            if actual != entry.crc32 {
                return Err(GridError::ChecksumMismatch {
                    name: entry.name.clone(),
                    expected: entry.crc32,
                    actual,
                });
            }
        }

        debug!(
            "Extracted '{}': {} -> {} bytes (method {})",
            entry.name,
            raw.len(),
            bytes.len(),
            entry.compression_method
        );
        Ok(Some(bytes))
    }
}

//! Minimal stored-mode (uncompressed) ZIP writer.
//!
//! Layout, little-endian throughout:
//! - per entry: 30-byte local file header, UTF-8 name, raw bytes
//! - per entry: 46-byte central directory record, UTF-8 name
//! - one 22-byte end-of-central-directory record
//!
//! No ZIP64, no data descriptors, no extra fields. Non-ASCII names set the
//! UTF-8 name flag. Entries are written in insertion order.

mod crc32;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error_handling::ArchiveError;

pub use crc32::crc32;

const LOCAL_HEADER_SIGNATURE: u32 = 0x0403_4b50;
const CENTRAL_HEADER_SIGNATURE: u32 = 0x0201_4b50;
const END_OF_CENTRAL_DIR_SIGNATURE: u32 = 0x0605_4b50;

const LOCAL_HEADER_LEN: usize = 30;
const CENTRAL_HEADER_LEN: usize = 46;
const END_OF_CENTRAL_DIR_LEN: usize = 22;

/// Version needed to extract: 1.0, plain stored files
const VERSION_NEEDED: u16 = 10;
/// Version made by: 2.0, MS-DOS attribute compatibility
const VERSION_MADE_BY: u16 = 20;
const METHOD_STORED: u16 = 0;
/// General purpose bit 11: the entry name is UTF-8
const FLAG_UTF8_NAME: u16 = 0x0800;

/// A named blob of bytes to place in the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipEntry {
    pub name: String,
    pub data: Bytes,
}

impl ZipEntry {
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }
}

struct CentralRecord<'a> {
    name: &'a [u8],
    flags: u16,
    crc: u32,
    size: u32,
    offset: u32,
}

/// Builds a complete stored-mode ZIP archive from `entries`.
///
/// # Errors
///
/// Returns an `ArchiveError` when the input exceeds the limits of the
/// non-ZIP64 format (65535 entries, 65535-byte names, 4 GiB offsets).
pub fn build_zip(entries: &[ZipEntry]) -> Result<Bytes, ArchiveError> {
    if entries.len() > u16::MAX as usize {
        return Err(ArchiveError::TooManyEntries(entries.len()));
    }

    let payload: usize = entries
        .iter()
        .map(|e| LOCAL_HEADER_LEN + CENTRAL_HEADER_LEN + 2 * e.name.len() + e.data.len())
        .sum();
    let mut out = BytesMut::with_capacity(payload + END_OF_CENTRAL_DIR_LEN);
    let mut records = Vec::with_capacity(entries.len());

    for entry in entries {
        let name = entry.name.as_bytes();
        let name_len = u16::try_from(name.len()).map_err(|_| ArchiveError::NameTooLong(name.len()))?;
        let size = u32::try_from(entry.data.len())
            .map_err(|_| ArchiveError::TooLarge(entry.name.clone()))?;
        let offset =
            u32::try_from(out.len()).map_err(|_| ArchiveError::TooLarge(entry.name.clone()))?;
        let crc = crc32(&entry.data);
        let flags = if entry.name.is_ascii() { 0 } else { FLAG_UTF8_NAME };

        out.put_u32_le(LOCAL_HEADER_SIGNATURE);
        out.put_u16_le(VERSION_NEEDED);
        out.put_u16_le(flags);
        out.put_u16_le(METHOD_STORED);
        out.put_u16_le(0); // mod time
        out.put_u16_le(0); // mod date
        out.put_u32_le(crc);
        out.put_u32_le(size); // compressed
        out.put_u32_le(size); // uncompressed
        out.put_u16_le(name_len);
        out.put_u16_le(0); // extra field length
        out.put_slice(name);
        out.put_slice(&entry.data);

        records.push(CentralRecord {
            name,
            flags,
            crc,
            size,
            offset,
        });
    }

    let central_start = u32::try_from(out.len())
        .map_err(|_| ArchiveError::TooLarge("central directory offset".to_string()))?;

    for record in &records {
        out.put_u32_le(CENTRAL_HEADER_SIGNATURE);
        out.put_u16_le(VERSION_MADE_BY);
        out.put_u16_le(VERSION_NEEDED);
        out.put_u16_le(record.flags);
        out.put_u16_le(METHOD_STORED);
        out.put_u16_le(0); // mod time
        out.put_u16_le(0); // mod date
        out.put_u32_le(record.crc);
        out.put_u32_le(record.size);
        out.put_u32_le(record.size);
        out.put_u16_le(record.name.len() as u16);
        out.put_u16_le(0); // extra field length
        out.put_u16_le(0); // comment length
        out.put_u16_le(0); // disk number start
        out.put_u16_le(0); // internal attributes
        out.put_u32_le(0); // external attributes
        out.put_u32_le(record.offset);
        out.put_slice(record.name);
    }

    let central_size = u32::try_from(out.len() - central_start as usize)
        .map_err(|_| ArchiveError::TooLarge("central directory size".to_string()))?;
    let count = records.len() as u16;

    out.put_u32_le(END_OF_CENTRAL_DIR_SIGNATURE);
    out.put_u16_le(0); // this disk
    out.put_u16_le(0); // disk with central directory
    out.put_u16_le(count); // entries on this disk
    out.put_u16_le(count); // entries total
    out.put_u32_le(central_size);
    out.put_u32_le(central_start);
    out.put_u16_le(0); // comment length

    Ok(out.freeze())
}

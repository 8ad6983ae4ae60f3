// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Store-only ZIP writer
//!
//! ```text
//! foreach entry
//!     local file header (30 bytes + name)
//!     raw data
//! end
//! foreach entry
//!     central directory header (46 bytes + name)
//! end
//! end of central directory record (22 bytes)
//! ```
//!
//! Entries are never compressed. Timestamps are fixed at 1980-01-01 00:00 so
//! identical input gives identical bytes.

use crate::error::{Error, Result};
use std::io::Write;

const LOCAL_HEADER_SIGNATURE: u32 = 0x0403_4b50;
const CENTRAL_HEADER_SIGNATURE: u32 = 0x0201_4b50;
const END_OF_CENTRAL_DIRECTORY_SIGNATURE: u32 = 0x0605_4b50;

/// ZIP 2.0: the minimum for plain stored files
const VERSION: u16 = 20;
const METHOD_STORED: u16 = 0;
const DOS_TIME: u16 = 0;
/// 1980-01-01 in DOS date format: (year-1980) << 9 | month << 5 | day
const DOS_DATE: u16 = (1 << 5) | 1;

pub const LOCAL_HEADER_LEN: usize = 30;
pub const CENTRAL_HEADER_LEN: usize = 46;
pub const END_RECORD_LEN: usize = 22;

const CRC_TABLE: [u32; 256] = build_crc_table();

const fn build_crc_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut n = 0;
    while n < 256 {
        let mut c = n as u32;
        let mut k = 0;
        while k < 8 {
            c = if c & 1 != 0 {
                0xEDB8_8320 ^ (c >> 1)
            } else {
                c >> 1
            };
            k += 1;
        }
        table[n] = c;
        n += 1;
    }
    table
}

/// CRC-32 (reflected polynomial 0xEDB88320, initial and final XOR all ones)
pub fn crc32(data: &[u8]) -> u32 {
    !data.iter().fold(u32::MAX, |crc, &byte| {
        CRC_TABLE[((crc ^ u32::from(byte)) & 0xFF) as usize] ^ (crc >> 8)
    })
}

#[derive(Debug, Clone)]
struct CentralEntry {
    name: String,
    crc: u32,
    size: u32,
    offset: u32,
}

/// Builds a store-only archive in memory
#[derive(Debug, Default)]
pub struct ArchiveWriter {
    buffer: Vec<u8>,
    entries: Vec<CentralEntry>,
}

impl ArchiveWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Append one stored entry
    pub fn add_entry(&mut self, name: &str, data: &[u8]) -> Result<()> {
        if self.entries.len() >= usize::from(u16::MAX) {
            return Err(Error::TooManyEntries {
                max: usize::from(u16::MAX),
            });
        }
        let too_large = || Error::EntryTooLarge {
            name: name.to_string(),
            size: data.len(),
        };
        let size = u32::try_from(data.len()).map_err(|_| too_large())?;
        let name_len = u16::try_from(name.len()).map_err(|_| too_large())?;
        let offset = u32::try_from(self.buffer.len()).map_err(|_| too_large())?;
        let crc = crc32(data);

        let out = &mut self.buffer;
        out.write_all(&LOCAL_HEADER_SIGNATURE.to_le_bytes())?;
        out.write_all(&VERSION.to_le_bytes())?;
        out.write_all(&0u16.to_le_bytes())?; // flags
        out.write_all(&METHOD_STORED.to_le_bytes())?;
        out.write_all(&DOS_TIME.to_le_bytes())?;
        out.write_all(&DOS_DATE.to_le_bytes())?;
        out.write_all(&crc.to_le_bytes())?;
        out.write_all(&size.to_le_bytes())?; // compressed
        out.write_all(&size.to_le_bytes())?; // uncompressed
        out.write_all(&name_len.to_le_bytes())?;
        out.write_all(&0u16.to_le_bytes())?; // extra field length
        out.write_all(name.as_bytes())?;
        out.write_all(data)?;

        self.entries.push(CentralEntry {
            name: name.to_string(),
            crc,
            size,
            offset,
        });
        Ok(())
    }

    /// Write the central directory and end record, returning the archive
    pub fn finish(mut self) -> Result<Vec<u8>> {
        let directory_offset = u32::try_from(self.buffer.len()).map_err(|_| Error::EntryTooLarge {
            name: "central directory".to_string(),
            size: self.buffer.len(),
        })?;

        let out = &mut self.buffer;
        for entry in &self.entries {
            out.write_all(&CENTRAL_HEADER_SIGNATURE.to_le_bytes())?;
            out.write_all(&VERSION.to_le_bytes())?; // made by
            out.write_all(&VERSION.to_le_bytes())?; // needed
            out.write_all(&0u16.to_le_bytes())?; // flags
            out.write_all(&METHOD_STORED.to_le_bytes())?;
            out.write_all(&DOS_TIME.to_le_bytes())?;
            out.write_all(&DOS_DATE.to_le_bytes())?;
            out.write_all(&entry.crc.to_le_bytes())?;
            out.write_all(&entry.size.to_le_bytes())?;
            out.write_all(&entry.size.to_le_bytes())?;
            // Length already checked in add_entry
            out.write_all(&(entry.name.len() as u16).to_le_bytes())?;
            out.write_all(&0u16.to_le_bytes())?; // extra field length
            out.write_all(&0u16.to_le_bytes())?; // comment length
            out.write_all(&0u16.to_le_bytes())?; // disk number
            out.write_all(&0u16.to_le_bytes())?; // internal attributes
            out.write_all(&0u32.to_le_bytes())?; // external attributes
            out.write_all(&entry.offset.to_le_bytes())?;
            out.write_all(entry.name.as_bytes())?;
        }

        let directory_size = out.len() - directory_offset as usize;
        let directory_size = u32::try_from(directory_size).map_err(|_| Error::EntryTooLarge {
            name: "central directory".to_string(),
            size: directory_size,
        })?;
        let count = self.entries.len() as u16;

        out.write_all(&END_OF_CENTRAL_DIRECTORY_SIGNATURE.to_le_bytes())?;
        out.write_all(&0u16.to_le_bytes())?; // this disk
        out.write_all(&0u16.to_le_bytes())?; // disk with directory
        out.write_all(&count.to_le_bytes())?; // entries on this disk
        out.write_all(&count.to_le_bytes())?; // entries total
        out.write_all(&directory_size.to_le_bytes())?;
        out.write_all(&directory_offset.to_le_bytes())?;
        out.write_all(&0u16.to_le_bytes())?; // comment length

        tracing::trace!(
            entries = self.entries.len(),
            bytes = self.buffer.len(),
            "archive written"
        );
        Ok(self.buffer)
    }
}

/// Bundle `(name, data)` pairs into a store-only archive
pub fn write_archive<'a, I>(entries: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = (&'a str, &'a [u8])>,
{
    let mut writer = ArchiveWriter::new();
    for (name, data) in entries {
        writer.add_entry(name, data)?;
    }
    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u16_at(buf: &[u8], at: usize) -> u16 {
        u16::from_le_bytes([buf[at], buf[at + 1]])
    }

    fn u32_at(buf: &[u8], at: usize) -> u32 {
        u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
    }

    #[test]
    fn test_crc32_known_values() {
        assert_eq!(crc32(b""), 0);
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
        assert_eq!(crc32(b"The quick brown fox jumps over the lazy dog"), 0x414F_A339);
    }

    #[test]
    fn test_empty_archive_is_bare_end_record() {
        let bytes = ArchiveWriter::new().finish().unwrap();
        assert_eq!(bytes.len(), END_RECORD_LEN);
        assert_eq!(u32_at(&bytes, 0), END_OF_CENTRAL_DIRECTORY_SIGNATURE);
        assert_eq!(u16_at(&bytes, 10), 0);
    }

    #[test]
    fn test_single_entry_layout() {
        let bytes = write_archive([("a.txt", &b"hello"[..])]).unwrap();

        assert_eq!(u32_at(&bytes, 0), LOCAL_HEADER_SIGNATURE);
        assert_eq!(u16_at(&bytes, 4), 20);
        assert_eq!(u16_at(&bytes, 8), 0);
        assert_eq!(u16_at(&bytes, 12), DOS_DATE);
        assert_eq!(u32_at(&bytes, 14), crc32(b"hello"));
        assert_eq!(u32_at(&bytes, 18), 5);
        assert_eq!(u32_at(&bytes, 22), 5);
        assert_eq!(u16_at(&bytes, 26), 5);
        assert_eq!(&bytes[30..35], b"a.txt");
        assert_eq!(&bytes[35..40], b"hello");

        let central = 40;
        assert_eq!(u32_at(&bytes, central), CENTRAL_HEADER_SIGNATURE);
        assert_eq!(u32_at(&bytes, central + 42), 0);

        let end = central + CENTRAL_HEADER_LEN + 5;
        assert_eq!(bytes.len(), end + END_RECORD_LEN);
        assert_eq!(u32_at(&bytes, end + 12), (CENTRAL_HEADER_LEN + 5) as u32);
        assert_eq!(u32_at(&bytes, end + 16), central as u32);
    }

    #[test]
    fn test_output_is_deterministic() {
        let a = write_archive([("x", &b"1"[..]), ("y", &b"22"[..])]).unwrap();
        let b = write_archive([("x", &b"1"[..]), ("y", &b"22"[..])]).unwrap();
        assert_eq!(a, b);
    }
}

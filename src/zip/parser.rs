//! Low-level ZIP archive parser.
//!
//! This module handles the binary parsing of ZIP structures out of a fully
//! downloaded archive buffer.
//!
//! ## Parsing Strategy
//!
//! ZIP files are designed to be read from the end:
//! 1. Find the End of Central Directory (EOCD) at the buffer's end
//! 2. If ZIP64, read the ZIP64 EOCD for large archive support
//! 3. Read the Central Directory to get metadata for all entries
//! 4. For each entry, read its Local File Header to locate the data

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};

use flate2::read::DeflateDecoder;

use super::ZipError;
use super::structures::*;

/// Maximum ZIP comment size allowed by the format (65535 bytes).
///
/// This limits the search area when looking for EOCD with a comment.
const MAX_COMMENT_SIZE: usize = 65535;

/// Low-level ZIP parser over an in-memory archive.
///
/// Typically used through [`ZipExtractor`](super::ZipExtractor) rather
/// than directly.
pub struct ZipParser<'a> {
    data: &'a [u8],
}

impl<'a> ZipParser<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Bounds-checked slice of the archive buffer.
    fn read_at(&self, offset: u64, len: usize) -> Result<&'a [u8], ZipError> {
        let start = usize::try_from(offset)
            .map_err(|_| ZipError::Malformed("offset out of range".into()))?;
        let end = start
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| ZipError::Malformed("truncated archive".into()))?;
        Ok(&self.data[start..end])
    }

    /// Find and parse the End of Central Directory record.
    ///
    /// The EOCD sits at the end of the archive. The common case of a
    /// zero-length comment is checked first; otherwise the record is
    /// searched for backwards through the maximum comment span.
    ///
    /// Returns the EOCD record and its offset in the buffer.
    pub fn find_eocd(&self) -> Result<(EndOfCentralDirectory, u64), ZipError> {
        let size = self.data.len();

        // Common case: no archive comment, EOCD occupies the last 22 bytes.
        if size >= EndOfCentralDirectory::SIZE {
            let offset = size - EndOfCentralDirectory::SIZE;
            let buf = &self.data[offset..];
            if &buf[0..4] == EndOfCentralDirectory::SIGNATURE && &buf[20..22] == b"\x00\x00" {
                let eocd = EndOfCentralDirectory::from_bytes(buf)?;
                return Ok((eocd, offset as u64));
            }
        }

        // A comment pushes the EOCD away from the end. Search backwards,
        // accepting a candidate only if its comment length field accounts
        // for every byte that follows the record.
        let search_size = (MAX_COMMENT_SIZE + EndOfCentralDirectory::SIZE).min(size);
        let search_start = size - search_size;
        let buf = &self.data[search_start..];

        for i in (0..buf.len().saturating_sub(EndOfCentralDirectory::SIZE)).rev() {
            if &buf[i..i + 4] == EndOfCentralDirectory::SIGNATURE {
                let comment_len = u16::from_le_bytes([buf[i + 20], buf[i + 21]]) as usize;

                if comment_len == buf.len() - i - EndOfCentralDirectory::SIZE {
                    let eocd = EndOfCentralDirectory::from_bytes(
                        &buf[i..i + EndOfCentralDirectory::SIZE],
                    )?;
                    return Ok((eocd, (search_start + i) as u64));
                }
            }
        }

        Err(ZipError::Malformed("not a valid ZIP file".into()))
    }

    /// Read the ZIP64 End of Central Directory record.
    ///
    /// Called when the regular EOCD indicates ZIP64 extensions are needed
    /// (fields saturated to 0xFFFF or 0xFFFFFFFF). The ZIP64 EOCD Locator
    /// sits immediately before the regular EOCD and points at the record.
    fn read_zip64_eocd(&self, eocd_offset: u64) -> Result<Zip64EOCD, ZipError> {
        let locator_offset = eocd_offset
            .checked_sub(Zip64EOCDLocator::SIZE as u64)
            .ok_or_else(|| ZipError::Malformed("missing ZIP64 locator".into()))?;
        let locator =
            Zip64EOCDLocator::from_bytes(self.read_at(locator_offset, Zip64EOCDLocator::SIZE)?)?;

        Zip64EOCD::from_bytes(self.read_at(locator.eocd64_offset, Zip64EOCD::MIN_SIZE)?)
    }

    /// List all entries in the archive, in central directory order.
    pub fn entries(&self) -> Result<Vec<ZipEntry>, ZipError> {
        let (eocd, eocd_offset) = self.find_eocd()?;

        let (cd_offset, cd_size, total_entries) = if eocd.is_zip64() {
            let eocd64 = self.read_zip64_eocd(eocd_offset)?;
            (eocd64.cd_offset, eocd64.cd_size, eocd64.total_entries)
        } else {
            (
                eocd.cd_offset as u64,
                eocd.cd_size as u64,
                eocd.total_entries as u64,
            )
        };

        let cd_data = self.read_at(cd_offset, cd_size as usize)?;

        let mut entries = Vec::with_capacity(total_entries as usize);
        let mut cursor = Cursor::new(cd_data);

        for _ in 0..total_entries {
            entries.push(Self::parse_cdfh(&mut cursor)?);
        }

        Ok(entries)
    }

    /// Parse one Central Directory File Header.
    fn parse_cdfh(cursor: &mut Cursor<&[u8]>) -> Result<ZipEntry, ZipError> {
        let mut sig = [0u8; 4];
        cursor.read_exact(&mut sig)?;
        if sig != CDFH_SIGNATURE {
            return Err(ZipError::Malformed(
                "invalid Central Directory File Header".into(),
            ));
        }

        let _version_made_by = cursor.read_u16::<LittleEndian>()?;
        let _version_needed = cursor.read_u16::<LittleEndian>()?;
        let _flags = cursor.read_u16::<LittleEndian>()?;
        let compression_method = cursor.read_u16::<LittleEndian>()?;
        let _last_mod_time = cursor.read_u16::<LittleEndian>()?;
        let _last_mod_date = cursor.read_u16::<LittleEndian>()?;
        let _crc32 = cursor.read_u32::<LittleEndian>()?;
        let mut compressed_size = cursor.read_u32::<LittleEndian>()? as u64;
        let mut uncompressed_size = cursor.read_u32::<LittleEndian>()? as u64;
        let file_name_length = cursor.read_u16::<LittleEndian>()?;
        let extra_field_length = cursor.read_u16::<LittleEndian>()?;
        let file_comment_length = cursor.read_u16::<LittleEndian>()?;
        let _disk_number_start = cursor.read_u16::<LittleEndian>()?;
        let _internal_attrs = cursor.read_u16::<LittleEndian>()?;
        let _external_attrs = cursor.read_u32::<LittleEndian>()?;
        let mut lfh_offset = cursor.read_u32::<LittleEndian>()? as u64;

        let mut file_name_bytes = vec![0u8; file_name_length as usize];
        cursor.read_exact(&mut file_name_bytes)?;
        // Lossy conversion keeps non-UTF8 names from aborting the run
        let file_name = String::from_utf8_lossy(&file_name_bytes).to_string();

        // Directory entries end with '/'
        let is_directory = file_name.ends_with('/');

        // ZIP64 extended information lives in extra field 0x0001; a field
        // is present there only when the 32-bit header value is saturated.
        let extra_field_end = cursor.position() + extra_field_length as u64;

        while cursor.position() + 4 <= extra_field_end {
            let header_id = cursor.read_u16::<LittleEndian>()?;
            let field_size = cursor.read_u16::<LittleEndian>()?;

            if header_id == 0x0001 {
                if uncompressed_size == 0xFFFFFFFF && cursor.position() + 8 <= extra_field_end {
                    uncompressed_size = cursor.read_u64::<LittleEndian>()?;
                }
                if compressed_size == 0xFFFFFFFF && cursor.position() + 8 <= extra_field_end {
                    compressed_size = cursor.read_u64::<LittleEndian>()?;
                }
                if lfh_offset == 0xFFFFFFFF && cursor.position() + 8 <= extra_field_end {
                    lfh_offset = cursor.read_u64::<LittleEndian>()?;
                }
                // Skip any remaining ZIP64 fields (disk number start)
                let remaining = extra_field_end.saturating_sub(cursor.position());
                cursor.set_position(cursor.position() + remaining);
            } else {
                cursor.set_position(cursor.position() + field_size as u64);
            }
        }

        cursor.set_position(extra_field_end);

        // Skip over the file comment (unused)
        cursor.set_position(cursor.position() + file_comment_length as u64);

        Ok(ZipEntry {
            file_name,
            compression_method: CompressionMethod::from_u16(compression_method),
            compressed_size,
            uncompressed_size,
            lfh_offset,
            is_directory,
        })
    }

    /// Decompressed content of one entry.
    ///
    /// The Local File Header repeats the variable-length name and extra
    /// fields, so the data offset has to be computed from the LFH rather
    /// than the central directory entry.
    pub fn entry_data(&self, entry: &ZipEntry) -> Result<Vec<u8>, ZipError> {
        let lfh = self.read_at(entry.lfh_offset, LFH_SIZE)?;
        if &lfh[0..4] != LFH_SIGNATURE {
            return Err(ZipError::Malformed("invalid Local File Header".into()));
        }

        let file_name_length = u16::from_le_bytes([lfh[26], lfh[27]]) as u64;
        let extra_field_length = u16::from_le_bytes([lfh[28], lfh[29]]) as u64;

        let data_offset = entry.lfh_offset + LFH_SIZE as u64 + file_name_length + extra_field_length;
        let compressed = self.read_at(data_offset, entry.compressed_size as usize)?;

        let data = match entry.compression_method {
            CompressionMethod::Stored => compressed.to_vec(),
            CompressionMethod::Deflate => {
                let mut out = Vec::with_capacity(entry.uncompressed_size as usize);
                DeflateDecoder::new(compressed).read_to_end(&mut out)?;
                out
            }
            CompressionMethod::Unknown(method) => {
                return Err(ZipError::UnsupportedCompression(method));
            }
        };

        if data.len() as u64 != entry.uncompressed_size {
            return Err(ZipError::Malformed(format!(
                "entry {} inflated to {} bytes, expected {}",
                entry.file_name,
                data.len(),
                entry.uncompressed_size
            )));
        }

        Ok(data)
    }
}

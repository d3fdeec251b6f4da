//! Outer VROMFS container parsing: header, obfuscation, decompression,
//! digest verification, and the inner directory table.

use md5::{Digest, Md5};
use vromfs_cursor::ByteCursor;

use crate::error::{Result, VromfsError};
use crate::format::{
    Packing, INNER_HEADER_HAS_DIGEST, INNER_HEADER_NO_DIGEST, MAGIC_VRFS, MAGIC_VRFX,
    SPECIAL_DICT_SUFFIX, SPECIAL_NAME_MAP, SPECIAL_VERSION,
};
use crate::obfuscate::deobfuscate;

/// Options controlling how a [`VromfsReader`] opens a container.
#[derive(Debug, Clone)]
pub struct VromfsReaderOptions {
    /// Verify the MD5 digest over the decompressed inner image when present.
    pub verify_digest: bool,
}

impl Default for VromfsReaderOptions {
    fn default() -> Self {
        Self {
            verify_digest: true,
        }
    }
}

/// A single user-visible entry inside a VROMFS container.
///
/// Borrows the decoded bytes directly out of the owning [`VromfsReader`];
/// it cannot outlive the reader that produced it.
#[derive(Debug, Clone)]
pub struct VromfsFile<'a> {
    path_components: Vec<String>,
    offset: u32,
    size: u32,
    reader: &'a VromfsReader,
}

impl<'a> VromfsFile<'a> {
    pub fn path_components(&self) -> &[String] {
        &self.path_components
    }

    pub fn full_path(&self) -> String {
        self.path_components.join("/")
    }

    pub fn file_name(&self) -> &str {
        self.path_components.last().map(String::as_str).unwrap_or("")
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// The file's byte offset inside the container's inner image.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// The file's raw bytes, borrowed from the container's inner image.
    pub fn data(&self) -> &'a [u8] {
        let start = self.offset as usize;
        let end = start + self.size as usize;
        &self.reader.inner_image[start..end]
    }
}

/// A decompressed, index-parsed VROMFS container.
pub struct VromfsReader {
    inner_image: Vec<u8>,
    name_map: Option<Vec<Vec<u8>>>,
    zstd_dict: Option<Vec<u8>>,
    version: Option<(Vec<String>, u32, u32)>,
    file_records: Vec<(Vec<String>, u32, u32)>,
    options: VromfsReaderOptions,
}

impl VromfsReader {
    /// Parses an in-memory VROMFS container with default options
    /// (digest verification enabled).
    pub fn open(data: &[u8]) -> Result<Self> {
        Self::with_options(data, VromfsReaderOptions::default())
    }

    /// Parses an in-memory VROMFS container with explicit options.
    pub fn with_options(data: &[u8], options: VromfsReaderOptions) -> Result<Self> {
        let inner_image = Self::parse_outer(data, &options)?;
        let mut reader = VromfsReader {
            inner_image,
            name_map: None,
            zstd_dict: None,
            version: None,
            file_records: Vec::new(),
            options,
        };
        reader.parse_inner_index()?;
        Ok(reader)
    }

    /// Outer-header algorithm: returns the decompressed, deobfuscated inner
    /// image. Mirrors spec's outer-header algorithm steps 1–6.
    fn parse_outer(data: &[u8], options: &VromfsReaderOptions) -> Result<Vec<u8>> {
        let mut cursor = ByteCursor::new(data);

        let header_kind = cursor.u32_le()?;
        if header_kind != MAGIC_VRFS && header_kind != MAGIC_VRFX {
            return Err(VromfsError::BadMagic);
        }

        let _platform = cursor.u32_le()?;
        let uncompressed_size = cursor.u32_le()?;
        let pack_raw = cursor.u32_le()?;
        let packing = Packing::from_raw(pack_raw);
        let pack_size = pack_raw & crate::format::PACK_SIZE_MASK;

        if header_kind == MAGIC_VRFX {
            cursor.advance(4)?;
            cursor.advance(4)?;
        }

        let payload = if packing.has_zstd_obfs() {
            cursor.fetch(pack_size as usize)?
        } else {
            cursor.fetch(uncompressed_size as usize)?
        };

        if !packing.has_zstd_obfs() {
            return Ok(payload.to_vec());
        }

        let deobfuscated = deobfuscate(payload);
        let decompressed = zstd::decode_all(std::io::Cursor::new(&deobfuscated[..]))
            .map_err(|e| VromfsError::DecompressionFailed(e.to_string()))?;

        if packing.has_digest() {
            let digest = cursor.fetch(16)?;
            if options.verify_digest {
                let mut hasher = Md5::new();
                hasher.update(&decompressed);
                let computed = hasher.finalize();
                if computed.as_slice() != digest {
                    return Err(VromfsError::DigestMismatch);
                }
            }
        }

        Ok(decompressed)
    }

    /// Inner-directory algorithm over `self.inner_image`: builds the name
    /// table, the data table, and the special records (name map, zstd
    /// dictionary, version), leaving user files in `file_records`.
    fn parse_inner_index(&mut self) -> Result<()> {
        let mut cursor = ByteCursor::new(&self.inner_image);

        let names_header = cursor.fetch(4)?;
        match names_header[0] {
            INNER_HEADER_NO_DIGEST | INNER_HEADER_HAS_DIGEST => {}
            other => {
                return Err(VromfsError::BadInnerHeader(format!(
                    "unexpected names_header tag {other:#x}"
                )))
            }
        }
        let names_offset = u32::from_le_bytes(names_header.try_into().unwrap());

        let names_count = cursor.u32_le()?;
        cursor.advance(8)?;

        let data_offset = cursor.u32_le()?;
        let data_count = cursor.u32_le()?;
        cursor.advance(8)?;

        let mut names: Vec<Vec<u8>> = Vec::with_capacity(names_count as usize);
        for i in 0..names_count {
            let entry_offset = names_offset as usize + i as usize * 8;
            let offset_bytes = &self.inner_image[entry_offset..entry_offset + 8];
            let str_offset = u64::from_le_bytes(offset_bytes.try_into().unwrap()) as usize;
            let mut name_cursor = ByteCursor::with_offset(&self.inner_image, str_offset);
            names.push(name_cursor.read_cstr()?.to_vec());
        }

        for i in 0..data_count {
            let record_offset = data_offset as usize + i as usize * 16;
            let mut record_cursor = ByteCursor::with_offset(&self.inner_image, record_offset);
            let offset = record_cursor.u32_le()?;
            let size = record_cursor.u32_le()?;

            let name = &names[i as usize];
            if name.as_slice() == SPECIAL_NAME_MAP {
                self.parse_name_map(offset, size)?;
            } else if name.ends_with(SPECIAL_DICT_SUFFIX) {
                let start = offset as usize;
                self.zstd_dict = Some(self.inner_image[start..start + size as usize].to_vec());
            } else if name.as_slice() == SPECIAL_VERSION {
                self.version = Some((vec!["version".to_string()], offset, size));
            } else {
                let path_components = String::from_utf8_lossy(name)
                    .split('/')
                    .map(str::to_string)
                    .collect();
                self.file_records.push((path_components, offset, size));
            }
        }

        Ok(())
    }

    /// Decompresses and parses the `\xff?nm` special record into
    /// `self.name_map`.
    fn parse_name_map(&mut self, offset: u32, size: u32) -> Result<()> {
        let start = offset as usize;
        let raw = &self.inner_image[start..start + size as usize];
        if raw.len() < 40 {
            return Err(VromfsError::BadNameMap("blob shorter than digest prefix".into()));
        }
        let _names_digest = &raw[0..8];
        let _dict_digest = &raw[8..40];
        let zstd_data = &raw[40..];

        let decompressed = zstd::decode_all(std::io::Cursor::new(zstd_data))
            .map_err(|e| VromfsError::DecompressionFailed(e.to_string()))?;

        let mut cursor = ByteCursor::new(&decompressed);
        let names_count = cursor.uleb128()?;
        let names_data_size = cursor.uleb128()?;
        let names_data = cursor.fetch(names_data_size as usize)?;

        let mut names: Vec<Vec<u8>> = names_data
            .split(|&b| b == 0)
            .map(|s| s.to_vec())
            .collect();
        // The data ends with a NUL terminator, producing one trailing empty slice.
        if names.last().map(|n| n.is_empty()).unwrap_or(false) {
            names.pop();
        }

        if names.len() as u64 != names_count {
            return Err(VromfsError::BadNameMap(format!(
                "expected {names_count} names, parsed {}",
                names.len()
            )));
        }

        self.name_map = Some(names);
        Ok(())
    }

    /// The archive-level name map, if a `\xff?nm` record was present.
    pub fn name_map(&self) -> Option<&[Vec<u8>]> {
        self.name_map.as_deref()
    }

    /// The archive-level ZSTD dictionary, if a `*dict` record was present.
    pub fn zstd_dict(&self) -> Option<&[u8]> {
        self.zstd_dict.as_deref()
    }

    /// The archive's version record, if present.
    pub fn version(&self) -> Option<VromfsFile<'_>> {
        self.version.as_ref().map(|(path, offset, size)| VromfsFile {
            path_components: path.clone(),
            offset: *offset,
            size: *size,
            reader: self,
        })
    }

    pub fn options(&self) -> &VromfsReaderOptions {
        &self.options
    }

    /// Raw bytes for an arbitrary `(offset, size)` span inside the inner
    /// image. Exists so callers that keep their own owned file records
    /// (rather than borrowing [`VromfsFile`]) can still fetch data without
    /// re-parsing the index.
    pub fn slice(&self, offset: u32, size: u32) -> &[u8] {
        let start = offset as usize;
        &self.inner_image[start..start + size as usize]
    }

    /// All ordinary (non-special) files in the archive, in index order.
    pub fn files(&self) -> impl Iterator<Item = VromfsFile<'_>> {
        self.file_records.iter().map(move |(path, offset, size)| VromfsFile {
            path_components: path.clone(),
            offset: *offset,
            size: *size,
            reader: self,
        })
    }
}

//! GFF4 container loading
//!
//! Loading is split in two. Everything needed to navigate the graph (the
//! header, the struct descriptors and the list-indices region) is parsed
//! and validated up front, so a corrupt file fails here and never yields a
//! half-usable object. Field records are only read when a struct is first
//! queried (see [`super::Gff4Struct`]).

use super::structs::{Field, Gff4List, Gff4Struct};
use super::{
    FIELD_RECORD_SIZE, GFF_MAGIC, HEADER_SIZE, LABEL_SIZE, PLATFORM_PC, STRUCT_RECORD_SIZE,
    SUPPORTED_VERSIONS,
};
use crate::error::{Error, Result};
use crate::formats::common::tag_to_string;
use byteorder::{LittleEndian, ReadBytesExt};
use encoding_rs::{Encoding, WINDOWS_1252};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::sync::OnceLock;

/// One `(offset, count)` entry of the region table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Region {
    pub offset: u32,
    /// Record count for structs/fields/labels, byte size for the others.
    pub count: u32,
}

impl Region {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let offset = reader.read_u32::<LittleEndian>()?;
        let count = reader.read_u32::<LittleEndian>()?;
        Ok(Self { offset, count })
    }

    fn end(self, record_size: u64) -> u64 {
        u64::from(self.offset) + u64::from(self.count) * record_size
    }
}

/// The fixed GFF4 header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gff4Header {
    pub type_id: [u8; 4],
    pub version: [u8; 4],
    pub platform: [u8; 4],
    pub type_version: [u8; 4],
    pub structs: Region,
    pub fields: Region,
    pub labels: Region,
    pub field_data: Region,
    pub field_indices: Region,
    pub list_indices: Region,
}

#[derive(Debug)]
pub(crate) struct StructRecord {
    pub(crate) id: u32,
    pub(crate) field_index: u32,
    pub(crate) field_count: u32,
    pub(crate) fields: OnceLock<IndexMap<String, Field>>,
}

/// A decoded GFF4 container.
///
/// Owns the raw bytes and every struct in them; [`Gff4Struct`] and
/// [`super::Gff4List`] are borrowed views into this arena.
///
/// Lazily materialised field maps are stored in [`OnceLock`]s, so a loaded
/// file can be shared across threads and queried concurrently.
#[derive(Debug)]
pub struct Gff4File {
    pub(crate) data: Vec<u8>,
    pub(crate) header: Gff4Header,
    pub(crate) structs: Vec<StructRecord>,
    pub(crate) lists: Vec<Vec<usize>>,
    /// Word offset into the list-indices region -> index into `lists`.
    pub(crate) list_offsets: HashMap<u32, usize>,
    pub(crate) encoding: &'static Encoding,
}

fn read_tag<R: Read>(reader: &mut R) -> Result<[u8; 4]> {
    let mut tag = [0u8; 4];
    reader.read_exact(&mut tag)?;
    Ok(tag)
}

fn check_region(what: &'static str, region: Region, record_size: u64, file_len: u64) -> Result<()> {
    let end = region.end(record_size);
    if end > file_len {
        return Err(Error::GffOutOfBounds {
            what,
            index: end,
            limit: file_len,
        });
    }
    Ok(())
}

impl Gff4File {
    /// Load a GFF4 container, rejecting it unless its type ID is `expected_type`.
    ///
    /// String fields are decoded as windows-1252.
    pub fn load(data: Vec<u8>, expected_type: [u8; 4]) -> Result<Self> {
        Self::load_with_encoding(data, expected_type, WINDOWS_1252)
    }

    /// Load a GFF4 container whose string fields use `encoding`.
    pub fn load_with_encoding(
        data: Vec<u8>,
        expected_type: [u8; 4],
        encoding: &'static Encoding,
    ) -> Result<Self> {
        let header = read_header(&data, expected_type)?;
        let structs = read_structs(&data, &header)?;
        let (lists, list_offsets) = read_lists(&data, &header, structs.len())?;

        tracing::debug!(
            "Loaded GFF4 {}: {} structs, {} lists",
            tag_to_string(header.type_id),
            structs.len(),
            lists.len()
        );

        Ok(Self {
            data,
            header,
            structs,
            lists,
            list_offsets,
            encoding,
        })
    }

    #[must_use]
    pub fn header(&self) -> &Gff4Header {
        &self.header
    }

    #[must_use]
    pub fn type_id(&self) -> [u8; 4] {
        self.header.type_id
    }

    #[must_use]
    pub fn version(&self) -> [u8; 4] {
        self.header.version
    }

    /// Layout version of the payload (e.g. `V0.5` for a Huffman talk table).
    #[must_use]
    pub fn type_version(&self) -> [u8; 4] {
        self.header.type_version
    }

    #[must_use]
    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    #[must_use]
    pub fn struct_count(&self) -> usize {
        self.structs.len()
    }

    #[must_use]
    pub fn list_count(&self) -> usize {
        self.lists.len()
    }

    /// The root struct (struct 0). Always present in a loaded file.
    #[must_use]
    pub fn top_level(&self) -> Gff4Struct<'_> {
        Gff4Struct::new(self, 0)
    }

    #[must_use]
    pub fn get_struct(&self, index: usize) -> Option<Gff4Struct<'_>> {
        (index < self.structs.len()).then(|| Gff4Struct::new(self, index))
    }

    /// A list by its position in the list table.
    pub(crate) fn list(&self, index: usize) -> Option<Gff4List<'_>> {
        Gff4List::new(self, index)
    }
}

fn read_header(data: &[u8], expected_type: [u8; 4]) -> Result<Gff4Header> {
    let mut cursor = Cursor::new(data);

    let magic = read_tag(&mut cursor)?;
    if magic != GFF_MAGIC {
        return Err(Error::InvalidGffMagic(magic));
    }

    let type_id = read_tag(&mut cursor)?;
    if type_id != expected_type {
        return Err(Error::GffTypeMismatch {
            expected: tag_to_string(expected_type),
            found: tag_to_string(type_id),
        });
    }

    let version = read_tag(&mut cursor)?;
    if !SUPPORTED_VERSIONS.contains(&version) {
        return Err(Error::UnsupportedGffVersion(tag_to_string(version)));
    }

    let platform = read_tag(&mut cursor)?;
    if platform != PLATFORM_PC {
        return Err(Error::UnsupportedGffPlatform(tag_to_string(platform)));
    }

    let type_version = read_tag(&mut cursor)?;

    let header = Gff4Header {
        type_id,
        version,
        platform,
        type_version,
        structs: Region::read(&mut cursor)?,
        fields: Region::read(&mut cursor)?,
        labels: Region::read(&mut cursor)?,
        field_data: Region::read(&mut cursor)?,
        field_indices: Region::read(&mut cursor)?,
        list_indices: Region::read(&mut cursor)?,
    };
    debug_assert_eq!(cursor.position(), HEADER_SIZE);

    let len = data.len() as u64;
    check_region("struct region", header.structs, STRUCT_RECORD_SIZE, len)?;
    check_region("field region", header.fields, FIELD_RECORD_SIZE, len)?;
    check_region("label region", header.labels, LABEL_SIZE, len)?;
    check_region("field data region", header.field_data, 1, len)?;
    check_region("field indices region", header.field_indices, 1, len)?;
    check_region("list indices region", header.list_indices, 1, len)?;

    Ok(header)
}

fn read_structs(data: &[u8], header: &Gff4Header) -> Result<Vec<StructRecord>> {
    if header.structs.count == 0 {
        return Err(Error::MissingTopLevelStruct);
    }

    let mut cursor = Cursor::new(data);
    cursor.set_position(u64::from(header.structs.offset));

    let mut structs = Vec::with_capacity(header.structs.count as usize);
    for _ in 0..header.structs.count {
        let id = cursor.read_u32::<LittleEndian>()?;
        let field_index = cursor.read_u32::<LittleEndian>()?;
        let field_count = cursor.read_u32::<LittleEndian>()?;
        check_struct_fields(header, field_index, field_count)?;

        structs.push(StructRecord {
            id,
            field_index,
            field_count,
            fields: OnceLock::new(),
        });
    }

    Ok(structs)
}

/// Reject field counts and index runs that cannot fit the field regions.
fn check_struct_fields(header: &Gff4Header, field_index: u32, field_count: u32) -> Result<()> {
    if field_count > header.fields.count {
        return Err(Error::GffOutOfBounds {
            what: "struct field count",
            index: u64::from(field_count),
            limit: u64::from(header.fields.count),
        });
    }

    if field_count > 1 {
        let end = u64::from(field_index) + u64::from(field_count) * 4;
        if end > u64::from(header.field_indices.count) {
            return Err(Error::GffOutOfBounds {
                what: "field indices",
                index: end,
                limit: u64::from(header.field_indices.count),
            });
        }
    }
    Ok(())
}

type Lists = (Vec<Vec<usize>>, HashMap<u32, usize>);

/// Split the list-indices region into `[count, idx_0 .. idx_{count-1}]` runs.
fn read_lists(data: &[u8], header: &Gff4Header, struct_count: usize) -> Result<Lists> {
    let region = header.list_indices;
    let start = region.offset as usize;
    let words: Vec<u32> = data[start..start + region.count as usize]
        .chunks_exact(4)
        .map(|w| u32::from_le_bytes([w[0], w[1], w[2], w[3]]))
        .collect();

    let mut lists = Vec::new();
    let mut list_offsets = HashMap::new();

    let mut pos = 0usize;
    while pos < words.len() {
        let count = words[pos];
        let end = pos + 1 + count as usize;
        if end > words.len() {
            return Err(Error::GffListOverrun {
                offset: (pos * 4) as u32,
                count,
            });
        }

        let mut list = Vec::with_capacity(count as usize);
        for &index in &words[pos + 1..end] {
            if index as usize >= struct_count {
                return Err(Error::GffOutOfBounds {
                    what: "list struct index",
                    index: u64::from(index),
                    limit: struct_count as u64,
                });
            }
            list.push(index as usize);
        }

        list_offsets.insert(pos as u32, lists.len());
        lists.push(list);
        pos = end;
    }

    Ok((lists, list_offsets))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::gff4::{Gff4WriteStruct, Gff4WriteValue, Gff4Writer};

    const TYPE: [u8; 4] = *b"TEST";

    fn sample() -> Vec<u8> {
        let child = Gff4WriteStruct::new(7).with("Value", Gff4WriteValue::Uint32(5));
        let top = Gff4WriteStruct::new(1)
            .with("Name", Gff4WriteValue::String("top".into()))
            .with("Items", Gff4WriteValue::List(vec![child.clone(), child]));
        Gff4Writer::new(TYPE, *b"V1.0").write(&top).unwrap()
    }

    #[test]
    fn test_load_header() {
        let gff = Gff4File::load(sample(), TYPE).unwrap();
        assert_eq!(gff.type_id(), TYPE);
        assert_eq!(gff.version(), *b"V4.0");
        assert_eq!(gff.type_version(), *b"V1.0");
        assert_eq!(gff.struct_count(), 3);
        assert_eq!(gff.list_count(), 1);
        assert_eq!(gff.top_level().id(), 1);
    }

    #[test]
    fn test_reject_wrong_magic_type_and_version() {
        let mut data = sample();
        data[0] = b'X';
        assert!(matches!(Gff4File::load(data, TYPE), Err(Error::InvalidGffMagic(_))));

        assert!(matches!(
            Gff4File::load(sample(), *b"G2DA"),
            Err(Error::GffTypeMismatch { .. })
        ));

        let mut data = sample();
        data[8..12].copy_from_slice(b"V3.2");
        assert!(matches!(Gff4File::load(data, TYPE), Err(Error::UnsupportedGffVersion(_))));

        let mut data = sample();
        data[12..16].copy_from_slice(b"PS3 ");
        assert!(matches!(Gff4File::load(data, TYPE), Err(Error::UnsupportedGffPlatform(_))));
    }

    #[test]
    fn test_truncated_file_rejected() {
        let data = sample();
        let truncated = data[..data.len() - 4].to_vec();
        assert!(matches!(
            Gff4File::load(truncated, TYPE),
            Err(Error::GffOutOfBounds { .. })
        ));
        assert!(matches!(Gff4File::load(data[..30].to_vec(), TYPE), Err(Error::Io(_))));
    }

    #[test]
    fn test_list_overrun_rejected() {
        let mut data = sample();
        let gff = Gff4File::load(data.clone(), TYPE).unwrap();
        let list_start = gff.header().list_indices.offset as usize;
        // Claim far more entries than the region holds
        data[list_start..list_start + 4].copy_from_slice(&100u32.to_le_bytes());
        assert!(matches!(
            Gff4File::load(data, TYPE),
            Err(Error::GffListOverrun { offset: 0, count: 100 })
        ));
    }

    #[test]
    fn test_list_struct_index_checked() {
        let mut data = sample();
        let gff = Gff4File::load(data.clone(), TYPE).unwrap();
        let first_entry = gff.header().list_indices.offset as usize + 4;
        data[first_entry..first_entry + 4].copy_from_slice(&99u32.to_le_bytes());
        assert!(matches!(
            Gff4File::load(data, TYPE),
            Err(Error::GffOutOfBounds { what: "list struct index", .. })
        ));
    }

    #[test]
    fn test_struct_field_count_checked() {
        let mut data = sample();
        let gff = Gff4File::load(data.clone(), TYPE).unwrap();
        let count_at = gff.header().structs.offset as usize + 8;
        data[count_at..count_at + 4].copy_from_slice(&0x4000_0000u32.to_le_bytes());
        assert!(matches!(
            Gff4File::load(data, TYPE),
            Err(Error::GffOutOfBounds { what: "struct field count", index: 0x4000_0000, .. })
        ));
    }

    #[test]
    fn test_struct_field_index_run_checked() {
        let mut data = sample();
        let gff = Gff4File::load(data.clone(), TYPE).unwrap();
        // The top struct has two fields, so its index points into the field indices
        let index_at = gff.header().structs.offset as usize + 4;
        let past_end = gff.header().field_indices.count;
        data[index_at..index_at + 4].copy_from_slice(&past_end.to_le_bytes());
        assert!(matches!(
            Gff4File::load(data, TYPE),
            Err(Error::GffOutOfBounds { what: "field indices", .. })
        ));
    }
}

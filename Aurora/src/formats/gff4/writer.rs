//! GFF4 file writing
//!
//! Builds a container from an in-memory struct tree. The top-level struct
//! becomes struct 0; children are numbered depth-first as they are met.

use super::types::FieldType;
use super::{GFF_MAGIC, HEADER_SIZE, LABEL_SIZE, PLATFORM_PC, VERSION_40};
use crate::error::{Error, Result};
use byteorder::{LittleEndian, WriteBytesExt};
use encoding_rs::{Encoding, WINDOWS_1252};
use std::collections::HashMap;
use std::path::Path;

/// A field value to be written.
#[derive(Debug, Clone, PartialEq)]
pub enum Gff4WriteValue {
    Byte(u8),
    Char(i8),
    Uint16(u16),
    Sint16(i16),
    Uint32(u32),
    Sint32(i32),
    Uint64(u64),
    Sint64(i64),
    Float(f32),
    Double(f64),
    String(String),
    ResRef(String),
    /// String reference plus `(gendered language ID, text)` substrings.
    LocString {
        str_ref: u32,
        strings: Vec<(u32, String)>,
    },
    Void(Vec<u8>),
    Struct(Gff4WriteStruct),
    List(Vec<Gff4WriteStruct>),
    Orientation([f32; 4]),
    Vector([f32; 3]),
    StrRef(u32),
}

impl Gff4WriteValue {
    fn field_type(&self) -> FieldType {
        match self {
            Self::Byte(_) => FieldType::Byte,
            Self::Char(_) => FieldType::Char,
            Self::Uint16(_) => FieldType::Uint16,
            Self::Sint16(_) => FieldType::Sint16,
            Self::Uint32(_) => FieldType::Uint32,
            Self::Sint32(_) => FieldType::Sint32,
            Self::Uint64(_) => FieldType::Uint64,
            Self::Sint64(_) => FieldType::Sint64,
            Self::Float(_) => FieldType::Float,
            Self::Double(_) => FieldType::Double,
            Self::String(_) => FieldType::String,
            Self::ResRef(_) => FieldType::ResRef,
            Self::LocString { .. } => FieldType::LocString,
            Self::Void(_) => FieldType::Void,
            Self::Struct(_) => FieldType::Struct,
            Self::List(_) => FieldType::List,
            Self::Orientation(_) => FieldType::Orientation,
            Self::Vector(_) => FieldType::Vector,
            Self::StrRef(_) => FieldType::StrRef,
        }
    }
}

/// A struct to be written: type ID plus labelled fields in order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Gff4WriteStruct {
    pub id: u32,
    pub fields: Vec<(String, Gff4WriteValue)>,
}

impl Gff4WriteStruct {
    #[must_use]
    pub fn new(id: u32) -> Self {
        Self { id, fields: Vec::new() }
    }

    /// Builder-style field append.
    #[must_use]
    pub fn with(mut self, label: impl Into<String>, value: Gff4WriteValue) -> Self {
        self.push(label, value);
        self
    }

    pub fn push(&mut self, label: impl Into<String>, value: Gff4WriteValue) {
        self.fields.push((label.into(), value));
    }
}

/// Serialises [`Gff4WriteStruct`] trees to GFF4 bytes.
#[derive(Debug, Clone)]
pub struct Gff4Writer {
    type_id: [u8; 4],
    type_version: [u8; 4],
    version: [u8; 4],
    encoding: &'static Encoding,
}

#[derive(Default)]
struct Sections {
    structs: Vec<(u32, u32, u32)>,
    fields: Vec<(u32, u32, u32)>,
    labels: Vec<[u8; LABEL_SIZE as usize]>,
    label_map: HashMap<String, u32>,
    field_data: Vec<u8>,
    field_indices: Vec<u8>,
    list_indices: Vec<u8>,
}

impl Gff4Writer {
    /// A `V4.0` PC writer for the given type tags, encoding strings as windows-1252.
    #[must_use]
    pub fn new(type_id: [u8; 4], type_version: [u8; 4]) -> Self {
        Self {
            type_id,
            type_version,
            version: VERSION_40,
            encoding: WINDOWS_1252,
        }
    }

    #[must_use]
    pub fn with_version(mut self, version: [u8; 4]) -> Self {
        self.version = version;
        self
    }

    /// Encoding for string and localized string fields.
    ///
    /// UTF-16 encodings cannot be produced by `encoding_rs` and fall back to UTF-8.
    #[must_use]
    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Write to a file on disk
    pub fn write_to_file<P: AsRef<Path>>(&self, top: &Gff4WriteStruct, path: P) -> Result<()> {
        let bytes = self.write(top)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Serialise a tree rooted at `top`.
    pub fn write(&self, top: &Gff4WriteStruct) -> Result<Vec<u8>> {
        let mut sections = Sections::default();
        self.add_struct(&mut sections, top)?;

        let struct_size = sections.structs.len() * 12;
        let field_size = sections.fields.len() * 12;
        let label_size = sections.labels.len() * LABEL_SIZE as usize;

        let struct_offset = HEADER_SIZE as usize;
        let field_offset = struct_offset + struct_size;
        let label_offset = field_offset + field_size;
        let field_data_offset = label_offset + label_size;
        let field_indices_offset = field_data_offset + sections.field_data.len();
        let list_indices_offset = field_indices_offset + sections.field_indices.len();

        let mut output = Vec::with_capacity(list_indices_offset + sections.list_indices.len());

        // Header
        output.extend_from_slice(&GFF_MAGIC);
        output.extend_from_slice(&self.type_id);
        output.extend_from_slice(&self.version);
        output.extend_from_slice(&PLATFORM_PC);
        output.extend_from_slice(&self.type_version);

        // Region table
        for (offset, count) in [
            (struct_offset, sections.structs.len()),
            (field_offset, sections.fields.len()),
            (label_offset, sections.labels.len()),
            (field_data_offset, sections.field_data.len()),
            (field_indices_offset, sections.field_indices.len()),
            (list_indices_offset, sections.list_indices.len()),
        ] {
            output.write_u32::<LittleEndian>(offset as u32)?;
            output.write_u32::<LittleEndian>(count as u32)?;
        }

        for &(id, field_index, field_count) in &sections.structs {
            output.write_u32::<LittleEndian>(id)?;
            output.write_u32::<LittleEndian>(field_index)?;
            output.write_u32::<LittleEndian>(field_count)?;
        }
        for &(field_type, label, data) in &sections.fields {
            output.write_u32::<LittleEndian>(field_type)?;
            output.write_u32::<LittleEndian>(label)?;
            output.write_u32::<LittleEndian>(data)?;
        }
        for label in &sections.labels {
            output.extend_from_slice(label);
        }
        output.extend_from_slice(&sections.field_data);
        output.extend_from_slice(&sections.field_indices);
        output.extend_from_slice(&sections.list_indices);

        Ok(output)
    }

    fn add_struct(&self, sections: &mut Sections, s: &Gff4WriteStruct) -> Result<u32> {
        let index = sections.structs.len() as u32;
        sections.structs.push((s.id, 0, s.fields.len() as u32));

        let mut field_records = Vec::with_capacity(s.fields.len());
        for (label, value) in &s.fields {
            let label = Self::add_label(sections, label)?;
            let data = self.add_value(sections, value)?;
            field_records.push(sections.fields.len() as u32);
            sections.fields.push((value.field_type() as u32, label, data));
        }

        let field_index = match field_records.as_slice() {
            [] => 0,
            [single] => *single,
            many => {
                let offset = sections.field_indices.len() as u32;
                for &record in many {
                    sections.field_indices.write_u32::<LittleEndian>(record)?;
                }
                offset
            }
        };
        sections.structs[index as usize].1 = field_index;

        Ok(index)
    }

    fn add_label(sections: &mut Sections, label: &str) -> Result<u32> {
        if let Some(&index) = sections.label_map.get(label) {
            return Ok(index);
        }

        let bytes = label.as_bytes();
        if bytes.len() > LABEL_SIZE as usize {
            return Err(Error::LabelTooLong(label.to_string()));
        }

        let mut record = [0u8; LABEL_SIZE as usize];
        record[..bytes.len()].copy_from_slice(bytes);

        let index = sections.labels.len() as u32;
        sections.labels.push(record);
        sections.label_map.insert(label.to_string(), index);
        Ok(index)
    }

    fn encode(&self, text: &str) -> Vec<u8> {
        let (bytes, _, _) = self.encoding.encode(text);
        bytes.into_owned()
    }

    /// Returns the field record's data word.
    fn add_value(&self, sections: &mut Sections, value: &Gff4WriteValue) -> Result<u32> {
        use Gff4WriteValue as V;

        let data = sections.field_data.len() as u32;
        let out = &mut sections.field_data;
        match value {
            V::Byte(v) => return Ok(u32::from(*v)),
            V::Char(v) => return Ok(u32::from(*v as u8)),
            V::Uint16(v) => return Ok(u32::from(*v)),
            V::Sint16(v) => return Ok(u32::from(*v as u16)),
            V::Uint32(v) | V::StrRef(v) => return Ok(*v),
            V::Sint32(v) => return Ok(*v as u32),
            V::Float(v) => return Ok(v.to_bits()),
            V::Uint64(v) => out.write_u64::<LittleEndian>(*v)?,
            V::Sint64(v) => out.write_i64::<LittleEndian>(*v)?,
            V::Double(v) => out.write_f64::<LittleEndian>(*v)?,
            V::String(text) => {
                let bytes = self.encode(text);
                out.write_u32::<LittleEndian>(bytes.len() as u32)?;
                out.extend_from_slice(&bytes);
            }
            V::ResRef(text) => {
                let bytes = text.as_bytes();
                out.write_u8(bytes.len().min(255) as u8)?;
                out.extend_from_slice(&bytes[..bytes.len().min(255)]);
            }
            V::LocString { str_ref, strings } => {
                let mut body = Vec::new();
                body.write_u32::<LittleEndian>(*str_ref)?;
                body.write_u32::<LittleEndian>(strings.len() as u32)?;
                for (language_id, text) in strings {
                    let bytes = self.encode(text);
                    body.write_u32::<LittleEndian>(*language_id)?;
                    body.write_u32::<LittleEndian>(bytes.len() as u32)?;
                    body.extend_from_slice(&bytes);
                }
                out.write_u32::<LittleEndian>(body.len() as u32)?;
                out.extend_from_slice(&body);
            }
            V::Void(bytes) => {
                out.write_u32::<LittleEndian>(bytes.len() as u32)?;
                out.extend_from_slice(bytes);
            }
            V::Orientation(values) => {
                for v in values {
                    out.write_f32::<LittleEndian>(*v)?;
                }
            }
            V::Vector(values) => {
                for v in values {
                    out.write_f32::<LittleEndian>(*v)?;
                }
            }
            V::Struct(child) => return self.add_struct(sections, child),
            V::List(children) => {
                let mut indices = Vec::with_capacity(children.len());
                for child in children {
                    indices.push(self.add_struct(sections, child)?);
                }

                let offset = sections.list_indices.len() as u32;
                sections.list_indices.write_u32::<LittleEndian>(indices.len() as u32)?;
                for index in indices {
                    sections.list_indices.write_u32::<LittleEndian>(index)?;
                }
                return Ok(offset);
            }
        }

        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::gff4::Gff4File;

    #[test]
    fn test_layout() {
        let top = Gff4WriteStruct::new(9)
            .with("A", Gff4WriteValue::Uint32(1))
            .with("B", Gff4WriteValue::Uint64(2))
            .with("A2", Gff4WriteValue::Uint32(3));
        let data = Gff4Writer::new(*b"TEST", *b"V0.1").write(&top).unwrap();

        assert_eq!(&data[0..4], b"GFF ");
        assert_eq!(&data[4..8], b"TEST");
        assert_eq!(&data[8..12], b"V4.0");
        assert_eq!(&data[12..16], b"PC  ");
        assert_eq!(&data[16..20], b"V0.1");
        // 68 header + 12 struct + 36 fields + 48 labels + 8 data + 12 indices
        assert_eq!(data.len(), 68 + 12 + 36 + 48 + 8 + 12);
    }

    #[test]
    fn test_labels_deduplicated() {
        let row = Gff4WriteStruct::new(0).with("Value", Gff4WriteValue::Byte(1));
        let top = Gff4WriteStruct::new(0).with("Rows", Gff4WriteValue::List(vec![row.clone(), row]));
        let data = Gff4Writer::new(*b"TEST", *b"V0.1").write(&top).unwrap();

        let gff = Gff4File::load(data, *b"TEST").unwrap();
        assert_eq!(gff.header().labels.count, 2);
    }

    #[test]
    fn test_long_label_rejected() {
        let top = Gff4WriteStruct::new(0).with("ThisLabelIsFarTooLong", Gff4WriteValue::Byte(1));
        assert!(matches!(
            Gff4Writer::new(*b"TEST", *b"V0.1").write(&top),
            Err(Error::LabelTooLong(_))
        ));
    }
}

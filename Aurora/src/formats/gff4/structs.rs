//! Struct and list views with typed, lazily materialised field access

use super::file::{Gff4File, StructRecord};
use super::types::{FieldType, ValueClass, inline_signed, inline_unsigned};
use super::{FIELD_RECORD_SIZE, LABEL_SIZE};
use crate::error::{Error, Result};
use crate::formats::common::{decode_text, read_fixed_string};
use crate::language::LanguageConfig;
use crate::talk::LocString;
use byteorder::{LittleEndian, ReadBytesExt};
use encoding_rs::WINDOWS_1252;
use glam::{Vec3, Vec4};
use indexmap::IndexMap;
use std::io::{Cursor, Read};

/// One decoded field record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub field_type: FieldType,
    /// Inline value, or for extended types an offset into the field-data region.
    pub data: u32,
    pub extended: bool,
}

impl Field {
    #[must_use]
    pub fn new(field_type: FieldType, data: u32) -> Self {
        Self {
            field_type,
            data,
            extended: field_type.is_extended(),
        }
    }
}

/// A struct inside a [`Gff4File`].
///
/// This is a cheap `Copy` handle (file reference + arena index); it cannot
/// outlive the file it points into.
#[derive(Debug, Clone, Copy)]
pub struct Gff4Struct<'a> {
    file: &'a Gff4File,
    index: usize,
}

impl<'a> Gff4Struct<'a> {
    pub(crate) fn new(file: &'a Gff4File, index: usize) -> Self {
        Self { file, index }
    }

    fn record(&self) -> &'a StructRecord {
        &self.file.structs[self.index]
    }

    /// The application-defined struct type ID.
    #[must_use]
    pub fn id(&self) -> u32 {
        self.record().id
    }

    /// Position of this struct in the file's struct table.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn file(&self) -> &'a Gff4File {
        self.file
    }

    /// Declared number of fields (does not trigger a load).
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.record().field_count as usize
    }

    /// Whether the field map has been materialised yet.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.record().fields.get().is_some()
    }

    /// The field map, reading the field records on first use.
    fn fields(&self) -> Result<&'a IndexMap<String, Field>> {
        let record = self.record();
        if let Some(fields) = record.fields.get() {
            return Ok(fields);
        }

        let loaded = self.read_fields(record)?;
        Ok(record.fields.get_or_init(|| loaded))
    }

    fn read_fields(&self, record: &StructRecord) -> Result<IndexMap<String, Field>> {
        let header = &self.file.header;
        let mut fields = IndexMap::with_capacity(record.field_count as usize);

        let indices = match record.field_count {
            0 => Vec::new(),
            1 => vec![record.field_index],
            count => {
                let region = header.field_indices;
                let end = u64::from(record.field_index) + u64::from(count) * 4;
                if end > u64::from(region.count) {
                    return Err(Error::GffOutOfBounds {
                        what: "field indices",
                        index: end,
                        limit: u64::from(region.count),
                    });
                }

                let mut cursor = Cursor::new(self.file.data.as_slice());
                cursor.set_position(u64::from(region.offset) + u64::from(record.field_index));
                (0..count)
                    .map(|_| cursor.read_u32::<LittleEndian>())
                    .collect::<std::io::Result<Vec<_>>>()?
            }
        };

        let mut cursor = Cursor::new(self.file.data.as_slice());
        for field_index in indices {
            if field_index >= header.fields.count {
                return Err(Error::GffOutOfBounds {
                    what: "field index",
                    index: u64::from(field_index),
                    limit: u64::from(header.fields.count),
                });
            }

            cursor.set_position(
                u64::from(header.fields.offset) + u64::from(field_index) * FIELD_RECORD_SIZE,
            );
            let type_id = cursor.read_u32::<LittleEndian>()?;
            let label_index = cursor.read_u32::<LittleEndian>()?;
            let data = cursor.read_u32::<LittleEndian>()?;

            let field_type = FieldType::from_u32(type_id).ok_or(Error::UnknownFieldType(type_id))?;
            let label = self.read_label(label_index)?;

            fields.insert(label, Field::new(field_type, data));
        }

        Ok(fields)
    }

    fn read_label(&self, label_index: u32) -> Result<String> {
        let labels = self.file.header.labels;
        if label_index >= labels.count {
            return Err(Error::GffOutOfBounds {
                what: "label index",
                index: u64::from(label_index),
                limit: u64::from(labels.count),
            });
        }

        let mut cursor = Cursor::new(self.file.data.as_slice());
        cursor.set_position(u64::from(labels.offset) + u64::from(label_index) * LABEL_SIZE);
        read_fixed_string(&mut cursor, LABEL_SIZE as usize)
    }

    fn field(&self, label: &str) -> Result<Option<Field>> {
        Ok(self.fields()?.get(label).copied())
    }

    fn mismatch(label: &str, expected: &'static str, field: Field) -> Error {
        Error::FieldTypeMismatch {
            label: label.to_string(),
            expected,
            found: field.field_type.name(),
        }
    }

    /// A cursor over the field-data region, positioned at the field's payload.
    fn field_data(&self, label: &str, field: Field) -> Result<Cursor<&'a [u8]>> {
        let region = self.file.header.field_data;
        if field.data >= region.count {
            return Err(Error::GffOutOfBounds {
                what: "field data offset",
                index: u64::from(field.data),
                limit: u64::from(region.count),
            });
        }

        let start = region.offset as usize;
        let bytes = &self.file.data[start..start + region.count as usize];
        let mut cursor = Cursor::new(bytes);
        cursor.set_position(u64::from(field.data));
        tracing::trace!("Reading extended field {} at {}", label, start + field.data as usize);
        Ok(cursor)
    }

    pub fn has_field(&self, label: &str) -> Result<bool> {
        Ok(self.fields()?.contains_key(label))
    }

    pub fn field_type(&self, label: &str) -> Result<Option<FieldType>> {
        Ok(self.field(label)?.map(|f| f.field_type))
    }

    /// Field labels in file order.
    pub fn labels(&self) -> Result<Vec<&'a str>> {
        Ok(self.fields()?.keys().map(String::as_str).collect())
    }

    /// Read an integer field as unsigned, or `default` if it is absent.
    pub fn get_uint(&self, label: &str, default: u64) -> Result<u64> {
        let Some(field) = self.field(label)? else {
            return Ok(default);
        };

        match field.field_type.class() {
            ValueClass::Unsigned(64) => Ok(self.field_data(label, field)?.read_u64::<LittleEndian>()?),
            ValueClass::Signed(64) => Ok(self.field_data(label, field)?.read_i64::<LittleEndian>()? as u64),
            class @ (ValueClass::Unsigned(_) | ValueClass::Signed(_)) => Ok(inline_unsigned(class, field.data)),
            _ => Err(Self::mismatch(label, "an int", field)),
        }
    }

    /// Read an integer field as signed, or `default` if it is absent.
    pub fn get_sint(&self, label: &str, default: i64) -> Result<i64> {
        let Some(field) = self.field(label)? else {
            return Ok(default);
        };

        match field.field_type.class() {
            ValueClass::Unsigned(64) => Ok(self.field_data(label, field)?.read_u64::<LittleEndian>()? as i64),
            ValueClass::Signed(64) => Ok(self.field_data(label, field)?.read_i64::<LittleEndian>()?),
            class @ (ValueClass::Unsigned(_) | ValueClass::Signed(_)) => Ok(inline_signed(class, field.data)),
            _ => Err(Self::mismatch(label, "an int", field)),
        }
    }

    pub fn get_bool(&self, label: &str, default: bool) -> Result<bool> {
        Ok(self.get_uint(label, u64::from(default))? != 0)
    }

    /// Read a string reference, or `default` if it is absent.
    pub fn get_str_ref(&self, label: &str, default: u32) -> Result<u32> {
        Ok(self.get_uint(label, u64::from(default))? as u32)
    }

    pub fn get_double(&self, label: &str, default: f64) -> Result<f64> {
        let Some(field) = self.field(label)? else {
            return Ok(default);
        };

        match field.field_type.class() {
            ValueClass::Float(32) => Ok(f64::from(f32::from_bits(field.data))),
            ValueClass::Float(_) => Ok(self.field_data(label, field)?.read_f64::<LittleEndian>()?),
            _ => Err(Self::mismatch(label, "a double", field)),
        }
    }

    /// Read a text field, or `default` if it is absent.
    ///
    /// Numeric fields are rendered as decimal text.
    pub fn get_string(&self, label: &str, default: &str) -> Result<String> {
        let Some(field) = self.field(label)? else {
            return Ok(default.to_string());
        };

        match field.field_type {
            FieldType::String => {
                let mut cursor = self.field_data(label, field)?;
                let length = cursor.read_u32::<LittleEndian>()? as usize;
                let bytes = read_bytes(&mut cursor, length)?;
                Ok(decode_text(&bytes, self.file.encoding))
            }
            FieldType::ResRef => {
                let mut cursor = self.field_data(label, field)?;
                let length = cursor.read_u8()? as usize;
                let bytes = read_bytes(&mut cursor, length)?;
                Ok(decode_text(&bytes, WINDOWS_1252))
            }
            t if t.is_integer() => match t.class() {
                ValueClass::Signed(_) => Ok(self.get_sint(label, 0)?.to_string()),
                _ => Ok(self.get_uint(label, 0)?.to_string()),
            },
            t if t.is_float() => Ok(self.get_double(label, 0.0)?.to_string()),
            _ => Err(Self::mismatch(label, "a string", field)),
        }
    }

    pub fn get_vector(&self, label: &str, default: Vec3) -> Result<Vec3> {
        let Some(field) = self.field(label)? else {
            return Ok(default);
        };
        if field.field_type != FieldType::Vector {
            return Err(Self::mismatch(label, "a vector", field));
        }

        let mut cursor = self.field_data(label, field)?;
        let x = cursor.read_f32::<LittleEndian>()?;
        let y = cursor.read_f32::<LittleEndian>()?;
        let z = cursor.read_f32::<LittleEndian>()?;
        Ok(Vec3::new(x, y, z))
    }

    pub fn get_orientation(&self, label: &str, default: Vec4) -> Result<Vec4> {
        let Some(field) = self.field(label)? else {
            return Ok(default);
        };
        if field.field_type != FieldType::Orientation {
            return Err(Self::mismatch(label, "an orientation", field));
        }

        let mut cursor = self.field_data(label, field)?;
        let mut values = [0f32; 4];
        cursor.read_f32_into::<LittleEndian>(&mut values)?;
        Ok(Vec4::from_array(values))
    }

    /// Raw bytes of a void field, or `None` if it is absent.
    pub fn get_data(&self, label: &str) -> Result<Option<&'a [u8]>> {
        let Some(field) = self.field(label)? else {
            return Ok(None);
        };
        if field.field_type != FieldType::Void {
            return Err(Self::mismatch(label, "a data", field));
        }

        let mut cursor = self.field_data(label, field)?;
        let length = cursor.read_u32::<LittleEndian>()? as usize;
        let start = cursor.position() as usize;
        let bytes = *cursor.get_ref();
        let end = start + length;
        if end > bytes.len() {
            return Err(Error::GffOutOfBounds {
                what: "void field data",
                index: end as u64,
                limit: bytes.len() as u64,
            });
        }
        Ok(Some(&bytes[start..end]))
    }

    /// Decode a localized string field, or `None` if it is absent.
    pub fn get_loc_string(&self, label: &str, languages: &LanguageConfig) -> Result<Option<LocString>> {
        let Some(field) = self.field(label)? else {
            return Ok(None);
        };
        if field.field_type != FieldType::LocString {
            return Err(Self::mismatch(label, "a localized string", field));
        }

        let mut cursor = self.field_data(label, field)?;
        let mut loc_string = LocString::new();
        loc_string.read_loc_string_with_header(&mut cursor, languages)?;
        Ok(Some(loc_string))
    }

    /// The struct a struct field points to. Absence is an error.
    pub fn get_struct(&self, label: &str) -> Result<Gff4Struct<'a>> {
        let field = self.field(label)?.ok_or_else(|| Error::MissingField {
            label: label.to_string(),
        })?;
        if field.field_type != FieldType::Struct {
            return Err(Self::mismatch(label, "a struct", field));
        }

        self.file.get_struct(field.data as usize).ok_or(Error::GffOutOfBounds {
            what: "struct index",
            index: u64::from(field.data),
            limit: self.file.struct_count() as u64,
        })
    }

    /// The list a list field points to. Absence is an error.
    pub fn get_list(&self, label: &str) -> Result<Gff4List<'a>> {
        let list = self.list_index(label)?;
        Ok(Gff4List {
            file: self.file,
            indices: &self.file.lists[list],
        })
    }

    /// Position of a list field's list in the file's list table.
    pub(crate) fn list_index(&self, label: &str) -> Result<usize> {
        let field = self.field(label)?.ok_or_else(|| Error::MissingField {
            label: label.to_string(),
        })?;
        if field.field_type != FieldType::List {
            return Err(Self::mismatch(label, "a list", field));
        }

        self.file
            .list_offsets
            .get(&(field.data / 4))
            .copied()
            .ok_or(Error::GffOutOfBounds {
                what: "list offset",
                index: u64::from(field.data),
                limit: u64::from(self.file.header.list_indices.count),
            })
    }
}

/// Read a length-prefixed payload, refusing lengths past the end of the region.
fn read_bytes(cursor: &mut Cursor<&[u8]>, length: usize) -> Result<Vec<u8>> {
    let remaining = (cursor.get_ref().len() as u64).saturating_sub(cursor.position());
    if length as u64 > remaining {
        return Err(Error::GffOutOfBounds {
            what: "string length",
            index: length as u64,
            limit: remaining,
        });
    }

    let mut bytes = vec![0u8; length];
    cursor.read_exact(&mut bytes)?;
    Ok(bytes)
}

/// An ordered list of structs inside a [`Gff4File`].
#[derive(Debug, Clone, Copy)]
pub struct Gff4List<'a> {
    file: &'a Gff4File,
    indices: &'a [usize],
}

impl<'a> Gff4List<'a> {
    pub(crate) fn new(file: &'a Gff4File, list: usize) -> Option<Self> {
        let indices = file.lists.get(list)?;
        Some(Self { file, indices })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<Gff4Struct<'a>> {
        self.indices.get(index).map(|&i| Gff4Struct::new(self.file, i))
    }

    pub fn iter(&self) -> impl Iterator<Item = Gff4Struct<'a>> + 'a {
        let file = self.file;
        self.indices.iter().map(move |&i| Gff4Struct::new(file, i))
    }
}

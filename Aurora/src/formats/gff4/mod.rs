//! GFF4 (Generic File Format, version 4) container module
//!
//! A GFF4 file is an offset-indexed graph of structs, each holding labelled
//! fields; struct and list fields link structs together. Layout:
//!
//! ```text
//! magic "GFF " | type ID | version | platform | type version   (20 bytes)
//! (offset, count) x 6: structs, fields, labels,
//!                      field data, field indices, list indices (48 bytes)
//! struct record: id, field index, field count                  (12 bytes)
//! field record:  type, label index, data                       (12 bytes)
//! label record:  NUL-padded ASCII                              (16 bytes)
//! ```
//!
//! Numeric field IDs used by the table and talk table formats are stored
//! as their decimal label text, see [`field_label`].

mod file;
mod json;
mod structs;
mod types;
mod writer;

// Public API
pub use file::{Gff4File, Gff4Header, Region};
pub use structs::{Field, Gff4List, Gff4Struct};
pub use types::{FieldType, ValueClass};
pub use writer::{Gff4WriteStruct, Gff4WriteValue, Gff4Writer};

/// "GFF " signature
pub const GFF_MAGIC: [u8; 4] = *b"GFF ";

pub const VERSION_40: [u8; 4] = *b"V4.0";
pub const VERSION_41: [u8; 4] = *b"V4.1";
pub(crate) const SUPPORTED_VERSIONS: [[u8; 4]; 2] = [VERSION_40, VERSION_41];

/// Little-endian PC platform tag, the only one supported.
pub const PLATFORM_PC: [u8; 4] = *b"PC  ";

/// Header size including the region table.
pub const HEADER_SIZE: u64 = 68;
pub const STRUCT_RECORD_SIZE: u64 = 12;
pub const FIELD_RECORD_SIZE: u64 = 12;
pub const LABEL_SIZE: u64 = 16;

/// Label under which a numeric GFF4 field ID is stored.
#[must_use]
pub fn field_label(id: u32) -> String {
    id.to_string()
}

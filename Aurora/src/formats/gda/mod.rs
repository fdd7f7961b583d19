//! GDA (GFF4-backed two-dimensional array) module
//!
//! A GDA is a GFF4 container of type `G2DA` holding a list of column
//! descriptors and a list of row structs. Columns are identified by the
//! CRC32 of their lowercased UTF-16LE name; cell `i` of a row is stored
//! under field ID `10003 + i`.
//!
//! Several GDA files with the same column layout can be stacked into one
//! table (an "MGDA"), see [`GdaFile::add`].

mod file;

pub use file::{GdaFile, identify_type};

/// GFF4 type ID of a GDA.
pub const GDA_TYPE_ID: [u8; 4] = *b"G2DA";

/// Column descriptor list on the top-level struct.
pub const FIELD_COLUMN_LIST: u32 = 10000;
/// Row list on the top-level struct.
pub const FIELD_ROW_LIST: u32 = 10001;
/// Column name hash inside a column descriptor.
pub const FIELD_COLUMN_HASH: u32 = 10002;
/// Field ID of the first cell in a row.
pub const FIELD_COLUMN_1: u32 = 10003;
/// Optional explicit type tag inside a column descriptor.
pub const FIELD_COLUMN_TYPE: u32 = 10999;

/// Returned by [`GdaFile::find_row`] when no row matches.
pub const INVALID_ROW: usize = usize::MAX;
/// Returned by [`GdaFile::find_column`] when no column matches.
pub const INVALID_COLUMN: usize = usize::MAX;

/// Value kind of a GDA column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GdaColumnType {
    Empty,
    String,
    Int,
    Float,
    Bool,
    Resource,
}

impl GdaColumnType {
    /// Map an explicit type tag (0..=4) to a column type.
    #[must_use]
    pub fn from_tag(tag: u64) -> Option<Self> {
        match tag {
            0 => Some(Self::String),
            1 => Some(Self::Int),
            2 => Some(Self::Float),
            3 => Some(Self::Bool),
            4 => Some(Self::Resource),
            _ => None,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::String => "string",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Resource => "resource",
        }
    }
}

/// One column of a GDA.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GdaHeader {
    pub hash: u32,
    pub column_type: GdaColumnType,
    /// GFF4 field ID the column's cells are stored under.
    pub field: u32,
}

/// Hash a column name the way GDA files store it.
#[must_use]
pub fn column_hash(name: &str) -> u32 {
    crate::formats::common::hash_column_name(name)
}

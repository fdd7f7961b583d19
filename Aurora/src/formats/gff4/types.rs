//! GFF4 field types
//!
//! Every per-type decision (name, inline vs. extended storage, which
//! accessor may read it) is answered here from one table, so the accessors
//! only ever match on [`ValueClass`].

/// Type tag of a GFF4 field record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum FieldType {
    Byte = 0,
    Char = 1,
    Uint16 = 2,
    Sint16 = 3,
    Uint32 = 4,
    Sint32 = 5,
    Uint64 = 6,
    Sint64 = 7,
    Float = 8,
    Double = 9,
    String = 10,
    ResRef = 11,
    LocString = 12,
    Void = 13,
    Struct = 14,
    List = 15,
    Orientation = 16,
    Vector = 17,
    StrRef = 18,
}

/// How a field's value is represented, independent of its exact width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueClass {
    /// Unsigned integer of the given bit width.
    Unsigned(u32),
    /// Signed integer of the given bit width.
    Signed(u32),
    /// IEEE float of the given bit width.
    Float(u32),
    /// Length-prefixed text (`String`: 32-bit length, `ResRef`: 8-bit length).
    Text,
    LocString,
    Blob,
    Struct,
    List,
    Orientation,
    Vector,
}

struct FieldTypeInfo {
    name: &'static str,
    extended: bool,
    class: ValueClass,
}

const FIELD_TYPES: [FieldTypeInfo; 19] = [
    FieldTypeInfo { name: "byte", extended: false, class: ValueClass::Unsigned(8) },
    FieldTypeInfo { name: "char", extended: false, class: ValueClass::Signed(8) },
    FieldTypeInfo { name: "uint16", extended: false, class: ValueClass::Unsigned(16) },
    FieldTypeInfo { name: "sint16", extended: false, class: ValueClass::Signed(16) },
    FieldTypeInfo { name: "uint32", extended: false, class: ValueClass::Unsigned(32) },
    FieldTypeInfo { name: "sint32", extended: false, class: ValueClass::Signed(32) },
    FieldTypeInfo { name: "uint64", extended: true, class: ValueClass::Unsigned(64) },
    FieldTypeInfo { name: "sint64", extended: true, class: ValueClass::Signed(64) },
    FieldTypeInfo { name: "float", extended: false, class: ValueClass::Float(32) },
    FieldTypeInfo { name: "double", extended: true, class: ValueClass::Float(64) },
    FieldTypeInfo { name: "string", extended: true, class: ValueClass::Text },
    FieldTypeInfo { name: "resref", extended: true, class: ValueClass::Text },
    FieldTypeInfo { name: "locstring", extended: true, class: ValueClass::LocString },
    FieldTypeInfo { name: "void", extended: true, class: ValueClass::Blob },
    FieldTypeInfo { name: "struct", extended: false, class: ValueClass::Struct },
    FieldTypeInfo { name: "list", extended: false, class: ValueClass::List },
    FieldTypeInfo { name: "orientation", extended: true, class: ValueClass::Orientation },
    FieldTypeInfo { name: "vector", extended: true, class: ValueClass::Vector },
    FieldTypeInfo { name: "strref", extended: false, class: ValueClass::Unsigned(32) },
];

const ALL_TYPES: [FieldType; 19] = [
    FieldType::Byte,
    FieldType::Char,
    FieldType::Uint16,
    FieldType::Sint16,
    FieldType::Uint32,
    FieldType::Sint32,
    FieldType::Uint64,
    FieldType::Sint64,
    FieldType::Float,
    FieldType::Double,
    FieldType::String,
    FieldType::ResRef,
    FieldType::LocString,
    FieldType::Void,
    FieldType::Struct,
    FieldType::List,
    FieldType::Orientation,
    FieldType::Vector,
    FieldType::StrRef,
];

impl FieldType {
    /// Decode a stored type ID.
    #[must_use]
    pub fn from_u32(value: u32) -> Option<Self> {
        ALL_TYPES.get(value as usize).copied()
    }

    fn info(self) -> &'static FieldTypeInfo {
        &FIELD_TYPES[self as usize]
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        self.info().name
    }

    /// Whether the value lives in the field-data region rather than inline.
    #[must_use]
    pub fn is_extended(self) -> bool {
        self.info().extended
    }

    #[must_use]
    pub fn class(self) -> ValueClass {
        self.info().class
    }

    #[must_use]
    pub fn is_integer(self) -> bool {
        matches!(self.class(), ValueClass::Unsigned(_) | ValueClass::Signed(_))
    }

    #[must_use]
    pub fn is_float(self) -> bool {
        matches!(self.class(), ValueClass::Float(_))
    }
}

/// Reinterpret an inline 32-bit payload as an unsigned value.
///
/// Narrow unsigned types are masked, narrow signed types are sign-extended
/// through their own width first, so `char 0xFF` reads as `u64::MAX`.
#[must_use]
pub(crate) fn inline_unsigned(class: ValueClass, data: u32) -> u64 {
    match class {
        ValueClass::Unsigned(8) => u64::from(data as u8),
        ValueClass::Unsigned(16) => u64::from(data as u16),
        ValueClass::Signed(8) => i64::from(data as u8 as i8) as u64,
        ValueClass::Signed(16) => i64::from(data as u16 as i16) as u64,
        ValueClass::Signed(_) => i64::from(data as i32) as u64,
        _ => u64::from(data),
    }
}

/// Reinterpret an inline 32-bit payload as a signed value.
#[must_use]
pub(crate) fn inline_signed(class: ValueClass, data: u32) -> i64 {
    match class {
        ValueClass::Unsigned(8) => i64::from(data as u8),
        ValueClass::Unsigned(16) => i64::from(data as u16),
        ValueClass::Signed(8) => i64::from(data as u8 as i8),
        ValueClass::Signed(16) => i64::from(data as u16 as i16),
        ValueClass::Signed(_) => i64::from(data as i32),
        _ => i64::from(data),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_matches_discriminants() {
        for (i, field_type) in ALL_TYPES.iter().enumerate() {
            assert_eq!(*field_type as usize, i);
            assert_eq!(FieldType::from_u32(i as u32), Some(*field_type));
        }
        assert_eq!(FieldType::from_u32(19), None);
    }

    #[test]
    fn test_extended_set() {
        let extended: Vec<_> = ALL_TYPES.iter().filter(|t| t.is_extended()).copied().collect();
        assert_eq!(
            extended,
            vec![
                FieldType::Uint64,
                FieldType::Sint64,
                FieldType::Double,
                FieldType::String,
                FieldType::ResRef,
                FieldType::LocString,
                FieldType::Void,
                FieldType::Orientation,
                FieldType::Vector,
            ]
        );
    }

    #[test]
    fn test_inline_masking_and_sign_extension() {
        let uint16 = FieldType::Uint16.class();
        let sint16 = FieldType::Sint16.class();
        let char8 = FieldType::Char.class();

        assert_eq!(inline_unsigned(uint16, 0xFFFF), 65535);
        assert_eq!(inline_unsigned(uint16, 0x1_FFFF), 65535);
        assert_eq!(inline_signed(sint16, 0xFFFF), -1);
        assert_eq!(inline_signed(sint16, 0x7FFF), 32767);
        assert_eq!(inline_signed(char8, 0x80), -128);
        assert_eq!(inline_unsigned(char8, 0xFF), u64::MAX);
        assert_eq!(inline_unsigned(FieldType::Byte.class(), 0x1FF), 0xFF);
        assert_eq!(inline_signed(FieldType::Sint32.class(), 0xFFFF_FFFE), -2);
        assert_eq!(inline_signed(FieldType::Uint32.class(), 0xFFFF_FFFE), 4294967294);
    }
}

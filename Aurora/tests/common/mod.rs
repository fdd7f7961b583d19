//! Fixture builders shared by the integration tests

#![allow(dead_code)]

use aurora::formats::gda::{
    FIELD_COLUMN_1, FIELD_COLUMN_HASH, FIELD_COLUMN_LIST, FIELD_ROW_LIST, GDA_TYPE_ID, column_hash,
};
use aurora::prelude::*;

/// A GDA whose rows hold `(ID, Label)` pairs.
pub fn id_label_gda(rows: &[(u32, &str)]) -> Vec<u8> {
    let columns = ["ID", "Label"]
        .iter()
        .map(|name| Gff4WriteStruct::new(0).with(field_label(FIELD_COLUMN_HASH), Gff4WriteValue::Uint32(column_hash(name))))
        .collect();
    let rows = rows
        .iter()
        .map(|(id, label)| {
            Gff4WriteStruct::new(1)
                .with(field_label(FIELD_COLUMN_1), Gff4WriteValue::Uint32(*id))
                .with(field_label(FIELD_COLUMN_1 + 1), Gff4WriteValue::String((*label).to_string()))
        })
        .collect();

    let top = Gff4WriteStruct::new(0)
        .with(field_label(FIELD_COLUMN_LIST), Gff4WriteValue::List(columns))
        .with(field_label(FIELD_ROW_LIST), Gff4WriteValue::List(rows));
    Gff4Writer::new(GDA_TYPE_ID, *b"V0.1").write(&top).unwrap()
}

/// A V4.0 binary talk table; entry `i` holds `strings[i]` and sound ID `100 + i`.
pub fn v4_tlk(language_id: u32, strings: &[&str]) -> Vec<u8> {
    let table_offset = 24u32;
    let strings_offset = table_offset + 10 * strings.len() as u32;

    let mut data = b"TLK V4.0".to_vec();
    for value in [language_id, strings.len() as u32, table_offset, strings_offset] {
        data.extend_from_slice(&value.to_le_bytes());
    }

    let mut offset = strings_offset;
    for (i, text) in strings.iter().enumerate() {
        data.extend_from_slice(&(100 + i as u32).to_le_bytes());
        data.extend_from_slice(&offset.to_le_bytes());
        data.extend_from_slice(&(text.len() as u16).to_le_bytes());
        offset += text.len() as u32;
    }
    for text in strings {
        data.extend_from_slice(text.as_bytes());
    }
    data
}

/// A V3.0 binary talk table; every entry has text and the given voice-over resref.
pub fn v3_tlk(language_id: u32, entries: &[(&str, &str)]) -> Vec<u8> {
    let strings_offset = 20 + 40 * entries.len() as u32;

    let mut data = b"TLK V3.0".to_vec();
    for value in [language_id, entries.len() as u32, strings_offset] {
        data.extend_from_slice(&value.to_le_bytes());
    }

    let mut offset = 0u32;
    for (text, sound) in entries {
        let mut resref = [0u8; 16];
        resref[..sound.len()].copy_from_slice(sound.as_bytes());

        data.extend_from_slice(&3u32.to_le_bytes()); // text + sound
        data.extend_from_slice(&resref);
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&offset.to_le_bytes());
        data.extend_from_slice(&(text.len() as u32).to_le_bytes());
        data.extend_from_slice(&0f32.to_le_bytes());
        offset += text.len() as u32;
    }
    for (text, _) in entries {
        data.extend_from_slice(text.as_bytes());
    }
    data
}

/// A V0.2 GFF talk table with `(string ID, text)` entries.
pub fn gff_tlk(entries: &[(u32, &str)]) -> Vec<u8> {
    let list = entries
        .iter()
        .map(|(id, text)| {
            Gff4WriteStruct::new(0)
                .with(field_label(19001), Gff4WriteValue::Uint32(*id))
                .with(field_label(19002), Gff4WriteValue::String((*text).to_string()))
        })
        .collect();
    let top = Gff4WriteStruct::new(0).with(field_label(19000), Gff4WriteValue::List(list));
    Gff4Writer::new(*b"TLK ", *b"V0.2").write(&top).unwrap()
}

//! GFF4-backed talk tables (`TLK ` type)
//!
//! The layout depends on the GFF type version:
//! - `V0.2`/`V0.4`: a list of `{string ID, string}` structs
//! - `V0.5`: a list of `{string ID, bit offset}` structs plus one shared
//!   Huffman tree and bit stream on the top-level struct

use super::huffman::decode_huffman;
use super::{SOUND_ID_INVALID, TLK_MAGIC, TalkTable, UNKNOWN_ENCODING_TEXT};
use crate::error::{Error, Result, ResultExt};
use crate::formats::common::tag_to_string;
use crate::formats::gff4::{Gff4File, field_label};
use crate::language::LANGUAGE_INVALID;
use encoding_rs::{Encoding, WINDOWS_1252};
use std::collections::BTreeMap;
use std::sync::OnceLock;

pub const FIELD_TALK_STRING_LIST: u32 = 19000;
pub const FIELD_TALK_STRING_ID: u32 = 19001;
pub const FIELD_TALK_STRING: u32 = 19002;

pub const FIELD_HUFF_STRING_LIST: u32 = 19003;
pub const FIELD_HUFF_TREE: u32 = 19004;
pub const FIELD_HUFF_BIT_STREAM: u32 = 19005;
pub const FIELD_HUFF_STRING_ID: u32 = 19006;
pub const FIELD_HUFF_BIT_OFFSET: u32 = 19007;

const STR_REF_NONE: u64 = 0xFFFF_FFFF;

#[derive(Debug, Clone, Copy)]
enum EntrySource {
    /// Index of the struct holding the string.
    Direct(usize),
    /// Bit offset into the shared Huffman stream.
    Huffman(u32),
}

#[derive(Debug)]
struct GffTlkEntry {
    source: EntrySource,
    text: OnceLock<String>,
}

/// A GFF talk table. Text is decoded on first access.
#[derive(Debug)]
pub struct GffTalkTable {
    gff: Gff4File,
    entries: BTreeMap<u32, GffTlkEntry>,
    huffman_tree: Vec<i32>,
    bit_stream: Vec<u32>,
    encoding: Option<&'static Encoding>,
}

impl GffTalkTable {
    pub fn load(data: Vec<u8>, encoding: Option<&'static Encoding>) -> Result<Self> {
        Self::load_inner(data, encoding).context("Unable to load GFF TLK")
    }

    fn load_inner(data: Vec<u8>, encoding: Option<&'static Encoding>) -> Result<Self> {
        let gff = Gff4File::load_with_encoding(data, TLK_MAGIC, encoding.unwrap_or(WINDOWS_1252))?;

        let mut table = Self {
            gff,
            entries: BTreeMap::new(),
            huffman_tree: Vec::new(),
            bit_stream: Vec::new(),
            encoding,
        };

        match &table.gff.type_version() {
            b"V0.2" | b"V0.4" => table.load_direct()?,
            b"V0.5" => table.load_huffman()?,
            other => return Err(Error::UnsupportedGffTlkVersion(tag_to_string(*other))),
        }

        tracing::debug!(
            "Loaded GFF TLK {}: {} entries",
            tag_to_string(table.gff.type_version()),
            table.entries.len()
        );
        Ok(table)
    }

    fn load_direct(&mut self) -> Result<()> {
        let top = self.gff.top_level();
        let id_label = field_label(FIELD_TALK_STRING_ID);

        for string in top.get_list(&field_label(FIELD_TALK_STRING_LIST))?.iter() {
            let str_ref = string.get_uint(&id_label, STR_REF_NONE)?;
            if str_ref == STR_REF_NONE {
                continue;
            }
            // First occurrence wins
            self.entries.entry(str_ref as u32).or_insert(GffTlkEntry {
                source: EntrySource::Direct(string.index()),
                text: OnceLock::new(),
            });
        }
        Ok(())
    }

    fn load_huffman(&mut self) -> Result<()> {
        let top = self.gff.top_level();

        let tree = top.get_data(&field_label(FIELD_HUFF_TREE))?.unwrap_or_default();
        let bits = top.get_data(&field_label(FIELD_HUFF_BIT_STREAM))?.unwrap_or_default();
        let huffman_tree = tree
            .chunks_exact(4)
            .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        let bit_stream = bits
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        let id_label = field_label(FIELD_HUFF_STRING_ID);
        let offset_label = field_label(FIELD_HUFF_BIT_OFFSET);

        let mut entries = BTreeMap::new();
        for string in top.get_list(&field_label(FIELD_HUFF_STRING_LIST))?.iter() {
            let str_ref = string.get_uint(&id_label, STR_REF_NONE)?;
            if str_ref == STR_REF_NONE {
                continue;
            }
            let offset = string.get_uint(&offset_label, 0)? as u32;
            entries.entry(str_ref as u32).or_insert(GffTlkEntry {
                source: EntrySource::Huffman(offset),
                text: OnceLock::new(),
            });
        }

        self.huffman_tree = huffman_tree;
        self.bit_stream = bit_stream;
        self.entries = entries;
        Ok(())
    }

    /// Whether strings are Huffman-coded (`V0.5`).
    #[must_use]
    pub fn is_compressed(&self) -> bool {
        !self.entries.is_empty()
            && self
                .entries
                .values()
                .all(|e| matches!(e.source, EntrySource::Huffman(_)))
    }

    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    fn read_text(&self, entry: &GffTlkEntry) -> String {
        match entry.source {
            EntrySource::Huffman(offset) => decode_huffman(&self.huffman_tree, &self.bit_stream, offset),
            EntrySource::Direct(index) => {
                if self.encoding.is_none() {
                    return UNKNOWN_ENCODING_TEXT.to_string();
                }
                let Some(string) = self.gff.get_struct(index) else {
                    return String::new();
                };
                string
                    .get_string(&field_label(FIELD_TALK_STRING), "")
                    .unwrap_or_else(|e| {
                        tracing::warn!("Failed reading GFF TLK string: {}", e);
                        String::new()
                    })
            }
        }
    }
}

impl TalkTable for GffTalkTable {
    fn has_entry(&self, str_ref: u32) -> bool {
        self.entries.contains_key(&str_ref)
    }

    fn get_string(&self, str_ref: u32) -> &str {
        match self.entries.get(&str_ref) {
            Some(entry) => entry.text.get_or_init(|| self.read_text(entry)),
            None => "",
        }
    }

    fn get_sound_res_ref(&self, _str_ref: u32) -> &str {
        ""
    }

    fn get_sound_id(&self, _str_ref: u32) -> u32 {
        SOUND_ID_INVALID
    }

    fn language_id(&self) -> u32 {
        LANGUAGE_INVALID
    }

    fn str_refs(&self) -> Vec<u32> {
        self.entries.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::gff4::{Gff4WriteStruct, Gff4WriteValue as V, Gff4Writer};
    use crate::formats::tlk::huffman::leaf;
    use pretty_assertions::assert_eq;

    fn direct(version: &[u8; 4], strings: &[(Option<u32>, &str)]) -> Vec<u8> {
        let list = strings
            .iter()
            .map(|(id, text)| {
                let mut s = Gff4WriteStruct::new(0);
                if let Some(id) = id {
                    s.push(field_label(FIELD_TALK_STRING_ID), V::Uint32(*id));
                }
                s.push(field_label(FIELD_TALK_STRING), V::String((*text).to_string()));
                s
            })
            .collect();
        let top = Gff4WriteStruct::new(0).with(field_label(FIELD_TALK_STRING_LIST), V::List(list));
        Gff4Writer::new(TLK_MAGIC, *version).write(&top).unwrap()
    }

    fn words<T: Copy>(values: &[T], to_bytes: fn(T) -> [u8; 4]) -> Vec<u8> {
        values.iter().flat_map(|&v| to_bytes(v)).collect()
    }

    fn huffman(strings: &[(u32, u32)]) -> Vec<u8> {
        // 00 'a', 01 'b', 10 'c', 11 end
        let tree = [
            leaf(u16::from(b'a')),
            leaf(u16::from(b'b')),
            leaf(u16::from(b'c')),
            leaf(0),
            0,
            1,
        ];
        let bits = [0b11_0010u32, 0b11_0110];

        let list = strings
            .iter()
            .map(|&(id, offset)| {
                Gff4WriteStruct::new(0)
                    .with(field_label(FIELD_HUFF_STRING_ID), V::Uint32(id))
                    .with(field_label(FIELD_HUFF_BIT_OFFSET), V::Uint32(offset))
            })
            .collect();
        let top = Gff4WriteStruct::new(0)
            .with(field_label(FIELD_HUFF_STRING_LIST), V::List(list))
            .with(field_label(FIELD_HUFF_TREE), V::Void(words(&tree, i32::to_le_bytes)))
            .with(field_label(FIELD_HUFF_BIT_STREAM), V::Void(words(&bits, u32::to_le_bytes)));
        Gff4Writer::new(TLK_MAGIC, *b"V0.5").write(&top).unwrap()
    }

    #[test]
    fn test_direct_strings() {
        let data = direct(b"V0.2", &[(Some(5), "five"), (Some(1), "one")]);
        let table = GffTalkTable::load(data, Some(WINDOWS_1252)).unwrap();

        assert_eq!(table.get_string(5), "five");
        assert_eq!(table.get_string(1), "one");
        assert_eq!(table.get_string(2), "");
        assert_eq!(table.str_refs(), vec![1, 5]);
        assert!(!table.is_compressed());
        assert_eq!(table.language_id(), LANGUAGE_INVALID);
        assert_eq!(table.get_sound_id(5), SOUND_ID_INVALID);
    }

    #[test]
    fn test_duplicates_keep_first_and_missing_ids_skipped() {
        let data = direct(b"V0.4", &[(Some(3), "first"), (None, "orphan"), (Some(3), "second")]);
        let table = GffTalkTable::load(data, Some(WINDOWS_1252)).unwrap();

        assert_eq!(table.entry_count(), 1);
        assert_eq!(table.get_string(3), "first");
    }

    #[test]
    fn test_direct_without_encoding() {
        let table = GffTalkTable::load(direct(b"V0.2", &[(Some(0), "x")]), None).unwrap();
        assert_eq!(table.get_string(0), "[???]");
    }

    #[test]
    fn test_huffman_strings() {
        let table = GffTalkTable::load(huffman(&[(10, 0), (11, 30)]), None).unwrap();

        assert!(table.is_compressed());
        assert_eq!(table.get_string(10), "ba");
        assert_eq!(table.get_string(11), "abc");
        assert_eq!(table.get_string(12), "");
    }

    #[test]
    fn test_unsupported_version() {
        let err = GffTalkTable::load(direct(b"V0.3", &[]), None).unwrap_err();
        assert!(matches!(err.root_cause(), Error::UnsupportedGffTlkVersion(_)));
        assert!(err.to_string().starts_with("Unable to load GFF TLK"));
    }
}

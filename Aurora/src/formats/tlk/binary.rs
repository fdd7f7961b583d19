//! Binary `TLK ` talk tables
//!
//! ```text
//! V3.0: magic, version, language, count, strings offset       (20 bytes)
//!       entry: flags, sound resref[16], volume variance,
//!              pitch variance, offset, length, sound length   (40 bytes)
//! V4.0: magic, version, language, count, table offset,
//!       strings offset                                        (24 bytes)
//!       entry: sound ID, offset, length:u16                   (10 bytes)
//! ```
//!
//! V3 text offsets are relative to the strings offset, V4 offsets are
//! absolute.

use super::{
    FLAG_SOUNDLENGTH_PRESENT, FLAG_TEXT_PRESENT, SOUND_ID_INVALID, TLK_MAGIC, TLK_VERSION_3,
    TLK_VERSION_4, TalkTable, UNKNOWN_ENCODING_TEXT,
};
use crate::error::{Error, Result};
use crate::formats::common::{decode_text, preparse_color_codes, read_fixed_string, tag_to_string};
use byteorder::{LittleEndian, ReadBytesExt};
use encoding_rs::Encoding;
use std::io::{Cursor, Read};
use std::sync::OnceLock;

const V3_HEADER_SIZE: u64 = 20;
const V3_ENTRY_SIZE: u64 = 40;
const V4_ENTRY_SIZE: u64 = 10;

#[derive(Debug)]
struct TlkEntry {
    flags: u32,
    sound_res_ref: String,
    volume_variance: u32,
    pitch_variance: u32,
    /// Absolute offset of the text.
    offset: u32,
    length: u32,
    sound_length: f32,
    sound_id: u32,
    text: OnceLock<String>,
}

/// A binary talk table. Entry text is decoded on first access.
#[derive(Debug)]
pub struct TlkFile {
    data: Vec<u8>,
    version: [u8; 4],
    language_id: u32,
    entries: Vec<TlkEntry>,
    encoding: Option<&'static Encoding>,
}

impl TlkFile {
    pub fn load(data: Vec<u8>, encoding: Option<&'static Encoding>) -> Result<Self> {
        let mut cursor = Cursor::new(data.as_slice());

        let mut magic = [0u8; 4];
        cursor.read_exact(&mut magic)?;
        if magic != TLK_MAGIC {
            return Err(Error::InvalidTlkMagic(magic));
        }

        let mut version = [0u8; 4];
        cursor.read_exact(&mut version)?;

        let language_id = cursor.read_u32::<LittleEndian>()?;
        let count = cursor.read_u32::<LittleEndian>()?;

        let (table_offset, entry_size) = match version {
            TLK_VERSION_3 => (V3_HEADER_SIZE, V3_ENTRY_SIZE),
            TLK_VERSION_4 => {
                let table_offset = cursor.read_u32::<LittleEndian>()?;
                (u64::from(table_offset), V4_ENTRY_SIZE)
            }
            other => return Err(Error::UnsupportedTlkVersion(tag_to_string(other))),
        };
        let strings_offset = cursor.read_u32::<LittleEndian>()?;

        let table_end = table_offset + u64::from(count) * entry_size;
        if table_end > data.len() as u64 {
            return Err(Error::Io(std::io::ErrorKind::UnexpectedEof.into()));
        }

        cursor.set_position(table_offset);
        let mut entries = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let entry = if version == TLK_VERSION_3 {
                read_v3_entry(&mut cursor, strings_offset)?
            } else {
                read_v4_entry(&mut cursor)?
            };
            entries.push(entry);
        }

        if encoding.is_none() {
            tracing::warn!("No encoding for TLK language {}, text will not be decoded", language_id);
        }
        tracing::debug!(
            "Loaded TLK {}: language {}, {} entries",
            tag_to_string(version),
            language_id,
            entries.len()
        );

        Ok(Self {
            data,
            version,
            language_id,
            entries,
            encoding,
        })
    }

    #[must_use]
    pub fn version(&self) -> [u8; 4] {
        self.version
    }

    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Voice-over length in seconds, if the entry records one.
    #[must_use]
    pub fn get_sound_length(&self, str_ref: u32) -> Option<f32> {
        self.entries
            .get(str_ref as usize)
            .filter(|e| e.flags & FLAG_SOUNDLENGTH_PRESENT != 0)
            .map(|e| e.sound_length)
    }

    /// Volume and pitch variance of a V3 entry.
    #[must_use]
    pub fn get_variance(&self, str_ref: u32) -> Option<(u32, u32)> {
        self.entries
            .get(str_ref as usize)
            .map(|e| (e.volume_variance, e.pitch_variance))
    }

    fn read_text(&self, entry: &TlkEntry) -> String {
        if entry.length == 0 || entry.flags & FLAG_TEXT_PRESENT == 0 {
            return String::new();
        }

        let start = entry.offset as usize;
        if start >= self.data.len() {
            tracing::warn!("TLK text offset {} past end of file ({})", start, self.data.len());
            return String::new();
        }
        // Truncated files still yield what is there
        let end = start + (entry.length as usize).min(self.data.len() - start);

        let Some(encoding) = self.encoding else {
            return UNKNOWN_ENCODING_TEXT.to_string();
        };

        let parsed = preparse_color_codes(&self.data[start..end]);
        decode_text(&parsed, encoding)
    }
}

fn read_v3_entry(cursor: &mut Cursor<&[u8]>, strings_offset: u32) -> Result<TlkEntry> {
    let flags = cursor.read_u32::<LittleEndian>()?;
    let sound_res_ref = read_fixed_string(cursor, 16)?;
    let volume_variance = cursor.read_u32::<LittleEndian>()?;
    let pitch_variance = cursor.read_u32::<LittleEndian>()?;
    let offset = cursor.read_u32::<LittleEndian>()?.wrapping_add(strings_offset);
    let length = cursor.read_u32::<LittleEndian>()?;
    let sound_length = cursor.read_f32::<LittleEndian>()?;

    Ok(TlkEntry {
        flags,
        sound_res_ref,
        volume_variance,
        pitch_variance,
        offset,
        length,
        sound_length,
        sound_id: SOUND_ID_INVALID,
        text: OnceLock::new(),
    })
}

fn read_v4_entry(cursor: &mut Cursor<&[u8]>) -> Result<TlkEntry> {
    let sound_id = cursor.read_u32::<LittleEndian>()?;
    let offset = cursor.read_u32::<LittleEndian>()?;
    let length = u32::from(cursor.read_u16::<LittleEndian>()?);

    Ok(TlkEntry {
        flags: FLAG_TEXT_PRESENT,
        sound_res_ref: String::new(),
        volume_variance: 0,
        pitch_variance: 0,
        offset,
        length,
        sound_length: -1.0,
        sound_id,
        text: OnceLock::new(),
    })
}

impl TalkTable for TlkFile {
    fn has_entry(&self, str_ref: u32) -> bool {
        (str_ref as usize) < self.entries.len()
    }

    fn get_string(&self, str_ref: u32) -> &str {
        match self.entries.get(str_ref as usize) {
            Some(entry) => entry.text.get_or_init(|| self.read_text(entry)),
            None => "",
        }
    }

    fn get_sound_res_ref(&self, str_ref: u32) -> &str {
        self.entries
            .get(str_ref as usize)
            .map_or("", |e| e.sound_res_ref.as_str())
    }

    fn get_sound_id(&self, str_ref: u32) -> u32 {
        self.entries
            .get(str_ref as usize)
            .map_or(SOUND_ID_INVALID, |e| e.sound_id)
    }

    fn language_id(&self) -> u32 {
        self.language_id
    }

    fn str_refs(&self) -> Vec<u32> {
        (0..self.entries.len() as u32).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::tlk::{FLAG_SOUND_PRESENT, load_talk_table};
    use encoding_rs::WINDOWS_1252;
    use pretty_assertions::assert_eq;

    /// Header + one entry + "Hello" with voice-over "vo_hello".
    fn v3() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"TLK V3.0");
        data.extend_from_slice(&1u32.to_le_bytes()); // language
        data.extend_from_slice(&1u32.to_le_bytes()); // count
        data.extend_from_slice(&60u32.to_le_bytes()); // strings offset
        data.extend_from_slice(&(FLAG_TEXT_PRESENT | FLAG_SOUND_PRESENT | FLAG_SOUNDLENGTH_PRESENT).to_le_bytes());
        data.extend_from_slice(b"vo_hello\0\0\0\0\0\0\0\0");
        data.extend_from_slice(&3u32.to_le_bytes()); // volume variance
        data.extend_from_slice(&4u32.to_le_bytes()); // pitch variance
        data.extend_from_slice(&0u32.to_le_bytes()); // offset
        data.extend_from_slice(&5u32.to_le_bytes()); // length
        data.extend_from_slice(&2.5f32.to_le_bytes());
        assert_eq!(data.len(), 60);
        data.extend_from_slice(b"Hello");
        data
    }

    /// Header + one entry + "Bonjour" with sound ID 77.
    fn v4() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"TLK V4.0");
        data.extend_from_slice(&2u32.to_le_bytes()); // language
        data.extend_from_slice(&1u32.to_le_bytes()); // count
        data.extend_from_slice(&24u32.to_le_bytes()); // table offset
        data.extend_from_slice(&34u32.to_le_bytes()); // strings offset
        data.extend_from_slice(&77u32.to_le_bytes()); // sound ID
        data.extend_from_slice(&34u32.to_le_bytes()); // absolute offset
        data.extend_from_slice(&7u16.to_le_bytes()); // length
        assert_eq!(data.len(), 34);
        data.extend_from_slice(b"Bonjour");
        data
    }

    #[test]
    fn test_v3_entry() {
        let tlk = TlkFile::load(v3(), Some(WINDOWS_1252)).unwrap();
        assert_eq!(tlk.version(), *b"V3.0");
        assert_eq!(tlk.language_id(), 1);
        assert_eq!(tlk.get_string(0), "Hello");
        assert_eq!(tlk.get_sound_res_ref(0), "vo_hello");
        assert_eq!(tlk.get_sound_id(0), SOUND_ID_INVALID);
        assert_eq!(tlk.get_sound_length(0), Some(2.5));
        assert_eq!(tlk.get_variance(0), Some((3, 4)));
    }

    #[test]
    fn test_v4_entry() {
        let tlk = TlkFile::load(v4(), Some(WINDOWS_1252)).unwrap();
        assert_eq!(tlk.language_id(), 2);
        assert_eq!(tlk.get_string(0), "Bonjour");
        assert_eq!(tlk.get_sound_res_ref(0), "");
        assert_eq!(tlk.get_sound_id(0), 77);
        assert_eq!(tlk.get_sound_length(0), None);
    }

    #[test]
    fn test_missing_entry() {
        let tlk = TlkFile::load(v3(), Some(WINDOWS_1252)).unwrap();
        assert!(tlk.has_entry(0));
        assert!(!tlk.has_entry(1));
        assert_eq!(tlk.get_string(1), "");
        assert_eq!(tlk.get_sound_res_ref(1), "");
        assert_eq!(tlk.get_sound_id(1), SOUND_ID_INVALID);
        assert_eq!(tlk.str_refs(), vec![0]);
    }

    #[test]
    fn test_text_flag_unset() {
        let mut data = v3();
        data[20..24].copy_from_slice(&FLAG_SOUND_PRESENT.to_le_bytes());
        let tlk = TlkFile::load(data, Some(WINDOWS_1252)).unwrap();
        assert_eq!(tlk.get_string(0), "");
        assert_eq!(tlk.get_sound_res_ref(0), "vo_hello");
    }

    #[test]
    fn test_truncated_text_clamped() {
        let mut data = v4();
        data.truncate(data.len() - 3);
        let tlk = TlkFile::load(data, Some(WINDOWS_1252)).unwrap();
        assert_eq!(tlk.get_string(0), "Bonj");
    }

    #[test]
    fn test_no_encoding_placeholder() {
        let tlk = TlkFile::load(v4(), None).unwrap();
        assert_eq!(tlk.get_string(0), "[???]");
    }

    #[test]
    fn test_color_codes_expanded() {
        let mut data = v4();
        data.truncate(34);
        let text = b"<c\xff\x80\x00>Hi</c>";
        data[32..34].copy_from_slice(&(text.len() as u16).to_le_bytes());
        data.extend_from_slice(text);
        let tlk = TlkFile::load(data, Some(WINDOWS_1252)).unwrap();
        assert_eq!(tlk.get_string(0), "<cFF8000FF>Hi</c>");
    }

    #[test]
    fn test_rejects_bad_header() {
        let mut data = v3();
        data[4..8].copy_from_slice(b"V2.0");
        assert!(matches!(TlkFile::load(data, None), Err(Error::UnsupportedTlkVersion(_))));

        let mut data = v3();
        data[12..16].copy_from_slice(&1000u32.to_le_bytes());
        assert!(matches!(TlkFile::load(data, None), Err(Error::Io(_))));
    }

    #[test]
    fn test_factory_dispatch() {
        let table = load_talk_table(v4(), Some(WINDOWS_1252)).unwrap();
        assert_eq!(table.get_string(0), "Bonjour");
    }
}

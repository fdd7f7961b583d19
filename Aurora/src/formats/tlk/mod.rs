//! Talk tables: string reference -> localized text and voice-over
//!
//! Two storage formats exist:
//! - the flat binary `TLK ` format, versions `V3.0` and `V4.0` ([`TlkFile`])
//! - a GFF4 container of type `TLK `, with either plain or Huffman-coded
//!   strings ([`GffTalkTable`])
//!
//! [`load_talk_table`] picks the right one from the leading magic.

mod binary;
mod gff;
mod huffman;

pub use binary::TlkFile;
pub use gff::GffTalkTable;
pub use huffman::decode_huffman;

use crate::error::{Error, Result};
use crate::formats::gff4::GFF_MAGIC;
use crate::language::LANGUAGE_INVALID;
use encoding_rs::Encoding;
use std::fmt::Debug;

/// Binary talk table signature, also the GFF4 type ID of GFF talk tables.
pub const TLK_MAGIC: [u8; 4] = *b"TLK ";
pub const TLK_VERSION_3: [u8; 4] = *b"V3.0";
pub const TLK_VERSION_4: [u8; 4] = *b"V4.0";

/// Returned by [`TalkTable::get_sound_id`] for entries without a sound.
pub const SOUND_ID_INVALID: u32 = 0xFFFF_FFFF;

/// Entry flag: the entry has text.
pub const FLAG_TEXT_PRESENT: u32 = 0x0001;
/// Entry flag: the entry has a voice-over resource.
pub const FLAG_SOUND_PRESENT: u32 = 0x0002;
/// Entry flag: the entry has a sound length.
pub const FLAG_SOUNDLENGTH_PRESENT: u32 = 0x0004;

/// Placeholder text for entries whose language has no known encoding.
pub const UNKNOWN_ENCODING_TEXT: &str = "[???]";

/// A loaded talk table.
///
/// Lookups of string references the table does not contain are not errors:
/// they yield an empty string or [`SOUND_ID_INVALID`].
pub trait TalkTable: Debug + Send + Sync {
    fn has_entry(&self, str_ref: u32) -> bool;

    /// Text of an entry, decoded on first access.
    fn get_string(&self, str_ref: u32) -> &str;

    fn get_sound_res_ref(&self, str_ref: u32) -> &str;

    fn get_sound_id(&self, str_ref: u32) -> u32;

    /// Language ID from the file header, or [`LANGUAGE_INVALID`].
    fn language_id(&self) -> u32;

    /// Every string reference present, ascending.
    fn str_refs(&self) -> Vec<u32>;
}

/// Load a binary or GFF talk table.
///
/// `encoding` is the text encoding of the table's language; `None` makes
/// all non-Huffman text read as [`UNKNOWN_ENCODING_TEXT`].
pub fn load_talk_table(data: Vec<u8>, encoding: Option<&'static Encoding>) -> Result<Box<dyn TalkTable>> {
    let magic: [u8; 4] = data
        .get(0..4)
        .and_then(|m| m.try_into().ok())
        .ok_or_else(|| Error::Io(std::io::ErrorKind::UnexpectedEof.into()))?;

    match magic {
        TLK_MAGIC => Ok(Box::new(TlkFile::load(data, encoding)?)),
        GFF_MAGIC => Ok(Box::new(GffTalkTable::load(data, encoding)?)),
        other => Err(Error::InvalidTlkMagic(other)),
    }
}

/// Peek at the language ID of talk table data without loading it.
///
/// Only binary talk tables carry one; anything else yields [`LANGUAGE_INVALID`].
#[must_use]
pub fn talk_table_language_id(data: &[u8]) -> u32 {
    if data.len() < 12 || data[0..4] != TLK_MAGIC {
        return LANGUAGE_INVALID;
    }
    u32::from_le_bytes([data[8], data[9], data[10], data[11]])
}

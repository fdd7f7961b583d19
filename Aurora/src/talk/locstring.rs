//! Localized strings stored inline in game objects

use super::{STR_REF_INVALID, TalkManager};
use crate::error::Result;
use crate::formats::common::decode_text;
use crate::formats::tlk::UNKNOWN_ENCODING_TEXT;
use crate::language::{Gender, LANGUAGE_INVALID, Language, LanguageConfig, swap_gender};
use byteorder::{LittleEndian, ReadBytesExt};
use std::collections::BTreeMap;
use std::io::{self, Read};

/// An object's localized text: substrings keyed by gendered language ID,
/// plus an optional string reference into the talk tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocString {
    id: u32,
    strings: BTreeMap<u32, String>,
}

impl Default for LocString {
    fn default() -> Self {
        Self::new()
    }
}

impl LocString {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: STR_REF_INVALID,
            strings: BTreeMap::new(),
        }
    }

    /// A localized string that only refers to a talk table entry.
    #[must_use]
    pub fn with_id(id: u32) -> Self {
        Self {
            id,
            strings: BTreeMap::new(),
        }
    }

    /// The string reference, or [`STR_REF_INVALID`].
    #[must_use]
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn set_id(&mut self, id: u32) {
        self.id = id;
    }

    /// No inline strings and no string reference.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.id == STR_REF_INVALID && self.strings.is_empty()
    }

    #[must_use]
    pub fn string_count(&self) -> usize {
        self.strings.len()
    }

    #[must_use]
    pub fn has_string(&self, gendered_id: u32) -> bool {
        self.strings.contains_key(&gendered_id)
    }

    #[must_use]
    pub fn get_string_by_id(&self, gendered_id: u32) -> Option<&str> {
        self.strings.get(&gendered_id).map(String::as_str)
    }

    pub fn set_string(&mut self, gendered_id: u32, text: impl Into<String>) {
        self.strings.insert(gendered_id, text.into());
    }

    /// Inline strings, ordered by gendered language ID.
    pub fn strings(&self) -> impl Iterator<Item = (u32, &str)> {
        self.strings.iter().map(|(id, text)| (*id, text.as_str()))
    }

    /// The inline string with the lowest gendered ID, or `""`.
    #[must_use]
    pub fn get_first_string(&self) -> &str {
        self.strings.values().next().map_or("", String::as_str)
    }

    /// The talk table text for the string reference in the current gender.
    #[must_use]
    pub fn get_str_ref_string<'a>(&'a self, talk: &'a TalkManager) -> &'a str {
        talk.get_string(self.id, talk.languages().current_gender)
    }

    /// The text for the talk manager's current language and gender.
    #[must_use]
    pub fn get_string<'a>(&'a self, talk: &'a TalkManager) -> &'a str {
        let languages = talk.languages();
        self.get_string_for(talk, languages.current_language, languages.current_gender)
    }

    /// The text for a given language and gender.
    ///
    /// Tries, in order: the exact inline string, the inline string of the
    /// other gender, the talk table entry, the first inline string.
    #[must_use]
    pub fn get_string_for<'a>(&'a self, talk: &'a TalkManager, language: Language, gender: Gender) -> &'a str {
        let gendered_id = talk.languages().gendered_id(language, gender);
        if gendered_id != LANGUAGE_INVALID {
            if let Some(text) = self.strings.get(&gendered_id) {
                return text;
            }
            if let Some(text) = self.strings.get(&swap_gender(gendered_id)) {
                return text;
            }
        }

        if self.id != STR_REF_INVALID {
            let text = talk.get_string(self.id, gender);
            if !text.is_empty() {
                return text;
            }
        }

        self.get_first_string()
    }

    /// Read a length-prefixed string for `gendered_id`.
    pub fn read_string<R: Read>(&mut self, gendered_id: u32, reader: &mut R, languages: &LanguageConfig) -> Result<()> {
        let length = u64::from(reader.read_u32::<LittleEndian>()?);
        // Buffer grows with the bytes actually present
        let mut bytes = Vec::new();
        reader.by_ref().take(length).read_to_end(&mut bytes)?;
        if (bytes.len() as u64) < length {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("Localized string claims {} bytes, found {}", length, bytes.len()),
            )
            .into());
        }

        let text = match languages.loc_string_encoding(gendered_id) {
            Some(encoding) => decode_text(&bytes, encoding),
            None => {
                tracing::warn!("No encoding for localized string language {}", gendered_id);
                UNKNOWN_ENCODING_TEXT.to_string()
            }
        };
        self.strings.insert(gendered_id, text);
        Ok(())
    }

    /// Read one `(gendered ID, length, bytes)` substring.
    pub fn read_loc_sub_string<R: Read>(&mut self, reader: &mut R, languages: &LanguageConfig) -> Result<()> {
        let gendered_id = reader.read_u32::<LittleEndian>()?;
        self.read_string(gendered_id, reader, languages)
    }

    /// Read `count` substrings and set the string reference.
    pub fn read_loc_string<R: Read>(
        &mut self,
        reader: &mut R,
        id: u32,
        count: u32,
        languages: &LanguageConfig,
    ) -> Result<()> {
        self.id = id;
        for _ in 0..count {
            self.read_loc_sub_string(reader, languages)?;
        }
        Ok(())
    }

    /// Read a full localized string: total size, string reference, count, substrings.
    pub fn read_loc_string_with_header<R: Read>(&mut self, reader: &mut R, languages: &LanguageConfig) -> Result<()> {
        let _total_size = reader.read_u32::<LittleEndian>()?;
        let id = reader.read_u32::<LittleEndian>()?;
        let count = reader.read_u32::<LittleEndian>()?;
        self.read_loc_string(reader, id, count, languages)
    }
}

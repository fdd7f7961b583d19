//! Language table and locale configuration
//!
//! Text in Aurora files carries no encoding marker. Which codepage applies
//! depends on the language a talk table or localized substring belongs to,
//! so every decoder consults a [`LanguageConfig`].
//!
//! Localized substrings are keyed by a *gendered* language ID:
//! `language_id * 2 + gender`.

use crate::error::{Error, Result};
use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Language ID meaning "none" or "unknown".
pub const LANGUAGE_INVALID: u32 = 0xFFFF_FFFF;

/// Languages the Aurora games shipped in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    English,
    French,
    German,
    Italian,
    Spanish,
    Polish,
    Korean,
    ChineseTraditional,
    ChineseSimplified,
    Japanese,
}

/// Grammatical gender of the player character, used for gendered text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Gender {
    #[default]
    Male = 0,
    Female = 1,
}

impl Gender {
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Gender::Male => Gender::Female,
            Gender::Female => Gender::Male,
        }
    }
}

/// One row of the language table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageEntry {
    pub language: Language,
    /// Numeric ID as stored in TLK headers.
    pub id: u32,
    /// Encoding label for talk table text (`encoding_rs` label).
    #[serde(default)]
    pub encoding: Option<String>,
    /// Encoding label for inline localized strings, if different.
    #[serde(default)]
    pub loc_string_encoding: Option<String>,
}

impl LanguageEntry {
    fn new(language: Language, id: u32, encoding: &str) -> Self {
        Self {
            language,
            id,
            encoding: Some(encoding.to_string()),
            loc_string_encoding: None,
        }
    }
}

/// The language table plus the current locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageConfig {
    pub languages: Vec<LanguageEntry>,
    #[serde(default)]
    pub current_language: Language,
    #[serde(default)]
    pub current_gender: Gender,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self::aurora_default()
    }
}

impl LanguageConfig {
    /// The language table used by the retail Aurora games.
    #[must_use]
    pub fn aurora_default() -> Self {
        Self {
            languages: vec![
                LanguageEntry::new(Language::English, 0, "windows-1252"),
                LanguageEntry::new(Language::French, 1, "windows-1252"),
                LanguageEntry::new(Language::German, 2, "windows-1252"),
                LanguageEntry::new(Language::Italian, 3, "windows-1252"),
                LanguageEntry::new(Language::Spanish, 4, "windows-1252"),
                LanguageEntry::new(Language::Polish, 5, "windows-1250"),
                LanguageEntry::new(Language::Korean, 128, "euc-kr"),
                LanguageEntry::new(Language::ChineseTraditional, 129, "big5"),
                LanguageEntry::new(Language::ChineseSimplified, 130, "gbk"),
                LanguageEntry::new(Language::Japanese, 131, "shift_jis"),
            ],
            current_language: Language::English,
            current_gender: Gender::Male,
        }
    }

    /// Parse and validate a configuration from JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Check for duplicate IDs and unknown encoding labels.
    pub fn validate(&self) -> Result<()> {
        let mut ids = HashSet::new();
        for entry in &self.languages {
            if !ids.insert(entry.id) {
                return Err(Error::InvalidLanguageConfig(format!(
                    "duplicate language id {}",
                    entry.id
                )));
            }

            for label in [&entry.encoding, &entry.loc_string_encoding].into_iter().flatten() {
                if Encoding::for_label(label.as_bytes()).is_none() {
                    return Err(Error::InvalidLanguageConfig(format!(
                        "unknown encoding \"{label}\" for {:?}",
                        entry.language
                    )));
                }
            }
        }

        if self.entry(self.current_language).is_none() {
            return Err(Error::InvalidLanguageConfig(format!(
                "current language {:?} is not in the language table",
                self.current_language
            )));
        }

        Ok(())
    }

    fn entry(&self, language: Language) -> Option<&LanguageEntry> {
        self.languages.iter().find(|e| e.language == language)
    }

    fn entry_by_id(&self, id: u32) -> Option<&LanguageEntry> {
        self.languages.iter().find(|e| e.id == id)
    }

    /// Numeric language ID, or [`LANGUAGE_INVALID`].
    #[must_use]
    pub fn language_id(&self, language: Language) -> u32 {
        self.entry(language).map_or(LANGUAGE_INVALID, |e| e.id)
    }

    #[must_use]
    pub fn language_for_id(&self, id: u32) -> Option<Language> {
        self.entry_by_id(id).map(|e| e.language)
    }

    /// Gendered language ID used to key localized substrings.
    #[must_use]
    pub fn gendered_id(&self, language: Language, gender: Gender) -> u32 {
        match self.entry(language) {
            Some(entry) => entry.id * 2 + gender as u32,
            None => LANGUAGE_INVALID,
        }
    }

    /// Gendered ID for the current locale.
    #[must_use]
    pub fn current_gendered_id(&self) -> u32 {
        self.gendered_id(self.current_language, self.current_gender)
    }

    #[must_use]
    pub fn language_for_gendered_id(&self, gendered_id: u32) -> Option<Language> {
        if gendered_id == LANGUAGE_INVALID {
            return None;
        }
        self.language_for_id(gendered_id >> 1)
    }

    /// Talk table encoding for a language, if one is configured.
    #[must_use]
    pub fn encoding(&self, language: Language) -> Option<&'static Encoding> {
        self.entry(language)
            .and_then(|e| e.encoding.as_deref())
            .and_then(|label| Encoding::for_label(label.as_bytes()))
    }

    /// Talk table encoding for a numeric language ID.
    #[must_use]
    pub fn encoding_for_id(&self, id: u32) -> Option<&'static Encoding> {
        self.language_for_id(id).and_then(|language| self.encoding(language))
    }

    /// Encoding for a talk table whose header names `language_id`.
    ///
    /// Tables without a language ID use the current language's encoding.
    #[must_use]
    pub fn talk_table_encoding(&self, language_id: u32) -> Option<&'static Encoding> {
        if language_id == LANGUAGE_INVALID {
            self.encoding(self.current_language)
        } else {
            self.encoding_for_id(language_id)
        }
    }

    /// Encoding for inline localized substrings of a gendered language ID.
    ///
    /// Falls back to the talk table encoding when no separate one is set.
    #[must_use]
    pub fn loc_string_encoding(&self, gendered_id: u32) -> Option<&'static Encoding> {
        let entry = self
            .language_for_gendered_id(gendered_id)
            .and_then(|language| self.entry(language))?;

        entry
            .loc_string_encoding
            .as_deref()
            .or(entry.encoding.as_deref())
            .and_then(|label| Encoding::for_label(label.as_bytes()))
    }
}

/// Flip the gender bit of a gendered language ID.
#[must_use]
pub fn swap_gender(gendered_id: u32) -> u32 {
    gendered_id ^ 1
}

//! Priority-ordered talk table stack

use super::{STR_REF_ALT_MASK, STR_REF_INDEX_MASK, STR_REF_INVALID};
use crate::error::{Error, Result};
use crate::formats::tlk::{SOUND_ID_INVALID, TalkTable, load_talk_table, talk_table_language_id};
use crate::language::{Gender, LanguageConfig};
use crate::resource::{FileType, ResourceProvider};

#[derive(Debug)]
struct TableRecord {
    male: Option<Box<dyn TalkTable>>,
    female: Option<Box<dyn TalkTable>>,
    priority: u32,
    id: u32,
}

impl TableRecord {
    /// The table answering `index` for `gender`: the female table if it
    /// has the entry, otherwise the male one.
    fn find(&self, index: u32, gender: Gender) -> Option<&dyn TalkTable> {
        if gender == Gender::Female
            && let Some(female) = self.female.as_deref()
            && female.has_entry(index)
        {
            return Some(female);
        }

        self.male.as_deref().filter(|male| male.has_entry(index))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HandleData {
    id: u32,
    is_alt: bool,
}

/// Removal handle returned by [`TalkManager::add_table`].
///
/// Removing through a handle empties it; removing with an empty handle
/// does nothing.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TableHandle(Option<HandleData>);

impl TableHandle {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }
}

/// Resolves string references against stacks of talk tables.
///
/// There are two stacks, main and alternate. References with a non-zero
/// high byte look in the alternate stack first and fall back to the main
/// one. Within a stack the table with the highest priority wins; among
/// equal priorities the most recently added one does.
#[derive(Debug)]
pub struct TalkManager {
    languages: LanguageConfig,
    main: Vec<TableRecord>,
    alt: Vec<TableRecord>,
    next_id: u32,
}

impl TalkManager {
    #[must_use]
    pub fn new(languages: LanguageConfig) -> Self {
        Self {
            languages,
            main: Vec::new(),
            alt: Vec::new(),
            next_id: 0,
        }
    }

    #[must_use]
    pub fn languages(&self) -> &LanguageConfig {
        &self.languages
    }

    pub fn languages_mut(&mut self) -> &mut LanguageConfig {
        &mut self.languages
    }

    /// Drop every table.
    pub fn clear(&mut self) {
        self.main.clear();
        self.alt.clear();
    }

    /// Number of loaded table pairs (main, alternate).
    #[must_use]
    pub fn table_count(&self) -> (usize, usize) {
        (self.main.len(), self.alt.len())
    }

    /// Load and add a male/female talk table pair by resource name.
    ///
    /// Either name may be empty or missing from `resources`, but not both.
    pub fn add_table(
        &mut self,
        resources: &dyn ResourceProvider,
        male: &str,
        female: &str,
        is_alt: bool,
        priority: u32,
    ) -> Result<TableHandle> {
        let male_table = self.load_table(resources, male)?;
        let female_table = self.load_table(resources, female)?;

        if male_table.is_none() && female_table.is_none() {
            return Err(Error::NoSuchTalkTable {
                male: male.to_string(),
                female: female.to_string(),
            });
        }

        tracing::debug!(
            "Adding talk table \"{}\"/\"{}\" (alt: {}, priority: {})",
            male,
            female,
            is_alt,
            priority
        );
        self.add_tables(male_table, female_table, is_alt, priority)
    }

    /// Add an already loaded male/female table pair.
    pub fn add_tables(
        &mut self,
        male: Option<Box<dyn TalkTable>>,
        female: Option<Box<dyn TalkTable>>,
        is_alt: bool,
        priority: u32,
    ) -> Result<TableHandle> {
        if male.is_none() && female.is_none() {
            return Err(Error::NoSuchTalkTable {
                male: String::new(),
                female: String::new(),
            });
        }

        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);

        let tables = if is_alt { &mut self.alt } else { &mut self.main };
        tables.push(TableRecord {
            male,
            female,
            priority,
            id,
        });
        // Stable, so equal priorities keep insertion order
        tables.sort_by_key(|record| record.priority);

        Ok(TableHandle(Some(HandleData { id, is_alt })))
    }

    /// Remove the pair a handle refers to and empty the handle.
    pub fn remove_table(&mut self, handle: &mut TableHandle) {
        let Some(data) = handle.0.take() else {
            return;
        };

        let tables = if data.is_alt { &mut self.alt } else { &mut self.main };
        tables.retain(|record| record.id != data.id);
    }

    fn load_table(&self, resources: &dyn ResourceProvider, name: &str) -> Result<Option<Box<dyn TalkTable>>> {
        if name.is_empty() {
            return Ok(None);
        }
        let Some(data) = resources.get_resource(name, FileType::Tlk) else {
            tracing::debug!("Talk table \"{}\" not found", name);
            return Ok(None);
        };

        let encoding = self.languages.talk_table_encoding(talk_table_language_id(&data));
        load_talk_table(data, encoding).map(Some)
    }

    /// The table holding a string reference, and the table-local index.
    fn find(&self, str_ref: u32, gender: Gender) -> Option<(&dyn TalkTable, u32)> {
        if str_ref == STR_REF_INVALID {
            return None;
        }

        let is_alt = str_ref & STR_REF_ALT_MASK != 0;
        let index = str_ref & STR_REF_INDEX_MASK;

        let table = if is_alt {
            search(&self.alt, index, gender).or_else(|| search(&self.main, index, gender))
        } else {
            search(&self.main, index, gender)
        };
        table.map(|t| (t, index))
    }

    /// Text for a string reference, or `""` if no table has it.
    #[must_use]
    pub fn get_string(&self, str_ref: u32, gender: Gender) -> &str {
        self.find(str_ref, gender)
            .map_or("", |(table, index)| table.get_string(index))
    }

    #[must_use]
    pub fn get_sound_res_ref(&self, str_ref: u32, gender: Gender) -> &str {
        self.find(str_ref, gender)
            .map_or("", |(table, index)| table.get_sound_res_ref(index))
    }

    #[must_use]
    pub fn get_sound_id(&self, str_ref: u32, gender: Gender) -> u32 {
        self.find(str_ref, gender)
            .map_or(SOUND_ID_INVALID, |(table, index)| table.get_sound_id(index))
    }
}

/// Highest priority first.
fn search(tables: &[TableRecord], index: u32, gender: Gender) -> Option<&dyn TalkTable> {
    tables.iter().rev().find_map(|record| record.find(index, gender))
}

impl Default for TalkManager {
    fn default() -> Self {
        Self::new(LanguageConfig::aurora_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::MemoryResources;
    use std::collections::BTreeMap;

    #[derive(Debug)]
    struct FixedTable(BTreeMap<u32, String>);

    impl FixedTable {
        fn boxed(entries: &[(u32, &str)]) -> Option<Box<dyn TalkTable>> {
            Some(Box::new(Self(
                entries.iter().map(|(k, v)| (*k, (*v).to_string())).collect(),
            )))
        }
    }

    impl TalkTable for FixedTable {
        fn has_entry(&self, str_ref: u32) -> bool {
            self.0.contains_key(&str_ref)
        }
        fn get_string(&self, str_ref: u32) -> &str {
            self.0.get(&str_ref).map_or("", String::as_str)
        }
        fn get_sound_res_ref(&self, _str_ref: u32) -> &str {
            ""
        }
        fn get_sound_id(&self, str_ref: u32) -> u32 {
            if self.has_entry(str_ref) { str_ref + 1000 } else { SOUND_ID_INVALID }
        }
        fn language_id(&self) -> u32 {
            0
        }
        fn str_refs(&self) -> Vec<u32> {
            self.0.keys().copied().collect()
        }
    }

    const ALT: u32 = 0x0100_0000;

    #[test]
    fn test_higher_priority_wins() {
        let mut tm = TalkManager::default();
        tm.add_tables(FixedTable::boxed(&[(1, "high")]), None, false, 10).unwrap();
        tm.add_tables(FixedTable::boxed(&[(1, "low"), (2, "only low")]), None, false, 1).unwrap();

        assert_eq!(tm.get_string(1, Gender::Male), "high");
        assert_eq!(tm.get_string(2, Gender::Male), "only low");
        assert_eq!(tm.get_string(3, Gender::Male), "");
    }

    #[test]
    fn test_equal_priority_latest_wins() {
        let mut tm = TalkManager::default();
        tm.add_tables(FixedTable::boxed(&[(1, "first")]), None, false, 5).unwrap();
        tm.add_tables(FixedTable::boxed(&[(1, "second")]), None, false, 5).unwrap();
        assert_eq!(tm.get_string(1, Gender::Male), "second");
    }

    #[test]
    fn test_alt_preferred_then_main() {
        let mut tm = TalkManager::default();
        tm.add_tables(FixedTable::boxed(&[(1, "main"), (2, "main two")]), None, false, 0).unwrap();
        tm.add_tables(FixedTable::boxed(&[(1, "alt")]), None, true, 0).unwrap();

        assert_eq!(tm.get_string(ALT | 1, Gender::Male), "alt");
        assert_eq!(tm.get_string(1, Gender::Male), "main");
        assert_eq!(tm.get_string(ALT | 2, Gender::Male), "main two");
    }

    #[test]
    fn test_main_never_falls_back_to_alt() {
        let mut tm = TalkManager::default();
        tm.add_tables(FixedTable::boxed(&[(7, "alt only")]), None, true, 0).unwrap();
        assert_eq!(tm.get_string(7, Gender::Male), "");
        assert_eq!(tm.get_string(ALT | 7, Gender::Male), "alt only");
    }

    #[test]
    fn test_female_falls_back_to_male_within_record() {
        let mut tm = TalkManager::default();
        tm.add_tables(
            FixedTable::boxed(&[(1, "he"), (2, "male two")]),
            FixedTable::boxed(&[(1, "she")]),
            false,
            0,
        )
        .unwrap();

        assert_eq!(tm.get_string(1, Gender::Male), "he");
        assert_eq!(tm.get_string(1, Gender::Female), "she");
        assert_eq!(tm.get_string(2, Gender::Female), "male two");
    }

    #[test]
    fn test_invalid_str_ref() {
        let mut tm = TalkManager::default();
        tm.add_tables(FixedTable::boxed(&[(STR_REF_INDEX_MASK, "x")]), None, true, 0).unwrap();
        assert_eq!(tm.get_string(STR_REF_INVALID, Gender::Male), "");
        assert_eq!(tm.get_sound_id(STR_REF_INVALID, Gender::Male), SOUND_ID_INVALID);
    }

    #[test]
    fn test_sound_lookups() {
        let mut tm = TalkManager::default();
        tm.add_tables(FixedTable::boxed(&[(4, "x")]), None, false, 0).unwrap();
        assert_eq!(tm.get_sound_id(4, Gender::Male), 1004);
        assert_eq!(tm.get_sound_id(5, Gender::Male), SOUND_ID_INVALID);
        assert_eq!(tm.get_sound_res_ref(4, Gender::Male), "");
    }

    #[test]
    fn test_remove_table() {
        let mut tm = TalkManager::default();
        tm.add_tables(FixedTable::boxed(&[(1, "base")]), None, false, 0).unwrap();
        let mut handle = tm.add_tables(FixedTable::boxed(&[(1, "patch")]), None, false, 1).unwrap();
        assert_eq!(tm.get_string(1, Gender::Male), "patch");

        tm.remove_table(&mut handle);
        assert!(handle.is_empty());
        assert_eq!(tm.get_string(1, Gender::Male), "base");

        // Second removal is a no-op
        tm.remove_table(&mut handle);
        assert_eq!(tm.table_count(), (1, 0));

        tm.clear();
        assert_eq!(tm.get_string(1, Gender::Male), "");
    }

    #[test]
    fn test_add_table_requires_one_table() {
        let mut tm = TalkManager::default();
        let resources = MemoryResources::new();
        assert!(matches!(
            tm.add_table(&resources, "missing", "", false, 0),
            Err(Error::NoSuchTalkTable { .. })
        ));
        assert!(tm.add_tables(None, None, false, 0).is_err());
    }

    #[test]
    fn test_add_table_from_resources() {
        let mut data = b"TLK V4.0".to_vec();
        for v in [0u32, 1, 24, 34, 9] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        data.extend_from_slice(&34u32.to_le_bytes());
        data.extend_from_slice(&2u16.to_le_bytes());
        data.extend_from_slice(b"Hi");

        let mut resources = MemoryResources::new();
        resources.insert("dialog", FileType::Tlk, data);

        let mut tm = TalkManager::default();
        let handle = tm.add_table(&resources, "dialog", "dialog_f", false, 0).unwrap();
        assert!(!handle.is_empty());
        assert_eq!(tm.get_string(0, Gender::Female), "Hi");
        assert_eq!(tm.get_sound_id(0, Gender::Male), 9);
    }
}

//! CLI commands for talk tables

use std::path::Path;

use anyhow::Context;

use crate::formats::tlk::{SOUND_ID_INVALID, TalkTable, load_talk_table, talk_table_language_id};

use super::load_languages;

fn open(path: &Path, language_config: Option<&Path>) -> anyhow::Result<Box<dyn TalkTable>> {
    let languages = load_languages(language_config)?;
    let data = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

    let encoding = languages.talk_table_encoding(talk_table_language_id(&data));
    load_talk_table(data, encoding).with_context(|| format!("Failed to load talk table {}", path.display()))
}

/// Print one entry
pub fn get(path: &Path, str_ref: u32, language_config: Option<&Path>) -> anyhow::Result<()> {
    let table = open(path, language_config)?;

    if !table.has_entry(str_ref) {
        println!("No entry {str_ref}");
        return Ok(());
    }

    println!("Text:  {}", table.get_string(str_ref));
    let sound = table.get_sound_res_ref(str_ref);
    if !sound.is_empty() {
        println!("Sound: {sound}");
    }
    let sound_id = table.get_sound_id(str_ref);
    if sound_id != SOUND_ID_INVALID {
        println!("Sound ID: {sound_id}");
    }

    Ok(())
}

/// List entries
pub fn list(path: &Path, limit: Option<usize>, language_config: Option<&Path>) -> anyhow::Result<()> {
    let table = open(path, language_config)?;
    let str_refs = table.str_refs();

    println!("{} entries (language {})", str_refs.len(), table.language_id());
    for str_ref in str_refs.iter().take(limit.unwrap_or(usize::MAX)) {
        println!("{:8}  {}", str_ref, table.get_string(*str_ref));
    }

    Ok(())
}

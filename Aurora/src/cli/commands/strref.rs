//! CLI command resolving a string reference through a talk manager

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::formats::tlk::SOUND_ID_INVALID;
use crate::language::Gender;
use crate::resource::DirectoryResources;
use crate::talk::TalkManager;

use super::load_languages;

pub fn execute(
    str_ref: u32,
    dirs: &[PathBuf],
    table: &str,
    female: Option<&str>,
    alt: Option<&str>,
    female_gender: bool,
    language_config: Option<&Path>,
) -> anyhow::Result<()> {
    let mut resources = DirectoryResources::new();
    for dir in dirs {
        let count = resources
            .add_directory(dir)
            .with_context(|| format!("Failed to index {}", dir.display()))?;
        tracing::info!("Indexed {} resources in {}", count, dir.display());
    }

    let mut talk = TalkManager::new(load_languages(language_config)?);
    talk.add_table(&resources, table, female.unwrap_or(""), false, 0)
        .with_context(|| format!("Failed to load talk table '{table}'"))?;
    if let Some(alt) = alt {
        talk.add_table(&resources, alt, "", true, 0)
            .with_context(|| format!("Failed to load alternate talk table '{alt}'"))?;
    }

    let gender = if female_gender { Gender::Female } else { Gender::Male };
    let text = talk.get_string(str_ref, gender);
    if text.is_empty() {
        println!("No string for {str_ref}");
        return Ok(());
    }

    println!("{text}");
    let sound = talk.get_sound_res_ref(str_ref, gender);
    if !sound.is_empty() {
        println!("Sound: {sound}");
    }
    let sound_id = talk.get_sound_id(str_ref, gender);
    if sound_id != SOUND_ID_INVALID {
        println!("Sound ID: {sound_id}");
    }

    Ok(())
}

//! CLI commands for GFF4 files

use std::path::Path;

use anyhow::{Context, bail};
use serde_json::json;

use crate::formats::common::tag_to_string;
use crate::formats::gff4::Gff4File;
use crate::language::LanguageConfig;

/// Parse a type ID given on the command line, space-padding short tags.
pub(crate) fn parse_tag(tag: &str) -> anyhow::Result<[u8; 4]> {
    let bytes = tag.as_bytes();
    if bytes.is_empty() || bytes.len() > 4 {
        bail!("Type ID must be 1 to 4 characters, got '{tag}'");
    }

    let mut padded = *b"    ";
    padded[..bytes.len()].copy_from_slice(bytes);
    Ok(padded)
}

/// Print a GFF4 file as JSON
pub fn dump(path: &Path, type_id: Option<&str>) -> anyhow::Result<()> {
    let data = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

    let expected: [u8; 4] = match type_id {
        Some(tag) => parse_tag(tag)?,
        None => data
            .get(4..8)
            .and_then(|t| t.try_into().ok())
            .context("File is too short for a GFF4 header")?,
    };

    let gff = Gff4File::load(data, expected)
        .with_context(|| format!("Failed to load GFF4 file {}", path.display()))?;
    let root = gff.top_level().to_json(&LanguageConfig::aurora_default())?;

    let output = json!({
        "type": tag_to_string(gff.type_id()),
        "version": tag_to_string(gff.version()),
        "type_version": tag_to_string(gff.type_version()),
        "structs": gff.struct_count(),
        "root": root,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

//! CLI commands for GDA tables

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};

use crate::formats::gda::{GdaFile, INVALID_COLUMN, INVALID_ROW};
use crate::formats::gff4::field_label;

/// Load and merge GDA files, base first
fn load_table(files: &[PathBuf]) -> anyhow::Result<GdaFile> {
    let Some((base, rest)) = files.split_first() else {
        bail!("No GDA files given");
    };

    let mut table = GdaFile::load(read(base)?).with_context(|| base.display().to_string())?;
    for path in rest {
        table.add(read(path)?).with_context(|| path.display().to_string())?;
    }
    Ok(table)
}

fn read(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Show columns and row count
pub fn info(files: &[PathBuf]) -> anyhow::Result<()> {
    let table = load_table(files)?;

    println!("Files:   {}", table.file_count());
    println!("Rows:    {}", table.row_count());
    println!("Columns: {}", table.column_count());
    for (index, header) in table.headers().iter().enumerate() {
        println!(
            "  {:3}  {:08x}  {:<8}  field {}",
            index,
            header.hash,
            header.column_type.name(),
            header.field
        );
    }

    Ok(())
}

/// Print one row, either every column (by hash) or the named ones
pub fn row(files: &[PathBuf], row: usize, columns: &[String]) -> anyhow::Result<()> {
    let table = load_table(files)?;
    if !table.has_row(row) {
        bail!("Row {} out of range (table has {} rows)", row, table.row_count());
    }

    if columns.is_empty() {
        for header in table.headers() {
            let value = table.get_string_by_hash(row, header.hash, "")?;
            println!("{:08x} = {}", header.hash, value);
        }
        return Ok(());
    }

    for name in columns {
        if table.find_column(name) == INVALID_COLUMN {
            println!("{name} = <no such column>");
            continue;
        }
        println!("{} = {}", name, table.get_string(row, name, "")?);
    }

    Ok(())
}

/// Find the global row index for an ID
pub fn find(files: &[PathBuf], id: u64) -> anyhow::Result<()> {
    let table = load_table(files)?;

    match table.find_row(id)? {
        INVALID_ROW => println!("No row with ID {id}"),
        row => {
            println!("Row {row}");
            if let Some(row_struct) = table.get_row(row) {
                tracing::debug!("Row struct {} has {} fields", row_struct.index(), row_struct.field_count());
                for header in table.headers() {
                    let value = row_struct.get_string(&field_label(header.field), "")?;
                    println!("  {:08x} = {}", header.hash, value);
                }
            }
        }
    }

    Ok(())
}

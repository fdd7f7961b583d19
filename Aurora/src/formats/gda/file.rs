//! Loading and querying (merged) GDA tables

use super::{
    FIELD_COLUMN_1, FIELD_COLUMN_HASH, FIELD_COLUMN_LIST, FIELD_COLUMN_TYPE, FIELD_ROW_LIST,
    GDA_TYPE_ID, GdaColumnType, GdaHeader, INVALID_COLUMN, INVALID_ROW, column_hash,
};
use crate::error::{Error, Result, ResultExt};
use crate::formats::gff4::{FieldType, Gff4File, Gff4List, Gff4Struct, field_label};
use std::collections::HashMap;
use std::sync::RwLock;

/// A virtual table over one or more GDA files sharing a column layout.
///
/// The column layout comes from the first file; every file added later
/// must match it column for column. Rows are numbered globally across
/// files in the order they were added.
#[derive(Debug)]
pub struct GdaFile {
    files: Vec<Gff4File>,
    headers: Vec<GdaHeader>,
    /// Global index of the first row of each file.
    row_starts: Vec<usize>,
    row_counts: Vec<usize>,
    row_count: usize,
    /// Position of each file's row list in that file's list table.
    row_lists: Vec<usize>,
    /// Row field label of each column.
    column_labels: Vec<String>,
    hash_to_column: HashMap<u32, usize>,
    name_to_column: RwLock<HashMap<String, usize>>,
}

fn row_list(gff: &Gff4File) -> Result<Gff4List<'_>> {
    gff.top_level().get_list(&field_label(FIELD_ROW_LIST))
}

fn row_list_index(gff: &Gff4File) -> Result<usize> {
    gff.top_level().list_index(&field_label(FIELD_ROW_LIST))
}

fn column_list(gff: &Gff4File) -> Result<Gff4List<'_>> {
    gff.top_level().get_list(&field_label(FIELD_COLUMN_LIST))
}

/// Determine a column's type.
///
/// An explicit type tag on the column descriptor wins. Without one, the
/// type is inferred from the field type of the column's cell in the first
/// row, and an empty table yields [`GdaColumnType::Empty`].
pub fn identify_type(column: Gff4Struct<'_>, rows: Gff4List<'_>, index: usize) -> Result<GdaColumnType> {
    let type_label = field_label(FIELD_COLUMN_TYPE);
    if column.has_field(&type_label)? {
        let tag = column.get_uint(&type_label, 0)?;
        return GdaColumnType::from_tag(tag).ok_or(Error::InvalidGdaColumnType(tag));
    }

    let Some(first) = rows.get(0) else {
        return Ok(GdaColumnType::Empty);
    };

    let field = FIELD_COLUMN_1 + index as u32;
    let column_type = match first.field_type(&field_label(field))? {
        Some(FieldType::String | FieldType::ResRef) => GdaColumnType::String,
        Some(t) if t.is_integer() => GdaColumnType::Int,
        Some(t) if t.is_float() => GdaColumnType::Float,
        _ => GdaColumnType::Empty,
    };
    Ok(column_type)
}

fn read_headers(gff: &Gff4File) -> Result<Vec<GdaHeader>> {
    let columns = column_list(gff)?;
    let rows = row_list(gff)?;
    let hash_label = field_label(FIELD_COLUMN_HASH);

    let mut headers = Vec::with_capacity(columns.len());
    for (index, column) in columns.iter().enumerate() {
        headers.push(GdaHeader {
            hash: column.get_uint(&hash_label, 0)? as u32,
            column_type: identify_type(column, rows, index)?,
            field: FIELD_COLUMN_1 + index as u32,
        });
    }
    Ok(headers)
}

impl GdaFile {
    /// Load a table from its first GDA file.
    pub fn load(data: Vec<u8>) -> Result<Self> {
        Self::load_inner(data).context("Failed reading GDA file")
    }

    fn load_inner(data: Vec<u8>) -> Result<Self> {
        let gff = Gff4File::load(data, GDA_TYPE_ID)?;
        let headers = read_headers(&gff)?;
        let rows = row_list(&gff)?.len();
        let rows_at = row_list_index(&gff)?;

        // The first column with a given hash wins
        let mut hash_to_column = HashMap::with_capacity(headers.len());
        for (index, header) in headers.iter().enumerate() {
            hash_to_column.entry(header.hash).or_insert(index);
        }
        let column_labels = headers.iter().map(|header| field_label(header.field)).collect();

        tracing::debug!("Loaded GDA: {} columns, {} rows", headers.len(), rows);

        Ok(Self {
            files: vec![gff],
            headers,
            row_starts: vec![0],
            row_counts: vec![rows],
            row_count: rows,
            row_lists: vec![rows_at],
            column_labels,
            hash_to_column,
            name_to_column: RwLock::new(HashMap::new()),
        })
    }

    /// Append the rows of another GDA file with the same column layout.
    ///
    /// On mismatch the table is left exactly as it was.
    pub fn add(&mut self, data: Vec<u8>) -> Result<()> {
        self.add_inner(data).context("Failed adding GDA file")
    }

    fn add_inner(&mut self, data: Vec<u8>) -> Result<()> {
        let gff = Gff4File::load(data, GDA_TYPE_ID)?;
        let headers = read_headers(&gff)?;

        if headers.len() != self.headers.len() {
            return Err(Error::GdaColumnMismatch {
                reason: format!(
                    "column count differs ({} != {})",
                    headers.len(),
                    self.headers.len()
                ),
            });
        }

        for (index, (ours, theirs)) in self.headers.iter().zip(&headers).enumerate() {
            if ours.hash != theirs.hash {
                return Err(Error::GdaColumnMismatch {
                    reason: format!(
                        "column {index} hash differs ({:08x} != {:08x})",
                        theirs.hash, ours.hash
                    ),
                });
            }
            if ours.column_type != theirs.column_type {
                return Err(Error::GdaColumnMismatch {
                    reason: format!(
                        "column {index} type differs ({} != {})",
                        theirs.column_type.name(),
                        ours.column_type.name()
                    ),
                });
            }
        }

        let rows = row_list(&gff)?.len();
        let rows_at = row_list_index(&gff)?;
        tracing::debug!("Added GDA: {} rows (starting at {})", rows, self.row_count);

        self.row_starts.push(self.row_count);
        self.row_counts.push(rows);
        self.row_count += rows;
        self.row_lists.push(rows_at);
        self.files.push(gff);
        Ok(())
    }

    /// Number of GDA files stacked into this table.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    #[must_use]
    pub fn headers(&self) -> &[GdaHeader] {
        &self.headers
    }

    #[must_use]
    pub fn has_row(&self, row: usize) -> bool {
        self.get_row(row).is_some()
    }

    /// The row struct for a global row index, or `None` past the end.
    #[must_use]
    pub fn get_row(&self, row: usize) -> Option<Gff4Struct<'_>> {
        let file = self.row_starts.iter().rposition(|&start| start <= row)?;
        let local = row - self.row_starts[file];
        if local >= self.row_counts[file] {
            return None;
        }

        self.files[file].list(self.row_lists[file])?.get(local)
    }

    #[must_use]
    pub fn find_column_by_hash(&self, hash: u32) -> usize {
        self.hash_to_column.get(&hash).copied().unwrap_or(INVALID_COLUMN)
    }

    /// Column index for a column name, or [`INVALID_COLUMN`].
    #[must_use]
    pub fn find_column(&self, name: &str) -> usize {
        if let Ok(cache) = self.name_to_column.read()
            && let Some(&column) = cache.get(name)
        {
            return column;
        }

        let column = self.find_column_by_hash(column_hash(name));
        if let Ok(mut cache) = self.name_to_column.write() {
            cache.insert(name.to_string(), column);
        }
        column
    }

    /// Global index of the first row whose `ID` column equals `id`.
    ///
    /// Scans every row; returns [`INVALID_ROW`] if nothing matches or the
    /// table has no `ID` column.
    pub fn find_row(&self, id: u64) -> Result<usize> {
        let column = self.find_column("ID");
        if column == INVALID_COLUMN {
            return Ok(INVALID_ROW);
        }

        let label = &self.column_labels[column];
        for row in 0..self.row_count {
            let Some(row_struct) = self.get_row(row) else {
                continue;
            };
            if row_struct.has_field(label)? && row_struct.get_uint(label, 0)? == id {
                return Ok(row);
            }
        }

        Ok(INVALID_ROW)
    }

    fn cell(&self, row: usize, column: usize) -> Option<(Gff4Struct<'_>, &str)> {
        let label = self.column_labels.get(column)?;
        let row = self.get_row(row)?;
        Some((row, label))
    }

    pub fn get_string(&self, row: usize, column: &str, default: &str) -> Result<String> {
        self.get_string_at(row, self.find_column(column), default)
    }

    pub fn get_string_by_hash(&self, row: usize, hash: u32, default: &str) -> Result<String> {
        self.get_string_at(row, self.find_column_by_hash(hash), default)
    }

    fn get_string_at(&self, row: usize, column: usize, default: &str) -> Result<String> {
        match self.cell(row, column) {
            Some((row, label)) => row.get_string(label, default),
            None => Ok(default.to_string()),
        }
    }

    pub fn get_int(&self, row: usize, column: &str, default: i64) -> Result<i64> {
        self.get_int_at(row, self.find_column(column), default)
    }

    pub fn get_int_by_hash(&self, row: usize, hash: u32, default: i64) -> Result<i64> {
        self.get_int_at(row, self.find_column_by_hash(hash), default)
    }

    fn get_int_at(&self, row: usize, column: usize, default: i64) -> Result<i64> {
        match self.cell(row, column) {
            Some((row, label)) => row.get_sint(label, default),
            None => Ok(default),
        }
    }

    pub fn get_float(&self, row: usize, column: &str, default: f64) -> Result<f64> {
        self.get_float_at(row, self.find_column(column), default)
    }

    pub fn get_float_by_hash(&self, row: usize, hash: u32, default: f64) -> Result<f64> {
        self.get_float_at(row, self.find_column_by_hash(hash), default)
    }

    fn get_float_at(&self, row: usize, column: usize, default: f64) -> Result<f64> {
        match self.cell(row, column) {
            Some((row, label)) => row.get_double(label, default),
            None => Ok(default),
        }
    }

    pub fn get_bool(&self, row: usize, column: &str, default: bool) -> Result<bool> {
        self.get_bool_at(row, self.find_column(column), default)
    }

    pub fn get_bool_by_hash(&self, row: usize, hash: u32, default: bool) -> Result<bool> {
        self.get_bool_at(row, self.find_column_by_hash(hash), default)
    }

    fn get_bool_at(&self, row: usize, column: usize, default: bool) -> Result<bool> {
        match self.cell(row, column) {
            Some((row, label)) => row.get_bool(label, default),
            None => Ok(default),
        }
    }
}

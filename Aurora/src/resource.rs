//! Resource lookup by logical name
//!
//! Loaders never open files themselves; they ask a [`ResourceProvider`] for
//! the bytes of `name` of a given [`FileType`]. Game archives plug in here.

use crate::error::Result;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Resource types this crate knows how to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    /// Talk table (binary TLK or GFF TLK).
    Tlk,
    /// GFF4 table.
    Gda,
    /// Generic GFF container.
    Gff,
}

impl FileType {
    /// The canonical file extension, without the dot.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            FileType::Tlk => "tlk",
            FileType::Gda => "gda",
            FileType::Gff => "gff",
        }
    }

    /// Identify a type from an extension (case-insensitive).
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "tlk" => Some(FileType::Tlk),
            "gda" => Some(FileType::Gda),
            "gff" => Some(FileType::Gff),
            _ => None,
        }
    }
}

/// Supplies raw resource bytes by name and type.
pub trait ResourceProvider {
    /// Fetch a resource, or `None` if it does not exist.
    fn get_resource(&self, name: &str, file_type: FileType) -> Option<Vec<u8>>;
}

fn resource_key(name: &str, file_type: FileType) -> (String, FileType) {
    (name.to_ascii_lowercase(), file_type)
}

/// Resources held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryResources {
    entries: HashMap<(String, FileType), Vec<u8>>,
}

impl MemoryResources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a resource.
    pub fn insert(&mut self, name: &str, file_type: FileType, data: Vec<u8>) {
        self.entries.insert(resource_key(name, file_type), data);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ResourceProvider for MemoryResources {
    fn get_resource(&self, name: &str, file_type: FileType) -> Option<Vec<u8>> {
        self.entries.get(&resource_key(name, file_type)).cloned()
    }
}

/// Resources found on disk under one or more directories.
///
/// Names are matched case-insensitively. A directory added later overrides
/// same-named resources from earlier ones.
#[derive(Debug, Clone, Default)]
pub struct DirectoryResources {
    index: HashMap<(String, FileType), PathBuf>,
}

impl DirectoryResources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every known resource below `dir`. Returns how many were found.
    pub fn add_directory<P: AsRef<Path>>(&mut self, dir: P) -> Result<usize> {
        let mut count = 0;
        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let (Some(stem), Some(ext)) = (
                path.file_stem().and_then(|s| s.to_str()),
                path.extension().and_then(|s| s.to_str()),
            ) else {
                continue;
            };
            let Some(file_type) = FileType::from_extension(ext) else {
                continue;
            };

            self.index.insert(resource_key(stem, file_type), path.to_path_buf());
            count += 1;
        }

        tracing::debug!("Indexed {} resources under {}", count, dir.as_ref().display());
        Ok(count)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

impl ResourceProvider for DirectoryResources {
    fn get_resource(&self, name: &str, file_type: FileType) -> Option<Vec<u8>> {
        let path = self.index.get(&resource_key(name, file_type))?;
        match fs::read(path) {
            Ok(data) => Some(data),
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", path.display(), e);
                None
            }
        }
    }
}

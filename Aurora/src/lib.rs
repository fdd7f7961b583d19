//! # Aurora
//!
//! A pure-Rust library for BioWare Aurora engine data files, as used by
//! Dragon Age: Origins and its relatives.
//!
//! ## Supported Formats
//!
//! - **GFF4** - Generic File Format v4.0/v4.1 struct/field/list containers
//! - **GDA** - GFF4-backed tables, including merged multi-file tables (MGDA)
//! - **TLK** - Binary talk tables (V3.0, V4.0)
//! - **GFF TLK** - GFF4 talk tables, plain and Huffman-compressed
//!
//! ## Quick Start
//!
//! ### Reading a GDA table
//!
//! ```no_run
//! use aurora::formats::gda::GdaFile;
//!
//! let mut table = GdaFile::load(std::fs::read("ability_base.gda")?)?;
//! table.add(std::fs::read("ability_base_dlc.gda")?)?;
//!
//! let row = table.find_row(100)?;
//! let label = table.get_string(row, "Label", "")?;
//! # Ok::<(), aurora::Error>(())
//! ```
//!
//! ### Resolving a string reference
//!
//! ```no_run
//! use aurora::prelude::*;
//!
//! let mut resources = DirectoryResources::new();
//! resources.add_directory("data/talktables")?;
//!
//! let mut talk = TalkManager::new(LanguageConfig::aurora_default());
//! talk.add_table(&resources, "core_en-us", "core_en-us_f", false, 0)?;
//!
//! println!("{}", talk.get_string(1234, Gender::Male));
//! # Ok::<(), aurora::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` - Enables the `aurora` command-line binary

pub mod error;
pub mod formats;
pub mod language;
pub mod resource;
pub mod talk;

// Re-exports for convenience
pub use error::{Error, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{Error, Result, ResultExt};
    pub use crate::formats::gda::{GdaColumnType, GdaFile, INVALID_COLUMN, INVALID_ROW};
    pub use crate::formats::gff4::{
        FieldType, Gff4File, Gff4List, Gff4Struct, Gff4WriteStruct, Gff4WriteValue, Gff4Writer,
        field_label,
    };
    pub use crate::formats::tlk::{SOUND_ID_INVALID, TalkTable, load_talk_table};
    pub use crate::language::{Gender, Language, LanguageConfig};
    pub use crate::resource::{DirectoryResources, FileType, MemoryResources, ResourceProvider};
    pub use crate::talk::{LocString, STR_REF_INVALID, TableHandle, TalkManager};
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;

//! File format handlers for BioWare Aurora formats
//!
//! `gda` and the GFF flavour of `tlk` are both layered on `gff4`.

pub mod common;
pub mod gda;
pub mod gff4;
pub mod tlk;

// Re-export main types
pub use gda::{GdaColumnType, GdaFile, GdaHeader};
pub use gff4::{Gff4File, Gff4List, Gff4Struct, Gff4WriteStruct, Gff4WriteValue, Gff4Writer};
pub use tlk::{GffTalkTable, TalkTable, TlkFile, load_talk_table};

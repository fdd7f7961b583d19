//! Common helpers shared across the Aurora formats

pub mod hash;
pub mod text;

pub use hash::hash_column_name;
pub use text::{decode_text, preparse_color_codes, read_fixed_string, tag_to_string};

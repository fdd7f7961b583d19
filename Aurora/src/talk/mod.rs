//! String resolution across talk tables and localized strings
//!
//! [`TalkManager`] stacks talk tables by priority and resolves string
//! references against them; [`LocString`] is an object's own localized
//! text, falling back to the manager through its string reference.

mod locstring;
mod manager;

pub use locstring::LocString;
pub use manager::{TableHandle, TalkManager};

/// String reference meaning "none".
pub const STR_REF_INVALID: u32 = 0xFFFF_FFFF;

/// High byte of a string reference that selects the alternate tables.
pub const STR_REF_ALT_MASK: u32 = 0xFF00_0000;

/// Table-local part of a string reference.
pub const STR_REF_INDEX_MASK: u32 = 0x00FF_FFFF;

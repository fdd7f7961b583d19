//! Column-name hashing
//!
//! GDA files never store column names, only a CRC32 over the lowercased
//! name encoded as UTF-16LE.

/// Hash a GDA column name the way the game's tools do.
#[must_use]
pub fn hash_column_name(name: &str) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    for unit in name.to_lowercase().encode_utf16() {
        hasher.update(&unit.to_le_bytes());
    }
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_hashes() {
        assert_eq!(hash_column_name("id"), 0x66fbc936);
        assert_eq!(hash_column_name("Label"), 0xb49ca166);
        assert_eq!(hash_column_name("COST"), 0xf03d763e);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(hash_column_name("Name"), hash_column_name("name"));
    }
}

//! Error types for `Aurora`

use thiserror::Error;

/// The error type for `Aurora` operations.
///
/// Only genuine failures live here: corrupt or unsupported files, and
/// accessor misuse. Data that is merely absent (a missing optional field,
/// an unknown string reference, a row past the end of a table) is reported
/// through defaults, `Option` and sentinel values instead.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from file operations, including short reads and bad seeks.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ==================== GFF4 Format Errors ====================
    /// The data does not start with the `GFF ` signature.
    #[error("invalid GFF magic: expected \"GFF \", found {0:?}")]
    InvalidGffMagic([u8; 4]),

    /// The GFF type ID does not match what the caller expected.
    #[error("GFF type mismatch: expected {expected:?}, found {found:?}")]
    GffTypeMismatch {
        /// The type tag the caller asked for.
        expected: String,
        /// The type tag stored in the file.
        found: String,
    },

    /// The GFF container version is not supported.
    #[error("unsupported GFF version: {0:?}")]
    UnsupportedGffVersion(String),

    /// The GFF platform tag is not supported.
    #[error("unsupported GFF platform: {0:?}")]
    UnsupportedGffPlatform(String),

    /// An index or offset points outside the region it belongs to.
    #[error("GFF {what} out of bounds: {index} (limit {limit})")]
    GffOutOfBounds {
        /// Which region or table was indexed.
        what: &'static str,
        /// The offending index or offset.
        index: u64,
        /// The exclusive upper bound.
        limit: u64,
    },

    /// A list's declared length runs past the end of the list-indices region.
    #[error("GFF list at offset {offset} declares {count} entries past the end of the list indices")]
    GffListOverrun {
        /// Byte offset of the list inside the list-indices region.
        offset: u32,
        /// Declared element count.
        count: u32,
    },

    /// A field record carries a type ID this decoder does not know.
    #[error("unknown GFF field type: {0}")]
    UnknownFieldType(u32),

    /// A label does not fit the fixed 16-byte label record.
    #[error("GFF label too long: \"{0}\" (max 16 bytes)")]
    LabelTooLong(String),

    /// The file contains no structs, so it has no top-level struct.
    #[error("GFF file has no top-level struct")]
    MissingTopLevelStruct,

    // ==================== Field Access Errors ====================
    /// A field was read as the wrong kind of value.
    #[error("field \"{label}\" is not {expected} type (found {found})")]
    FieldTypeMismatch {
        /// The field label.
        label: String,
        /// The kind the accessor wanted.
        expected: &'static str,
        /// The stored field type.
        found: &'static str,
    },

    /// A struct or list field that must exist was not found.
    #[error("field \"{label}\" does not exist")]
    MissingField {
        /// The field label.
        label: String,
    },

    // ==================== GDA Errors ====================
    /// A GDA column carries an explicit type tag outside the known range.
    #[error("invalid GDA column type {0}")]
    InvalidGdaColumnType(u64),

    /// An additional GDA file does not share the base file's column layout.
    #[error("GDA column layout mismatch: {reason}")]
    GdaColumnMismatch {
        /// What differed, and where.
        reason: String,
    },

    // ==================== TLK Errors ====================
    /// The data is neither a binary TLK nor a GFF talk table.
    #[error("invalid TLK magic: {0:?}")]
    InvalidTlkMagic([u8; 4]),

    /// The binary TLK version is not V3.0 or V4.0.
    #[error("unsupported TLK version: {0:?}")]
    UnsupportedTlkVersion(String),

    /// The GFF talk table layout version is not supported.
    #[error("unsupported GFF TLK version: {0:?}")]
    UnsupportedGffTlkVersion(String),

    /// Neither gender variant of a talk table could be loaded.
    #[error("no such talk table \"{male}\"/\"{female}\"")]
    NoSuchTalkTable {
        /// Requested male table name.
        male: String,
        /// Requested female table name.
        female: String,
    },

    // ==================== Configuration Errors ====================
    /// The language configuration is inconsistent.
    #[error("invalid language configuration: {0}")]
    InvalidLanguageConfig(String),

    /// JSON parsing or serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    // ==================== Context ====================
    /// An error annotated with what was being attempted.
    #[error("{context}: {source}")]
    Context {
        /// Human-readable description of the failed operation.
        context: String,
        /// The underlying cause.
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Strip any [`Error::Context`] wrappers and return the root cause.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Context { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Attach a human-readable context message to a failed load.
pub trait ResultExt<T> {
    /// Wrap the error, if any, in [`Error::Context`].
    fn context(self, context: &str) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: &str) -> Result<T> {
        self.map_err(|e| Error::Context {
            context: context.to_string(),
            source: Box::new(e.into()),
        })
    }
}

/// A specialized Result type for `Aurora` operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_keeps_cause() {
        let failed: Result<()> = Err(Error::MissingTopLevelStruct);
        let err = failed.context("Failed reading GDA file").unwrap_err();

        assert_eq!(err.to_string(), "Failed reading GDA file: GFF file has no top-level struct");
        assert!(matches!(err.root_cause(), Error::MissingTopLevelStruct));
        assert!(std::error::Error::source(&err).is_some());
    }
}

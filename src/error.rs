//! Error types for the documentation cache.

use std::path::PathBuf;
use thiserror::Error;

use crate::codec::NilPlaceholder;
use crate::model::ItemKind;

/// A cache byte stream that cannot be decoded.
///
/// There is no partial recovery: any of these invalidates the whole file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CorruptCacheError {
    #[error("stream truncated at byte {offset}")]
    Truncated { offset: usize },

    #[error("expected {expected} at byte {offset}, found marker 0x{marker:02x}")]
    UnexpectedMarker {
        expected: &'static str,
        marker: u8,
        offset: usize,
    },

    #[error("unknown {kind} tag {tag} at byte {offset}")]
    UnknownTag {
        kind: &'static str,
        tag: u32,
        offset: usize,
    },

    #[error("unknown nil placeholder kind {byte} at byte {offset}")]
    UnknownPlaceholder { byte: u8, offset: usize },

    #[error("expected {expected} at byte {offset}, found nil placeholder {found:?}")]
    PlaceholderMismatch {
        expected: &'static str,
        found: NilPlaceholder,
        offset: usize,
    },

    #[error("invalid UTF-8 in string at byte {offset}")]
    InvalidUtf8 { offset: usize },

    #[error("missing cache file magic")]
    BadMagic,

    #[error("unsupported cache format version {found}")]
    UnsupportedVersion { found: u8 },

    #[error("item pairs a {subject} subject with a {doc} doc")]
    MismatchedItem { subject: ItemKind, doc: ItemKind },

    #[error("unexpected trailing data at byte {offset}")]
    TrailingBytes { offset: usize },
}

/// Errors from reading or writing library cache files.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache I/O failed for {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt cache file {}: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: CorruptCacheError,
    },
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CacheError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn is_corrupt(&self) -> bool {
        matches!(self, CacheError::Corrupt { .. })
    }
}

pub type Result<T, E = CacheError> = std::result::Result<T, E>;

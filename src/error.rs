use serde::Serialize;
use thiserror::Error;

use crate::pdf::destination::Unresolvable;

/// Stable tag for every failure the pipeline reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ParseError,
    NoOutline,
    EmptyAtDepth,
    NoResolvableBookmarks,
    SliceError,
    UnresolvableDestination,
    ArchiveWriteError,
    InvalidDepth,
    Cancelled,
}

/// A failure that aborts one source document but not the batch.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("{document}: not a readable PDF: {message}")]
    Parse { document: String, message: String },

    #[error("{document}: document has no outline")]
    NoOutline { document: String },

    #[error("{document}: outline has no entries at depth {depth}")]
    EmptyAtDepth { document: String, depth: u32 },

    #[error("{document}: none of the {selected} bookmarks at depth {depth} point to a page")]
    NoResolvableBookmarks {
        document: String,
        depth: u32,
        selected: usize,
    },

    #[error("{document}: failed to write chapter {ordinal} ({title}): {message}")]
    Slice {
        document: String,
        ordinal: usize,
        title: String,
        message: String,
    },
}

impl DocumentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DocumentError::Parse { .. } => ErrorKind::ParseError,
            DocumentError::NoOutline { .. } => ErrorKind::NoOutline,
            DocumentError::EmptyAtDepth { .. } => ErrorKind::EmptyAtDepth,
            DocumentError::NoResolvableBookmarks { .. } => ErrorKind::NoResolvableBookmarks,
            DocumentError::Slice { .. } => ErrorKind::SliceError,
        }
    }
}

/// A bookmark that was dropped because its destination has no page.
#[derive(Error, Debug, Clone)]
#[error("{document}: bookmark {ordinal} ({title}) skipped: {reason}")]
pub struct BookmarkError {
    pub document: String,
    pub ordinal: usize,
    pub title: String,
    #[source]
    pub reason: Unresolvable,
}

impl BookmarkError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::UnresolvableDestination
    }
}

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A failure that aborts the whole batch.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("depth must be at least 1, got {0}")]
    InvalidDepth(u32),

    #[error("cancelled after {processed} of {total} documents")]
    Cancelled { processed: usize, total: usize },

    #[error("failed to write archive: {0}")]
    Archive(#[from] ArchiveError),
}

impl BatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BatchError::InvalidDepth(_) => ErrorKind::InvalidDepth,
            BatchError::Cancelled { .. } => ErrorKind::Cancelled,
            BatchError::Archive(_) => ErrorKind::ArchiveWriteError,
        }
    }
}

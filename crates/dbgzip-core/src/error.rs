//! Error types for the dbgzip-core library.
//!
//! Fatal failures (the archive cannot be opened, required report sections are
//! missing, the package name is unrecognized) surface as [`Error`] and abort
//! the run. Optional sub-files that cannot be read never reach this type; the
//! archive accessor recovers those locally and logs a warning instead.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for dbgzip operations
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error type for all dbgzip operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The path is not a readable ZIP container
    #[error("failed to open debug package '{path}': {source}")]
    ArchiveOpen {
        /// Path to the package
        path: PathBuf,
        /// Underlying ZIP error
        #[source]
        source: zip::result::ZipError,
    },

    /// The package contains no entries, so no root folder can be derived
    #[error("debug package '{path}' has no entries")]
    EmptyArchive {
        /// Path to the package
        path: PathBuf,
    },

    /// An entry lives outside the root folder derived from the first entry
    #[error("entry '{entry}' is outside the package root '{root}'")]
    MultipleRoots {
        /// Root folder derived from the first entry
        root: String,
        /// The offending entry
        entry: String,
    },

    /// Package file name does not follow the expected naming pattern
    #[error("package name '{name}' does not match 'RhinoInside-Revit-Report-<timestamp>.zip'")]
    InvalidPackageName {
        /// The file name that failed to match
        name: String,
    },

    /// A required heading is missing from the report document
    #[error("report section '{heading}' not found")]
    SectionNotFound {
        /// The heading that was looked up
        heading: String,
    },

    /// The attachments section does not name a journal file
    #[error("no journal file listed in the attachments section")]
    JournalNotListed,

    /// The archive handle has already been closed
    #[error("debug package is not open")]
    ArchiveNotOpen,

    /// Failed to read an entry that is required to exist
    #[error("failed to read entry '{entry}': {source}")]
    EntryRead {
        /// Archive-internal path of the entry
        entry: String,
        /// Underlying ZIP error
        #[source]
        source: zip::result::ZipError,
    },

    /// Failed to read a local file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        /// Path to the file that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to write output file
    #[error("failed to write file '{path}': {source}")]
    FileWrite {
        /// Path to the file that failed to write
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Path traversal attempt detected (security error)
    #[error("path traversal detected: '{path}' would escape output directory")]
    PathTraversal {
        /// The suspicious path
        path: PathBuf,
    },

    /// Malformed line in a conflict list
    #[error("invalid conflict entry on line {line}: {details}")]
    InvalidConflictEntry {
        /// 1-based line number
        line: usize,
        /// Detailed description of the issue
        details: String,
    },
}

impl Error {
    /// Creates a new archive open error
    pub fn archive_open(path: impl Into<PathBuf>, source: zip::result::ZipError) -> Self {
        Self::ArchiveOpen {
            path: path.into(),
            source,
        }
    }

    /// Creates a new section-not-found error
    pub fn section_not_found(heading: impl Into<String>) -> Self {
        Self::SectionNotFound {
            heading: heading.into(),
        }
    }

    /// Creates a new entry read error
    pub fn entry_read(entry: impl Into<String>, source: zip::result::ZipError) -> Self {
        Self::EntryRead {
            entry: entry.into(),
            source,
        }
    }

    /// Creates a new file read error
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Creates a new file write error
    pub fn file_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileWrite {
            path: path.into(),
            source,
        }
    }

    /// Creates a new path traversal error
    pub fn path_traversal(path: impl Into<PathBuf>) -> Self {
        Self::PathTraversal { path: path.into() }
    }

    /// Creates a new conflict list error
    pub fn invalid_conflict_entry(line: usize, details: impl Into<String>) -> Self {
        Self::InvalidConflictEntry {
            line,
            details: details.into(),
        }
    }
}

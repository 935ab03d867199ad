//! Known third-party add-on conflicts.
//!
//! The table is plain data: the built-in list can be replaced by a text
//! file with one `name` or `name,version` entry per line.

use crate::error::{Error, Result};
use std::path::Path;

/// Version marker matching every version
pub const ANY_VERSION: &str = "*";

/// A known-problematic add-on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictEntry {
    /// Name matched against the add-on's company field
    pub name: String,
    /// Affected version, `*` for all
    pub version: String,
}

impl ConflictEntry {
    /// Creates an entry matching any version
    pub fn any_version(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: ANY_VERSION.to_string(),
        }
    }
}

/// Lookup table of conflicting add-ons
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictTable {
    entries: Vec<ConflictEntry>,
}

impl Default for ConflictTable {
    fn default() -> Self {
        Self::new(
            ["pyRevit", "AVAIL", "Conveyor", "Speckle"]
                .into_iter()
                .map(ConflictEntry::any_version)
                .collect(),
        )
    }
}

impl ConflictTable {
    /// Creates a table from explicit entries
    pub fn new(entries: Vec<ConflictEntry>) -> Self {
        Self { entries }
    }

    /// Parses a conflict list
    ///
    /// Blank lines and lines starting with `#` are ignored. A missing version
    /// means any version.
    pub fn parse(text: &str) -> Result<Self> {
        let mut entries = Vec::new();

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (name, version) = match line.split_once(',') {
                Some((name, version)) => (name.trim(), version.trim()),
                None => (line, ANY_VERSION),
            };

            if name.is_empty() {
                return Err(Error::invalid_conflict_entry(idx + 1, "empty add-on name"));
            }
            if version.is_empty() {
                return Err(Error::invalid_conflict_entry(idx + 1, "empty version"));
            }

            entries.push(ConflictEntry {
                name: name.to_string(),
                version: version.to_string(),
            });
        }

        Ok(Self { entries })
    }

    /// Reads and parses a conflict list from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
        Self::parse(&text)
    }

    /// All entries
    pub fn entries(&self) -> &[ConflictEntry] {
        &self.entries
    }

    /// First entry whose name occurs in `field`
    ///
    /// Matching is case-sensitive substring containment. Versions are not
    /// compared: every listed add-on is flagged whatever its version.
    pub fn find(&self, field: &str) -> Option<&ConflictEntry> {
        self.entries.iter().find(|e| field.contains(e.name.as_str()))
    }

    /// Returns true if `field` names a known conflict
    pub fn is_conflict(&self, field: &str) -> bool {
        self.find(field).is_some()
    }
}

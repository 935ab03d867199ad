//! Fixed layout of a debug package.
//!
//! Packages are named `RhinoInside-Revit-Report-<timestamp>.zip` and hold a
//! single root folder with the report document, a console log, a per-run
//! add-on inventory and any attachments.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

/// Report document with host and attachment sections
pub const REPORT: &str = "Report.md";

/// Console output captured during startup
pub const CONSOLE_LOG: &str = "Console/Startup.txt";

/// Folder holding the add-on inventories
pub const ADDINS_DIR: &str = "Addins";

/// Extension of crash dump attachments
pub const CRASH_DUMP_EXTENSION: &str = ".dmp";

static RE_PACKAGE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"RhinoInside-Revit-Report-(.+)\.zip").unwrap());

/// Extracts the creation timestamp from a package file name
///
/// Only the final path component is inspected.
pub fn extract_timestamp(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    RE_PACKAGE_NAME
        .captures(&name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or(Error::InvalidPackageName { name })
}

/// Archive-internal path of the add-on inventory for a given timestamp
pub fn addins_csv(timestamp: &str) -> String {
    format!("{}/{}.csv", ADDINS_DIR, timestamp)
}

/// Directory portion of an entry name (`Root/Report.md` -> `Root`)
pub fn entry_dir(entry: &str) -> &str {
    match entry.rfind('/') {
        Some(idx) => &entry[..idx],
        None => "",
    }
}

/// Derives the package root from the first entry and checks it against all others
pub fn resolve_root<'a>(entries: impl IntoIterator<Item = &'a str>) -> Result<Option<String>> {
    let mut entries = entries.into_iter();
    let Some(first) = entries.next() else {
        return Ok(None);
    };

    let root = entry_dir(first).to_string();
    if root.is_empty() {
        return Ok(Some(root));
    }

    let prefix = format!("{}/", root);
    for entry in entries {
        if entry != root && !entry.starts_with(&prefix) {
            return Err(Error::MultipleRoots {
                root,
                entry: entry.to_string(),
            });
        }
    }

    Ok(Some(root))
}

/// Joins an archive-relative path onto the package root
pub fn join_root(root: &str, relative: &str) -> String {
    let relative = relative.trim_start_matches('/');
    if root.is_empty() {
        relative.to_string()
    } else {
        format!("{}/{}", root, relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_timestamp() {
        assert_eq!(
            extract_timestamp("RhinoInside-Revit-Report-20230101-120000.zip").unwrap(),
            "20230101-120000"
        );
        assert_eq!(
            extract_timestamp("/tmp/.packages/RhinoInside-Revit-Report-2023_01_01.zip").unwrap(),
            "2023_01_01"
        );
    }

    #[test]
    fn test_extract_timestamp_rejects_other_names() {
        let err = extract_timestamp("/tmp/debug-package.zip").unwrap_err();
        assert!(
            matches!(err, Error::InvalidPackageName { ref name } if name == "debug-package.zip")
        );
        assert!(extract_timestamp("RhinoInside-Revit-Report-.zip").is_err());
    }

    #[test]
    fn test_entry_dir() {
        assert_eq!(entry_dir("Root/Report.md"), "Root");
        assert_eq!(entry_dir("Root/"), "Root");
        assert_eq!(entry_dir("Root/Addins/x.csv"), "Root/Addins");
        assert_eq!(entry_dir("Report.md"), "");
    }

    #[test]
    fn test_resolve_root() {
        let root = resolve_root(["R/", "R/Report.md", "R/Console/Startup.txt"]).unwrap();
        assert_eq!(root.as_deref(), Some("R"));

        let root = resolve_root(["Report.md", "Console/Startup.txt"]).unwrap();
        assert_eq!(root.as_deref(), Some(""));

        assert_eq!(resolve_root(std::iter::empty()).unwrap(), None);
    }

    #[test]
    fn test_resolve_root_rejects_second_root() {
        let err = resolve_root(["A/Report.md", "A/x.txt", "B/Report.md"]).unwrap_err();
        assert!(matches!(err, Error::MultipleRoots { ref entry, .. } if entry == "B/Report.md"));
        assert!(resolve_root(["A/Report.md", "AB/x.txt"]).is_err());
    }

    #[test]
    fn test_join_root() {
        assert_eq!(join_root("R", "Report.md"), "R/Report.md");
        assert_eq!(join_root("", "Report.md"), "Report.md");
        assert_eq!(addins_csv("ts"), "Addins/ts.csv");
    }
}

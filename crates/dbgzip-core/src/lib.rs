//! # dbgzip-core
//!
//! A library for summarizing Rhino.Inside.Revit debug packages.
//!
//! A debug package is a ZIP archive produced by the crash/error reporter. It
//! holds a single root folder with a `Report.md`, a journal attachment, a
//! startup console log and an add-on inventory. This crate extracts the
//! interesting parts of each and assembles them into a sanitized markdown
//! summary.
//!
//! ## Architecture
//!
//! - [`archive`]: Package access, root resolution and tolerant readers
//! - [`report`]: Section extraction, conflict lookup, assembly and sanitizing
//! - [`error`]: Error types and handling
//!
//! ## Example
//!
//! ```no_run
//! use dbgzip_core::{process_package, ReportConfig};
//!
//! let report = process_package(
//!     "RhinoInside-Revit-Report-20230101-120000.zip",
//!     Some("https://example.supportbee.com/tickets/12345"),
//!     &ReportConfig::default(),
//! )?;
//! println!("{}", report);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod archive;
pub mod error;
pub mod report;

// Re-export primary types for convenience
pub use archive::DebugArchive;
pub use error::{Error, Result};
pub use report::{
    process_package, sanitize_report, AddonInventory, ConflictEntry, ConflictTable, DebugReport,
    IncidentKind, JournalExcerpt, ReportConfig, ReportDocument,
};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

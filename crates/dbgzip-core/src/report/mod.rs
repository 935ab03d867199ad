//! Report extraction and assembly.
//!
//! ## Pipeline
//!
//! 1. Classify the incident from the presence of a crash dump
//! 2. Extract host info and the journal name from `Report.md`
//! 3. Excerpt the journal from the ribbon-command line onwards
//! 4. Copy the console log
//! 5. Filter the add-on inventory to third-party add-ons
//! 6. Concatenate the sections in fixed order and sanitize the result
//!
//! Steps 2 and 5 can fail fatally (missing headings, unrecognized package
//! name). Missing optional files only produce empty sections.

pub mod addons;
pub mod conflicts;
pub mod journal;
pub mod sanitize;
pub mod sections;

use crate::archive::{layout, DebugArchive};
use crate::error::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::io::{Read, Seek};
use std::path::Path;
use tracing::{debug, info};

pub use addons::{AddonInventory, AddonRecord, ThirdPartyAddon, CONFLICT_GLYPH, NO_ADDON_DATA};
pub use conflicts::{ConflictEntry, ConflictTable, ANY_VERSION};
pub use journal::{JournalExcerpt, MAX_JOURNAL_LINES, RIBBON_COMMAND_TRIGGER};
pub use sanitize::sanitize_report;
pub use sections::{Attachments, HostInfo, ReportDocument};

static RE_TICKET_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"/(\d+)").unwrap());

/// Configuration for report extraction
#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// Maximum journal lines recorded, trigger line included
    pub max_journal_lines: usize,
    /// Journal substring where recording starts
    pub journal_trigger: String,
    /// Company markers of add-ons excluded from the inventory
    pub first_party_vendors: Vec<String>,
    /// Known conflicting add-ons
    pub conflicts: ConflictTable,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            max_journal_lines: MAX_JOURNAL_LINES,
            journal_trigger: RIBBON_COMMAND_TRIGGER.to_string(),
            first_party_vendors: vec!["Autodesk".to_string(), "Robert McNeel".to_string()],
            conflicts: ConflictTable::default(),
        }
    }
}

impl ReportConfig {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the journal line cap
    pub fn max_journal_lines(mut self, max: usize) -> Self {
        self.max_journal_lines = max;
        self
    }

    /// Sets the journal trigger substring
    pub fn journal_trigger(mut self, trigger: impl Into<String>) -> Self {
        self.journal_trigger = trigger.into();
        self
    }

    /// Sets the first-party vendor markers
    pub fn first_party_vendors<I, S>(mut self, vendors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.first_party_vendors = vendors.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the conflict table
    pub fn conflicts(mut self, conflicts: ConflictTable) -> Self {
        self.conflicts = conflicts;
        self
    }
}

/// Kind of incident a package documents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncidentKind {
    /// Revit crashed and left a dump
    RuntimeError,
    /// Rhino.Inside.Revit failed to load
    LoadError,
}

impl IncidentKind {
    /// Classifies a package by the presence of a crash dump
    pub fn classify<R: Read + Seek>(archive: &DebugArchive<R>) -> Self {
        if archive.has_crash_dump() {
            IncidentKind::RuntimeError
        } else {
            IncidentKind::LoadError
        }
    }

    /// Title text
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentKind::RuntimeError => "Runtime Error",
            IncidentKind::LoadError => "Load Error",
        }
    }
}

impl fmt::Display for IncidentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric ticket id from a ticket reference (`.../tickets/12345` -> `12345`)
pub fn extract_ticket_id(ticket: &str) -> Option<&str> {
    RE_TICKET_ID
        .captures(ticket)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Optional heading naming the incident and its ticket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleBlock {
    /// Incident classification
    pub kind: IncidentKind,
    /// Ticket reference as supplied
    pub ticket: String,
}

impl TitleBlock {
    fn render(&self, out: &mut String) {
        match extract_ticket_id(&self.ticket) {
            Some(id) => out.push_str(&format!("{} (SB {})\n\n", self.kind, id)),
            None => out.push_str(&format!("{}\n\n", self.kind)),
        }
        out.push_str("# Ticket Info\n");
        out.push_str(&format!("[Support Ticket]({})\n\n", self.ticket));
    }
}

/// All sections extracted from one package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugReport {
    /// Incident classification
    pub kind: IncidentKind,
    /// Title block, present when a ticket reference was supplied
    pub title: Option<TitleBlock>,
    /// Host section of `Report.md`
    pub host_info: HostInfo,
    /// Journal lines from the ribbon command onwards
    pub journal: JournalExcerpt,
    /// Journal line cap used for the excerpt
    pub max_journal_lines: usize,
    /// Startup console output
    pub console_log: String,
    /// Third-party add-ons
    pub addons: AddonInventory,
}

impl DebugReport {
    /// Extracts every section from an open package
    pub fn extract<R: Read + Seek>(
        archive: &mut DebugArchive<R>,
        ticket: Option<&str>,
        config: &ReportConfig,
    ) -> Result<Self> {
        let kind = IncidentKind::classify(archive);
        debug!("Classified {} as {}", archive.path().display(), kind);

        let document = ReportDocument::parse(&archive.read_text(layout::REPORT));
        let host_info = HostInfo::from_document(&document)?;
        let attachments = Attachments::from_document(&document)?;

        let journal = extract_journal(archive, &attachments.journal_file, config);
        let console_log = extract_console(archive);
        let addons = extract_addons(archive, config)?;

        info!(
            "Extracted {}: {} journal lines, {} third-party add-ons ({} conflicts)",
            archive.path().display(),
            journal.len(),
            addons.addons().len(),
            addons.conflict_count()
        );

        Ok(Self {
            kind,
            title: ticket.map(|t| TitleBlock {
                kind,
                ticket: t.to_string(),
            }),
            host_info,
            journal,
            max_journal_lines: config.max_journal_lines,
            console_log,
            addons,
        })
    }

    /// Concatenates the sections without sanitizing
    pub fn render(&self) -> String {
        let mut out = String::from("\n");

        if let Some(title) = &self.title {
            title.render(&mut out);
        }

        out.push_str("# Host Info\n");
        out.push_str(self.host_info.as_str());
        out.push_str("\n\n");

        out.push_str("# Journal Report\n");
        out.push_str(&format!(
            "Section of journal after loading Rhino.Inside.Revit ({} lines)\n",
            self.max_journal_lines
        ));
        out.push_str("```\n");
        out.push_str(&self.journal.to_text());
        out.push_str("\n```\n\n");

        out.push_str("# Console Log\n");
        out.push_str("```\n");
        out.push_str(&self.console_log);
        out.push_str("```\n\n");

        out.push_str("# Third-party Addons\n");
        out.push_str(&format!("{} shows addons with known conflicts\n", CONFLICT_GLYPH));
        out.push_str(&self.addons.to_markdown());
        out.push_str("\n\n");

        out
    }

    /// Final report text with user paths scrubbed
    pub fn to_markdown(&self) -> String {
        sanitize_report(&self.render())
    }
}

/// Journal excerpt starting at the configured trigger
pub fn extract_journal<R: Read + Seek>(
    archive: &mut DebugArchive<R>,
    journal_file: &str,
    config: &ReportConfig,
) -> JournalExcerpt {
    let text = archive.read_text(journal_file);
    JournalExcerpt::extract(&text, &config.journal_trigger, config.max_journal_lines)
}

/// Full startup console log, empty when absent
pub fn extract_console<R: Read + Seek>(archive: &mut DebugArchive<R>) -> String {
    archive.read_text(layout::CONSOLE_LOG)
}

/// Third-party add-ons from the inventory named by the package timestamp
pub fn extract_addons<R: Read + Seek>(
    archive: &mut DebugArchive<R>,
    config: &ReportConfig,
) -> Result<AddonInventory> {
    let timestamp = archive.timestamp()?;
    let rows = archive.read_csv_rows(&layout::addins_csv(&timestamp), true);
    Ok(AddonInventory::from_rows(
        &rows,
        config.first_party_vendors.as_slice(),
        &config.conflicts,
    ))
}

/// Opens a package and produces its sanitized report
///
/// The package is closed before returning, on success and on failure.
pub fn process_package(
    path: impl AsRef<Path>,
    ticket: Option<&str>,
    config: &ReportConfig,
) -> Result<String> {
    let mut archive = DebugArchive::open(path)?;
    let report = DebugReport::extract(&mut archive, ticket, config)?;
    archive.close();
    Ok(report.to_markdown())
}

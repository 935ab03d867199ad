//! Heading-keyed view of the package's `Report.md`.
//!
//! The document is parsed once into an ordered list of heading spans. A
//! body is the run of non-blank lines that follows its heading, after any
//! blank lines, and ends at the next blank line. Every body line keeps its
//! trailing `\n`.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

/// Heading of the host information section
pub const HOST_HEADING: &str = "## Host";

/// Heading of the attachments section
pub const ATTACHMENTS_HEADING: &str = "## Attachments";

static RE_PARENTHESIZED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\((.+)\)").unwrap());

/// A parsed report document
///
/// Holds the source text and, per heading, the line range of its body.
/// Bodies are materialized only when looked up.
#[derive(Debug, Clone, Default)]
pub struct ReportDocument {
    text: String,
    lines: Vec<Range<usize>>,
    sections: Vec<HeadingSpan>,
}

#[derive(Debug, Clone)]
struct HeadingSpan {
    heading: usize,
    body: Range<usize>,
}

impl ReportDocument {
    /// Parses markdown text into heading/body spans
    ///
    /// Runs in one pass over the lines; headings with no body are dropped.
    pub fn parse(text: &str) -> Self {
        let mut lines = Vec::new();
        let mut offset = 0;
        for line in text.split_inclusive('\n') {
            lines.push(offset..offset + line.len());
            offset += line.len();
        }

        let blank: Vec<bool> = lines.iter().map(|r| is_blank(&text[r.clone()])).collect();
        let count = lines.len();

        // next_filled[i]: first non-blank line at or after i
        // run_end[i]: first blank line at or after i
        let mut next_filled = vec![count; count + 1];
        let mut run_end = vec![count; count + 1];
        for i in (0..count).rev() {
            next_filled[i] = if blank[i] { next_filled[i + 1] } else { i };
            run_end[i] = if blank[i] { i } else { run_end[i + 1] };
        }

        let sections = (0..count)
            .filter(|&i| text[lines[i].clone()].starts_with('#'))
            .filter_map(|i| {
                let start = next_filled[i + 1];
                (start < count).then(|| HeadingSpan {
                    heading: i,
                    body: start..run_end[start],
                })
            })
            .collect();

        Self {
            text: text.to_string(),
            lines,
            sections,
        }
    }

    fn heading_text(&self, span: &HeadingSpan) -> &str {
        self.text[self.lines[span.heading].clone()].trim_end_matches('\n')
    }

    /// Body of the first section with exactly this heading
    ///
    /// Every body line ends with `\n`.
    pub fn section(&self, heading: &str) -> Option<String> {
        let span = self
            .sections
            .iter()
            .find(|span| self.heading_text(span) == heading)?;

        let start = self.lines[span.body.start].start;
        let end = self.lines[span.body.end - 1].end;
        let mut body = self.text[start..end].to_string();
        if !body.ends_with('\n') {
            body.push('\n');
        }
        Some(body)
    }

    /// Body of a section that must be present
    pub fn require(&self, heading: &str) -> Result<String> {
        self.section(heading)
            .ok_or_else(|| Error::section_not_found(heading))
    }
}

fn is_blank(line: &str) -> bool {
    line == "\n" || line.is_empty()
}

/// Host information, copied verbatim from its section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo(pub String);

impl HostInfo {
    /// Extracts the host section
    pub fn from_document(doc: &ReportDocument) -> Result<Self> {
        doc.require(HOST_HEADING).map(Self)
    }

    /// The host text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Files listed under the attachments heading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachments {
    /// Journal file, relative to the package root
    pub journal_file: String,
    /// Crash dumps mentioned anywhere in the section
    pub crash_dumps: Vec<String>,
}

impl Attachments {
    /// Extracts the attachments section and the journal file it names
    pub fn from_document(doc: &ReportDocument) -> Result<Self> {
        let body = doc.require(ATTACHMENTS_HEADING)?;
        Self::parse(&body)
    }

    /// Parses an attachments block
    ///
    /// The first parenthesized name in the block is the journal file.
    pub fn parse(body: &str) -> Result<Self> {
        let journal_file = first_parenthesized(body)
            .ok_or(Error::JournalNotListed)?
            .to_string();

        let crash_dumps = body
            .split(|c: char| c.is_whitespace() || c == '(' || c == ')')
            .filter(|token| token.ends_with(crate::archive::layout::CRASH_DUMP_EXTENSION))
            .map(str::to_string)
            .collect();

        Ok(Self {
            journal_file,
            crash_dumps,
        })
    }
}

/// Contents of the first `( ... )` group, greedy to the last `)` on its line
pub fn first_parenthesized(text: &str) -> Option<&str> {
    RE_PARENTHESIZED
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const REPORT: &str = "# Rhino.Inside.Revit Report\n\n\
        ## Host\n\
        Machine X\n\
        Revit 2023\n\
        \n\
        ## Attachments\n\
        Startup.txt (journal.0001.txt)\n\
        crash (dump.dmp)\n\
        \n\
        ## Addins\n\
        \n";

    #[test]
    fn test_parse_sections() {
        let doc = ReportDocument::parse(REPORT);
        assert_eq!(
            doc.section(HOST_HEADING).as_deref(),
            Some("Machine X\nRevit 2023\n")
        );
        assert_eq!(
            doc.section(ATTACHMENTS_HEADING).as_deref(),
            Some("Startup.txt (journal.0001.txt)\ncrash (dump.dmp)\n")
        );
        assert_eq!(doc.section("## Addins"), None);
        assert_eq!(
            doc.section("# Rhino.Inside.Revit Report").as_deref(),
            Some("## Host\nMachine X\nRevit 2023\n")
        );
    }

    #[test]
    fn test_long_run_of_headings() {
        let count = 20_000;
        let text: String = (0..count).map(|i| format!("# h{}\n", i)).collect();
        let doc = ReportDocument::parse(&text);

        assert_eq!(doc.sections.len(), count - 1);
        let first = doc.section("# h0").unwrap();
        assert_eq!(first.lines().count(), count - 1);
        assert!(first.starts_with("# h1\n"));
        assert_eq!(doc.section("# h19998").as_deref(), Some("# h19999\n"));
        assert_eq!(doc.section("# h19999"), None);
    }

    #[test]
    fn test_heading_match_is_exact() {
        let doc = ReportDocument::parse("## Hosting\nnot it\n\n## Host\nMachine Y\n");
        assert_eq!(HostInfo::from_document(&doc).unwrap().as_str(), "Machine Y\n");
    }

    #[test]
    fn test_blank_lines_after_heading_are_skipped() {
        let doc = ReportDocument::parse("## Host\n\n\nMachine Z\n\nafter\n");
        assert_eq!(doc.section(HOST_HEADING).as_deref(), Some("Machine Z\n"));
    }

    #[test]
    fn test_unterminated_last_line() {
        let doc = ReportDocument::parse("## Host\nMachine Z");
        assert_eq!(doc.section(HOST_HEADING).as_deref(), Some("Machine Z\n"));
    }

    #[test]
    fn test_missing_host_is_fatal() {
        let doc = ReportDocument::parse("## Attachments\nx (j.txt)\n");
        let err = HostInfo::from_document(&doc).unwrap_err();
        assert!(matches!(err, Error::SectionNotFound { ref heading } if heading == HOST_HEADING));
    }

    #[test]
    fn test_missing_attachments_is_fatal() {
        let doc = ReportDocument::parse("## Host\nMachine\n");
        let err = Attachments::from_document(&doc).unwrap_err();
        assert!(
            matches!(err, Error::SectionNotFound { ref heading } if heading == ATTACHMENTS_HEADING)
        );
    }

    #[test]
    fn test_attachments() {
        let doc = ReportDocument::parse(REPORT);
        let attachments = Attachments::from_document(&doc).unwrap();
        assert_eq!(attachments.journal_file, "journal.0001.txt");
        assert_eq!(attachments.crash_dumps, vec!["dump.dmp".to_string()]);
    }

    #[test]
    fn test_attachments_without_journal() {
        let err = Attachments::parse("Startup.txt\n").unwrap_err();
        assert!(matches!(err, Error::JournalNotListed));
    }

    #[test]
    fn test_first_parenthesized() {
        assert_eq!(first_parenthesized("a (b) c\n(d)\n"), Some("b"));
        assert_eq!(first_parenthesized("no parens\n(x)\n"), Some("x"));
        assert_eq!(first_parenthesized("(a) (b)\n"), Some("a) (b"));
        assert_eq!(first_parenthesized("()\n"), None);
    }
}

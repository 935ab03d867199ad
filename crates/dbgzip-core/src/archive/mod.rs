//! Read access to a debug package.
//!
//! [`DebugArchive`] wraps a ZIP container with a single root folder. All
//! paths handed to its read operations are relative to that root.
//!
//! Reads of optional sub-files follow a local-recovery policy: a missing or
//! unreadable entry yields an empty result and a `warn!` event rather than an
//! error, so one absent log never aborts the whole report. Binary extraction
//! is the exception and propagates every failure.

pub mod layout;

use crate::error::{Error, Result};
use encoding_rs::{DecoderResult, Encoding, UTF_8};
use std::fs::File;
use std::io::{self, Cursor, Read, Seek};
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};
use zip::ZipArchive;

/// An open debug package
#[derive(Debug)]
pub struct DebugArchive<R: Read + Seek> {
    path: PathBuf,
    archive: Option<ZipArchive<R>>,
    entries: Vec<String>,
    root: String,
}

impl DebugArchive<File> {
    /// Opens a package from a file path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::archive_open(path, e.into()))?;
        Self::from_reader(path, file)
    }
}

impl DebugArchive<Cursor<Vec<u8>>> {
    /// Opens a package held in memory
    ///
    /// `path` is only used for the package name and error messages.
    pub fn from_bytes(path: impl Into<PathBuf>, bytes: Vec<u8>) -> Result<Self> {
        Self::from_reader(path, Cursor::new(bytes))
    }
}

impl<R: Read + Seek> DebugArchive<R> {
    /// Opens a package from any `Read + Seek` source
    pub fn from_reader(path: impl Into<PathBuf>, reader: R) -> Result<Self> {
        let path = path.into();
        let mut archive = ZipArchive::new(reader).map_err(|e| Error::archive_open(&path, e))?;

        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let entry = archive
                .by_index_raw(i)
                .map_err(|e| Error::archive_open(&path, e))?;
            entries.push(entry.name().to_string());
        }

        let root = layout::resolve_root(entries.iter().map(String::as_str))?
            .ok_or_else(|| Error::EmptyArchive { path: path.clone() })?;

        debug!(
            "Opened {} ({} entries, root '{}')",
            path.display(),
            entries.len(),
            root
        );

        Ok(Self {
            path,
            archive: Some(archive),
            entries,
            root,
        })
    }

    /// Path the package was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Root folder shared by every entry
    pub fn root(&self) -> &str {
        &self.root
    }

    /// All entry names, in archive order
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Whether the handle is still open
    pub fn is_open(&self) -> bool {
        self.archive.is_some()
    }

    /// Releases the underlying container ahead of drop
    pub fn close(&mut self) {
        if self.archive.take().is_some() {
            trace!("Closed {}", self.path.display());
        }
    }

    /// Creation timestamp parsed from the package file name
    pub fn timestamp(&self) -> Result<String> {
        layout::extract_timestamp(&self.path)
    }

    /// Returns true if any entry is a crash dump
    pub fn has_crash_dump(&self) -> bool {
        self.entries
            .iter()
            .any(|e| e.ends_with(layout::CRASH_DUMP_EXTENSION))
    }

    /// Crash dump entries, relative to the root
    pub fn crash_dumps(&self) -> Vec<String> {
        let prefix_len = if self.root.is_empty() {
            0
        } else {
            self.root.len() + 1
        };

        self.entries
            .iter()
            .filter(|e| e.ends_with(layout::CRASH_DUMP_EXTENSION))
            .map(|e| e[prefix_len.min(e.len())..].to_string())
            .collect()
    }

    /// Reads an entry's raw bytes
    fn read_bytes(&mut self, relative: &str) -> Result<Vec<u8>> {
        let full = layout::join_root(&self.root, relative);
        let archive = self.archive.as_mut().ok_or(Error::ArchiveNotOpen)?;

        let mut file = archive
            .by_name(&full)
            .map_err(|e| Error::entry_read(&full, e))?;

        let mut data = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut data)
            .map_err(|e| Error::entry_read(&full, e.into()))?;

        trace!("Read {} bytes from {}", data.len(), full);
        Ok(data)
    }

    /// Reads a text entry as UTF-8
    ///
    /// See [`read_text_with_encoding`](Self::read_text_with_encoding).
    pub fn read_text(&mut self, relative: &str) -> String {
        self.read_text_with_encoding(relative, UTF_8)
    }

    /// Reads a text entry, normalizing `\r\n` to `\n` before decoding
    ///
    /// Undecodable bytes are dropped. A missing or unreadable entry yields
    /// an empty string.
    pub fn read_text_with_encoding(
        &mut self,
        relative: &str,
        encoding: &'static Encoding,
    ) -> String {
        match self.read_bytes(relative) {
            Ok(bytes) => decode_lossy(&normalize_eol(&bytes), encoding),
            Err(e) => {
                warn!(entry = relative, error = %e, "Unable to read text entry");
                String::new()
            }
        }
    }

    /// Reads a CSV entry into rows of fields
    ///
    /// Any failure yields an empty sequence.
    pub fn read_csv_rows(&mut self, relative: &str, skip_header: bool) -> Vec<Vec<String>> {
        let bytes = match self.read_bytes(relative) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(entry = relative, error = %e, "Unable to read CSV entry");
                return Vec::new();
            }
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(skip_header)
            .flexible(true)
            .from_reader(bytes.as_slice());

        let rows: std::result::Result<Vec<Vec<String>>, csv::Error> = reader
            .records()
            .map(|record| record.map(|r| r.iter().map(str::to_string).collect()))
            .collect();

        match rows {
            Ok(rows) => {
                debug!("Parsed {} rows from {}", rows.len(), relative);
                rows
            }
            Err(e) => {
                warn!(entry = relative, error = %e, "Unable to parse CSV entry");
                Vec::new()
            }
        }
    }

    /// Copies an entry's raw bytes to a local file
    ///
    /// Unlike the text readers this propagates every failure.
    pub fn extract_binary(&mut self, relative: &str, destination: impl AsRef<Path>) -> Result<u64> {
        let destination = destination.as_ref();
        let full = layout::join_root(&self.root, relative);
        let archive = self.archive.as_mut().ok_or(Error::ArchiveNotOpen)?;

        let mut source = archive
            .by_name(&full)
            .map_err(|e| Error::entry_read(&full, e))?;
        let mut target =
            File::create(destination).map_err(|e| Error::file_write(destination, e))?;

        let copied =
            io::copy(&mut source, &mut target).map_err(|e| Error::file_write(destination, e))?;

        debug!("Extracted {} ({} bytes) to {}", full, copied, destination.display());
        Ok(copied)
    }
}

/// Replaces every `\r\n` pair with `\n`
fn normalize_eol(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut iter = bytes.iter().peekable();
    while let Some(&b) = iter.next() {
        if b == b'\r' && iter.peek() == Some(&&b'\n') {
            continue;
        }
        out.push(b);
    }
    out
}

/// Decodes bytes, dropping malformed sequences instead of failing
fn decode_lossy(bytes: &[u8], encoding: &'static Encoding) -> String {
    let mut decoder = encoding.new_decoder_without_bom_handling();
    let mut out = String::with_capacity(
        decoder
            .max_utf8_buffer_length_without_replacement(bytes.len())
            .unwrap_or(bytes.len()),
    );

    // Malformed sequences are skipped; characters decoded from valid input,
    // U+FFFD included, are kept.
    let mut input = bytes;
    loop {
        let (result, read) = decoder.decode_to_string_without_replacement(input, &mut out, true);
        input = &input[read..];
        match result {
            DecoderResult::InputEmpty => break,
            DecoderResult::Malformed(_, _) => {}
            DecoderResult::OutputFull => {
                let needed = decoder
                    .max_utf8_buffer_length_without_replacement(input.len())
                    .unwrap_or(input.len() * 3);
                out.reserve(needed + 4);
            }
        }
    }
    out
}

#[cfg(test)]
pub(crate) mod testing {
    use std::io::{Cursor, Write};
    use zip::write::{SimpleFileOptions, ZipWriter};
    use zip::CompressionMethod;

    /// Builds an in-memory ZIP from `(name, contents)` pairs, in order
    pub(crate) fn build_zip(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut zip = ZipWriter::new(&mut buffer);
            let options =
                SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
            for (name, data) in files {
                zip.start_file(*name, options).unwrap();
                zip.write_all(data).unwrap();
            }
            zip.finish().unwrap();
        }
        buffer.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::testing::build_zip;
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const NAME: &str = "RhinoInside-Revit-Report-20230101-120000.zip";

    fn sample() -> DebugArchive<Cursor<Vec<u8>>> {
        let bytes = build_zip(&[
            ("Pkg/Report.md", b"## Host\r\nMachine X\r\n"),
            ("Pkg/Console/Startup.txt", b"line one\r\nline two\n"),
            ("Pkg/Addins/20230101-120000.csv", b"Company,Product\nAcme,Tool\nFoo,\"Bar, Baz\"\n"),
            ("Pkg/Attachments/crash.dmp", &[0x4d, 0x44, 0x4d, 0x50, 0x00, 0xff]),
            ("Pkg/bad.txt", b"ok\xff\xfeok"),
        ]);
        DebugArchive::from_bytes(NAME, bytes).unwrap()
    }

    #[test]
    fn test_root_and_entries() {
        let archive = sample();
        assert_eq!(archive.root(), "Pkg");
        assert_eq!(archive.entries().len(), 5);
        assert_eq!(archive.timestamp().unwrap(), "20230101-120000");
    }

    #[test]
    fn test_read_text_normalizes_eol() {
        let mut archive = sample();
        assert_eq!(archive.read_text("Report.md"), "## Host\nMachine X\n");
        assert_eq!(archive.read_text("Console/Startup.txt"), "line one\nline two\n");
    }

    #[test]
    fn test_read_text_drops_invalid_bytes() {
        let mut archive = sample();
        assert_eq!(archive.read_text("bad.txt"), "okok");
    }

    #[test]
    fn test_read_text_keeps_encoded_replacement_char() {
        let bytes = build_zip(&[("R/r.txt", b"a\xef\xbf\xbdb\xffc")]);
        let mut archive = DebugArchive::from_bytes(NAME, bytes).unwrap();
        assert_eq!(archive.read_text("r.txt"), "a\u{FFFD}bc");
    }

    #[test]
    fn test_read_text_missing_entry_is_empty() {
        let mut archive = sample();
        assert_eq!(archive.read_text("Console/Missing.txt"), "");
    }

    #[test]
    fn test_read_text_utf16() {
        let bytes = build_zip(&[("R/j.txt", b"h\0i\0")]);
        let mut archive = DebugArchive::from_bytes(NAME, bytes).unwrap();
        assert_eq!(
            archive.read_text_with_encoding("j.txt", encoding_rs::UTF_16LE),
            "hi"
        );
    }

    #[test]
    fn test_read_csv_rows() {
        let mut archive = sample();
        let rows = archive.read_csv_rows("Addins/20230101-120000.csv", true);
        assert_eq!(
            rows,
            vec![
                vec!["Acme".to_string(), "Tool".to_string()],
                vec!["Foo".to_string(), "Bar, Baz".to_string()],
            ]
        );

        let rows = archive.read_csv_rows("Addins/20230101-120000.csv", false);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], vec!["Company".to_string(), "Product".to_string()]);
    }

    #[test]
    fn test_read_csv_missing_entry_is_empty() {
        let mut archive = sample();
        assert!(archive.read_csv_rows("Addins/nope.csv", true).is_empty());
    }

    #[test]
    fn test_crash_dumps() {
        let archive = sample();
        assert!(archive.has_crash_dump());
        assert_eq!(archive.crash_dumps(), vec!["Attachments/crash.dmp".to_string()]);

        let bytes = build_zip(&[("R/Report.md", b"")]);
        let archive = DebugArchive::from_bytes(NAME, bytes).unwrap();
        assert!(!archive.has_crash_dump());
        assert!(archive.crash_dumps().is_empty());
    }

    #[test]
    fn test_extract_binary() {
        let mut archive = sample();
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("crash.dmp");

        let copied = archive.extract_binary("Attachments/crash.dmp", &target).unwrap();
        assert_eq!(copied, 6);
        assert_eq!(
            std::fs::read(&target).unwrap(),
            vec![0x4d, 0x44, 0x4d, 0x50, 0x00, 0xff]
        );
    }

    #[test]
    fn test_extract_binary_missing_entry_fails() {
        let mut archive = sample();
        let temp_dir = TempDir::new().unwrap();
        let err = archive
            .extract_binary("Attachments/other.dmp", temp_dir.path().join("x"))
            .unwrap_err();
        assert!(matches!(err, Error::EntryRead { .. }));
    }

    #[test]
    fn test_closed_archive() {
        let mut archive = sample();
        archive.close();
        assert!(!archive.is_open());

        let temp_dir = TempDir::new().unwrap();
        let err = archive
            .extract_binary("Attachments/crash.dmp", temp_dir.path().join("crash.dmp"))
            .unwrap_err();
        assert!(matches!(err, Error::ArchiveNotOpen));
        assert_eq!(archive.read_text("Report.md"), "");
        assert!(archive.read_csv_rows("Addins/20230101-120000.csv", true).is_empty());
    }

    #[test]
    fn test_open_rejects_non_zip() {
        let err = DebugArchive::from_bytes(NAME, b"not a zip".to_vec()).unwrap_err();
        assert!(matches!(err, Error::ArchiveOpen { .. }));

        let temp_dir = TempDir::new().unwrap();
        let err = DebugArchive::open(temp_dir.path().join(NAME)).unwrap_err();
        assert!(matches!(err, Error::ArchiveOpen { .. }));
    }

    #[test]
    fn test_open_rejects_empty_and_multi_root() {
        let err = DebugArchive::from_bytes(NAME, build_zip(&[])).unwrap_err();
        assert!(matches!(err, Error::EmptyArchive { .. }));

        let bytes = build_zip(&[("A/Report.md", b""), ("B/Report.md", b"")]);
        let err = DebugArchive::from_bytes(NAME, bytes).unwrap_err();
        assert!(matches!(err, Error::MultipleRoots { .. }));
    }

    #[test]
    fn test_normalize_eol() {
        assert_eq!(normalize_eol(b"a\r\nb\rc\r\n"), b"a\nb\rc\n".to_vec());
    }
}

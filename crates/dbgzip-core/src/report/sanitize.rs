//! Scrubbing of user-identifying paths from report text.

use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};

static RE_ROAMING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)C:\\users\\(.+?)\\appdata\\roaming\\").unwrap());

static RE_LOCAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)C:\\users\\(.+?)\\appdata\\local\\").unwrap());

/// Replaces per-user profile folders with their environment variables
///
/// `C:\Users\<name>\AppData\Roaming\` becomes `%APPDATA%\` and
/// `C:\Users\<name>\AppData\Local\` becomes `%LOCALAPPDATA%\`, matched
/// case-insensitively. Applying it twice changes nothing further.
pub fn sanitize_report(report: &str) -> String {
    let report = RE_ROAMING.replace_all(report, NoExpand(r"%APPDATA%\"));
    RE_LOCAL
        .replace_all(&report, NoExpand(r"%LOCALAPPDATA%\"))
        .into_owned()
}

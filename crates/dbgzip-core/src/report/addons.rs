//! Third-party add-on inventory.
//!
//! Each package carries `Addins/<timestamp>.csv`, one row per loaded add-on.
//! First-party rows are filtered out; the rest are rendered as a markdown
//! table, with known conflicts flagged by [`CONFLICT_GLYPH`].

use super::conflicts::ConflictTable;

/// Prefix marking an add-on with a known conflict
pub const CONFLICT_GLYPH: &str = "⚠️";

/// Placeholder emitted when no third-party add-on was collected
pub const NO_ADDON_DATA: &str = "Addon data not collected";

const TABLE_HEADER: &str = "\nCompany Name | Product Name | Product Version | Type Name | Assembly Name | Assembly Location\n--- | --- | --- | --- | --- | ---\n";

/// One row of the add-on inventory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddonRecord {
    /// Company name
    pub company: String,
    /// Product name
    pub product_name: String,
    /// Product version
    pub product_version: String,
    /// Add-in type name
    pub type_name: String,
    /// Assembly name
    pub assembly_name: String,
    /// Assembly location on disk
    pub assembly_location: String,
}

impl AddonRecord {
    /// Builds a record from CSV fields
    ///
    /// Missing trailing fields are left empty and extra fields are ignored.
    /// Returns `None` for an empty row.
    pub fn from_row(row: &[String]) -> Option<Self> {
        if row.is_empty() {
            return None;
        }
        let field = |i: usize| row.get(i).cloned().unwrap_or_default();
        Some(Self {
            company: field(0),
            product_name: field(1),
            product_version: field(2),
            type_name: field(3),
            assembly_name: field(4),
            assembly_location: field(5),
        })
    }

    /// Returns true if the company field names a first-party vendor
    pub fn is_first_party<S: AsRef<str>>(&self, vendors: &[S]) -> bool {
        vendors
            .iter()
            .any(|vendor| self.company.contains(vendor.as_ref()))
    }

    fn fields(&self) -> [&str; 6] {
        [
            &self.company,
            &self.product_name,
            &self.product_version,
            &self.type_name,
            &self.assembly_name,
            &self.assembly_location,
        ]
    }
}

/// A third-party add-on selected for the report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThirdPartyAddon {
    /// The inventory row
    pub record: AddonRecord,
    /// Whether the company field names a known conflict
    pub conflicted: bool,
}

impl ThirdPartyAddon {
    /// Markdown table row, without trailing newline
    pub fn to_table_row(&self) -> String {
        let mut fields = self.record.fields().map(str::to_string);
        if self.conflicted {
            fields[0] = format!("{}{}", CONFLICT_GLYPH, fields[0]);
        }
        fields.join(" | ")
    }
}

/// Third-party add-ons found in a package
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddonInventory {
    addons: Vec<ThirdPartyAddon>,
}

impl AddonInventory {
    /// Filters raw CSV rows down to third-party add-ons and flags conflicts
    pub fn from_rows<S: AsRef<str>>(
        rows: &[Vec<String>],
        first_party_vendors: &[S],
        conflicts: &ConflictTable,
    ) -> Self {
        let addons = rows
            .iter()
            .filter_map(|row| AddonRecord::from_row(row))
            .filter(|record| !record.is_first_party(first_party_vendors))
            .map(|record| {
                let conflicted = conflicts.is_conflict(&record.company);
                ThirdPartyAddon { record, conflicted }
            })
            .collect();

        Self { addons }
    }

    /// Selected add-ons in inventory order
    pub fn addons(&self) -> &[ThirdPartyAddon] {
        &self.addons
    }

    /// Returns true if no third-party add-on qualified
    pub fn is_empty(&self) -> bool {
        self.addons.is_empty()
    }

    /// Number of add-ons flagged as conflicts
    pub fn conflict_count(&self) -> usize {
        self.addons.iter().filter(|a| a.conflicted).count()
    }

    /// Markdown table, or the placeholder when nothing qualified
    pub fn to_markdown(&self) -> String {
        if self.addons.is_empty() {
            return NO_ADDON_DATA.to_string();
        }

        let mut out = String::from(TABLE_HEADER);
        for addon in &self.addons {
            out.push_str(&addon.to_table_row());
            out.push('\n');
        }
        out
    }
}

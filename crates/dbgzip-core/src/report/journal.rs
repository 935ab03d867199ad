//! Journal excerpt extraction.

/// Journal line written when the Rhino.Inside.Revit ribbon command runs
pub const RIBBON_COMMAND_TRIGGER: &str = "Jrn.RibbonEvent \"Execute external command:CustomCtrl_%CustomCtrl_%Add-Ins%Rhinoceros%CommandRhinoInside:RhinoInside.Revit.UI.CommandRhinoInside\"";

/// Default cap on recorded journal lines
pub const MAX_JOURNAL_LINES: usize = 100;

/// Lines of the journal starting at the trigger line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JournalExcerpt {
    lines: Vec<String>,
}

impl JournalExcerpt {
    /// Records up to `max_lines` lines starting at the first line containing `trigger`
    ///
    /// The trigger line counts towards the cap. A journal without the trigger
    /// yields an empty excerpt.
    pub fn extract(journal: &str, trigger: &str, max_lines: usize) -> Self {
        let lines = journal
            .split('\n')
            .skip_while(|line| !line.contains(trigger))
            .take(max_lines)
            .map(str::to_string)
            .collect();

        Self { lines }
    }

    /// Recorded lines
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Number of recorded lines
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns true if the trigger was never found
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines joined with `\n`
    pub fn to_text(&self) -> String {
        self.lines.join("\n")
    }
}

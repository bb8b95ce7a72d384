//! Error aggregation and rendering.
//!
//! [`ErrorReport`] maps file names to their ordered findings. Files keep the
//! order in which they were first inserted so log output is deterministic.

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::ValidationError;

/// Findings for a single file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileErrors {
    pub file: String,
    pub errors: Vec<ValidationError>,
}

/// Insertion-ordered mapping of file name to findings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorReport {
    entries: Vec<FileErrors>,
}

impl ErrorReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append findings for `file`. Empty batches are ignored, so a file only
    /// appears in the report once it has at least one finding.
    pub fn insert(&mut self, file: impl Into<String>, errors: Vec<ValidationError>) {
        if errors.is_empty() {
            return;
        }
        let file = file.into();
        match self.entries.iter_mut().find(|e| e.file == file) {
            Some(entry) => entry.errors.extend(errors),
            None => self.entries.push(FileErrors { file, errors }),
        }
    }

    /// Append a single finding, keyed by its own `file` field.
    pub fn push(&mut self, error: ValidationError) {
        let file = error.file.clone();
        self.insert(file, vec![error]);
    }

    /// Merge another report into this one, preserving both orders.
    pub fn extend(&mut self, other: ErrorReport) {
        for entry in other.entries {
            self.insert(entry.file, entry.errors);
        }
    }

    pub fn get(&self, file: &str) -> Option<&[ValidationError]> {
        self.entries
            .iter()
            .find(|e| e.file == file)
            .map(|e| e.errors.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileErrors> {
        self.entries.iter()
    }

    /// Number of files with findings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        !self.is_empty()
    }

    /// Total number of findings across all files.
    pub fn error_count(&self) -> usize {
        self.entries.iter().map(|e| e.errors.len()).sum()
    }

    /// Render the report as multi-line text grouped by file.
    ///
    /// `prefix` tags every file header (e.g. `data` or `metadata`) so the two
    /// validators can share one build log.
    pub fn render(&self, prefix: &str) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&format!(
                "\n[{prefix}] {} ({} error(s)):\n",
                entry.file,
                entry.errors.len()
            ));
            for err in &entry.errors {
                out.push_str(&format!("  - {err}\n"));
            }
        }
        out
    }
}

/// Log every rendered line at error level and return the rendered text.
pub fn print_output_errors(report: &ErrorReport, prefix: &str) -> String {
    let rendered = report.render(prefix);
    for line in rendered.lines().filter(|l| !l.is_empty()) {
        error!("{line}");
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn err(file: &str, msg: &str) -> ValidationError {
        ValidationError::new(file, ErrorKind::Schema, msg)
    }

    #[test]
    fn test_empty_report_has_no_errors() {
        let report = ErrorReport::new();
        assert!(!report.has_errors());
        assert_eq!(report.render("data"), "");
    }

    #[test]
    fn test_empty_batch_is_not_recorded() {
        let mut report = ErrorReport::new();
        report.insert("a.csv", vec![]);
        assert!(report.is_empty());
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut report = ErrorReport::new();
        report.insert("z.csv", vec![err("z.csv", "first")]);
        report.insert("a.csv", vec![err("a.csv", "second")]);
        report.push(err("z.csv", "third"));

        let files: Vec<_> = report.iter().map(|e| e.file.as_str()).collect();
        assert_eq!(files, vec!["z.csv", "a.csv"]);
        assert_eq!(report.get("z.csv").unwrap().len(), 2);
        assert_eq!(report.error_count(), 3);
    }

    #[test]
    fn test_render_groups_by_file_with_prefix() {
        let mut report = ErrorReport::new();
        report.insert("m.txt", vec![err("m.txt", "missing key")]);
        let text = report.render("metadata");
        assert!(text.contains("[metadata] m.txt (1 error(s)):"));
        assert!(text.contains("  - [schema] missing key"));
    }

    #[test]
    fn test_extend_merges_entries() {
        let mut a = ErrorReport::new();
        a.insert("x.csv", vec![err("x.csv", "one")]);
        let mut b = ErrorReport::new();
        b.insert("x.csv", vec![err("x.csv", "two")]);
        b.insert("y.csv", vec![err("y.csv", "three")]);
        a.extend(b);
        assert_eq!(a.len(), 2);
        assert_eq!(a.get("x.csv").unwrap().len(), 2);
    }

    #[test]
    fn test_print_does_not_mutate() {
        let mut report = ErrorReport::new();
        report.insert("x.csv", vec![err("x.csv", "one")]);
        let before = report.clone();
        let text = print_output_errors(&report, "data");
        assert_eq!(report, before);
        assert!(text.contains("x.csv"));
    }

    #[test]
    fn test_serializes_as_list() {
        let mut report = ErrorReport::new();
        report.insert("x.csv", vec![err("x.csv", "one")]);
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["file"], "x.csv");
        assert_eq!(json[0]["errors"][0]["kind"], "schema");
    }
}

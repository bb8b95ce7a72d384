//! Sorting a pull request's changed files into categories.

use hubcheck_core::{classify, FileCategory};

use crate::provider::ChangedFile;

/// Changed files partitioned by [`FileCategory`], in input order.
pub struct ChangeSet<'a> {
    pub forecasts: Vec<&'a dyn ChangedFile>,
    pub malformed: Vec<&'a dyn ChangedFile>,
    pub metadata: Vec<&'a dyn ChangedFile>,
    pub other: Vec<&'a dyn ChangedFile>,
}

impl<'a> ChangeSet<'a> {
    pub fn classify<F: ChangedFile>(files: &'a [F]) -> Self {
        Self::from_refs(files.iter().map(|f| f as &dyn ChangedFile))
    }

    pub fn classify_boxed(files: &'a [Box<dyn ChangedFile>]) -> Self {
        Self::from_refs(files.iter().map(|f| f.as_ref()))
    }

    fn from_refs(files: impl Iterator<Item = &'a dyn ChangedFile>) -> Self {
        let mut set = ChangeSet {
            forecasts: Vec::new(),
            malformed: Vec::new(),
            metadata: Vec::new(),
            other: Vec::new(),
        };
        for file in files {
            match classify(file.path()) {
                FileCategory::Forecast { .. } => set.forecasts.push(file),
                FileCategory::MalformedForecast => set.malformed.push(file),
                FileCategory::Metadata { .. } => set.metadata.push(file),
                FileCategory::Other => set.other.push(file),
            }
        }
        set
    }

    pub fn is_empty(&self) -> bool {
        self.forecasts.is_empty()
            && self.malformed.is_empty()
            && self.metadata.is_empty()
            && self.other.is_empty()
    }

    /// Files that are neither valid forecasts nor metadata.
    pub fn non_submission_count(&self) -> usize {
        self.malformed.len() + self.other.len()
    }

    /// Whether any valid forecast file has deleted lines.
    pub fn has_forecast_deletions(&self) -> bool {
        self.forecasts.iter().any(|f| f.deletions() > 0)
    }

    /// Files that need staging: valid forecasts then metadata.
    pub fn to_stage(&self) -> Vec<&'a dyn ChangedFile> {
        self.forecasts
            .iter()
            .chain(self.metadata.iter())
            .copied()
            .collect()
    }
}

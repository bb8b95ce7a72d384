//! Repository path classification.
//!
//! Every changed path lands in exactly one [`FileCategory`]. Classification
//! depends on the path string alone and is case-sensitive.
//!
//! The `regex` crate has no backreferences, so the "model repeated in both
//! positions" rule is checked by comparing capture groups.

use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use regex::Regex;

/// Root directory for submissions.
pub const DATA_DIR: &str = "data-processed";

/// Category of a repository-relative path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum FileCategory {
    /// `data-processed/<model>/<YYYY>-<MM>-<DD>-<model>.csv`
    Forecast { model: String, date: String },
    /// Any other `data-processed/**.csv`.
    MalformedForecast,
    /// `data-processed/<model>/metadata-<model>.txt`
    Metadata { model: String },
    /// Everything else.
    Other,
}

impl FileCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileCategory::Forecast { .. } => "forecast",
            FileCategory::MalformedForecast => "malformed_forecast",
            FileCategory::Metadata { .. } => "metadata",
            FileCategory::Other => "other",
        }
    }

    pub fn is_forecast(&self) -> bool {
        matches!(self, FileCategory::Forecast { .. })
    }

    pub fn is_metadata(&self) -> bool {
        matches!(self, FileCategory::Metadata { .. })
    }
}

fn forecast_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^data-processed/([^/]+)/(\d{4}-\d{2}-\d{2})-([^/]+)\.csv$")
            .expect("forecast path pattern is valid")
    })
}

fn forecast_like_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^data-processed/.+\.csv$").expect("csv path pattern is valid"))
}

fn metadata_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^data-processed/([^/]+)/metadata-([^/]+)\.txt$")
            .expect("metadata path pattern is valid")
    })
}

/// Classify a repository-relative path.
pub fn classify(path: &str) -> FileCategory {
    if let Some(caps) = forecast_pattern().captures(path) {
        if caps[1] == caps[3] {
            return FileCategory::Forecast {
                model: caps[1].to_string(),
                date: caps[2].to_string(),
            };
        }
    }

    if let Some(caps) = metadata_pattern().captures(path) {
        if caps[1] == caps[2] {
            return FileCategory::Metadata {
                model: caps[1].to_string(),
            };
        }
    }

    if forecast_like_pattern().is_match(path) {
        return FileCategory::MalformedForecast;
    }

    FileCategory::Other
}

/// Last segment of a `/`-separated path.
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Split a forecast file name (`YYYY-MM-DD-<model>.csv`) into date and model.
///
/// Only the shape is checked; the date may still be an impossible calendar day.
pub fn split_forecast_name(name: &str) -> Option<(&str, &str)> {
    let stem = name.strip_suffix(".csv")?;
    if stem.len() < 12 || !stem.is_char_boundary(10) {
        return None;
    }
    let (date, rest) = stem.split_at(10);
    let model = rest.strip_prefix('-')?;
    let shape_ok = date
        .char_indices()
        .all(|(i, c)| if i == 4 || i == 7 { c == '-' } else { c.is_ascii_digit() });
    if !shape_ok || model.is_empty() {
        return None;
    }
    Some((date, model))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_forecast_path() {
        let cat = classify("data-processed/team-model/2021-05-03-team-model.csv");
        assert_eq!(
            cat,
            FileCategory::Forecast {
                model: "team-model".to_string(),
                date: "2021-05-03".to_string(),
            }
        );
    }

    #[test]
    fn test_model_mismatch_is_malformed() {
        let cat = classify("data-processed/team-model/2021-05-03-team-modle.csv");
        assert_eq!(cat, FileCategory::MalformedForecast);
    }

    #[test]
    fn test_bad_date_shape_is_malformed() {
        let cat = classify("data-processed/team-model/2021-5-3-team-model.csv");
        assert_eq!(cat, FileCategory::MalformedForecast);
    }

    #[test]
    fn test_metadata_path() {
        let cat = classify("data-processed/team-model/metadata-team-model.txt");
        assert_eq!(
            cat,
            FileCategory::Metadata {
                model: "team-model".to_string()
            }
        );
    }

    #[test]
    fn test_metadata_mismatch_is_other() {
        let cat = classify("data-processed/team-model/metadata-other-model.txt");
        assert_eq!(cat, FileCategory::Other);
    }

    #[test]
    fn test_outside_data_dir_is_other() {
        assert_eq!(classify("README.md"), FileCategory::Other);
        assert_eq!(
            classify("code/team-model/2021-05-03-team-model.csv"),
            FileCategory::Other
        );
    }

    #[test]
    fn test_anchored_at_both_ends() {
        assert_eq!(
            classify("x/data-processed/m/2021-05-03-m.csv"),
            FileCategory::Other
        );
        assert_eq!(
            classify("data-processed/m/2021-05-03-m.csv.bak"),
            FileCategory::Other
        );
    }

    #[test]
    fn test_case_sensitive() {
        assert_eq!(
            classify("data-processed/Model/2021-05-03-model.csv"),
            FileCategory::MalformedForecast
        );
        assert_eq!(
            classify("Data-Processed/m/2021-05-03-m.csv"),
            FileCategory::Other
        );
    }

    #[test]
    fn test_nested_model_dir_is_malformed() {
        assert_eq!(
            classify("data-processed/a/b/2021-05-03-b.csv"),
            FileCategory::MalformedForecast
        );
    }

    #[test]
    fn test_classification_is_idempotent() {
        let paths = [
            "data-processed/m/2021-05-03-m.csv",
            "data-processed/m/metadata-m.txt",
            "data-processed/m/notes.csv",
            "Makefile",
        ];
        for p in paths {
            assert_eq!(classify(p), classify(p));
        }
    }

    #[test]
    fn test_file_name() {
        assert_eq!(
            file_name("data-processed/m/2021-05-03-m.csv"),
            "2021-05-03-m.csv"
        );
        assert_eq!(file_name("plain.txt"), "plain.txt");
    }

    #[test]
    fn test_split_forecast_name() {
        assert_eq!(
            split_forecast_name("2021-05-03-team-model.csv"),
            Some(("2021-05-03", "team-model"))
        );
        assert_eq!(split_forecast_name("2021-05-03.csv"), None);
        assert_eq!(split_forecast_name("20210503-team.csv"), None);
        assert_eq!(split_forecast_name("2021-05-03-team.txt"), None);
    }
}

//! Metadata file validation.
//!
//! A metadata file (`metadata-<team>-<model>.txt`) is a YAML key/value
//! document describing one submitting model. Each file is validated on its
//! own, then the whole staged set is checked for duplicate model identities.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use tracing::{debug, info};

use crate::error::{ErrorKind, ValidationError};
use crate::report::ErrorReport;

/// Keys every metadata file must define with a non-empty value.
pub const REQUIRED_KEYS: &[&str] = &[
    "team_name",
    "model_name",
    "model_abbr",
    "model_contributors",
    "website_url",
    "license",
    "team_model_designation",
    "methods",
];

pub const DESIGNATIONS: &[&str] = &["primary", "secondary", "proposed", "other"];

pub const LICENSES: &[&str] = &[
    "cc-by-4.0",
    "cc-by-nc-4.0",
    "cc-by-nd-4.0",
    "cc-by-sa-4.0",
    "gpl-3.0",
    "lgpl-3.0",
    "bsd-3-clause",
    "mit",
    "apache-2.0",
    "other",
];

pub const MAX_METHODS_LEN: usize = 200;

/// Parsed contents of one metadata file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// File the record was read from.
    pub file: String,
    pub team_name: String,
    pub model_name: String,
    pub model_abbr: String,
    pub model_contributors: String,
    pub website_url: String,
    pub license: String,
    pub team_model_designation: String,
    pub methods: String,
}

impl MetadataRecord {
    /// Identity used for duplicate detection.
    pub fn identity(&self) -> (&str, &str) {
        (self.team_name.as_str(), self.model_abbr.as_str())
    }
}

/// Outcome of validating a staged set of metadata files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetadataReport {
    pub has_errors: bool,
    pub errors: ErrorReport,
    /// Records that parsed, valid or not.
    pub records: Vec<MetadataRecord>,
}

fn abbr_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_+]{1,16}-[A-Za-z0-9_+]{1,16}$")
            .expect("model_abbr pattern is valid")
    })
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Parse metadata text into a record.
///
/// Returns every schema problem at once rather than stopping at the first
/// missing key.
pub fn parse_metadata(file: &str, content: &str) -> Result<MetadataRecord, Vec<ValidationError>> {
    let doc: Value = serde_yaml::from_str(content).map_err(|e| {
        vec![ValidationError::new(
            file,
            ErrorKind::Parse,
            format!("could not parse metadata as key/value text: {e}"),
        )]
    })?;

    let Value::Mapping(map) = doc else {
        return Err(vec![ValidationError::new(
            file,
            ErrorKind::Schema,
            "metadata must be a set of `key: value` lines",
        )]);
    };

    let mut fields: HashMap<&str, String> = HashMap::new();
    let mut errors = Vec::new();

    for &key in REQUIRED_KEYS {
        match map.get(key) {
            None | Some(Value::Null) => errors.push(ValidationError::new(
                file,
                ErrorKind::Schema,
                format!("required field `{key}` is missing"),
            )),
            Some(value) => match scalar_to_string(value) {
                Some(s) if s.is_empty() => errors.push(ValidationError::new(
                    file,
                    ErrorKind::Schema,
                    format!("required field `{key}` is empty"),
                )),
                Some(s) => {
                    fields.insert(key, s);
                }
                None => errors.push(ValidationError::new(
                    file,
                    ErrorKind::Schema,
                    format!("field `{key}` must be a single value"),
                )),
            },
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    let mut take = |key: &str| fields.remove(key).unwrap_or_default();
    Ok(MetadataRecord {
        file: file.to_string(),
        team_name: take("team_name"),
        model_name: take("model_name"),
        model_abbr: take("model_abbr"),
        model_contributors: take("model_contributors"),
        website_url: take("website_url"),
        license: take("license"),
        team_model_designation: take("team_model_designation"),
        methods: take("methods"),
    })
}

/// Check allowed values and filename consistency for one parsed record.
pub fn validate_record(record: &MetadataRecord) -> Vec<ValidationError> {
    let file = record.file.as_str();
    let mut errors = Vec::new();

    if !DESIGNATIONS.contains(&record.team_model_designation.as_str()) {
        errors.push(ValidationError::new(
            file,
            ErrorKind::ValueRange,
            format!(
                "team_model_designation `{}` must be one of: {}",
                record.team_model_designation,
                DESIGNATIONS.join(", ")
            ),
        ));
    }

    if !LICENSES.contains(&record.license.to_lowercase().as_str()) {
        errors.push(ValidationError::new(
            file,
            ErrorKind::ValueRange,
            format!(
                "license `{}` must be one of: {}",
                record.license,
                LICENSES.join(", ")
            ),
        ));
    }

    if !abbr_pattern().is_match(&record.model_abbr) {
        errors.push(ValidationError::new(
            file,
            ErrorKind::ValueRange,
            format!(
                "model_abbr `{}` must look like `team-model` with each part at most 16 characters of [A-Za-z0-9_+]",
                record.model_abbr
            ),
        ));
    }

    if let Some(abbr) = file
        .strip_prefix("metadata-")
        .and_then(|s| s.strip_suffix(".txt"))
    {
        if abbr != record.model_abbr {
            errors.push(ValidationError::new(
                file,
                ErrorKind::Consistency,
                format!(
                    "model_abbr `{}` does not match the file name abbreviation `{abbr}`",
                    record.model_abbr
                ),
            ));
        }
    }

    let methods_len = record.methods.chars().count();
    if methods_len > MAX_METHODS_LEN {
        errors.push(ValidationError::new(
            file,
            ErrorKind::ValueRange,
            format!("methods is {methods_len} characters long, the limit is {MAX_METHODS_LEN}"),
        ));
    }

    errors
}

/// Find records from different files declaring the same model identity.
///
/// Each duplicate pair yields one finding for each of the two files.
pub fn find_duplicates(records: &[MetadataRecord]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for (i, a) in records.iter().enumerate() {
        for b in &records[i + 1..] {
            if a.file == b.file || a.identity() != b.identity() {
                continue;
            }
            let (team, abbr) = a.identity();
            errors.push(ValidationError::new(
                &a.file,
                ErrorKind::Consistency,
                format!("model `{abbr}` of team `{team}` is also declared in {}", b.file),
            ));
            errors.push(ValidationError::new(
                &b.file,
                ErrorKind::Consistency,
                format!("model `{abbr}` of team `{team}` is also declared in {}", a.file),
            ));
        }
    }
    errors
}

fn is_metadata_file_name(name: &str) -> bool {
    name.starts_with("metadata-") && name.ends_with(".txt")
}

/// Validate every `metadata-*.txt` file in a staging directory.
///
/// A missing directory or an empty one is a clean result.
pub fn check_for_metadata(dir: &Path) -> MetadataReport {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "No metadata directory");
            return MetadataReport::default();
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    paths.sort();

    check_metadata_files(&paths)
}

/// Validate the given metadata files, and check them against each other
/// for duplicate identities. Paths not named `metadata-*.txt` are skipped.
pub fn check_metadata_files(paths: &[PathBuf]) -> MetadataReport {
    let mut report = MetadataReport::default();
    let mut checked = 0usize;

    for path in paths {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !is_metadata_file_name(name) {
            continue;
        }
        checked += 1;

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                report.errors.push(ValidationError::new(
                    name,
                    ErrorKind::Parse,
                    format!("could not read metadata file: {e}"),
                ));
                continue;
            }
        };

        match parse_metadata(name, &content) {
            Ok(record) => {
                report.errors.insert(name, validate_record(&record));
                report.records.push(record);
            }
            Err(errors) => report.errors.insert(name, errors),
        }
    }

    for dup in find_duplicates(&report.records) {
        report.errors.push(dup);
    }

    report.has_errors = report.errors.has_errors();
    info!(
        files = checked,
        invalid = report.errors.len(),
        "Checked metadata files"
    );
    report
}

//! Forecast CSV validation.
//!
//! A forecast file `YYYY-MM-DD-<team>-<model>.csv` holds one row per
//! (location, target, type[, quantile]) with the columns in
//! [`REQUIRED_COLUMNS`]. Validation runs in three passes:
//!
//! 1. file name shape and calendar date,
//! 2. header and per-row schema/value checks,
//! 3. cross-row checks: a single forecast date matching the file name,
//!    target end dates, duplicate rows and monotonic quantiles.
//!
//! Findings are returned, never raised. A file that cannot be read at all
//! yields exactly one `ErrorKind::Parse` finding.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::{Datelike, Days, NaiveDate, Weekday};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ErrorKind, HubError, ValidationError};
use crate::path::split_forecast_name;
use crate::report::ErrorReport;

pub const REQUIRED_COLUMNS: &[&str] = &[
    "forecast_date",
    "target",
    "target_end_date",
    "location",
    "type",
    "quantile",
    "value",
];

/// Allowed distance in days between the forecast date and the run date.
pub const FRESHNESS_TOLERANCE_DAYS: i64 = 1;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Row type: a single point estimate or one level of a quantile function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastType {
    Point,
    Quantile,
}

impl ForecastType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "point" => Some(ForecastType::Point),
            "quantile" => Some(ForecastType::Quantile),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ForecastType::Point => "point",
            ForecastType::Quantile => "quantile",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HorizonUnit {
    Day,
    Week,
}

/// Parsed `"<N> <day|wk> ahead <inc|cum> <death|case|hosp>"` target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    pub horizon: u32,
    pub unit: HorizonUnit,
    /// e.g. `inc death`
    pub measure: String,
}

fn target_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{1,3}) (day|wk) ahead ((?:inc|cum) (?:death|case|hosp))$")
            .expect("target pattern is valid")
    })
}

fn location_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(US|\d{2}|\d{5})$").expect("location pattern is valid"))
}

impl Target {
    pub fn parse(s: &str) -> Option<Self> {
        let caps = target_pattern().captures(s)?;
        let horizon = caps[1].parse().ok()?;
        let unit = match &caps[2] {
            "day" => HorizonUnit::Day,
            _ => HorizonUnit::Week,
        };
        Some(Self {
            horizon,
            unit,
            measure: caps[3].to_string(),
        })
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match self.unit {
            HorizonUnit::Day => "day",
            HorizonUnit::Week => "wk",
        };
        write!(f, "{} {unit} ahead {}", self.horizon, self.measure)
    }
}

/// One well-formed data row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    /// 1-based data row number (header excluded).
    pub row: usize,
    pub forecast_date: NaiveDate,
    pub target: Target,
    pub target_end_date: NaiveDate,
    pub location: String,
    pub kind: ForecastType,
    pub quantile: Option<f64>,
    pub value: f64,
}

/// A parsed forecast file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastFile {
    pub name: String,
    /// Model name from the file name, when the name has the right shape.
    pub model: Option<String>,
    /// Date encoded in the file name, when it is a real calendar date.
    pub filename_date: Option<NaiveDate>,
    pub rows: Vec<ForecastRow>,
}

impl ForecastFile {
    /// Distinct forecast dates declared by the rows.
    pub fn forecast_dates(&self) -> BTreeSet<NaiveDate> {
        self.rows.iter().map(|r| r.forecast_date).collect()
    }

    /// The declared forecast date when every row agrees on one.
    pub fn forecast_date(&self) -> Option<NaiveDate> {
        let dates = self.forecast_dates();
        if dates.len() == 1 {
            dates.into_iter().next()
        } else {
            None
        }
    }
}

struct Columns {
    forecast_date: usize,
    target: usize,
    target_end_date: usize,
    location: usize,
    kind: usize,
    quantile: usize,
    value: usize,
}

impl Columns {
    fn from_headers(file: &str, headers: &csv::StringRecord) -> Result<Self, Vec<ValidationError>> {
        let names: Vec<&str> = headers.iter().collect();
        let mut errors = Vec::new();

        for &required in REQUIRED_COLUMNS {
            if !names.contains(&required) {
                errors.push(ValidationError::new(
                    file,
                    ErrorKind::Schema,
                    format!("required column `{required}` is missing"),
                ));
            }
        }
        for name in &names {
            if !REQUIRED_COLUMNS.contains(name) {
                errors.push(ValidationError::new(
                    file,
                    ErrorKind::Schema,
                    format!("unexpected column `{name}`"),
                ));
            }
        }
        let mut seen = HashSet::new();
        for name in &names {
            if !seen.insert(*name) {
                errors.push(ValidationError::new(
                    file,
                    ErrorKind::Schema,
                    format!("column `{name}` appears more than once"),
                ));
            }
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        let idx = |col: &str| names.iter().position(|n| *n == col).unwrap_or_default();
        Ok(Self {
            forecast_date: idx("forecast_date"),
            target: idx("target"),
            target_end_date: idx("target_end_date"),
            location: idx("location"),
            kind: idx("type"),
            quantile: idx("quantile"),
            value: idx("value"),
        })
    }
}

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date pattern is valid"))
}

/// Strict `YYYY-MM-DD`; chrono's `%Y` alone also takes signed, wider years.
fn parse_date(s: &str) -> Option<NaiveDate> {
    if !date_re().is_match(s) {
        return None;
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT).ok()
}

fn parse_row(
    file: &str,
    row: usize,
    cols: &Columns,
    record: &csv::StringRecord,
) -> Result<ForecastRow, Vec<ValidationError>> {
    let field = |i: usize| record.get(i).unwrap_or("");
    let mut errors = Vec::new();
    let mut fail = |kind: ErrorKind, msg: String| {
        errors.push(ValidationError::new(file, kind, format!("row {row}: {msg}")));
    };

    let forecast_date = parse_date(field(cols.forecast_date));
    if forecast_date.is_none() {
        fail(
            ErrorKind::Schema,
            format!("forecast_date `{}` is not a YYYY-MM-DD date", field(cols.forecast_date)),
        );
    }

    let target_end_date = parse_date(field(cols.target_end_date));
    if target_end_date.is_none() {
        fail(
            ErrorKind::Schema,
            format!("target_end_date `{}` is not a YYYY-MM-DD date", field(cols.target_end_date)),
        );
    }

    let target = Target::parse(field(cols.target));
    if target.is_none() {
        fail(
            ErrorKind::ValueRange,
            format!("target `{}` is not a recognised target", field(cols.target)),
        );
    }

    let location = field(cols.location);
    if !location_pattern().is_match(location) {
        fail(
            ErrorKind::ValueRange,
            format!("location `{location}` must be `US`, a 2-digit state or a 5-digit county FIPS code"),
        );
    }

    let kind = ForecastType::parse(field(cols.kind));
    if kind.is_none() {
        fail(
            ErrorKind::ValueRange,
            format!("type `{}` must be `point` or `quantile`", field(cols.kind)),
        );
    }

    let raw_quantile = field(cols.quantile);
    let quantile = match kind {
        Some(ForecastType::Point) => {
            if !(raw_quantile.is_empty() || raw_quantile == "NA") {
                fail(
                    ErrorKind::ValueRange,
                    format!("point rows must leave quantile empty, found `{raw_quantile}`"),
                );
            }
            None
        }
        Some(ForecastType::Quantile) => match raw_quantile.parse::<f64>() {
            Ok(q) if q > 0.0 && q < 1.0 => Some(q),
            Ok(q) => {
                fail(
                    ErrorKind::ValueRange,
                    format!("quantile {q} must lie strictly between 0 and 1"),
                );
                None
            }
            Err(_) => {
                fail(
                    ErrorKind::Schema,
                    format!("quantile `{raw_quantile}` is not a number"),
                );
                None
            }
        },
        None => None,
    };

    let raw_value = field(cols.value);
    let value = match raw_value.parse::<f64>() {
        Ok(v) if !v.is_finite() => {
            fail(ErrorKind::ValueRange, format!("value `{raw_value}` is not finite"));
            None
        }
        Ok(v) if v < 0.0 => {
            fail(
                ErrorKind::ValueRange,
                format!("value {v} is negative but the target is a count"),
            );
            None
        }
        Ok(v) => Some(v),
        Err(_) => {
            fail(ErrorKind::Schema, format!("value `{raw_value}` is not a number"));
            None
        }
    };

    match (forecast_date, target, target_end_date, kind, value) {
        (Some(forecast_date), Some(target), Some(target_end_date), Some(kind), Some(value))
            if errors.is_empty() =>
        {
            Ok(ForecastRow {
                row,
                forecast_date,
                target,
                target_end_date,
                location: location.to_string(),
                kind,
                quantile,
                value,
            })
        }
        _ => Err(errors),
    }
}

/// Parse forecast CSV text into rows.
///
/// Returns the file plus row-level findings, or `Err` when the file cannot
/// be interpreted at all (unreadable CSV, missing columns).
pub fn parse_forecast<R: Read>(
    name: &str,
    reader: R,
) -> Result<(ForecastFile, Vec<ValidationError>), Vec<ValidationError>> {
    let parse_err = |e: csv::Error| {
        vec![ValidationError::new(
            name,
            ErrorKind::Parse,
            format!("could not read CSV: {e}"),
        )]
    };

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers().map_err(parse_err)?.clone();
    if headers.iter().all(str::is_empty) {
        return Err(vec![ValidationError::new(
            name,
            ErrorKind::Parse,
            "could not read CSV: file is empty",
        )]);
    }
    let cols = Columns::from_headers(name, &headers)?;

    let (model, filename_date) = match split_forecast_name(name) {
        Some((date, model)) => (Some(model.to_string()), parse_date(date)),
        None => (None, None),
    };

    let mut file = ForecastFile {
        name: name.to_string(),
        model,
        filename_date,
        rows: Vec::new(),
    };
    let mut errors = Vec::new();

    for (i, record) in rdr.records().enumerate() {
        let record = record.map_err(parse_err)?;
        match parse_row(name, i + 1, &cols, &record) {
            Ok(row) => file.rows.push(row),
            Err(row_errors) => errors.extend(row_errors),
        }
    }

    if file.rows.is_empty() && errors.is_empty() {
        errors.push(ValidationError::new(
            name,
            ErrorKind::Schema,
            "file contains no forecast rows",
        ));
    }

    Ok((file, errors))
}

fn check_file_name(name: &str) -> Vec<ValidationError> {
    match split_forecast_name(name) {
        None => vec![ValidationError::new(
            name,
            ErrorKind::PathFormat,
            "file name must be YYYY-MM-DD-<team>-<model>.csv",
        )],
        Some((date, _)) if parse_date(date).is_none() => vec![ValidationError::new(
            name,
            ErrorKind::PathFormat,
            format!("`{date}` in the file name is not a valid calendar date"),
        )],
        Some(_) => Vec::new(),
    }
}

fn check_forecast_dates(file: &ForecastFile) -> Vec<ValidationError> {
    let name = file.name.as_str();
    let dates = file.forecast_dates();
    let mut errors = Vec::new();

    if dates.len() > 1 {
        let listed: Vec<String> = dates.iter().map(|d| d.to_string()).collect();
        errors.push(ValidationError::new(
            name,
            ErrorKind::Consistency,
            format!("file declares several forecast_date values: {}", listed.join(", ")),
        ));
    }

    if let (Some(declared), Some(from_name)) = (file.forecast_date(), file.filename_date) {
        if declared != from_name {
            errors.push(ValidationError::new(
                name,
                ErrorKind::Consistency,
                format!(
                    "forecast_date {declared} does not match the date {from_name} in the file name"
                ),
            ));
        }
    }

    errors
}

fn check_target_end_dates(file: &ForecastFile) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for row in &file.rows {
        match row.target.unit {
            HorizonUnit::Day => {
                let horizon = Days::new(u64::from(row.target.horizon));
                let Some(expected) = row.forecast_date.checked_add_days(horizon) else {
                    errors.push(ValidationError::new(
                        &file.name,
                        ErrorKind::ValueRange,
                        format!(
                            "row {}: `{}` from {} ends outside the supported date range",
                            row.row, row.target, row.forecast_date
                        ),
                    ));
                    continue;
                };
                if row.target_end_date != expected {
                    errors.push(ValidationError::new(
                        &file.name,
                        ErrorKind::Consistency,
                        format!(
                            "row {}: target_end_date {} for `{}` should be {expected}",
                            row.row, row.target_end_date, row.target
                        ),
                    ));
                }
            }
            HorizonUnit::Week => {
                if row.target_end_date.weekday() != Weekday::Sat {
                    errors.push(ValidationError::new(
                        &file.name,
                        ErrorKind::Consistency,
                        format!(
                            "row {}: target_end_date {} for `{}` must be a Saturday",
                            row.row, row.target_end_date, row.target
                        ),
                    ));
                }
            }
        }
    }
    errors
}

fn check_duplicate_rows(file: &ForecastFile) -> Vec<ValidationError> {
    let mut seen = HashSet::new();
    let mut errors = Vec::new();
    for row in &file.rows {
        let key = (
            row.location.as_str(),
            row.target.to_string(),
            row.kind,
            row.quantile.map(f64::to_bits),
        );
        if !seen.insert(key) {
            let level = row
                .quantile
                .map(|q| format!(" quantile {q}"))
                .unwrap_or_default();
            errors.push(ValidationError::new(
                &file.name,
                ErrorKind::Consistency,
                format!(
                    "row {}: duplicate {}{level} row for location {} and `{}`",
                    row.row,
                    row.kind.as_str(),
                    row.location,
                    row.target
                ),
            ));
        }
    }
    errors
}

fn check_monotonic_quantiles(file: &ForecastFile) -> Vec<ValidationError> {
    let mut groups: BTreeMap<(String, String), Vec<&ForecastRow>> = BTreeMap::new();
    for row in file.rows.iter().filter(|r| r.kind == ForecastType::Quantile) {
        groups
            .entry((row.location.clone(), row.target.to_string()))
            .or_default()
            .push(row);
    }

    let mut errors = Vec::new();
    for ((location, target), mut rows) in groups {
        rows.sort_by(|a, b| a.quantile.partial_cmp(&b.quantile).unwrap_or(std::cmp::Ordering::Equal));
        for pair in rows.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            let (Some(q_lo), Some(q_hi)) = (lo.quantile, hi.quantile) else {
                continue;
            };
            if q_lo == q_hi {
                continue;
            }
            if hi.value < lo.value {
                errors.push(ValidationError::new(
                    &file.name,
                    ErrorKind::ValueRange,
                    format!(
                        "quantiles for location {location} and `{target}` decrease: \
                         {q_hi} has value {} below {} at {q_lo}",
                        hi.value, lo.value
                    ),
                ));
            }
        }
    }
    errors
}

/// Validate forecast CSV content read from `reader`, attributed to `name`.
pub fn validate_forecast<R: Read>(name: &str, reader: R) -> Vec<ValidationError> {
    let mut errors = check_file_name(name);

    let (file, row_errors) = match parse_forecast(name, reader) {
        Ok(parsed) => parsed,
        Err(fatal) => {
            errors.extend(fatal);
            return errors;
        }
    };
    errors.extend(row_errors);
    errors.extend(check_forecast_dates(&file));
    errors.extend(check_target_end_dates(&file));
    errors.extend(check_duplicate_rows(&file));
    errors.extend(check_monotonic_quantiles(&file));

    debug!(file = %name, rows = file.rows.len(), errors = errors.len(), "Validated forecast");
    errors
}

/// Validate a staged forecast file. An empty result means the file is valid.
pub fn validate_forecast_file(path: &Path) -> Vec<ValidationError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    match std::fs::File::open(path) {
        Ok(f) => validate_forecast(&name, f),
        Err(e) => vec![ValidationError::new(
            name,
            ErrorKind::Parse,
            format!("could not open file: {e}"),
        )],
    }
}

/// Warning text when `forecast_date` is more than a day away from `today`.
pub fn forecast_date_warning(name: &str, forecast_date: NaiveDate, today: NaiveDate) -> Option<String> {
    let delta = (forecast_date - today).num_days();
    if delta.abs() <= FRESHNESS_TOLERANCE_DAYS {
        return None;
    }
    Some(format!(
        "The forecast_date {forecast_date} in {name} is {} day(s) away from today ({today}). \
         Forecasts are expected to be submitted within {FRESHNESS_TOLERANCE_DAYS} day of their forecast date.",
        delta.abs()
    ))
}

/// Compare a staged file's forecast date with the run date.
///
/// Returns `(true, message)` when the date is outside the tolerance. Files
/// that cannot be read yield `(false, "")`; their problems surface through
/// [`validate_forecast_file`].
pub fn check_forecast_date(path: &Path, today: NaiveDate) -> (bool, String) {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let parsed = std::fs::File::open(path)
        .ok()
        .and_then(|f| parse_forecast(&name, f).ok());
    let Some((file, _)) = parsed else {
        return (false, String::new());
    };

    match file.forecast_date().and_then(|d| forecast_date_warning(&name, d, today)) {
        Some(message) => {
            warn!(file = %name, "{message}");
            (true, message)
        }
        None => (false, String::new()),
    }
}

/// List the `*.csv` files of a staging directory in name order.
pub fn staged_forecasts(dir: &Path) -> crate::Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(HubError::MissingDirectory(dir.display().to_string()));
    }
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "csv") {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Validate every staged forecast. Files without findings are omitted.
///
/// A missing staging directory means nothing was staged and is not an error.
pub fn validate_directory(dir: &Path) -> ErrorReport {
    let mut report = ErrorReport::new();
    let paths = match staged_forecasts(dir) {
        Ok(paths) => paths,
        Err(HubError::MissingDirectory(_)) => Vec::new(),
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "Could not list staged forecasts");
            Vec::new()
        }
    };
    for path in &paths {
        let errors = validate_forecast_file(path);
        if let Some(first) = errors.first() {
            report.insert(first.file.clone(), errors);
        }
    }
    info!(
        files = paths.len(),
        invalid = report.len(),
        "Checked forecast files"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    const NAME: &str = "2021-05-03-team-model.csv";
    const HEADER: &str = "forecast_date,target,target_end_date,location,type,quantile,value\n";

    fn csv(rows: &[&str]) -> String {
        let mut s = HEADER.to_string();
        for r in rows {
            s.push_str(r);
            s.push('\n');
        }
        s
    }

    fn validate(text: &str) -> Vec<ValidationError> {
        validate_forecast(NAME, text.as_bytes())
    }

    fn valid_rows() -> Vec<&'static str> {
        vec![
            "2021-05-03,1 wk ahead inc death,2021-05-08,US,point,NA,100",
            "2021-05-03,1 wk ahead inc death,2021-05-08,US,quantile,0.025,50",
            "2021-05-03,1 wk ahead inc death,2021-05-08,US,quantile,0.5,100",
            "2021-05-03,1 wk ahead inc death,2021-05-08,US,quantile,0.975,150",
            "2021-05-03,1 day ahead inc hosp,2021-05-04,06,point,,12",
        ]
    }

    #[test]
    fn test_valid_file_has_no_errors() {
        let errors = validate(&csv(&valid_rows()));
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    }

    #[test]
    fn test_column_order_is_free() {
        let text = "value,quantile,type,location,target_end_date,target,forecast_date\n\
                    100,NA,point,US,2021-05-08,1 wk ahead inc death,2021-05-03\n";
        assert!(validate(text).is_empty());
    }

    #[test]
    fn test_missing_column() {
        let text = "forecast_date,target,target_end_date,location,type,value\n\
                    2021-05-03,1 wk ahead inc death,2021-05-08,US,point,100\n";
        let errors = validate(text);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::Schema);
        assert!(errors[0].message.contains("quantile"));
    }

    #[test]
    fn test_extra_column() {
        let text = "forecast_date,target,target_end_date,location,type,quantile,value,notes\n\
                    2021-05-03,1 wk ahead inc death,2021-05-08,US,point,NA,100,x\n";
        let errors = validate(text);
        assert!(errors[0].message.contains("notes"));
    }

    #[test]
    fn test_unknown_type() {
        let errors = validate(&csv(&[
            "2021-05-03,1 wk ahead inc death,2021-05-08,US,sample,NA,100",
        ]));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::ValueRange);
        assert!(errors[0].message.starts_with("row 1:"));
    }

    #[test]
    fn test_quantile_out_of_range() {
        let errors = validate(&csv(&[
            "2021-05-03,1 wk ahead inc death,2021-05-08,US,quantile,1.0,100",
        ]));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("strictly between"));
    }

    #[test]
    fn test_negative_value() {
        let errors = validate(&csv(&[
            "2021-05-03,1 wk ahead inc death,2021-05-08,US,point,NA,-3",
        ]));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("negative"));
    }

    #[test]
    fn test_non_numeric_value() {
        let errors = validate(&csv(&[
            "2021-05-03,1 wk ahead inc death,2021-05-08,US,point,NA,lots",
        ]));
        assert_eq!(errors[0].kind, ErrorKind::Schema);
    }

    #[test]
    fn test_bad_location_and_target() {
        let errors = validate(&csv(&[
            "2021-05-03,1 month ahead inc death,2021-05-08,California,point,NA,1",
        ]));
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_forecast_date_must_match_file_name() {
        let errors = validate(&csv(&[
            "2021-05-04,1 wk ahead inc death,2021-05-08,US,point,NA,100",
        ]));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::Consistency);
        assert!(errors[0].message.contains("2021-05-04"));
    }

    #[test]
    fn test_multiple_forecast_dates() {
        let errors = validate(&csv(&[
            "2021-05-03,1 wk ahead inc death,2021-05-08,US,point,NA,100",
            "2021-05-02,1 wk ahead inc death,2021-05-08,06,point,NA,100",
        ]));
        assert!(errors
            .iter()
            .any(|e| e.message.contains("several forecast_date")));
    }

    #[test]
    fn test_day_ahead_end_date() {
        let errors = validate(&csv(&[
            "2021-05-03,2 day ahead inc hosp,2021-05-04,US,point,NA,5",
        ]));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("should be 2021-05-05"));
    }

    #[test]
    fn test_week_ahead_end_date_saturday() {
        let errors = validate(&csv(&[
            "2021-05-03,1 wk ahead cum death,2021-05-09,US,point,NA,5",
        ]));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("Saturday"));
    }

    #[test]
    fn test_duplicate_rows() {
        let errors = validate(&csv(&[
            "2021-05-03,1 wk ahead inc death,2021-05-08,US,point,NA,100",
            "2021-05-03,1 wk ahead inc death,2021-05-08,US,point,NA,101",
        ]));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("duplicate"));
    }

    #[test]
    fn test_one_error_per_decreasing_pair() {
        let errors = validate(&csv(&[
            "2021-05-03,1 wk ahead inc death,2021-05-08,US,quantile,0.1,50",
            "2021-05-03,1 wk ahead inc death,2021-05-08,US,quantile,0.5,40",
            "2021-05-03,1 wk ahead inc death,2021-05-08,US,quantile,0.9,30",
            "2021-05-03,1 wk ahead inc death,2021-05-08,06,quantile,0.1,1",
            "2021-05-03,1 wk ahead inc death,2021-05-08,06,quantile,0.9,2",
        ]));
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.kind == ErrorKind::ValueRange));
    }

    #[test]
    fn test_equal_quantile_values_allowed() {
        let errors = validate(&csv(&[
            "2021-05-03,1 wk ahead inc death,2021-05-08,US,quantile,0.1,5",
            "2021-05-03,1 wk ahead inc death,2021-05-08,US,quantile,0.9,5",
        ]));
        assert!(errors.is_empty());
    }

    #[test]
    fn test_monotonicity_uses_level_not_row_order() {
        let errors = validate(&csv(&[
            "2021-05-03,1 wk ahead inc death,2021-05-08,US,quantile,0.9,90",
            "2021-05-03,1 wk ahead inc death,2021-05-08,US,quantile,0.1,10",
        ]));
        assert!(errors.is_empty());
    }

    #[test]
    fn test_malformed_csv_is_single_parse_error() {
        let text = format!("{HEADER}2021-05-03,1 wk ahead inc death\n");
        let errors = validate(&text);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::Parse);
    }

    #[test]
    fn test_header_only_file() {
        let errors = validate(HEADER);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("no forecast rows"));
    }

    #[test]
    fn test_empty_file_is_single_parse_error() {
        let errors = validate("");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::Parse);
    }

    #[test]
    fn test_signed_wide_year_rejected() {
        assert!(parse_date("+2021-05-03").is_none());
        assert!(parse_date("+262142-12-31").is_none());
        assert!(parse_date("2021-5-3").is_none());
        assert_eq!(parse_date("2021-05-03"), NaiveDate::from_ymd_opt(2021, 5, 3));

        let errors = validate(&csv(&[
            "+262142-12-31,999 day ahead inc hosp,2021-05-04,US,point,NA,1",
        ]));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::Schema);
        assert!(errors[0].message.contains("forecast_date"));
    }

    #[test]
    fn test_day_target_past_date_range() {
        let file = ForecastFile {
            name: NAME.to_string(),
            model: Some("team-model".to_string()),
            filename_date: None,
            rows: vec![ForecastRow {
                row: 1,
                forecast_date: NaiveDate::MAX,
                target: Target::parse("999 day ahead inc hosp").unwrap(),
                target_end_date: NaiveDate::MAX,
                location: "US".to_string(),
                kind: ForecastType::Point,
                quantile: None,
                value: 1.0,
            }],
        };
        let errors = check_target_end_dates(&file);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::ValueRange);
        assert!(errors[0].message.starts_with("row 1:"));
    }

    #[test]
    fn test_bad_file_name() {
        let errors = validate_forecast(
            "2021-02-30-team-model.csv",
            csv(&["2021-02-28,1 wk ahead inc death,2021-03-06,US,point,NA,1"]).as_bytes(),
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::PathFormat);
    }

    #[test]
    fn test_target_round_trips_display() {
        let t = Target::parse("4 wk ahead cum case").unwrap();
        assert_eq!(t.horizon, 4);
        assert_eq!(t.unit, HorizonUnit::Week);
        assert_eq!(t.to_string(), "4 wk ahead cum case");
        assert!(Target::parse("4 wk ahead inc vibes").is_none());
    }

    #[test]
    fn test_warning_within_tolerance() {
        let d = NaiveDate::from_ymd_opt(2021, 5, 3).unwrap();
        assert!(forecast_date_warning(NAME, d, d).is_none());
        assert!(forecast_date_warning(NAME, d, d + Duration::days(1)).is_none());
        assert!(forecast_date_warning(NAME, d, d - Duration::days(1)).is_none());
        let msg = forecast_date_warning(NAME, d, d + Duration::days(2)).unwrap();
        assert!(msg.contains("2 day(s)"));
    }
}

//! hubcheck core - validation engine for forecast hub submissions.
//!
//! Classifies changed paths, validates forecast CSV files and metadata
//! files, and aggregates findings into per-file reports. Nothing in this
//! crate touches the network; callers stage files locally first.

pub mod error;
pub mod forecast;
pub mod metadata;
pub mod path;
pub mod report;
pub mod telemetry;

pub use error::{ErrorKind, HubError, Result, ValidationError};
pub use forecast::{
    check_forecast_date, forecast_date_warning, parse_forecast, staged_forecasts,
    validate_directory, validate_forecast, validate_forecast_file, ForecastFile, ForecastRow,
    ForecastType, HorizonUnit, Target, FRESHNESS_TOLERANCE_DAYS, REQUIRED_COLUMNS,
};
pub use metadata::{
    check_for_metadata, check_metadata_files, find_duplicates, parse_metadata, validate_record,
    MetadataRecord, MetadataReport,
};
pub use path::{classify, file_name, FileCategory, DATA_DIR};
pub use report::{print_output_errors, ErrorReport, FileErrors};
pub use telemetry::init_tracing;

/// hubcheck version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Log output for validation runs.
//!
//! A run's findings are reported twice: once in the pull request comment and
//! once in the build log, where `print_output_errors` writes one `error!`
//! line per finding. The build log is what submitters are pointed to from
//! the comment, so hubcheck's own crates log at the requested level while
//! the HTTP stack stays at `warn` unless `RUST_LOG` says otherwise.
//!
//! Call [`init_tracing`] once at program start; later calls are ignored.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const HUBCHECK_TARGETS: [&str; 3] = ["hubcheck", "hubcheck_core", "hubcheck_ci"];

/// Filter directives used when `RUST_LOG` is unset.
pub fn default_directives(level: Level) -> String {
    let mut directives = vec!["warn".to_string()];
    directives.extend(
        HUBCHECK_TARGETS
            .iter()
            .map(|target| format!("{target}={}", level.as_str().to_lowercase())),
    );
    directives.join(",")
}

/// Install the global subscriber, as JSON lines when `json` is set.
pub fn init_tracing(json: bool, level: Level) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if json {
        registry
            .with(fmt::layer().with_target(false).json())
            .try_init()
    } else {
        registry.with(fmt::layer().with_target(false)).try_init()
    };
    if installed.is_ok() {
        tracing::debug!(json, %level, "Logging initialised");
    }
}

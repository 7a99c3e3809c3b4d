//! Log output for dockhand steps.
//!
//! Everything goes to stderr. Stdout is reserved for workflow commands such
//! as `::error::`, which the Actions runner parses line by line.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Crates whose events follow the requested level; everything else is
/// held at `warn` unless `RUST_LOG` says otherwise.
const DOCKHAND_TARGETS: [&str; 3] = ["dockhand", "dockhand_core", "dockhand_ci"];

/// Shape of the emitted log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines for the step log.
    #[default]
    Text,

    /// Newline-delimited JSON objects.
    Json,
}

impl LogFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// Filter directives used when `RUST_LOG` is unset.
pub fn default_directives(level: Level) -> String {
    let level = level.as_str().to_ascii_lowercase();
    let scoped = DOCKHAND_TARGETS.map(|target| format!("{target}={level}"));
    format!("warn,{}", scoped.join(","))
}

/// Install the global subscriber. Only the first call per process has an
/// effect; later calls return quietly.
pub fn init_tracing(format: LogFormat, level: Level) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    let fmt_layer = match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Text => fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter)
        .try_init()
        .ok();
}

//! Diagnostic logging
//!
//! Build and release progress is emitted as `tracing` events on stderr.
//! User-facing summaries are printed by the CLI directly and are not affected
//! by the log filter.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when neither `RUST_LOG` nor a caller filter is set.
pub const DEFAULT_FILTER: &str = "warn";

/// Filter used for `--verbose`.
pub const VERBOSE_FILTER: &str = "langpack=debug";

/// Pick the filter directive: `RUST_LOG` wins, then the caller's filter,
/// then [`DEFAULT_FILTER`].
pub fn filter_directive(rust_log: Option<&str>, filter: Option<&str>) -> String {
    rust_log.or(filter).unwrap_or(DEFAULT_FILTER).to_string()
}

/// Initialize logging once per process.
///
/// # Arguments
/// * `filter` - Optional filter such as `"debug"` or `"langpack::release=trace"`.
///   Ignored when `RUST_LOG` is set.
pub fn init_logging(filter: Option<&str>) {
    let rust_log = std::env::var("RUST_LOG").ok();
    let directive = filter_directive(rust_log.as_deref(), filter);
    let env_filter = EnvFilter::try_new(&directive).unwrap_or_else(|e| {
        eprintln!("Warning: invalid log filter '{}': {}", directive, e);
        EnvFilter::new(DEFAULT_FILTER)
    });

    // A second initialisation (e.g. from tests) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_ansi(std::env::var_os("NO_COLOR").is_none()),
        )
        .with(env_filter)
        .try_init();
}

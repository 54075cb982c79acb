//! Stderr logging for the `log` facade.
//!
//! Records from the `nonogram_*` crates are printed at the requested level.
//! Everything else (codecs, other dependencies) is capped at `Warn` so that
//! `-vvv` on the CLI stays readable.

use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

const OWN_PREFIX: &str = "nonogram_";

/// Map a `-v` count to a level: 0 warn, 1 info, 2 debug, 3+ trace.
pub fn level_for_verbosity(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

struct StderrLogger {
    level: LevelFilter,
    started: Instant,
}

impl StderrLogger {
    fn limit(&self, target: &str) -> LevelFilter {
        if target.starts_with(OWN_PREFIX) {
            self.level
        } else {
            self.level.min(LevelFilter::Warn)
        }
    }
}

// "nonogram_crosses::detector" -> "crosses::detector"
fn short_target(target: &str) -> &str {
    target.strip_prefix(OWN_PREFIX).unwrap_or(target)
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.limit(metadata.target())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let ms = self.started.elapsed().as_millis();
        let mut out = std::io::stderr().lock();
        let _ = writeln!(
            out,
            "{:>6}ms {:<5} {}: {}",
            ms,
            record.level(),
            short_target(record.target()),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<StderrLogger> = OnceLock::new();

/// Install the stderr logger. Later calls keep the first level.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_some() {
        return Ok(());
    }
    let logger = LOGGER.get_or_init(|| StderrLogger {
        level,
        started: Instant::now(),
    });
    log::set_logger(logger)?;
    log::set_max_level(level);
    Ok(())
}

/// Output format of [`init_tracing`].
#[cfg(feature = "tracing")]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TraceFormat {
    /// One line per event, uptime timestamps.
    #[default]
    Compact,
    /// Newline-delimited JSON with flattened event fields.
    Json,
}

/// `EnvFilter` directives showing the `nonogram_*` crates at `level` and
/// everything else at `warn` or quieter.
pub fn default_directives(level: LevelFilter) -> String {
    let own = level.as_str().to_ascii_lowercase();
    let other = level.min(LevelFilter::Warn).as_str().to_ascii_lowercase();
    ["nonogram_grid", "nonogram_grid_core", "nonogram_lattice", "nonogram_crosses"]
        .iter()
        .fold(other, |acc, krate| format!("{acc},{krate}={own}"))
}

/// Install a `tracing` fmt subscriber reporting span durations on close.
///
/// `RUST_LOG` takes precedence; without it the filter is
/// [`default_directives`] for `level`. A subscriber installed earlier is
/// left in place.
#[cfg(feature = "tracing")]
pub fn init_tracing(format: TraceFormat, level: LevelFilter) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));
    let builder = fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE);
    let _ = match format {
        TraceFormat::Compact => builder
            .compact()
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init(),
        TraceFormat::Json => builder.json().flatten_event(true).finish().try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logger(level: LevelFilter) -> StderrLogger {
        StderrLogger {
            level,
            started: Instant::now(),
        }
    }

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(level_for_verbosity(0), LevelFilter::Warn);
        assert_eq!(level_for_verbosity(2), LevelFilter::Debug);
        assert_eq!(level_for_verbosity(9), LevelFilter::Trace);
    }

    #[test]
    fn foreign_targets_are_capped_at_warn() {
        let l = logger(LevelFilter::Debug);
        assert_eq!(l.limit("nonogram_crosses::seed"), LevelFilter::Debug);
        assert_eq!(l.limit("png::decoder"), LevelFilter::Warn);
        assert_eq!(logger(LevelFilter::Error).limit("png"), LevelFilter::Error);
    }

    #[test]
    fn own_prefix_is_stripped() {
        assert_eq!(short_target("nonogram_lattice::augment"), "lattice::augment");
        assert_eq!(short_target("image::codecs"), "image::codecs");
    }

    #[test]
    fn directives_follow_the_requested_level() {
        assert_eq!(
            default_directives(LevelFilter::Debug),
            "warn,nonogram_grid=debug,nonogram_grid_core=debug,\
             nonogram_lattice=debug,nonogram_crosses=debug"
        );
        assert!(default_directives(LevelFilter::Error).starts_with("error,"));
    }
}

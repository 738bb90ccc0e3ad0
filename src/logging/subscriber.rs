//! Console and log-file layers sharing one event classification.
use std::fs;
use std::io::{self, Write as _};
use std::path::Path;
use std::sync::Mutex;

use tracing::{Event, Level, Metadata, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

use super::logger::{DRY_RUN_TARGET, STAGE_TARGET};
use super::utils::{format_utc_datetime, format_utc_time, log_file_path, strip_ansi};

/// How an event is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Kind {
    /// Phase header.
    Stage,
    /// Action skipped because of `--dry-run`.
    DryRun,
    Error,
    Warn,
    Info,
    Debug,
}

impl Kind {
    /// Classify by level, then by the logger's dedicated targets.
    pub(super) fn of(metadata: &Metadata<'_>) -> Self {
        match (*metadata.level(), metadata.target()) {
            (Level::ERROR, _) => Self::Error,
            (Level::WARN, _) => Self::Warn,
            (Level::INFO, STAGE_TARGET) => Self::Stage,
            (Level::INFO, DRY_RUN_TARGET) => Self::DryRun,
            (Level::INFO, _) => Self::Info,
            _ => Self::Debug,
        }
    }

    /// Terminal line for `msg`.
    pub(super) fn console(self, msg: &str) -> String {
        match self {
            Self::Stage => format!("\x1b[1;34m==>\x1b[0m \x1b[1m{msg}\x1b[0m"),
            Self::DryRun => format!("  \x1b[33m[dry run]\x1b[0m {msg}"),
            Self::Error => format!("\x1b[31merror:\x1b[0m {msg}"),
            Self::Warn => format!("\x1b[33mwarning:\x1b[0m {msg}"),
            Self::Info => format!("  {msg}"),
            Self::Debug => format!("  \x1b[2m{msg}\x1b[0m"),
        }
    }

    /// Log-file line for `msg`, stamped with `time` and free of ANSI codes.
    pub(super) fn plain(self, time: &str, msg: &str) -> String {
        let msg = strip_ansi(msg);
        let tag = match self {
            Self::Stage => "==>",
            Self::DryRun => "[dry run]",
            Self::Error => "[error]",
            Self::Warn => "[warn]",
            Self::Debug => "[debug]",
            Self::Info => return format!("[{time}] {msg}"),
        };
        format!("[{time}] {tag} {msg}")
    }

    const fn to_stderr(self) -> bool {
        matches!(self, Self::Error | Self::Warn)
    }
}

/// The `message` field of `event`.
fn message(event: &Event<'_>) -> String {
    struct Visitor(String);

    impl tracing::field::Visit for Visitor {
        fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
            if field.name() == "message" {
                value.clone_into(&mut self.0);
            }
        }

        fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
            if field.name() == "message" {
                self.0 = format!("{value:?}");
            }
        }
    }

    let mut visitor = Visitor(String::new());
    event.record(&mut visitor);
    visitor.0
}

/// First lines of every log file: what ran, on which entry document, when.
pub(super) fn run_header(command: &str, entry: Option<&Path>) -> String {
    let version =
        option_env!("HOMEBUILD_VERSION").unwrap_or(concat!("dev-", env!("CARGO_PKG_VERSION")));
    let entry = entry.map_or_else(|| "-".to_string(), |p| p.display().to_string());
    format!(
        "# homebuild {version}\n\
         # command: {command}\n\
         # entry: {entry}\n\
         # started: {} UTC\n",
        format_utc_datetime()
    )
}

/// Writes warnings and errors to stderr, everything else to stdout.
struct ConsoleLayer;

impl<S: Subscriber> Layer<S> for ConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let kind = Kind::of(event.metadata());
        let line = kind.console(&message(event));
        if kind.to_stderr() {
            writeln!(io::stderr().lock(), "{line}").ok();
        } else {
            writeln!(io::stdout().lock(), "{line}").ok();
        }
    }
}

/// Appends every event to one log file, whatever the console verbosity.
#[derive(Debug)]
pub(super) struct FileLayer {
    file: Mutex<fs::File>,
}

impl FileLayer {
    /// Truncate `path`, write `header`, and keep the file open for appends.
    pub(super) fn create(path: &Path, header: &str) -> io::Result<Self> {
        let mut file = fs::File::create(path)?;
        file.write_all(header.as_bytes())?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl<S: Subscriber> Layer<S> for FileLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let line = Kind::of(event.metadata()).plain(&format_utc_time(), &message(event));
        if let Ok(mut file) = self.file.lock() {
            writeln!(file, "{line}").ok();
        }
    }
}

/// Install the global [`tracing`] subscriber for `command`.
///
/// `debug` reaches the console only when `verbose`. The log file under
/// `$XDG_CACHE_HOME/homebuild/` gets every event and a header naming
/// `entry`; it is skipped silently if it can't be created. Call once,
/// before any logging.
pub fn init_subscriber(verbose: bool, command: &str, entry: Option<&Path>) {
    use tracing_subscriber::filter::LevelFilter;
    use tracing_subscriber::layer::SubscriberExt as _;
    use tracing_subscriber::util::SubscriberInitExt as _;

    let console_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let file_layer = log_file_path(command)
        .and_then(|path| FileLayer::create(&path, &run_header(command, entry)).ok())
        .map(|layer| layer.with_filter(LevelFilter::DEBUG));

    tracing_subscriber::registry()
        .with(ConsoleLayer.with_filter(console_level))
        .with(file_layer)
        .init();
}

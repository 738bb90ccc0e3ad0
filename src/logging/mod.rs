//! Console and file logging over [`tracing`], plus the per-run step summary.

mod logger;
mod subscriber;
mod types;
mod utils;

pub use logger::Logger;
pub use subscriber::init_subscriber;
pub use types::{Log, TaskEntry, TaskStatus};

/// A [`Logger`] whose events land in a scratch log file through a
/// thread-local subscriber. Dropping it restores the previous dispatcher.
#[cfg(test)]
pub(crate) struct CapturedLog {
    pub(crate) log: Logger,
    path: std::path::PathBuf,
    _guard: tracing::dispatcher::DefaultGuard,
    _dir: tempfile::TempDir,
}

#[cfg(test)]
#[allow(clippy::expect_used)]
impl CapturedLog {
    pub(crate) fn new() -> Self {
        use tracing_subscriber::{Layer as _, filter::LevelFilter, layer::SubscriberExt as _};

        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("test.log");
        let header = subscriber::run_header("test", None);
        let layer = subscriber::FileLayer::create(&path, &header).expect("create log file");
        let dispatch = tracing::Dispatch::new(
            tracing_subscriber::registry().with(layer.with_filter(LevelFilter::DEBUG)),
        );
        Self {
            log: Logger::with_log_file(Some(path.clone())),
            path,
            _guard: tracing::dispatcher::set_default(&dispatch),
            _dir: dir,
        }
    }

    /// Everything written to the log file so far.
    pub(crate) fn contents(&self) -> String {
        std::fs::read_to_string(&self.path).expect("read log file")
    }
}

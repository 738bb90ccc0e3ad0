// Shared helpers for integration tests.
//
// Provides a temporary-directory-backed configuration tree plus a scratch
// home directory, and an in-memory logger, so each integration test can
// resolve and build without touching the real home directory.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use homebuild::build::Context;
use homebuild::config::{Resolver, Settings};
use homebuild::exec::{Executor, SystemExecutor};
use homebuild::logging::{Log, TaskStatus};

/// A scratch layout: `conf/` holds documents, `home/` stands in for `$HOME`.
#[derive(Debug)]
pub struct Fixture {
    dir: tempfile::TempDir,
    conf: PathBuf,
    home: PathBuf,
    settings: Settings,
}

impl Fixture {
    /// Create an empty fixture whose scripts directory is `home/.bin`.
    pub fn new() -> Self {
        Self::with_conf_dir("conf")
    }

    /// Like [`Fixture::new`], with documents under `name/` instead of `conf/`.
    pub fn with_conf_dir(name: &str) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let conf = dir.path().join(name);
        std::fs::create_dir_all(&conf).expect("create conf dir");
        let home = dir.path().join("home");
        std::fs::create_dir_all(&home).expect("create home dir");
        Self {
            dir,
            conf,
            home,
            settings: Settings::default(),
        }
    }

    /// Write a file under the documents directory, creating parent directories.
    #[must_use]
    pub fn file(self, relative: &str, content: &str) -> Self {
        let path = self.conf(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dir");
        }
        std::fs::write(&path, content).expect("write file");
        self
    }

    /// Path of `relative` under the documents directory.
    pub fn conf(&self, relative: &str) -> PathBuf {
        self.conf.join(relative)
    }

    /// Path of `relative` under the scratch home.
    pub fn home(&self, relative: &str) -> PathBuf {
        self.home.join(relative)
    }

    /// Root of the fixture, for redacting snapshots.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Resolver over default settings and the scratch home.
    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.settings, &self.home)
    }

    /// Scripts directory inside the scratch home (`home/.bin`).
    pub fn scripts_bin(&self) -> PathBuf {
        self.settings.scripts_bin(&self.home)
    }

    /// Build context over the scratch home, running scripts for real.
    pub fn context(&self, dry_run: bool) -> (Context, Arc<MemoryLog>) {
        self.context_with(Arc::new(SystemExecutor), dry_run)
    }

    /// Build context with a custom executor.
    pub fn context_with(
        &self,
        executor: Arc<dyn Executor>,
        dry_run: bool,
    ) -> (Context, Arc<MemoryLog>) {
        let log = Arc::new(MemoryLog::default());
        let ctx = Context {
            log: Arc::clone(&log) as Arc<dyn Log>,
            executor,
            scripts_bin: self.scripts_bin(),
            dry_run,
        };
        (ctx, log)
    }
}

/// Logger that keeps messages in memory.
#[derive(Debug, Default)]
pub struct MemoryLog {
    lines: Mutex<Vec<String>>,
    tasks: Mutex<Vec<(String, TaskStatus)>>,
}

impl MemoryLog {
    /// Every message, prefixed with its kind.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().expect("log lock").clone()
    }

    /// Recorded phase outcomes.
    pub fn tasks(&self) -> Vec<(String, TaskStatus)> {
        self.tasks.lock().expect("log lock").clone()
    }

    fn push(&self, kind: &str, msg: &str) {
        self.lines
            .lock()
            .expect("log lock")
            .push(format!("{kind}: {msg}"));
    }
}

impl Log for MemoryLog {
    fn stage(&self, msg: &str) {
        self.push("stage", msg);
    }
    fn info(&self, msg: &str) {
        self.push("info", msg);
    }
    fn debug(&self, msg: &str) {
        self.push("debug", msg);
    }
    fn warn(&self, msg: &str) {
        self.push("warn", msg);
    }
    fn error(&self, msg: &str) {
        self.push("error", msg);
    }
    fn dry_run(&self, msg: &str) {
        self.push("dry_run", msg);
    }
    fn record_task(&self, name: &str, status: TaskStatus, _message: Option<&str>) {
        self.tasks
            .lock()
            .expect("log lock")
            .push((name.to_string(), status));
    }
}

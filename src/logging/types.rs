//! Core logging types: step entries, status, and the [`Log`] trait.

/// Outcome of one build step, kept for the run summary.
#[derive(Debug, Clone)]
pub struct TaskEntry {
    /// Human-readable step name (e.g. `link files (pre-build)`).
    pub name: String,
    /// Final status of the step.
    pub status: TaskStatus,
    /// Optional detail message (counts, skip reason or error description).
    pub message: Option<String>,
}

/// Status of a completed build step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Step completed successfully.
    Ok,
    /// Step had nothing to do.
    Skipped,
    /// Step ran in dry-run mode; no changes were applied.
    DryRun,
    /// Step failed and aborted the build.
    Failed,
}

/// Abstraction over logging backends.
///
/// [`Logger`](super::logger::Logger) is the production implementation;
/// tests substitute recorders that capture messages in memory.
pub trait Log: Send + Sync {
    /// Log a stage header (major section).
    fn stage(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Log a debug message (may be suppressed on console).
    fn debug(&self, msg: &str);
    /// Log a warning message.
    fn warn(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
    /// Log a dry-run action message.
    fn dry_run(&self, msg: &str);
    /// Record a step result for the summary.
    fn record_task(&self, name: &str, status: TaskStatus, message: Option<&str>);
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn task_status_equality() {
        assert_eq!(TaskStatus::Ok, TaskStatus::Ok);
        assert_ne!(TaskStatus::Ok, TaskStatus::Failed);
        assert_ne!(TaskStatus::Skipped, TaskStatus::DryRun);
    }
}

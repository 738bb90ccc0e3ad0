//! Filesystem changes a build makes: links into the home directory and
//! executable bits on scripts. Each one inspects the disk before touching it.
pub mod chmod;
pub mod symlink;

use anyhow::Result;

/// What a resource found on disk.
///
/// # Examples
///
/// ```
/// use homebuild::resources::ResourceState;
///
/// let stale = ResourceState::Incorrect { current: "points to ~/old/vimrc".into() };
/// let gone = ResourceState::Invalid { reason: "source does not exist: vimrc".into() };
///
/// assert!(matches!(stale, ResourceState::Incorrect { .. }));
/// assert_ne!(gone, ResourceState::Correct);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceState {
    /// Nothing at the target yet.
    Missing,
    /// Already as desired.
    Correct,
    /// Something else is there and will be replaced.
    Incorrect {
        /// What is there now.
        current: String,
    },
    /// Can't be applied, e.g. the link source is missing.
    Invalid {
        /// Why not.
        reason: String,
    },
}

/// What [`Resource::apply`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceChange {
    /// The disk was changed.
    Applied,
    /// The disk already matched; nothing was touched.
    AlreadyCorrect,
}

/// A single desired filesystem state.
pub trait Resource {
    /// Short form for log lines, e.g. `~/.vimrc -> conf/vimrc`.
    fn description(&self) -> String;

    /// Inspect the disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the target can't be inspected.
    fn current_state(&self) -> Result<ResourceState>;

    /// Reach the desired state. A second call reports
    /// [`ResourceChange::AlreadyCorrect`].
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure or when the state is
    /// [`ResourceState::Invalid`].
    fn apply(&self) -> Result<ResourceChange>;
}

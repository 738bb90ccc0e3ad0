//! Force-symlink resource.
use anyhow::{Context as _, Result, bail};
use std::path::{Path, PathBuf};

use super::{Resource, ResourceChange, ResourceState};

/// A symlink at `target` pointing to `source`.
///
/// Applying replaces whatever is at `target` (file, directory or symlink)
/// with the link. Replace-then-create is not atomic against concurrent
/// writers.
#[derive(Debug, Clone)]
pub struct SymlinkResource {
    /// What the symlink points to.
    pub source: PathBuf,
    /// Where the symlink is created.
    pub target: PathBuf,
}

impl SymlinkResource {
    /// Create a new symlink resource.
    #[must_use]
    pub const fn new(source: PathBuf, target: PathBuf) -> Self {
        Self { source, target }
    }
}

impl Resource for SymlinkResource {
    fn description(&self) -> String {
        format!("{} -> {}", self.target.display(), self.source.display())
    }

    fn current_state(&self) -> Result<ResourceState> {
        if !self.source.exists() {
            return Ok(ResourceState::Invalid {
                reason: format!("source does not exist: {}", self.source.display()),
            });
        }

        std::fs::read_link(&self.target).map_or_else(
            |_| {
                if self.target.symlink_metadata().is_ok() {
                    Ok(ResourceState::Incorrect {
                        current: "target is not a symlink".to_string(),
                    })
                } else {
                    Ok(ResourceState::Missing)
                }
            },
            |existing| {
                if existing == self.source {
                    Ok(ResourceState::Correct)
                } else {
                    Ok(ResourceState::Incorrect {
                        current: format!("points to {}", existing.display()),
                    })
                }
            },
        )
    }

    fn apply(&self) -> Result<ResourceChange> {
        match self.current_state()? {
            ResourceState::Correct => return Ok(ResourceChange::AlreadyCorrect),
            ResourceState::Invalid { reason } => bail!(reason),
            ResourceState::Missing | ResourceState::Incorrect { .. } => {}
        }

        clear_destination(&self.target)?;
        create_symlink(&self.source, &self.target)
            .with_context(|| format!("create link: {}", self.target.display()))?;

        Ok(ResourceChange::Applied)
    }
}

/// Make room for a link at `path`: create its parent directories and remove
/// whatever occupies it. Symlinks are removed, never followed.
fn clear_destination(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create parent: {}", parent.display()))?;
    }
    match path.symlink_metadata() {
        Err(_) => Ok(()),
        Ok(meta) if meta.is_dir() => std::fs::remove_dir_all(path),
        Ok(_) => std::fs::remove_file(path),
    }
    .with_context(|| format!("remove existing: {}", path.display()))
}

/// Create a symlink at `link` pointing to `target`.
fn create_symlink(target: &Path, link: &Path) -> Result<()> {
    #[cfg(unix)]
    std::os::unix::fs::symlink(target, link)?;

    #[cfg(windows)]
    if target.is_dir() {
        std::os::windows::fs::symlink_dir(target, link)?;
    } else {
        std::os::windows::fs::symlink_file(target, link)?;
    }

    Ok(())
}

#[cfg(all(test, unix))]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn source_file(dir: &Path) -> PathBuf {
        let source = dir.join("source");
        std::fs::write(&source, "test").unwrap();
        source
    }

    #[test]
    fn description_names_both_paths() {
        let resource = SymlinkResource::new(PathBuf::from("/source"), PathBuf::from("/target"));
        assert_eq!(resource.description(), "/target -> /source");
    }

    #[test]
    fn invalid_when_source_missing() {
        let dir = tempfile::tempdir().unwrap();
        let resource =
            SymlinkResource::new(dir.path().join("nonexistent"), dir.path().join("target"));
        assert!(matches!(
            resource.current_state().unwrap(),
            ResourceState::Invalid { .. }
        ));
        let err = resource.apply().unwrap_err();
        assert!(err.to_string().contains("source does not exist"), "{err}");
    }

    #[test]
    fn creates_missing_link_and_parents() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_file(dir.path());
        let target = dir.path().join("a/b/target");
        let resource = SymlinkResource::new(source.clone(), target.clone());

        assert_eq!(resource.current_state().unwrap(), ResourceState::Missing);
        assert_eq!(resource.apply().unwrap(), ResourceChange::Applied);
        assert_eq!(std::fs::read_link(&target).unwrap(), source);
    }

    #[test]
    fn applying_twice_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_file(dir.path());
        let target = dir.path().join("target");
        let resource = SymlinkResource::new(source.clone(), target.clone());

        resource.apply().unwrap();
        let first = std::fs::read_link(&target).unwrap();
        assert_eq!(resource.apply().unwrap(), ResourceChange::AlreadyCorrect);
        assert_eq!(std::fs::read_link(&target).unwrap(), first);
        assert_eq!(resource.current_state().unwrap(), ResourceState::Correct);
    }

    #[test]
    fn replaces_link_to_other_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_file(dir.path());
        let other = dir.path().join("other");
        std::fs::write(&other, "other").unwrap();
        let target = dir.path().join("target");
        std::os::unix::fs::symlink(&other, &target).unwrap();

        let resource = SymlinkResource::new(source.clone(), target.clone());
        assert!(matches!(
            resource.current_state().unwrap(),
            ResourceState::Incorrect { .. }
        ));
        resource.apply().unwrap();
        assert_eq!(std::fs::read_link(&target).unwrap(), source);
    }

    #[test]
    fn replaces_regular_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_file(dir.path());
        let target = dir.path().join("target");
        std::fs::write(&target, "stale").unwrap();

        SymlinkResource::new(source.clone(), target.clone())
            .apply()
            .unwrap();
        assert_eq!(std::fs::read_link(&target).unwrap(), source);
    }

    #[test]
    fn replaces_real_directory() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_file(dir.path());
        let target = dir.path().join("target");
        std::fs::create_dir_all(target.join("nested")).unwrap();
        std::fs::write(target.join("nested/f"), "x").unwrap();

        SymlinkResource::new(source.clone(), target.clone())
            .apply()
            .unwrap();
        assert_eq!(std::fs::read_link(&target).unwrap(), source);
    }

    #[test]
    fn replaces_broken_symlink() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_file(dir.path());
        let target = dir.path().join("target");
        std::os::unix::fs::symlink("/nonexistent/target", &target).unwrap();

        SymlinkResource::new(source.clone(), target.clone())
            .apply()
            .unwrap();
        assert_eq!(std::fs::read_link(&target).unwrap(), source);
    }

    #[test]
    fn replacing_a_directory_symlink_keeps_its_contents() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_file(dir.path());
        let real = dir.path().join("real");
        std::fs::create_dir(&real).unwrap();
        std::fs::write(real.join("keep"), "x").unwrap();
        let target = dir.path().join("target");
        std::os::unix::fs::symlink(&real, &target).unwrap();

        SymlinkResource::new(source.clone(), target.clone())
            .apply()
            .unwrap();
        assert_eq!(std::fs::read_link(&target).unwrap(), source);
        assert!(real.join("keep").exists());
    }
}

//! File permission resource.
use anyhow::{Context as _, Result, bail};
use std::path::PathBuf;

use super::{Resource, ResourceChange, ResourceState};

/// Mode given to scripts before they are run or published.
pub const EXECUTABLE_MODE: u32 = 0o755;

/// Permission bits on a regular file (Unix only; a no-op elsewhere).
#[derive(Debug, Clone)]
pub struct ChmodResource {
    /// Target file path (absolute).
    pub target: PathBuf,
    /// Desired permission bits, e.g. `0o755`.
    pub mode: u32,
}

impl ChmodResource {
    /// Create a new chmod resource.
    #[must_use]
    pub const fn new(target: PathBuf, mode: u32) -> Self {
        Self { target, mode }
    }

    /// Make `target` executable (`0o755`).
    #[must_use]
    pub const fn executable(target: PathBuf) -> Self {
        Self::new(target, EXECUTABLE_MODE)
    }
}

impl Resource for ChmodResource {
    fn description(&self) -> String {
        format!("{:o} {}", self.mode, self.target.display())
    }

    fn current_state(&self) -> Result<ResourceState> {
        if !self.target.is_file() {
            return Ok(ResourceState::Invalid {
                reason: format!("not a regular file: {}", self.target.display()),
            });
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let current = std::fs::metadata(&self.target)?.permissions().mode() & 0o7777;
            if current == self.mode {
                Ok(ResourceState::Correct)
            } else {
                Ok(ResourceState::Incorrect {
                    current: format!("{current:o}"),
                })
            }
        }

        #[cfg(not(unix))]
        Ok(ResourceState::Correct)
    }

    fn apply(&self) -> Result<ResourceChange> {
        match self.current_state()? {
            ResourceState::Correct => Ok(ResourceChange::AlreadyCorrect),
            ResourceState::Invalid { reason } => bail!(reason),
            ResourceState::Missing | ResourceState::Incorrect { .. } => {
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    std::fs::set_permissions(
                        &self.target,
                        std::fs::Permissions::from_mode(self.mode),
                    )
                    .with_context(|| format!("set permissions: {}", self.target.display()))?;
                }
                Ok(ResourceChange::Applied)
            }
        }
    }
}

#[cfg(all(test, unix))]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn mode_of(path: &std::path::Path) -> u32 {
        std::fs::metadata(path).unwrap().permissions().mode() & 0o7777
    }

    #[test]
    fn description_shows_octal_mode() {
        let resource = ChmodResource::executable(PathBuf::from("/bin/x"));
        assert_eq!(resource.description(), "755 /bin/x");
    }

    #[test]
    fn makes_file_executable() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("script.sh");
        std::fs::write(&file, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&file, std::fs::Permissions::from_mode(0o644)).unwrap();

        let resource = ChmodResource::executable(file.clone());
        assert_eq!(
            resource.current_state().unwrap(),
            ResourceState::Incorrect {
                current: "644".to_string()
            }
        );
        assert_eq!(resource.apply().unwrap(), ResourceChange::Applied);
        assert_eq!(mode_of(&file), 0o755);
        assert_eq!(resource.apply().unwrap(), ResourceChange::AlreadyCorrect);
    }

    #[test]
    fn missing_file_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let resource = ChmodResource::executable(dir.path().join("absent"));
        assert!(matches!(
            resource.current_state().unwrap(),
            ResourceState::Invalid { .. }
        ));
        assert!(resource.apply().is_err());
    }

    #[test]
    fn directory_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let resource = ChmodResource::executable(dir.path().to_path_buf());
        assert!(resource.apply().is_err());
    }
}

pub mod build;
pub mod plan;
pub mod version;

use std::path::PathBuf;

use anyhow::Result;

use crate::cli::GlobalOpts;
use crate::config::{Resolver, Settings, settings};
use crate::logging::Log;

/// Home directory and settings shared by the commands that resolve a tree.
#[derive(Debug)]
pub struct CommandSetup {
    /// The user's home directory.
    pub home: PathBuf,
    /// Process-level settings.
    pub settings: Settings,
}

impl CommandSetup {
    /// Locate the home directory and load the settings file.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory is unknown or the settings
    /// file exists but is malformed.
    pub fn init(global: &GlobalOpts, log: &dyn Log) -> Result<Self> {
        let home = settings::home_dir()?;
        let path = global
            .settings
            .clone()
            .unwrap_or_else(|| settings::default_path(&home));
        log.debug(&format!("settings: {}", path.display()));
        let settings = Settings::load(&path)?;
        Ok(Self { home, settings })
    }

    /// A resolver over these settings.
    #[must_use]
    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.settings, &self.home)
    }

    /// Absolute path of the user scripts directory.
    #[must_use]
    pub fn scripts_bin(&self) -> PathBuf {
        self.settings.scripts_bin(&self.home)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::config::test_helpers::ConfigDir;

    #[test]
    fn resolver_uses_loaded_settings_and_home() {
        let dir = ConfigDir::new()
            .file("root.toml", "imports = [\"shell\"]\n[host]\nname = \"box\"\n")
            .file("shell/init.toml", "[files.rc]\nsrc = \"rc\"\ndest = \"~/.rc\"\n");
        let setup = CommandSetup {
            home: dir.home().to_path_buf(),
            settings: Settings {
                default_module_filename: "init.toml".to_string(),
                ..Settings::default()
            },
        };

        let tree = setup.resolver().resolve(&dir.path("root.toml")).unwrap();
        let shell = tree.children(tree.root()).next().unwrap();
        assert_eq!(shell.path, dir.path("shell/init.toml"));
        assert_eq!(shell.links[0].destination, dir.home().join(".rc"));
        assert_eq!(setup.scripts_bin(), setup.settings.scripts_bin(dir.home()));
    }
}

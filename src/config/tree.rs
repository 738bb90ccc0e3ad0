//! Resolution of the import tree rooted at an entry document.
//!
//! Every document is resolved into a [`ConfigNode`] stored in a flat arena;
//! children are referenced by [`NodeId`]. Resolution runs off an explicit
//! work stack rather than recursion, so import depth never maps onto call
//! depth. Each stack frame carries the chain of documents currently being
//! resolved (root to parent) and the host inherited from above, which makes
//! cycle detection a plain membership test on that frame's chain.
//!
//! The same document may be imported from several places; every import site
//! gets its own node. Only an import that points back into its own ancestor
//! chain is rejected.
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::document::{self, Document, sub_table};
use super::link::LinkEntry;
use super::merge::overlay;
use super::script::ScriptEntry;
use super::settings::Settings;
use crate::error::ConfigError;

/// Top-level keys with a fixed meaning; a host section can't share a name
/// with any of them.
const RESERVED_KEYS: [&str; 4] = ["host", "imports", "files", "scripts"];

/// Index of a node inside a [`ConfigTree`].
pub type NodeId = usize;

/// One resolved document within the import tree.
#[derive(Debug, Clone)]
pub struct ConfigNode {
    /// Normalized absolute path of the document.
    pub path: PathBuf,
    /// Host bound for the whole tree.
    pub hostname: String,
    /// Children in import declaration order.
    pub imports: Vec<NodeId>,
    /// File links after the host overlay.
    pub links: Vec<LinkEntry>,
    /// Scripts after the host overlay.
    pub scripts: Vec<ScriptEntry>,
}

/// A fully resolved, read-only import tree.
#[derive(Debug, Clone)]
pub struct ConfigTree {
    nodes: Vec<ConfigNode>,
}

/// Pending work for the resolver.
enum Frame {
    /// Load a document, bind its host, validate and schedule its imports.
    Enter {
        path: PathBuf,
        ancestors: Vec<PathBuf>,
        host: Option<String>,
        parent: Option<NodeId>,
    },
    /// All imports of the node are resolved; materialize its entries.
    Exit(NodeId),
}

/// Resolves documents against one set of settings and one home directory.
#[derive(Debug)]
pub struct Resolver<'a> {
    settings: &'a Settings,
    home: &'a Path,
}

impl<'a> Resolver<'a> {
    /// Create a resolver.
    #[must_use]
    pub const fn new(settings: &'a Settings, home: &'a Path) -> Self {
        Self { settings, home }
    }

    /// Resolve the tree rooted at `entry`.
    ///
    /// The entry document must declare `[host]`; every imported document
    /// inherits it.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] encountered anywhere in the tree.
    /// Nothing is returned for a partially resolved tree.
    pub fn resolve(&self, entry: &Path) -> Result<ConfigTree, ConfigError> {
        let entry = document::absolute(entry).map_err(|e| ConfigError::Unreadable {
            path: entry.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut nodes: Vec<ConfigNode> = Vec::new();
        let mut pending: Vec<Option<Document>> = Vec::new();
        let mut stack = vec![Frame::Enter {
            path: entry,
            ancestors: Vec::new(),
            host: None,
            parent: None,
        }];

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Enter {
                    path,
                    ancestors,
                    host,
                    parent,
                } => {
                    tracing::debug!("resolving {}", path.display());
                    let doc = Document::load(&path)?;
                    let hostname = bind_host(&doc, host.as_deref())?;
                    let imports = self.import_paths(&doc)?;
                    validate_imports(&doc.path, &imports, &ancestors)?;

                    let id = nodes.len();
                    nodes.push(ConfigNode {
                        path: doc.path.clone(),
                        hostname: hostname.clone(),
                        imports: Vec::with_capacity(imports.len()),
                        links: Vec::new(),
                        scripts: Vec::new(),
                    });
                    pending.push(Some(doc));
                    if let Some(parent) = parent
                        && let Some(parent) = nodes.get_mut(parent)
                    {
                        parent.imports.push(id);
                    }

                    stack.push(Frame::Exit(id));
                    let mut chain = ancestors;
                    chain.push(path);
                    for import in imports.into_iter().rev() {
                        stack.push(Frame::Enter {
                            path: import,
                            ancestors: chain.clone(),
                            host: Some(hostname.clone()),
                            parent: Some(id),
                        });
                    }
                }
                Frame::Exit(id) => {
                    let (Some(node), Some(doc)) =
                        (nodes.get_mut(id), pending.get_mut(id).and_then(Option::take))
                    else {
                        continue;
                    };
                    let (links, scripts) = self.entries(&doc, &node.hostname)?;
                    node.links = links;
                    node.scripts = scripts;
                }
            }
        }

        Ok(ConfigTree { nodes })
    }

    /// Absolute paths of the document's imports, in declaration order.
    ///
    /// An import that does not name a document file is treated as a
    /// directory holding the default module file.
    fn import_paths(&self, doc: &Document) -> Result<Vec<PathBuf>, ConfigError> {
        let Some(raw) = doc.table.get("imports") else {
            return Ok(Vec::new());
        };
        let list = raw.as_array().ok_or_else(|| {
            doc.invalid(format!(
                "'imports' must be an array, found {}",
                raw.type_str()
            ))
        })?;

        let suffix = format!(".{}", self.settings.document_extension);
        list.iter()
            .map(|item| {
                let rel = item.as_str().ok_or_else(|| {
                    doc.invalid(format!(
                        "'imports' entries must be strings, found {}",
                        item.type_str()
                    ))
                })?;
                let path = document::resolve_relative(doc.dir(), rel);
                Ok(if rel.ends_with(&suffix) {
                    path
                } else {
                    path.join(&self.settings.default_module_filename)
                })
            })
            .collect()
    }

    /// Materialize the host-merged link and script entries of `doc`.
    fn entries(
        &self,
        doc: &Document,
        hostname: &str,
    ) -> Result<(Vec<LinkEntry>, Vec<ScriptEntry>), ConfigError> {
        let host_section = doc.table(hostname)?;
        let host_map = |key: &str| {
            host_section
                .map(|section| sub_table(section, key))
                .transpose()
                .map(Option::flatten)
                .map_err(|message| doc.invalid(format!("in [{hostname}]: {message}")))
        };

        let files = overlay(doc.table("files")?, host_map("files")?);
        let scripts = overlay(doc.table("scripts")?, host_map("scripts")?);

        let links = files
            .iter()
            .map(|(name, value)| LinkEntry::from_value(name, value, &doc.path, self.home))
            .collect::<Result<Vec<_>, _>>()?;
        let scripts = scripts
            .iter()
            .map(|(name, value)| ScriptEntry::from_value(name, value, &doc.path))
            .collect::<Result<Vec<_>, _>>()?;

        Ok((links, scripts))
    }
}

/// Decide the effective host of `doc`.
///
/// A host is declared only by a document that is not reached via import;
/// every imported document inherits its ancestor's host.
fn bind_host(doc: &Document, inherited: Option<&str>) -> Result<String, ConfigError> {
    let declared = doc.table.get("host");
    match (inherited, declared) {
        (Some(host), Some(_)) => Err(ConfigError::HostConflict {
            path: doc.path.clone(),
            inherited: host.to_string(),
        }),
        (Some(host), None) => Ok(host.to_string()),
        (None, None) => Err(ConfigError::MissingHost {
            path: doc.path.clone(),
        }),
        (None, Some(toml::Value::Table(table))) => match table.get("name") {
            Some(toml::Value::String(name)) if RESERVED_KEYS.contains(&name.as_str()) => {
                Err(ConfigError::ReservedHostName {
                    path: doc.path.clone(),
                    name: name.clone(),
                })
            }
            Some(toml::Value::String(name)) => Ok(name.clone()),
            Some(other) => Err(doc.invalid(format!(
                "'host.name' must be a string, found {}",
                other.type_str()
            ))),
            None => Err(ConfigError::MissingHost {
                path: doc.path.clone(),
            }),
        },
        (None, Some(other)) => Err(doc.invalid(format!(
            "'host' must be a table, found {}",
            other.type_str()
        ))),
    }
}

/// Check the list-level import invariants before any import is resolved.
fn validate_imports(
    path: &Path,
    imports: &[PathBuf],
    ancestors: &[PathBuf],
) -> Result<(), ConfigError> {
    if imports.iter().any(|import| import == path) {
        return Err(ConfigError::SelfImport {
            path: path.to_path_buf(),
        });
    }

    let mut seen = HashSet::with_capacity(imports.len());
    if let Some(dup) = imports.iter().find(|import| !seen.insert(*import)) {
        return Err(ConfigError::DuplicateImport {
            path: path.to_path_buf(),
            import: dup.clone(),
        });
    }

    if let Some(cycle) = imports.iter().find(|import| ancestors.contains(import)) {
        return Err(ConfigError::CircularImport {
            path: path.to_path_buf(),
            import: cycle.clone(),
        });
    }

    Ok(())
}

impl ConfigTree {
    /// Id of the entry document's node.
    pub const ROOT: NodeId = 0;

    /// The entry document's node.
    ///
    /// # Panics
    ///
    /// Never: a resolved tree always contains its root.
    #[must_use]
    #[allow(clippy::indexing_slicing)]
    pub fn root(&self) -> &ConfigNode {
        &self.nodes[Self::ROOT]
    }

    /// Look up a node by id.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&ConfigNode> {
        self.nodes.get(id)
    }

    /// Direct imports of `node`, in declaration order.
    pub fn children<'a>(&'a self, node: &'a ConfigNode) -> impl Iterator<Item = &'a ConfigNode> {
        node.imports.iter().filter_map(|&id| self.node(id))
    }

    /// All nodes in resolution (depth-first, pre-order) order.
    #[must_use]
    pub fn nodes(&self) -> &[ConfigNode] {
        &self.nodes
    }

    /// Number of resolved nodes, counting repeated imports separately.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false` for a resolved tree.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The host bound for the whole tree.
    #[must_use]
    pub fn hostname(&self) -> &str {
        &self.root().hostname
    }
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::config::test_helpers::ConfigDir;

    fn resolve(dir: &ConfigDir, entry: &str) -> Result<ConfigTree, ConfigError> {
        let settings = Settings::default();
        Resolver::new(&settings, dir.home()).resolve(&dir.path(entry))
    }

    #[test]
    fn single_document_with_host() {
        let dir = ConfigDir::new().file("root.toml", "[host]\nname = \"box\"\n");
        let tree = resolve(&dir, "root.toml").unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.hostname(), "box");
        assert_eq!(tree.root().path, dir.path("root.toml"));
    }

    #[test]
    fn missing_entry_is_not_found() {
        let dir = ConfigDir::new();
        let err = resolve(&dir, "root.toml").unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }), "{err}");
    }

    #[test]
    fn host_named_after_a_reserved_key_is_rejected() {
        for name in RESERVED_KEYS {
            let dir = ConfigDir::new().file(
                "root.toml",
                &format!("imports = []\n[host]\nname = \"{name}\"\n"),
            );
            let err = resolve(&dir, "root.toml").unwrap_err();
            assert!(
                matches!(&err, ConfigError::ReservedHostName { name: n, .. } if n == name),
                "{err}"
            );
        }
    }

    #[test]
    fn missing_import_is_not_found() {
        let dir = ConfigDir::new().file(
            "root.toml",
            "imports = [\"gone.toml\"]\n[host]\nname = \"box\"\n",
        );
        let err = resolve(&dir, "root.toml").unwrap_err();
        assert!(
            matches!(&err, ConfigError::NotFound { path } if *path == dir.path("gone.toml")),
            "{err}"
        );
    }

    #[test]
    fn imports_inherit_host_in_declaration_order() {
        let dir = ConfigDir::new()
            .file(
                "root.toml",
                "imports = [\"b.toml\", \"a.toml\"]\n[host]\nname = \"box\"\n",
            )
            .file("a.toml", "")
            .file("b.toml", "imports = [\"c.toml\"]\n")
            .file("c.toml", "");
        let tree = resolve(&dir, "root.toml").unwrap();
        let children: Vec<PathBuf> = tree
            .children(tree.root())
            .map(|n| n.path.clone())
            .collect();
        assert_eq!(children, vec![dir.path("b.toml"), dir.path("a.toml")]);
        assert!(tree.nodes().iter().all(|n| n.hostname == "box"));
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn directory_import_uses_default_module_file() {
        let dir = ConfigDir::new()
            .file("root.toml", "imports = [\"shell\"]\n[host]\nname = \"box\"\n")
            .file("shell/module.toml", "");
        let tree = resolve(&dir, "root.toml").unwrap();
        let child = tree.children(tree.root()).next().unwrap();
        assert_eq!(child.path, dir.path("shell/module.toml"));
    }

    #[test]
    fn custom_default_module_filename() {
        let dir = ConfigDir::new()
            .file("root.toml", "imports = [\"shell/\"]\n[host]\nname = \"box\"\n")
            .file("shell/init.toml", "");
        let settings = Settings {
            default_module_filename: "init.toml".to_string(),
            ..Settings::default()
        };
        let tree = Resolver::new(&settings, dir.home())
            .resolve(&dir.path("root.toml"))
            .unwrap();
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn circular_import_names_the_ancestor() {
        let dir = ConfigDir::new()
            .file("root.toml", "imports = [\"a.toml\"]\n[host]\nname = \"x\"\n")
            .file("a.toml", "imports = [\"root.toml\"]\n");
        let err = resolve(&dir, "root.toml").unwrap_err();
        match err {
            ConfigError::CircularImport { path, import } => {
                assert_eq!(path, dir.path("a.toml"));
                assert_eq!(import, dir.path("root.toml"));
            }
            other => panic!("expected CircularImport, got {other}"),
        }
    }

    #[test]
    fn transitive_cycle_is_circular() {
        let dir = ConfigDir::new()
            .file("root.toml", "imports = [\"a.toml\"]\n[host]\nname = \"x\"\n")
            .file("a.toml", "imports = [\"b.toml\"]\n")
            .file("b.toml", "imports = [\"../conf/a.toml\"]\n");
        let err = resolve(&dir, "root.toml").unwrap_err();
        assert!(
            matches!(&err, ConfigError::CircularImport { import, .. } if *import == dir.path("a.toml")),
            "{err}"
        );
    }

    #[test]
    fn self_import_is_rejected() {
        let dir =
            ConfigDir::new().file("root.toml", "imports = [\"./root.toml\"]\n[host]\nname = \"x\"\n");
        let err = resolve(&dir, "root.toml").unwrap_err();
        assert!(matches!(err, ConfigError::SelfImport { .. }), "{err}");
    }

    #[test]
    fn duplicate_import_is_rejected() {
        let dir = ConfigDir::new()
            .file(
                "root.toml",
                "imports = [\"a.toml\", \"sub/../a.toml\"]\n[host]\nname = \"x\"\n",
            )
            .file("a.toml", "");
        let err = resolve(&dir, "root.toml").unwrap_err();
        assert!(
            matches!(&err, ConfigError::DuplicateImport { import, .. } if *import == dir.path("a.toml")),
            "{err}"
        );
    }

    #[test]
    fn shared_import_across_siblings_is_allowed() {
        let dir = ConfigDir::new()
            .file(
                "root.toml",
                "imports = [\"a.toml\", \"b.toml\"]\n[host]\nname = \"x\"\n",
            )
            .file("a.toml", "imports = [\"common.toml\"]\n")
            .file("b.toml", "imports = [\"common.toml\"]\n")
            .file("common.toml", "");
        let tree = resolve(&dir, "root.toml").unwrap();
        let common = tree
            .nodes()
            .iter()
            .filter(|n| n.path == dir.path("common.toml"))
            .count();
        assert_eq!(common, 2, "each import site resolves its own node");
    }

    #[test]
    fn imported_host_is_a_conflict() {
        let dir = ConfigDir::new()
            .file("root.toml", "imports = [\"a.toml\"]\n[host]\nname = \"x\"\n")
            .file("a.toml", "[host]\nname = \"y\"\n");
        let err = resolve(&dir, "root.toml").unwrap_err();
        match err {
            ConfigError::HostConflict { path, inherited } => {
                assert_eq!(path, dir.path("a.toml"));
                assert_eq!(inherited, "x");
            }
            other => panic!("expected HostConflict, got {other}"),
        }
    }

    #[test]
    fn entry_without_host_is_missing_host() {
        let dir = ConfigDir::new().file("root.toml", "imports = []\n");
        let err = resolve(&dir, "root.toml").unwrap_err();
        assert!(matches!(err, ConfigError::MissingHost { .. }), "{err}");
    }

    #[test]
    fn host_table_without_name_is_missing_host() {
        let dir = ConfigDir::new().file("root.toml", "[host]\n");
        let err = resolve(&dir, "root.toml").unwrap_err();
        assert!(matches!(err, ConfigError::MissingHost { .. }), "{err}");
    }

    #[test]
    fn malformed_imports_are_invalid_document() {
        let dir = ConfigDir::new().file("root.toml", "imports = \"a.toml\"\n[host]\nname = \"x\"\n");
        let err = resolve(&dir, "root.toml").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDocument { .. }), "{err}");
    }

    #[test]
    fn host_overlay_replaces_and_keeps_entries() {
        let dir = ConfigDir::new().file(
            "root.toml",
            r#"
[host]
name = "laptop"

[files.git]
src = "gitconfig"
dest = ".gitconfig"

[files.vim]
src = "vimrc"
dest = ".vimrc"

[laptop.files.git]
src = "gitconfig.laptop"
dest = ".gitconfig"

[laptop.scripts.battery]
text = "echo battery"

[desktop.files.vim]
src = "ignored"
dest = ".vimrc"
"#,
        );
        let tree = resolve(&dir, "root.toml").unwrap();
        let root = tree.root();
        assert_eq!(root.links.len(), 2);
        assert_eq!(root.links[0].name, "git");
        assert_eq!(root.links[0].source, dir.path("gitconfig.laptop"));
        assert_eq!(root.links[1].source, dir.path("vimrc"));
        assert_eq!(root.links[1].destination, dir.home().join(".vimrc"));
        assert_eq!(root.scripts.len(), 1);
        assert_eq!(root.scripts[0].name, "battery");
    }

    #[test]
    fn imported_documents_use_inherited_host_section() {
        let dir = ConfigDir::new()
            .file("root.toml", "imports = [\"a.toml\"]\n[host]\nname = \"box\"\n")
            .file(
                "a.toml",
                "[scripts.s]\ntext = \"generic\"\n[box.scripts.s]\ntext = \"box-only\"\n",
            );
        let tree = resolve(&dir, "root.toml").unwrap();
        let child = tree.children(tree.root()).next().unwrap();
        assert_eq!(child.scripts[0].command_line(), "box-only");
    }

    #[test]
    fn invalid_entry_aborts_resolution() {
        let dir = ConfigDir::new()
            .file("root.toml", "imports = [\"a.toml\"]\n[host]\nname = \"box\"\n")
            .file("a.toml", "[scripts.bad]\nsrc = \"x\"\ntext = \"y\"\n");
        let err = resolve(&dir, "root.toml").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidScriptEntry { .. }), "{err}");
    }
}

//! Flattening a resolved tree into the four execution queues.
use std::collections::VecDeque;
use std::fmt::Write as _;
use std::path::Path;

use serde::Serialize;

use crate::config::{ConfigNode, ConfigTree, LinkEntry, ScriptBody, ScriptEntry};

/// Everything a build will do, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildPlan {
    /// Links applied before any script runs.
    pub pre_links: Vec<LinkEntry>,
    /// Build scripts, sorted by ascending stage; ties keep discovery order.
    pub build_scripts: Vec<ScriptEntry>,
    /// Links applied after all build scripts.
    pub post_links: Vec<LinkEntry>,
    /// Scripts published into the user scripts directory.
    pub user_scripts: Vec<ScriptEntry>,
}

/// Nodes of `tree` in level order from the root, children in import order.
///
/// This is the discovery order that breaks ties between build scripts of
/// the same stage.
#[must_use]
pub fn breadth_first(tree: &ConfigTree) -> Vec<&ConfigNode> {
    let mut order = Vec::with_capacity(tree.len());
    if tree.is_empty() {
        return order;
    }
    let mut queue = VecDeque::from([ConfigTree::ROOT]);
    while let Some(id) = queue.pop_front() {
        let Some(node) = tree.node(id) else {
            continue;
        };
        order.push(node);
        queue.extend(node.imports.iter().copied());
    }
    order
}

impl BuildPlan {
    /// Collect every node's own entries in breadth-first order and split
    /// them into phase queues.
    #[must_use]
    pub fn from_tree(tree: &ConfigTree) -> Self {
        let mut plan = Self::default();
        for node in breadth_first(tree) {
            for link in &node.links {
                if link.link_pre {
                    plan.pre_links.push(link.clone());
                }
                if link.link_post {
                    plan.post_links.push(link.clone());
                }
            }
            for script in &node.scripts {
                if script.is_build {
                    plan.build_scripts.push(script.clone());
                }
                if script.is_user {
                    plan.user_scripts.push(script.clone());
                }
            }
        }
        // stable: equal stages keep discovery order
        plan.build_scripts.sort_by_key(|s| s.stage);
        plan
    }

    /// Build scripts grouped into consecutive runs of equal stage.
    #[must_use]
    pub fn stages(&self) -> Vec<(i64, &[ScriptEntry])> {
        self.build_scripts
            .chunk_by(|a, b| a.stage == b.stage)
            .filter_map(|group| group.first().map(|first| (first.stage, group)))
            .collect()
    }

    /// `true` when no phase has any work.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pre_links.is_empty()
            && self.build_scripts.is_empty()
            && self.post_links.is_empty()
            && self.user_scripts.is_empty()
    }

    /// Human-readable listing of the plan, one section per phase.
    ///
    /// User scripts are shown at their published location in `scripts_bin`.
    #[must_use]
    pub fn render(&self, scripts_bin: &Path) -> String {
        let mut out = String::new();

        render_links(&mut out, "pre-link files", &self.pre_links);

        out.push_str("build scripts:\n");
        if self.build_scripts.is_empty() {
            out.push_str("  (none)\n");
        }
        for (stage, scripts) in self.stages() {
            let _ = writeln!(out, "  stage {stage}:");
            for script in scripts {
                let _ = writeln!(out, "    {}: {}", script.name, describe_body(&script.body));
            }
        }

        render_links(&mut out, "post-link files", &self.post_links);

        out.push_str("user scripts:\n");
        if self.user_scripts.is_empty() {
            out.push_str("  (none)\n");
        }
        for script in &self.user_scripts {
            let target = script
                .source()
                .and_then(|src| src.file_name())
                .map_or_else(|| scripts_bin.to_path_buf(), |base| scripts_bin.join(base));
            let _ = writeln!(
                out,
                "  {}: {} -> {}",
                script.name,
                target.display(),
                describe_body(&script.body)
            );
        }

        out.truncate(out.trim_end().len());
        out
    }
}

fn render_links(out: &mut String, title: &str, links: &[LinkEntry]) {
    let _ = writeln!(out, "{title}:");
    if links.is_empty() {
        out.push_str("  (none)\n");
    }
    for link in links {
        let _ = writeln!(
            out,
            "  {}: {} -> {}",
            link.name,
            link.destination.display(),
            link.source.display()
        );
    }
}

fn describe_body(body: &ScriptBody) -> String {
    match body {
        ScriptBody::Source(path) => path.display().to_string(),
        ScriptBody::Text(text) => format!("`{text}`"),
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::config::test_helpers::ConfigDir;
    use crate::config::{Resolver, Settings};

    fn resolve(dir: &ConfigDir, entry: &str) -> ConfigTree {
        let settings = Settings::default();
        Resolver::new(&settings, dir.home())
            .resolve(&dir.path(entry))
            .unwrap()
    }

    fn names(scripts: &[ScriptEntry]) -> Vec<&str> {
        scripts.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn stage_sort_keeps_discovery_order_for_ties() {
        let dir = ConfigDir::new().file(
            "root.toml",
            r#"
host.name = "x"
[scripts.late-a]
text = "echo a"
stage = 1
[scripts.late-b]
text = "echo b"
stage = 1
[scripts.early]
text = "echo early"
stage = 0
"#,
        );
        let plan = BuildPlan::from_tree(&resolve(&dir, "root.toml"));
        assert_eq!(names(&plan.build_scripts), ["early", "late-a", "late-b"]);

        let stages = plan.stages();
        assert_eq!(stages.len(), 2);
        assert_eq!(stages[0].0, 0);
        assert_eq!(names(stages[1].1), ["late-a", "late-b"]);
    }

    #[test]
    fn flattening_is_breadth_first() {
        // root -> [a, b]; a -> [c]. Level order is root, a, b, c.
        let dir = ConfigDir::new()
            .file(
                "root.toml",
                "host.name = \"x\"\nimports = [\"a.toml\", \"b.toml\"]\n[scripts.root]\ntext = \"r\"\n",
            )
            .file(
                "a.toml",
                "imports = [\"c.toml\"]\n[scripts.a]\ntext = \"a\"\n",
            )
            .file("b.toml", "[scripts.b]\ntext = \"b\"\n")
            .file("c.toml", "[scripts.c]\ntext = \"c\"\n");
        let tree = resolve(&dir, "root.toml");

        let order: Vec<_> = breadth_first(&tree)
            .iter()
            .map(|n| n.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(order, ["root.toml", "a.toml", "b.toml", "c.toml"]);

        let plan = BuildPlan::from_tree(&tree);
        assert_eq!(names(&plan.build_scripts), ["root", "a", "b", "c"]);
    }

    #[test]
    fn negative_stages_run_first() {
        let dir = ConfigDir::new()
            .file(
                "root.toml",
                "host.name = \"x\"\nimports = [\"a.toml\"]\n[scripts.zero]\ntext = \"0\"\n",
            )
            .file("a.toml", "[scripts.minus]\ntext = \"-1\"\nstage = -1\n");
        let plan = BuildPlan::from_tree(&resolve(&dir, "root.toml"));
        assert_eq!(names(&plan.build_scripts), ["minus", "zero"]);
    }

    #[test]
    fn link_flags_select_phases() {
        let dir = ConfigDir::new().file(
            "root.toml",
            r#"
host.name = "x"
[files.default]
src = "a"
dest = "bin/tool"
[files.post]
src = "b"
dest = "b"
link-pre = false
link-post = true
[files.both]
src = "c"
dest = "c"
link-post = true
[files.never]
src = "d"
dest = "d"
link-pre = false
"#,
        );
        let plan = BuildPlan::from_tree(&resolve(&dir, "root.toml"));
        let pre: Vec<_> = plan.pre_links.iter().map(|l| l.name.as_str()).collect();
        let post: Vec<_> = plan.post_links.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(pre, ["default", "both"]);
        assert_eq!(post, ["post", "both"]);
    }

    #[test]
    fn user_scripts_need_not_be_build_scripts() {
        let dir = ConfigDir::new().file(
            "root.toml",
            r#"
host.name = "x"
[scripts.tool]
src = "tool.sh"
user = true
build = false
"#,
        );
        let plan = BuildPlan::from_tree(&resolve(&dir, "root.toml"));
        assert!(plan.build_scripts.is_empty());
        assert_eq!(names(&plan.user_scripts), ["tool"]);
        assert!(!plan.is_empty());
    }

    #[test]
    fn empty_document_yields_empty_plan() {
        let dir = ConfigDir::new().file("root.toml", "host.name = \"x\"\n");
        let plan = BuildPlan::from_tree(&resolve(&dir, "root.toml"));
        assert!(plan.is_empty());
        assert!(plan.stages().is_empty());
    }

    #[test]
    fn render_lists_every_section() {
        let dir = ConfigDir::new().file(
            "root.toml",
            r#"
host.name = "x"
[scripts.hello]
text = "echo hello"
"#,
        );
        let plan = BuildPlan::from_tree(&resolve(&dir, "root.toml"));
        let text = plan.render(Path::new("/home/u/.bin"));
        insta::assert_snapshot!(text, @r"
        pre-link files:
          (none)
        build scripts:
          stage 0:
            hello: `echo hello`
        post-link files:
          (none)
        user scripts:
          (none)
        ");
    }
}

//! Host-scoped overlay of `files` / `scripts` maps.
//!
//! A document may declare entries at the top level and again under a table
//! named after the host:
//!
//! ```toml
//! [files.gitconfig]
//! src = "gitconfig"
//! dest = ".gitconfig"
//!
//! [laptop.files.gitconfig]
//! src = "gitconfig.laptop"
//! dest = ".gitconfig"
//! ```
//!
//! The effective map is the top-level map with the host map applied on top:
//! a host entry replaces the top-level entry of the same name in place, and
//! entries unique to either side are kept. Within one map the last
//! occurrence of a key wins; TOML parsing already rejects literal duplicate
//! keys, so in practice each map arrives with unique names.

/// Overlay `host` onto `base`.
///
/// Order is `base` declaration order, with host-only entries appended in
/// their own declaration order.
#[must_use]
pub fn overlay(base: Option<&toml::Table>, host: Option<&toml::Table>) -> toml::Table {
    let mut merged = toml::Table::new();
    for layer in [base, host].into_iter().flatten() {
        for (name, value) in layer {
            merged.insert(name.clone(), value.clone());
        }
    }
    merged
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn table(src: &str) -> toml::Table {
        src.parse().unwrap()
    }

    #[test]
    fn host_entry_replaces_same_name() {
        let base = table("[a]\nsrc = \"base\"\n[b]\nsrc = \"b\"\n");
        let host = table("[a]\nsrc = \"host\"\n");
        let merged = overlay(Some(&base), Some(&host));
        assert_eq!(merged.len(), 2);
        assert_eq!(merged["a"]["src"].as_str(), Some("host"));
        assert_eq!(merged["b"]["src"].as_str(), Some("b"));
    }

    #[test]
    fn entries_unique_to_either_side_are_kept() {
        let base = table("[a]\nx = 1\n");
        let host = table("[c]\nx = 3\n");
        let merged = overlay(Some(&base), Some(&host));
        let names: Vec<&str> = merged.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn replacement_keeps_base_position() {
        let base = table("[z]\nx = 1\n[a]\nx = 2\n");
        let host = table("[z]\nx = 9\n");
        let merged = overlay(Some(&base), Some(&host));
        let names: Vec<&str> = merged.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["z", "a"]);
        assert_eq!(merged["z"]["x"].as_integer(), Some(9));
    }

    #[test]
    fn no_host_section_equals_base() {
        let base = table("[a]\nx = 1\n[b]\nx = 2\n");
        assert_eq!(overlay(Some(&base), None), base);
    }

    #[test]
    fn host_only() {
        let host = table("[a]\nx = 1\n");
        assert_eq!(overlay(None, Some(&host)), host);
        assert!(overlay(None, None).is_empty());
    }
}

//! Configuration: process settings and the resolved document tree.
pub mod document;
pub mod link;
pub mod merge;
pub mod script;
pub mod settings;
pub mod tree;

pub use link::LinkEntry;
pub use script::{ScriptBody, ScriptEntry};
pub use settings::Settings;
pub use tree::{ConfigNode, ConfigTree, NodeId, Resolver};

use serde::{Deserialize, Serialize};
use std::fmt;
use superlists_core::SuperListsResult;

/// Opaque handle to an element of the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn new(raw: usize) -> Self {
        Self(raw)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One low-level structural change, as a mutation observer would report it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    /// For child-list changes this is the parent whose children changed.
    pub target: NodeId,
    pub mutation: Mutation,
    /// Produced while the write-intent flag was set.
    pub self_inflicted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    ChildList {
        added: Vec<NodeId>,
        removed: Vec<NodeId>,
    },
    Attribute {
        name: String,
        old_value: Option<String>,
    },
    Text {
        old: String,
    },
}

/// The operations the query adapter and reconciler need from a live page.
///
/// Reads on an unknown handle return empty values; writes on an unknown
/// handle fail with `InvalidArgument`.
pub trait Dom {
    fn root(&self) -> NodeId;
    fn location(&self) -> &str;

    fn exists(&self, node: NodeId) -> bool;
    /// Connected to the document root.
    fn is_attached(&self, node: NodeId) -> bool;
    fn parent(&self, node: NodeId) -> Option<NodeId>;
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    fn has_class(&self, node: NodeId, class: &str) -> bool;
    fn classes(&self, node: NodeId) -> Vec<String>;
    /// The element's own text, excluding descendants.
    fn text(&self, node: NodeId) -> Option<String>;
    fn data(&self, node: NodeId, key: &str) -> Option<String>;
    fn is_hidden(&self, node: NodeId) -> bool;
    /// Rendered height in pixels, as laid out by the page.
    fn height(&self, node: NodeId) -> u32;
    fn min_height(&self, node: NodeId) -> Option<u32>;

    fn create_element(&mut self, classes: &[&str]) -> NodeId;
    /// Moves `child` under `parent`, before `reference` or at the end.
    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> SuperListsResult<()>;
    fn remove(&mut self, node: NodeId) -> SuperListsResult<()>;
    fn add_class(&mut self, node: NodeId, class: &str) -> SuperListsResult<()>;
    fn remove_class(&mut self, node: NodeId, class: &str) -> SuperListsResult<()>;
    fn set_text(&mut self, node: NodeId, text: &str) -> SuperListsResult<()>;
    fn set_data(&mut self, node: NodeId, key: &str, value: Option<&str>) -> SuperListsResult<()>;
    fn set_hidden(&mut self, node: NodeId, hidden: bool) -> SuperListsResult<()>;
    fn set_min_height(&mut self, node: NodeId, height: Option<u32>) -> SuperListsResult<()>;

    fn write_intent(&self) -> bool;
    fn set_write_intent(&mut self, active: bool);
    /// Drains the records produced since the last call.
    fn take_records(&mut self) -> Vec<MutationRecord>;
}

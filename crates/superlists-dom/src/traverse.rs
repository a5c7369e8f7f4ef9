use crate::dom::{Dom, NodeId};
use superlists_core::SuperListsResult;

/// Tree helpers available on every [`Dom`], including `dyn Dom`.
pub trait DomExt: Dom {
    fn append_child(&mut self, parent: NodeId, child: NodeId) -> SuperListsResult<()> {
        self.insert_before(parent, child, None)
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let siblings = self.children(parent);
        let index = siblings.iter().position(|n| *n == node)?;
        siblings.get(index + 1).copied()
    }

    /// Pre-order descendants, excluding `node` itself.
    fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).into_iter().rev().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).into_iter().rev());
        }
        out
    }

    fn find_first(&self, node: NodeId, class: &str) -> Option<NodeId> {
        self.descendants(node)
            .into_iter()
            .find(|n| self.has_class(*n, class))
    }

    fn find_all(&self, node: NodeId, class: &str) -> Vec<NodeId> {
        self.descendants(node)
            .into_iter()
            .filter(|n| self.has_class(*n, class))
            .collect()
    }

    /// `node` itself or its nearest ancestor carrying `class`.
    fn closest(&self, node: NodeId, class: &str) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(candidate) = current {
            if self.has_class(candidate, class) {
                return Some(candidate);
            }
            current = self.parent(candidate);
        }
        None
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(candidate) = current {
            if candidate == ancestor {
                return true;
            }
            current = self.parent(candidate);
        }
        false
    }

    /// Own text plus the text of every descendant, in document order.
    fn text_content(&self, node: NodeId) -> String {
        std::iter::once(node)
            .chain(self.descendants(node))
            .filter_map(|n| self.text(n))
            .collect()
    }

    fn toggle_class(&mut self, node: NodeId, class: &str, on: bool) -> SuperListsResult<()> {
        if on {
            self.add_class(node, class)
        } else {
            self.remove_class(node, class)
        }
    }
}

impl<T: Dom + ?Sized> DomExt for T {}

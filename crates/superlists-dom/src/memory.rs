use crate::dom::{Dom, Mutation, MutationRecord, NodeId};
use std::collections::BTreeMap;
use superlists_core::{SuperListsError, SuperListsResult};

#[derive(Debug, Clone, Default)]
struct Element {
    classes: Vec<String>,
    data: BTreeMap<String, String>,
    text: Option<String>,
    hidden: bool,
    height: u32,
    min_height: Option<u32>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An in-memory page that records mutations like a browser observer would.
///
/// Nodes are never freed; a removed node keeps its classes and data so that
/// removal records can still be classified.
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    elements: Vec<Element>,
    location: String,
    write_intent: bool,
    records: Vec<MutationRecord>,
}

impl MemoryDocument {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            elements: vec![Element {
                classes: vec!["body".to_string()],
                ..Element::default()
            }],
            location: location.into(),
            write_intent: false,
            records: Vec::new(),
        }
    }

    pub fn set_location(&mut self, location: impl Into<String>) {
        self.location = location.into();
    }

    /// Page layout: changes the rendered height without producing a record.
    pub fn set_height(&mut self, node: NodeId, height: u32) -> SuperListsResult<()> {
        self.element_mut(node)?.height = height;
        Ok(())
    }

    pub fn pending_records(&self) -> usize {
        self.records.len()
    }

    fn element(&self, node: NodeId) -> Option<&Element> {
        self.elements.get(node.index())
    }

    fn element_mut(&mut self, node: NodeId) -> SuperListsResult<&mut Element> {
        self.elements
            .get_mut(node.index())
            .ok_or_else(|| SuperListsError::invalid(format!("unknown node {node}")))
    }

    fn record(&mut self, target: NodeId, mutation: Mutation) {
        self.records.push(MutationRecord {
            target,
            mutation,
            self_inflicted: self.write_intent,
        });
    }

    fn detach(&mut self, node: NodeId) -> SuperListsResult<()> {
        let Some(parent) = self.element_mut(node)?.parent.take() else {
            return Ok(());
        };
        self.element_mut(parent)?.children.retain(|child| *child != node);
        self.record(
            parent,
            Mutation::ChildList {
                added: Vec::new(),
                removed: vec![node],
            },
        );
        Ok(())
    }

    fn class_string(&self, node: NodeId) -> Option<String> {
        self.element(node).map(|e| e.classes.join(" "))
    }
}

impl Dom for MemoryDocument {
    fn root(&self) -> NodeId {
        NodeId::new(0)
    }

    fn location(&self) -> &str {
        &self.location
    }

    fn exists(&self, node: NodeId) -> bool {
        self.element(node).is_some()
    }

    fn is_attached(&self, node: NodeId) -> bool {
        let root = self.root();
        let mut current = Some(node);
        while let Some(candidate) = current {
            if candidate == root {
                return true;
            }
            current = self.element(candidate).and_then(|e| e.parent);
        }
        false
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.element(node).and_then(|e| e.parent)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.element(node)
            .map(|e| e.children.clone())
            .unwrap_or_default()
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.element(node)
            .is_some_and(|e| e.classes.iter().any(|c| c == class))
    }

    fn classes(&self, node: NodeId) -> Vec<String> {
        self.element(node)
            .map(|e| e.classes.clone())
            .unwrap_or_default()
    }

    fn text(&self, node: NodeId) -> Option<String> {
        self.element(node).and_then(|e| e.text.clone())
    }

    fn data(&self, node: NodeId, key: &str) -> Option<String> {
        self.element(node).and_then(|e| e.data.get(key).cloned())
    }

    fn is_hidden(&self, node: NodeId) -> bool {
        self.element(node).is_some_and(|e| e.hidden)
    }

    fn height(&self, node: NodeId) -> u32 {
        self.element(node).map(|e| e.height).unwrap_or(0)
    }

    fn min_height(&self, node: NodeId) -> Option<u32> {
        self.element(node).and_then(|e| e.min_height)
    }

    fn create_element(&mut self, classes: &[&str]) -> NodeId {
        self.elements.push(Element {
            classes: classes.iter().map(|c| c.to_string()).collect(),
            ..Element::default()
        });
        NodeId::new(self.elements.len() - 1)
    }

    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> SuperListsResult<()> {
        if !self.exists(parent) || !self.exists(child) {
            return Err(SuperListsError::invalid(format!(
                "cannot insert {child} under {parent}: unknown node"
            )));
        }
        if child == self.root() {
            return Err(SuperListsError::invalid("cannot move the document root"));
        }
        let mut ancestor = Some(parent);
        while let Some(candidate) = ancestor {
            if candidate == child {
                return Err(SuperListsError::invalid(format!(
                    "cannot insert {child} inside itself"
                )));
            }
            ancestor = self.parent(candidate);
        }
        if reference == Some(child) {
            return Ok(());
        }
        if let Some(reference) = reference {
            if self.parent(reference) != Some(parent) {
                return Err(SuperListsError::invalid(format!(
                    "{reference} is not a child of {parent}"
                )));
            }
        }

        self.detach(child)?;
        let siblings = &mut self.element_mut(parent)?.children;
        let position = reference
            .and_then(|r| siblings.iter().position(|n| *n == r))
            .unwrap_or(siblings.len());
        siblings.insert(position, child);
        self.element_mut(child)?.parent = Some(parent);
        self.record(
            parent,
            Mutation::ChildList {
                added: vec![child],
                removed: Vec::new(),
            },
        );
        Ok(())
    }

    fn remove(&mut self, node: NodeId) -> SuperListsResult<()> {
        if !self.exists(node) {
            return Err(SuperListsError::invalid(format!("unknown node {node}")));
        }
        self.detach(node)
    }

    fn add_class(&mut self, node: NodeId, class: &str) -> SuperListsResult<()> {
        let old = self.class_string(node);
        let element = self.element_mut(node)?;
        if element.classes.iter().any(|c| c == class) {
            return Ok(());
        }
        element.classes.push(class.to_string());
        self.record(
            node,
            Mutation::Attribute {
                name: "class".to_string(),
                old_value: old,
            },
        );
        Ok(())
    }

    fn remove_class(&mut self, node: NodeId, class: &str) -> SuperListsResult<()> {
        let old = self.class_string(node);
        let element = self.element_mut(node)?;
        let before = element.classes.len();
        element.classes.retain(|c| c != class);
        if element.classes.len() == before {
            return Ok(());
        }
        self.record(
            node,
            Mutation::Attribute {
                name: "class".to_string(),
                old_value: old,
            },
        );
        Ok(())
    }

    fn set_text(&mut self, node: NodeId, text: &str) -> SuperListsResult<()> {
        let element = self.element_mut(node)?;
        if element.text.as_deref() == Some(text) {
            return Ok(());
        }
        let old = element.text.replace(text.to_string()).unwrap_or_default();
        self.record(node, Mutation::Text { old });
        Ok(())
    }

    fn set_data(&mut self, node: NodeId, key: &str, value: Option<&str>) -> SuperListsResult<()> {
        let element = self.element_mut(node)?;
        if element.data.get(key).map(String::as_str) == value {
            return Ok(());
        }
        let old_value = match value {
            Some(value) => element.data.insert(key.to_string(), value.to_string()),
            None => element.data.remove(key),
        };
        self.record(
            node,
            Mutation::Attribute {
                name: format!("data-{key}"),
                old_value,
            },
        );
        Ok(())
    }

    fn set_hidden(&mut self, node: NodeId, hidden: bool) -> SuperListsResult<()> {
        let element = self.element_mut(node)?;
        if element.hidden == hidden {
            return Ok(());
        }
        element.hidden = hidden;
        self.record(
            node,
            Mutation::Attribute {
                name: "hidden".to_string(),
                old_value: (!hidden).then(String::new),
            },
        );
        Ok(())
    }

    fn set_min_height(&mut self, node: NodeId, height: Option<u32>) -> SuperListsResult<()> {
        let element = self.element_mut(node)?;
        if element.min_height == height {
            return Ok(());
        }
        let old = std::mem::replace(&mut element.min_height, height);
        self.record(
            node,
            Mutation::Attribute {
                name: "style".to_string(),
                old_value: old.map(|h| format!("min-height: {h}px")),
            },
        );
        Ok(())
    }

    fn write_intent(&self) -> bool {
        self.write_intent
    }

    fn set_write_intent(&mut self, active: bool) {
        self.write_intent = active;
    }

    fn take_records(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.records)
    }
}

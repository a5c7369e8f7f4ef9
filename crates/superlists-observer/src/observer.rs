use crate::events::BoardEvent;
use std::collections::HashSet;
use superlists_dom::query;
use superlists_dom::{Dom, DomExt, Mutation, MutationRecord, NodeId, PageSelectors};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverState {
    Idle,
    Observing { root: NodeId },
}

/// Classifies raw mutation records into [`BoardEvent`]s.
///
/// Records are judged by their net effect on the page at classification
/// time: a node that was moved is not reported as removed, a node added and
/// removed again is not reported at all, and changes made inside a subtree
/// before it was inserted are covered by the insertion itself.
#[derive(Debug, Clone)]
pub struct ChangeObserver {
    selectors: PageSelectors,
    state: ObserverState,
    board_id: Option<String>,
}

impl ChangeObserver {
    pub fn new(selectors: PageSelectors) -> Self {
        Self {
            selectors,
            state: ObserverState::Idle,
            board_id: None,
        }
    }

    pub fn state(&self) -> ObserverState {
        self.state
    }

    pub fn is_observing(&self) -> bool {
        matches!(self.state, ObserverState::Observing { .. })
    }

    pub fn board_id(&self) -> Option<&str> {
        self.board_id.as_deref()
    }

    pub fn selectors(&self) -> &PageSelectors {
        &self.selectors
    }

    /// Starts observing the document body. Records queued before this call
    /// are discarded.
    pub fn observe(&mut self, dom: &mut dyn Dom) {
        let dropped = dom.take_records().len();
        self.board_id = query::board_id(dom);
        self.state = ObserverState::Observing { root: dom.root() };
        tracing::debug!(board = ?self.board_id, dropped, "Observer started");
    }

    pub fn disconnect(&mut self) {
        if self.is_observing() {
            tracing::debug!("Observer disconnected");
        }
        self.state = ObserverState::Idle;
    }

    pub fn classify(&mut self, dom: &dyn Dom, records: &[MutationRecord]) -> Vec<BoardEvent> {
        let ObserverState::Observing { root } = self.state else {
            return Vec::new();
        };

        let relevant: Vec<&MutationRecord> = records
            .iter()
            .filter(|r| !r.self_inflicted)
            .filter(|r| dom.is_attached(r.target) && dom.is_inclusive_ancestor(root, r.target))
            .collect();

        let mut batch = Batch::default();
        for (index, record) in relevant.iter().enumerate() {
            if superseded(dom, record.target, &relevant[index + 1..]) {
                continue;
            }
            match &record.mutation {
                Mutation::ChildList { added, removed } => {
                    for node in removed {
                        self.classify_removed(dom, record.target, *node, &mut batch);
                    }
                    for node in added {
                        self.classify_added(dom, *node, &mut batch);
                    }
                }
                Mutation::Attribute { name, old_value } => {
                    self.classify_attribute(dom, record.target, name, old_value.as_deref(), &mut batch)
                }
                Mutation::Text { old } => self.classify_text(dom, record.target, old, &mut batch),
            }
        }
        batch.finish(dom, &self.selectors)
    }

    fn classify_added(&mut self, dom: &dyn Dom, node: NodeId, batch: &mut Batch) {
        let sel = &self.selectors;
        if !dom.is_attached(node) {
            return;
        }
        if dom.has_class(node, &sel.board) {
            let new_id = query::board_id(dom);
            let old_id = std::mem::replace(&mut self.board_id, new_id.clone());
            batch.push(BoardEvent::BoardChanged { new_id, old_id });
        } else if dom.has_class(node, &sel.board_header) {
            batch.push(BoardEvent::RedrawBoardHeader);
        } else if query::is_list(dom, sel, node) {
            batch.push(BoardEvent::ListAdded(node));
        } else if query::is_card(dom, sel, node) {
            batch.push(BoardEvent::CardAdded(node));
        } else {
            self.classify_subtree(dom, node, batch);
        }
    }

    fn classify_removed(&mut self, dom: &dyn Dom, parent: NodeId, node: NodeId, batch: &mut Batch) {
        let sel = &self.selectors;
        if dom.is_attached(node) {
            // Moved: only a card leaving its list changes anything here.
            if query::is_card(dom, sel, node) {
                let old_list = dom.closest(parent, &sel.list_wrapper);
                if old_list.is_some() && old_list != query::list_of_card(dom, sel, node) {
                    batch.extend(old_list.map(BoardEvent::ListModified));
                }
            }
            return;
        }
        if dom.has_class(node, &sel.board) {
            if query::board_root(dom, sel).is_none() {
                let old_id = self.board_id.take();
                batch.push(BoardEvent::BoardChanged {
                    new_id: None,
                    old_id,
                });
            }
        } else if dom.has_class(node, &sel.board_header) {
            // reported when the replacement header is inserted
        } else if query::is_list(dom, sel, node) {
            batch.push(BoardEvent::ListRemoved(node));
        } else if query::is_card(dom, sel, node) {
            batch.push(BoardEvent::CardRemoved {
                card: node,
                list: dom.closest(parent, &sel.list_wrapper),
            });
        } else {
            self.classify_subtree(dom, parent, batch);
        }
    }

    fn classify_attribute(
        &self,
        dom: &dyn Dom,
        target: NodeId,
        name: &str,
        old_value: Option<&str>,
        batch: &mut Batch,
    ) {
        let sel = &self.selectors;
        match name {
            "class" if query::is_list(dom, sel, target) => {
                let was_dragging = old_value
                    .unwrap_or_default()
                    .split_whitespace()
                    .any(|class| class == sel.dragging);
                let dragging = dom.has_class(target, &sel.dragging);
                match (was_dragging, dragging) {
                    (false, true) => batch.push(BoardEvent::ListDragged(target)),
                    (true, false) => batch.push(BoardEvent::ListDropped),
                    _ => {}
                }
            }
            "hidden" if query::is_card(dom, sel, target) => {
                batch.extend(query::list_of_card(dom, sel, target).map(BoardEvent::ListModified));
            }
            _ => {}
        }
    }

    fn classify_text(&self, dom: &dyn Dom, target: NodeId, old: &str, batch: &mut Batch) {
        let sel = &self.selectors;
        if dom.has_class(target, &sel.card_title) {
            if let Some(card) = dom.closest(target, &sel.card) {
                batch.push(BoardEvent::CardModified {
                    card,
                    new_title: dom.text(target).unwrap_or_default(),
                    old_title: old.to_string(),
                });
            }
        } else if dom.has_class(target, &sel.list_title) {
            batch.extend(
                dom.closest(target, &sel.list_wrapper)
                    .map(BoardEvent::ListTitleModified),
            );
        } else {
            self.classify_subtree(dom, target, batch);
        }
    }

    /// A change below the structural roles: badge content or list content.
    fn classify_subtree(&self, dom: &dyn Dom, node: NodeId, batch: &mut Batch) {
        let sel = &self.selectors;
        if let Some(card) = dom.closest(node, &sel.card) {
            if dom.closest(node, &sel.badges).is_some_and(|b| dom.is_inclusive_ancestor(card, b)) {
                batch.push(BoardEvent::BadgesModified(card));
            }
            return;
        }
        batch.extend(
            dom.closest(node, &sel.list_wrapper)
                .map(BoardEvent::ListModified),
        );
    }
}

/// Whether a later record inserted a subtree containing `target`.
fn superseded(dom: &dyn Dom, target: NodeId, later: &[&MutationRecord]) -> bool {
    later.iter().any(|record| match &record.mutation {
        Mutation::ChildList { added, .. } => added
            .iter()
            .any(|node| dom.is_attached(*node) && dom.is_inclusive_ancestor(*node, target)),
        _ => false,
    })
}

#[derive(Debug, Default)]
struct Batch {
    events: Vec<BoardEvent>,
}

impl Batch {
    fn push(&mut self, event: BoardEvent) {
        if let BoardEvent::CardModified {
            card, new_title, ..
        } = &event
        {
            let earlier = self.events.iter_mut().find_map(|e| match e {
                BoardEvent::CardModified {
                    card: c,
                    new_title: latest,
                    ..
                } if c == card => Some(latest),
                _ => None,
            });
            if let Some(latest) = earlier {
                latest.clone_from(new_title);
                return;
            }
        }
        if !self.events.contains(&event) {
            self.events.push(event);
        }
    }

    fn extend(&mut self, event: Option<BoardEvent>) {
        if let Some(event) = event {
            self.push(event);
        }
    }

    fn finish(mut self, dom: &dyn Dom, sel: &PageSelectors) -> Vec<BoardEvent> {
        self.events.retain(|event| {
            !matches!(event, BoardEvent::CardModified { new_title, old_title, .. } if new_title == old_title)
        });

        let touched: HashSet<NodeId> = self
            .events
            .iter()
            .filter_map(|event| match event {
                BoardEvent::CardAdded(card) | BoardEvent::CardModified { card, .. } => {
                    query::list_of_card(dom, sel, *card)
                }
                BoardEvent::CardRemoved { list, .. } => *list,
                _ => None,
            })
            .collect();
        self.events
            .retain(|event| !matches!(event, BoardEvent::ListModified(list) if touched.contains(list)));
        self.events
    }
}

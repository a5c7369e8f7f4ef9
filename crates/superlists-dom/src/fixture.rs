//! Builds board pages in a [`MemoryDocument`] and replays out-of-band page edits.
//!
//! The layout mirrors the third-party page closely enough for the observer
//! and reconciler to run against it:
//!
//! ```text
//! body
//! ├── board-header
//! └── board-canvas
//!     └── list-wrapper
//!         ├── list-header > list-header-name
//!         └── list-cards > list-card
//!                          ├── list-card-title
//!                          ├── card-label*
//!                          └── badges > badge*
//! ```

use crate::dom::{Dom, NodeId};
use crate::memory::MemoryDocument;
use crate::query;
use crate::selectors::PageSelectors;
use crate::traverse::DomExt;
use serde::{Deserialize, Serialize};
use superlists_core::{SuperListsError, SuperListsResult};

pub const LIST_HEADER_HEIGHT: u32 = 40;
pub const CARD_HEIGHT: u32 = 30;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardFixture {
    pub title: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub badges: Vec<String>,
}

impl CardFixture {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }

    pub fn badge(mut self, badge: impl Into<String>) -> Self {
        self.badges.push(badge.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFixture {
    pub name: String,
    #[serde(default)]
    pub cards: Vec<CardFixture>,
    /// Rendered height; derived from the card count when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl ListFixture {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn card(mut self, card: CardFixture) -> Self {
        self.cards.push(card);
        self
    }

    /// Adds `count` plain cards named `"<prefix> 1"`, `"<prefix> 2"`, ...
    pub fn cards(mut self, prefix: &str, count: usize) -> Self {
        self.cards
            .extend((1..=count).map(|n| CardFixture::new(format!("{prefix} {n}"))));
        self
    }

    pub fn height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardFixture {
    pub board_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub lists: Vec<ListFixture>,
}

/// Handles of a freshly built page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltBoard {
    pub header: NodeId,
    pub board: NodeId,
    pub lists: Vec<NodeId>,
}

impl BoardFixture {
    pub fn new(board_id: impl Into<String>) -> Self {
        Self {
            board_id: board_id.into(),
            ..Self::default()
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn list(mut self, list: ListFixture) -> Self {
        self.lists.push(list);
        self
    }

    pub fn location(&self) -> String {
        let slug = self
            .name
            .split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join("-");
        let slug = if slug.is_empty() { "board".to_string() } else { slug };
        format!("https://trello.com/b/{}/{}", self.board_id, slug)
    }

    /// Appends a header and a board root to the document body.
    pub fn build(&self, doc: &mut MemoryDocument, sel: &PageSelectors) -> SuperListsResult<BuiltBoard> {
        doc.set_location(self.location());
        let root = doc.root();
        let header = doc.create_element(&[sel.board_header.as_str()]);
        doc.append_child(root, header)?;
        let board = self.build_canvas(doc, sel)?;
        doc.append_child(root, board)?;
        let lists = doc.children(board);
        Ok(BuiltBoard {
            header,
            board,
            lists,
        })
    }

    fn build_canvas(&self, doc: &mut MemoryDocument, sel: &PageSelectors) -> SuperListsResult<NodeId> {
        let board = doc.create_element(&[sel.board.as_str()]);
        for list in &self.lists {
            let node = build_list(doc, sel, list)?;
            doc.append_child(board, node)?;
        }
        Ok(board)
    }
}

/// Builds a detached list wrapper.
pub fn build_list(doc: &mut MemoryDocument, sel: &PageSelectors, list: &ListFixture) -> SuperListsResult<NodeId> {
    let wrapper = doc.create_element(&[sel.list_wrapper.as_str()]);
    let header = doc.create_element(&[sel.list_header.as_str()]);
    let title = doc.create_element(&[sel.list_title.as_str()]);
    doc.set_text(title, &list.name)?;
    doc.append_child(header, title)?;
    doc.append_child(wrapper, header)?;

    let cards = doc.create_element(&[sel.list_cards.as_str()]);
    doc.append_child(wrapper, cards)?;
    for card in &list.cards {
        let node = build_card(doc, sel, card)?;
        doc.append_child(cards, node)?;
    }
    let height = list
        .height
        .unwrap_or_else(|| auto_height(list.cards.len()));
    doc.set_height(wrapper, height)?;
    Ok(wrapper)
}

/// Builds a detached card.
pub fn build_card(doc: &mut MemoryDocument, sel: &PageSelectors, card: &CardFixture) -> SuperListsResult<NodeId> {
    let node = doc.create_element(&[sel.card.as_str()]);
    let title = doc.create_element(&[sel.card_title.as_str()]);
    doc.set_text(title, &card.title)?;
    doc.append_child(node, title)?;
    for label in &card.labels {
        let label_node = doc.create_element(&[sel.card_label.as_str()]);
        doc.set_text(label_node, label)?;
        doc.append_child(node, label_node)?;
    }
    let badges = doc.create_element(&[sel.badges.as_str()]);
    doc.append_child(node, badges)?;
    for badge in &card.badges {
        let badge_node = doc.create_element(&[sel.badge.as_str()]);
        doc.set_text(badge_node, badge)?;
        doc.append_child(badges, badge_node)?;
    }
    doc.set_height(node, CARD_HEIGHT)?;
    Ok(node)
}

fn auto_height(cards: usize) -> u32 {
    let cards = u32::try_from(cards).unwrap_or(u32::MAX / CARD_HEIGHT);
    LIST_HEADER_HEIGHT.saturating_add(CARD_HEIGHT.saturating_mul(cards))
}

/// An out-of-band change made by the page itself or another user.
///
/// Lists are addressed by exact name and cards by exact title; the first
/// match wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PageEdit {
    AddCard {
        list: String,
        card: CardFixture,
        #[serde(default)]
        position: Option<usize>,
    },
    RemoveCard {
        title: String,
    },
    RenameCard {
        title: String,
        to: String,
    },
    MoveCard {
        title: String,
        list: String,
        #[serde(default)]
        position: Option<usize>,
    },
    /// Filters a card out of view the way the page's search does.
    HideCard {
        title: String,
        hidden: bool,
    },
    SetBadges {
        title: String,
        badges: Vec<String>,
    },
    AddList {
        list: ListFixture,
        #[serde(default)]
        position: Option<usize>,
    },
    RemoveList {
        name: String,
    },
    RenameList {
        name: String,
        to: String,
    },
    /// Reorders lists without a drag gesture, as a server re-render does.
    MoveList {
        name: String,
        position: usize,
    },
    /// Picks a list up; it stays in place until `drop_list`.
    DragList {
        name: String,
    },
    DropList {
        name: String,
        position: usize,
    },
    ResizeList {
        name: String,
        height: u32,
    },
    RedrawHeader,
    ReplaceBoard {
        board: BoardFixture,
    },
}

impl PageEdit {
    pub fn apply(&self, doc: &mut MemoryDocument, sel: &PageSelectors) -> SuperListsResult<()> {
        match self {
            PageEdit::AddCard {
                list,
                card,
                position,
            } => {
                let list = find_list(doc, sel, list)?;
                let node = build_card(doc, sel, card)?;
                insert_card(doc, sel, list, node, *position)
            }
            PageEdit::RemoveCard { title } => {
                let card = find_card(doc, sel, title)?;
                let list = query::list_of_card(doc, sel, card);
                doc.remove(card)?;
                if let Some(list) = list {
                    relayout(doc, sel, list)?;
                }
                Ok(())
            }
            PageEdit::RenameCard { title, to } => {
                let card = find_card(doc, sel, title)?;
                let title_node = doc
                    .find_first(card, &sel.card_title)
                    .ok_or_else(|| SuperListsError::not_found(format!("title of card '{title}'")))?;
                doc.set_text(title_node, to)
            }
            PageEdit::MoveCard {
                title,
                list,
                position,
            } => {
                let card = find_card(doc, sel, title)?;
                let source = query::list_of_card(doc, sel, card);
                let target = find_list(doc, sel, list)?;
                insert_card(doc, sel, target, card, *position)?;
                if let Some(source) = source.filter(|source| *source != target) {
                    relayout(doc, sel, source)?;
                }
                Ok(())
            }
            PageEdit::HideCard { title, hidden } => {
                let card = find_card(doc, sel, title)?;
                doc.set_hidden(card, *hidden)
            }
            PageEdit::SetBadges { title, badges } => {
                let card = find_card(doc, sel, title)?;
                let container = doc
                    .find_first(card, &sel.badges)
                    .ok_or_else(|| SuperListsError::not_found(format!("badges of card '{title}'")))?;
                for badge in doc.children(container) {
                    doc.remove(badge)?;
                }
                for badge in badges {
                    let node = doc.create_element(&[sel.badge.as_str()]);
                    doc.set_text(node, badge)?;
                    doc.append_child(container, node)?;
                }
                Ok(())
            }
            PageEdit::AddList { list, position } => {
                let board = board(doc, sel)?;
                let node = build_list(doc, sel, list)?;
                let reference = position.and_then(|p| query::lists_by_name(doc, sel, None, &[]).get(p).copied());
                doc.insert_before(board, node, reference)
            }
            PageEdit::RemoveList { name } => {
                let list = find_list(doc, sel, name)?;
                doc.remove(list)
            }
            PageEdit::RenameList { name, to } => {
                let list = find_list(doc, sel, name)?;
                let title = doc
                    .find_first(list, &sel.list_title)
                    .ok_or_else(|| SuperListsError::not_found(format!("title of list '{name}'")))?;
                doc.set_text(title, to)
            }
            PageEdit::MoveList { name, position } => {
                let list = find_list(doc, sel, name)?;
                move_list(doc, sel, list, *position)
            }
            PageEdit::DragList { name } => {
                let list = find_list(doc, sel, name)?;
                doc.add_class(list, &sel.dragging)
            }
            PageEdit::DropList { name, position } => {
                let list = find_list(doc, sel, name)?;
                move_list(doc, sel, list, *position)?;
                doc.remove_class(list, &sel.dragging)
            }
            PageEdit::ResizeList { name, height } => {
                let list = find_list(doc, sel, name)?;
                doc.set_height(list, *height)
            }
            PageEdit::RedrawHeader => {
                let root = doc.root();
                let old = query::board_header(doc, sel);
                let header = doc.create_element(&[sel.board_header.as_str()]);
                doc.insert_before(root, header, old)?;
                if let Some(old) = old {
                    doc.remove(old)?;
                }
                Ok(())
            }
            PageEdit::ReplaceBoard { board: fixture } => {
                let root = doc.root();
                let old = query::board_root(doc, sel);
                let board = fixture.build_canvas(doc, sel)?;
                doc.set_location(fixture.location());
                doc.insert_before(root, board, old)?;
                if let Some(old) = old {
                    doc.remove(old)?;
                }
                Ok(())
            }
        }
    }
}

fn board(doc: &MemoryDocument, sel: &PageSelectors) -> SuperListsResult<NodeId> {
    query::board_root(doc, sel).ok_or_else(|| SuperListsError::not_found("board root"))
}

pub fn find_list(doc: &dyn Dom, sel: &PageSelectors, name: &str) -> SuperListsResult<NodeId> {
    query::lists_by_name(doc, sel, Some(name), &[])
        .into_iter()
        .find(|list| query::list_name(doc, sel, *list).is_ok_and(|n| n == name))
        .ok_or_else(|| SuperListsError::not_found(format!("list '{name}'")))
}

pub fn find_card(doc: &dyn Dom, sel: &PageSelectors, title: &str) -> SuperListsResult<NodeId> {
    query::cards_by_name(doc, sel, title, true)?
        .into_iter()
        .next()
        .ok_or_else(|| SuperListsError::not_found(format!("card '{title}'")))
}

fn insert_card(
    doc: &mut MemoryDocument,
    sel: &PageSelectors,
    list: NodeId,
    card: NodeId,
    position: Option<usize>,
) -> SuperListsResult<()> {
    let container = doc
        .find_first(list, &sel.list_cards)
        .ok_or_else(|| SuperListsError::not_found(format!("cards of list {list}")))?;
    let reference = position.and_then(|p| {
        doc.children(container)
            .into_iter()
            .filter(|n| *n != card)
            .nth(p)
    });
    doc.insert_before(container, card, reference)?;
    relayout(doc, sel, list)
}

fn move_list(doc: &mut MemoryDocument, sel: &PageSelectors, list: NodeId, position: usize) -> SuperListsResult<()> {
    let board = board(doc, sel)?;
    let reference = query::lists_by_name(doc, sel, None, &[])
        .into_iter()
        .filter(|n| *n != list)
        .nth(position);
    doc.insert_before(board, list, reference)
}

fn relayout(doc: &mut MemoryDocument, sel: &PageSelectors, list: NodeId) -> SuperListsResult<()> {
    let cards = doc
        .find_all(list, &sel.card)
        .into_iter()
        .filter(|card| !doc.is_hidden(*card))
        .count();
    doc.set_height(list, auto_height(cards))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page() -> (MemoryDocument, PageSelectors) {
        let sel = PageSelectors::default();
        let fixture = BoardFixture::new("fx1")
            .name("Team Board")
            .list(ListFixture::new("Todo").cards("Task", 2))
            .list(ListFixture::new("Done").height(500));
        let mut doc = MemoryDocument::new("about:blank");
        fixture.build(&mut doc, &sel).unwrap();
        doc.take_records();
        (doc, sel)
    }

    fn names(doc: &MemoryDocument, sel: &PageSelectors) -> Vec<String> {
        query::lists_by_name(doc, sel, None, &[])
            .into_iter()
            .map(|l| query::list_name(doc, sel, l).unwrap())
            .collect()
    }

    #[test]
    fn test_build_lays_out_board() {
        let (doc, sel) = page();
        assert_eq!(doc.location(), "https://trello.com/b/fx1/team-board");
        assert_eq!(query::board_id(&doc).as_deref(), Some("fx1"));
        assert_eq!(names(&doc, &sel), vec!["Todo", "Done"]);
        let todo = find_list(&doc, &sel, "Todo").unwrap();
        assert_eq!(doc.height(todo), LIST_HEADER_HEIGHT + 2 * CARD_HEIGHT);
        assert_eq!(doc.height(find_list(&doc, &sel, "Done").unwrap()), 500);
    }

    #[test]
    fn test_card_edits() {
        let (mut doc, sel) = page();
        PageEdit::AddCard {
            list: "Done".into(),
            card: CardFixture::new("Shipped"),
            position: None,
        }
        .apply(&mut doc, &sel)
        .unwrap();
        PageEdit::MoveCard {
            title: "Task 1".into(),
            list: "Done".into(),
            position: Some(0),
        }
        .apply(&mut doc, &sel)
        .unwrap();
        PageEdit::RenameCard {
            title: "Task 2".into(),
            to: "Task two".into(),
        }
        .apply(&mut doc, &sel)
        .unwrap();

        let done = find_list(&doc, &sel, "Done").unwrap();
        let titles: Vec<String> = query::cards_in_list(&doc, &sel, done, &[], 0)
            .unwrap()
            .into_iter()
            .map(|c| query::card_title(&doc, &sel, c).unwrap())
            .collect();
        assert_eq!(titles, vec!["Task 1", "Shipped"]);
        assert!(find_card(&doc, &sel, "Task two").is_ok());
        let todo = find_list(&doc, &sel, "Todo").unwrap();
        assert_eq!(doc.height(todo), LIST_HEADER_HEIGHT + CARD_HEIGHT);
    }

    #[test]
    fn test_list_edits() {
        let (mut doc, sel) = page();
        PageEdit::AddList {
            list: ListFixture::new("Doing"),
            position: Some(1),
        }
        .apply(&mut doc, &sel)
        .unwrap();
        assert_eq!(names(&doc, &sel), vec!["Todo", "Doing", "Done"]);

        PageEdit::MoveList {
            name: "Todo".into(),
            position: 2,
        }
        .apply(&mut doc, &sel)
        .unwrap();
        assert_eq!(names(&doc, &sel), vec!["Doing", "Done", "Todo"]);

        PageEdit::DragList { name: "Done".into() }.apply(&mut doc, &sel).unwrap();
        let done = find_list(&doc, &sel, "Done").unwrap();
        assert!(doc.has_class(done, &sel.dragging));
        PageEdit::DropList {
            name: "Done".into(),
            position: 0,
        }
        .apply(&mut doc, &sel)
        .unwrap();
        assert!(!doc.has_class(done, &sel.dragging));
        assert_eq!(names(&doc, &sel), vec!["Done", "Doing", "Todo"]);

        PageEdit::RemoveList { name: "Doing".into() }.apply(&mut doc, &sel).unwrap();
        assert_eq!(names(&doc, &sel), vec!["Done", "Todo"]);

        let missing = PageEdit::RenameList {
            name: "Nope".into(),
            to: "x".into(),
        }
        .apply(&mut doc, &sel);
        assert!(matches!(missing, Err(SuperListsError::NotFound(_))));
    }

    #[test]
    fn test_replace_board_changes_location() {
        let (mut doc, sel) = page();
        let before = query::board_root(&doc, &sel).unwrap();
        PageEdit::ReplaceBoard {
            board: BoardFixture::new("fx2").list(ListFixture::new("Only")),
        }
        .apply(&mut doc, &sel)
        .unwrap();
        assert_ne!(query::board_root(&doc, &sel), Some(before));
        assert_eq!(query::board_id(&doc).as_deref(), Some("fx2"));
        assert_eq!(names(&doc, &sel), vec!["Only"]);
    }

    #[test]
    fn test_edits_deserialize_by_op_tag() {
        let edits: Vec<PageEdit> = serde_json::from_value(json!([
            {"op": "add_card", "list": "Todo", "card": {"title": "New", "labels": ["x"]}},
            {"op": "drag_list", "name": "Todo"},
            {"op": "redraw_header"}
        ]))
        .unwrap();
        assert_eq!(edits.len(), 3);
        assert_eq!(edits[2], PageEdit::RedrawHeader);
        assert!(matches!(&edits[0], PageEdit::AddCard { position: None, .. }));
    }
}

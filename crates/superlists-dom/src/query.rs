//! Read-only lookups over the board page.
//!
//! Matching is case-sensitive substring containment unless noted.

use crate::dom::{Dom, NodeId};
use crate::selectors::PageSelectors;
use crate::traverse::DomExt;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use superlists_core::{SuperListsError, SuperListsResult};
use superlists_domain::parse_field;

/// One needle or a set of alternatives for [`contains_any`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Needle {
    One(String),
    Any(Vec<String>),
}

impl Needle {
    /// Accepts a JSON string or an array of strings.
    pub fn from_json(value: &Value) -> SuperListsResult<Self> {
        match value {
            Value::String(needle) => Ok(Self::One(needle.clone())),
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_str().map(str::to_string).ok_or_else(|| {
                        SuperListsError::invalid(format!("needle entry {item} is not a string"))
                    })
                })
                .collect::<SuperListsResult<Vec<_>>>()
                .map(Self::Any),
            other => Err(SuperListsError::invalid(format!(
                "needle must be a string or an array, got {other}"
            ))),
        }
    }
}

impl From<&str> for Needle {
    fn from(needle: &str) -> Self {
        Self::One(needle.to_string())
    }
}

impl From<&[&str]> for Needle {
    fn from(needles: &[&str]) -> Self {
        Self::Any(needles.iter().map(|n| n.to_string()).collect())
    }
}

/// Substring containment; an empty needle matches everything.
pub fn contains_any(text: &str, needle: &Needle) -> bool {
    match needle {
        Needle::One(needle) => text.contains(needle.as_str()),
        Needle::Any(needles) => needles.iter().any(|n| text.contains(n.as_str())),
    }
}

fn excluded(text: &str, exclude: &[&str]) -> bool {
    exclude.iter().any(|term| text.contains(term))
}

/// The board id is the path segment following `/b/`.
pub fn board_id_from_location(location: &str) -> Option<String> {
    let (_, rest) = location.split_once("/b/")?;
    let id = rest.split(['/', '?', '#']).next()?;
    (!id.is_empty()).then(|| id.to_string())
}

pub fn board_id(dom: &dyn Dom) -> Option<String> {
    board_id_from_location(dom.location())
}

pub fn board_root(dom: &dyn Dom, sel: &PageSelectors) -> Option<NodeId> {
    dom.find_first(dom.root(), &sel.board)
}

pub fn board_header(dom: &dyn Dom, sel: &PageSelectors) -> Option<NodeId> {
    dom.find_first(dom.root(), &sel.board_header)
}

pub fn is_list(dom: &dyn Dom, sel: &PageSelectors, node: NodeId) -> bool {
    dom.has_class(node, &sel.list_wrapper)
}

pub fn is_card(dom: &dyn Dom, sel: &PageSelectors, node: NodeId) -> bool {
    dom.has_class(node, &sel.card)
}

pub fn require_list(dom: &dyn Dom, sel: &PageSelectors, node: NodeId) -> SuperListsResult<()> {
    if dom.exists(node) && is_list(dom, sel, node) {
        Ok(())
    } else {
        Err(SuperListsError::invalid(format!("{node} is not a list")))
    }
}

pub fn require_card(dom: &dyn Dom, sel: &PageSelectors, node: NodeId) -> SuperListsResult<()> {
    if dom.exists(node) && is_card(dom, sel, node) {
        Ok(())
    } else {
        Err(SuperListsError::invalid(format!("{node} is not a card")))
    }
}

/// Lists whose name contains `name` (all when `None`) and none of `exclude`,
/// in document order.
pub fn lists_by_name(
    dom: &dyn Dom,
    sel: &PageSelectors,
    name: Option<&str>,
    exclude: &[&str],
) -> Vec<NodeId> {
    let Some(board) = board_root(dom, sel) else {
        return Vec::new();
    };
    dom.find_all(board, &sel.list_wrapper)
        .into_iter()
        .filter(|list| {
            let title = list_title_text(dom, sel, *list);
            name.map_or(true, |name| title.contains(name)) && !excluded(&title, exclude)
        })
        .collect()
}

pub fn list_name(dom: &dyn Dom, sel: &PageSelectors, list: NodeId) -> SuperListsResult<String> {
    require_list(dom, sel, list)?;
    Ok(list_title_text(dom, sel, list))
}

fn list_title_text(dom: &dyn Dom, sel: &PageSelectors, list: NodeId) -> String {
    dom.find_first(list, &sel.list_title)
        .map(|title| dom.text_content(title).trim().to_string())
        .unwrap_or_default()
}

pub fn list_of_card(dom: &dyn Dom, sel: &PageSelectors, card: NodeId) -> Option<NodeId> {
    dom.closest(card, &sel.list_wrapper)
}

/// Cards of `list` from `from_index` on, skipping titles containing any of `exclude`.
pub fn cards_in_list(
    dom: &dyn Dom,
    sel: &PageSelectors,
    list: NodeId,
    exclude: &[&str],
    from_index: usize,
) -> SuperListsResult<Vec<NodeId>> {
    require_list(dom, sel, list)?;
    Ok(dom
        .find_all(list, &sel.card)
        .into_iter()
        .skip(from_index)
        .filter(|card| !excluded(&card_title_text(dom, sel, *card), exclude))
        .collect())
}

pub fn count_cards_in_list(
    dom: &dyn Dom,
    sel: &PageSelectors,
    list: NodeId,
    exclude: &[&str],
    from_index: usize,
) -> SuperListsResult<usize> {
    cards_in_list(dom, sel, list, exclude, from_index).map(|cards| cards.len())
}

pub fn cards_by_name(
    dom: &dyn Dom,
    sel: &PageSelectors,
    name: &str,
    exact_match: bool,
) -> SuperListsResult<Vec<NodeId>> {
    if name.is_empty() {
        return Err(SuperListsError::invalid("card name must not be empty"));
    }
    let Some(board) = board_root(dom, sel) else {
        return Ok(Vec::new());
    };
    Ok(dom
        .find_all(board, &sel.card)
        .into_iter()
        .filter(|card| {
            let title = card_title_text(dom, sel, *card);
            if exact_match {
                title == name
            } else {
                title.contains(name)
            }
        })
        .collect())
}

pub fn card_title(dom: &dyn Dom, sel: &PageSelectors, card: NodeId) -> SuperListsResult<String> {
    require_card(dom, sel, card)?;
    Ok(card_title_text(dom, sel, card))
}

fn card_title_text(dom: &dyn Dom, sel: &PageSelectors, card: NodeId) -> String {
    dom.find_first(card, &sel.card_title)
        .and_then(|title| dom.text(title))
        .unwrap_or_default()
}

pub fn card_labels(
    dom: &dyn Dom,
    sel: &PageSelectors,
    card: NodeId,
    exclude: &[&str],
) -> SuperListsResult<BTreeSet<String>> {
    require_card(dom, sel, card)?;
    Ok(dom
        .find_all(card, &sel.card_label)
        .into_iter()
        .map(|label| dom.text_content(label).trim().to_string())
        .filter(|label| !label.is_empty() && !excluded(label, exclude))
        .collect())
}

pub fn card_badges(dom: &dyn Dom, sel: &PageSelectors, card: NodeId) -> SuperListsResult<Vec<String>> {
    require_card(dom, sel, card)?;
    Ok(dom
        .find_all(card, &sel.badge)
        .into_iter()
        .map(|badge| dom.text_content(badge).trim().to_string())
        .filter(|text| !text.is_empty())
        .collect())
}

/// Custom fields rendered as `"Name: value"` badges.
pub fn card_fields(
    dom: &dyn Dom,
    sel: &PageSelectors,
    card: NodeId,
) -> SuperListsResult<BTreeMap<String, String>> {
    Ok(card_badges(dom, sel, card)?
        .iter()
        .filter_map(|badge| parse_field(badge))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{BoardFixture, CardFixture, ListFixture};
    use crate::MemoryDocument;
    use serde_json::json;

    fn board() -> (MemoryDocument, PageSelectors, Vec<NodeId>) {
        let sel = PageSelectors::default();
        let fixture = BoardFixture::new("q1")
            .list(
                ListFixture::new("Alpha")
                    .card(CardFixture::new("Write docs").label("docs").badge("Owner: Kim"))
                    .card(CardFixture::new("// aside"))
                    .card(CardFixture::new("### Later ###"))
                    .card(CardFixture::new("Write tests").label("qa").label("urgent")),
            )
            .list(ListFixture::new("Bravo [3]"))
            .list(ListFixture::new("Alpha.Archive"));
        let mut doc = MemoryDocument::new(fixture.location());
        let built = fixture.build(&mut doc, &sel).unwrap();
        (doc, sel, built.lists)
    }

    #[test]
    fn test_contains_any() {
        assert!(contains_any("hello", &Needle::from("ell")));
        assert!(!contains_any("hello", &Needle::from("xyz")));
        assert!(contains_any("hello", &Needle::from("")));
        assert!(contains_any("hello", &Needle::from(&["x", "lo"][..])));
        assert!(contains_any("hello", &Needle::from(&["x", ""][..])));
        assert!(!contains_any("hello", &Needle::Any(vec![])));
    }

    #[test]
    fn test_needle_from_json() {
        assert_eq!(Needle::from_json(&json!("a")).unwrap(), Needle::One("a".into()));
        assert_eq!(
            Needle::from_json(&json!(["a", "b"])).unwrap(),
            Needle::Any(vec!["a".into(), "b".into()])
        );
        assert!(matches!(
            Needle::from_json(&json!(3)),
            Err(SuperListsError::InvalidArgument(_))
        ));
        assert!(Needle::from_json(&json!(["a", 1])).is_err());
    }

    #[test]
    fn test_board_id_from_location() {
        assert_eq!(
            board_id_from_location("https://trello.com/b/AbC123/team-board"),
            Some("AbC123".to_string())
        );
        assert_eq!(
            board_id_from_location("https://trello.com/b/AbC123?menu=1"),
            Some("AbC123".to_string())
        );
        assert_eq!(board_id_from_location("https://trello.com/c/xyz/card"), None);
        assert_eq!(board_id_from_location("https://trello.com/b/"), None);
    }

    #[test]
    fn test_lists_by_name_filters_in_document_order() {
        let (doc, sel, lists) = board();
        assert_eq!(lists_by_name(&doc, &sel, None, &[]), lists);
        assert_eq!(
            lists_by_name(&doc, &sel, Some("Alpha"), &[]),
            vec![lists[0], lists[2]]
        );
        assert_eq!(
            lists_by_name(&doc, &sel, Some("Alpha"), &["Archive"]),
            vec![lists[0]]
        );
        assert_eq!(list_name(&doc, &sel, lists[1]).unwrap(), "Bravo [3]");
    }

    #[test]
    fn test_cards_in_list_with_exclusions_and_offset() {
        let (doc, sel, lists) = board();
        assert_eq!(count_cards_in_list(&doc, &sel, lists[0], &[], 0).unwrap(), 4);
        assert_eq!(
            count_cards_in_list(&doc, &sel, lists[0], &["//", "###"], 0).unwrap(),
            2
        );
        assert_eq!(count_cards_in_list(&doc, &sel, lists[0], &[], 3).unwrap(), 1);
        assert_eq!(count_cards_in_list(&doc, &sel, lists[1], &[], 0).unwrap(), 0);
        assert!(cards_in_list(&doc, &sel, NodeId::new(9999), &[], 0).is_err());
    }

    #[test]
    fn test_cards_by_name() {
        let (doc, sel, _) = board();
        assert_eq!(cards_by_name(&doc, &sel, "Write", false).unwrap().len(), 2);
        assert_eq!(cards_by_name(&doc, &sel, "Write", true).unwrap().len(), 0);
        assert_eq!(cards_by_name(&doc, &sel, "Write docs", true).unwrap().len(), 1);
        assert!(matches!(
            cards_by_name(&doc, &sel, "", false),
            Err(SuperListsError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_labels_and_fields() {
        let (doc, sel, _) = board();
        let card = cards_by_name(&doc, &sel, "Write tests", true).unwrap()[0];
        let labels = card_labels(&doc, &sel, card, &[]).unwrap();
        assert_eq!(labels.into_iter().collect::<Vec<_>>(), vec!["qa", "urgent"]);
        let labels = card_labels(&doc, &sel, card, &["urg"]).unwrap();
        assert_eq!(labels.len(), 1);

        let docs = cards_by_name(&doc, &sel, "Write docs", true).unwrap()[0];
        let fields = card_fields(&doc, &sel, docs).unwrap();
        assert_eq!(fields.get("Owner").map(String::as_str), Some("Kim"));

        assert!(card_labels(&doc, &sel, NodeId::new(9999), &[]).is_err());
        let list = doc.find_first(doc.root(), &sel.list_wrapper).unwrap();
        assert!(matches!(
            card_fields(&doc, &sel, list),
            Err(SuperListsError::InvalidArgument(_))
        ));
    }
}

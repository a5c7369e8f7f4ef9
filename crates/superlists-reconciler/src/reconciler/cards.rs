use super::{Board, Cx};
use crate::classes;
use superlists_core::{SuperListsError, SuperListsResult};
use superlists_domain::{CardTraits, SectionChange};
use superlists_dom::{query, DomExt, NodeId};

/// Clears every class and data key the reconciler put on a card.
pub(super) fn strip_card(cx: &mut Cx<'_>, card: NodeId, folded: bool) -> SuperListsResult<()> {
    for class in [
        classes::COMMENT,
        classes::BLOCKED,
        classes::SECTION,
        classes::SECTION_COLLAPSED,
    ] {
        cx.dom.remove_class(card, class)?;
    }
    cx.dom.set_data(card, classes::DATA_LABELS, None)?;
    cx.dom.set_data(card, classes::DATA_FIELDS, None)?;
    if folded {
        cx.dom.set_hidden(card, false)?;
    }
    Ok(())
}

impl Board {
    /// Derives comment, blocked and section styling from the card's title and
    /// badges, and exposes labels and custom fields as data.
    pub(super) fn format_card(&mut self, cx: &mut Cx<'_>, card: NodeId) -> SuperListsResult<()> {
        let env = cx.env;
        let sel = &env.selectors;
        let title = query::card_title(cx.dom, sel, card)?;
        let badges = query::card_badges(cx.dom, sel, card)?;
        let labels = query::card_labels(cx.dom, sel, card, &[])?;
        let fields = query::card_fields(cx.dom, sel, card)?;
        let traits = CardTraits::derive(&title, &badges, &env.marker);

        cx.dom.toggle_class(card, classes::COMMENT, traits.is_comment)?;
        cx.dom.toggle_class(card, classes::BLOCKED, traits.is_blocked)?;

        let labels = labels.into_iter().collect::<Vec<_>>().join(",");
        cx.dom.set_data(card, classes::DATA_LABELS, Some(labels.as_str()).filter(|l| !l.is_empty()))?;
        let fields = fields
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");
        cx.dom.set_data(card, classes::DATA_FIELDS, Some(fields.as_str()).filter(|f| !f.is_empty()))?;

        if traits.is_section {
            self.install_section(cx, card, &title)
        } else {
            self.remove_section(cx, card)
        }
    }

    /// Shows the stripped title in place of the raw one.
    fn install_section(&mut self, cx: &mut Cx<'_>, card: NodeId, title: &str) -> SuperListsResult<()> {
        let stripped = cx.env.marker.stripped_title(title);
        if let Some(node) = self.sections.get(&card) {
            return cx.dom.set_text(*node, &stripped);
        }
        let node = cx.dom.create_element(&[classes::SECTION_TITLE]);
        cx.dom.set_text(node, &stripped)?;
        let first = cx.dom.children(card).first().copied();
        cx.dom.insert_before(card, node, first)?;
        cx.dom.add_class(card, classes::SECTION)?;
        if let Some(raw) = cx.dom.find_first(card, &cx.env.selectors.card_title) {
            cx.dom.set_hidden(raw, true)?;
        }
        self.sections.insert(card, node);
        Ok(())
    }

    pub(super) fn remove_section(&mut self, cx: &mut Cx<'_>, card: NodeId) -> SuperListsResult<()> {
        let Some(node) = self.sections.remove(&card) else {
            return Ok(());
        };
        cx.dom.remove(node)?;
        cx.dom.remove_class(card, classes::SECTION)?;
        cx.dom.remove_class(card, classes::SECTION_COLLAPSED)?;
        if let Some(raw) = cx.dom.find_first(card, &cx.env.selectors.card_title) {
            cx.dom.set_hidden(raw, false)?;
        }
        Ok(())
    }

    /// Hides the body of every collapsed section in `list`: the cards after
    /// it up to the next section or the end of the list.
    pub(super) fn apply_section_folds(&mut self, cx: &mut Cx<'_>, list: NodeId) -> SuperListsResult<()> {
        let env = cx.env;
        let sel = &env.selectors;
        let name = query::list_name(cx.dom, sel, list)?;
        let mut folding = false;
        for card in query::cards_in_list(cx.dom, sel, list, &[], 0)? {
            if self.sections.contains_key(&card) {
                let title = query::card_title(cx.dom, sel, card)?;
                let collapsed = self
                    .view
                    .is_section_collapsed(&name, &env.marker.stripped_title(&title));
                cx.dom.toggle_class(card, classes::SECTION_COLLAPSED, collapsed)?;
                if self.folded.remove(&card) {
                    cx.dom.set_hidden(card, false)?;
                }
                folding = collapsed;
            } else if folding {
                if !self.folded.contains(&card) && !cx.dom.is_hidden(card) {
                    cx.dom.set_hidden(card, true)?;
                    self.folded.insert(card);
                }
            } else if self.folded.remove(&card) {
                cx.dom.set_hidden(card, false)?;
            }
        }
        Ok(())
    }

    /// Flips and remembers the fold of a section card. Returns the new state.
    pub(super) fn toggle_section(&mut self, cx: &mut Cx<'_>, card: NodeId) -> SuperListsResult<bool> {
        let env = cx.env;
        let sel = &env.selectors;
        let title = query::card_title(cx.dom, sel, card)?;
        if !self.sections.contains_key(&card) {
            return Err(SuperListsError::invalid(format!("{card} is not a section card")));
        }
        let list = query::list_of_card(cx.dom, sel, card)
            .ok_or_else(|| SuperListsError::not_found(format!("list of card {card}")))?;
        let name = query::list_name(cx.dom, sel, list)?;
        let section = env.marker.stripped_title(&title);
        let collapsed = !self.view.is_section_collapsed(&name, &section);
        self.view.set_section_collapsed(&name, &section, collapsed);
        self.apply_section_folds(cx, list)?;
        tracing::debug!(list = %name, section = %section, collapsed, "Section toggled");
        Ok(collapsed)
    }

    pub(super) fn on_card_modified(
        &mut self,
        cx: &mut Cx<'_>,
        card: NodeId,
        new_title: &str,
        old_title: &str,
    ) -> SuperListsResult<()> {
        let env = cx.env;
        let change = env.marker.classify_change(old_title, new_title);
        let list = query::list_of_card(cx.dom, &env.selectors, card);
        if let (SectionChange::Retitled, Some(list)) = (change, list) {
            let name = query::list_name(cx.dom, &env.selectors, list)?;
            self.view.rename_section(
                &name,
                &env.marker.stripped_title(old_title),
                &env.marker.stripped_title(new_title),
            );
        }
        self.format_card(cx, card)?;
        let Some(list) = list else {
            return Ok(());
        };
        if matches!(change, SectionChange::Created | SectionChange::Removed) {
            tracing::debug!(%card, ?change, "Section status changed");
            self.apply_section_folds(cx, list)?;
        }
        self.show_wip_limit(cx, list).map(|_| ())
    }

    pub(super) fn on_card_removed(
        &mut self,
        cx: &mut Cx<'_>,
        card: NodeId,
        list: Option<NodeId>,
    ) -> SuperListsResult<()> {
        query::require_card(cx.dom, &cx.env.selectors, card)?;
        let was_section = self.sections.remove(&card).is_some();
        self.folded.remove(&card);
        let Some(list) = list.filter(|list| cx.dom.is_attached(*list)) else {
            return Ok(());
        };
        if was_section {
            self.apply_section_folds(cx, list)?;
        }
        self.show_wip_limit(cx, list).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use crate::classes;
    use crate::reconciler::Reconciler;
    use superlists_core::{Settings, SuperListsError};
    use superlists_dom::{
        BoardFixture, CardFixture, Dom, DomExt, ListFixture, MemoryDocument, NodeId, PageEdit, PageSelectors,
    };
    use superlists_observer::BoardEvent;
    use superlists_persistence::ViewStateStore;

    fn attach(view: ViewStateStore) -> (MemoryDocument, Reconciler, NodeId) {
        let sel = PageSelectors::default();
        let mut doc = MemoryDocument::new("about:blank");
        let built = BoardFixture::new("b1")
            .list(
                ListFixture::new("Doing [3]")
                    .card(CardFixture::new("### Now ###"))
                    .card(CardFixture::new("A").label("urgent").badge("Owner: Kim"))
                    .card(CardFixture::new("### Later ###"))
                    .card(CardFixture::new("B").badge("Blocked"))
                    .card(CardFixture::new("// note")),
            )
            .build(&mut doc, &sel)
            .unwrap();
        doc.take_records();
        let mut reconciler = Reconciler::new(Settings::default(), sel).unwrap();
        reconciler.attach(&mut doc, "b1", view).unwrap();
        (doc, reconciler, built.lists[0])
    }

    fn cards(doc: &MemoryDocument, list: NodeId) -> Vec<NodeId> {
        doc.find_all(list, &PageSelectors::default().card)
    }

    fn rename(doc: &mut MemoryDocument, reconciler: &mut Reconciler, card: NodeId, from: &str, to: &str) {
        PageEdit::RenameCard {
            title: from.into(),
            to: to.into(),
        }
        .apply(doc, &PageSelectors::default())
        .unwrap();
        doc.take_records();
        let event = BoardEvent::CardModified {
            card,
            new_title: to.into(),
            old_title: from.into(),
        };
        reconciler.handle(doc, &event).unwrap();
    }

    fn badge(doc: &MemoryDocument, reconciler: &Reconciler) -> Option<String> {
        reconciler.snapshot(doc).unwrap().lists[0].badge.clone()
    }

    #[test]
    fn test_card_formatting() {
        let (doc, _reconciler, list) = attach(ViewStateStore::detached("b1"));
        let cards = cards(&doc, list);

        assert!(doc.has_class(cards[0], classes::SECTION));
        let title = doc.find_first(cards[0], classes::SECTION_TITLE).unwrap();
        assert_eq!(doc.text(title).as_deref(), Some("Now"));
        let raw = doc.find_first(cards[0], "list-card-title").unwrap();
        assert!(doc.is_hidden(raw));

        assert_eq!(doc.data(cards[1], classes::DATA_LABELS).as_deref(), Some("urgent"));
        assert_eq!(doc.data(cards[1], classes::DATA_FIELDS).as_deref(), Some("Owner=Kim"));
        assert!(doc.has_class(cards[3], classes::BLOCKED));
        assert!(doc.has_class(cards[4], classes::COMMENT));
    }

    #[test]
    fn test_section_fold_hides_body_until_next_section() {
        let (mut doc, mut reconciler, list) = attach(ViewStateStore::detached("b1"));
        let cards = cards(&doc, list);

        assert!(reconciler.toggle_section(&mut doc, cards[0]).unwrap());
        assert!(doc.is_hidden(cards[1]));
        assert!(!doc.is_hidden(cards[2]));
        assert!(!doc.is_hidden(cards[3]));
        assert!(doc.has_class(cards[0], classes::SECTION_COLLAPSED));
        assert!(reconciler
            .view_state()
            .unwrap()
            .is_section_collapsed("Doing [3]", "Now"));

        assert!(reconciler.toggle_section(&mut doc, cards[2]).unwrap());
        assert!(doc.is_hidden(cards[3]));
        assert!(doc.is_hidden(cards[4]));

        assert!(!reconciler.toggle_section(&mut doc, cards[0]).unwrap());
        assert!(!doc.is_hidden(cards[1]));
        assert!(doc.is_hidden(cards[4]));
    }

    #[test]
    fn test_remembered_fold_is_restored() {
        let mut view = ViewStateStore::detached("b1");
        view.set_section_collapsed("Doing [3]", "Later", true);
        let (doc, reconciler, list) = attach(view);
        let cards = cards(&doc, list);
        assert!(!doc.is_hidden(cards[1]));
        assert!(doc.is_hidden(cards[3]));
        assert_eq!(reconciler.snapshot(&doc).unwrap().lists[0].folded_cards, 2);
    }

    #[test]
    fn test_toggle_section_rejects_plain_card() {
        let (mut doc, mut reconciler, list) = attach(ViewStateStore::detached("b1"));
        let cards = cards(&doc, list);
        assert!(matches!(
            reconciler.toggle_section(&mut doc, cards[1]),
            Err(SuperListsError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_plain_card_becomes_section() {
        let (mut doc, mut reconciler, list) = attach(ViewStateStore::detached("b1"));
        let cards = cards(&doc, list);
        assert_eq!(badge(&doc, &reconciler).as_deref(), Some("2 / 3"));

        rename(&mut doc, &mut reconciler, cards[1], "A", "### Mid ###");
        assert!(doc.has_class(cards[1], classes::SECTION));
        let title = doc.find_first(cards[1], classes::SECTION_TITLE).unwrap();
        assert_eq!(doc.text(title).as_deref(), Some("Mid"));
        let raw = doc.find_first(cards[1], "list-card-title").unwrap();
        assert!(doc.is_hidden(raw));
        assert_eq!(badge(&doc, &reconciler).as_deref(), Some("1 / 3"));
    }

    #[test]
    fn test_section_card_becomes_plain() {
        let (mut doc, mut reconciler, list) = attach(ViewStateStore::detached("b1"));
        let cards = cards(&doc, list);
        reconciler.toggle_section(&mut doc, cards[0]).unwrap();
        assert!(doc.is_hidden(cards[1]));

        rename(&mut doc, &mut reconciler, cards[0], "### Now ###", "Now done");
        assert!(!doc.is_hidden(cards[1]));
        assert!(!doc.has_class(cards[0], classes::SECTION));
        assert!(!doc.has_class(cards[0], classes::SECTION_COLLAPSED));
        assert!(doc.find_first(cards[0], classes::SECTION_TITLE).is_none());
        let raw = doc.find_first(cards[0], "list-card-title").unwrap();
        assert!(!doc.is_hidden(raw));
        assert_eq!(badge(&doc, &reconciler).as_deref(), Some("3 / 3"));
    }

    #[test]
    fn test_retitled_section_keeps_its_fold() {
        let (mut doc, mut reconciler, list) = attach(ViewStateStore::detached("b1"));
        let cards = cards(&doc, list);
        reconciler.toggle_section(&mut doc, cards[0]).unwrap();

        rename(&mut doc, &mut reconciler, cards[0], "### Now ###", "### Today ###");
        let title = doc.find_first(cards[0], classes::SECTION_TITLE).unwrap();
        assert_eq!(doc.text(title).as_deref(), Some("Today"));
        let view = reconciler.view_state().unwrap();
        assert!(view.is_section_collapsed("Doing [3]", "Today"));
        assert!(!view.is_section_collapsed("Doing [3]", "Now"));

        // refolding the list keeps the body hidden
        reconciler.toggle_section(&mut doc, cards[2]).unwrap();
        assert!(doc.is_hidden(cards[1]));
        assert!(doc.has_class(cards[0], classes::SECTION_COLLAPSED));

        assert!(!reconciler.toggle_section(&mut doc, cards[0]).unwrap());
        assert!(!doc.is_hidden(cards[1]));
    }

    #[test]
    fn test_detach_strips_card_decoration() {
        let mut view = ViewStateStore::detached("b1");
        view.set_section_collapsed("Doing [3]", "Now", true);
        let (mut doc, mut reconciler, list) = attach(view);
        let before = cards(&doc, list);
        assert!(doc.is_hidden(before[1]));

        reconciler.detach(&mut doc).unwrap();
        for card in cards(&doc, list) {
            assert!(!doc.is_hidden(card));
            assert!(doc.classes(card).iter().all(|class| !class.starts_with("sl-")));
        }
        assert!(doc.find_first(doc.root(), classes::SECTION_TITLE).is_none());
        assert!(doc.find_first(doc.root(), classes::LIST_TOGGLE).is_none());
    }
}

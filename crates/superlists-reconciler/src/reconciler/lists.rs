use super::{Board, Cx, Env};
use crate::classes;
use superlists_core::{SuperListsError, SuperListsResult};
use superlists_domain::{CardTraits, ListName, WipBadge, WipStatus};
use superlists_dom::{query, Dom, DomExt, NodeId};

/// Decoration nodes the reconciler owns inside one list.
#[derive(Debug, Clone)]
pub(super) struct ListDecor {
    pub(super) toggle: NodeId,
    pub(super) placeholder: NodeId,
    pub(super) placeholder_title: NodeId,
    pub(super) placeholder_badge: NodeId,
    pub(super) badge: Option<NodeId>,
    /// Badge currently shown.
    pub(super) wip: Option<WipBadge>,
    pub(super) collapsed: bool,
}

/// Cards that count toward a WiP limit: neither sections nor comments.
pub(super) fn count_work_cards(env: &Env, dom: &dyn Dom, list: NodeId) -> SuperListsResult<usize> {
    let sel = &env.selectors;
    let mut count = 0;
    for card in query::cards_in_list(dom, sel, list, &[], 0)? {
        let Ok(title) = query::card_title(dom, sel, card) else {
            continue;
        };
        if CardTraits::derive::<&str>(&title, &[], &env.marker).is_work_card() {
            count += 1;
        }
    }
    Ok(count)
}

pub(super) fn apply_status(
    dom: &mut dyn Dom,
    node: NodeId,
    status: WipStatus,
    top_bar: bool,
) -> SuperListsResult<()> {
    dom.toggle_class(node, classes::WIP_REACHED, status == WipStatus::Reached)?;
    dom.toggle_class(node, classes::WIP_EXCEEDED, status == WipStatus::Exceeded)?;
    dom.toggle_class(node, classes::WIP_TOP_BAR, top_bar && status != WipStatus::Neutral)
}

/// Removes every decoration from a list and makes its own parts visible again.
pub(super) fn strip_list(cx: &mut Cx<'_>, list: NodeId, decor: &ListDecor) -> SuperListsResult<()> {
    let sel = &cx.env.selectors;
    for node in [Some(decor.toggle), Some(decor.placeholder), decor.badge]
        .into_iter()
        .flatten()
    {
        cx.dom.remove(node)?;
    }
    for class in [
        classes::COLLAPSED,
        classes::WIP_REACHED,
        classes::WIP_EXCEEDED,
        classes::WIP_TOP_BAR,
    ] {
        cx.dom.remove_class(list, class)?;
    }
    let parts = [
        cx.dom.find_first(list, &sel.list_header),
        cx.dom.find_first(list, &sel.list_cards),
    ];
    for part in parts.into_iter().flatten() {
        cx.dom.set_hidden(part, false)?;
    }
    Ok(())
}

impl Board {
    /// Adds the toggle, placeholder and badge slot to a list once, restoring
    /// its remembered collapsed state.
    pub(super) fn install_list(&mut self, cx: &mut Cx<'_>, list: NodeId) -> SuperListsResult<()> {
        let env = cx.env;
        let sel = &env.selectors;
        query::require_list(cx.dom, sel, list)?;
        if self.lists.contains_key(&list) {
            return Ok(());
        }

        let header = cx.dom.find_first(list, &sel.list_header).unwrap_or(list);
        let toggle = cx.dom.create_element(&[classes::LIST_TOGGLE]);
        cx.dom.append_child(header, toggle)?;

        let placeholder = cx.dom.create_element(&[classes::LIST_PLACEHOLDER]);
        let placeholder_title = cx.dom.create_element(&[classes::PLACEHOLDER_TITLE]);
        let placeholder_badge = cx.dom.create_element(&[classes::PLACEHOLDER_BADGE]);
        cx.dom.append_child(placeholder, placeholder_title)?;
        cx.dom.append_child(placeholder, placeholder_badge)?;
        cx.dom.set_hidden(placeholder, true)?;
        let first = cx.dom.children(list).first().copied();
        cx.dom.insert_before(list, placeholder, first)?;

        self.lists.insert(
            list,
            ListDecor {
                toggle,
                placeholder,
                placeholder_title,
                placeholder_badge,
                badge: None,
                wip: None,
                collapsed: false,
            },
        );

        let name = query::list_name(cx.dom, sel, list)?;
        if self.view.is_list_collapsed(&name) {
            self.apply_list_collapsed(cx, list, true)?;
        }
        tracing::debug!(%list, name = %name, "List decorated");
        Ok(())
    }

    /// Drops bookkeeping for a list that left the page. Its decoration went
    /// with it.
    pub(super) fn forget_list(&mut self, cx: &mut Cx<'_>, list: NodeId) {
        self.lists.remove(&list);
        if let Some(handle) = self.watchers.remove(&list) {
            cx.scheduler.cancel(handle);
        }
        let dom: &dyn Dom = cx.dom;
        self.sections.retain(|card, _| dom.is_attached(*card));
        self.folded.retain(|card| dom.is_attached(*card));
    }

    pub(super) fn set_list_collapsed(
        &mut self,
        cx: &mut Cx<'_>,
        list: NodeId,
        collapsed: bool,
    ) -> SuperListsResult<()> {
        self.install_list(cx, list)?;
        let name = query::list_name(cx.dom, &cx.env.selectors, list)?;
        self.view.set_list_collapsed(&name, collapsed);
        self.apply_list_collapsed(cx, list, collapsed)
    }

    /// Collapsed lists hide their own header and cards and show the
    /// placeholder with the display name and badge instead.
    fn apply_list_collapsed(&mut self, cx: &mut Cx<'_>, list: NodeId, collapsed: bool) -> SuperListsResult<()> {
        let env = cx.env;
        let sel = &env.selectors;
        let decor = self
            .lists
            .get_mut(&list)
            .ok_or_else(|| SuperListsError::not_found(format!("decoration of list {list}")))?;
        decor.collapsed = collapsed;
        let placeholder = decor.placeholder;

        let parts = [
            cx.dom.find_first(list, &sel.list_header),
            cx.dom.find_first(list, &sel.list_cards),
        ];
        for part in parts.into_iter().flatten() {
            cx.dom.set_hidden(part, collapsed)?;
        }
        cx.dom.set_hidden(placeholder, !collapsed)?;
        cx.dom.toggle_class(list, classes::COLLAPSED, collapsed)?;

        self.show_wip_limit(cx, list)?;
        if let Some(index) = self.group_index(list) {
            self.apply_group_height(cx, index)?;
        }
        Ok(())
    }

    /// Recomputes and paints the badge of one list.
    ///
    /// Super-list members show the plain total of their whole group and
    /// leave the limit to the group header. Other lists show `count / limit`
    /// with reached and exceeded styling when their name carries a limit, a
    /// plain count when `always_count` is set, and nothing otherwise.
    pub(super) fn show_wip_limit(&mut self, cx: &mut Cx<'_>, list: NodeId) -> SuperListsResult<Option<WipBadge>> {
        let env = cx.env;
        let name = query::list_name(cx.dom, &env.selectors, list)?;
        self.install_list(cx, list)?;

        if let Some(index) = self.group_index(list) {
            let total = self.refresh_group_badge(cx, index)?;
            return Ok(Some(WipBadge::plain(total)));
        }
        let count = count_work_cards(env, cx.dom, list)?;
        let badge = match ListName::new(&name).wip_limit() {
            Some(limit) => Some(WipBadge::limited(count, limit)),
            None if env.settings.always_count => Some(WipBadge::plain(count)),
            None => None,
        };
        self.paint_list_badge(cx, list, badge)?;
        Ok(badge)
    }

    /// Writes `badge` into the list header and placeholder, adding or
    /// removing the badge node as needed.
    pub(super) fn paint_list_badge(
        &mut self,
        cx: &mut Cx<'_>,
        list: NodeId,
        badge: Option<WipBadge>,
    ) -> SuperListsResult<()> {
        let env = cx.env;
        let sel = &env.selectors;
        let name = query::list_name(cx.dom, sel, list)?;
        let status = badge.map(|badge| badge.status()).unwrap_or_default();
        let text = badge.map(|badge| badge.to_string()).unwrap_or_default();

        let decor = self
            .lists
            .get_mut(&list)
            .ok_or_else(|| SuperListsError::not_found(format!("decoration of list {list}")))?;
        decor.wip = badge;
        match (badge.is_some(), decor.badge) {
            (true, Some(node)) => cx.dom.set_text(node, &text)?,
            (true, None) => {
                let node = cx.dom.create_element(&[classes::WIP_BADGE]);
                cx.dom.set_text(node, &text)?;
                let header = cx.dom.find_first(list, &sel.list_header).unwrap_or(list);
                cx.dom.append_child(header, node)?;
                decor.badge = Some(node);
            }
            (false, Some(node)) => {
                cx.dom.remove(node)?;
                decor.badge = None;
            }
            (false, None) => {}
        }
        let placeholder = decor.placeholder;
        cx.dom.set_text(decor.placeholder_title, ListName::new(&name).display_name())?;
        cx.dom.set_text(decor.placeholder_badge, &text)?;

        for node in [list, placeholder] {
            apply_status(cx.dom, node, status, env.settings.wip_top_bar)?;
        }
        Ok(())
    }
}

use super::lists::{apply_status, count_work_cards};
use super::{Board, Cx};
use crate::classes;
use crate::scheduler::FrameTask;
use std::fmt;
use superlists_core::{SuperListsError, SuperListsResult};
use superlists_domain::{plan_groups, ListName, WipBadge};
use superlists_dom::{query, DomExt, NodeId};
use uuid::Uuid;

/// Upper bound on split passes before the board is declared inconsistent.
pub const MAX_SPLIT_PASSES: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(Uuid);

impl GroupId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Adjacent related lists rendered as one super list.
#[derive(Debug, Clone)]
pub struct ListGroup {
    pub id: GroupId,
    pub prefix: String,
    /// In board order; the first member carries the limit and the
    /// remembered collapsed state.
    pub members: Vec<NodeId>,
    pub badge: WipBadge,
    pub collapsed: bool,
    pub(super) header: NodeId,
    pub(super) badge_node: NodeId,
}

impl Board {
    pub(super) fn group_index(&self, list: NodeId) -> Option<usize> {
        self.groups.iter().position(|group| group.members.contains(&list))
    }

    /// Splits every super list, then regroups adjacent related lists and
    /// refreshes all badges.
    pub(super) fn combine_lists(&mut self, cx: &mut Cx<'_>) -> SuperListsResult<()> {
        if !self.split_all_combined(cx) {
            return Err(SuperListsError::Inconsistent(format!(
                "super lists on board {} did not split within {} passes",
                self.id, MAX_SPLIT_PASSES
            )));
        }
        let env = cx.env;
        let sel = &env.selectors;
        let lists = query::lists_by_name(cx.dom, sel, None, &[]);
        for list in &lists {
            self.install_list(cx, *list)?;
        }

        if env.settings.combine_lists {
            let names = lists
                .iter()
                .map(|list| query::list_name(cx.dom, sel, *list))
                .collect::<SuperListsResult<Vec<_>>>()?;
            for run in plan_groups(&names) {
                let prefix = ListName::new(&names[run.start])
                    .group_prefix()
                    .unwrap_or_default()
                    .to_string();
                self.create_group(cx, prefix, lists[run].to_vec())?;
            }
        }
        for list in lists {
            self.show_wip_limit(cx, list)?;
        }
        tracing::debug!(board = %self.id, groups = self.groups.len(), "Lists combined");
        Ok(())
    }

    /// Repeats until no group, group header or member mark is left under the
    /// board root. Returns `false` when [`MAX_SPLIT_PASSES`] is exhausted.
    pub(super) fn split_all_combined(&mut self, cx: &mut Cx<'_>) -> bool {
        for pass in 0..MAX_SPLIT_PASSES {
            let members = cx.dom.find_all(self.root, classes::SUB_LIST);
            let headers = cx.dom.find_all(self.root, classes::GROUP_HEADER);
            if self.groups.is_empty() && members.is_empty() && headers.is_empty() {
                if pass > 1 {
                    tracing::debug!(board = %self.id, passes = pass, "Super lists split");
                }
                return true;
            }

            for group in std::mem::take(&mut self.groups) {
                if let Err(e) = self.dissolve_group(cx, &group) {
                    tracing::warn!(group = %group.id, "Failed to dissolve super list: {}", e);
                }
            }
            for list in members {
                if let Err(e) = self.strip_member(cx, list) {
                    tracing::warn!(%list, "Failed to strip super list member: {}", e);
                }
            }
            for header in headers {
                if let Err(e) = cx.dom.remove(header) {
                    tracing::warn!(%header, "Failed to remove super list header: {}", e);
                }
            }
        }
        tracing::error!(
            board = %self.id,
            groups = ?self.groups,
            members = ?cx.dom.find_all(self.root, classes::SUB_LIST),
            "Super lists did not split within {} passes",
            MAX_SPLIT_PASSES
        );
        false
    }

    fn dissolve_group(&mut self, cx: &mut Cx<'_>, group: &ListGroup) -> SuperListsResult<()> {
        cx.dom.remove(group.header)?;
        for member in &group.members {
            if let Some(handle) = self.watchers.remove(member) {
                cx.scheduler.cancel(handle);
            }
            self.strip_member(cx, *member)?;
        }
        Ok(())
    }

    fn strip_member(&mut self, cx: &mut Cx<'_>, list: NodeId) -> SuperListsResult<()> {
        for class in [classes::SUB_LIST, classes::SUB_LIST_FIRST, classes::SUB_LIST_LAST] {
            cx.dom.remove_class(list, class)?;
        }
        cx.dom.set_data(list, classes::DATA_GROUP, None)?;
        cx.dom.set_data(list, classes::DATA_SUB_INDEX, None)?;
        cx.dom.set_min_height(list, None)?;
        cx.dom.set_hidden(list, false)
    }

    fn create_group(&mut self, cx: &mut Cx<'_>, prefix: String, members: Vec<NodeId>) -> SuperListsResult<usize> {
        let first = *members
            .first()
            .ok_or_else(|| SuperListsError::invalid("a super list needs members"))?;
        let parent = cx
            .dom
            .parent(first)
            .ok_or_else(|| SuperListsError::not_found(format!("parent of list {first}")))?;

        let id = GroupId::new();
        let header = cx.dom.create_element(&[classes::GROUP_HEADER]);
        let title = cx.dom.create_element(&[classes::GROUP_TITLE]);
        let badge_node = cx.dom.create_element(&[classes::GROUP_BADGE]);
        let toggle = cx.dom.create_element(&[classes::GROUP_TOGGLE]);
        cx.dom.set_text(title, &prefix)?;
        for child in [title, badge_node, toggle] {
            cx.dom.append_child(header, child)?;
        }
        cx.dom.insert_before(parent, header, Some(first))?;

        let last = members.len() - 1;
        for (index, member) in members.iter().enumerate() {
            cx.dom.add_class(*member, classes::SUB_LIST)?;
            cx.dom.toggle_class(*member, classes::SUB_LIST_FIRST, index == 0)?;
            cx.dom.toggle_class(*member, classes::SUB_LIST_LAST, index == last)?;
            cx.dom.set_data(*member, classes::DATA_GROUP, Some(id.to_string().as_str()))?;
            cx.dom.set_data(*member, classes::DATA_SUB_INDEX, Some(index.to_string().as_str()))?;
        }

        let first_name = query::list_name(cx.dom, &cx.env.selectors, first)?;
        let collapsed = self.view.is_super_list_collapsed(&first_name);
        tracing::debug!(group = %id, prefix = %prefix, members = members.len(), "Super list created");
        self.groups.push(ListGroup {
            id,
            prefix,
            members,
            badge: WipBadge::plain(0),
            collapsed: false,
            header,
            badge_node,
        });
        let index = self.groups.len() - 1;
        self.apply_super_list_collapsed(cx, index, collapsed)?;
        Ok(index)
    }

    pub(super) fn set_super_list_collapsed(
        &mut self,
        cx: &mut Cx<'_>,
        member: NodeId,
        collapsed: bool,
    ) -> SuperListsResult<()> {
        let index = self
            .group_index(member)
            .ok_or_else(|| SuperListsError::invalid(format!("{member} is not part of a super list")))?;
        let first = self.groups[index].members[0];
        let name = query::list_name(cx.dom, &cx.env.selectors, first)?;
        self.view.set_super_list_collapsed(&name, collapsed);
        self.apply_super_list_collapsed(cx, index, collapsed)
    }

    fn apply_super_list_collapsed(&mut self, cx: &mut Cx<'_>, index: usize, collapsed: bool) -> SuperListsResult<()> {
        let group = &mut self.groups[index];
        group.collapsed = collapsed;
        let members = group.members.clone();
        let header = group.header;

        for member in &members {
            cx.dom.set_hidden(*member, collapsed)?;
        }
        cx.dom.toggle_class(header, classes::COLLAPSED, collapsed)?;
        self.refresh_group_badge(cx, index)?;
        if !collapsed {
            self.apply_group_height(cx, index)?;
            for member in members {
                self.watch_height(cx, member);
            }
        }
        Ok(())
    }

    /// Total work cards of all members against the first member's limit.
    /// Every member shows the same total as a plain count. Returns the total.
    pub(super) fn refresh_group_badge(&mut self, cx: &mut Cx<'_>, index: usize) -> SuperListsResult<usize> {
        let env = cx.env;
        let members = self.groups[index].members.clone();
        let mut total = 0;
        for member in &members {
            self.install_list(cx, *member)?;
            total += count_work_cards(env, cx.dom, *member)?;
        }
        for member in &members {
            self.paint_list_badge(cx, *member, Some(WipBadge::plain(total)))?;
        }
        let first_name = query::list_name(cx.dom, &env.selectors, members[0])?;
        let badge = WipBadge {
            count: total,
            limit: ListName::new(&first_name).wip_limit(),
        };

        let group = &mut self.groups[index];
        group.badge = badge;
        cx.dom.set_text(group.badge_node, &badge.to_string())?;
        apply_status(cx.dom, group.header, badge.status(), env.settings.wip_top_bar)?;
        Ok(total)
    }

    /// Gives every visible member the height of the tallest one.
    pub(super) fn apply_group_height(&mut self, cx: &mut Cx<'_>, index: usize) -> SuperListsResult<()> {
        let visible: Vec<NodeId> = self.groups[index]
            .members
            .iter()
            .copied()
            .filter(|member| !cx.dom.is_hidden(*member))
            .collect();
        let Some(tallest) = visible.iter().map(|member| cx.dom.height(*member)).max() else {
            return Ok(());
        };
        for member in visible {
            cx.dom.set_min_height(member, Some(tallest))?;
        }
        Ok(())
    }

    fn watch_height(&mut self, cx: &mut Cx<'_>, list: NodeId) {
        if let Some(handle) = self.watchers.get(&list) {
            if cx.scheduler.is_pending(*handle) {
                return;
            }
        }
        let handle = cx.scheduler.every_frame(FrameTask::WatchHeight {
            list,
            last_height: cx.dom.height(list),
        });
        self.watchers.insert(list, handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconciler::Reconciler;
    use crate::scheduler::FRAME;
    use crate::session::Workspace;
    use superlists_core::Settings;
    use superlists_dom::{BoardFixture, Dom, ListFixture, MemoryDocument, MutationRecord, PageSelectors};
    use superlists_observer::{BoardEvent, EventBus, EventKind, PublishReport};
    use superlists_persistence::ViewStateStore;

    /// A page that refuses to drop one class.
    struct StickyClassDom {
        inner: MemoryDocument,
        sticky: &'static str,
    }

    impl Dom for StickyClassDom {
        fn root(&self) -> NodeId {
            self.inner.root()
        }
        fn location(&self) -> &str {
            self.inner.location()
        }
        fn exists(&self, node: NodeId) -> bool {
            self.inner.exists(node)
        }
        fn is_attached(&self, node: NodeId) -> bool {
            self.inner.is_attached(node)
        }
        fn parent(&self, node: NodeId) -> Option<NodeId> {
            self.inner.parent(node)
        }
        fn children(&self, node: NodeId) -> Vec<NodeId> {
            self.inner.children(node)
        }
        fn has_class(&self, node: NodeId, class: &str) -> bool {
            self.inner.has_class(node, class)
        }
        fn classes(&self, node: NodeId) -> Vec<String> {
            self.inner.classes(node)
        }
        fn text(&self, node: NodeId) -> Option<String> {
            self.inner.text(node)
        }
        fn data(&self, node: NodeId, key: &str) -> Option<String> {
            self.inner.data(node, key)
        }
        fn is_hidden(&self, node: NodeId) -> bool {
            self.inner.is_hidden(node)
        }
        fn height(&self, node: NodeId) -> u32 {
            self.inner.height(node)
        }
        fn min_height(&self, node: NodeId) -> Option<u32> {
            self.inner.min_height(node)
        }
        fn create_element(&mut self, classes: &[&str]) -> NodeId {
            self.inner.create_element(classes)
        }
        fn insert_before(
            &mut self,
            parent: NodeId,
            child: NodeId,
            reference: Option<NodeId>,
        ) -> SuperListsResult<()> {
            self.inner.insert_before(parent, child, reference)
        }
        fn remove(&mut self, node: NodeId) -> SuperListsResult<()> {
            self.inner.remove(node)
        }
        fn add_class(&mut self, node: NodeId, class: &str) -> SuperListsResult<()> {
            self.inner.add_class(node, class)
        }
        fn remove_class(&mut self, node: NodeId, class: &str) -> SuperListsResult<()> {
            if class == self.sticky {
                return Err(SuperListsError::invalid(format!("class {class} cannot be removed")));
            }
            self.inner.remove_class(node, class)
        }
        fn set_text(&mut self, node: NodeId, text: &str) -> SuperListsResult<()> {
            self.inner.set_text(node, text)
        }
        fn set_data(&mut self, node: NodeId, key: &str, value: Option<&str>) -> SuperListsResult<()> {
            self.inner.set_data(node, key, value)
        }
        fn set_hidden(&mut self, node: NodeId, hidden: bool) -> SuperListsResult<()> {
            self.inner.set_hidden(node, hidden)
        }
        fn set_min_height(&mut self, node: NodeId, height: Option<u32>) -> SuperListsResult<()> {
            self.inner.set_min_height(node, height)
        }
        fn write_intent(&self) -> bool {
            self.inner.write_intent()
        }
        fn set_write_intent(&mut self, active: bool) {
            self.inner.set_write_intent(active)
        }
        fn take_records(&mut self) -> Vec<MutationRecord> {
            self.inner.take_records()
        }
    }

    fn delta_board() -> BoardFixture {
        BoardFixture::new("b1")
            .list(ListFixture::new("Alpha").cards("Task", 1))
            .list(ListFixture::new("Delta.Sub1 [5]").cards("Task", 2))
            .list(ListFixture::new("Delta.Sub2").cards("Task", 3))
            .list(ListFixture::new("Delta.Sub3").cards("Task", 1))
            .list(ListFixture::new("Echo").cards("Task", 1))
    }

    fn attach(settings: Settings) -> (MemoryDocument, Reconciler, Vec<NodeId>) {
        let sel = PageSelectors::default();
        let mut doc = MemoryDocument::new("about:blank");
        let built = delta_board().build(&mut doc, &sel).unwrap();
        doc.take_records();
        let mut reconciler = Reconciler::new(settings, sel).unwrap();
        reconciler
            .attach(&mut doc, "b1", ViewStateStore::detached("b1"))
            .unwrap();
        (doc, reconciler, built.lists)
    }

    #[test]
    fn test_related_lists_form_one_group() {
        let (doc, reconciler, lists) = attach(Settings::default());
        let groups = reconciler.groups();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].prefix, "Delta");
        assert_eq!(groups[0].members, lists[1..4].to_vec());
        assert_eq!(groups[0].badge, WipBadge::limited(6, 5));

        for (index, member) in lists[1..4].iter().enumerate() {
            assert!(doc.has_class(*member, classes::SUB_LIST));
            assert_eq!(doc.data(*member, classes::DATA_SUB_INDEX), Some(index.to_string()));
        }
        assert!(doc.has_class(lists[1], classes::SUB_LIST_FIRST));
        assert!(doc.has_class(lists[3], classes::SUB_LIST_LAST));
        assert!(!doc.has_class(lists[0], classes::SUB_LIST));

        let header = doc.find_first(doc.root(), classes::GROUP_HEADER).unwrap();
        assert_eq!(doc.next_sibling(header), Some(lists[1]));
        assert!(doc.has_class(header, classes::WIP_EXCEEDED));
        assert!(!doc.has_class(lists[1], classes::WIP_EXCEEDED));

        // every member shows the group total without a limit
        for member in &lists[1..4] {
            let badge = doc.find_first(*member, classes::WIP_BADGE).unwrap();
            assert_eq!(doc.text(badge).as_deref(), Some("6"));
        }
    }

    #[test]
    fn test_members_share_tallest_height() {
        let (mut doc, mut reconciler, lists) = attach(Settings::default());
        // 40 + 30 * 3
        for member in &lists[1..4] {
            assert_eq!(doc.min_height(*member), Some(130));
        }
        assert_eq!(doc.min_height(lists[0]), None);
        assert_eq!(reconciler.scheduler().frame_count(), 3);

        doc.set_height(lists[2], 200).unwrap();
        reconciler.tick(&mut doc, FRAME);
        assert_eq!(doc.min_height(lists[3]), Some(200));
    }

    #[test]
    fn test_split_all_combined_leaves_no_marks() {
        let (mut doc, mut reconciler, lists) = attach(Settings::default());
        assert!(reconciler.split_all_combined(&mut doc));
        assert!(reconciler.groups().is_empty());
        assert!(doc.find_first(doc.root(), classes::GROUP_HEADER).is_none());
        assert!(doc.find_first(doc.root(), classes::SUB_LIST).is_none());
        assert_eq!(doc.min_height(lists[1]), None);
        assert_eq!(reconciler.scheduler().frame_count(), 0);
    }

    #[test]
    fn test_combining_disabled() {
        let settings = Settings {
            combine_lists: false,
            ..Settings::default()
        };
        let (doc, reconciler, lists) = attach(settings);
        assert!(reconciler.groups().is_empty());
        let badge = doc.find_first(lists[1], classes::WIP_BADGE).unwrap();
        assert_eq!(doc.text(badge).as_deref(), Some("2 / 5"));
    }

    #[test]
    fn test_collapse_super_list_hides_members_and_stops_watchers() {
        let (mut doc, mut reconciler, lists) = attach(Settings::default());
        reconciler
            .set_super_list_collapsed(&mut doc, lists[2], true)
            .unwrap();
        for member in &lists[1..4] {
            assert!(doc.is_hidden(*member));
        }
        assert!(reconciler
            .view_state()
            .unwrap()
            .is_super_list_collapsed("Delta.Sub1 [5]"));

        reconciler.tick(&mut doc, FRAME);
        assert_eq!(reconciler.scheduler().frame_count(), 0);

        reconciler
            .set_super_list_collapsed(&mut doc, lists[1], false)
            .unwrap();
        assert!(!doc.is_hidden(lists[3]));
        assert_eq!(reconciler.scheduler().frame_count(), 3);

        assert!(matches!(
            reconciler.set_super_list_collapsed(&mut doc, lists[0], true),
            Err(SuperListsError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_unsplittable_board_is_reported_and_stays_usable() {
        let sel = PageSelectors::default();
        let mut inner = MemoryDocument::new("about:blank");
        let built = delta_board().build(&mut inner, &sel).unwrap();
        inner.take_records();
        let mut workspace = Workspace {
            dom: StickyClassDom {
                inner,
                sticky: classes::SUB_LIST,
            },
            reconciler: Reconciler::new(Settings::default(), sel).unwrap(),
        };
        workspace
            .reconciler
            .attach(&mut workspace.dom, "b1", ViewStateStore::detached("b1"))
            .unwrap();
        assert_eq!(workspace.reconciler.groups().len(), 1);

        assert!(!workspace.reconciler.split_all_combined(&mut workspace.dom));
        assert!(matches!(
            workspace.reconciler.combine_lists(&mut workspace.dom),
            Err(SuperListsError::Inconsistent(_))
        ));

        let mut bus = EventBus::new();
        bus.subscribe(
            EventKind::ListDropped,
            |event, workspace: &mut Workspace<StickyClassDom>| {
                workspace.reconciler.handle(&mut workspace.dom, event)
            },
        );
        let report = bus.publish(&BoardEvent::ListDropped, &mut workspace);
        assert_eq!(
            report,
            PublishReport {
                delivered: 0,
                failed: 1
            }
        );

        let alpha = built.lists[0];
        workspace
            .reconciler
            .set_list_collapsed(&mut workspace.dom, alpha, true)
            .unwrap();
        assert!(workspace.dom.inner.has_class(alpha, classes::COLLAPSED));
    }
}

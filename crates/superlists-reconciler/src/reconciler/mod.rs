//! Derived board UI: list decorations, super lists, WiP badges and folds.
//!
//! The reconciler is the only writer of the page. Every public entry point
//! that touches the document opens a [`WriteIntent`] so its own writes never
//! come back as observer events.

mod cards;
mod groups;
mod lists;

pub use groups::{GroupId, ListGroup, MAX_SPLIT_PASSES};

use crate::classes;
use crate::commands::{Command, CommandReply};
use crate::scheduler::{DeferredTask, FrameTask, Scheduler, TaskControl, TaskHandle, CARD_FORMAT_DELAY};
use crate::snapshot::{BoardSnapshot, GroupSnapshot, ListSnapshot, SectionSnapshot};
use lists::ListDecor;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use superlists_core::{LogEntry, Loggable, Settings, SuperListsError, SuperListsResult};
use superlists_domain::{BoardViewState, SectionMarker, WipBadge};
use superlists_dom::{query, Dom, DomExt, NodeId, PageSelectors, WriteIntent};
use superlists_observer::BoardEvent;
use superlists_persistence::ViewStateStore;

const MAX_LOGS: usize = 200;

/// Configuration shared by every reconciliation step.
struct Env {
    settings: Settings,
    marker: SectionMarker,
    selectors: PageSelectors,
}

/// What a reconciliation step may touch.
struct Cx<'a> {
    env: &'a Env,
    scheduler: &'a mut Scheduler,
    dom: &'a mut dyn Dom,
}

/// Reported when the page swapped its board root; the host must set the new
/// board up once its view state is loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardSwitch {
    pub new_id: Option<String>,
    pub old_id: Option<String>,
}

/// Derived state of the attached board.
struct Board {
    id: String,
    root: NodeId,
    view: ViewStateStore,
    lists: HashMap<NodeId, ListDecor>,
    groups: Vec<ListGroup>,
    /// Section card -> its title decoration.
    sections: HashMap<NodeId, NodeId>,
    /// Cards hidden by a collapsed section.
    folded: HashSet<NodeId>,
    watchers: HashMap<NodeId, TaskHandle>,
    dragging: bool,
    regroup_pending: bool,
    compact_toggle: Option<NodeId>,
}

pub struct Reconciler {
    env: Env,
    board: Option<Board>,
    scheduler: Scheduler,
    logs: Vec<LogEntry>,
    switch: Option<BoardSwitch>,
}

impl Reconciler {
    pub fn new(settings: Settings, selectors: PageSelectors) -> SuperListsResult<Self> {
        settings.validate()?;
        let marker = SectionMarker::from_settings(&settings)?;
        Ok(Self {
            env: Env {
                settings,
                marker,
                selectors,
            },
            board: None,
            scheduler: Scheduler::new(),
            logs: Vec::new(),
            switch: None,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.env.settings
    }

    pub fn selectors(&self) -> &PageSelectors {
        &self.env.selectors
    }

    pub fn board_id(&self) -> Option<&str> {
        self.board.as_ref().map(|board| board.id.as_str())
    }

    pub fn is_attached(&self) -> bool {
        self.board.is_some()
    }

    pub fn view_state(&self) -> Option<&BoardViewState> {
        self.board.as_ref().map(|board| board.view.state())
    }

    pub fn groups(&self) -> &[ListGroup] {
        self.board.as_ref().map_or(&[], |board| board.groups.as_slice())
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn take_board_switch(&mut self) -> Option<BoardSwitch> {
        self.switch.take()
    }

    /// Decorates the board and restores its view state. A board already
    /// attached is torn down first.
    pub fn attach(
        &mut self,
        dom: &mut dyn Dom,
        board_id: impl Into<String>,
        view: ViewStateStore,
    ) -> SuperListsResult<()> {
        if self.board.is_some() {
            self.detach(dom);
        }
        let root = query::board_root(dom, &self.env.selectors)
            .ok_or_else(|| SuperListsError::not_found("board root"))?;
        self.switch = None;

        let mut board = Board {
            id: board_id.into(),
            root,
            view,
            lists: HashMap::new(),
            groups: Vec::new(),
            sections: HashMap::new(),
            folded: HashSet::new(),
            watchers: HashMap::new(),
            dragging: false,
            regroup_pending: false,
            compact_toggle: None,
        };
        let mut guard = WriteIntent::begin(dom);
        let mut cx = Cx {
            env: &self.env,
            scheduler: &mut self.scheduler,
            dom: &mut *guard,
        };
        let result = board.setup(&mut cx);
        self.board = Some(board);
        result
    }

    /// Strips every decoration, cancels scheduled work and hands back the
    /// board's view state.
    pub fn detach(&mut self, dom: &mut dyn Dom) -> Option<ViewStateStore> {
        let mut board = self.board.take()?;
        let mut guard = WriteIntent::begin(dom);
        let mut cx = Cx {
            env: &self.env,
            scheduler: &mut self.scheduler,
            dom: &mut *guard,
        };
        board.teardown(&mut cx);
        tracing::info!(board = %board.id, "Board detached");
        Some(board.view)
    }

    pub fn handle(&mut self, dom: &mut dyn Dom, event: &BoardEvent) -> SuperListsResult<()> {
        if let BoardEvent::BoardChanged { new_id, old_id } = event {
            tracing::info!(?new_id, ?old_id, "Board changed");
            self.detach(dom);
            self.switch = Some(BoardSwitch {
                new_id: new_id.clone(),
                old_id: old_id.clone(),
            });
            return Ok(());
        }
        if self.switch.is_some() {
            tracing::debug!(?event, "Board switch pending; event dropped");
            return Ok(());
        }
        let Some(board) = self.board.as_mut() else {
            tracing::debug!(?event, "No board attached; event dropped");
            return Ok(());
        };

        let mut guard = WriteIntent::begin(dom);
        let mut cx = Cx {
            env: &self.env,
            scheduler: &mut self.scheduler,
            dom: &mut *guard,
        };
        board.on_event(&mut cx, event)
    }

    /// Advances the host clock: runs due deferred work, then one frame of
    /// every frame task.
    pub fn tick(&mut self, dom: &mut dyn Dom, elapsed: Duration) {
        let due = self.scheduler.advance(elapsed);
        let Some(board) = self.board.as_mut() else {
            self.scheduler.clear();
            return;
        };

        let mut guard = WriteIntent::begin(dom);
        let mut cx = Cx {
            env: &self.env,
            scheduler: &mut self.scheduler,
            dom: &mut *guard,
        };
        for task in due {
            if let Err(e) = board.run_deferred(&mut cx, task) {
                tracing::warn!(?task, "Deferred task failed: {}", e);
            }
        }

        let frames = cx.scheduler.take_frames();
        let mut survivors = Vec::with_capacity(frames.len());
        for (handle, mut task) in frames {
            match board.run_frame(&mut cx, &mut task) {
                TaskControl::Continue => survivors.push((handle, task)),
                TaskControl::Stop => {
                    tracing::debug!(?task, "Frame task stopped");
                    board.watchers.retain(|_, watcher| *watcher != handle);
                }
            }
        }
        cx.scheduler.restore_frames(survivors);
    }

    /// Validates and swaps settings, then redraws every decoration under them.
    pub fn apply_settings(&mut self, dom: &mut dyn Dom, settings: Settings) -> SuperListsResult<()> {
        settings.validate()?;
        let marker = SectionMarker::from_settings(&settings)?;
        let forget = self.env.settings.remember_view_state && !settings.remember_view_state;
        let mut guard = WriteIntent::begin(dom);

        if let Some(board) = self.board.as_mut() {
            let mut cx = Cx {
                env: &self.env,
                scheduler: &mut self.scheduler,
                dom: &mut *guard,
            };
            board.teardown(&mut cx);
        }
        self.env.settings = settings;
        self.env.marker = marker;
        tracing::info!(settings = ?self.env.settings, "Settings applied");

        let Some(board) = self.board.as_mut() else {
            return Ok(());
        };
        board.view.set_remember(self.env.settings.remember_view_state);
        if forget && !board.view.state().is_empty() {
            board.view.clear();
        }
        let mut cx = Cx {
            env: &self.env,
            scheduler: &mut self.scheduler,
            dom: &mut *guard,
        };
        board.setup(&mut cx)
    }

    pub fn execute(&mut self, command: Command) -> CommandReply {
        match command {
            Command::Dump => {
                let view_state = self
                    .board
                    .as_ref()
                    .and_then(|board| serde_json::to_value(board.view.state()).ok())
                    .unwrap_or(Value::Null);
                tracing::info!(board = ?self.board_id(), "View state: {}", view_state);
                CommandReply::Dump {
                    board_id: self.board_id().map(str::to_string),
                    view_state,
                    logs: self.logs.clone(),
                }
            }
            Command::Reload => {
                tracing::info!("Reload requested");
                CommandReply::Reload
            }
            Command::Log(data) => {
                let message = match data {
                    Value::String(text) => text,
                    other => other.to_string(),
                };
                tracing::info!("{}", message);
                self.add_log(message);
                CommandReply::Logged
            }
            Command::Clear => {
                if let Some(board) = self.board.as_mut() {
                    board.view.clear();
                }
                CommandReply::Cleared
            }
            Command::Id => CommandReply::Id {
                board_id: self.board_id().map(str::to_string),
            },
            Command::Unknown(name) => {
                tracing::warn!("Ignoring unknown command '{}'", name);
                CommandReply::Ignored { command: name }
            }
        }
    }

    /// Strips and reapplies every decoration from the current view state.
    pub fn redraw(&mut self, dom: &mut dyn Dom) -> SuperListsResult<()> {
        self.with_board(dom, |board, cx| {
            board.teardown(cx);
            board.setup(cx)
        })
    }

    pub fn set_list_collapsed(&mut self, dom: &mut dyn Dom, list: NodeId, collapsed: bool) -> SuperListsResult<()> {
        self.with_board(dom, |board, cx| board.set_list_collapsed(cx, list, collapsed))
    }

    /// `member` is any list of the super list.
    pub fn set_super_list_collapsed(
        &mut self,
        dom: &mut dyn Dom,
        member: NodeId,
        collapsed: bool,
    ) -> SuperListsResult<()> {
        self.with_board(dom, |board, cx| board.set_super_list_collapsed(cx, member, collapsed))
    }

    /// Returns the new collapsed flag.
    pub fn toggle_section(&mut self, dom: &mut dyn Dom, card: NodeId) -> SuperListsResult<bool> {
        self.with_board(dom, |board, cx| board.toggle_section(cx, card))
    }

    /// Returns whether compact mode is now on.
    pub fn toggle_compact_mode(&mut self, dom: &mut dyn Dom) -> SuperListsResult<bool> {
        self.with_board(dom, |board, cx| board.toggle_compact_mode(cx))
    }

    /// Routes a click on a decoration to its action. Returns `false` when the
    /// node is not one of ours.
    pub fn handle_click(&mut self, dom: &mut dyn Dom, node: NodeId) -> SuperListsResult<bool> {
        self.with_board(dom, |board, cx| board.click(cx, node))
    }

    pub fn show_wip_limit(&mut self, dom: &mut dyn Dom, list: NodeId) -> SuperListsResult<Option<WipBadge>> {
        self.with_board(dom, |board, cx| board.show_wip_limit(cx, list))
    }

    pub fn combine_lists(&mut self, dom: &mut dyn Dom) -> SuperListsResult<()> {
        self.with_board(dom, |board, cx| board.combine_lists(cx))
    }

    /// Full split-then-recombine pass.
    pub fn redraw_combined_lists(&mut self, dom: &mut dyn Dom) -> SuperListsResult<()> {
        self.combine_lists(dom)
    }

    /// Best effort: returns `false` and logs when groups remain after the
    /// pass limit.
    pub fn split_all_combined(&mut self, dom: &mut dyn Dom) -> bool {
        self.with_board(dom, |board, cx| Ok(board.split_all_combined(cx)))
            .unwrap_or(true)
    }

    pub fn snapshot(&self, dom: &dyn Dom) -> Option<BoardSnapshot> {
        self.board.as_ref().map(|board| board.snapshot(&self.env, dom))
    }

    fn with_board<T>(
        &mut self,
        dom: &mut dyn Dom,
        f: impl FnOnce(&mut Board, &mut Cx<'_>) -> SuperListsResult<T>,
    ) -> SuperListsResult<T> {
        let board = self
            .board
            .as_mut()
            .ok_or_else(|| SuperListsError::not_found("no board attached"))?;
        let mut guard = WriteIntent::begin(dom);
        let mut cx = Cx {
            env: &self.env,
            scheduler: &mut self.scheduler,
            dom: &mut *guard,
        };
        f(board, &mut cx)
    }
}

impl Loggable for Reconciler {
    fn add_log(&mut self, message: String) {
        self.logs.push(LogEntry::new(message));
        if self.logs.len() > MAX_LOGS {
            let excess = self.logs.len() - MAX_LOGS;
            self.logs.drain(..excess);
        }
    }

    fn get_logs(&self) -> &[LogEntry] {
        &self.logs
    }
}

impl Board {
    fn setup(&mut self, cx: &mut Cx<'_>) -> SuperListsResult<()> {
        let env = cx.env;
        let sel = &env.selectors;
        let lists = query::lists_by_name(cx.dom, sel, None, &[]);
        for list in &lists {
            self.install_list(cx, *list)?;
            for card in query::cards_in_list(cx.dom, sel, *list, &[], 0)? {
                self.format_card(cx, card)?;
            }
            self.apply_section_folds(cx, *list)?;
        }
        if let Err(e) = self.combine_lists(cx) {
            tracing::error!(board = %self.id, "{}", e);
        }
        self.apply_compact(cx)?;
        self.install_header_toggle(cx)?;
        tracing::info!(
            board = %self.id,
            lists = lists.len(),
            groups = self.groups.len(),
            "Board set up"
        );
        Ok(())
    }

    fn teardown(&mut self, cx: &mut Cx<'_>) {
        let env = cx.env;
        let sel = &env.selectors;
        self.split_all_combined(cx);

        let lists: Vec<(NodeId, ListDecor)> = self.lists.drain().collect();
        for (list, decor) in lists {
            if let Err(e) = lists::strip_list(cx, list, &decor) {
                tracing::warn!(%list, "Failed to strip list decoration: {}", e);
            }
        }

        let sections: Vec<NodeId> = self.sections.keys().copied().collect();
        for card in sections {
            if let Err(e) = self.remove_section(cx, card) {
                tracing::warn!(%card, "Failed to strip section: {}", e);
            }
        }
        for card in cx.dom.find_all(self.root, &sel.card) {
            let result = cards::strip_card(cx, card, self.folded.remove(&card));
            if let Err(e) = result {
                tracing::warn!(%card, "Failed to strip card: {}", e);
            }
        }
        self.folded.clear();

        let compact = [
            cx.dom.remove_class(self.root, classes::COMPACT),
            cx.dom.set_data(self.root, classes::DATA_LIST_WIDTH, None),
        ];
        for result in compact {
            if let Err(e) = result {
                tracing::warn!("Failed to clear compact mode: {}", e);
            }
        }
        if let Some(toggle) = self.compact_toggle.take() {
            if let Err(e) = cx.dom.remove(toggle) {
                tracing::warn!("Failed to remove compact toggle: {}", e);
            }
        }

        cx.scheduler.clear();
        self.watchers.clear();
        self.dragging = false;
        self.regroup_pending = false;
    }

    fn on_event(&mut self, cx: &mut Cx<'_>, event: &BoardEvent) -> SuperListsResult<()> {
        let env = cx.env;
        let sel = &env.selectors;
        match event {
            BoardEvent::BoardChanged { .. } => Ok(()),
            BoardEvent::ListAdded(list) => {
                query::require_list(cx.dom, sel, *list)?;
                self.install_list(cx, *list)?;
                for card in query::cards_in_list(cx.dom, sel, *list, &[], 0)? {
                    self.format_card(cx, card)?;
                }
                self.apply_section_folds(cx, *list)?;
                self.regroup(cx, *list)
            }
            BoardEvent::ListRemoved(list) => {
                query::require_list(cx.dom, sel, *list)?;
                self.forget_list(cx, *list);
                self.regroup(cx, *list)
            }
            BoardEvent::ListModified(list) => {
                query::require_list(cx.dom, sel, *list)?;
                if !cx.dom.is_attached(*list) {
                    return Ok(());
                }
                self.show_wip_limit(cx, *list).map(|_| ())
            }
            BoardEvent::ListTitleModified(list) => {
                query::require_list(cx.dom, sel, *list)?;
                self.show_wip_limit(cx, *list)?;
                self.regroup(cx, *list)
            }
            BoardEvent::ListDragged(list) => {
                tracing::debug!(%list, "Drag started; regrouping deferred");
                self.dragging = true;
                Ok(())
            }
            BoardEvent::ListDropped => {
                self.dragging = false;
                self.regroup_pending = false;
                self.combine_lists(cx)
            }
            BoardEvent::CardAdded(card) => {
                query::require_card(cx.dom, sel, *card)?;
                cx.scheduler.defer(CARD_FORMAT_DELAY, DeferredTask::FormatCard(*card));
                match query::list_of_card(cx.dom, sel, *card) {
                    Some(list) => self.show_wip_limit(cx, list).map(|_| ()),
                    None => Ok(()),
                }
            }
            BoardEvent::CardRemoved { card, list } => self.on_card_removed(cx, *card, *list),
            BoardEvent::CardModified {
                card,
                new_title,
                old_title,
            } => self.on_card_modified(cx, *card, new_title, old_title),
            BoardEvent::BadgesModified(card) => self.format_card(cx, *card),
            BoardEvent::RedrawBoardHeader => self.install_header_toggle(cx),
        }
    }

    /// Regroups now, or after the drop when a drag is in progress.
    fn regroup(&mut self, cx: &mut Cx<'_>, list: NodeId) -> SuperListsResult<()> {
        if self.dragging {
            tracing::debug!(%list, "Regroup deferred until drop");
            self.regroup_pending = true;
            return Ok(());
        }
        self.combine_lists(cx)
    }

    fn run_deferred(&mut self, cx: &mut Cx<'_>, task: DeferredTask) -> SuperListsResult<()> {
        match task {
            DeferredTask::FormatCard(card) => {
                if !cx.dom.is_attached(card) {
                    return Ok(());
                }
                self.format_card(cx, card)?;
                let Some(list) = query::list_of_card(cx.dom, &cx.env.selectors, card) else {
                    return Ok(());
                };
                self.apply_section_folds(cx, list)?;
                self.show_wip_limit(cx, list).map(|_| ())
            }
        }
    }

    fn run_frame(&mut self, cx: &mut Cx<'_>, task: &mut FrameTask) -> TaskControl {
        match task {
            FrameTask::WatchHeight { list, last_height } => {
                let list = *list;
                if !cx.dom.is_attached(list) || cx.dom.is_hidden(list) {
                    return TaskControl::Stop;
                }
                let Some(index) = self.group_index(list) else {
                    return TaskControl::Stop;
                };
                let height = cx.dom.height(list);
                if height != *last_height {
                    *last_height = height;
                    if let Err(e) = self.apply_group_height(cx, index) {
                        tracing::warn!(%list, "Failed to apply group height: {}", e);
                    }
                }
                TaskControl::Continue
            }
        }
    }

    fn click(&mut self, cx: &mut Cx<'_>, node: NodeId) -> SuperListsResult<bool> {
        let env = cx.env;
        let sel = &env.selectors;
        if !cx.dom.exists(node) {
            return Err(SuperListsError::invalid(format!("unknown node {node}")));
        }
        if cx.dom.closest(node, classes::COMPACT_TOGGLE).is_some() {
            self.toggle_compact_mode(cx)?;
            return Ok(true);
        }
        if let Some(header) = cx.dom.closest(node, classes::GROUP_HEADER) {
            let group = self
                .groups
                .iter()
                .find(|group| group.header == header)
                .ok_or_else(|| SuperListsError::not_found(format!("super list for {header}")))?;
            let (first, collapsed) = (group.members[0], !group.collapsed);
            self.set_super_list_collapsed(cx, first, collapsed)?;
            return Ok(true);
        }
        let list_control = cx.dom.closest(node, classes::LIST_TOGGLE).is_some()
            || cx.dom.closest(node, classes::LIST_PLACEHOLDER).is_some();
        if list_control {
            let list = cx
                .dom
                .closest(node, &sel.list_wrapper)
                .ok_or_else(|| SuperListsError::not_found(format!("list of {node}")))?;
            let collapsed = !self.lists.get(&list).is_some_and(|decor| decor.collapsed);
            self.set_list_collapsed(cx, list, collapsed)?;
            return Ok(true);
        }
        if cx.dom.closest(node, classes::SECTION_TITLE).is_some() {
            let card = cx
                .dom
                .closest(node, &sel.card)
                .ok_or_else(|| SuperListsError::not_found(format!("card of {node}")))?;
            self.toggle_section(cx, card)?;
            return Ok(true);
        }
        Ok(false)
    }

    fn apply_compact(&mut self, cx: &mut Cx<'_>) -> SuperListsResult<()> {
        let on = self.view.compact_mode();
        cx.dom.toggle_class(self.root, classes::COMPACT, on)?;
        let width = on.then(|| cx.env.settings.compact_list_width.to_string());
        cx.dom.set_data(self.root, classes::DATA_LIST_WIDTH, width.as_deref())?;
        if let Some(toggle) = self.compact_toggle {
            cx.dom.toggle_class(toggle, classes::COMPACT, on)?;
        }
        Ok(())
    }

    fn install_header_toggle(&mut self, cx: &mut Cx<'_>) -> SuperListsResult<()> {
        let Some(header) = query::board_header(cx.dom, &cx.env.selectors) else {
            return Ok(());
        };
        if let Some(toggle) = self.compact_toggle {
            if cx.dom.parent(toggle) == Some(header) && cx.dom.is_attached(toggle) {
                return Ok(());
            }
        }
        let toggle = cx.dom.create_element(&[classes::COMPACT_TOGGLE]);
        cx.dom.append_child(header, toggle)?;
        self.compact_toggle = Some(toggle);
        cx.dom.toggle_class(toggle, classes::COMPACT, self.view.compact_mode())
    }

    fn toggle_compact_mode(&mut self, cx: &mut Cx<'_>) -> SuperListsResult<bool> {
        let on = !self.view.compact_mode();
        self.view.set_compact_mode(on);
        self.apply_compact(cx)?;
        tracing::debug!(board = %self.id, on, "Compact mode toggled");
        Ok(on)
    }

    fn snapshot(&self, env: &Env, dom: &dyn Dom) -> BoardSnapshot {
        let sel = &env.selectors;
        let lists = query::lists_by_name(dom, sel, None, &[])
            .into_iter()
            .map(|list| {
                let decor = self.lists.get(&list);
                let group = self.group_index(list).map(|index| &self.groups[index]);
                let cards = query::cards_in_list(dom, sel, list, &[], 0).unwrap_or_default();
                let sections = cards
                    .iter()
                    .filter(|card| self.sections.contains_key(*card))
                    .map(|card| SectionSnapshot {
                        title: query::card_title(dom, sel, *card)
                            .map(|title| env.marker.stripped_title(&title))
                            .unwrap_or_default(),
                        collapsed: dom.has_class(*card, classes::SECTION_COLLAPSED),
                    })
                    .collect();
                let wip = decor.and_then(|decor| decor.wip);
                ListSnapshot {
                    name: query::list_name(dom, sel, list).unwrap_or_default(),
                    badge: wip.map(|badge| badge.to_string()),
                    status: wip.map(|badge| badge.status()).unwrap_or_default(),
                    collapsed: decor.is_some_and(|decor| decor.collapsed),
                    group: group.map(|group| group.prefix.clone()),
                    sub_index: group.and_then(|group| group.members.iter().position(|m| *m == list)),
                    work_cards: lists::count_work_cards(env, dom, list).unwrap_or(0),
                    folded_cards: cards.iter().filter(|card| self.folded.contains(*card)).count(),
                    min_height: dom.min_height(list),
                    sections,
                }
            })
            .collect();

        let groups = self
            .groups
            .iter()
            .map(|group| GroupSnapshot {
                prefix: group.prefix.clone(),
                members: group
                    .members
                    .iter()
                    .map(|member| query::list_name(dom, sel, *member).unwrap_or_default())
                    .collect(),
                badge: group.badge.to_string(),
                status: group.badge.status(),
                collapsed: group.collapsed,
            })
            .collect();

        BoardSnapshot {
            board_id: self.id.clone(),
            compact_mode: self.view.compact_mode(),
            lists,
            groups,
        }
    }
}

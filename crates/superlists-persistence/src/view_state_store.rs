use crate::traits::{KeyValueStore, StoreMap};
use crate::writer::PersistHandle;
use superlists_domain::BoardViewState;

/// The view state of one board, held in memory and mirrored to the store.
///
/// Reads never touch the store. Every user-intentional change is written
/// through the [`PersistHandle`] unless remembering is disabled.
#[derive(Debug, Clone)]
pub struct ViewStateStore {
    board_id: String,
    state: BoardViewState,
    remember: bool,
    writer: Option<PersistHandle>,
}

impl ViewStateStore {
    /// A store that keeps state in memory only.
    pub fn detached(board_id: impl Into<String>) -> Self {
        Self {
            board_id: board_id.into(),
            state: BoardViewState::default(),
            remember: false,
            writer: None,
        }
    }

    /// Restores the board's entry. With `remember` off the stored entry is
    /// removed and the board starts from defaults.
    pub async fn load(
        store: &dyn KeyValueStore,
        board_id: impl Into<String>,
        remember: bool,
        writer: Option<PersistHandle>,
    ) -> Self {
        let board_id = board_id.into();
        let mut this = Self {
            board_id,
            state: BoardViewState::default(),
            remember,
            writer,
        };

        if !remember {
            if let Some(writer) = &this.writer {
                writer.remove(this.board_id.clone());
            }
            tracing::info!(board = %this.board_id, "View state not remembered; stored entry removed");
            return this;
        }

        match store.get(std::slice::from_ref(&this.board_id)).await {
            Ok(mut entries) => {
                if let Some(value) = entries.remove(&this.board_id) {
                    match serde_json::from_value::<BoardViewState>(value) {
                        Ok(state) => this.state = state,
                        Err(e) => tracing::warn!(
                            board = %this.board_id,
                            "Ignoring unreadable view state: {}",
                            e
                        ),
                    }
                }
            }
            Err(e) => tracing::warn!(board = %this.board_id, "Failed to load view state: {}", e),
        }
        tracing::debug!(board = %this.board_id, lists = this.state.lists.len(), "View state loaded");
        this
    }

    pub fn board_id(&self) -> &str {
        &self.board_id
    }

    pub fn state(&self) -> &BoardViewState {
        &self.state
    }

    pub fn remembers(&self) -> bool {
        self.remember
    }

    pub fn is_list_collapsed(&self, list: &str) -> bool {
        self.state.is_list_collapsed(list)
    }

    pub fn is_super_list_collapsed(&self, first_member: &str) -> bool {
        self.state.is_super_list_collapsed(first_member)
    }

    pub fn is_section_collapsed(&self, list: &str, section: &str) -> bool {
        self.state.is_section_collapsed(list, section)
    }

    pub fn compact_mode(&self) -> bool {
        self.state.board.compact_mode
    }

    pub fn set_list_collapsed(&mut self, list: &str, collapsed: bool) {
        self.state.list_mut(list).collapsed = collapsed;
        self.persist();
    }

    pub fn set_super_list_collapsed(&mut self, first_member: &str, collapsed: bool) {
        self.state.list_mut(first_member).super_list_collapsed = collapsed;
        self.persist();
    }

    pub fn set_section_collapsed(&mut self, list: &str, section: &str, collapsed: bool) {
        self.state
            .list_mut(list)
            .sections
            .insert(section.to_string(), collapsed);
        self.persist();
    }

    pub fn set_compact_mode(&mut self, compact: bool) {
        self.state.board.compact_mode = compact;
        self.persist();
    }

    /// Forgets everything about this board, in memory and in the store.
    pub fn clear(&mut self) {
        self.state = BoardViewState::default();
        if let Some(writer) = &self.writer {
            writer.remove(self.board_id.clone());
        }
        tracing::info!(board = %self.board_id, "View state cleared");
    }

    /// Turning remembering off forgets the board's view state, in memory and
    /// in the store; turning it on writes the current state out.
    pub fn set_remember(&mut self, remember: bool) {
        if self.remember == remember {
            return;
        }
        self.remember = remember;
        if remember {
            self.persist();
        } else {
            self.clear();
        }
    }

    /// Carries a section's fold over to its new title.
    pub fn rename_section(&mut self, list: &str, from: &str, to: &str) {
        if from == to {
            return;
        }
        let sections = &mut self.state.list_mut(list).sections;
        let Some(collapsed) = sections.remove(from) else {
            return;
        };
        sections.insert(to.to_string(), collapsed);
        self.persist();
    }

    fn persist(&mut self) {
        self.state.prune();
        if !self.remember {
            return;
        }
        let Some(writer) = &self.writer else {
            return;
        };
        if self.state.is_empty() {
            writer.remove(self.board_id.clone());
            return;
        }
        match serde_json::to_value(&self.state) {
            Ok(value) => {
                let mut entries = StoreMap::new();
                entries.insert(self.board_id.clone(), value);
                writer.set(entries);
            }
            Err(e) => tracing::warn!(board = %self.board_id, "Failed to encode view state: {}", e),
        }
    }
}

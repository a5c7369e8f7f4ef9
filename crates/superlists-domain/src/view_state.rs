use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reserved pseudo-list name holding board-wide preferences.
///
/// Must match the `rename` on [`BoardViewState::board`].
pub const BOARD_SETTINGS_KEY: &str = "__superlists_board__";

/// Persisted fold state of one list, keyed by list name in [`BoardViewState`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListViewState {
    #[serde(default)]
    pub collapsed: bool,
    /// Only meaningful on the first member of a super list.
    #[serde(default, skip_serializing_if = "is_false")]
    pub super_list_collapsed: bool,
    /// Section stripped title -> collapsed.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sections: BTreeMap<String, bool>,
}

impl ListViewState {
    pub fn is_default(&self) -> bool {
        !self.collapsed && !self.super_list_collapsed && self.sections.values().all(|c| !c)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardPrefs {
    #[serde(default)]
    pub compact_mode: bool,
}

impl BoardPrefs {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Everything remembered about one board's view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardViewState {
    #[serde(
        rename = "__superlists_board__",
        default,
        skip_serializing_if = "BoardPrefs::is_default"
    )]
    pub board: BoardPrefs,
    #[serde(flatten)]
    pub lists: BTreeMap<String, ListViewState>,
}

impl BoardViewState {
    pub fn list(&self, name: &str) -> Option<&ListViewState> {
        self.lists.get(name)
    }

    pub fn list_mut(&mut self, name: &str) -> &mut ListViewState {
        self.lists.entry(name.to_string()).or_default()
    }

    pub fn is_list_collapsed(&self, name: &str) -> bool {
        self.list(name).is_some_and(|list| list.collapsed)
    }

    pub fn is_super_list_collapsed(&self, name: &str) -> bool {
        self.list(name).is_some_and(|list| list.super_list_collapsed)
    }

    pub fn is_section_collapsed(&self, list: &str, section: &str) -> bool {
        self.list(list)
            .and_then(|list| list.sections.get(section))
            .copied()
            .unwrap_or(false)
    }

    /// Drops entries that carry nothing but defaults.
    pub fn prune(&mut self) {
        for list in self.lists.values_mut() {
            list.sections.retain(|_, collapsed| *collapsed);
        }
        self.lists.retain(|_, list| !list.is_default());
    }

    pub fn is_empty(&self) -> bool {
        self.board.is_default() && self.lists.values().all(ListViewState::is_default)
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

use serde::{Deserialize, Serialize};
use superlists_domain::WipStatus;

/// Read-only picture of the derived UI, for diagnostics and tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSnapshot {
    pub board_id: String,
    pub compact_mode: bool,
    pub lists: Vec<ListSnapshot>,
    pub groups: Vec<GroupSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSnapshot {
    pub name: String,
    pub badge: Option<String>,
    pub status: WipStatus,
    pub collapsed: bool,
    /// Prefix of the super list this list belongs to.
    pub group: Option<String>,
    pub sub_index: Option<usize>,
    pub work_cards: usize,
    /// Cards hidden under a collapsed section.
    pub folded_cards: usize,
    pub min_height: Option<u32>,
    pub sections: Vec<SectionSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionSnapshot {
    pub title: String,
    pub collapsed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSnapshot {
    pub prefix: String,
    pub members: Vec<String>,
    pub badge: String,
    pub status: WipStatus,
    pub collapsed: bool,
}

impl BoardSnapshot {
    pub fn list(&self, name: &str) -> Option<&ListSnapshot> {
        self.lists.iter().find(|list| list.name == name)
    }

    pub fn group(&self, prefix: &str) -> Option<&GroupSnapshot> {
        self.groups.iter().find(|group| group.prefix == prefix)
    }
}

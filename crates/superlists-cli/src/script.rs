//! Steps a simulation script replays against the page.
//!
//! A script is a JSON array; each element names one step:
//!
//! ```json
//! [
//!   { "edit": { "op": "rename_list", "name": "Delta.Sub2", "to": "Zulu" } },
//!   { "click": { "target": "list_toggle", "list": "Alpha" } },
//!   { "tick": 300 },
//!   { "command": "dump" },
//!   { "settings": { "alwaysCount": true } }
//! ]
//! ```

use anyhow::anyhow;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use superlists_core::Settings;
use superlists_dom::fixture::{find_card, find_list};
use superlists_dom::{Dom, DomExt, NodeId, PageEdit, PageSelectors};
use superlists_reconciler::classes;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// A change made by the page itself.
    Edit(PageEdit),
    Click(ClickTarget),
    /// Milliseconds to advance the frame and delay clocks by.
    Tick(u64),
    /// A message for the command channel, as a string or `{command, data}`.
    Command(Value),
    Settings(Settings),
}

/// A control the reconciler installed, addressed by what the user sees.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "target", rename_all = "snake_case")]
pub enum ClickTarget {
    ListToggle { list: String },
    Placeholder { list: String },
    GroupHeader { prefix: String },
    Section { title: String },
    CompactToggle,
}

impl ClickTarget {
    pub fn resolve(&self, dom: &dyn Dom, sel: &PageSelectors) -> anyhow::Result<NodeId> {
        let node = match self {
            ClickTarget::ListToggle { list } => {
                let list = find_list(dom, sel, list)?;
                dom.find_first(list, classes::LIST_TOGGLE)
            }
            ClickTarget::Placeholder { list } => {
                let list = find_list(dom, sel, list)?;
                dom.find_first(list, classes::LIST_PLACEHOLDER)
            }
            ClickTarget::GroupHeader { prefix } => dom
                .find_all(dom.root(), classes::GROUP_HEADER)
                .into_iter()
                .find(|header| {
                    dom.find_first(*header, classes::GROUP_TITLE)
                        .and_then(|title| dom.text(title))
                        .is_some_and(|text| &text == prefix)
                }),
            ClickTarget::Section { title } => {
                let card = find_card(dom, sel, title)?;
                dom.find_first(card, classes::SECTION_TITLE)
            }
            ClickTarget::CompactToggle => dom.find_first(dom.root(), classes::COMPACT_TOGGLE),
        };
        node.ok_or_else(|| anyhow!("Nothing to click for {:?}", self))
    }
}

pub fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> anyhow::Result<T> {
    let data = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("Failed to read file {}: {}", path.display(), e))?;
    serde_json::from_str(&data).map_err(|e| anyhow!("Invalid JSON in {}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_steps() {
        let steps: Vec<Step> = serde_json::from_value(json!([
            { "edit": { "op": "remove_list", "name": "Echo" } },
            { "click": { "target": "group_header", "prefix": "Delta" } },
            { "click": { "target": "compact_toggle" } },
            { "tick": 16 },
            { "command": { "command": "log", "data": "hello" } },
            { "settings": { "alwaysCount": true } }
        ]))
        .unwrap();

        assert!(matches!(&steps[0], Step::Edit(PageEdit::RemoveList { name }) if name == "Echo"));
        assert!(matches!(&steps[1], Step::Click(ClickTarget::GroupHeader { prefix }) if prefix == "Delta"));
        assert!(matches!(steps[2], Step::Click(ClickTarget::CompactToggle)));
        assert!(matches!(steps[3], Step::Tick(16)));
        assert!(matches!(&steps[4], Step::Command(message) if message["command"] == "log"));
        match &steps[5] {
            Step::Settings(settings) => {
                assert!(settings.always_count);
                assert_eq!(settings.section_repeat, 3);
            }
            other => panic!("unexpected step {:?}", other),
        }
    }

    #[test]
    fn test_unknown_step_is_rejected() {
        let result: Result<Vec<Step>, _> = serde_json::from_value(json!([{ "scroll": 3 }]));
        assert!(result.is_err());
    }
}

use serde::{Deserialize, Serialize};

/// Class names of the third-party board page.
///
/// Only this struct knows how the page marks its structural roles; query and
/// reconciliation code go through it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSelectors {
    pub board: String,
    pub board_header: String,
    pub list_wrapper: String,
    pub list_header: String,
    pub list_title: String,
    pub list_cards: String,
    pub card: String,
    pub card_title: String,
    pub card_label: String,
    pub badges: String,
    pub badge: String,
    /// Added to a list wrapper while the page drags it.
    pub dragging: String,
}

impl Default for PageSelectors {
    fn default() -> Self {
        Self {
            board: "board-canvas".to_string(),
            board_header: "board-header".to_string(),
            list_wrapper: "list-wrapper".to_string(),
            list_header: "list-header".to_string(),
            list_title: "list-header-name".to_string(),
            list_cards: "list-cards".to_string(),
            card: "list-card".to_string(),
            card_title: "list-card-title".to_string(),
            card_label: "card-label".to_string(),
            badges: "badges".to_string(),
            badge: "badge".to_string(),
            dragging: "ui-sortable-helper".to_string(),
        }
    }
}

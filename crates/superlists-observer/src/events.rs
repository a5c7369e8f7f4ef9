use serde::{Deserialize, Serialize};
use std::fmt;
use superlists_dom::NodeId;

/// A semantic change on the board page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardEvent {
    /// The board root was replaced, usually by navigating to another board.
    BoardChanged {
        new_id: Option<String>,
        old_id: Option<String>,
    },
    ListAdded(NodeId),
    ListRemoved(NodeId),
    ListModified(NodeId),
    ListTitleModified(NodeId),
    ListDragged(NodeId),
    ListDropped,
    CardAdded(NodeId),
    CardRemoved {
        card: NodeId,
        /// The list the card was removed from, when still on the page.
        list: Option<NodeId>,
    },
    CardModified {
        card: NodeId,
        new_title: String,
        old_title: String,
    },
    BadgesModified(NodeId),
    RedrawBoardHeader,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    BoardChanged,
    ListAdded,
    ListRemoved,
    ListModified,
    ListTitleModified,
    ListDragged,
    ListDropped,
    CardAdded,
    CardRemoved,
    CardModified,
    BadgesModified,
    RedrawBoardHeader,
}

impl EventKind {
    pub const ALL: [EventKind; 12] = [
        EventKind::BoardChanged,
        EventKind::ListAdded,
        EventKind::ListRemoved,
        EventKind::ListModified,
        EventKind::ListTitleModified,
        EventKind::ListDragged,
        EventKind::ListDropped,
        EventKind::CardAdded,
        EventKind::CardRemoved,
        EventKind::CardModified,
        EventKind::BadgesModified,
        EventKind::RedrawBoardHeader,
    ];
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::BoardChanged => "boardChanged",
            EventKind::ListAdded => "listAdded",
            EventKind::ListRemoved => "listRemoved",
            EventKind::ListModified => "listModified",
            EventKind::ListTitleModified => "listTitleModified",
            EventKind::ListDragged => "listDragged",
            EventKind::ListDropped => "listDropped",
            EventKind::CardAdded => "cardAdded",
            EventKind::CardRemoved => "cardRemoved",
            EventKind::CardModified => "cardModified",
            EventKind::BadgesModified => "badgesModified",
            EventKind::RedrawBoardHeader => "redrawBoardHeader",
        };
        f.write_str(name)
    }
}

impl BoardEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            BoardEvent::BoardChanged { .. } => EventKind::BoardChanged,
            BoardEvent::ListAdded(_) => EventKind::ListAdded,
            BoardEvent::ListRemoved(_) => EventKind::ListRemoved,
            BoardEvent::ListModified(_) => EventKind::ListModified,
            BoardEvent::ListTitleModified(_) => EventKind::ListTitleModified,
            BoardEvent::ListDragged(_) => EventKind::ListDragged,
            BoardEvent::ListDropped => EventKind::ListDropped,
            BoardEvent::CardAdded(_) => EventKind::CardAdded,
            BoardEvent::CardRemoved { .. } => EventKind::CardRemoved,
            BoardEvent::CardModified { .. } => EventKind::CardModified,
            BoardEvent::BadgesModified(_) => EventKind::BadgesModified,
            BoardEvent::RedrawBoardHeader => EventKind::RedrawBoardHeader,
        }
    }
}

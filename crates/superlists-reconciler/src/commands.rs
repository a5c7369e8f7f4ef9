//! Diagnostic commands accepted from the extension's other pages.

use serde::Serialize;
use serde_json::Value;
use superlists_core::LogEntry;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Report the board's view state and the operator log.
    Dump,
    /// Tear the board down and set it up again from the store.
    Reload,
    Log(Value),
    /// Erase this board's view state.
    Clear,
    Id,
    Unknown(String),
}

impl Command {
    /// Accepts a bare name (`"dump"`) or `{"command": "log", "data": ...}`.
    pub fn from_message(message: &Value) -> Self {
        match message {
            Value::String(name) => Self::named(name, Value::Null),
            Value::Object(fields) => match fields.get("command").and_then(Value::as_str) {
                Some(name) => Self::named(name, fields.get("data").cloned().unwrap_or(Value::Null)),
                None => Self::Unknown(message.to_string()),
            },
            other => Self::Unknown(other.to_string()),
        }
    }

    fn named(name: &str, data: Value) -> Self {
        match name {
            "dump" => Self::Dump,
            "reload" => Self::Reload,
            "log" => Self::Log(data),
            "clear" => Self::Clear,
            "id" => Self::Id,
            other => Self::Unknown(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "reply", rename_all = "camelCase")]
pub enum CommandReply {
    Dump {
        #[serde(rename = "boardId")]
        board_id: Option<String>,
        #[serde(rename = "viewState")]
        view_state: Value,
        logs: Vec<LogEntry>,
    },
    Reload,
    Logged,
    Cleared,
    Id {
        #[serde(rename = "boardId")]
        board_id: Option<String>,
    },
    Ignored {
        command: String,
    },
}

use crate::cli::BoardStoreArgs;
use crate::output;
use serde::Serialize;
use serde_json::Value;
use superlists_persistence::{JsonFileStore, KeyValueStore};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredViewState {
    pub board_id: String,
    pub view_state: Option<Value>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearResult {
    pub board_id: String,
    pub removed: bool,
}

pub async fn handle_view_state(args: BoardStoreArgs) -> anyhow::Result<()> {
    let store = JsonFileStore::new(&args.store);
    let mut entries = store.get(std::slice::from_ref(&args.board)).await?;
    output::output_success(StoredViewState {
        view_state: entries.remove(&args.board),
        board_id: args.board,
    })
}

pub async fn handle_clear(args: BoardStoreArgs) -> anyhow::Result<()> {
    let store = JsonFileStore::new(&args.store);
    let removed = !store
        .get(std::slice::from_ref(&args.board))
        .await?
        .is_empty();
    if removed {
        store.remove(&args.board).await?;
        tracing::info!(board = %args.board, "Removed stored view state");
    }
    output::output_success(ClearResult {
        board_id: args.board,
        removed,
    })
}

use crate::cli::SimulateArgs;
use crate::output;
use crate::script::{read_json, Step};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use superlists_core::Settings;
use superlists_dom::{BoardFixture, Dom, MemoryDocument, PageSelectors};
use superlists_persistence::{JsonFileStore, KeyValueStore, MemoryStore};
use superlists_reconciler::{BoardSnapshot, CommandReply, RetryPolicy, Session};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationReport {
    pub snapshot: Option<BoardSnapshot>,
    pub replies: Vec<CommandReply>,
    pub events: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persist_error: Option<String>,
}

pub async fn handle(args: SimulateArgs) -> anyhow::Result<()> {
    let page: BoardFixture = read_json(&args.page)?;
    let steps: Vec<Step> = match &args.script {
        Some(path) => read_json(path)?,
        None => Vec::new(),
    };
    let defaults = match &args.settings {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load(),
    };
    let store: Arc<dyn KeyValueStore> = match &args.store {
        Some(path) => Arc::new(JsonFileStore::new(path)),
        None => Arc::new(MemoryStore::new()),
    };

    let sel = PageSelectors::default();
    let mut doc = MemoryDocument::new(page.location());
    page.build(&mut doc, &sel)?;
    doc.take_records();

    let mut session = Session::start(doc, store, &defaults, sel.clone(), RetryPolicy::default()).await?;
    let mut replies = Vec::new();
    let mut events = 0;
    for (index, step) in steps.into_iter().enumerate() {
        tracing::debug!(index, ?step, "Running step");
        match step {
            Step::Edit(edit) => {
                edit.apply(session.dom_mut(), &sel)?;
            }
            Step::Click(target) => {
                let node = target.resolve(session.dom(), &sel)?;
                if !session.click(node)? {
                    tracing::warn!(?target, "Click was not handled");
                }
            }
            Step::Tick(millis) => session.tick(Duration::from_millis(millis)),
            Step::Command(message) => replies.push(session.execute(&message).await),
            Step::Settings(settings) => session.apply_settings(settings)?,
        }
        events += session.pump().await?;
    }

    session.flush().await;
    let report = SimulationReport {
        snapshot: session.snapshot(),
        replies,
        events,
        persist_error: session.persist_error(),
    };
    session.shutdown().await;
    output::output_success(report)
}

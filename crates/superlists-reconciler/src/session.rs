//! Wires the page, observer, bus, reconciler and store into one running
//! board session.

use crate::bootstrap::{wait_for_board_root, RetryPolicy};
use crate::commands::{Command, CommandReply};
use crate::reconciler::Reconciler;
use crate::scheduler::FRAME;
use crate::snapshot::BoardSnapshot;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use superlists_core::{Settings, SuperListsError, SuperListsResult};
use superlists_dom::{query, Dom, NodeId, PageSelectors};
use superlists_observer::{ChangeObserver, EventBus, EventKind};
use superlists_persistence::{load_settings, spawn_writer, KeyValueStore, PersistHandle, ViewStateStore};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Classification rounds per pump before giving up on a page that keeps
/// changing.
const MAX_PUMP_ROUNDS: usize = 8;

/// The context handed to every bus listener.
pub struct Workspace<D> {
    pub dom: D,
    pub reconciler: Reconciler,
}

/// A change to the page made from outside the session.
pub type PageChange<D> = Box<dyn FnOnce(&mut D) -> SuperListsResult<()> + Send>;

pub enum Inbound<D> {
    Command {
        message: Value,
        reply: oneshot::Sender<CommandReply>,
    },
    Click {
        node: NodeId,
        reply: oneshot::Sender<SuperListsResult<bool>>,
    },
    Settings(Settings),
    Page(PageChange<D>),
    Shutdown,
}

pub struct Session<D> {
    workspace: Workspace<D>,
    observer: ChangeObserver,
    bus: EventBus<Workspace<D>>,
    store: Arc<dyn KeyValueStore>,
    writer: PersistHandle,
    writer_task: JoinHandle<()>,
    retry: RetryPolicy,
}

impl<D: Dom + 'static> Session<D> {
    /// Loads settings, starts the store writer and sets up the board when
    /// one is on the page. A missing board is logged; the session keeps
    /// observing and sets it up once it appears.
    pub async fn start(
        dom: D,
        store: Arc<dyn KeyValueStore>,
        defaults: &Settings,
        selectors: PageSelectors,
        retry: RetryPolicy,
    ) -> SuperListsResult<Self> {
        let settings = load_settings(store.as_ref(), defaults).await;
        let reconciler = Reconciler::new(settings, selectors.clone())?;
        let (writer, writer_task) = spawn_writer(Arc::clone(&store));

        let mut bus = EventBus::new();
        for kind in EventKind::ALL {
            bus.subscribe(kind, |event, workspace: &mut Workspace<D>| {
                workspace.reconciler.handle(&mut workspace.dom, event)
            });
        }

        let mut session = Self {
            workspace: Workspace { dom, reconciler },
            observer: ChangeObserver::new(selectors),
            bus,
            store,
            writer,
            writer_task,
            retry,
        };
        if let Err(e) = session.setup_board().await {
            tracing::error!("Board setup failed: {}", e);
            session.observer.observe(&mut session.workspace.dom);
        }
        Ok(session)
    }

    pub fn dom(&self) -> &D {
        &self.workspace.dom
    }

    pub fn dom_mut(&mut self) -> &mut D {
        &mut self.workspace.dom
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.workspace.reconciler
    }

    pub fn observer(&self) -> &ChangeObserver {
        &self.observer
    }

    pub fn is_attached(&self) -> bool {
        self.workspace.reconciler.is_attached()
    }

    pub fn snapshot(&self) -> Option<BoardSnapshot> {
        self.workspace.reconciler.snapshot(&self.workspace.dom)
    }

    /// Last failed store write, if any.
    pub fn persist_error(&self) -> Option<String> {
        self.writer.last_error()
    }

    async fn setup_board(&mut self) -> SuperListsResult<()> {
        self.writer.flush().await;
        let selectors = self.workspace.reconciler.selectors().clone();
        wait_for_board_root(&self.workspace.dom, &selectors, &self.retry).await?;
        let board_id = query::board_id(&self.workspace.dom)
            .ok_or_else(|| SuperListsError::not_found("board id in page location"))?;

        let remember = self.workspace.reconciler.settings().remember_view_state;
        let view = ViewStateStore::load(
            self.store.as_ref(),
            board_id.clone(),
            remember,
            Some(self.writer.clone()),
        )
        .await;
        self.workspace
            .reconciler
            .attach(&mut self.workspace.dom, board_id, view)?;
        self.observer.observe(&mut self.workspace.dom);
        Ok(())
    }

    /// Classifies pending page records and dispatches the resulting events.
    /// Returns how many events were dispatched.
    pub async fn pump(&mut self) -> SuperListsResult<usize> {
        let mut dispatched = 0;
        for _ in 0..MAX_PUMP_ROUNDS {
            let records = self.workspace.dom.take_records();
            if records.is_empty() {
                return Ok(dispatched);
            }
            let events = self.observer.classify(&self.workspace.dom, &records);
            for event in &events {
                let report = self.bus.publish(event, &mut self.workspace);
                if report.failed > 0 {
                    tracing::warn!(?event, failed = report.failed, "Event not fully handled");
                }
                dispatched += 1;
            }
            if let Some(switch) = self.workspace.reconciler.take_board_switch() {
                tracing::info!(new = ?switch.new_id, old = ?switch.old_id, "Setting up new board");
                self.setup_board().await?;
            }
        }
        tracing::warn!(rounds = MAX_PUMP_ROUNDS, "Page still changing after pump limit");
        Ok(dispatched)
    }

    pub fn tick(&mut self, elapsed: Duration) {
        self.workspace
            .reconciler
            .tick(&mut self.workspace.dom, elapsed);
    }

    pub async fn execute(&mut self, message: &Value) -> CommandReply {
        let reply = self
            .workspace
            .reconciler
            .execute(Command::from_message(message));
        match reply {
            CommandReply::Reload => {
                if let Err(e) = self.reload().await {
                    tracing::error!("Reload failed: {}", e);
                }
            }
            CommandReply::Cleared => {
                if let Err(e) = self.workspace.reconciler.redraw(&mut self.workspace.dom) {
                    tracing::error!("Redraw after clear failed: {}", e);
                }
            }
            _ => {}
        }
        reply
    }

    /// Tears the board down and sets it up again from the store.
    pub async fn reload(&mut self) -> SuperListsResult<()> {
        self.workspace.reconciler.detach(&mut self.workspace.dom);
        self.setup_board().await
    }

    pub fn apply_settings(&mut self, settings: Settings) -> SuperListsResult<()> {
        self.workspace
            .reconciler
            .apply_settings(&mut self.workspace.dom, settings)
    }

    pub fn click(&mut self, node: NodeId) -> SuperListsResult<bool> {
        self.workspace
            .reconciler
            .handle_click(&mut self.workspace.dom, node)
    }

    /// Waits until every queued store write has landed.
    pub async fn flush(&self) {
        self.writer.flush().await;
    }

    /// Serves the inbox and the frame clock until shutdown or until every
    /// sender is gone. Returns the page with all decoration removed.
    pub async fn run(mut self, mut inbox: mpsc::UnboundedReceiver<Inbound<D>>) -> D {
        let mut frames = tokio::time::interval(FRAME);
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = frames.tick() => {
                    self.tick(FRAME);
                    self.pump_logged().await;
                }
                message = inbox.recv() => {
                    let Some(message) = message else {
                        break;
                    };
                    match message {
                        Inbound::Command { message, reply } => {
                            let outcome = self.execute(&message).await;
                            let _ = reply.send(outcome);
                        }
                        Inbound::Click { node, reply } => {
                            let outcome = self.click(node);
                            let _ = reply.send(outcome);
                        }
                        Inbound::Settings(settings) => {
                            if let Err(e) = self.apply_settings(settings) {
                                tracing::warn!("Settings rejected: {}", e);
                            }
                        }
                        Inbound::Page(change) => {
                            if let Err(e) = change(&mut self.workspace.dom) {
                                tracing::warn!("Page change failed: {}", e);
                            }
                            self.pump_logged().await;
                        }
                        Inbound::Shutdown => break,
                    }
                }
            }
        }
        self.shutdown().await
    }

    /// Removes all decoration, flushes pending writes and stops the writer.
    pub async fn shutdown(mut self) -> D {
        self.workspace.reconciler.detach(&mut self.workspace.dom);
        self.observer.disconnect();
        self.bus.clear();
        self.writer.flush().await;

        let Self {
            workspace,
            writer,
            writer_task,
            ..
        } = self;
        drop(writer);
        if let Err(e) = writer_task.await {
            tracing::warn!("Store writer ended abnormally: {}", e);
        }
        tracing::info!("Session stopped");
        workspace.dom
    }

    async fn pump_logged(&mut self) {
        if let Err(e) = self.pump().await {
            tracing::error!("Failed to process page changes: {}", e);
        }
    }
}

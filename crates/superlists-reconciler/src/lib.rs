pub mod bootstrap;
pub mod classes;
pub mod commands;
pub mod reconciler;
pub mod scheduler;
pub mod session;
pub mod snapshot;

pub use bootstrap::{wait_for_board_root, RetryPolicy};
pub use commands::{Command, CommandReply};
pub use reconciler::{BoardSwitch, GroupId, ListGroup, Reconciler, MAX_SPLIT_PASSES};
pub use scheduler::{DeferredTask, FrameTask, Scheduler, TaskControl, TaskHandle, CARD_FORMAT_DELAY, FRAME};
pub use session::{Inbound, PageChange, Session, Workspace};
pub use snapshot::{BoardSnapshot, GroupSnapshot, ListSnapshot, SectionSnapshot};

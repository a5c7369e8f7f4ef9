pub mod bus;
pub mod events;
pub mod observer;

pub use bus::{EventBus, Listener, PublishReport, SubscriptionId};
pub use events::{BoardEvent, EventKind};
pub use observer::{ChangeObserver, ObserverState};

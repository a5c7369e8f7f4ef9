pub mod settings_store;
pub mod store;
pub mod traits;
pub mod view_state_store;
pub mod writer;

pub use settings_store::{load_settings, save_settings, SETTINGS_KEY};
pub use store::{JsonFileStore, MemoryStore};
pub use traits::{KeyValueStore, StoreMap};
pub use view_state_store::ViewStateStore;
pub use writer::{spawn_writer, PersistHandle, StoreOp};

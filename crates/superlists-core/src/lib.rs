pub mod config;
pub mod error;
pub mod logging;
pub mod result;

pub use config::Settings;
pub use error::SuperListsError;
pub use logging::{LogEntry, Loggable};
pub use result::SuperListsResult;

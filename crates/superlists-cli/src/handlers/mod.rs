pub mod simulate;
pub mod store;

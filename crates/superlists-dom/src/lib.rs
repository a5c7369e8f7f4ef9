pub mod dom;
pub mod fixture;
pub mod guard;
pub mod memory;
pub mod query;
pub mod selectors;
pub mod traverse;

pub use dom::{Dom, Mutation, MutationRecord, NodeId};
pub use fixture::{BoardFixture, BuiltBoard, CardFixture, ListFixture, PageEdit};
pub use guard::WriteIntent;
pub use memory::MemoryDocument;
pub use query::Needle;
pub use selectors::PageSelectors;
pub use traverse::DomExt;

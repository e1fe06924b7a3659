pub mod memory;
pub mod local;
pub mod indexeddb;
pub mod auto;

pub use memory::MemoryStorage;
pub use local::LocalStorage;
pub use indexeddb::IndexedDbStorage;
pub use auto::{auto_detect_storage, open_storage};

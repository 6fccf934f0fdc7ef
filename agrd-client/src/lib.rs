//! agrd-client library interface
//!
//! Terminal-side half of Achievagrad: a debounced search dispatcher that talks
//! to agrd-proxy, and the persisted backlog of chosen games.

pub mod backend;
pub mod dispatcher;
pub mod selection;
pub mod storage;
pub mod view;

pub use backend::{HttpSearchBackend, SearchBackend};
pub use dispatcher::{Dispatcher, Phase, Snapshot};
pub use selection::SelectionStore;
pub use storage::StorageSlot;

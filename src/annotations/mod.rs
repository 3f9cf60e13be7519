//! Annotation module
//!
//! - Annotation and session snapshot types (JSON-compatible with browser
//!   clients)
//! - Storage key scheme (share code or content hash)
//! - SQLite-backed local store
//! - Debounced background writer

mod persist;
mod storage_key;
mod store;
mod types;

pub use persist::{DebouncedWriter, PersistSink};
pub use storage_key::{content_hash, StorageKey, SESSION_KEY};
pub use store::LocalStore;
pub use types::{Annotation, SessionSnapshot, View};

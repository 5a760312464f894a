//! Flat key-value persistence and the ordered collections mirrored into it.

pub mod collection;
pub mod file;
pub mod memory;

pub use collection::{Collection, CollectionError, Record};
pub use file::JsonFileStore;
pub use memory::MemoryStore;

const KEY_NAMESPACE: &str = "fxdesk";

pub fn namespaced_key(name: &str) -> String {
    format!("{KEY_NAMESPACE}:{name}")
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage quota exceeded: writing {needed} bytes would exceed {quota} bytes")]
    QuotaExceeded { needed: usize, quota: usize },

    #[error("failed to encode value: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
}

/// String values addressed by string keys. A missing key reads as `None`.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

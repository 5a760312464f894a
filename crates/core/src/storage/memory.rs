use super::{KeyValueStore, StoreError};
use std::collections::BTreeMap;

/// In-process store. An optional byte quota models browser storage limits.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            quota: Some(quota),
        }
    }

    fn used_without(&self, key: &str) -> usize {
        self.entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if let Some(quota) = self.quota {
            let needed = self.used_without(key) + key.len() + value.len();
            if needed > quota {
                return Err(StoreError::QuotaExceeded { needed, quota });
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_rejects_oversized_writes_and_keeps_old_value() {
        let mut store = MemoryStore::with_quota(16);
        store.set("k", "small").unwrap();
        let err = store.set("k", "this value is far too long").unwrap_err();
        assert!(matches!(err, StoreError::QuotaExceeded { quota: 16, .. }));
        assert_eq!(store.get("k").unwrap().as_deref(), Some("small"));
        assert_eq!(store.get("missing").unwrap(), None);
    }
}

//! Bridge registry.
//!
//! Concurrent map from bridge id to the authoritative bridge entry.
//! Registration is last-writer-wins: installing an entry under a taken
//! id displaces the previous one, which the caller then tears down as
//! kicked. Removal is conditional on instance identity so a read loop
//! unwinding late never removes its successor.

use dashmap::DashMap;
use std::sync::Arc;

use crate::ws::bridge::BridgeEntry;

/// Registry of connected bridges.
#[derive(Debug, Default)]
pub struct BridgeRegistry {
    bridges: DashMap<String, Arc<BridgeEntry>>,
}

impl BridgeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bridges: DashMap::new(),
        }
    }

    /// Installs `entry` under `bridge_id`, returning any displaced entry.
    pub fn replace(&self, bridge_id: &str, entry: Arc<BridgeEntry>) -> Option<Arc<BridgeEntry>> {
        self.bridges.insert(bridge_id.to_string(), entry)
    }

    /// Returns the current entry for `bridge_id`, if any.
    #[must_use]
    pub fn load(&self, bridge_id: &str) -> Option<Arc<BridgeEntry>> {
        self.bridges.get(bridge_id).map(|e| Arc::clone(e.value()))
    }

    /// Removes the mapping only if it still points at `entry`.
    pub fn remove_if_same(&self, bridge_id: &str, entry: &Arc<BridgeEntry>) {
        self.bridges
            .remove_if(bridge_id, |_, current| Arc::ptr_eq(current, entry));
    }

    /// Returns the number of connected bridges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bridges.len()
    }

    /// Returns true when no bridge is connected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bridges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_returns_displaced_entry() {
        let registry = BridgeRegistry::new();
        let first = Arc::new(BridgeEntry::detached());
        let second = Arc::new(BridgeEntry::detached());

        assert!(registry.replace("b", first.clone()).is_none());
        let displaced = registry.replace("b", second.clone()).unwrap();
        assert!(Arc::ptr_eq(&displaced, &first));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_load_returns_current_instance() {
        let registry = BridgeRegistry::new();
        let entry = Arc::new(BridgeEntry::detached());
        registry.replace("b", entry.clone());

        let loaded = registry.load("b").unwrap();
        assert!(Arc::ptr_eq(&loaded, &entry));
        assert!(registry.load("missing").is_none());
    }

    #[test]
    fn test_remove_if_same_skips_successor() {
        let registry = BridgeRegistry::new();
        let first = Arc::new(BridgeEntry::detached());
        let second = Arc::new(BridgeEntry::detached());
        registry.replace("b", first.clone());
        registry.replace("b", second.clone());

        // The displaced entry's cleanup must not remove its successor.
        registry.remove_if_same("b", &first);
        assert!(Arc::ptr_eq(&registry.load("b").unwrap(), &second));

        registry.remove_if_same("b", &second);
        assert!(registry.load("b").is_none());
        assert!(registry.is_empty());
    }
}

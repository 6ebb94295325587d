use super::event::{HookEvent, HookMask};
use super::observer::StoreHook;
use crate::types::{FastMap, TableId};
use std::sync::Arc;

#[derive(Clone)]
pub struct HookEntry {
    pub hook: Arc<dyn StoreHook>,
    pub mask: HookMask,
}

/// Observers are identified by the allocation behind their `Arc`.
#[inline]
fn same_hook(a: &Arc<dyn StoreHook>, b: &Arc<dyn StoreHook>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Table → ordered observer registrations.
///
/// The map sits behind an `Arc` so a snapshot is a pointer copy; the first
/// change after a snapshot clones the map.
#[derive(Clone, Default)]
pub struct HookRegistry {
    by_table: Arc<FastMap<TableId, Vec<HookEntry>>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `hook` for `table`, or update its mask in place when it is
    /// already registered there.
    pub fn register(&mut self, table: TableId, hook: Arc<dyn StoreHook>, mask: HookMask) {
        let entries = Arc::make_mut(&mut self.by_table).entry(table).or_default();
        match entries.iter_mut().find(|e| same_hook(&e.hook, &hook)) {
            Some(existing) => existing.mask = mask,
            None => entries.push(HookEntry { hook, mask }),
        }
    }

    /// Returns whether an entry was removed.
    pub fn unregister(&mut self, table: TableId, hook: &Arc<dyn StoreHook>) -> bool {
        let registered = self
            .by_table
            .get(&table)
            .is_some_and(|entries| entries.iter().any(|e| same_hook(&e.hook, hook)));
        if !registered {
            return false;
        }
        let by_table = Arc::make_mut(&mut self.by_table);
        if let Some(entries) = by_table.get_mut(&table) {
            entries.retain(|e| !same_hook(&e.hook, hook));
            if entries.is_empty() {
                by_table.remove(&table);
            }
        }
        true
    }

    /// Drop every registration for `table`.
    pub fn clear_table(&mut self, table: TableId) -> usize {
        if !self.by_table.contains_key(&table) {
            return 0;
        }
        Arc::make_mut(&mut self.by_table)
            .remove(&table)
            .map_or(0, |entries| entries.len())
    }

    /// Observers of `table` subscribed to `event`, in registration order.
    /// Recomputed on every call.
    pub fn enabled_hooks_for(
        &self,
        table: TableId,
        event: HookEvent,
    ) -> impl Iterator<Item = &Arc<dyn StoreHook>> + '_ {
        self.entries(table)
            .iter()
            .filter(move |e| e.mask.contains(event))
            .map(|e| &e.hook)
    }

    pub fn entries(&self, table: TableId) -> &[HookEntry] {
        self.by_table.get(&table).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn mask_of(&self, table: TableId, hook: &Arc<dyn StoreHook>) -> Option<HookMask> {
        self.entries(table)
            .iter()
            .find(|e| same_hook(&e.hook, hook))
            .map(|e| e.mask)
    }

    pub fn is_empty(&self) -> bool {
        self.by_table.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str);

    impl StoreHook for Named {
        fn name(&self) -> &str {
            self.0
        }
    }

    fn hook(name: &'static str) -> Arc<dyn StoreHook> {
        Arc::new(Named(name))
    }

    fn names<'a>(iter: impl Iterator<Item = &'a Arc<dyn StoreHook>>) -> Vec<String> {
        iter.map(|h| h.name().to_string()).collect()
    }

    #[test]
    fn preserves_registration_order() {
        let table = TableId::new("t", "A").unwrap();
        let mut registry = HookRegistry::new();
        for name in ["o1", "o2", "o3"] {
            registry.register(table, hook(name), HookMask::ALL);
        }
        assert_eq!(
            names(registry.enabled_hooks_for(table, HookEvent::BeforeSetRecord)),
            vec!["o1", "o2", "o3"]
        );
    }

    #[test]
    fn reregistering_updates_mask_in_place() {
        let table = TableId::new("t", "A").unwrap();
        let mut registry = HookRegistry::new();
        let a = hook("a");
        let b = hook("b");
        registry.register(table, a.clone(), HookEvent::AfterSetRecord.into());
        registry.register(table, b.clone(), HookMask::ALL);
        registry.register(table, a.clone(), HookEvent::AfterDeleteRecord.into());

        assert_eq!(registry.entries(table).len(), 2);
        assert_eq!(names(registry.entries(table).iter().map(|e| &e.hook)), vec!["a", "b"]);
        assert_eq!(
            registry.mask_of(table, &a),
            Some(HookMask::from(HookEvent::AfterDeleteRecord))
        );
        assert_eq!(
            names(registry.enabled_hooks_for(table, HookEvent::AfterSetRecord)),
            vec!["b"]
        );
    }

    #[test]
    fn unregister_and_clear() {
        let table = TableId::new("t", "A").unwrap();
        let other = TableId::new("t", "B").unwrap();
        let mut registry = HookRegistry::new();
        let a = hook("a");
        registry.register(table, a.clone(), HookMask::ALL);
        registry.register(other, a.clone(), HookMask::ALL);

        assert!(registry.unregister(table, &a));
        assert!(!registry.unregister(table, &a));
        assert!(registry.entries(table).is_empty());

        assert_eq!(registry.clear_table(other), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn snapshot_is_unaffected_by_later_changes() {
        let table = TableId::new("t", "A").unwrap();
        let mut registry = HookRegistry::new();
        registry.register(table, hook("a"), HookMask::ALL);
        let snapshot = registry.clone();
        registry.register(table, hook("b"), HookMask::ALL);
        assert_eq!(snapshot.entries(table).len(), 1);
        assert_eq!(registry.entries(table).len(), 2);
    }
}

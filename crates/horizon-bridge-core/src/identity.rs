//! Widget identity registry.
//!
//! Maps native path identifiers (`.f.b`, `font3`, ...) to the wrapper objects
//! that own them. Records live in an arena keyed by [`WidgetKey`]; a path
//! index gives O(1) lookup by identifier.
//!
//! Hierarchy is encoded in the path strings themselves and is not parsed
//! here. A record may additionally remember its parent's path, supplied by
//! the caller at registration time. Parents and children refer to each other
//! only through these identifiers, never through owning pointers.
//!
//! Entries are not removed when the native object dies by other means, so a
//! lookup may find nothing for a path the native layer still reports. Such
//! misses are normal: [`IdentityRegistry::resolve`] hands back the raw path.
//!
//! # Key Types
//!
//! - [`IdentityTable`] - The unsynchronized arena
//! - [`IdentityRegistry`] - Thread-safe wrapper used by bridges
//! - [`WidgetRef`] - What lookups return
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_bridge_core::{IdentityRegistry, Value};
//!
//! let registry = IdentityRegistry::new();
//! let wrapper = Arc::new("my button");
//! registry.register(".b", wrapper);
//!
//! assert!(registry.lookup(".b").is_some());
//! assert_eq!(registry.resolve(".gone"), Value::from(".gone"));
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use slotmap::{new_key_type, SlotMap};

use crate::logging::targets;
use crate::value::{Value, WidgetRef};

new_key_type! {
    /// Arena key of a registered widget record.
    ///
    /// Keys are stable while the record exists; re-registering the same path
    /// keeps its key.
    pub struct WidgetKey;
}

struct WidgetRecord {
    path: Arc<str>,
    parent: Option<String>,
    wrapper: Arc<dyn Any + Send + Sync>,
}

impl WidgetRecord {
    fn to_ref(&self) -> WidgetRef {
        WidgetRef::from_dyn(self.path.clone(), self.wrapper.clone())
    }
}

/// Arena of widget records indexed by path.
///
/// Not synchronized; see [`IdentityRegistry`] for the shared version.
#[derive(Default)]
pub struct IdentityTable {
    records: SlotMap<WidgetKey, WidgetRecord>,
    by_path: HashMap<String, WidgetKey>,
}

impl IdentityTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the record for `path`.
    pub fn insert(
        &mut self,
        path: &str,
        parent: Option<&str>,
        wrapper: Arc<dyn Any + Send + Sync>,
    ) -> WidgetKey {
        let record = WidgetRecord {
            path: Arc::from(path),
            parent: parent.map(str::to_string),
            wrapper,
        };

        if let Some(&key) = self.by_path.get(path) {
            if let Some(slot) = self.records.get_mut(key) {
                *slot = record;
                tracing::trace!(target: targets::IDENTITY, path, ?key, "replaced widget");
                return key;
            }
        }

        let key = self.records.insert(record);
        self.by_path.insert(path.to_string(), key);
        tracing::trace!(target: targets::IDENTITY, path, ?key, "registered widget");
        key
    }

    /// The arena key for `path`.
    pub fn key_of(&self, path: &str) -> Option<WidgetKey> {
        self.by_path.get(path).copied()
    }

    /// The wrapper registered under `path`.
    pub fn get(&self, path: &str) -> Option<WidgetRef> {
        self.key_of(path)
            .and_then(|key| self.records.get(key))
            .map(WidgetRecord::to_ref)
    }

    /// The wrapper stored under an arena key.
    pub fn get_by_key(&self, key: WidgetKey) -> Option<WidgetRef> {
        self.records.get(key).map(WidgetRecord::to_ref)
    }

    /// Whether `path` is registered.
    pub fn contains(&self, path: &str) -> bool {
        self.by_path.contains_key(path)
    }

    /// Remove the record for `path`.
    pub fn remove(&mut self, path: &str) -> Option<WidgetRef> {
        let key = self.by_path.remove(path)?;
        let record = self.records.remove(key)?;
        tracing::trace!(target: targets::IDENTITY, path, ?key, "removed widget");
        Some(record.to_ref())
    }

    /// The parent path recorded for `path`.
    pub fn parent_of(&self, path: &str) -> Option<&str> {
        self.key_of(path)
            .and_then(|key| self.records.get(key))
            .and_then(|record| record.parent.as_deref())
    }

    /// Paths whose recorded parent is `path`, sorted.
    pub fn children_of(&self, path: &str) -> Vec<String> {
        let mut children: Vec<String> = self
            .records
            .values()
            .filter(|record| record.parent.as_deref() == Some(path))
            .map(|record| record.path.to_string())
            .collect();
        children.sort();
        children
    }

    /// Paths that have no recorded parent, or whose parent is not registered.
    pub fn roots(&self) -> Vec<String> {
        let mut roots: Vec<String> = self
            .records
            .values()
            .filter(|record| {
                record
                    .parent
                    .as_deref()
                    .is_none_or(|parent| !self.by_path.contains_key(parent))
            })
            .map(|record| record.path.to_string())
            .collect();
        roots.sort();
        roots
    }

    /// All registered paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.by_path.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Number of registered records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop every record.
    pub fn clear(&mut self) {
        let count = self.records.len();
        self.records.clear();
        self.by_path.clear();
        tracing::debug!(target: targets::IDENTITY, count, "cleared identity table");
    }
}

/// Thread-safe identity registry.
///
/// Registration and lookup may happen from auxiliary threads; every access
/// goes through an `RwLock`, so a lookup issued after [`register`] returns
/// always observes the new entry.
///
/// [`register`]: IdentityRegistry::register
#[derive(Default)]
pub struct IdentityRegistry {
    inner: RwLock<IdentityTable>,
}

impl IdentityRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a typed wrapper under `path`, replacing any previous entry.
    pub fn register<T: Any + Send + Sync>(&self, path: &str, wrapper: Arc<T>) -> WidgetRef {
        self.register_dyn(path, None, wrapper)
    }

    /// Register a wrapper under `path` and remember its parent path.
    pub fn register_child<T: Any + Send + Sync>(
        &self,
        path: &str,
        parent: &str,
        wrapper: Arc<T>,
    ) -> WidgetRef {
        self.register_dyn(path, Some(parent), wrapper)
    }

    /// Register an already type-erased wrapper.
    pub fn register_dyn(
        &self,
        path: &str,
        parent: Option<&str>,
        wrapper: Arc<dyn Any + Send + Sync>,
    ) -> WidgetRef {
        let handle = WidgetRef::from_dyn(path, wrapper.clone());
        self.inner.write().insert(path, parent, wrapper);
        handle
    }

    /// Look up the wrapper registered under `path`.
    pub fn lookup(&self, path: &str) -> Option<WidgetRef> {
        self.inner.read().get(path)
    }

    /// Resolve `path` to a widget value, or the raw path if unregistered.
    pub fn resolve(&self, path: &str) -> Value {
        match self.lookup(path) {
            Some(widget) => Value::Widget(widget),
            None => Value::Str(path.to_string()),
        }
    }

    /// Whether `path` is registered.
    pub fn contains(&self, path: &str) -> bool {
        self.inner.read().contains(path)
    }

    /// Remove the entry for `path`.
    pub fn remove(&self, path: &str) -> Option<WidgetRef> {
        self.inner.write().remove(path)
    }

    /// The recorded parent path of `path`.
    pub fn parent_of(&self, path: &str) -> Option<String> {
        self.inner.read().parent_of(path).map(str::to_string)
    }

    /// Paths whose recorded parent is `path`.
    pub fn children_of(&self, path: &str) -> Vec<String> {
        self.inner.read().children_of(path)
    }

    /// Paths without a registered parent.
    pub fn roots(&self) -> Vec<String> {
        self.inner.read().roots()
    }

    /// All registered paths.
    pub fn paths(&self) -> Vec<String> {
        self.inner.read().paths()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Drop all entries (environment re-initialization).
    pub fn clear(&self) {
        self.inner.write().clear();
    }

    /// Access the table with a read lock for compound queries.
    pub fn with_read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&IdentityTable) -> R,
    {
        f(&self.inner.read())
    }

    /// Access the table with a write lock for compound updates.
    pub fn with_write<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut IdentityTable) -> R,
    {
        f(&mut self.inner.write())
    }
}

static_assertions::assert_impl_all!(IdentityRegistry: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    struct Wrapper {
        label: &'static str,
    }

    #[test]
    fn test_register_lookup_identity() {
        let registry = IdentityRegistry::new();
        let wrapper = Arc::new(Wrapper { label: "ok" });
        let handle = registry.register(".ok", wrapper.clone());

        let found = registry.lookup(".ok").unwrap();
        assert!(found.ptr_eq(&handle));
        assert_eq!(found.downcast_ref::<Wrapper>().map(|w| w.label), Some("ok"));
        assert!(std::ptr::eq(found.downcast_ref::<Wrapper>().unwrap(), &*wrapper));
    }

    #[test]
    fn test_register_overwrites_and_keeps_key() {
        let registry = IdentityRegistry::new();
        registry.register(".w", Arc::new(Wrapper { label: "first" }));
        let key = registry.with_read(|t| t.key_of(".w")).unwrap();

        registry.register(".w", Arc::new(Wrapper { label: "second" }));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.with_read(|t| t.key_of(".w")), Some(key));
        let found = registry.lookup(".w").unwrap();
        assert_eq!(found.downcast_ref::<Wrapper>().unwrap().label, "second");
    }

    #[test]
    fn test_missing_paths_are_tolerated() {
        let registry = IdentityRegistry::new();
        assert!(registry.lookup(".nothing").is_none());
        assert_eq!(registry.resolve(".nothing"), Value::from(".nothing"));
        assert!(registry.remove(".nothing").is_none());
    }

    #[test]
    fn test_parent_child_by_identifier() {
        let registry = IdentityRegistry::new();
        registry.register(".f", Arc::new(()));
        registry.register_child(".f.b", ".f", Arc::new(()));
        registry.register_child(".f.a", ".f", Arc::new(()));
        registry.register_child(".orphan.x", ".orphan", Arc::new(()));

        assert_eq!(registry.children_of(".f"), vec![".f.a", ".f.b"]);
        assert_eq!(registry.parent_of(".f.b").as_deref(), Some(".f"));
        assert_eq!(registry.roots(), vec![".f", ".orphan.x"]);
    }

    #[test]
    fn test_remove_and_clear() {
        let registry = IdentityRegistry::new();
        registry.register(".a", Arc::new(1u8));
        registry.register(".b", Arc::new(2u8));

        assert!(registry.remove(".a").is_some());
        assert!(!registry.contains(".a"));
        assert_eq!(registry.paths(), vec![".b"]);

        registry.clear();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_concurrent_registration_visible_to_all_threads() {
        let registry = Arc::new(IdentityRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    for i in 0..100 {
                        let path = format!(".t{t}.w{i}");
                        let handle = registry.register(&path, Arc::new((t, i)));
                        let found = registry.lookup(&path).expect("visible after register");
                        assert!(found.ptr_eq(&handle));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(registry.len(), 800);

        let other_thread = {
            let registry = registry.clone();
            std::thread::spawn(move || registry.lookup(".t3.w42").is_some())
        };
        assert!(other_thread.join().unwrap());
    }
}

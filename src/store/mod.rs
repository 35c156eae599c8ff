//! Typed Variable Store.
//!
//! A [`Store`] is an ordered, mutable, name-keyed bag of type-erased values.
//! Besides direct lookup by name it supports *type-directed* lookup: find the
//! most recently inserted entry whose type is (or, through a registered
//! [`Capability`], can be viewed as) the requested type.
//!
//! # Ordering
//!
//! Insertion order is significant. Type-directed lookup scans from the newest
//! entry backward, so the last producer of a type is the one consumers see.
//! Overwriting a name counts as a new insertion.
//!
//! # Copies
//!
//! [`Store::copy`] produces an independent store. Consuming from the copy
//! never affects the original, which is how sibling branches each draw their
//! own arguments.
//!
//! # Examples
//!
//! ```rust
//! use effectum::store::Store;
//!
//! let mut store = Store::new();
//! store.set("first", 1_i32);
//! store.set("second", 2_i32);
//!
//! // Newest wins.
//! assert_eq!(store.lookup::<i32>(), Ok(2));
//!
//! // Consuming removes it, exposing the older entry.
//! assert_eq!(store.take::<i32>(), Ok(2));
//! assert_eq!(store.lookup::<i32>(), Ok(1));
//! ```

mod computation;
mod value;

pub use computation::{Computation, Parameter};
pub use value::{Capability, StoredValue};

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::error::LookupError;

/// Slots are compacted once tombstones outnumber live entries past this size.
const COMPACTION_THRESHOLD: usize = 32;

struct Entry {
    name: String,
    value: Box<dyn StoredValue>,
    capabilities: Rc<[Capability]>,
}

impl Entry {
    fn matches(&self, target: TypeId) -> Option<Resolution> {
        if self.value.stored_type_id() == target {
            return Some(Resolution::Exact);
        }
        self.capabilities
            .iter()
            .position(|capability| capability.target() == target)
            .map(Resolution::Capability)
    }
}

impl Clone for Entry {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            value: self.value.clone_boxed(),
            capabilities: Rc::clone(&self.capabilities),
        }
    }
}

#[derive(Clone, Copy)]
enum Resolution {
    Exact,
    Capability(usize),
}

/// An ordered, name-keyed store of type-erased values.
///
/// Not thread-safe: a store is threaded through one evaluation on one thread,
/// and isolation between branches is obtained with [`Store::copy`].
#[derive(Clone, Default)]
pub struct Store {
    slots: Vec<Option<Entry>>,
    index: HashMap<String, usize>,
    synthesized: usize,
}

static_assertions::assert_not_impl_any!(Store: Send, Sync);

impl Store {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `value` under `name`, replacing any previous entry.
    ///
    /// A replaced entry loses its position: the new value becomes the newest.
    pub fn set<T: StoredValue>(&mut self, name: impl Into<String>, value: T) {
        self.set_boxed(name.into(), Box::new(value), Rc::from([]));
    }

    /// Inserts `value` under `name`, also resolvable through `capabilities`.
    pub fn set_with<T, I>(&mut self, name: impl Into<String>, value: T, capabilities: I)
    where
        T: StoredValue,
        I: IntoIterator<Item = Capability>,
    {
        let capabilities: Rc<[Capability]> = capabilities.into_iter().collect();
        self.set_boxed(name.into(), Box::new(value), capabilities);
    }

    /// Inserts `value` under a synthesized name and returns that name.
    pub fn insert<T: StoredValue>(&mut self, value: T) -> String {
        self.insert_boxed(Box::new(value))
    }

    pub(crate) fn insert_boxed(&mut self, value: Box<dyn StoredValue>) -> String {
        let name = self.synthesize_name();
        self.set_boxed(name.clone(), value, Rc::from([]));
        name
    }

    pub(crate) fn set_boxed(
        &mut self,
        name: String,
        value: Box<dyn StoredValue>,
        capabilities: Rc<[Capability]>,
    ) {
        if let Some(previous) = self.index.remove(&name) {
            self.slots[previous] = None;
        }
        self.index.insert(name.clone(), self.slots.len());
        self.slots.push(Some(Entry {
            name,
            value,
            capabilities,
        }));
        self.compact_if_sparse();
    }

    fn synthesize_name(&mut self) -> String {
        loop {
            self.synthesized += 1;
            let name = format!("${}", self.synthesized);
            if !self.index.contains_key(&name) {
                return name;
            }
        }
    }

    /// Borrows the value stored under `name`.
    ///
    /// # Errors
    ///
    /// [`LookupError::NameNotFound`] if no such entry exists, or
    /// [`LookupError::TypeMismatch`] if it holds another type.
    pub fn get<T: Any>(&self, name: &str) -> Result<&T, LookupError> {
        let entry = self.entry(name)?;
        entry
            .value
            .as_any()
            .downcast_ref::<T>()
            .ok_or_else(|| LookupError::TypeMismatch {
                name: name.to_string(),
                expected: type_name::<T>(),
                found: entry.value.stored_type_name(),
            })
    }

    /// Removes and returns the value stored under `name`.
    ///
    /// The entry is left in place when its type does not match.
    ///
    /// # Errors
    ///
    /// [`LookupError::NameNotFound`] or [`LookupError::TypeMismatch`].
    pub fn consume<T: Any>(&mut self, name: &str) -> Result<T, LookupError> {
        self.get::<T>(name)?;
        let entry = self.remove_entry(name).ok_or_else(|| LookupError::NameNotFound {
            name: name.to_string(),
        })?;
        let found = entry.value.stored_type_name();
        entry
            .value
            .into_any()
            .downcast::<T>()
            .map(|value| *value)
            .map_err(|_| LookupError::TypeMismatch {
                name: name.to_string(),
                expected: type_name::<T>(),
                found,
            })
    }

    /// Removes the entry stored under `name`, returning whether it existed.
    pub fn remove(&mut self, name: &str) -> bool {
        self.remove_entry(name).is_some()
    }

    /// Returns `true` if an entry named `name` exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Returns the type name of the entry stored under `name`.
    #[must_use]
    pub fn type_name_of(&self, name: &str) -> Option<&'static str> {
        self.entry(name)
            .ok()
            .map(|entry| entry.value.stored_type_name())
    }

    /// Entry names, oldest first.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.live().map(|entry| entry.name.as_str())
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` if the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Produces an independent copy of this store.
    #[must_use]
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Finds the newest value resolvable as `T`, optionally removing it.
    ///
    /// An entry resolves as `T` if it stores a `T` or registered a
    /// [`Capability`] targeting `T`. Asking for `Store` itself always
    /// succeeds with a copy of this store and never consumes anything.
    ///
    /// # Errors
    ///
    /// [`LookupError::TypeNotFound`] if no entry resolves as `T`.
    pub fn lookup_by_type<T: StoredValue>(&mut self, consume: bool) -> Result<T, LookupError> {
        if let Some(store) = self.as_requested::<T>() {
            return Ok(store);
        }
        let (slot, resolution) = self.find(TypeId::of::<T>()).ok_or(LookupError::TypeNotFound {
            type_name: type_name::<T>(),
        })?;
        if !consume {
            return self.project(slot, resolution);
        }
        let resolved = self.project(slot, resolution)?;
        if let Some(entry) = self.slots[slot].take() {
            self.index.remove(&entry.name);
        }
        Ok(resolved)
    }

    /// Returns the newest value resolvable as `T` without removing it.
    ///
    /// # Errors
    ///
    /// [`LookupError::TypeNotFound`] if no entry resolves as `T`.
    pub fn lookup<T: StoredValue>(&self) -> Result<T, LookupError> {
        if let Some(store) = self.as_requested::<T>() {
            return Ok(store);
        }
        let (slot, resolution) = self.find(TypeId::of::<T>()).ok_or(LookupError::TypeNotFound {
            type_name: type_name::<T>(),
        })?;
        self.project(slot, resolution)
    }

    /// Removes and returns the newest value resolvable as `T`.
    ///
    /// # Errors
    ///
    /// [`LookupError::TypeNotFound`] if no entry resolves as `T`.
    pub fn take<T: StoredValue>(&mut self) -> Result<T, LookupError> {
        self.lookup_by_type(true)
    }

    /// Borrows the newest value whose concrete type is exactly `T`.
    #[must_use]
    pub fn lookup_ref<T: Any>(&self) -> Option<&T> {
        self.live()
            .rev()
            .find_map(|entry| entry.value.as_any().downcast_ref::<T>())
    }

    fn as_requested<T: Any>(&self) -> Option<T> {
        if TypeId::of::<T>() != TypeId::of::<Self>() {
            return None;
        }
        let copy: Box<dyn Any> = Box::new(self.copy());
        copy.downcast::<T>().ok().map(|store| *store)
    }

    fn find(&self, target: TypeId) -> Option<(usize, Resolution)> {
        self.slots
            .iter()
            .enumerate()
            .rev()
            .find_map(|(slot, entry)| {
                entry
                    .as_ref()
                    .and_then(|entry| entry.matches(target))
                    .map(|resolution| (slot, resolution))
            })
    }

    fn project<T: StoredValue>(&self, slot: usize, resolution: Resolution) -> Result<T, LookupError> {
        let not_found = || LookupError::TypeNotFound {
            type_name: type_name::<T>(),
        };
        let entry = self.slots[slot].as_ref().ok_or_else(not_found)?;
        match resolution {
            Resolution::Exact => entry
                .value
                .clone_boxed()
                .into_any()
                .downcast::<T>()
                .map(|value| *value)
                .map_err(|_| not_found()),
            Resolution::Capability(position) => entry.capabilities[position]
                .apply(entry.value.as_any())
                .and_then(|view| view.downcast::<T>().ok())
                .map(|view| *view)
                .ok_or_else(not_found),
        }
    }

    fn entry(&self, name: &str) -> Result<&Entry, LookupError> {
        self.index
            .get(name)
            .and_then(|slot| self.slots[*slot].as_ref())
            .ok_or_else(|| LookupError::NameNotFound {
                name: name.to_string(),
            })
    }

    fn remove_entry(&mut self, name: &str) -> Option<Entry> {
        let slot = self.index.remove(name)?;
        self.slots[slot].take()
    }

    fn live(&self) -> impl DoubleEndedIterator<Item = &Entry> {
        self.slots.iter().filter_map(Option::as_ref)
    }

    fn compact_if_sparse(&mut self) {
        let tombstones = self.slots.len() - self.index.len();
        if self.slots.len() < COMPACTION_THRESHOLD || tombstones <= self.index.len() {
            return;
        }
        self.slots.retain(Option::is_some);
        self.index.clear();
        for (slot, entry) in self.slots.iter().enumerate() {
            if let Some(entry) = entry {
                self.index.insert(entry.name.clone(), slot);
            }
        }
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_map()
            .entries(
                self.live()
                    .map(|entry| (&entry.name, entry.value.stored_type_name())),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fmt::Display;

    #[rstest]
    fn test_set_and_get_by_name() {
        let mut store = Store::new();
        store.set("name", "alice".to_string());

        assert_eq!(store.get::<String>("name"), Ok(&"alice".to_string()));
        assert!(store.contains("name"));
        assert_eq!(store.len(), 1);
    }

    #[rstest]
    fn test_get_with_wrong_type_reports_mismatch() {
        let mut store = Store::new();
        store.set("count", 3_i32);

        assert_eq!(
            store.get::<String>("count"),
            Err(LookupError::TypeMismatch {
                name: "count".to_string(),
                expected: type_name::<String>(),
                found: type_name::<i32>(),
            })
        );
    }

    #[rstest]
    fn test_consume_removes_entry() {
        let mut store = Store::new();
        store.set("count", 3_i32);

        assert_eq!(store.consume::<i32>("count"), Ok(3));
        assert!(!store.contains("count"));
        assert_eq!(
            store.consume::<i32>("count"),
            Err(LookupError::NameNotFound {
                name: "count".to_string()
            })
        );
    }

    #[rstest]
    fn test_consume_with_wrong_type_keeps_entry() {
        let mut store = Store::new();
        store.set("count", 3_i32);

        assert!(store.consume::<u8>("count").is_err());
        assert!(store.contains("count"));
    }

    #[rstest]
    fn test_overwrite_moves_entry_to_newest() {
        let mut store = Store::new();
        store.set("a", 1_i32);
        store.set("b", 2_i32);
        store.set("a", 3_i32);

        assert_eq!(store.lookup::<i32>(), Ok(3));
        assert_eq!(store.names().collect::<Vec<_>>(), vec!["b", "a"]);
    }

    #[rstest]
    fn test_newest_of_type_wins_then_older() {
        let mut store = Store::new();
        store.set("a", 1_i32);
        store.set("b", 2_i32);

        assert_eq!(store.lookup_by_type::<i32>(false), Ok(2));
        assert_eq!(store.lookup_by_type::<i32>(true), Ok(2));
        assert_eq!(store.lookup_by_type::<i32>(false), Ok(1));
    }

    #[rstest]
    fn test_lookup_skips_other_types() {
        let mut store = Store::new();
        store.set("number", 1_i32);
        store.set("text", "x".to_string());

        assert_eq!(store.lookup::<i32>(), Ok(1));
    }

    #[rstest]
    fn test_lookup_missing_type() {
        let store = Store::new();
        assert_eq!(
            store.lookup::<u64>(),
            Err(LookupError::TypeNotFound {
                type_name: type_name::<u64>()
            })
        );
    }

    #[rstest]
    fn test_store_itself_always_resolves() {
        let mut store = Store::new();
        store.set("a", 1_i32);

        let whole: Store = store.take().expect("store");
        assert_eq!(whole.len(), 1);
        assert_eq!(store.len(), 1);

        let empty: Store = Store::new().lookup().expect("store");
        assert!(empty.is_empty());
    }

    #[rstest]
    fn test_capability_resolves_interface() {
        let mut store = Store::new();
        store.set_with(
            "answer",
            42_i32,
            [Capability::new(|value: &i32| {
                Rc::new(*value) as Rc<dyn Display>
            })],
        );

        let shown: Rc<dyn Display> = store.take().expect("capability");
        assert_eq!(shown.to_string(), "42");
        assert!(store.is_empty());
    }

    #[rstest]
    fn test_copy_is_independent() {
        let mut store = Store::new();
        store.set("a", 1_i32);

        let mut copy = store.copy();
        assert_eq!(copy.take::<i32>(), Ok(1));
        copy.set("b", 2_i32);

        assert_eq!(store.lookup::<i32>(), Ok(1));
        assert!(!store.contains("b"));
    }

    #[rstest]
    fn test_insert_synthesizes_unique_names() {
        let mut store = Store::new();
        store.set("$1", 0_u8);
        let first = store.insert(1_i32);
        let second = store.insert(2_i32);

        assert_ne!(first, second);
        assert_ne!(first, "$1");
        assert_eq!(store.get::<i32>(&second), Ok(&2));
    }

    #[rstest]
    fn test_compaction_preserves_order_and_names() {
        let mut store = Store::new();
        for round in 0..100_i32 {
            store.set("counter", round);
            store.set("mirror", round * 2);
        }

        assert_eq!(store.len(), 2);
        assert_eq!(store.get::<i32>("counter"), Ok(&99));
        assert_eq!(store.lookup::<i32>(), Ok(198));
        assert!(store.slots.len() < 100);
    }

    #[rstest]
    fn test_lookup_ref_exact_type_only() {
        let mut store = Store::new();
        store.set("v", vec![1_u8]);

        assert_eq!(store.lookup_ref::<Vec<u8>>(), Some(&vec![1_u8]));
        assert!(store.lookup_ref::<Vec<i8>>().is_none());
    }

    #[rstest]
    fn test_debug_lists_entries() {
        let mut store = Store::new();
        store.set("a", 1_i32);
        assert_eq!(format!("{store:?}"), r#"{"a": "i32"}"#);
    }
}

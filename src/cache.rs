use std::borrow::Borrow;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::hash::Hash;

/// Populate-on-first-access memo table.
///
/// Values are cloned out of the table, so callers store cheap handles
/// (`Rc`, `Option<small>`). Entries live as long as the cache and are never
/// invalidated.
#[derive(Debug)]
pub struct Cache<K, V> {
    entries: RefCell<HashMap<K, V>>,
    misses: Cell<usize>,
}

impl<K, V> Default for Cache<K, V> {
    fn default() -> Self {
        Self {
            entries: RefCell::new(HashMap::new()),
            misses: Cell::new(0),
        }
    }
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached value for `key`, computing and storing it first if
    /// absent. `compute` may itself consult other caches but must not re-enter
    /// this one with the same key.
    pub fn get_or_compute<Q>(&self, key: &Q, compute: impl FnOnce(&Q) -> V) -> V
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ToOwned<Owned = K> + ?Sized,
    {
        if let Some(value) = self.entries.borrow().get(key) {
            return value.clone();
        }

        self.misses.set(self.misses.get() + 1);
        let value = compute(key);
        self.entries
            .borrow_mut()
            .entry(key.to_owned())
            .or_insert(value)
            .clone()
    }

    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.borrow().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Number of times a value had to be computed.
    pub fn misses(&self) -> usize {
        self.misses.get()
    }
}

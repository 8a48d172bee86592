use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

/// Entries reserved up front; larger caches grow on demand.
const PREALLOCATED_ENTRIES: usize = 128;

/// Bounded map that evicts the least-recently-used entry once `capacity` is exceeded.
///
/// Recency is a monotonically increasing stamp per access; `order` maps stamps back to keys so
/// the oldest entry is always the first element of the tree.
#[derive(Debug, Clone)]
pub struct LruCache<K, V> {
    capacity: usize,
    entries: HashMap<K, (V, u64)>,
    order: BTreeMap<u64, K>,
    clock: u64,
}

impl<K, V> LruCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity.min(PREALLOCATED_ENTRIES)),
            order: BTreeMap::new(),
            clock: 0,
        }
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Returns a clone of the cached value and marks it most recently used.
    pub fn get(&mut self, key: &K) -> Option<V> {
        let stamp = self.tick();
        let (value, last_used) = self.entries.get_mut(key)?;
        self.order.remove(last_used);
        *last_used = stamp;
        self.order.insert(stamp, key.clone());
        Some(value.clone())
    }

    /// Inserts or replaces `key`, returning the key evicted to make room, if any.
    pub fn set(&mut self, key: K, value: V) -> Option<K> {
        let stamp = self.tick();
        if let Some((_, previous)) = self.entries.insert(key.clone(), (value, stamp)) {
            self.order.remove(&previous);
        }
        self.order.insert(stamp, key);

        if self.entries.len() > self.capacity {
            let (_, oldest) = self.order.pop_first()?;
            self.entries.remove(&oldest);
            return Some(oldest);
        }
        None
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.clock = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

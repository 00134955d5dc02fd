use std::collections::HashMap;
use std::fmt;

use log::debug;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::concurrent::{LockMode, Safe, Unsafe, View};
use crate::conv;
use crate::error::{MapError, MapResult, ResultExt};

pub mod builder;

pub use builder::IntStrMapBuilder;

/// Hash map from `i64` keys to `String` values with an optional reader/writer lock.
///
/// The lock mode is chosen by the type parameter and never changes: `Unsafe`
/// (the default) does no locking and is not `Sync`, `Safe` guards the whole
/// store with one `RwLock`. Iteration order is unspecified in both modes.
///
/// Operations taking a callback (`iterator`, `lock_func`, `rlock_func` and
/// the `*_func_lock` family) run it while the store is held. The callback
/// must not call back into the same map: a `Safe` map deadlocks, an `Unsafe`
/// map panics on the conflicting borrow.
pub struct IntStrMap<M: LockMode = Unsafe> {
    data: M::Cell<Store>,
}

type Store = HashMap<i64, String>;

/// An [`IntStrMap`] that can be shared between threads.
pub type SafeIntStrMap = IntStrMap<Safe>;

impl<M: LockMode> IntStrMap<M> {
    pub fn new() -> Self {
        Self::from_map(HashMap::new())
    }

    /// Use `data` as the underlying store. The map is moved in, not copied.
    pub fn from_map(data: HashMap<i64, String>) -> Self {
        IntStrMap { data: M::wrap(data) }
    }

    pub fn builder() -> IntStrMapBuilder<M> {
        IntStrMapBuilder::new()
    }

    /// Whether this map serializes access through its lock.
    pub fn is_safe(&self) -> bool {
        M::SAFE
    }

    /// Call `f` for every entry until it returns `false`.
    ///
    /// The read lock is held for the whole traversal.
    pub fn iterator<F>(&self, mut f: F)
    where
        F: FnMut(i64, &str) -> bool,
    {
        let data = self.read();
        for (key, value) in data.iter() {
            if !f(*key, value) {
                break;
            }
        }
    }

    /// Copy the data into a new map of the opposite lock mode.
    ///
    /// A `Safe` map clones into an `Unsafe` one and vice versa. Use `Clone`
    /// to keep the mode.
    pub fn clone_map(&self) -> IntStrMap<M::Inverse> {
        IntStrMap::from_map(self.map_copy())
    }

    /// The underlying store for `Unsafe` maps, a copy of it for `Safe` maps.
    ///
    /// A live view borrows the store; writing to the map while it is alive panics.
    pub fn map(&self) -> View<'_, HashMap<i64, String>> {
        M::view::<Store>(&self.data)
    }

    pub fn map_copy(&self) -> HashMap<i64, String> {
        self.read().clone()
    }

    /// Copy of the data with decimal string keys and JSON string values.
    pub fn map_str_any(&self) -> HashMap<String, Value> {
        self.read()
            .iter()
            .map(|(key, value)| (conv::string(*key), Value::String(value.clone())))
            .collect()
    }

    /// Delete every entry with an empty value.
    pub fn filter_empty(&self) {
        self.write().retain(|_, value| !value.is_empty());
    }

    pub fn set(&self, key: i64, value: impl Into<String>) {
        self.write().insert(key, value.into());
    }

    pub fn sets<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (i64, String)>,
    {
        self.write().extend(entries);
    }

    pub fn search(&self, key: i64) -> Option<String> {
        self.read().get(&key).cloned()
    }

    /// Value for `key`, or an empty string when absent.
    pub fn get(&self, key: i64) -> String {
        self.search(key).unwrap_or_default()
    }

    /// Remove and return an arbitrary entry, `(0, "")` when the map is empty.
    pub fn pop(&self) -> (i64, String) {
        let mut data = self.write();
        let key = data.keys().next().copied();
        key.and_then(|key| data.remove_entry(&key)).unwrap_or_default()
    }

    /// Remove and return up to `size` arbitrary entries. A negative `size`
    /// takes everything.
    ///
    /// Returns `None` when nothing is taken, whether because `size` is zero or
    /// because the map is empty.
    pub fn pops(&self, size: isize) -> Option<HashMap<i64, String>> {
        let mut data = self.write();
        let size = usize::try_from(size).map_or(data.len(), |size| size.min(data.len()));
        if size == 0 {
            return None;
        }
        if size == data.len() {
            debug!("Popping all {} entries", size);
            return Some(std::mem::take(&mut *data));
        }

        let keys: Vec<i64> = data.keys().take(size).copied().collect();
        Some(keys.into_iter().filter_map(|key| data.remove_entry(&key)).collect())
    }

    // Re-checks under the write lock, so a writer that got in between a
    // caller's miss and this call wins.
    fn do_set_with_lock_check(&self, key: i64, value: String) -> String {
        self.write().entry(key).or_insert(value).clone()
    }

    /// Existing value for `key`, or store `value` and return it.
    pub fn get_or_set(&self, key: i64, value: impl Into<String>) -> String {
        match self.search(key) {
            Some(existing) => existing,
            None => self.do_set_with_lock_check(key, value.into()),
        }
    }

    /// Like [`get_or_set`](Self::get_or_set) with a lazily computed value.
    ///
    /// `f` runs outside the lock. Concurrent callers may all run it, and its
    /// result is dropped if another writer stored the key first.
    pub fn get_or_set_func<F>(&self, key: i64, f: F) -> String
    where
        F: FnOnce() -> String,
    {
        match self.search(key) {
            Some(existing) => existing,
            None => self.do_set_with_lock_check(key, f()),
        }
    }

    /// Like [`get_or_set_func`](Self::get_or_set_func), but `f` runs while the
    /// write lock is held, so it runs at most once per missing key at a time.
    ///
    /// An empty result is returned but not stored.
    pub fn get_or_set_func_lock<F>(&self, key: i64, f: F) -> String
    where
        F: FnOnce() -> String,
    {
        if let Some(existing) = self.search(key) {
            return existing;
        }

        let mut data = self.write();
        if let Some(existing) = data.get(&key) {
            return existing.clone();
        }
        let value = f();
        if !value.is_empty() {
            data.insert(key, value.clone());
        }
        value
    }

    /// Store `value` if `key` is absent. Returns whether it was absent.
    pub fn set_if_not_exist(&self, key: i64, value: impl Into<String>) -> bool {
        if self.contains(key) {
            return false;
        }
        self.do_set_with_lock_check(key, value.into());
        true
    }

    pub fn set_if_not_exist_func<F>(&self, key: i64, f: F) -> bool
    where
        F: FnOnce() -> String,
    {
        if self.contains(key) {
            return false;
        }
        self.do_set_with_lock_check(key, f());
        true
    }

    /// Like [`set_if_not_exist_func`](Self::set_if_not_exist_func), but `f`
    /// runs while the write lock is held.
    ///
    /// Unlike [`get_or_set_func_lock`](Self::get_or_set_func_lock) an empty
    /// result is stored. Returns `true` once the key was seen missing, even if
    /// another writer stored it before the lock was taken (`f` is then skipped).
    pub fn set_if_not_exist_func_lock<F>(&self, key: i64, f: F) -> bool
    where
        F: FnOnce() -> String,
    {
        if self.contains(key) {
            return false;
        }
        self.write().entry(key).or_insert_with(f);
        true
    }

    /// Delete all of `keys`, ignoring missing ones.
    pub fn removes(&self, keys: &[i64]) {
        let mut data = self.write();
        for key in keys {
            data.remove(key);
        }
    }

    /// Delete `key` and return its value, or an empty string when absent.
    pub fn remove(&self, key: i64) -> String {
        self.write().remove(&key).unwrap_or_default()
    }

    pub fn keys(&self) -> Vec<i64> {
        self.read().keys().copied().collect()
    }

    pub fn values(&self) -> Vec<String> {
        self.read().values().cloned().collect()
    }

    pub fn contains(&self, key: i64) -> bool {
        self.read().contains_key(&key)
    }

    pub fn size(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Replace the store with a fresh empty map.
    pub fn clear(&self) {
        let mut data = self.write();
        debug!("Clearing map of {} entries", data.len());
        *data = HashMap::new();
    }

    /// Run `f` on the store while holding the write lock.
    pub fn lock_func<F>(&self, f: F)
    where
        F: FnOnce(&mut HashMap<i64, String>),
    {
        let mut data = self.write();
        f(&mut *data)
    }

    /// Run `f` on the store while holding the read lock.
    pub fn rlock_func<F>(&self, f: F)
    where
        F: FnOnce(&HashMap<i64, String>),
    {
        let data = self.read();
        f(&*data)
    }

    /// Hold the read lock until the returned guard is dropped.
    pub fn read(&self) -> M::ReadGuard<'_, Store> {
        M::read::<Store>(&self.data)
    }

    /// Hold the write lock until the returned guard is dropped.
    pub fn write(&self) -> M::WriteGuard<'_, Store> {
        M::write::<Store>(&self.data)
    }

    /// Swap keys and values.
    ///
    /// Values become keys through [`conv::int`], so unparsable values all land
    /// on key 0. When several values map to the same key an arbitrary one wins.
    pub fn flip(&self) {
        let mut data = self.write();
        let flipped: HashMap<i64, String> = data
            .drain()
            .map(|(key, value)| (conv::int(&value), conv::string(key)))
            .collect();
        debug!("Flipped map into {} entries", flipped.len());
        *data = flipped;
    }

    /// Copy every entry of `other` into this map, overwriting on collision.
    ///
    /// Takes this map's write lock before `other`'s read lock. Merging a map
    /// into itself does nothing.
    pub fn merge<O: LockMode>(&self, other: &IntStrMap<O>) {
        let this = self as *const Self as *const ();
        let that = other as *const IntStrMap<O> as *const ();
        if std::ptr::eq(this, that) {
            return;
        }
        let mut data = self.write();
        let other_data = other.read();
        data.extend(other_data.iter().map(|(key, value)| (*key, value.clone())));
    }

    pub fn into_inner(self) -> HashMap<i64, String> {
        M::into_inner::<Store>(self.data)
    }

    pub fn to_json(&self) -> MapResult<String> {
        serde_json::to_string(self).map_err(|e| MapError::encode(e.to_string()))
    }

    pub fn from_json(json: &str) -> MapResult<Self> {
        serde_json::from_str::<Self>(json).context("Decoding int-string map")
    }

    /// Decode a JSON object into this map.
    ///
    /// Existing entries are kept and decoded ones overwrite them. Nothing is
    /// written when decoding fails.
    pub fn unmarshal_json(&self, json: &[u8]) -> MapResult<()> {
        let decoded: HashMap<i64, String> = serde_json::from_slice(json)?;
        self.write().extend(decoded);
        Ok(())
    }
}

impl<M: LockMode> Default for IntStrMap<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: LockMode> Clone for IntStrMap<M> {
    fn clone(&self) -> Self {
        Self::from_map(self.map_copy())
    }
}

impl<M: LockMode> From<HashMap<i64, String>> for IntStrMap<M> {
    fn from(data: HashMap<i64, String>) -> Self {
        Self::from_map(data)
    }
}

impl<M: LockMode> FromIterator<(i64, String)> for IntStrMap<M> {
    fn from_iter<I: IntoIterator<Item = (i64, String)>>(iter: I) -> Self {
        Self::from_map(iter.into_iter().collect())
    }
}

impl<M: LockMode> Extend<(i64, String)> for IntStrMap<M> {
    fn extend<I: IntoIterator<Item = (i64, String)>>(&mut self, iter: I) {
        self.sets(iter)
    }
}

impl<M: LockMode> fmt::Debug for IntStrMap<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.read();
        f.debug_struct("IntStrMap")
            .field("safe", &M::SAFE)
            .field("data", &*data)
            .finish()
    }
}

/// Renders the JSON form, e.g. `{"1":"a"}`.
impl<M: LockMode> fmt::Display for IntStrMap<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.read();
        let json = serde_json::to_string(&*data).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

impl<M: LockMode> Serialize for IntStrMap<M> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let data = self.read();
        (*data).serialize(serializer)
    }
}

impl<'de, M: LockMode> Deserialize<'de> for IntStrMap<M> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        HashMap::<i64, String>::deserialize(deserializer).map(Self::from_map)
    }
}

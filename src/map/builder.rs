use std::collections::HashMap;
use std::marker::PhantomData;

use crate::concurrent::{LockMode, Unsafe};

use super::IntStrMap;

/// Configures an [`IntStrMap`] before it is built.
pub struct IntStrMapBuilder<M: LockMode = Unsafe> {
    capacity: Option<usize>,
    data: Option<HashMap<i64, String>>,
    entries: Vec<(i64, String)>,
    mode: PhantomData<M>,
}

impl<M: LockMode> IntStrMapBuilder<M> {
    pub fn new() -> Self {
        Self {
            capacity: None,
            data: None,
            entries: Vec::new(),
            mode: PhantomData,
        }
    }

    /// Reserve room for at least `capacity` entries.
    pub fn with_capacity(self, capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..self
        }
    }

    /// Use `data` as the underlying store instead of a fresh map.
    pub fn with_data(self, data: HashMap<i64, String>) -> Self {
        Self {
            data: Some(data),
            ..self
        }
    }

    pub fn with_entry(self, key: i64, value: impl Into<String>) -> Self {
        let mut entries = self.entries;
        entries.push((key, value.into()));
        Self { entries, ..self }
    }

    pub fn with_entries(self, new_entries: impl IntoIterator<Item = (i64, String)>) -> Self {
        let entries = self.entries.into_iter().chain(new_entries).collect();
        Self { entries, ..self }
    }

    /// Entries added with `with_entry`/`with_entries` overwrite those of `with_data`.
    pub fn build(self) -> IntStrMap<M> {
        let capacity = self.capacity.unwrap_or(0);
        let mut data = match self.data {
            Some(mut data) => {
                data.reserve(capacity.saturating_sub(data.len()));
                data
            }
            None => HashMap::with_capacity(capacity),
        };
        data.extend(self.entries);
        IntStrMap::from_map(data)
    }
}

impl<M: LockMode> Default for IntStrMapBuilder<M> {
    fn default() -> Self {
        Self::new()
    }
}

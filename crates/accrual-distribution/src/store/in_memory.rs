// Copyright 2025 Accrual Maintainers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::store::{ReadStore, Store, StoreError, TransactionalContext};
use std::{cell::RefCell, collections::BTreeMap, ops::Bound};

type Entries = BTreeMap<Vec<u8>, Vec<u8>>;

/// An ordered key-value store held entirely in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: RefCell<Entries>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

fn bounds<'a>(
    from: &'a [u8],
    to: Option<&'a [u8]>,
) -> Option<(Bound<&'a [u8]>, Bound<&'a [u8]>)> {
    match to {
        Some(to) if to <= from => None,
        Some(to) => Some((Bound::Included(from), Bound::Excluded(to))),
        None => Some((Bound::Included(from), Bound::Unbounded)),
    }
}

fn collect_range(entries: &Entries, from: &[u8], to: Option<&[u8]>) -> Entries {
    match bounds(from, to) {
        Some(range) => entries
            .range::<[u8], _>(range)
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
        None => Entries::new(),
    }
}

impl ReadStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn iter_range(
        &self,
        from: Vec<u8>,
        to: Option<Vec<u8>>,
    ) -> Result<impl Iterator<Item = (Vec<u8>, Vec<u8>)>, StoreError> {
        Ok(collect_range(&self.entries.borrow(), &from, to.as_deref()).into_iter())
    }
}

impl Store for MemoryStore {
    type Transaction<'a> = MemoryTransactionalContext<'a>;

    fn create_transaction(&self) -> Self::Transaction<'_> {
        MemoryTransactionalContext::new(self)
    }
}

/// Pending writes buffered over a [`MemoryStore`]. A `None` in the overlay marks a deletion.
/// Dropping the context without committing discards every pending write.
pub struct MemoryTransactionalContext<'a> {
    store: &'a MemoryStore,
    overlay: RefCell<BTreeMap<Vec<u8>, Option<Vec<u8>>>>,
}

impl<'a> MemoryTransactionalContext<'a> {
    pub fn new(store: &'a MemoryStore) -> Self {
        Self {
            store,
            overlay: RefCell::new(BTreeMap::new()),
        }
    }
}

impl ReadStore for MemoryTransactionalContext<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        match self.overlay.borrow().get(key) {
            Some(pending) => Ok(pending.clone()),
            None => self.store.get(key),
        }
    }

    fn iter_range(
        &self,
        from: Vec<u8>,
        to: Option<Vec<u8>>,
    ) -> Result<impl Iterator<Item = (Vec<u8>, Vec<u8>)>, StoreError> {
        let mut merged = collect_range(&self.store.entries.borrow(), &from, to.as_deref());

        if let Some(range) = bounds(&from, to.as_deref()) {
            for (key, pending) in self.overlay.borrow().range::<[u8], _>(range) {
                match pending {
                    Some(value) => merged.insert(key.clone(), value.clone()),
                    None => merged.remove(key),
                };
            }
        }

        Ok(merged.into_iter())
    }
}

impl<'a> TransactionalContext<'a> for MemoryTransactionalContext<'a> {
    fn put(&self, key: &[u8], value: Vec<u8>) -> Result<(), StoreError> {
        self.overlay.borrow_mut().insert(key.to_vec(), Some(value));
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        self.overlay.borrow_mut().insert(key.to_vec(), None);
        Ok(())
    }

    fn commit(self) -> Result<(), StoreError> {
        let mut entries = self.store.entries.borrow_mut();
        for (key, pending) in self.overlay.into_inner() {
            match pending {
                Some(value) => entries.insert(key, value),
                None => entries.remove(&key),
            };
        }
        Ok(())
    }

    fn rollback(self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        let db = store.create_transaction();
        for key in [1u8, 3, 5, 7] {
            db.put(&[key], vec![key]).unwrap();
        }
        db.commit().unwrap();
        store
    }

    #[test]
    fn overlay_shadows_base() {
        let store = seeded();
        let db = store.create_transaction();
        db.put(&[3], vec![33]).unwrap();
        db.delete(&[5]).unwrap();
        db.put(&[4], vec![4]).unwrap();

        assert_eq!(db.get(&[3]).unwrap(), Some(vec![33]));
        assert_eq!(db.get(&[5]).unwrap(), None);
        assert_eq!(store.get(&[3]).unwrap(), Some(vec![3]));

        let keys: Vec<_> = db
            .iter_range(vec![2], Some(vec![7]))
            .unwrap()
            .map(|(key, value)| (key[0], value[0]))
            .collect();
        assert_eq!(keys, vec![(3, 33), (4, 4)]);
    }

    #[test]
    fn commit_applies_overlay() {
        let store = seeded();
        let db = store.create_transaction();
        db.delete(&[1]).unwrap();
        db.put(&[9], vec![9]).unwrap();
        db.commit().unwrap();

        let keys: Vec<_> = store
            .iter_range(vec![], None)
            .unwrap()
            .map(|(key, _)| key[0])
            .collect();
        assert_eq!(keys, vec![3, 5, 7, 9]);
    }

    #[test]
    fn drop_discards_overlay() {
        let store = seeded();
        {
            let db = store.create_transaction();
            db.delete(&[1]).unwrap();
        }
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn inverted_range_is_empty() {
        let store = seeded();
        assert_eq!(store.iter_range(vec![5], Some(vec![3])).unwrap().count(), 0);
    }
}

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

pub mod columns;
pub mod in_memory;

use accrual_kernel::{cbor, from_cbor, to_cbor};
use thiserror::Error;
use tracing::warn;

const EVENT_TARGET: &str = "accrual::distribution::store";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Internal(#[from] Box<dyn std::error::Error + Send + Sync>),
    #[error("undecodable row in column '{column}' at key {key}: {source}")]
    Undecodable {
        column: &'static str,
        key: String,
        #[source]
        source: cbor::decode::Error,
    },
    #[error("malformed key in column '{column}': {key}")]
    MalformedKey { column: &'static str, key: String },
}

impl StoreError {
    pub fn undecodable(column: &'static str, key: &[u8], source: cbor::decode::Error) -> Self {
        Self::Undecodable {
            column,
            key: hex::encode(key),
            source,
        }
    }

    pub fn malformed_key(column: &'static str, key: &[u8]) -> Self {
        Self::MalformedKey {
            column,
            key: hex::encode(key),
        }
    }
}

// Store
// ----------------------------------------------------------------------------

/// A read-only view over an ordered key-value space. Keys compare lexicographically, which every
/// column relies on to lay out its records in scan order.
pub trait ReadStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// All entries with keys in `[from, to)`, in ascending key order. An absent upper bound
    /// scans to the end of the key space.
    fn iter_range(
        &self,
        from: Vec<u8>,
        to: Option<Vec<u8>>,
    ) -> Result<impl Iterator<Item = (Vec<u8>, Vec<u8>)>, StoreError>;

    /// All entries whose key starts with `prefix`, in ascending key order.
    fn iter_prefix(
        &self,
        prefix: Vec<u8>,
    ) -> Result<impl Iterator<Item = (Vec<u8>, Vec<u8>)>, StoreError> {
        let upper = prefix_upper_bound(&prefix);
        self.iter_range(prefix, upper)
    }
}

/// A set of writes applied atomically onto a store. Reads performed through the context observe
/// its own pending writes.
pub trait TransactionalContext<'a>: ReadStore {
    fn put(&self, key: &[u8], value: Vec<u8>) -> Result<(), StoreError>;

    fn delete(&self, key: &[u8]) -> Result<(), StoreError>;

    /// Persist all pending writes.
    fn commit(self) -> Result<(), StoreError>;

    /// Discard all pending writes.
    fn rollback(self) -> Result<(), StoreError>;
}

pub trait Store: ReadStore {
    type Transaction<'a>: TransactionalContext<'a>
    where
        Self: 'a;

    fn create_transaction(&self) -> Self::Transaction<'_>;
}

/// Run a state transition inside a fresh transaction; commit if it succeeds, roll back on any
/// error so that a failed transition leaves no partial writes behind.
pub fn atomically<'s, S, T, E>(
    store: &'s S,
    transition: impl FnOnce(&S::Transaction<'s>) -> Result<T, E>,
) -> Result<T, E>
where
    S: Store,
    E: From<StoreError>,
{
    let db = store.create_transaction();
    match transition(&db) {
        Ok(result) => {
            db.commit()?;
            Ok(result)
        }
        Err(e) => {
            if let Err(rollback) = db.rollback() {
                warn!(target: EVENT_TARGET, error = %rollback, "atomically.rollback_failed");
            }
            Err(e)
        }
    }
}

/// Run a computation against a throw-away transaction. Writes are visible to the computation
/// itself and are always discarded afterwards.
pub fn scratch<'s, S, T, E>(
    store: &'s S,
    computation: impl FnOnce(&S::Transaction<'s>) -> Result<T, E>,
) -> Result<T, E>
where
    S: Store,
    E: From<StoreError>,
{
    let db = store.create_transaction();
    let result = computation(&db);
    db.rollback()?;
    result
}

// Rows
// ----------------------------------------------------------------------------

/// The smallest key strictly greater than every key starting with `prefix`, if any.
pub fn prefix_upper_bound(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut upper = prefix.to_vec();
    while let Some(last) = upper.pop() {
        if last < u8::MAX {
            upper.push(last + 1);
            return Some(upper);
        }
    }
    None
}

pub(crate) fn get_row<T>(
    db: &impl ReadStore,
    column: &'static str,
    key: &[u8],
) -> Result<Option<T>, StoreError>
where
    T: for<'d> cbor::Decode<'d, ()>,
{
    db.get(key)?
        .map(|bytes| decode_row(column, key, &bytes))
        .transpose()
}

pub(crate) fn decode_row<T>(column: &'static str, key: &[u8], bytes: &[u8]) -> Result<T, StoreError>
where
    T: for<'d> cbor::Decode<'d, ()>,
{
    from_cbor(bytes).map_err(|e| StoreError::undecodable(column, key, e))
}

pub(crate) fn put_row<'a, T>(
    db: &impl TransactionalContext<'a>,
    key: &[u8],
    row: &T,
) -> Result<(), StoreError>
where
    T: cbor::Encode<()>,
{
    db.put(key, to_cbor(row))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::in_memory::MemoryStore;
    use test_case::test_case;

    #[test_case(&[0x04] => Some(vec![0x05]); "single byte")]
    #[test_case(&[0x04, 0xff] => Some(vec![0x05]); "carry")]
    #[test_case(&[0xff, 0xff] => None; "unbounded")]
    #[test_case(&[] => None; "empty")]
    fn upper_bound(prefix: &[u8]) -> Option<Vec<u8>> {
        prefix_upper_bound(prefix)
    }

    #[derive(Debug, Error)]
    #[error("boom")]
    struct Boom(#[from] StoreError);

    #[test]
    fn atomically_commits_on_success() {
        let store = MemoryStore::new();
        let result: Result<(), Boom> = atomically(&store, |db| {
            db.put(b"key", b"value".to_vec())?;
            Ok(())
        });
        assert!(result.is_ok());
        assert_eq!(store.get(b"key").unwrap(), Some(b"value".to_vec()));
    }

    #[test]
    fn atomically_discards_on_failure() {
        let store = MemoryStore::new();
        let result: Result<(), Boom> = atomically(&store, |db| {
            db.put(b"key", b"value".to_vec())?;
            Err(Boom(StoreError::malformed_key("test", b"key")))
        });
        assert!(result.is_err());
        assert_eq!(store.get(b"key").unwrap(), None);
    }

    #[test]
    fn scratch_never_persists() {
        let store = MemoryStore::new();
        let seen: Result<_, Boom> = scratch(&store, |db| {
            db.put(b"key", b"value".to_vec())?;
            Ok(db.get(b"key")?)
        });
        assert_eq!(seen.unwrap(), Some(b"value".to_vec()));
        assert_eq!(store.get(b"key").unwrap(), None);
    }

    #[test]
    fn iter_prefix_is_bounded() {
        let store = MemoryStore::new();
        let result: Result<(), StoreError> = atomically(&store, |db| {
            db.put(&[0x04, 0x01], vec![1])?;
            db.put(&[0x04, 0xff], vec![2])?;
            db.put(&[0x05], vec![3])?;
            db.put(&[0x03, 0xff], vec![4])?;
            Ok(())
        });
        result.unwrap();

        let values: Vec<_> = store
            .iter_prefix(vec![0x04])
            .unwrap()
            .map(|(_, value)| value)
            .collect();
        assert_eq!(values, vec![vec![1], vec![2]]);
    }
}

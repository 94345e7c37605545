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

//! The shared pool receiving truncation remainders and rewards nobody can claim.

use crate::store::{get_row, put_row, ReadStore, StoreError, TransactionalContext};
use accrual_kernel::{cbor, DecCoins};

pub const PREFIX: u8 = 0x00;

const COLUMN: &str = "fee_pool";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row {
    pub community_pool: DecCoins,
}

impl Row {
    pub fn new(community_pool: DecCoins) -> Self {
        Self { community_pool }
    }
}

impl<C> cbor::encode::Encode<C> for Row {
    fn encode<W: cbor::encode::Write>(
        &self,
        e: &mut cbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), cbor::encode::Error<W::Error>> {
        e.array(1)?;
        e.encode_with(&self.community_pool, ctx)?;
        Ok(())
    }
}

impl<'a, C> cbor::decode::Decode<'a, C> for Row {
    fn decode(d: &mut cbor::Decoder<'a>, ctx: &mut C) -> Result<Self, cbor::decode::Error> {
        let _len = d.array()?;
        let community_pool = d.decode_with(ctx)?;
        Ok(Row::new(community_pool))
    }
}

/// An absent pool reads as empty.
pub fn get(db: &impl ReadStore) -> Result<Row, StoreError> {
    Ok(get_row(db, COLUMN, &[PREFIX])?.unwrap_or_default())
}

pub fn put<'a>(db: &impl TransactionalContext<'a>, row: &Row) -> Result<(), StoreError> {
    put_row(db, &[PREFIX], row)
}

pub fn add_to_community_pool<'a>(
    db: &impl TransactionalContext<'a>,
    amount: &DecCoins,
) -> Result<(), StoreError> {
    if amount.is_empty() {
        return Ok(());
    }
    let mut pool = get(db)?;
    pool.community_pool += amount;
    put(db, &pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{in_memory::MemoryStore, Store};
    use accrual_kernel::Decimal;

    #[test]
    fn accumulate_remainders() {
        let store = MemoryStore::new();
        let db = store.create_transaction();
        assert_eq!(get(&db).unwrap(), Row::default());

        let remainder = DecCoins::from_coin("uatom", "0.7".parse::<Decimal>().unwrap());
        add_to_community_pool(&db, &remainder).unwrap();
        add_to_community_pool(&db, &remainder).unwrap();

        assert_eq!(
            get(&db).unwrap().community_pool,
            DecCoins::from_coin("uatom", "1.4".parse::<Decimal>().unwrap())
        );
    }
}

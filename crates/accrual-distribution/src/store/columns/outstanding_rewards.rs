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

//! Unwithdrawn rewards per validator, across all of its delegators. This is an upper bound on what
//! may still be paid out from the validator.

use crate::store::{
    columns::{key, KeyReader},
    decode_row, get_row, put_row, ReadStore, StoreError, TransactionalContext,
};
use accrual_kernel::{cbor, DecCoins, ValidatorAddress};

pub const PREFIX: u8 = 0x02;

const COLUMN: &str = "outstanding_rewards";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row {
    pub rewards: DecCoins,
}

impl Row {
    pub fn new(rewards: DecCoins) -> Self {
        Self { rewards }
    }
}

impl<C> cbor::encode::Encode<C> for Row {
    fn encode<W: cbor::encode::Write>(
        &self,
        e: &mut cbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), cbor::encode::Error<W::Error>> {
        e.array(1)?;
        e.encode_with(&self.rewards, ctx)?;
        Ok(())
    }
}

impl<'a, C> cbor::decode::Decode<'a, C> for Row {
    fn decode(d: &mut cbor::Decoder<'a>, ctx: &mut C) -> Result<Self, cbor::decode::Error> {
        let _len = d.array()?;
        let rewards = d.decode_with(ctx)?;
        Ok(Row::new(rewards))
    }
}

pub fn key_of(validator: &ValidatorAddress) -> Vec<u8> {
    key(PREFIX, [validator.as_bytes()])
}

pub fn get(db: &impl ReadStore, validator: &ValidatorAddress) -> Result<Option<Row>, StoreError> {
    get_row(db, COLUMN, &key_of(validator))
}

pub fn put<'a>(
    db: &impl TransactionalContext<'a>,
    validator: &ValidatorAddress,
    row: &Row,
) -> Result<(), StoreError> {
    put_row(db, &key_of(validator), row)
}

pub fn delete<'a>(
    db: &impl TransactionalContext<'a>,
    validator: &ValidatorAddress,
) -> Result<(), StoreError> {
    db.delete(&key_of(validator))
}

pub fn iter<'a>(
    db: &'a impl ReadStore,
) -> Result<impl Iterator<Item = Result<(ValidatorAddress, Row), StoreError>> + 'a, StoreError> {
    Ok(db.iter_prefix(vec![PREFIX])?.map(|(key, value)| {
        let mut reader = KeyReader::new(COLUMN, &key);
        let validator = reader.validator()?;
        reader.finish()?;
        Ok((validator, decode_row(COLUMN, &key, &value)?))
    }))
}

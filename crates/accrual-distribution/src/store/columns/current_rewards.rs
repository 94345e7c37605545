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

//! The live accumulator of each validator: rewards received since the last period close, and the
//! number of the period currently accruing.

use crate::store::{
    columns::key, get_row, put_row, ReadStore, StoreError, TransactionalContext,
};
use accrual_kernel::{cbor, DecCoins, Period, ValidatorAddress};

pub const PREFIX: u8 = 0x06;

const COLUMN: &str = "current_rewards";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub rewards: DecCoins,
    pub period: Period,
}

impl Row {
    pub fn new(rewards: DecCoins, period: Period) -> Self {
        Self { rewards, period }
    }
}

impl<C> cbor::encode::Encode<C> for Row {
    fn encode<W: cbor::encode::Write>(
        &self,
        e: &mut cbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), cbor::encode::Error<W::Error>> {
        e.array(2)?;
        e.encode_with(&self.rewards, ctx)?;
        e.encode_with(self.period, ctx)?;
        Ok(())
    }
}

impl<'a, C> cbor::decode::Decode<'a, C> for Row {
    fn decode(d: &mut cbor::Decoder<'a>, ctx: &mut C) -> Result<Self, cbor::decode::Error> {
        let _len = d.array()?;
        let rewards = d.decode_with(ctx)?;
        let period = d.decode_with(ctx)?;
        Ok(Row::new(rewards, period))
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

#[cfg(any(test, feature = "test-utils"))]
pub mod tests {
    use super::*;
    use accrual_kernel::any_dec_coins;
    use proptest::prelude::*;

    prop_compose! {
        pub fn any_row()(rewards in any_dec_coins(), period in any::<u64>()) -> Row {
            Row::new(rewards, Period::new(period))
        }
    }

    #[cfg(test)]
    mod internal {
        use super::*;
        use accrual_kernel::prop_cbor_roundtrip;

        prop_cbor_roundtrip!(Row, any_row());
    }
}

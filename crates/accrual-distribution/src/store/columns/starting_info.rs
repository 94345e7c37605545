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

//! Anchor of each delegation's accrual window, keyed by (validator, delegator).

use crate::store::{
    columns::{key, KeyReader},
    decode_row, get_row, put_row, ReadStore, StoreError, TransactionalContext,
};
use accrual_kernel::{cbor, AccountAddress, BlockHeight, Decimal, Period, ValidatorAddress};

pub const PREFIX: u8 = 0x04;

const COLUMN: &str = "starting_info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// The historical period the accrual window starts from.
    pub previous_period: Period,
    /// Token-equivalent of the delegation's shares when the window opened, truncated.
    pub stake: Decimal,
    pub height: BlockHeight,
}

impl Row {
    pub fn new(previous_period: Period, stake: Decimal, height: BlockHeight) -> Self {
        Self {
            previous_period,
            stake,
            height,
        }
    }
}

impl<C> cbor::encode::Encode<C> for Row {
    fn encode<W: cbor::encode::Write>(
        &self,
        e: &mut cbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), cbor::encode::Error<W::Error>> {
        e.array(3)?;
        e.encode_with(self.previous_period, ctx)?;
        e.encode_with(&self.stake, ctx)?;
        e.encode_with(self.height, ctx)?;
        Ok(())
    }
}

impl<'a, C> cbor::decode::Decode<'a, C> for Row {
    fn decode(d: &mut cbor::Decoder<'a>, ctx: &mut C) -> Result<Self, cbor::decode::Error> {
        let _len = d.array()?;
        let previous_period = d.decode_with(ctx)?;
        let stake = d.decode_with(ctx)?;
        let height = d.decode_with(ctx)?;
        Ok(Row::new(previous_period, stake, height))
    }
}

pub fn key_of(validator: &ValidatorAddress, delegator: &AccountAddress) -> Vec<u8> {
    key(PREFIX, [validator.as_bytes(), delegator.as_bytes()])
}

pub fn get(
    db: &impl ReadStore,
    validator: &ValidatorAddress,
    delegator: &AccountAddress,
) -> Result<Option<Row>, StoreError> {
    get_row(db, COLUMN, &key_of(validator, delegator))
}

pub fn put<'a>(
    db: &impl TransactionalContext<'a>,
    validator: &ValidatorAddress,
    delegator: &AccountAddress,
    row: &Row,
) -> Result<(), StoreError> {
    put_row(db, &key_of(validator, delegator), row)
}

pub fn delete<'a>(
    db: &impl TransactionalContext<'a>,
    validator: &ValidatorAddress,
    delegator: &AccountAddress,
) -> Result<(), StoreError> {
    db.delete(&key_of(validator, delegator))
}

/// Every starting info, by ascending (validator, delegator).
pub fn iter<'a>(
    db: &'a impl ReadStore,
) -> Result<
    impl Iterator<Item = Result<(ValidatorAddress, AccountAddress, Row), StoreError>> + 'a,
    StoreError,
> {
    Ok(db.iter_prefix(vec![PREFIX])?.map(|(key, value)| {
        let mut reader = KeyReader::new(COLUMN, &key);
        let validator = reader.validator()?;
        let delegator = reader.account()?;
        reader.finish()?;
        Ok((validator, delegator, decode_row(COLUMN, &key, &value)?))
    }))
}

#[cfg(any(test, feature = "test-utils"))]
pub mod tests {
    use super::*;
    use accrual_kernel::any_decimal;
    use proptest::prelude::*;

    prop_compose! {
        pub fn any_row()(
            previous_period in any::<u64>(),
            stake in any_decimal(),
            height in any::<u64>(),
        ) -> Row {
            Row::new(Period::new(previous_period), stake, BlockHeight::new(height))
        }
    }

    #[cfg(test)]
    mod internal {
        use super::*;
        use accrual_kernel::prop_cbor_roundtrip;

        prop_cbor_roundtrip!(Row, any_row());
    }
}

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

//! Cumulative reward ratios per (validator, period), along with the number of live references
//! anchored to each record.

use crate::store::{
    columns::{key, KeyReader},
    decode_row, get_row, put_row, ReadStore, StoreError, TransactionalContext,
};
use accrual_kernel::{cbor, DecCoins, Period, ValidatorAddress};

pub const PREFIX: u8 = 0x05;

const COLUMN: &str = "historical_rewards";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row {
    pub cumulative_reward_ratio: DecCoins,
    pub reference_count: u16,
}

impl Row {
    pub fn new(cumulative_reward_ratio: DecCoins, reference_count: u16) -> Self {
        Self {
            cumulative_reward_ratio,
            reference_count,
        }
    }
}

impl<C> cbor::encode::Encode<C> for Row {
    fn encode<W: cbor::encode::Write>(
        &self,
        e: &mut cbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), cbor::encode::Error<W::Error>> {
        e.array(2)?;
        e.encode_with(&self.cumulative_reward_ratio, ctx)?;
        e.u16(self.reference_count)?;
        Ok(())
    }
}

impl<'a, C> cbor::decode::Decode<'a, C> for Row {
    fn decode(d: &mut cbor::Decoder<'a>, ctx: &mut C) -> Result<Self, cbor::decode::Error> {
        let _len = d.array()?;
        let cumulative_reward_ratio = d.decode_with(ctx)?;
        let reference_count = d.u16()?;
        Ok(Row::new(cumulative_reward_ratio, reference_count))
    }
}

pub fn validator_prefix(validator: &ValidatorAddress) -> Vec<u8> {
    key(PREFIX, [validator.as_bytes()])
}

pub fn key_of(validator: &ValidatorAddress, period: Period) -> Vec<u8> {
    key(PREFIX, [validator.as_bytes(), &period.to_be_bytes()])
}

fn decode_key(bytes: &[u8]) -> Result<(ValidatorAddress, Period), StoreError> {
    let mut reader = KeyReader::new(COLUMN, bytes);
    let validator = reader.validator()?;
    let period = reader.period()?;
    reader.finish()?;
    Ok((validator, period))
}

pub fn get(
    db: &impl ReadStore,
    validator: &ValidatorAddress,
    period: Period,
) -> Result<Option<Row>, StoreError> {
    get_row(db, COLUMN, &key_of(validator, period))
}

pub fn put<'a>(
    db: &impl TransactionalContext<'a>,
    validator: &ValidatorAddress,
    period: Period,
    row: &Row,
) -> Result<(), StoreError> {
    put_row(db, &key_of(validator, period), row)
}

pub fn delete<'a>(
    db: &impl TransactionalContext<'a>,
    validator: &ValidatorAddress,
    period: Period,
) -> Result<(), StoreError> {
    db.delete(&key_of(validator, period))
}

/// Records of a single validator, by ascending period.
pub fn iter_validator<'a>(
    db: &'a impl ReadStore,
    validator: &ValidatorAddress,
) -> Result<impl Iterator<Item = Result<(Period, Row), StoreError>> + 'a, StoreError> {
    Ok(iter_all(db.iter_prefix(validator_prefix(validator))?)
        .map(|entry| entry.map(|(_, period, row)| (period, row))))
}

/// Records of all validators, by ascending (validator, period).
pub fn iter<'a>(
    db: &'a impl ReadStore,
) -> Result<
    impl Iterator<Item = Result<(ValidatorAddress, Period, Row), StoreError>> + 'a,
    StoreError,
> {
    Ok(iter_all(db.iter_prefix(vec![PREFIX])?))
}

fn iter_all(
    entries: impl Iterator<Item = (Vec<u8>, Vec<u8>)>,
) -> impl Iterator<Item = Result<(ValidatorAddress, Period, Row), StoreError>> {
    entries.map(|(key, value)| {
        let (validator, period) = decode_key(&key)?;
        let row = decode_row(COLUMN, &key, &value)?;
        Ok((validator, period, row))
    })
}

#[cfg(any(test, feature = "test-utils"))]
pub mod tests {
    use super::*;
    use accrual_kernel::any_dec_coins;
    use proptest::prelude::*;

    prop_compose! {
        pub fn any_row()(
            cumulative_reward_ratio in any_dec_coins(),
            reference_count in any::<u16>(),
        ) -> Row {
            Row::new(cumulative_reward_ratio, reference_count)
        }
    }

    #[cfg(test)]
    mod internal {
        use super::*;
        use accrual_kernel::prop_cbor_roundtrip;

        prop_cbor_roundtrip!(Row, any_row());
    }
}

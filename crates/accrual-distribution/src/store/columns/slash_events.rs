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

//! Stake-reducing events per validator, keyed by (validator, height, period) so that a range scan
//! over heights yields events in the order they were applied.

use crate::store::{
    columns::{key, KeyReader},
    decode_row, get_row, put_row, ReadStore, StoreError, TransactionalContext,
};
use accrual_kernel::{cbor, BlockHeight, Decimal, Period, ValidatorAddress};

pub const PREFIX: u8 = 0x08;

const COLUMN: &str = "slash_events";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// The period closed when the slash was applied.
    pub validator_period: Period,
    /// Proportion of stake removed, in `[0, 1)`.
    pub fraction: Decimal,
}

impl Row {
    pub fn new(validator_period: Period, fraction: Decimal) -> Self {
        Self {
            validator_period,
            fraction,
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
        e.encode_with(self.validator_period, ctx)?;
        e.encode_with(&self.fraction, ctx)?;
        Ok(())
    }
}

impl<'a, C> cbor::decode::Decode<'a, C> for Row {
    fn decode(d: &mut cbor::Decoder<'a>, ctx: &mut C) -> Result<Self, cbor::decode::Error> {
        let _len = d.array()?;
        let validator_period = d.decode_with(ctx)?;
        let fraction = d.decode_with(ctx)?;
        Ok(Row::new(validator_period, fraction))
    }
}

pub fn validator_prefix(validator: &ValidatorAddress) -> Vec<u8> {
    key(PREFIX, [validator.as_bytes()])
}

fn height_prefix(validator: &ValidatorAddress, height: BlockHeight) -> Vec<u8> {
    key(PREFIX, [validator.as_bytes(), &height.to_be_bytes()])
}

pub fn key_of(validator: &ValidatorAddress, height: BlockHeight, period: Period) -> Vec<u8> {
    key(
        PREFIX,
        [
            validator.as_bytes(),
            &height.to_be_bytes(),
            &period.to_be_bytes(),
        ],
    )
}

pub fn get(
    db: &impl ReadStore,
    validator: &ValidatorAddress,
    height: BlockHeight,
    period: Period,
) -> Result<Option<Row>, StoreError> {
    get_row(db, COLUMN, &key_of(validator, height, period))
}

pub fn put<'a>(
    db: &impl TransactionalContext<'a>,
    validator: &ValidatorAddress,
    height: BlockHeight,
    row: &Row,
) -> Result<(), StoreError> {
    put_row(db, &key_of(validator, height, row.validator_period), row)
}

pub fn delete<'a>(
    db: &impl TransactionalContext<'a>,
    validator: &ValidatorAddress,
    height: BlockHeight,
    period: Period,
) -> Result<(), StoreError> {
    db.delete(&key_of(validator, height, period))
}

/// Events of a validator with heights in `[from, to]`, by ascending height then period.
pub fn iter_between<'a>(
    db: &'a impl ReadStore,
    validator: &ValidatorAddress,
    from: BlockHeight,
    to: BlockHeight,
) -> Result<
    impl Iterator<Item = Result<(ValidatorAddress, BlockHeight, Row), StoreError>> + 'a,
    StoreError,
> {
    let upper = match to.as_u64().checked_add(1) {
        Some(next) => Some(height_prefix(validator, BlockHeight::new(next))),
        None => crate::store::prefix_upper_bound(&validator_prefix(validator)),
    };
    Ok(decode_entries(db.iter_range(height_prefix(validator, from), upper)?))
}

/// Events of a single validator, by ascending height then period.
pub fn iter_validator<'a>(
    db: &'a impl ReadStore,
    validator: &ValidatorAddress,
) -> Result<
    impl Iterator<Item = Result<(ValidatorAddress, BlockHeight, Row), StoreError>> + 'a,
    StoreError,
> {
    Ok(decode_entries(db.iter_prefix(validator_prefix(validator))?))
}

/// Events of all validators.
pub fn iter<'a>(
    db: &'a impl ReadStore,
) -> Result<
    impl Iterator<Item = Result<(ValidatorAddress, BlockHeight, Row), StoreError>> + 'a,
    StoreError,
> {
    Ok(decode_entries(db.iter_prefix(vec![PREFIX])?))
}

fn decode_entries(
    entries: impl Iterator<Item = (Vec<u8>, Vec<u8>)>,
) -> impl Iterator<Item = Result<(ValidatorAddress, BlockHeight, Row), StoreError>> {
    entries.map(|(key, value)| {
        let mut reader = KeyReader::new(COLUMN, &key);
        let validator = reader.validator()?;
        let height = reader.height()?;
        let _period = reader.period()?;
        reader.finish()?;
        Ok((validator, height, decode_row(COLUMN, &key, &value)?))
    })
}

#[cfg(any(test, feature = "test-utils"))]
pub mod tests {
    use super::*;
    use accrual_kernel::any_slash_fraction;
    use proptest::prelude::*;

    prop_compose! {
        pub fn any_row()(
            validator_period in any::<u64>(),
            fraction in any_slash_fraction(),
        ) -> Row {
            Row::new(Period::new(validator_period), fraction)
        }
    }

}

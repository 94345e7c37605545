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

//! Column layouts. Every key starts with a one-byte column prefix followed by fixed-width fields;
//! numbers are big-endian so that the byte order of keys matches their logical order.

pub mod current_rewards;
pub mod fee_pool;
pub mod historical_rewards;
pub mod outstanding_rewards;
pub mod slash_events;
pub mod starting_info;
pub mod withdraw_addresses;

use crate::store::StoreError;
use accrual_kernel::{AccountAddress, BlockHeight, Period, ValidatorAddress};

/// Concatenate a column prefix and a sequence of fixed-width fields into a key.
pub(crate) fn key<const N: usize>(prefix: u8, fields: [&[u8]; N]) -> Vec<u8> {
    let mut key = vec![prefix];
    for field in fields {
        key.extend_from_slice(field);
    }
    key
}

/// Sequential decoder over the fields of a key, skipping the column prefix.
pub(crate) struct KeyReader<'k> {
    column: &'static str,
    key: &'k [u8],
    rest: &'k [u8],
}

impl<'k> KeyReader<'k> {
    pub(crate) fn new(column: &'static str, key: &'k [u8]) -> Self {
        Self {
            column,
            key,
            rest: key.get(1..).unwrap_or_default(),
        }
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], StoreError> {
        let (field, rest) = self
            .rest
            .split_first_chunk::<N>()
            .ok_or_else(|| StoreError::malformed_key(self.column, self.key))?;
        self.rest = rest;
        Ok(*field)
    }

    pub(crate) fn validator(&mut self) -> Result<ValidatorAddress, StoreError> {
        self.take().map(ValidatorAddress::new)
    }

    pub(crate) fn account(&mut self) -> Result<AccountAddress, StoreError> {
        self.take().map(AccountAddress::new)
    }

    pub(crate) fn period(&mut self) -> Result<Period, StoreError> {
        self.take().map(|bytes| Period::new(u64::from_be_bytes(bytes)))
    }

    pub(crate) fn height(&mut self) -> Result<BlockHeight, StoreError> {
        self.take()
            .map(|bytes| BlockHeight::new(u64::from_be_bytes(bytes)))
    }

    /// Fail unless every byte of the key has been consumed.
    pub(crate) fn finish(self) -> Result<(), StoreError> {
        if self.rest.is_empty() {
            Ok(())
        } else {
            Err(StoreError::malformed_key(self.column, self.key))
        }
    }
}

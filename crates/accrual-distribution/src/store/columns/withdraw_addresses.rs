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

//! Where a delegator's withdrawn rewards get credited, when it differs from its own address.

use crate::store::{columns::key, get_row, put_row, ReadStore, StoreError, TransactionalContext};
use accrual_kernel::AccountAddress;

pub const PREFIX: u8 = 0x03;

const COLUMN: &str = "withdraw_addresses";

pub type Row = AccountAddress;

pub fn key_of(delegator: &AccountAddress) -> Vec<u8> {
    key(PREFIX, [delegator.as_bytes()])
}

pub fn get(db: &impl ReadStore, delegator: &AccountAddress) -> Result<Option<Row>, StoreError> {
    get_row(db, COLUMN, &key_of(delegator))
}

pub fn put<'a>(
    db: &impl TransactionalContext<'a>,
    delegator: &AccountAddress,
    row: &Row,
) -> Result<(), StoreError> {
    put_row(db, &key_of(delegator), row)
}

pub fn delete<'a>(
    db: &impl TransactionalContext<'a>,
    delegator: &AccountAddress,
) -> Result<(), StoreError> {
    db.delete(&key_of(delegator))
}

/// The registered withdraw address, falling back to the delegator itself.
pub fn resolve(
    db: &impl ReadStore,
    delegator: &AccountAddress,
) -> Result<AccountAddress, StoreError> {
    Ok(get(db, delegator)?.unwrap_or(*delegator))
}

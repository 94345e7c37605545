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

//! Collaborators owned by other subsystems. The accrual engine reads the staking registry and
//! credits the bank, but never owns either.

use accrual_kernel::{
    AccountAddress, BigUint, Coins, Delegation, Denom, Validator, ValidatorAddress,
};
use thiserror::Error;

pub trait StakingRegistry {
    fn validator(&self, operator: &ValidatorAddress) -> Option<Validator>;

    fn delegation(
        &self,
        delegator: &AccountAddress,
        validator: &ValidatorAddress,
    ) -> Option<Delegation>;

    /// Every delegation held by the given delegator, in a deterministic order.
    fn delegations(&self, delegator: &AccountAddress) -> impl Iterator<Item = Delegation> + '_;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BankError {
    #[error("insufficient supply of {denom}: requested {requested}, available {available}")]
    InsufficientSupply {
        denom: Denom,
        requested: BigUint,
        available: BigUint,
    },
    #[error("account {0} is not allowed to receive funds")]
    Blocked(AccountAddress),
}

pub trait Bank {
    fn credit(&self, account: &AccountAddress, amount: &Coins) -> Result<(), BankError>;
}

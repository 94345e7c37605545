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

//! In-memory stand-ins for the staking registry and the bank, faithful enough to drive the engine
//! through realistic sequences of bonds, unbonds and slashes.

use crate::context::{Bank, BankError, StakingRegistry};
use accrual_kernel::{
    AccountAddress, BigInt, BigUint, Coins, Decimal, Delegation, Validator, ValidatorAddress,
    ADDRESS_LENGTH,
};
use std::{
    cell::RefCell,
    collections::{BTreeMap, BTreeSet},
};

#[derive(Debug, Clone, Default)]
pub struct MemoryStaking {
    validators: BTreeMap<ValidatorAddress, Validator>,
    delegations: BTreeMap<(AccountAddress, ValidatorAddress), Decimal>,
}

impl MemoryStaking {
    pub fn create_validator(&mut self, operator: ValidatorAddress) {
        self.validators.insert(
            operator,
            Validator::new(operator, BigUint::default(), Decimal::zero()),
        );
    }

    pub fn remove_validator(&mut self, operator: &ValidatorAddress) -> Option<Validator> {
        self.validators.remove(operator)
    }

    pub fn validators(&self) -> impl Iterator<Item = &Validator> {
        self.validators.values()
    }

    /// Delegators currently bonded to a validator.
    pub fn delegators(&self, validator: &ValidatorAddress) -> Vec<AccountAddress> {
        self.delegations
            .keys()
            .filter(|(_, bonded_to)| bonded_to == validator)
            .map(|(delegator, _)| *delegator)
            .collect()
    }

    /// Bond tokens to a validator, issuing shares at the current exchange rate. Returns the
    /// shares issued, or `None` if the validator does not exist.
    pub fn delegate(
        &mut self,
        delegator: AccountAddress,
        validator: ValidatorAddress,
        amount: impl Into<BigUint>,
    ) -> Option<Decimal> {
        let live = self.validators.get_mut(&validator)?;
        let amount: BigUint = amount.into();

        let issued = if live.delegator_shares.is_zero() {
            Decimal::from_integer(BigInt::from(amount.clone()))
        } else {
            live.delegator_shares
                .mul_int(&BigInt::from(amount.clone()))
                .quo_truncate(&live.tokens_dec())?
        };

        live.tokens += amount;
        live.delegator_shares += &issued;

        let shares = self.delegations.entry((delegator, validator)).or_default();
        *shares += &issued;

        Some(issued)
    }

    /// Unbond shares from a validator. Returns the tokens released, or `None` when the delegation
    /// does not hold that many shares.
    pub fn undelegate(
        &mut self,
        delegator: &AccountAddress,
        validator: &ValidatorAddress,
        shares: &Decimal,
    ) -> Option<BigUint> {
        let held = self.delegations.get(&(*delegator, *validator))?.clone();
        if shares > &held || !shares.is_positive() {
            return None;
        }

        let live = self.validators.get_mut(validator)?;
        let remaining_shares = &live.delegator_shares - shares;
        let released = if remaining_shares.is_zero() {
            std::mem::take(&mut live.tokens)
        } else {
            let released = live.share_tokens_truncated(shares).truncate().to_biguint()?;
            live.tokens -= &released;
            released
        };
        live.delegator_shares = remaining_shares;

        let left = &held - shares;
        if left.is_zero() {
            self.delegations.remove(&(*delegator, *validator));
        } else {
            self.delegations.insert((*delegator, *validator), left);
        }

        Some(released)
    }

    /// Burn a fraction of the validator's bonded tokens. Returns the tokens burnt.
    pub fn slash(&mut self, validator: &ValidatorAddress, fraction: &Decimal) -> Option<BigUint> {
        let live = self.validators.get_mut(validator)?;
        let burnt = live.tokens_dec().mul_truncate(fraction).truncate().to_biguint()?;
        live.tokens -= &burnt;
        Some(burnt)
    }
}

impl StakingRegistry for MemoryStaking {
    fn validator(&self, operator: &ValidatorAddress) -> Option<Validator> {
        self.validators.get(operator).cloned()
    }

    fn delegation(
        &self,
        delegator: &AccountAddress,
        validator: &ValidatorAddress,
    ) -> Option<Delegation> {
        self.delegations
            .get(&(*delegator, *validator))
            .map(|shares| Delegation::new(*delegator, *validator, shares.clone()))
    }

    fn delegations(&self, delegator: &AccountAddress) -> impl Iterator<Item = Delegation> + '_ {
        let lowest = (*delegator, ValidatorAddress::new([u8::MIN; ADDRESS_LENGTH]));
        let highest = (*delegator, ValidatorAddress::new([u8::MAX; ADDRESS_LENGTH]));
        self.delegations
            .range(lowest..=highest)
            .map(|((delegator, validator), shares)| {
                Delegation::new(*delegator, *validator, shares.clone())
            })
    }
}

#[derive(Debug, Default)]
pub struct MemoryBank {
    balances: RefCell<BTreeMap<AccountAddress, Coins>>,
    blocked: BTreeSet<AccountAddress>,
}

impl MemoryBank {
    pub fn balance(&self, account: &AccountAddress) -> Coins {
        self.balances
            .borrow()
            .get(account)
            .cloned()
            .unwrap_or_default()
    }

    /// Everything ever credited, across all accounts.
    pub fn total(&self) -> Coins {
        self.balances
            .borrow()
            .values()
            .fold(Coins::new(), |total, balance| total.add(balance))
    }

    pub fn block(&mut self, account: AccountAddress) {
        self.blocked.insert(account);
    }
}

impl Bank for MemoryBank {
    fn credit(&self, account: &AccountAddress, amount: &Coins) -> Result<(), BankError> {
        if self.blocked.contains(account) {
            return Err(BankError::Blocked(*account));
        }
        *self.balances.borrow_mut().entry(*account).or_default() += amount;
        Ok(())
    }
}

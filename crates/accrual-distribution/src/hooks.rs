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

//! Entry points for the staking subsystem, called around its own state changes. Each hook must run
//! within the same transaction as the staking change it accompanies.

use crate::{
    context::{Bank, StakingRegistry},
    delegation::initialize_delegation,
    errors::{DistributionError, Fatal},
    period::{close_period, initialize_validator, remove_validator},
    slashes::record_slash,
    store::TransactionalContext,
    withdraw::withdraw_delegation_rewards,
};
use accrual_kernel::{AccountAddress, BlockHeight, Coins, Decimal, ValidatorAddress};

pub fn after_validator_created<'a>(
    db: &impl TransactionalContext<'a>,
    validator: &ValidatorAddress,
) -> Result<(), Fatal> {
    initialize_validator(db, validator)
}

pub fn after_validator_removed<'a>(
    db: &impl TransactionalContext<'a>,
    validator: &ValidatorAddress,
) -> Result<(), Fatal> {
    remove_validator(db, validator)
}

/// Close the validator's period so that the new delegation starts accruing from a fresh boundary.
pub fn before_delegation_created<'a>(
    db: &impl TransactionalContext<'a>,
    staking: &impl StakingRegistry,
    validator: &ValidatorAddress,
) -> Result<(), Fatal> {
    close_period(db, staking, validator).map(|_| ())
}

/// Settle everything accrued at the current shares, before they change.
pub fn before_delegation_shares_modified<'a>(
    db: &impl TransactionalContext<'a>,
    staking: &impl StakingRegistry,
    bank: &impl Bank,
    validator: &ValidatorAddress,
    delegator: &AccountAddress,
    height: BlockHeight,
) -> Result<Coins, DistributionError> {
    withdraw_delegation_rewards(db, staking, bank, validator, delegator, height)
}

/// Re-anchor the delegation at its new shares.
pub fn after_delegation_modified<'a>(
    db: &impl TransactionalContext<'a>,
    staking: &impl StakingRegistry,
    validator: &ValidatorAddress,
    delegator: &AccountAddress,
    height: BlockHeight,
) -> Result<(), Fatal> {
    initialize_delegation(db, staking, validator, delegator, height)
}

pub fn before_validator_slashed<'a>(
    db: &impl TransactionalContext<'a>,
    staking: &impl StakingRegistry,
    validator: &ValidatorAddress,
    height: BlockHeight,
    fraction: &Decimal,
) -> Result<(), Fatal> {
    record_slash(db, staking, validator, height, fraction).map(|_| ())
}

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

use crate::{
    context::{Bank, StakingRegistry},
    errors::{DistributionError, Fatal},
    historical,
    period::close_period,
    rewards::calculate_delegation_rewards,
    store::{
        columns::{fee_pool, outstanding_rewards, starting_info, withdraw_addresses},
        TransactionalContext,
    },
};
use accrual_kernel::{AccountAddress, BlockHeight, Coins, ValidatorAddress};
use tracing::{debug, info, instrument, Level};

const EVENT_TARGET: &str = "accrual::distribution::withdraw";

/// Settle everything a delegation has accrued so far: the integral part is credited to the
/// delegator's withdraw address, the fractional remainder goes to the community pool, and the
/// delegation is left without starting info until it gets initialized again.
///
/// Returns the amount credited.
#[instrument(
    level = Level::TRACE,
    skip_all,
    fields(validator = %validator, delegator = %delegator, height = %height)
)]
pub fn withdraw_delegation_rewards<'a>(
    db: &impl TransactionalContext<'a>,
    staking: &impl StakingRegistry,
    bank: &impl Bank,
    validator: &ValidatorAddress,
    delegator: &AccountAddress,
    height: BlockHeight,
) -> Result<Coins, DistributionError> {
    let starting = starting_info::get(db, validator, delegator)?.ok_or(
        DistributionError::NoDelegationDistInfo {
            validator: *validator,
            delegator: *delegator,
        },
    )?;

    let live = staking
        .validator(validator)
        .ok_or(Fatal::UnknownValidator(*validator))?;

    let delegation = staking
        .delegation(delegator, validator)
        .ok_or(Fatal::UnknownDelegation {
            delegator: *delegator,
            validator: *validator,
        })?;

    let ending = close_period(db, staking, validator)?;
    let expected = calculate_delegation_rewards(db, &live, &delegation, ending, height)?;

    let outstanding = outstanding_rewards::get(db, validator)?
        .unwrap_or_default()
        .rewards;

    // Truncation drift across many operations may leave the pool marginally short of the
    // theoretical amount; the pool is authoritative.
    let rewards = expected.intersect(&outstanding);
    if rewards != expected {
        info!(
            target: EVENT_TARGET,
            %validator,
            %delegator,
            %expected,
            clamped = %rewards,
            "withdraw.clamped"
        );
    }

    historical::decrement_reference(db, validator, starting.previous_period)?;

    let (payout, remainder) = rewards.truncate_decimal();

    fee_pool::add_to_community_pool(db, &remainder)?;

    let remaining = outstanding.sub(&rewards);
    if remaining.is_any_negative() {
        return Err(Fatal::OutstandingRewardsUnderflow {
            validator: *validator,
            remaining,
        }
        .into());
    }
    outstanding_rewards::put(db, validator, &outstanding_rewards::Row::new(remaining))?;

    if !payout.is_empty() {
        let recipient = withdraw_addresses::resolve(db, delegator)?;
        bank.credit(&recipient, &payout)?;
        debug!(
            target: EVENT_TARGET,
            %validator,
            %delegator,
            %recipient,
            %payout,
            %remainder,
            "withdraw"
        );
    }

    starting_info::delete(db, validator, delegator)?;

    Ok(payout)
}

/// Register where a delegator's future withdrawals are credited.
#[instrument(level = Level::TRACE, skip_all, fields(delegator = %delegator))]
pub fn set_withdraw_address<'a>(
    db: &impl TransactionalContext<'a>,
    delegator: &AccountAddress,
    recipient: &AccountAddress,
) -> Result<(), Fatal> {
    if recipient == delegator {
        withdraw_addresses::delete(db, delegator)?;
    } else {
        withdraw_addresses::put(db, delegator, recipient)?;
    }
    Ok(())
}

/// The address credited on withdrawal, defaulting to the delegator itself.
pub fn withdraw_address(
    db: &impl crate::store::ReadStore,
    delegator: &AccountAddress,
) -> Result<AccountAddress, Fatal> {
    Ok(withdraw_addresses::resolve(db, delegator)?)
}

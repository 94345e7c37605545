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

//! The reward calculator. Everything here is read-only: rewards are derived from the historical
//! ratios, the slash log and the delegation's starting info, and never written back.

use crate::{
    errors::Fatal,
    historical,
    slashes::events_between,
    store::{columns::starting_info, ReadStore},
};
use accrual_kernel::{
    BlockHeight, DecCoins, Decimal, Delegation, Period, Validator, ValidatorAddress,
};
use tracing::trace;

const EVENT_TARGET: &str = "accrual::distribution::rewards";

/// Rewards earned by `stake` between two periods of a validator, truncated so that they never
/// exceed what was accrued.
pub fn calculate_rewards_between(
    db: &impl ReadStore,
    validator: &ValidatorAddress,
    starting: Period,
    ending: Period,
    stake: &Decimal,
) -> Result<DecCoins, Fatal> {
    if starting > ending {
        return Err(Fatal::InvalidPeriodRange { starting, ending });
    }

    if stake.is_negative() {
        return Err(Fatal::NegativeStake {
            validator: *validator,
            stake: stake.clone(),
        });
    }

    let start = historical::get(db, validator, starting)?;
    let end = historical::get(db, validator, ending)?;

    let difference = end
        .cumulative_reward_ratio
        .sub(&start.cumulative_reward_ratio);

    if difference.is_any_negative() {
        return Err(Fatal::NegativeRewards {
            validator: *validator,
            starting,
            ending,
            difference,
        });
    }

    Ok(difference.mul_dec_truncate(stake))
}

/// Total rewards accrued by a delegation from its starting info up to `ending`, as seen at
/// `height`. Each slash recorded in between splits the window: rewards before the slash accrue at
/// the stake held then, rewards after it at the reduced stake.
///
/// A delegation without starting info has nothing to claim.
pub fn calculate_delegation_rewards(
    db: &impl ReadStore,
    validator: &Validator,
    delegation: &Delegation,
    ending: Period,
    height: BlockHeight,
) -> Result<DecCoins, Fatal> {
    let operator = &validator.operator;

    let Some(starting) = starting_info::get(db, operator, &delegation.delegator)? else {
        trace!(
            target: EVENT_TARGET,
            validator = %operator,
            delegator = %delegation.delegator,
            "calculate.no_starting_info"
        );
        return Ok(DecCoins::new());
    };

    // Started within this very block, no time has elapsed.
    if starting.height == height {
        return Ok(DecCoins::new());
    }

    let mut rewards = DecCoins::new();
    let mut period = starting.previous_period;
    let mut stake = starting.stake;

    if height > starting.height {
        for event in events_between(db, operator, starting.height, height)? {
            let (slashed_at, event) = event?;
            if event.validator_period <= period {
                continue;
            }

            rewards += &calculate_rewards_between(
                db,
                operator,
                period,
                event.validator_period,
                &stake,
            )?;
            stake = stake.mul_truncate(&(&Decimal::one() - &event.fraction));
            period = event.validator_period;

            trace!(
                target: EVENT_TARGET,
                validator = %operator,
                delegator = %delegation.delegator,
                height = %slashed_at,
                %period,
                %stake,
                "calculate.slashed"
            );
        }
    }

    // Slashes only ever truncate the tracked stake, so it may trail the live stake but never
    // exceed it.
    let current = validator.share_tokens(&delegation.shares);
    if stake > current {
        return Err(Fatal::StakeExceedsCurrent {
            delegator: delegation.delegator,
            calculated: stake,
            current,
        });
    }

    rewards += &calculate_rewards_between(db, operator, period, ending, &stake)?;

    Ok(rewards)
}

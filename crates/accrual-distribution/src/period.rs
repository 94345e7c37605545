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

//! Validator periods: creating a validator's accrual state, closing the live accumulator into a
//! new historical record, and tearing everything down when the validator goes away.

use crate::{
    context::StakingRegistry,
    errors::Fatal,
    historical::{self, HistoricalRecord},
    store::{
        columns::{current_rewards, fee_pool, historical_rewards, outstanding_rewards, slash_events},
        TransactionalContext,
    },
};
use accrual_kernel::{DecCoins, Period, ValidatorAddress};
use tracing::{debug, instrument, Level};

const EVENT_TARGET: &str = "accrual::distribution::period";

/// Set up a fresh validator: a zero ratio at the genesis period, an empty accumulator for the
/// first period and nothing outstanding.
#[instrument(level = Level::TRACE, skip_all, fields(validator = %validator))]
pub fn initialize_validator<'a>(
    db: &impl TransactionalContext<'a>,
    validator: &ValidatorAddress,
) -> Result<(), Fatal> {
    historical::put(db, validator, Period::GENESIS, &HistoricalRecord::default())?;
    current_rewards::put(
        db,
        validator,
        &current_rewards::Row::new(DecCoins::new(), Period::GENESIS.next()),
    )?;
    outstanding_rewards::put(db, validator, &outstanding_rewards::Row::default())?;
    Ok(())
}

/// Close the validator's current period: turn the accumulated rewards into a per-token increment,
/// record the new cumulative ratio, and open the next period. Returns the period just closed, which
/// is the ending boundary for any reward calculation up to now.
#[instrument(level = Level::TRACE, skip_all, fields(validator = %validator))]
pub fn close_period<'a>(
    db: &impl TransactionalContext<'a>,
    staking: &impl StakingRegistry,
    validator: &ValidatorAddress,
) -> Result<Period, Fatal> {
    let current = current_rewards::get(db, validator)?
        .ok_or(Fatal::MissingCurrentRewards(*validator))?;

    let tokens = staking
        .validator(validator)
        .ok_or(Fatal::UnknownValidator(*validator))?
        .tokens_dec();

    let increment = match current.rewards.quo_dec_truncate(&tokens) {
        Some(increment) => increment,
        None => {
            // Nobody is bonded: the rewards can never be claimed.
            debug!(
                target: EVENT_TARGET,
                %validator,
                rewards = %current.rewards,
                "close_period.unclaimable"
            );
            fee_pool::add_to_community_pool(db, &current.rewards)?;
            let outstanding = outstanding_rewards::get(db, validator)?.unwrap_or_default();
            let remaining = outstanding.rewards.sub(&current.rewards);
            if remaining.is_any_negative() {
                return Err(Fatal::OutstandingRewardsUnderflow {
                    validator: *validator,
                    remaining,
                });
            }
            outstanding_rewards::put(db, validator, &outstanding_rewards::Row::new(remaining))?;
            DecCoins::new()
        }
    };

    let ending = current.period;
    let previous = historical::get(db, validator, ending.previous())?;

    historical::put(
        db,
        validator,
        ending,
        &HistoricalRecord::new(previous.cumulative_reward_ratio.add(&increment), 0),
    )?;

    current_rewards::put(
        db,
        validator,
        &current_rewards::Row::new(DecCoins::new(), ending.next()),
    )?;

    // The previous record is no longer the latest, so nothing implicitly holds it anymore.
    historical::prune(db, validator, ending.previous())?;

    debug!(target: EVENT_TARGET, %validator, period = %ending, %increment, "close_period");

    Ok(ending)
}

/// Drop every piece of accrual state of a validator. Whatever remains outstanding can no longer be
/// claimed and goes to the community pool.
#[instrument(level = Level::TRACE, skip_all, fields(validator = %validator))]
pub fn remove_validator<'a>(
    db: &impl TransactionalContext<'a>,
    validator: &ValidatorAddress,
) -> Result<(), Fatal> {
    if let Some(outstanding) = outstanding_rewards::get(db, validator)? {
        fee_pool::add_to_community_pool(db, &outstanding.rewards)?;
        outstanding_rewards::delete(db, validator)?;
    }

    let periods = historical_rewards::iter_validator(db, validator)?
        .map(|entry| entry.map(|(period, _)| period))
        .collect::<Result<Vec<_>, _>>()?;
    for period in periods {
        historical_rewards::delete(db, validator, period)?;
    }

    let events = slash_events::iter_validator(db, validator)?
        .map(|entry| entry.map(|(_, height, row)| (height, row.validator_period)))
        .collect::<Result<Vec<_>, _>>()?;
    for (height, period) in events {
        slash_events::delete(db, validator, height, period)?;
    }

    current_rewards::delete(db, validator)?;

    debug!(target: EVENT_TARGET, %validator, "remove_validator");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        allocation::allocate_to_validator,
        store::{in_memory::MemoryStore, Store},
        testing::MemoryStaking,
    };
    use accrual_kernel::{AccountAddress, Decimal};

    const VALIDATOR: ValidatorAddress = ValidatorAddress::new([1; 20]);

    fn coins(amount: &str) -> DecCoins {
        DecCoins::from_coin("uatom", amount.parse::<Decimal>().unwrap())
    }

    fn ratio<'a>(db: &impl TransactionalContext<'a>, period: u64) -> DecCoins {
        historical::get(db, &VALIDATOR, Period::new(period))
            .unwrap()
            .cumulative_reward_ratio
    }

    #[test]
    fn close_accumulates_ratios() {
        let store = MemoryStore::new();
        let db = store.create_transaction();
        let mut staking = MemoryStaking::default();
        staking.create_validator(VALIDATOR);
        staking.delegate(AccountAddress::new([2; 20]), VALIDATOR, 400u64);
        initialize_validator(&db, &VALIDATOR).unwrap();

        allocate_to_validator(&db, &VALIDATOR, &coins("100")).unwrap();
        assert_eq!(close_period(&db, &staking, &VALIDATOR).unwrap(), Period::new(1));
        assert_eq!(ratio(&db, 1), coins("0.25"));

        allocate_to_validator(&db, &VALIDATOR, &coins("200")).unwrap();
        assert_eq!(close_period(&db, &staking, &VALIDATOR).unwrap(), Period::new(2));
        assert_eq!(ratio(&db, 2), coins("0.75"));

        let current = current_rewards::get(&db, &VALIDATOR).unwrap().unwrap();
        assert_eq!(current.period, Period::new(3));
        assert!(current.rewards.is_empty());
    }

    #[test]
    fn close_prunes_unreferenced_predecessor() {
        let store = MemoryStore::new();
        let db = store.create_transaction();
        let mut staking = MemoryStaking::default();
        staking.create_validator(VALIDATOR);
        staking.delegate(AccountAddress::new([2; 20]), VALIDATOR, 1u64);
        initialize_validator(&db, &VALIDATOR).unwrap();

        close_period(&db, &staking, &VALIDATOR).unwrap();
        close_period(&db, &staking, &VALIDATOR).unwrap();

        let periods: Vec<_> = historical_rewards::iter_validator(&db, &VALIDATOR)
            .unwrap()
            .map(|entry| entry.unwrap().0)
            .collect();
        assert_eq!(periods, vec![Period::new(2)]);
    }

    #[test]
    fn unbonded_rewards_go_to_the_community_pool() {
        let store = MemoryStore::new();
        let db = store.create_transaction();
        let mut staking = MemoryStaking::default();
        staking.create_validator(VALIDATOR);
        initialize_validator(&db, &VALIDATOR).unwrap();

        allocate_to_validator(&db, &VALIDATOR, &coins("12.5")).unwrap();
        close_period(&db, &staking, &VALIDATOR).unwrap();

        assert!(ratio(&db, 1).is_empty());
        assert_eq!(fee_pool::get(&db).unwrap().community_pool, coins("12.5"));
        assert!(outstanding_rewards::get(&db, &VALIDATOR)
            .unwrap()
            .unwrap()
            .rewards
            .is_empty());
    }

    #[test]
    fn close_unknown_validator_is_fatal() {
        let store = MemoryStore::new();
        let db = store.create_transaction();
        let staking = MemoryStaking::default();
        assert!(matches!(
            close_period(&db, &staking, &VALIDATOR),
            Err(Fatal::MissingCurrentRewards(..))
        ));
    }

    #[test]
    fn removal_clears_everything() {
        let store = MemoryStore::new();
        let db = store.create_transaction();
        let mut staking = MemoryStaking::default();
        staking.create_validator(VALIDATOR);
        staking.delegate(AccountAddress::new([2; 20]), VALIDATOR, 3u64);
        initialize_validator(&db, &VALIDATOR).unwrap();
        allocate_to_validator(&db, &VALIDATOR, &coins("1")).unwrap();
        close_period(&db, &staking, &VALIDATOR).unwrap();

        remove_validator(&db, &VALIDATOR).unwrap();

        assert!(current_rewards::get(&db, &VALIDATOR).unwrap().is_none());
        assert!(outstanding_rewards::get(&db, &VALIDATOR).unwrap().is_none());
        assert_eq!(historical_rewards::iter_validator(&db, &VALIDATOR).unwrap().count(), 0);
        assert_eq!(fee_pool::get(&db).unwrap().community_pool, coins("1"));
    }
}

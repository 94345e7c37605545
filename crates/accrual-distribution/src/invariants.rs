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

//! Consistency checks over the whole accrual state, meant to be asserted after any block.

use crate::store::{
    columns::{historical_rewards, outstanding_rewards, slash_events, starting_info},
    ReadStore, StoreError,
};
use accrual_kernel::{DecCoins, Period, ValidatorAddress};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrokenInvariant {
    #[error("negative outstanding rewards {rewards} for validator {validator}")]
    NegativeOutstanding {
        validator: ValidatorAddress,
        rewards: DecCoins,
    },

    #[error(
        "historical rewards of validator {validator} at period {period} record {recorded} reference(s) but {found} were found"
    )]
    ReferenceCount {
        validator: ValidatorAddress,
        period: Period,
        recorded: u16,
        found: u64,
    },

    #[error("{found} reference(s) to missing historical rewards of validator {validator} at period {period}")]
    DanglingReference {
        validator: ValidatorAddress,
        period: Period,
        found: u64,
    },

    #[error("cumulative ratio of validator {validator} decreases from period {previous} to period {period}")]
    NonMonotonicRatio {
        validator: ValidatorAddress,
        previous: Period,
        period: Period,
    },

    #[error(transparent)]
    Storage(#[from] StoreError),
}

pub fn check_all(db: &impl ReadStore) -> Result<(), BrokenInvariant> {
    non_negative_outstanding(db)?;
    reference_count(db)?;
    monotonic_ratios(db)
}

pub fn non_negative_outstanding(db: &impl ReadStore) -> Result<(), BrokenInvariant> {
    for entry in outstanding_rewards::iter(db)? {
        let (validator, row) = entry?;
        if row.rewards.is_any_negative() {
            return Err(BrokenInvariant::NegativeOutstanding {
                validator,
                rewards: row.rewards,
            });
        }
    }
    Ok(())
}

/// Every historical record counts exactly the starting infos anchored to it plus the slash events
/// recorded at its period.
pub fn reference_count(db: &impl ReadStore) -> Result<(), BrokenInvariant> {
    let mut found: BTreeMap<(ValidatorAddress, Period), u64> = BTreeMap::new();

    for entry in starting_info::iter(db)? {
        let (validator, _, row) = entry?;
        *found.entry((validator, row.previous_period)).or_default() += 1;
    }

    for entry in slash_events::iter(db)? {
        let (validator, _, row) = entry?;
        *found.entry((validator, row.validator_period)).or_default() += 1;
    }

    for entry in historical_rewards::iter(db)? {
        let (validator, period, row) = entry?;
        let references = found.remove(&(validator, period)).unwrap_or_default();
        if u64::from(row.reference_count) != references {
            return Err(BrokenInvariant::ReferenceCount {
                validator,
                period,
                recorded: row.reference_count,
                found: references,
            });
        }
    }

    match found.into_iter().next() {
        Some(((validator, period), found)) => Err(BrokenInvariant::DanglingReference {
            validator,
            period,
            found,
        }),
        None => Ok(()),
    }
}

/// Ratios of a validator never decrease, in any denomination, from one recorded period to the
/// next.
pub fn monotonic_ratios(db: &impl ReadStore) -> Result<(), BrokenInvariant> {
    let mut previous: Option<(ValidatorAddress, Period, DecCoins)> = None;

    for entry in historical_rewards::iter(db)? {
        let (validator, period, row) = entry?;

        if let Some((previous_validator, previous_period, previous_ratio)) = &previous {
            if previous_validator == &validator
                && row
                    .cumulative_reward_ratio
                    .sub(previous_ratio)
                    .is_any_negative()
            {
                return Err(BrokenInvariant::NonMonotonicRatio {
                    validator,
                    previous: *previous_period,
                    period,
                });
            }
        }

        previous = Some((validator, period, row.cumulative_reward_ratio));
    }

    Ok(())
}

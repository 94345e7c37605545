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

//! Read-only projections. Computing rewards "as of now" requires closing the validator's period,
//! so every query runs inside a scratch transaction that is discarded afterwards.

use crate::{
    context::StakingRegistry,
    errors::Fatal,
    period::close_period,
    rewards::calculate_delegation_rewards,
    store::{self, columns::starting_info, Store},
};
use accrual_kernel::{AccountAddress, BlockHeight, DecCoins, ValidatorAddress};

/// Rewards a delegation could withdraw at the given height, without touching the store.
pub fn delegation_rewards(
    store: &impl Store,
    staking: &impl StakingRegistry,
    validator: &ValidatorAddress,
    delegator: &AccountAddress,
    height: BlockHeight,
) -> Result<DecCoins, Fatal> {
    store::scratch(store, |db| {
        if starting_info::get(db, validator, delegator)?.is_none() {
            return Ok(DecCoins::new());
        }

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

        calculate_delegation_rewards(db, &live, &delegation, ending, height)
    })
}

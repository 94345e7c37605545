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
    errors::Fatal,
    store::{
        columns::{current_rewards, outstanding_rewards},
        TransactionalContext,
    },
};
use accrual_kernel::{DecCoins, ValidatorAddress};
use tracing::{instrument, trace, Level};

const EVENT_TARGET: &str = "accrual::distribution::allocation";

/// Credit rewards earned by a validator's delegators, already net of commission, to the live
/// accumulator and to the outstanding pool. This is the only way rewards enter the engine.
#[instrument(level = Level::TRACE, skip_all, fields(validator = %validator))]
pub fn allocate_to_validator<'a>(
    db: &impl TransactionalContext<'a>,
    validator: &ValidatorAddress,
    rewards: &DecCoins,
) -> Result<(), Fatal> {
    if rewards.is_any_negative() {
        return Err(Fatal::NegativeAllocation {
            validator: *validator,
            rewards: rewards.clone(),
        });
    }

    let mut current = current_rewards::get(db, validator)?
        .ok_or(Fatal::MissingCurrentRewards(*validator))?;
    current.rewards += rewards;
    current_rewards::put(db, validator, &current)?;

    let mut outstanding = outstanding_rewards::get(db, validator)?.unwrap_or_default();
    outstanding.rewards += rewards;
    outstanding_rewards::put(db, validator, &outstanding)?;

    trace!(target: EVENT_TARGET, %validator, %rewards, "allocate");

    Ok(())
}

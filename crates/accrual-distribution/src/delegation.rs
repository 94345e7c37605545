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
    context::StakingRegistry,
    errors::Fatal,
    historical,
    store::{
        columns::{current_rewards, starting_info},
        TransactionalContext,
    },
};
use accrual_kernel::{AccountAddress, BlockHeight, ValidatorAddress};
use tracing::{debug, instrument, warn, Level};

pub use starting_info::Row as StartingInfo;

const EVENT_TARGET: &str = "accrual::distribution::delegation";

/// Open a new accrual window for a delegation, anchored to the validator's latest closed period.
///
/// The period must have been closed right before (see [`crate::period::close_period`]) so that the
/// anchor does not include rewards accrued before the delegation changed.
#[instrument(
    level = Level::TRACE,
    skip_all,
    fields(validator = %validator, delegator = %delegator, height = %height)
)]
pub fn initialize_delegation<'a>(
    db: &impl TransactionalContext<'a>,
    staking: &impl StakingRegistry,
    validator: &ValidatorAddress,
    delegator: &AccountAddress,
    height: BlockHeight,
) -> Result<(), Fatal> {
    let previous_period = current_rewards::get(db, validator)?
        .ok_or(Fatal::MissingCurrentRewards(*validator))?
        .period
        .previous();

    if let Some(existing) = starting_info::get(db, validator, delegator)? {
        warn!(
            target: EVENT_TARGET,
            %validator,
            %delegator,
            anchor = %existing.previous_period,
            "initialize.overwrite"
        );
        historical::decrement_reference(db, validator, existing.previous_period)?;
    }

    historical::increment_reference(db, validator, previous_period)?;

    let live = staking
        .validator(validator)
        .ok_or(Fatal::UnknownValidator(*validator))?;

    let delegation = staking.delegation(delegator, validator).ok_or(Fatal::UnknownDelegation {
        delegator: *delegator,
        validator: *validator,
    })?;

    let stake = live.share_tokens_truncated(&delegation.shares);

    debug!(
        target: EVENT_TARGET,
        %validator,
        %delegator,
        %previous_period,
        %stake,
        "initialize"
    );

    starting_info::put(
        db,
        validator,
        delegator,
        &StartingInfo::new(previous_period, stake, height),
    )?;

    Ok(())
}

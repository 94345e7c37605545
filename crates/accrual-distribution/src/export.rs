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

//! Bulk export of what a delegator would receive if it withdrew from every validator at once.
//! The export is simulated on a scratch transaction; nothing is ever settled.

use crate::{
    context::StakingRegistry,
    errors::Fatal,
    period::close_period,
    rewards::calculate_delegation_rewards,
    store::{self, Store},
};
use accrual_kernel::{AccountAddress, BlockHeight, Coins, DecCoins, ValidatorAddress};
use serde::Serialize;
use tracing::{debug, instrument, Level};

const EVENT_TARGET: &str = "accrual::distribution::export";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewardsExport {
    pub delegator: AccountAddress,
    pub height: BlockHeight,
    pub entries: Vec<ExportedRewards>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedRewards {
    pub validator: ValidatorAddress,
    /// Rewards accrued, before truncation.
    pub rewards: DecCoins,
    /// The integral amount a withdrawal would credit.
    pub payout: Coins,
}

impl RewardsExport {
    /// Sum of the payouts across all validators.
    pub fn total_payout(&self) -> Coins {
        self.entries
            .iter()
            .fold(Coins::new(), |total, entry| total.add(&entry.payout))
    }
}

#[instrument(level = Level::TRACE, skip_all, fields(delegator = %delegator, height = %height))]
pub fn export_all_rewards_for_delegator(
    store: &impl Store,
    staking: &impl StakingRegistry,
    delegator: &AccountAddress,
    height: BlockHeight,
) -> Result<RewardsExport, Fatal> {
    let entries = store::scratch(store, |db| {
        staking
            .delegations(delegator)
            .map(|delegation| {
                let live = staking
                    .validator(&delegation.validator)
                    .ok_or(Fatal::UnknownValidator(delegation.validator))?;

                let ending = close_period(db, staking, &delegation.validator)?;
                let rewards = calculate_delegation_rewards(db, &live, &delegation, ending, height)?;
                let (payout, _) = rewards.truncate_decimal();

                Ok(ExportedRewards {
                    validator: delegation.validator,
                    rewards,
                    payout,
                })
            })
            .collect::<Result<Vec<_>, Fatal>>()
    })?;

    debug!(
        target: EVENT_TARGET,
        %delegator,
        validators = entries.len(),
        "export"
    );

    Ok(RewardsExport {
        delegator: *delegator,
        height,
        entries,
    })
}

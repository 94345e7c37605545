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


use super::Action;
use accrual_distribution::{
    allocate_to_validator, hooks, initialize_delegation,
    store::{
        atomically,
        columns::{fee_pool, outstanding_rewards},
        in_memory::MemoryStore,
        StoreError,
    },
    testing::{MemoryBank, MemoryStaking},
    withdraw_delegation_rewards, DistributionError, StakingRegistry,
};
use accrual_kernel::{
    AccountAddress, BigUint, BlockHeight, Coins, DecCoins, Decimal, ValidatorAddress,
};
use anyhow::anyhow;
use tracing::debug;

const EVENT_TARGET: &str = "accrual::sim::world";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// The action does not apply to the current state, e.g. withdrawing from a delegation that
    /// does not exist.
    Skipped(&'static str),
}

/// The distribution engine together with the collaborators it settles against, driven the way a
/// staking module would: every state change goes through the hooks, one transaction each.
#[derive(Debug, Default)]
pub struct World {
    store: MemoryStore,
    staking: MemoryStaking,
    bank: MemoryBank,
    allocated: DecCoins,
}

impl World {
    pub fn new(validators: &[ValidatorAddress]) -> anyhow::Result<Self> {
        let mut world = Self::default();
        for validator in validators {
            world.staking.create_validator(*validator);
            atomically(&world.store, |db| hooks::after_validator_created(db, validator))?;
        }
        Ok(world)
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Everything ever allocated, across all validators.
    pub fn allocated(&self) -> &DecCoins {
        &self.allocated
    }

    /// Everything ever credited to delegators.
    pub fn paid(&self) -> Coins {
        self.bank.total()
    }

    pub fn community_pool(&self) -> Result<DecCoins, StoreError> {
        Ok(fee_pool::get(&self.store)?.community_pool)
    }

    pub fn outstanding(&self) -> Result<DecCoins, StoreError> {
        outstanding_rewards::iter(&self.store)?.try_fold(DecCoins::new(), |total, entry| {
            let (_, row) = entry?;
            Ok(total.add(&row.rewards))
        })
    }

    pub fn apply(&mut self, height: BlockHeight, action: &Action) -> anyhow::Result<Outcome> {
        let outcome = match action {
            Action::Allocate { validator, rewards } => self.allocate(validator, rewards)?,
            Action::Delegate {
                delegator,
                validator,
                amount,
            } => self.delegate(height, *delegator, *validator, BigUint::from(*amount))?,
            Action::Redelegate {
                delegator,
                source,
                destination,
            } => self.redelegate(height, *delegator, *source, *destination)?,
            Action::Slash {
                validator,
                fraction,
            } => self.slash(height, validator, fraction)?,
            Action::Withdraw {
                delegator,
                validator,
            } => self.withdraw(height, delegator, validator)?,
        };

        if let Outcome::Skipped(reason) = outcome {
            debug!(target: EVENT_TARGET, %height, ?action, reason, "skipped");
        }

        Ok(outcome)
    }

    fn allocate(
        &mut self,
        validator: &ValidatorAddress,
        rewards: &DecCoins,
    ) -> anyhow::Result<Outcome> {
        atomically(&self.store, |db| allocate_to_validator(db, validator, rewards))?;
        self.allocated += rewards;
        Ok(Outcome::Applied)
    }

    fn delegate(
        &mut self,
        height: BlockHeight,
        delegator: AccountAddress,
        validator: ValidatorAddress,
        amount: BigUint,
    ) -> anyhow::Result<Outcome> {
        let Some(live) = self.staking.validator(&validator) else {
            return Ok(Outcome::Skipped("unknown validator"));
        };

        if !live.delegator_shares.is_zero() && live.tokens_dec().is_zero() {
            return Ok(Outcome::Skipped("validator shares are worthless"));
        }

        let existing = self.staking.delegation(&delegator, &validator).is_some();

        atomically(&self.store, |db| -> Result<Coins, DistributionError> {
            if existing {
                hooks::before_delegation_shares_modified(
                    db,
                    &self.staking,
                    &self.bank,
                    &validator,
                    &delegator,
                    height,
                )
            } else {
                hooks::before_delegation_created(db, &self.staking, &validator)?;
                Ok(Coins::new())
            }
        })?;

        self.staking
            .delegate(delegator, validator, amount)
            .ok_or_else(|| anyhow!("cannot bond to validator {validator}"))?;

        atomically(&self.store, |db| {
            hooks::after_delegation_modified(db, &self.staking, &validator, &delegator, height)
        })?;

        Ok(Outcome::Applied)
    }

    fn redelegate(
        &mut self,
        height: BlockHeight,
        delegator: AccountAddress,
        source: ValidatorAddress,
        destination: ValidatorAddress,
    ) -> anyhow::Result<Outcome> {
        let Some(delegation) = self.staking.delegation(&delegator, &source) else {
            return Ok(Outcome::Skipped("no delegation to move"));
        };

        atomically(&self.store, |db| {
            hooks::before_delegation_shares_modified(
                db,
                &self.staking,
                &self.bank,
                &source,
                &delegator,
                height,
            )
        })?;

        let released = self
            .staking
            .undelegate(&delegator, &source, &delegation.shares)
            .ok_or_else(|| anyhow!("cannot unbond {delegator} from validator {source}"))?;

        if released == BigUint::default() {
            return Ok(Outcome::Applied);
        }

        self.delegate(height, delegator, destination, released)
    }

    fn slash(
        &mut self,
        height: BlockHeight,
        validator: &ValidatorAddress,
        fraction: &Decimal,
    ) -> anyhow::Result<Outcome> {
        atomically(&self.store, |db| {
            hooks::before_validator_slashed(db, &self.staking, validator, height, fraction)
        })?;

        self.staking
            .slash(validator, fraction)
            .ok_or_else(|| anyhow!("cannot slash validator {validator}"))?;

        Ok(Outcome::Applied)
    }

    fn withdraw(
        &mut self,
        height: BlockHeight,
        delegator: &AccountAddress,
        validator: &ValidatorAddress,
    ) -> anyhow::Result<Outcome> {
        if self.staking.delegation(delegator, validator).is_none() {
            return Ok(Outcome::Skipped("no delegation to withdraw from"));
        }

        atomically(&self.store, |db| -> Result<Coins, DistributionError> {
            let payout = withdraw_delegation_rewards(
                db,
                &self.staking,
                &self.bank,
                validator,
                delegator,
                height,
            )?;
            initialize_delegation(db, &self.staking, validator, delegator, height)?;
            Ok(payout)
        })?;

        Ok(Outcome::Applied)
    }
}

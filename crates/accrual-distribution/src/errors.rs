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

use crate::{context::BankError, store::StoreError};
use accrual_kernel::{AccountAddress, DecCoins, Decimal, Period, ValidatorAddress};
use thiserror::Error;

/// An invariant violation. The ledger is either corrupted or was driven by a defective caller;
/// the enclosing state transition must be aborted as a whole and nothing it wrote may persist.
#[derive(Debug, Error)]
pub enum Fatal {
    #[error("invalid period range: starting period {starting} is after ending period {ending}")]
    InvalidPeriodRange { starting: Period, ending: Period },

    #[error("negative stake {stake} for validator {validator}")]
    NegativeStake {
        validator: ValidatorAddress,
        stake: Decimal,
    },

    #[error(
        "negative rewards {difference} between periods {starting} and {ending} of validator {validator}"
    )]
    NegativeRewards {
        validator: ValidatorAddress,
        starting: Period,
        ending: Period,
        difference: DecCoins,
    },

    #[error("negative rewards {rewards} allocated to validator {validator}")]
    NegativeAllocation {
        validator: ValidatorAddress,
        rewards: DecCoins,
    },

    #[error("no historical rewards for validator {validator} at period {period}")]
    MissingHistoricalRewards {
        validator: ValidatorAddress,
        period: Period,
    },

    #[error("reference count underflow for validator {validator} at period {period}")]
    ReferenceCountUnderflow {
        validator: ValidatorAddress,
        period: Period,
    },

    #[error("reference count overflow for validator {validator} at period {period}")]
    ReferenceCountOverflow {
        validator: ValidatorAddress,
        period: Period,
    },

    #[error(
        "cannot delete historical rewards of validator {validator} at period {period}: still referenced {reference_count} time(s)"
    )]
    ReferencedHistoricalRewards {
        validator: ValidatorAddress,
        period: Period,
        reference_count: u16,
    },

    #[error(
        "calculated final stake {calculated} for delegator {delegator} greater than current stake {current}"
    )]
    StakeExceedsCurrent {
        delegator: AccountAddress,
        calculated: Decimal,
        current: Decimal,
    },

    #[error("no current rewards for validator {0}; was it ever initialized?")]
    MissingCurrentRewards(ValidatorAddress),

    #[error("unknown validator {0}")]
    UnknownValidator(ValidatorAddress),

    #[error("unknown delegation from {delegator} to {validator}")]
    UnknownDelegation {
        delegator: AccountAddress,
        validator: ValidatorAddress,
    },

    #[error("outstanding rewards of validator {validator} would become negative: {remaining}")]
    OutstandingRewardsUnderflow {
        validator: ValidatorAddress,
        remaining: DecCoins,
    },

    #[error("slash fraction {0} is outside of [0, 1)")]
    InvalidSlashFraction(Decimal),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// The error returned to callers of a withdrawal; only [`DistributionError::Fatal`] signals
/// corruption, the others leave the state untouched and may safely be ignored or retried.
#[derive(Debug, Error)]
pub enum DistributionError {
    #[error("no delegation distribution info for delegator {delegator} on validator {validator}")]
    NoDelegationDistInfo {
        validator: ValidatorAddress,
        delegator: AccountAddress,
    },

    #[error("unable to credit withdrawn rewards")]
    Bank(#[from] BankError),

    #[error(transparent)]
    Fatal(#[from] Fatal),
}

impl DistributionError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(..))
    }
}

impl From<StoreError> for DistributionError {
    fn from(e: StoreError) -> Self {
        Self::Fatal(Fatal::Storage(e))
    }
}
